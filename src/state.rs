use std::sync::Arc;

use crate::commands::settings::{load_effective_settings, EffectiveSettings, StorageBackend};
use crate::engine::sessions::SessionStore;
use crate::seed::seed_demo_data;
use crate::store::{InMemoryStore, PlatformStore, SqliteStore};

/// Shared backend state handed to every command.
pub struct AppState {
    pub store: Arc<dyn PlatformStore>,
    pub sessions: SessionStore,
    pub settings: EffectiveSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn PlatformStore>, settings: EffectiveSettings) -> Self {
        Self {
            sessions: SessionStore::new(settings.session_ttl_minutes),
            store,
            settings,
        }
    }

    /// Empty in-memory state without demo data.
    pub fn in_memory() -> Self {
        let settings = EffectiveSettings {
            storage: StorageBackend::Memory,
            seed_demo_data: false,
            ..EffectiveSettings::default()
        };
        Self::new(Arc::new(InMemoryStore::new()), settings)
    }

    /// Read `<data_dir>/.fundvote/settings.json`, open the configured
    /// backend and seed demo data when enabled.
    pub fn open(data_dir: &str) -> Result<Self, String> {
        let settings = load_effective_settings(data_dir)?;
        let store: Arc<dyn PlatformStore> = match settings.storage {
            StorageBackend::Sqlite => Arc::new(
                SqliteStore::open(data_dir).map_err(|e| format!("INIT_FAILED: {e}"))?,
            ),
            StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        };

        if settings.seed_demo_data {
            seed_demo_data(store.as_ref()).map_err(|e| format!("INIT_FAILED: {e}"))?;
        }

        log::info!("Opened {:?} store in {data_dir}", settings.storage);
        Ok(Self::new(store, settings))
    }

    pub fn store(&self) -> &dyn PlatformStore {
        self.store.as_ref()
    }

    /// Stand-in for network latency when the dashboards run against this backend.
    pub async fn simulate_latency(&self) {
        if !self.settings.simulated_latency.is_zero() {
            tokio::time::sleep(self.settings.simulated_latency).await;
        }
    }
}
