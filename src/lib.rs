pub mod commands;
pub mod engine;
pub mod error;
pub mod models;
pub mod seed;
pub mod state;
pub mod store;

pub use error::{PlatformError, PlatformResult};
pub use state::AppState;

/// Install the `env_logger` backend. Defaults to `info`, overridable with
/// `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
