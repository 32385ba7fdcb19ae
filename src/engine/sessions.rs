//! Login sessions keyed by opaque bearer tokens.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::engine::directory;
use crate::error::{PlatformError, PlatformResult};
use crate::models::proposal::now_millis;
use crate::models::user::{Session, User, UserRole};
use crate::store::PlatformStore;

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl_millis: i64,
}

fn expired() -> PlatformError {
    PlatformError::Unauthorized("Session expired or invalid".to_string())
}

fn poisoned<T>(_: T) -> PlatformError {
    PlatformError::Storage("Session lock poisoned".to_string())
}

impl SessionStore {
    pub fn new(ttl_minutes: u32) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl_millis: i64::from(ttl_minutes) * 60_000,
        }
    }

    pub fn login(
        &self,
        store: &dyn PlatformStore,
        email: &str,
        password: &str,
    ) -> PlatformResult<Session> {
        let user = directory::verify_credentials(store, email, password)?;
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            user_id: user.id,
            email: user.email,
            role: user.role,
            created_at: now_millis(),
        };

        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let now = session.created_at;
        sessions.retain(|_, s| now - s.created_at <= self.ttl_millis);
        sessions.insert(session.token.clone(), session.clone());
        drop(sessions);
        log::info!("{} session opened for {}", session.role, session.email);
        Ok(session)
    }

    pub fn logout(&self, token: &str) -> PlatformResult<()> {
        let removed = self.sessions.write().map_err(poisoned)?.remove(token);
        if let Some(session) = removed {
            log::info!("Session closed for {}", session.email);
        }
        Ok(())
    }

    pub fn session(&self, token: &str) -> PlatformResult<Session> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let session = sessions.get(token).cloned().ok_or_else(expired)?;
        if now_millis() - session.created_at > self.ttl_millis {
            sessions.remove(token);
            return Err(expired());
        }
        Ok(session)
    }

    pub fn current_user(&self, store: &dyn PlatformStore, token: &str) -> PlatformResult<User> {
        let session = self.session(token)?;
        store.get_user(&session.user_id)?.ok_or_else(expired)
    }

    /// Resolve `token` and check its role. Unknown tokens are `Unauthorized`,
    /// known tokens with another role are `Forbidden`.
    pub fn require_role(&self, token: &str, allowed: &[UserRole]) -> PlatformResult<Session> {
        let session = self.session(token)?;
        if !allowed.contains(&session.role) {
            log::warn!("{} denied access requiring {:?}", session.email, allowed);
            return Err(PlatformError::Forbidden("Access denied".to_string()));
        }
        Ok(session)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.read().expect("session lock").len()
    }

    #[cfg(test)]
    fn backdate(&self, token: &str, millis: i64) {
        if let Some(session) = self.sessions.write().expect("session lock").get_mut(token) {
            session.created_at -= millis;
        }
    }
}
