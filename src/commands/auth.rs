use crate::engine::directory;
use crate::models::user::{NewUser, Session, User, UserRole};
use crate::state::AppState;

pub async fn register(state: &AppState, new_user: NewUser) -> Result<User, String> {
    state.simulate_latency().await;
    directory::register_user(state.store(), new_user).map_err(|e| e.to_string())
}

pub async fn login(state: &AppState, email: String, password: String) -> Result<Session, String> {
    state.simulate_latency().await;
    state
        .sessions
        .login(state.store(), &email, &password)
        .map_err(|e| e.to_string())
}

pub async fn logout(state: &AppState, token: String) -> Result<(), String> {
    state.sessions.logout(&token).map_err(|e| e.to_string())
}

pub async fn get_current_user(state: &AppState, token: String) -> Result<User, String> {
    state.simulate_latency().await;
    state
        .sessions
        .current_user(state.store(), &token)
        .map_err(|e| e.to_string())
}

pub async fn get_user(state: &AppState, user_id: String) -> Result<User, String> {
    state.simulate_latency().await;
    directory::get_user(state.store(), &user_id).map_err(|e| e.to_string())
}

pub async fn get_user_by_email(state: &AppState, email: String) -> Result<User, String> {
    state.simulate_latency().await;
    directory::find_user_by_email(state.store(), &email).map_err(|e| e.to_string())
}

pub async fn list_users(
    state: &AppState,
    token: String,
    role: Option<UserRole>,
) -> Result<Vec<User>, String> {
    state.simulate_latency().await;
    state
        .sessions
        .require_role(&token, &[UserRole::Admin])
        .map_err(|e| e.to_string())?;
    directory::list_users(state.store(), role).map_err(|e| e.to_string())
}

pub async fn list_officers(state: &AppState) -> Result<Vec<User>, String> {
    state.simulate_latency().await;
    directory::list_users(state.store(), Some(UserRole::Officer)).map_err(|e| e.to_string())
}
