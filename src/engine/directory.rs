use sha2::{Digest, Sha256};

use crate::error::{PlatformError, PlatformResult};
use crate::models::proposal::now_millis;
use crate::models::user::{NewUser, User, UserRole};
use crate::store::PlatformStore;

const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

pub fn register_user(store: &dyn PlatformStore, new_user: NewUser) -> PlatformResult<User> {
    let email = new_user.email.trim().to_lowercase();
    let name = new_user.name.trim().to_string();
    validate_registration(&email, &name, &new_user.password)?;

    let now = now_millis();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        name,
        role: new_user.role,
        password_hash: hash_password(&new_user.password),
        created_at: now,
        updated_at: now,
    };
    store.insert_user(&user)?;

    log::info!("Registered {} account {}", user.role, user.email);
    Ok(user)
}

fn validate_registration(email: &str, name: &str, password: &str) -> PlatformResult<()> {
    let valid_email = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid_email {
        return Err(PlatformError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    if name.is_empty() {
        return Err(PlatformError::Validation("Name is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PlatformError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn verify_credentials(
    store: &dyn PlatformStore,
    email: &str,
    password: &str,
) -> PlatformResult<User> {
    let invalid = || PlatformError::Unauthorized("Invalid email or password".to_string());
    let user = store.find_user_by_email(email.trim())?.ok_or_else(invalid)?;
    if user.password_hash != hash_password(password) {
        log::warn!("Rejected login for {}", user.email);
        return Err(invalid());
    }
    Ok(user)
}

pub fn get_user(store: &dyn PlatformStore, user_id: &str) -> PlatformResult<User> {
    store
        .get_user(user_id)?
        .ok_or_else(|| PlatformError::NotFound("User not found".to_string()))
}

pub fn find_user_by_email(store: &dyn PlatformStore, email: &str) -> PlatformResult<User> {
    store
        .find_user_by_email(email.trim())?
        .ok_or_else(|| PlatformError::NotFound("User not found".to_string()))
}

pub fn list_users(store: &dyn PlatformStore, role: Option<UserRole>) -> PlatformResult<Vec<User>> {
    store.list_users(role)
}
