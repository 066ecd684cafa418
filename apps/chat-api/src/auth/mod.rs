//! User registration and credential checks.
//!
//! Token issuance and request authorization are handled upstream; this
//! module only creates users and verifies passwords.

pub mod password;

use crate::db::ChatStore;
use crate::error::{ApiError, FieldError};
use crate::models::user::User;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Validate and create a new user with an Argon2id password hash.
pub async fn create_user(store: &dyn ChatStore, username: &str, password: &str) -> Result<User, ApiError> {
    let username = username.trim();

    let mut errors = Vec::new();
    if username.len() < 2 || username.len() > 32 {
        errors.push(FieldError::new("username", "Username must be 2–32 characters"));
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
    {
        errors.push(FieldError::new(
            "username",
            "Username may only contain letters, digits, underscores, dots, and hyphens",
        ));
    }
    if password.len() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if !errors.is_empty() {
        return Err(ApiError::validation(errors));
    }

    let password_hash = password::hash_password(password)?;
    let user = store.create_user(username, &password_hash).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Look up `username` and check `password` against the stored hash.
///
/// Unknown users and wrong passwords produce the same error.
pub async fn authenticate_user(store: &dyn ChatStore, username: &str, password: &str) -> Result<User, ApiError> {
    let user = store
        .find_user_by_username(username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    password::verify_password(password, &user.password_hash)?;

    tracing::info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(user)
}

pub(crate) fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid username or password")
}
