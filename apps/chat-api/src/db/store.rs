use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::message::Message;
use crate::models::user::User;

/// Persistence gateway for users and messages.
///
/// Backed by Postgres in production and an in-memory store in tests or when
/// no `DATABASE_URL` is configured. The store owns id and timestamp
/// assignment for everything it creates.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a user. Fails with `409 CONFLICT` if the username is taken.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, ApiError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ApiError>;

    /// Persist a message, assigning its id and `created_at`.
    async fn insert_message(&self, sender_id: &str, encrypted_content: &str) -> Result<Message, ApiError>;

    /// The newest `limit` messages, oldest first.
    async fn recent_messages(&self, limit: i64) -> Result<Vec<Message>, ApiError>;
}

pub(crate) fn duplicate_username() -> ApiError {
    ApiError::conflict("Username already exists")
}
