use std::collections::HashMap;

use async_trait::async_trait;
use chat_common::id::{prefix, prefixed_ulid};
use chat_common::SnowflakeGenerator;
use chrono::Utc;
use parking_lot::Mutex;

use super::store::{duplicate_username, ChatStore};
use crate::error::ApiError;
use crate::models::message::Message;
use crate::models::user::User;

#[derive(Default)]
struct Inner {
    users: HashMap<String, User>,
    /// Append-only, in insertion order.
    messages: Vec<Message>,
}

/// In-memory [`ChatStore`]. Contents live as long as the process.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    snowflake: SnowflakeGenerator,
}

impl MemoryStore {
    pub fn new(snowflake: SnowflakeGenerator) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            snowflake,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(SnowflakeGenerator::new(0))
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, ApiError> {
        let mut inner = self.inner.lock();
        if inner.users.values().any(|u| u.username == username) {
            return Err(duplicate_username());
        }

        let user = User {
            id: prefixed_ulid(prefix::USER),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let inner = self.inner.lock();
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        Ok(self.inner.lock().users.get(id).cloned())
    }

    async fn insert_message(&self, sender_id: &str, encrypted_content: &str) -> Result<Message, ApiError> {
        let mut inner = self.inner.lock();
        // Id and timestamp are taken under the lock so vector order, id order
        // and created_at order agree.
        let message = Message {
            id: self.snowflake.generate(),
            sender_id: sender_id.to_string(),
            encrypted_content: encrypted_content.to_string(),
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn recent_messages(&self, limit: i64) -> Result<Vec<Message>, ApiError> {
        let inner = self.inner.lock();
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let start = inner.messages.len().saturating_sub(limit);
        Ok(inner.messages[start..].to_vec())
    }
}
