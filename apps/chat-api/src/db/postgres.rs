use async_trait::async_trait;
use chat_common::id::{prefix, prefixed_ulid};
use chat_common::SnowflakeGenerator;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, OptionalExtension};
use diesel_async::RunQueryDsl;

use super::pool::DbPool;
use super::schema::{messages, users};
use super::store::{duplicate_username, ChatStore};
use crate::error::ApiError;
use crate::models::message::{Message, NewMessage};
use crate::models::user::User;

/// Postgres-backed [`ChatStore`].
pub struct PgStore {
    db: DbPool,
    snowflake: SnowflakeGenerator,
}

impl PgStore {
    pub fn new(db: DbPool, snowflake: SnowflakeGenerator) -> Self {
        Self { db, snowflake }
    }

    /// Delete every message and user. Used by the seed binary.
    pub async fn reset(&self) -> Result<(), ApiError> {
        let mut conn = self.db.get().await?;

        diesel::delete(messages::table).execute(&mut conn).await?;
        diesel::delete(users::table).execute(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, ApiError> {
        let mut conn = self.db.get().await?;

        let new_user = User {
            id: prefixed_ulid(prefix::USER),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    duplicate_username()
                }
                other => ApiError::from(other),
            })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        let mut conn = self.db.get().await?;

        let user = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ApiError> {
        let mut conn = self.db.get().await?;

        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(user)
    }

    async fn insert_message(&self, sender_id: &str, encrypted_content: &str) -> Result<Message, ApiError> {
        let mut conn = self.db.get().await?;

        let message = diesel::insert_into(messages::table)
            .values(NewMessage {
                id: self.snowflake.generate(),
                sender_id,
                encrypted_content,
                created_at: Utc::now(),
            })
            .returning(Message::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(message)
    }

    async fn recent_messages(&self, limit: i64) -> Result<Vec<Message>, ApiError> {
        let mut conn = self.db.get().await?;

        let mut newest_first: Vec<Message> = messages::table
            .order((messages::created_at.desc(), messages::id.desc()))
            .limit(limit.max(0))
            .select(Message::as_select())
            .load(&mut conn)
            .await?;

        newest_first.reverse();
        Ok(newest_first)
    }
}
