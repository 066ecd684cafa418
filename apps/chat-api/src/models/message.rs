use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::schema::messages;

/// A persisted chat message. Never modified after the store creates it.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub encrypted_content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage<'a> {
    pub id: i64,
    pub sender_id: &'a str,
    pub encrypted_content: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Username reported when the sender cannot be resolved.
pub const UNKNOWN_USERNAME: &str = "Unknown";

/// Wire representation of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    /// Snowflake id, serialized as a string.
    pub id: String,
    pub sender_id: String,
    pub username: String,
    pub text: String,
    /// ISO-8601 timestamp with millisecond precision.
    pub created_at: String,
}
