//! Send and history pipelines, and the message → DTO shaping shared with the
//! long-poll endpoint.

use std::collections::HashMap;

use chat_common::time::to_iso8601;
use futures_util::future::join_all;

use crate::error::{ApiError, FieldError};
use crate::models::message::{Message, MessageDto, UNKNOWN_USERNAME};
use crate::AppState;

/// Upper bound for `GET /api/messages/recent?limit=`.
pub const MAX_RECENT_LIMIT: i64 = 100;

/// Validate, persist, publish, then shape a new message.
///
/// Nothing is persisted or published unless both fields are present, and the
/// message reaches the broker only after the store has accepted it.
pub async fn send_message(
    state: &AppState,
    sender_id: Option<&str>,
    text: Option<&str>,
) -> Result<MessageDto, ApiError> {
    let (sender_id, text) = validate_send(sender_id, text)?;

    let encrypted = state.codec.encode(text)?;
    let message = state.store.insert_message(sender_id, &encrypted).await?;

    let outcome = state.broker.publish(message.clone());
    tracing::info!(message_id = message.id, %sender_id, ?outcome, "message sent");

    to_dto(state, &message).await
}

fn validate_send<'a>(
    sender_id: Option<&'a str>,
    text: Option<&'a str>,
) -> Result<(&'a str, &'a str), ApiError> {
    let sender_id = sender_id.filter(|s| !s.is_empty());
    let text = text.filter(|t| !t.is_empty());

    let mut errors = Vec::new();
    if sender_id.is_none() {
        errors.push(FieldError::new("senderId", "senderId is required"));
    }
    if text.is_none() {
        errors.push(FieldError::new("text", "text is required"));
    }

    match (sender_id, text) {
        (Some(sender_id), Some(text)) => Ok((sender_id, text)),
        _ => Err(ApiError::validation(errors)),
    }
}

/// The newest messages, oldest first. `limit` defaults to the configured
/// history size and is clamped to `1..=MAX_RECENT_LIMIT`.
pub async fn recent_messages(state: &AppState, limit: Option<i64>) -> Result<Vec<MessageDto>, ApiError> {
    let limit = limit
        .unwrap_or(state.config.recent_limit)
        .clamp(1, MAX_RECENT_LIMIT);

    let messages = state.store.recent_messages(limit).await?;
    to_dto_list(state, &messages).await
}

pub async fn to_dto(state: &AppState, message: &Message) -> Result<MessageDto, ApiError> {
    let username = resolve_username(state, &message.sender_id).await;
    shape(state, message, username)
}

/// Shape a batch, looking up each distinct sender once.
pub async fn to_dto_list(state: &AppState, messages: &[Message]) -> Result<Vec<MessageDto>, ApiError> {
    let mut senders: Vec<&str> = messages.iter().map(|m| m.sender_id.as_str()).collect();
    senders.sort_unstable();
    senders.dedup();

    let names = join_all(senders.iter().map(|sender| resolve_username(state, sender))).await;
    let usernames: HashMap<&str, String> = senders.into_iter().zip(names).collect();

    messages
        .iter()
        .map(|message| {
            let username = usernames
                .get(message.sender_id.as_str())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_string());
            shape(state, message, username)
        })
        .collect()
}

fn shape(state: &AppState, message: &Message, username: String) -> Result<MessageDto, ApiError> {
    Ok(MessageDto {
        id: message.id.to_string(),
        sender_id: message.sender_id.clone(),
        username,
        text: state.codec.decode(&message.encrypted_content)?,
        created_at: to_iso8601(message.created_at),
    })
}

/// Display name for a sender. Lookup failures degrade to
/// [`UNKNOWN_USERNAME`] instead of failing the response.
async fn resolve_username(state: &AppState, sender_id: &str) -> String {
    match state.store.find_user_by_id(sender_id).await {
        Ok(Some(user)) => user.username,
        Ok(None) => UNKNOWN_USERNAME.to_string(),
        Err(err) => {
            tracing::warn!(%sender_id, error = %err.message, "username lookup failed");
            UNKNOWN_USERNAME.to_string()
        }
    }
}
