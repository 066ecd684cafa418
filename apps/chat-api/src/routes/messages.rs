//! Message endpoints: send, long-poll subscribe, recent history.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiErrorBody};
use crate::longpoll::{LongPoll, Resolution};
use crate::messages;
use crate::models::message::MessageDto;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages/send", post(send_message))
        .route("/messages/subscribe", get(subscribe))
        .route("/messages/recent", get(recent_messages))
}

// ---------------------------------------------------------------------------
// POST /api/messages/send
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// `POST /api/messages/send`: Persist a message and wake waiting subscribers.
#[utoipa::path(
    post,
    path = "/api/messages/send",
    tag = "Messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message created", body = MessageDto),
        (status = 400, description = "Missing senderId or text", body = ApiErrorBody),
        (status = 500, description = "Persistence failure", body = ApiErrorBody),
    ),
)]
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let dto = messages::send_message(&state, body.sender_id.as_deref(), body.text.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(dto)))
}

// ---------------------------------------------------------------------------
// GET /api/messages/subscribe
// ---------------------------------------------------------------------------

/// `GET /api/messages/subscribe`: Hold the request open until a message
/// arrives or the long-poll timeout elapses.
///
/// If the client disconnects first, axum drops this future and the session
/// withdraws its subscription; nothing is written.
#[utoipa::path(
    get,
    path = "/api/messages/subscribe",
    tag = "Messages",
    responses(
        (status = 200, description = "Delivered batch, or an empty array on timeout", body = [MessageDto]),
        (status = 500, description = "Delivered batch could not be decoded", body = ApiErrorBody),
    ),
)]
pub async fn subscribe(State(state): State<AppState>) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let session = LongPoll::start(&state.broker, state.config.long_poll_timeout);

    match session.resolve().await {
        Resolution::Delivered(batch) => {
            let dtos = messages::to_dto_list(&state, &batch).await.inspect_err(|_| {
                tracing::error!(count = batch.len(), "long poll: error delivering messages");
            })?;
            Ok(Json(dtos))
        }
        Resolution::TimedOut => Ok(Json(Vec::new())),
    }
}

// ---------------------------------------------------------------------------
// GET /api/messages/recent
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentParams {
    /// Number of messages to return (1-100, default 50).
    pub limit: Option<i64>,
}

/// `GET /api/messages/recent`: Latest messages, oldest first.
#[utoipa::path(
    get,
    path = "/api/messages/recent",
    tag = "Messages",
    params(RecentParams),
    responses(
        (status = 200, description = "Recent messages, oldest first", body = [MessageDto]),
        (status = 500, description = "Failed to load messages", body = ApiErrorBody),
    ),
)]
pub async fn recent_messages(
    State(state): State<AppState>,
    params: Result<Query<RecentParams>, QueryRejection>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let dtos = messages::recent_messages(&state, params.limit).await?;
    Ok(Json(dtos))
}
