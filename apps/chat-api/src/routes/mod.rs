pub mod auth;
pub mod health;
pub mod messages;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/api",
        health::router()
            .merge(auth::router())
            .merge(messages::router()),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Auth
        auth::register,
        auth::login,
        // Messages
        messages::send_message,
        messages::subscribe,
        messages::recent_messages,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::message::MessageDto,
            crate::models::user::UserResponse,
            // Route request/response types
            health::HealthResponse,
            auth::CredentialsRequest,
            auth::RegisterResponse,
            auth::LoginResponse,
            messages::SendMessageRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Auth", description = "User registration and login"),
        (name = "Messages", description = "Sending, history and long-poll delivery"),
    )
)]
pub struct ApiDoc;
