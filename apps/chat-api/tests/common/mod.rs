#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;

use chat_api::codec::AesGcmCodec;
use chat_api::config::{Config, DEFAULT_LONG_POLL_TIMEOUT, DEFAULT_RECENT_LIMIT};
use chat_api::db::{ChatStore, MemoryStore};
use chat_api::error::ApiError;
use chat_api::longpoll::MessageBroker;
use chat_api::models::message::Message;
use chat_api::models::user::User;
use chat_api::AppState;

pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

pub fn test_config(long_poll_timeout: Duration) -> Config {
    Config {
        database_url: None,
        aes_secret: TEST_SECRET.to_string(),
        port: 0,
        long_poll_timeout,
        recent_limit: DEFAULT_RECENT_LIMIT,
        worker_id: 0,
    }
}

/// Build an AppState over the given store.
pub fn state_with(store: Arc<dyn ChatStore>, long_poll_timeout: Duration) -> AppState {
    AppState {
        store,
        codec: Arc::new(AesGcmCodec::new(TEST_SECRET).expect("test secret")),
        broker: Arc::new(MessageBroker::new()),
        config: Arc::new(test_config(long_poll_timeout)),
    }
}

/// In-memory state with the production long-poll timeout.
pub fn test_state() -> AppState {
    state_with(Arc::new(MemoryStore::default()), DEFAULT_LONG_POLL_TIMEOUT)
}

/// In-memory state with a custom long-poll timeout.
pub fn test_state_with_timeout(long_poll_timeout: Duration) -> AppState {
    state_with(Arc::new(MemoryStore::default()), long_poll_timeout)
}

/// Build the full application router wired to `state`.
pub fn test_app(state: AppState) -> Router {
    chat_api::routes::router().with_state(state)
}

/// Serve the app on an ephemeral local port in the background.
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let app = test_app(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// Wait (up to five seconds) until the broker has exactly `n` waiters.
pub async fn wait_for_waiters(broker: &MessageBroker, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while broker.waiting() != n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {n} waiters, found {}", broker.waiting()));
}

/// Register a user directly through the store and return it.
pub async fn create_user(state: &AppState, username: &str) -> User {
    chat_api::auth::create_user(state.store.as_ref(), username, "password123")
        .await
        .expect("create test user")
}

/// A store whose every operation fails, as an unreachable database would.
pub struct FailingStore;

fn unavailable() -> ApiError {
    ApiError::internal("store unavailable")
}

#[async_trait]
impl ChatStore for FailingStore {
    async fn create_user(&self, _username: &str, _password_hash: &str) -> Result<User, ApiError> {
        Err(unavailable())
    }

    async fn find_user_by_username(&self, _username: &str) -> Result<Option<User>, ApiError> {
        Err(unavailable())
    }

    async fn find_user_by_id(&self, _id: &str) -> Result<Option<User>, ApiError> {
        Err(unavailable())
    }

    async fn insert_message(&self, _sender_id: &str, _encrypted_content: &str) -> Result<Message, ApiError> {
        Err(unavailable())
    }

    async fn recent_messages(&self, _limit: i64) -> Result<Vec<Message>, ApiError> {
        Err(unavailable())
    }
}

/// A working store whose user lookups fail, for exercising the username
/// fallback.
pub struct FlakyUserLookupStore(pub MemoryStore);

#[async_trait]
impl ChatStore for FlakyUserLookupStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, ApiError> {
        self.0.create_user(username, password_hash).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        self.0.find_user_by_username(username).await
    }

    async fn find_user_by_id(&self, _id: &str) -> Result<Option<User>, ApiError> {
        Err(unavailable())
    }

    async fn insert_message(&self, sender_id: &str, encrypted_content: &str) -> Result<Message, ApiError> {
        self.0.insert_message(sender_id, encrypted_content).await
    }

    async fn recent_messages(&self, limit: i64) -> Result<Vec<Message>, ApiError> {
        self.0.recent_messages(limit).await
    }
}
