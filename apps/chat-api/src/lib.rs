pub mod auth;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod longpoll;
pub mod messages;
pub mod models;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use codec::ContentCodec;
use config::Config;
use db::ChatStore;
use longpoll::MessageBroker;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub codec: Arc<dyn ContentCodec>,
    pub broker: Arc<MessageBroker>,
    pub config: Arc<Config>,
}
