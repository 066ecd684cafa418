use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_api::codec::{AesGcmCodec, ContentCodec};
use chat_api::config::Config;
use chat_api::db::{ChatStore, MemoryStore, PgStore};
use chat_api::longpoll::MessageBroker;
use chat_api::AppState;
use chat_common::SnowflakeGenerator;

#[tokio::main]
async fn main() {
    // Load .env if present; variables may also come from the environment.
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let snowflake = SnowflakeGenerator::new(config.worker_id);
    let store: Arc<dyn ChatStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::new(chat_api::db::pool::connect(url), snowflake)),
        None => {
            tracing::warn!("DATABASE_URL not set; users and messages are kept in memory");
            Arc::new(MemoryStore::new(snowflake))
        }
    };

    let codec: Arc<dyn ContentCodec> =
        Arc::new(AesGcmCodec::new(&config.aes_secret).expect("invalid AES_SECRET"));

    tracing::info!(
        long_poll_timeout_secs = config.long_poll_timeout.as_secs(),
        recent_limit = config.recent_limit,
        "chat-api configured"
    );

    let state = AppState {
        store,
        codec,
        broker: Arc::new(MessageBroker::new()),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(chat_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "chat-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(?err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
