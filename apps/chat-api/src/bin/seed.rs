//! Resets the database and loads demo users and messages.
//!
//! Usage:
//!   cargo run -p chat-api --bin chat-seed
//!
//! Needs DATABASE_URL and AES_SECRET (environment or .env). Run chat-migrate
//! first.

use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_api::codec::AesGcmCodec;
use chat_api::config::Config;
use chat_api::db::PgStore;
use chat_api::seed::{seed_demo_data, DEMO_PASSWORD};
use chat_common::SnowflakeGenerator;

#[tokio::main]
async fn main() {
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("info"))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let database_url = config
        .database_url
        .as_deref()
        .expect("DATABASE_URL env var is required");
    let codec = AesGcmCodec::new(&config.aes_secret).expect("invalid AES_SECRET");
    let store = PgStore::new(
        chat_api::db::pool::connect(database_url),
        SnowflakeGenerator::new(config.worker_id),
    );

    println!("Clearing existing users and messages...");
    if let Err(err) = store.reset().await {
        eprintln!("Seed error: {}", err.message);
        std::process::exit(1);
    }

    println!("Creating demo users and messages...");
    match seed_demo_data(&store, &codec).await {
        Ok(summary) => {
            for user in &summary.users {
                println!("  User: {} ({}), password {DEMO_PASSWORD}", user.username, user.id);
            }
            println!("  Messages: {}", summary.messages);
            println!("Seeding complete.");
        }
        Err(err) => {
            eprintln!("Seed error: {}", err.message);
            std::process::exit(1);
        }
    }
}
