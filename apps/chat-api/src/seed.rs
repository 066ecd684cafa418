//! Demo data for local development.

use crate::auth;
use crate::codec::ContentCodec;
use crate::db::ChatStore;
use crate::error::ApiError;
use crate::models::user::User;

pub const DEMO_PASSWORD: &str = "password123";
pub const DEMO_USERNAMES: [&str; 2] = ["alice", "bob"];
pub const DEMO_TEXTS: [&str; 5] = [
    "Hello world!",
    "Welcome to Secure Chat",
    "This is encrypted",
    "Nice to meet you",
    "Testing message history",
];

#[derive(Debug)]
pub struct SeedSummary {
    pub users: Vec<User>,
    pub messages: usize,
}

/// Create the demo users and a short history sent by the first of them.
///
/// Expects an empty store; existing usernames fail with `409 CONFLICT`.
pub async fn seed_demo_data(store: &dyn ChatStore, codec: &dyn ContentCodec) -> Result<SeedSummary, ApiError> {
    let mut users = Vec::with_capacity(DEMO_USERNAMES.len());
    for username in DEMO_USERNAMES {
        users.push(auth::create_user(store, username, DEMO_PASSWORD).await?);
    }

    let sender = &users[0];
    for text in DEMO_TEXTS {
        let encrypted = codec.encode(text)?;
        store.insert_message(&sender.id, &encrypted).await?;
    }

    tracing::info!(users = users.len(), messages = DEMO_TEXTS.len(), "demo data seeded");
    Ok(SeedSummary {
        users,
        messages: DEMO_TEXTS.len(),
    })
}
