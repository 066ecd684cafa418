use std::time::Duration;

/// Chat API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. When absent the service keeps users and
    /// messages in memory.
    pub database_url: Option<String>,
    /// Key material for the message content codec (at least 32 characters).
    pub aes_secret: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// How long a `GET /api/messages/subscribe` request is held open.
    pub long_poll_timeout: Duration,
    /// Number of messages returned by `GET /api/messages/recent` when no
    /// `limit` is given.
    pub recent_limit: i64,
    /// Snowflake worker id for message ids.
    pub worker_id: u16,
}

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_LONG_POLL_TIMEOUT: Duration = Duration::from_secs(50);
pub const DEFAULT_RECENT_LIMIT: i64 = 50;

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            database_url: var("DATABASE_URL"),
            aes_secret: var("AES_SECRET")
                .unwrap_or_else(|| panic!("AES_SECRET env var is required")),
            port: parsed(var("PORT")).unwrap_or(DEFAULT_PORT),
            long_poll_timeout: parsed(var("LONG_POLL_TIMEOUT_SECS"))
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LONG_POLL_TIMEOUT),
            recent_limit: parsed(var("RECENT_MESSAGES_LIMIT"))
                .filter(|n: &i64| *n > 0)
                .unwrap_or(DEFAULT_RECENT_LIMIT),
            worker_id: parsed(var("WORKER_ID")).unwrap_or(0),
        }
    }
}

fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}
