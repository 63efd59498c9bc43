use std::env;

/// Which persistence backend holds bot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory only; state is lost on restart.
    Memory,
    /// Embedded SQLite database file.
    Sqlite,
    /// Redis, shared across server instances.
    Redis,
}

impl StoreBackend {
    /// Parse a backend name, falling back to SQLite for unknown values.
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "memory" => Self::Memory,
            "redis" => Self::Redis,
            _ => Self::Sqlite,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Persistence backend for bot state.
    pub store_backend: StoreBackend,
    /// SQLite database path (used when the backend is SQLite).
    pub sqlite_path: String,
    /// Redis URL (used when the backend is Redis).
    pub redis_url: String,
    /// Pairs the simulated feed publishes prices for.
    pub trading_pairs: Vec<String>,
    /// Feed tick interval in ms; each tick advances every bot once.
    pub feed_interval_ms: u64,
    /// Interval between periodic persistence sweeps (seconds).
    pub persist_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        // Format: "BTC/USDT,ETH/USDT"
        let trading_pairs = env::var("TRADING_PAIRS")
            .ok()
            .map(|s| parse_pairs(&s))
            .filter(|pairs| !pairs.is_empty())
            .unwrap_or_else(default_pairs);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            store_backend: env::var("STORE_BACKEND")
                .ok()
                .map(|v| StoreBackend::parse(&v))
                .unwrap_or(StoreBackend::Sqlite),
            sqlite_path: env::var("MARIONETTE_DB").unwrap_or_else(|_| "marionette.db".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            trading_pairs,
            feed_interval_ms: env::var("FEED_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1000),
            persist_interval_secs: env::var("PERSIST_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_pairs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn default_pairs() -> Vec<String> {
    ["BTC/USDT", "ETH/USDT", "SOL/USDT", "XRP/USDT", "DOGE/USDT"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}
