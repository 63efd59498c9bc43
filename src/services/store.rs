//! Bot state persistence backends.
//!
//! A bot's durable state is its [`BotRecord`]: config, open positions,
//! trade history, and the intra-day convergence ledger. Records are stored
//! as JSON blobs keyed by bot id, behind one `Store` trait so the manager
//! never cares which backend is live:
//! - `MemoryStore`: process-local, for tests and throwaway runs
//! - `SqliteStore`: the default, survives restarts with zero setup
//! - `RedisStore`: shared state for multi-instance deployments; degrades
//!   to a no-op when Redis is unreachable

use crate::types::BotRecord;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Redis key prefix for bot records.
const BOT_KEY_PREFIX: &str = "marionette:bot:";

/// Errors from a persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A persistence backend for bot records.
#[axum::async_trait]
pub trait Store: Send + Sync {
    /// Fetch one record by bot id.
    async fn get(&self, id: &str) -> Result<Option<BotRecord>, StoreError>;

    /// Insert or replace a record.
    async fn put(&self, record: &BotRecord) -> Result<(), StoreError>;

    /// Remove a record. Removing a missing id is not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Fetch every stored record, for startup.
    async fn load_all(&self) -> Result<Vec<BotRecord>, StoreError>;
}

/// In-memory store. Records are kept as JSON so the serialization path
/// matches the durable backends.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[axum::async_trait]
impl Store for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<BotRecord>, StoreError> {
        match self.records.get(id) {
            Some(json) => Ok(Some(serde_json::from_str(json.value())?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &BotRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.records.insert(record.config.id.clone(), json);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records.remove(id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<BotRecord>, StoreError> {
        let mut records = Vec::with_capacity(self.records.len());
        for entry in self.records.iter() {
            records.push(serde_json::from_str(entry.value())?);
        }
        Ok(records)
    }
}

/// SQLite-backed store. The default backend: one file, no external service.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite bot store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite bot store initialized");
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS bots (
                id TEXT PRIMARY KEY,
                record_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(())
    }
}

#[axum::async_trait]
impl Store for SqliteStore {
    async fn get(&self, id: &str) -> Result<Option<BotRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT record_json FROM bots WHERE id = ?1",
            params![id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, record: &BotRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO bots (id, record_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                record_json = excluded.record_json,
                updated_at = excluded.updated_at",
            params![record.config.id, json, chrono::Utc::now().timestamp_millis()],
        )?;

        debug!("Saved bot {}", record.config.id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM bots WHERE id = ?1", params![id])?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<BotRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare("SELECT record_json FROM bots")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            let json = row?;
            match serde_json::from_str(&json) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable bot record: {}", e),
            }
        }
        Ok(records)
    }
}

/// Redis-backed store for deployments that already run Redis.
///
/// Connection failures downgrade to a warning and the store becomes a
/// no-op; the engine keeps running from memory.
#[derive(Clone)]
pub struct RedisStore {
    conn: Arc<RwLock<Option<ConnectionManager>>>,
}

impl RedisStore {
    /// Connect to Redis at the given URL.
    pub async fn new(redis_url: &str) -> Self {
        let conn = match Self::connect(redis_url).await {
            Ok(c) => {
                info!("Connected to Redis at {}", redis_url);
                Some(c)
            }
            Err(e) => {
                warn!(
                    "Failed to connect to Redis: {}. Bot state will not persist.",
                    e
                );
                None
            }
        };

        Self {
            conn: Arc::new(RwLock::new(conn)),
        }
    }

    async fn connect(redis_url: &str) -> redis::RedisResult<ConnectionManager> {
        let client = redis::Client::open(redis_url)?;
        ConnectionManager::new(client).await
    }

    /// Whether the initial connection succeeded.
    pub async fn is_connected(&self) -> bool {
        self.conn.read().await.is_some()
    }

    fn key(id: &str) -> String {
        format!("{}{}", BOT_KEY_PREFIX, id)
    }
}

#[axum::async_trait]
impl Store for RedisStore {
    async fn get(&self, id: &str) -> Result<Option<BotRecord>, StoreError> {
        let conn_guard = self.conn.read().await;
        let Some(ref conn) = *conn_guard else {
            return Ok(None);
        };

        let mut conn = conn.clone();
        let json: Option<String> = redis::cmd("GET")
            .arg(Self::key(id))
            .query_async(&mut conn)
            .await?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &BotRecord) -> Result<(), StoreError> {
        let conn_guard = self.conn.read().await;
        let Some(ref conn) = *conn_guard else {
            return Ok(());
        };

        let json = serde_json::to_string(record)?;
        let mut conn = conn.clone();
        redis::cmd("SET")
            .arg(Self::key(&record.config.id))
            .arg(json)
            .query_async::<_, ()>(&mut conn)
            .await?;

        debug!("Saved bot {} to Redis", record.config.id);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn_guard = self.conn.read().await;
        let Some(ref conn) = *conn_guard else {
            return Ok(());
        };

        let mut conn = conn.clone();
        redis::cmd("DEL")
            .arg(Self::key(id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<BotRecord>, StoreError> {
        let conn_guard = self.conn.read().await;
        let Some(ref conn) = *conn_guard else {
            return Ok(Vec::new());
        };

        let mut conn = conn.clone();
        // Cursored SCAN; KEYS would block the server on large keyspaces.
        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(format!("{}*", BOT_KEY_PREFIX))
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        // SCAN can repeat keys across iterations.
        keys.sort_unstable();
        keys.dedup();

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            let json: Option<String> = redis::cmd("GET")
                .arg(&key)
                .query_async(&mut conn)
                .await?;
            if let Some(json) = json {
                match serde_json::from_str(&json) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping unreadable bot record at {}: {}", key, e),
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BotConfig;

    fn create_test_record(id: &str) -> BotRecord {
        let mut config = BotConfig::new(
            format!("bot {}", id),
            vec!["BTC/USDT".to_string()],
            10_000.0,
        );
        config.id = id.to_string();
        BotRecord {
            config,
            positions: vec![],
            trades: vec![],
            day_stamp: 19_000,
            realized_today: 42.5,
            trades_today: 7,
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let record = create_test_record("m1");

        store.put(&record).await.unwrap();
        let loaded = store.get("m1").await.unwrap().unwrap();
        assert_eq!(loaded.config.id, "m1");
        assert_eq!(loaded.trades_today, 7);
        assert!((loaded.realized_today - 42.5).abs() < 1e-9);

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_delete() {
        let store = MemoryStore::new();
        store.put(&create_test_record("m2")).await.unwrap();
        store.delete("m2").await.unwrap();
        assert!(store.get("m2").await.unwrap().is_none());

        // deleting again is fine
        store.delete("m2").await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_store_round_trip() {
        let store = SqliteStore::new_in_memory().unwrap();
        let record = create_test_record("s1");

        store.put(&record).await.unwrap();
        let loaded = store.get("s1").await.unwrap().unwrap();
        assert_eq!(loaded.config.name, "bot s1");
        assert_eq!(loaded.day_stamp, 19_000);
    }

    #[tokio::test]
    async fn test_sqlite_store_upsert_keeps_one_row() {
        let store = SqliteStore::new_in_memory().unwrap();
        let mut record = create_test_record("s2");

        store.put(&record).await.unwrap();
        record.trades_today = 99;
        store.put(&record).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].trades_today, 99);
    }

    #[tokio::test]
    async fn test_sqlite_store_load_all() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.put(&create_test_record("a")).await.unwrap();
        store.put(&create_test_record("b")).await.unwrap();
        store.put(&create_test_record("c")).await.unwrap();
        store.delete("b").await.unwrap();

        let mut ids: Vec<String> = store
            .load_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.config.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "c".to_string()]);
    }
}
