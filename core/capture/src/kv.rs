use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Durable key-value storage holding whole JSON values per key
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Value at `key`, or `fallback` when absent
    async fn get_or(&self, key: &str, fallback: Value) -> Result<Value> {
        Ok(self.get(key).await?.unwrap_or(fallback))
    }
}

/// SQLite-backed store, one row per key
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        let store = Self::from_connection(conn)?;
        info!("Key-value store initialized at {}", path.display());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create kv_store table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.conn.lock().await;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read key {}", key))?;

        raw.map(|text| {
            serde_json::from_str(&text).with_context(|| format!("Corrupt value under key {}", key))
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, text, Utc::now().to_rfc3339()],
        )
        .with_context(|| format!("Failed to write key {}", key))?;

        debug!("Stored {} bytes under {}", text.len(), key);
        Ok(())
    }
}

/// Process-local store for tests and one-shot runs
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}
