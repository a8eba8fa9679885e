//! Durable recipe storage keyed by recipe identity.
//!
//! Records are stored whole, as their JSON contract form. Reads return a
//! complete record or nothing; writes overwrite unconditionally.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{RecipeId, RecipeRecord};

/// Keyed read/write of recipe records
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Fetch the record stored under `id`, if any
    async fn get(&self, id: &RecipeId) -> Result<Option<RecipeRecord>>;

    /// Store `record` under its id, replacing whatever was there
    async fn put(&self, record: &RecipeRecord) -> Result<()>;
}

/// SQLite-backed store: one row per recipe id
pub struct SqliteRecipeStore {
    conn: Mutex<Connection>,
}

impl SqliteRecipeStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open recipe database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS recipes (
                recipe_id  TEXT PRIMARY KEY,
                record     TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to initialize recipe schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Recipe database lock poisoned"))
    }

    /// Number of stored records
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))
            .context("Failed to count recipes")?;
        Ok(count as usize)
    }
}

#[async_trait]
impl RecipeStore for SqliteRecipeStore {
    async fn get(&self, id: &RecipeId) -> Result<Option<RecipeRecord>> {
        let json: Option<String> = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT record FROM recipes WHERE recipe_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read recipe {}", id))?
        };

        json.map(|json| {
            serde_json::from_str(&json)
                .with_context(|| format!("Stored recipe {} is not valid JSON", id))
        })
        .transpose()
    }

    async fn put(&self, record: &RecipeRecord) -> Result<()> {
        let json = serde_json::to_string(record).context("Failed to serialize recipe")?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO recipes (recipe_id, record, updated_at) VALUES (?1, ?2, ?3)",
            params![record.recipe_id.as_str(), json, Utc::now().to_rfc3339()],
        )
        .with_context(|| format!("Failed to write recipe {}", record.recipe_id))?;

        Ok(())
    }
}

/// Process-local store holding serialized records
#[derive(Default)]
pub struct MemoryRecipeStore {
    records: Mutex<HashMap<RecipeId, String>>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn get(&self, id: &RecipeId) -> Result<Option<RecipeRecord>> {
        let json = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("Recipe store lock poisoned"))?
            .get(id)
            .cloned();

        json.map(|json| serde_json::from_str(&json).context("Failed to parse stored recipe"))
            .transpose()
    }

    async fn put(&self, record: &RecipeRecord) -> Result<()> {
        let json = serde_json::to_string(record).context("Failed to serialize recipe")?;
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("Recipe store lock poisoned"))?
            .insert(record.recipe_id.clone(), json);
        Ok(())
    }
}
