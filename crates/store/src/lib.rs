//! Client-state container. The persisted slices (favorites, search history,
//! trip draft, budget-optimization flag) live in one snapshot object that is
//! loaded at startup, mutated only through the setters here and flushed to an
//! injected key-value backend on every mutation.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use voyage_core::TripDraft;

const SNAPSHOT_KEY: &str = "planner_state";
const SEARCH_HISTORY_LIMIT: usize = 50;

/// Key-value persistence capability. Backends only need get/set by string
/// key; everything else is the container's business.
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct MemoryKv {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("failed connecting to sqlite at {database_url}"))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS state_slices (
              slice_key TEXT PRIMARY KEY,
              payload TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl KvStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT payload FROM state_slices WHERE slice_key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("payload")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO state_slices (slice_key, payload)
            VALUES (?1, ?2)
            ON CONFLICT(slice_key) DO UPDATE SET payload=excluded.payload
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub enum Kv {
    Memory(MemoryKv),
    Sqlite(SqliteKv),
}

impl Kv {
    pub fn memory() -> Self {
        Self::Memory(MemoryKv::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteKv::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }
}

impl KvStore for Kv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Kv::Memory(store) => store.get(key).await,
            Kv::Sqlite(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Kv::Memory(store) => store.set(key, value).await,
            Kv::Sqlite(store) => store.set(key, value).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerSnapshot {
    pub favorites: Vec<String>,
    pub search_history: Vec<SearchHistoryEntry>,
    pub trip_draft: TripDraft,
    pub budget_optimization: bool,
}

pub struct PlannerState<S: KvStore> {
    backend: Arc<S>,
    snapshot: RwLock<PlannerSnapshot>,
}

impl<S: KvStore> PlannerState<S> {
    /// Initializes from the persisted snapshot, or from defaults when the
    /// backend holds nothing yet.
    pub async fn load(backend: Arc<S>) -> Result<Self> {
        let snapshot = match backend.get(SNAPSHOT_KEY).await? {
            Some(raw) => {
                serde_json::from_str(&raw).context("persisted planner snapshot is corrupt")?
            }
            None => PlannerSnapshot::default(),
        };

        Ok(Self {
            backend,
            snapshot: RwLock::new(snapshot),
        })
    }

    pub fn snapshot(&self) -> PlannerSnapshot {
        self.snapshot.read().clone()
    }

    pub fn favorites(&self) -> Vec<String> {
        self.snapshot.read().favorites.clone()
    }

    pub fn search_history(&self) -> Vec<SearchHistoryEntry> {
        self.snapshot.read().search_history.clone()
    }

    pub fn trip_draft(&self) -> TripDraft {
        self.snapshot.read().trip_draft.clone()
    }

    pub fn budget_optimization(&self) -> bool {
        self.snapshot.read().budget_optimization
    }

    /// Returns whether the id is a favorite after the toggle.
    pub async fn toggle_favorite(&self, id: &str) -> Result<bool> {
        let now_favorite = {
            let mut guard = self.snapshot.write();
            if let Some(pos) = guard.favorites.iter().position(|fav| fav == id) {
                guard.favorites.remove(pos);
                false
            } else {
                guard.favorites.push(id.to_string());
                true
            }
        };

        self.flush().await?;
        Ok(now_favorite)
    }

    pub async fn record_search(&self, query: &str) -> Result<()> {
        {
            let mut guard = self.snapshot.write();
            guard.search_history.push(SearchHistoryEntry {
                query: query.to_string(),
                at: Utc::now(),
            });
            if guard.search_history.len() > SEARCH_HISTORY_LIMIT {
                let excess = guard.search_history.len() - SEARCH_HISTORY_LIMIT;
                guard.search_history.drain(..excess);
            }
        }

        self.flush().await
    }

    /// Applies an edit to the trip draft, recomputes the derived total and
    /// persists. Returns the updated draft.
    pub async fn update_trip(&self, apply: impl FnOnce(&mut TripDraft)) -> Result<TripDraft> {
        let updated = {
            let mut guard = self.snapshot.write();
            apply(&mut guard.trip_draft);
            guard.trip_draft.recalculate_total();
            guard.trip_draft.clone()
        };

        self.flush().await?;
        Ok(updated)
    }

    pub async fn set_budget_optimization(&self, enabled: bool) -> Result<()> {
        self.snapshot.write().budget_optimization = enabled;
        self.flush().await
    }

    async fn flush(&self) -> Result<()> {
        let raw = {
            let guard = self.snapshot.read();
            serde_json::to_string(&*guard)?
        };
        self.backend.set(SNAPSHOT_KEY, &raw).await
    }
}
