use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection};

use crate::domain::entities::view::SavedView;
use crate::usecase::ports::view_store::ViewStore;

/// Saved views in a per-user SQLite file: one row per collection key
/// (`views_<collection>`) holding the JSON array. Concurrent writers are
/// last-write-wins, the same as the browser storage this replaces.
pub struct SqliteViewStore {
    db_path: PathBuf,
}

impl SqliteViewStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn open_default() -> Result<Self> {
        let project_dirs = ProjectDirs::from("com", "classdesk", "classdesk")
            .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
        Ok(Self::new(project_dirs.data_local_dir().join("views.sqlite")))
    }

    fn open_connection(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
        }
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("failed to open db: {}", self.db_path.display()))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS view_store (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to initialize view store schema")?;
        Ok(conn)
    }
}

fn storage_key(collection: &str) -> String {
    format!("views_{collection}")
}

impl ViewStore for SqliteViewStore {
    fn load(&self, collection: &str) -> Result<Vec<SavedView>> {
        let conn = self.open_connection()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM view_store WHERE key = ?1",
                params![storage_key(collection)],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
            .context("failed to query saved views")?;

        match stored {
            Some(json) => {
                serde_json::from_str(&json).context("failed to parse stored saved views")
            }
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, collection: &str, views: &[SavedView]) -> Result<()> {
        let conn = self.open_connection()?;
        let json = serde_json::to_string(views).context("failed to serialize saved views")?;
        conn.execute(
            "INSERT INTO view_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![storage_key(collection), json],
        )
        .context("failed to store saved views")?;
        Ok(())
    }
}
