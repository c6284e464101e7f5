//! Persisted client state (login flag, store credential overrides)
//!
//! A small key/value table in a SQLite file inside the data directory. Values
//! are stored as plain text with no expiry.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

use crate::constants;

/// Store URL and key saved from the settings command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreOverrides {
    pub url: Option<String>,
    pub key: Option<String>,
}

/// Local state database wrapper
pub struct LocalState {
    pool: SqlitePool,
}

impl LocalState {
    /// Open or create the state database
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // SQLx requires the file to exist for SQLite
        if !path.exists() {
            std::fs::File::create(path)?;
        }

        let url = format!("sqlite:{}", path.display());
        let pool = SqlitePool::connect(&url)
            .await
            .context("Failed to open local state database")?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout=5000")
            .execute(&pool)
            .await?;

        let state = Self { pool };
        state.init_schema().await?;

        Ok(state)
    }

    /// Open the state database inside `data_dir`
    pub async fn open_in(data_dir: &Path) -> Result<Self> {
        Self::open(&data_dir.join(constants::STATE_FILENAME)).await
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Key/Value
    // =========================================================================

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM client_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(v,)| v))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO client_state (key, value, updated_at) VALUES (?, ?, datetime('now'))",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM client_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Authentication Flag
    // =========================================================================

    pub async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get(constants::AUTH_FLAG_KEY).await?.as_deref() == Some("true"))
    }

    /// Set the flag on login, clear it on logout
    pub async fn set_authenticated(&self, authenticated: bool) -> Result<()> {
        if authenticated {
            self.set(constants::AUTH_FLAG_KEY, "true").await
        } else {
            self.remove(constants::AUTH_FLAG_KEY).await
        }
    }

    // =========================================================================
    // Store Credential Overrides
    // =========================================================================

    pub async fn store_overrides(&self) -> Result<StoreOverrides> {
        Ok(StoreOverrides {
            url: self.get(constants::STORE_URL_KEY).await?,
            key: self.get(constants::STORE_KEY_KEY).await?,
        })
    }

    pub async fn set_store_overrides(&self, url: &str, key: &str) -> Result<()> {
        self.set(constants::STORE_URL_KEY, url).await?;
        self.set(constants::STORE_KEY_KEY, key).await
    }

    pub async fn clear_store_overrides(&self) -> Result<()> {
        self.remove(constants::STORE_URL_KEY).await?;
        self.remove(constants::STORE_KEY_KEY).await
    }
}
