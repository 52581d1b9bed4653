use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{AttemptRepository, Storage};

mod attempt_repo;
mod mapping;
mod migrate;

/// Pool settings for the attempt database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteOptions {
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("cannot open attempt database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("attempt schema migration failed: {0}")]
    Migrate(#[source] sqlx::Error),
}

/// Attempt store backed by a `SQLite` file (or shared in-memory database).
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open `database_url` with [`SqliteOptions::default`].
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Connect` if the URL is malformed or the
    /// database cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with(database_url, SqliteOptions::default()).await
    }

    /// Open `database_url` in WAL mode, creating the file if needed.
    ///
    /// # Errors
    ///
    /// See [`SqliteRepository::connect`].
    pub async fn connect_with(
        database_url: &str,
        options: SqliteOptions,
    ) -> Result<Self, SqliteInitError> {
        let connect = SqliteConnectOptions::from_str(database_url)
            .map_err(SqliteInitError::Connect)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(options.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect)
            .await
            .map_err(SqliteInitError::Connect)?;
        tracing::debug!(max_connections = options.max_connections, "attempt database opened");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the `attempts` table up to the latest schema version.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Migrate` if a migration statement fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool)
            .await
            .map_err(SqliteInitError::Migrate)
    }
}

impl Storage {
    /// Open and migrate a `SQLite` attempt store.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` from either step.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Ok(Self { attempts })
    }
}
