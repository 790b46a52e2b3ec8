//! SQLite connection pool wrapper for the storage crate.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Manages a single SQLite pool; creates the DB file if missing.
///
/// Connections are health-checked on acquire, so a connection that went stale is replaced
/// instead of surfacing an error to the caller.
#[derive(Clone)]
pub struct SqlitePoolManager {
    pool: SqlitePool,
}

impl SqlitePoolManager {
    /// Creates a pool for the given database URL (`sqlite://path.db` or `sqlite::memory:`).
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        info!(database_url = %database_url, "Initializing SQLite pool");

        let in_memory = is_in_memory(database_url);
        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool_options = SqlitePoolOptions::new()
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(10));
        // An in-memory database lives only as long as one of its connections.
        let pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(8)
        };

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Like [`SqlitePoolManager::new`], retrying up to `attempts` times with a fixed delay.
    pub async fn connect_with_retry(
        database_url: &str,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, sqlx::Error> {
        let mut attempt = 1;
        loop {
            match Self::new(database_url).await {
                Ok(manager) => return Ok(manager),
                Err(e) if attempt < attempts => {
                    warn!(
                        attempt,
                        attempts,
                        error = %e,
                        "Database connection failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
