//! Database module for SQLite persistence
//!
//! Holds the distribution ledger and the subscriber registry. Every
//! operation borrows a pooled connection for one statement and returns it
//! on every exit path.

mod ledger;
mod schema;
mod subscribers;

pub use ledger::*;
pub use schema::*;
pub use subscribers::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::Result;

/// Create a new database connection pool
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    initialize_schema(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    /// Fresh on-disk database; keep the `TempDir` alive for the test
    pub async fn temp_pool() -> (TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("schedule.db").display());
        let pool = super::create_pool(&url).await.unwrap();
        (dir, pool)
    }
}
