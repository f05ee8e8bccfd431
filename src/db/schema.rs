//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Subscribers keyed by messaging account id
CREATE TABLE IF NOT EXISTS subscribers (
    unique_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    group_label TEXT,
    mailing INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_subscribers_group_mailing ON subscribers(group_label, mailing);

-- One artifact reference per (group, date); date is yyyy.mm.dd
CREATE TABLE IF NOT EXISTS distributions (
    group_label TEXT NOT NULL,
    date TEXT NOT NULL,
    reference TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (group_label, date)
);

-- Single-row table for the static reference image
CREATE TABLE IF NOT EXISTS static_reference (
    slot INTEGER PRIMARY KEY CHECK (slot = 1),
    reference TEXT NOT NULL
);
"#;
