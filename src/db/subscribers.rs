//! Subscriber registry

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub unique_id: i64,
    pub name: String,
    pub group_label: Option<String>,
    pub mailing: bool,
}

/// Subscriber repository; every mutation is keyed on the account id
#[derive(Clone)]
pub struct SubscriberRegistry {
    pool: SqlitePool,
}

impl SubscriberRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register on first contact; later calls only refresh the name
    pub async fn upsert_subscriber(&self, unique_id: i64, name: &str) -> u64 {
        let result = sqlx::query(
            r#"
            INSERT INTO subscribers (unique_id, name, mailing) VALUES (?, ?, 0)
            ON CONFLICT(unique_id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(unique_id)
        .bind(name)
        .execute(&self.pool)
        .await;

        rows_or_zero(result, unique_id, "Subscriber upsert failed")
    }

    /// Assign a group; `0` when the subscriber is unknown
    pub async fn set_group(&self, unique_id: i64, group: &str) -> u64 {
        let result = sqlx::query("UPDATE subscribers SET group_label = ? WHERE unique_id = ?")
            .bind(group)
            .bind(unique_id)
            .execute(&self.pool)
            .await;

        rows_or_zero(result, unique_id, "Subscriber group update failed")
    }

    pub async fn set_mailing_flag(&self, unique_id: i64, enabled: bool) -> u64 {
        let result = sqlx::query("UPDATE subscribers SET mailing = ? WHERE unique_id = ?")
            .bind(enabled)
            .bind(unique_id)
            .execute(&self.pool)
            .await;

        rows_or_zero(result, unique_id, "Subscriber mailing update failed")
    }

    pub async fn get(&self, unique_id: i64) -> Option<Subscriber> {
        sqlx::query_as::<_, Subscriber>(
            "SELECT unique_id, name, group_label, mailing FROM subscribers WHERE unique_id = ?",
        )
        .bind(unique_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!(unique_id, error = %e, "Subscriber lookup failed");
            None
        })
    }

    pub async fn group_of(&self, unique_id: i64) -> Option<String> {
        self.get(unique_id).await.and_then(|s| s.group_label)
    }

    /// Account ids of mailing-enabled subscribers of `group`
    pub async fn list_mailing_subscribers(&self, group: &str) -> Vec<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT unique_id FROM subscribers
            WHERE mailing = 1 AND group_label = ?
            ORDER BY unique_id ASC
            "#,
        )
        .bind(group)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!(group = %group, error = %e, "Mailing list query failed");
            Vec::new()
        })
    }
}

fn rows_or_zero(
    result: Result<sqlx::sqlite::SqliteQueryResult, sqlx::Error>,
    unique_id: i64,
    message: &str,
) -> u64 {
    match result {
        Ok(done) => done.rows_affected(),
        Err(e) => {
            error!(unique_id, error = %e, "{}", message);
            0
        }
    }
}
