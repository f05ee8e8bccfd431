//! Distribution ledger
//!
//! One artifact reference per (group, date). Storage failures stop here:
//! they are logged and reported as `false`, `0` or `None`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use sqlx::SqlitePool;
use tracing::error;

use crate::analyzer::{format_ledger_date, parse_ledger_date};
use crate::error::Result;

const STATIC_SLOT: i64 = 1;

#[derive(Clone)]
pub struct DistributionLedger {
    pool: SqlitePool,
}

impl DistributionLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Whether a reference is already recorded for (group, date)
    pub async fn record_exists(&self, group: &str, date: NaiveDate) -> bool {
        match self.lookup(group, date).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                error!(group = %group, %date, error = %e, "Ledger existence check failed");
                false
            }
        }
    }

    /// Insert or replace the reference for (group, date).
    ///
    /// Returns the affected row count; `0` means nothing was written.
    pub async fn upsert(&self, group: &str, date: NaiveDate, reference: &str) -> u64 {
        let result = sqlx::query(
            r#"
            INSERT INTO distributions (group_label, date, reference, updated_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT(group_label, date) DO UPDATE SET
                reference = excluded.reference,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(group)
        .bind(format_ledger_date(date))
        .bind(reference)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => done.rows_affected(),
            Err(e) => {
                error!(group = %group, %date, error = %e, "Ledger upsert failed");
                0
            }
        }
    }

    pub async fn lookup_reference(&self, group: &str, date: NaiveDate) -> Option<String> {
        self.lookup(group, date).await.unwrap_or_else(|e| {
            error!(group = %group, %date, error = %e, "Ledger lookup failed");
            None
        })
    }

    async fn lookup(&self, group: &str, date: NaiveDate) -> Result<Option<String>> {
        let reference = sqlx::query_scalar::<_, String>(
            "SELECT reference FROM distributions WHERE group_label = ? AND date = ?",
        )
        .bind(group)
        .bind(format_ledger_date(date))
        .fetch_optional(&self.pool)
        .await?;

        Ok(reference)
    }

    /// Recorded dates for `group` in `[today + 1 - window_days, today + 1]`,
    /// ascending. Tomorrow is included because bulletins are published the
    /// day before.
    pub async fn list_dates_for_group(
        &self,
        group: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Vec<NaiveDate> {
        let last = today + Duration::days(1);
        let first = last - Duration::days(i64::from(window_days));

        let rows = sqlx::query_scalar::<_, String>(
            r#"
            SELECT date FROM distributions
            WHERE group_label = ? AND date >= ? AND date <= ?
            ORDER BY date ASC
            "#,
        )
        .bind(group)
        .bind(format_ledger_date(first))
        .bind(format_ledger_date(last))
        .fetch_all(&self.pool)
        .await;

        match rows {
            Ok(rows) => rows.iter().filter_map(|d| parse_ledger_date(d)).collect(),
            Err(e) => {
                error!(group = %group, error = %e, "Ledger date listing failed");
                Vec::new()
            }
        }
    }

    /// First available date per weekday, Monday to Sunday
    pub async fn availability_by_weekday(
        &self,
        group: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Vec<(Weekday, NaiveDate)> {
        let dates = self.list_dates_for_group(group, window_days, today).await;
        first_per_weekday(&dates)
    }

    /// The static reference image, if one was stored
    pub async fn static_reference(&self) -> Option<String> {
        sqlx::query_scalar::<_, String>("SELECT reference FROM static_reference WHERE slot = ?")
            .bind(STATIC_SLOT)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Static reference lookup failed");
                None
            })
    }

    pub async fn set_static_reference(&self, reference: &str) -> u64 {
        let result = sqlx::query(
            r#"
            INSERT INTO static_reference (slot, reference) VALUES (?, ?)
            ON CONFLICT(slot) DO UPDATE SET reference = excluded.reference
            "#,
        )
        .bind(STATIC_SLOT)
        .bind(reference)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => done.rows_affected(),
            Err(e) => {
                error!(error = %e, "Static reference update failed");
                0
            }
        }
    }
}

fn first_per_weekday(dates: &[NaiveDate]) -> Vec<(Weekday, NaiveDate)> {
    let mut slots: [Option<NaiveDate>; 7] = [None; 7];
    for date in dates {
        let slot = &mut slots[date.weekday().num_days_from_monday() as usize];
        if slot.is_none() {
            *slot = Some(*date);
        }
    }

    slots
        .iter()
        .flatten()
        .map(|date| (date.weekday(), *date))
        .collect()
}
