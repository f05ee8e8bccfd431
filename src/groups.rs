//! Group roster
//!
//! Labels have the form `{prefix}-{yy}-{suffix}` where `yy` is the cohort's
//! admission year. A new cohort is admitted in September, so the window of
//! active years moves forward once a year.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use parking_lot::RwLock;
use tracing::info;

use crate::config::GroupConfig;

const REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Labels of all active cohorts on `today`, sorted
pub fn generate_labels(config: &GroupConfig, today: NaiveDate) -> Vec<String> {
    let cohorts = config.cohorts as i32;
    let start_year = if today.month() > 8 {
        today.year() - cohorts + 1
    } else {
        today.year() - cohorts
    };

    let mut labels: Vec<String> = config
        .prefixes
        .iter()
        .flat_map(|prefix| {
            (start_year..start_year + cohorts).map(move |year| {
                format!("{}-{:02}-{}", prefix, year.rem_euclid(100), config.suffix)
            })
        })
        .collect();

    labels.sort();
    labels
}

/// Shared, periodically refreshed list of group labels
#[derive(Clone, Default)]
pub struct GroupRoster {
    labels: Arc<RwLock<Vec<String>>>,
}

impl GroupRoster {
    pub fn new(config: &GroupConfig, today: NaiveDate) -> Self {
        Self::from_labels(generate_labels(config, today))
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        Self {
            labels: Arc::new(RwLock::new(labels)),
        }
    }

    pub fn refresh(&self, config: &GroupConfig, today: NaiveDate) {
        let labels = generate_labels(config, today);
        info!(count = labels.len(), "Group roster refreshed");
        *self.labels.write() = labels;
    }

    /// Copy of the current labels
    pub fn snapshot(&self) -> Vec<String> {
        self.labels.read().clone()
    }

    /// Regenerate the roster once a day
    pub fn start_refresh_task(self, config: GroupConfig) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + REFRESH_INTERVAL;
            let mut interval = tokio::time::interval_at(start, REFRESH_INTERVAL);

            loop {
                interval.tick().await;
                self.refresh(&config, Local::now().date_naive());
            }
        })
    }
}
