//! Messaging frontend callbacks
//!
//! The frontend sends one of two JSON shapes:
//!
//! ```json
//! {"group": "РП-21-1"}
//! {"getDay": "2024.12.25"}
//! ```
//!
//! Anything else is rejected.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::analyzer::parse_ledger_date;
use crate::db::{DistributionLedger, SubscriberRegistry};
use crate::notifier::{MessageSender, SendError};
use crate::pipeline::caption;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Payload must carry exactly one of `group` or `getDay`")]
    AmbiguousShape,

    #[error("Empty group label")]
    EmptyGroup,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Subscriber {0} has no group")]
    NoGroup(i64),

    #[error("Subscriber {0} could not be updated")]
    Persistence(i64),

    #[error("No schedule for {group} on {date}")]
    NotFound { group: String, date: NaiveDate },

    #[error("Delivery failed: {0}")]
    Delivery(#[from] SendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackPayload {
    SelectGroup(String),
    SelectDay(NaiveDate),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPayload {
    group: Option<String>,
    #[serde(rename = "getDay")]
    get_day: Option<String>,
}

impl CallbackPayload {
    pub fn parse(json: &str) -> Result<Self, CallbackError> {
        let raw: RawPayload =
            serde_json::from_str(json).map_err(|e| CallbackError::Malformed(e.to_string()))?;

        match (raw.group, raw.get_day) {
            (Some(group), None) => {
                let group = group.trim();
                if group.is_empty() {
                    return Err(CallbackError::EmptyGroup);
                }
                Ok(CallbackPayload::SelectGroup(group.to_string()))
            }
            (None, Some(day)) => parse_ledger_date(&day)
                .map(CallbackPayload::SelectDay)
                .ok_or(CallbackError::InvalidDate(day)),
            _ => Err(CallbackError::AmbiguousShape),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    GroupSelected(String),
    Resent {
        group: String,
        date: NaiveDate,
        reference: String,
    },
}

pub struct CallbackHandler {
    subscribers: SubscriberRegistry,
    ledger: DistributionLedger,
    sender: Arc<dyn MessageSender>,
}

impl CallbackHandler {
    pub fn new(
        subscribers: SubscriberRegistry,
        ledger: DistributionLedger,
        sender: Arc<dyn MessageSender>,
    ) -> Self {
        Self {
            subscribers,
            ledger,
            sender,
        }
    }

    /// Parse and apply a raw callback
    pub async fn handle_raw(
        &self,
        subscriber_id: i64,
        json: &str,
    ) -> Result<CallbackOutcome, CallbackError> {
        let payload = CallbackPayload::parse(json).map_err(|e| {
            warn!(subscriber_id, error = %e, "Rejected callback payload");
            e
        })?;
        self.handle(subscriber_id, payload).await
    }

    pub async fn handle(
        &self,
        subscriber_id: i64,
        payload: CallbackPayload,
    ) -> Result<CallbackOutcome, CallbackError> {
        match payload {
            CallbackPayload::SelectGroup(group) => {
                if self.subscribers.set_group(subscriber_id, &group).await == 0 {
                    return Err(CallbackError::Persistence(subscriber_id));
                }
                info!(subscriber_id, group = %group, "Group selected");
                Ok(CallbackOutcome::GroupSelected(group))
            }
            CallbackPayload::SelectDay(date) => {
                let group = self
                    .subscribers
                    .group_of(subscriber_id)
                    .await
                    .ok_or(CallbackError::NoGroup(subscriber_id))?;

                let reference = self
                    .ledger
                    .lookup_reference(&group, date)
                    .await
                    .ok_or_else(|| CallbackError::NotFound {
                        group: group.clone(),
                        date,
                    })?;

                self.sender
                    .send_photo(subscriber_id, &reference, &caption(&group, date, None, false))
                    .await?;

                Ok(CallbackOutcome::Resent {
                    group,
                    date,
                    reference,
                })
            }
        }
    }
}
