//! Notifier
//!
//! Pushes an artifact reference to subscribers one at a time. A failed send
//! is recorded in the report and the loop moves on.

mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub use telegram::TelegramSender;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Delivery to {chat_id} rejected: {description}")]
    Rejected { chat_id: i64, description: String },
}

/// Messaging frontend delivery
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_photo(
        &self,
        chat_id: i64,
        reference: &str,
        caption: &str,
    ) -> Result<(), SendError>;
}

/// Outcome of one fan-out
#[derive(Debug, Default)]
pub struct NotifyReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<(i64, SendError)>,
}

impl NotifyReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn MessageSender>,
}

impl Notifier {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self { sender }
    }

    pub async fn notify(
        &self,
        subscribers: &[i64],
        reference: &str,
        caption: &str,
    ) -> NotifyReport {
        let mut report = NotifyReport::default();

        for &chat_id in subscribers {
            report.attempted += 1;
            match self.sender.send_photo(chat_id, reference, caption).await {
                Ok(()) => {
                    report.delivered += 1;
                    debug!(chat_id, "Delivered schedule");
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "Delivery failed");
                    report.failures.push((chat_id, e));
                }
            }
        }

        report
    }
}
