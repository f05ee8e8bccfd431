//! Poller
//!
//! Probes the upstream source for the next bulletin revision. The sequence
//! code advances by exactly one per fetched document, whatever later
//! happens to the bytes, and never on any other outcome.

mod service;
mod source;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::document::RawDocument;

pub use service::{DocumentHandler, PollingHandle, PollingService};
pub use source::{DocumentSource, FetchResponse, HttpDocumentSource};

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Polling task failed: {0}")]
    Task(String),
}

/// Result of one probe
#[derive(Debug)]
pub enum PollOutcome {
    NewDocument(RawDocument),
    NoNewDocument,
    TransientError(PollError),
}

/// Sequence-code state machine over a [`DocumentSource`]
pub struct Poller {
    source: Arc<dyn DocumentSource>,
    sequence_code: u64,
}

impl Poller {
    pub fn new(source: Arc<dyn DocumentSource>, sequence_code: u64) -> Self {
        Self {
            source,
            sequence_code,
        }
    }

    /// Next sequence code to probe
    pub fn sequence_code(&self) -> u64 {
        self.sequence_code
    }

    pub async fn poll(&mut self) -> PollOutcome {
        let code = self.sequence_code;

        match self.source.fetch(code).await {
            Ok(FetchResponse::Available(bytes)) => {
                self.sequence_code += 1;
                info!(
                    sequence_code = code,
                    size = bytes.len(),
                    "Fetched new bulletin revision"
                );
                PollOutcome::NewDocument(RawDocument::new(bytes, code))
            }
            Ok(FetchResponse::NotYetPublished) => {
                debug!(sequence_code = code, "Revision not published yet");
                PollOutcome::NoNewDocument
            }
            Ok(FetchResponse::Unexpected(status)) => {
                warn!(sequence_code = code, status, "Unexpected upstream status");
                PollOutcome::TransientError(PollError::UnexpectedStatus(status))
            }
            Err(e) => {
                warn!(sequence_code = code, error = %e, "Upstream fetch failed");
                PollOutcome::TransientError(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;

    /// Source that replays a script, then reports "not yet published"
    #[derive(Default)]
    pub struct ScriptedSource {
        script: Mutex<VecDeque<Result<FetchResponse, PollError>>>,
        pub requested: Mutex<Vec<u64>>,
    }

    impl ScriptedSource {
        pub fn new(script: Vec<Result<FetchResponse, PollError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requested: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DocumentSource for ScriptedSource {
        async fn fetch(&self, sequence_code: u64) -> Result<FetchResponse, PollError> {
            self.requested.lock().push(sequence_code);
            self.script
                .lock()
                .pop_front()
                .unwrap_or(Ok(FetchResponse::NotYetPublished))
        }
    }

    #[tokio::test]
    async fn test_not_yet_published_keeps_code() {
        let source = ScriptedSource::new(vec![]);
        let mut poller = Poller::new(source.clone(), 41);

        for _ in 0..3 {
            assert!(matches!(poller.poll().await, PollOutcome::NoNewDocument));
        }
        assert_eq!(poller.sequence_code(), 41);
        assert_eq!(*source.requested.lock(), vec![41, 41, 41]);
    }

    #[tokio::test]
    async fn test_success_advances_by_one() {
        let source = ScriptedSource::new(vec![
            Ok(FetchResponse::Available(b"not even a pdf".to_vec())),
            Ok(FetchResponse::NotYetPublished),
        ]);
        let mut poller = Poller::new(source.clone(), 41);

        match poller.poll().await {
            PollOutcome::NewDocument(doc) => assert_eq!(doc.sequence_code(), 41),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(poller.sequence_code(), 42);

        poller.poll().await;
        assert_eq!(poller.sequence_code(), 42);
        assert_eq!(*source.requested.lock(), vec![41, 42]);
    }

    #[tokio::test]
    async fn test_errors_do_not_advance() {
        let source = ScriptedSource::new(vec![
            Ok(FetchResponse::Unexpected(500)),
            Err(PollError::Transport("connection reset".into())),
        ]);
        let mut poller = Poller::new(source, 7);

        assert!(matches!(
            poller.poll().await,
            PollOutcome::TransientError(PollError::UnexpectedStatus(500))
        ));
        assert!(matches!(
            poller.poll().await,
            PollOutcome::TransientError(PollError::Transport(_))
        ));
        assert_eq!(poller.sequence_code(), 7);
    }
}
