//! Background polling loop
//!
//! One task owns the [`Poller`] and probes on a fixed interval. Stopping is
//! cooperative: the stop signal is only observed between ticks, so a probe
//! and the processing of the document it fetched always run to completion.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::document::RawDocument;

use super::{PollError, PollOutcome, Poller};

/// Consumer of freshly fetched documents
#[async_trait]
pub trait DocumentHandler: Send + Sync {
    async fn handle(&self, document: RawDocument);
}

pub struct PollingService;

impl PollingService {
    /// Spawn the polling loop. The first probe runs immediately.
    pub fn start(
        mut poller: Poller,
        handler: Arc<dyn DocumentHandler>,
        period: Duration,
    ) -> PollingHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                sequence_code = poller.sequence_code(),
                period_secs = period.as_secs(),
                "Polling started"
            );

            loop {
                if *stop_rx.borrow() {
                    break;
                }

                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if let PollOutcome::NewDocument(document) = poller.poll().await {
                            handler.handle(document).await;
                        }
                    }
                }
            }

            debug!(sequence_code = poller.sequence_code(), "Polling loop exited");
            poller
        });

        PollingHandle { stop_tx, task }
    }
}

/// Handle to a running polling loop
pub struct PollingHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Poller>,
}

impl PollingHandle {
    /// Signal the loop and wait for the in-flight tick to finish.
    ///
    /// Returns the poller so its sequence code can be inspected or persisted.
    pub async fn stop(self) -> Result<Poller, PollError> {
        let _ = self.stop_tx.send(true);
        let poller = self
            .task
            .await
            .map_err(|e| PollError::Task(e.to_string()))?;

        info!(sequence_code = poller.sequence_code(), "Polling stopped");
        Ok(poller)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;
    use tokio::sync::Notify;

    use super::*;
    use crate::poller::tests::ScriptedSource;
    use crate::poller::FetchResponse;

    #[derive(Default)]
    struct SlowHandler {
        started: Notify,
        finished: AtomicBool,
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl DocumentHandler for SlowHandler {
        async fn handle(&self, document: RawDocument) {
            self.seen.lock().push(document.sequence_code());
            self.started.notify_one();
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_tick() {
        let source = ScriptedSource::new(vec![
            Ok(FetchResponse::NotYetPublished),
            Ok(FetchResponse::Available(b"%PDF-garbage".to_vec())),
        ]);
        let handler = Arc::new(SlowHandler::default());
        let poller = Poller::new(source, 100);

        let handle = PollingService::start(poller, handler.clone(), Duration::from_millis(10));

        handler.started.notified().await;
        let poller = handle.stop().await.unwrap();

        assert!(handler.finished.load(Ordering::SeqCst));
        assert_eq!(*handler.seen.lock(), vec![100]);
        assert_eq!(poller.sequence_code(), 101);
    }

    #[tokio::test]
    async fn test_stop_before_any_document() {
        let source = ScriptedSource::new(vec![]);
        let handler = Arc::new(SlowHandler::default());
        let poller = Poller::new(source.clone(), 5);

        let handle = PollingService::start(poller, handler.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;
        let poller = handle.stop().await.unwrap();

        assert_eq!(poller.sequence_code(), 5);
        assert!(handler.seen.lock().is_empty());
        assert!(source.requested.lock().iter().all(|&code| code == 5));
    }
}
