//! Schedule pipeline
//!
//! Runs once per fetched bulletin: extract the layout, read the publication
//! date, then for every rostered group locate, render, publish, record and
//! notify. Groups are processed one after another and a failure only ends
//! the group it happened in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::analyzer::{DocumentAnalyzer, Publication};
use crate::config::Config;
use crate::db::{DistributionLedger, SubscriberRegistry};
use crate::document::{DocumentError, DocumentLayout, RawDocument};
use crate::groups::GroupRoster;
use crate::mupdf::{extract_layout, SafeDocument, StextOptions};
use crate::notifier::{Notifier, NotifyReport};
use crate::poller::DocumentHandler;
use crate::publisher::{public_id_for, ArtifactPublisher, PublishError};
use crate::render::RegionRenderer;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("No publication date in bulletin {sequence_code}")]
    MissingDate { sequence_code: u64 },

    #[error("Group {0} not found in bulletin")]
    GroupNotFound(String),

    #[error("Empty render for group {0}")]
    EmptyRender(String),

    #[error("Publishing {group} failed: {source}")]
    Publish {
        group: String,
        #[source]
        source: PublishError,
    },

    #[error("Could not record {group} for {date}")]
    Persistence { group: String, date: NaiveDate },
}

/// Result of one group's chain
#[derive(Debug)]
pub struct GroupReport {
    pub group: String,
    pub reference: String,
    /// A record for this (group, date) already existed
    pub updated: bool,
    pub notify: NotifyReport,
}

/// Result of one bulletin
#[derive(Debug)]
pub struct DocumentReport {
    pub sequence_code: u64,
    pub publication: Publication,
    pub delivered: Vec<GroupReport>,
    pub failures: Vec<(String, PipelineError)>,
}

/// Message caption for a schedule image
pub fn caption(group: &str, date: NaiveDate, weekday: Option<&str>, updated: bool) -> String {
    let mut text = format!("Расписание {} на {}", group, date.format("%d.%m.%Y"));
    if let Some(weekday) = weekday {
        text.push_str(&format!(" ({})", weekday));
    }
    if updated {
        text.push_str(", обновлено");
    }
    text
}

pub struct SchedulePipeline {
    analyzer: DocumentAnalyzer,
    renderer: RegionRenderer,
    publisher: Arc<dyn ArtifactPublisher>,
    ledger: DistributionLedger,
    subscribers: SubscriberRegistry,
    notifier: Notifier,
    roster: GroupRoster,
    publish_timeout: Duration,
}

impl SchedulePipeline {
    pub fn new(
        config: &Config,
        publisher: Arc<dyn ArtifactPublisher>,
        ledger: DistributionLedger,
        subscribers: SubscriberRegistry,
        notifier: Notifier,
        roster: GroupRoster,
    ) -> Result<Self, DocumentError> {
        Ok(Self {
            analyzer: DocumentAnalyzer::new(&config.analyzer, &config.calibration)?,
            renderer: RegionRenderer::new(config.calibration),
            publisher,
            ledger,
            subscribers,
            notifier,
            roster,
            publish_timeout: Duration::from_secs(config.poller.publish_timeout_secs),
        })
    }

    pub async fn process(&self, document: &RawDocument) -> Result<DocumentReport, PipelineError> {
        let sequence_code = document.sequence_code();
        debug!(
            sequence_code,
            size = document.len(),
            fingerprint = %document.fingerprint(),
            "Opening bulletin"
        );
        let (doc, layout) = open_and_extract(document).await?;

        let Some(publication) = self.analyzer.extract_publication(&layout) else {
            warn!(sequence_code, "No publication date found, skipping bulletin");
            return Err(PipelineError::MissingDate { sequence_code });
        };

        info!(
            sequence_code,
            document = doc.id(),
            date = %publication.date,
            pages = layout.page_count(),
            "Processing bulletin"
        );

        let mut report = DocumentReport {
            sequence_code,
            publication,
            delivered: Vec::new(),
            failures: Vec::new(),
        };

        for group in self.roster.snapshot() {
            match self
                .process_group(&doc, &layout, &group, &report.publication)
                .await
            {
                Ok(done) => report.delivered.push(done),
                Err(e) => {
                    log_group_failure(&group, &e);
                    report.failures.push((group, e));
                }
            }
        }

        Ok(report)
    }

    async fn process_group(
        &self,
        doc: &Arc<SafeDocument>,
        layout: &DocumentLayout,
        group: &str,
        publication: &Publication,
    ) -> Result<GroupReport, PipelineError> {
        let date = publication.date;

        let region = self
            .analyzer
            .find_group(layout, group)
            .ok_or_else(|| PipelineError::GroupNotFound(group.to_string()))?;
        debug!(group = %group, page = region.page_index, rect = ?region.rect, "Located group");

        let pixels = self
            .renderer
            .render(Arc::clone(doc), region.page_index, region.rect)
            .await?
            .ok_or_else(|| PipelineError::EmptyRender(group.to_string()))?;
        let png = pixels.to_png()?;

        let reference = self.publish(group, date, &png).await?;

        let updated = self.ledger.record_exists(group, date).await;
        if self.ledger.upsert(group, date, &reference).await == 0 {
            return Err(PipelineError::Persistence {
                group: group.to_string(),
                date,
            });
        }

        let recipients = self.subscribers.list_mailing_subscribers(group).await;
        let text = caption(group, date, publication.weekday.as_deref(), updated);
        let notify = self.notifier.notify(&recipients, &reference, &text).await;

        info!(
            group = %group,
            %date,
            updated,
            delivered = notify.delivered,
            failed = notify.failures.len(),
            "Group distributed"
        );

        Ok(GroupReport {
            group: group.to_string(),
            reference,
            updated,
            notify,
        })
    }

    /// Upload with the configured deadline
    async fn publish(
        &self,
        group: &str,
        date: NaiveDate,
        png: &[u8],
    ) -> Result<String, PipelineError> {
        let public_id = public_id_for(group, date);
        let upload = self.publisher.upload(png, Some(&public_id));

        let result = match tokio::time::timeout(self.publish_timeout, upload).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(self.publish_timeout.as_secs())),
        };

        result.map_err(|source| PipelineError::Publish {
            group: group.to_string(),
            source,
        })
    }
}

/// Open the bulletin and extract its layout on the blocking pool
async fn open_and_extract(
    document: &RawDocument,
) -> Result<(Arc<SafeDocument>, DocumentLayout), DocumentError> {
    let bytes = document.bytes();
    let id = format!("bulletin-{}", document.sequence_code());

    tokio::task::spawn_blocking(move || {
        let doc = SafeDocument::from_bytes(bytes, id)?;
        let layout = doc.with_doc(|d| extract_layout(d, &StextOptions::default()))?;
        Ok::<_, DocumentError>((Arc::new(doc), layout))
    })
    .await
    .map_err(|e| DocumentError::ParseError(format!("Task join error: {}", e)))?
}

fn log_group_failure(group: &str, err: &PipelineError) {
    match err {
        PipelineError::GroupNotFound(_) => {
            warn!(group = %group, "Group label not found in bulletin")
        }
        PipelineError::Publish { source, .. } => {
            error!(group = %group, critical = true, error = %source, "Publishing failed")
        }
        other => error!(group = %group, error = %other, "Group processing failed"),
    }
}

#[async_trait]
impl DocumentHandler for SchedulePipeline {
    async fn handle(&self, document: RawDocument) {
        match self.process(&document).await {
            Ok(report) => info!(
                sequence_code = report.sequence_code,
                date = %report.publication.date,
                delivered = report.delivered.len(),
                failed = report.failures.len(),
                "Bulletin processed"
            ),
            Err(PipelineError::MissingDate { .. }) => {}
            Err(e) => error!(
                sequence_code = document.sequence_code(),
                error = %e,
                "Bulletin could not be processed"
            ),
        }
    }
}
