//! Upstream document sources

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, StatusCode};

use crate::config::PollerConfig;

use super::PollError;

/// Placeholder replaced by the sequence code in URL templates
const CODE_PLACEHOLDER: &str = "{code}";

/// What the upstream answered for one sequence code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResponse {
    /// Document bytes for the requested revision
    Available(Vec<u8>),
    /// Revision not published yet
    NotYetPublished,
    /// Any other status
    Unexpected(u16),
}

/// Source of bulletin revisions keyed by sequence code
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, sequence_code: u64) -> Result<FetchResponse, PollError>;
}

/// HTTP source.
///
/// The upstream answers unpublished revisions with a redirect, so redirects
/// are never followed.
pub struct HttpDocumentSource {
    client: reqwest::Client,
    url_template: String,
}

impl HttpDocumentSource {
    pub fn new(config: &PollerConfig) -> Result<Self, PollError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PollError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            url_template: config.url_template.clone(),
        })
    }

    pub fn url_for(&self, sequence_code: u64) -> String {
        self.url_template
            .replace(CODE_PLACEHOLDER, &sequence_code.to_string())
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch(&self, sequence_code: u64) -> Result<FetchResponse, PollError> {
        let response = self
            .client
            .get(self.url_for(sequence_code))
            .send()
            .await
            .map_err(|e| PollError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_redirection() {
            return Ok(FetchResponse::NotYetPublished);
        }
        if status != StatusCode::OK {
            return Ok(FetchResponse::Unexpected(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PollError::Transport(e.to_string()))?;

        Ok(FetchResponse::Available(bytes.to_vec()))
    }
}
