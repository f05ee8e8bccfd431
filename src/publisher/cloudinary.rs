//! Cloudinary image hosting
//!
//! Signed upload API: parameters other than `file` and `api_key` are sorted,
//! joined as a query string, suffixed with the API secret and SHA-1 hashed.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;

use super::{ArtifactPublisher, PublishError};

pub struct CloudinaryPublisher {
    client: reqwest::Client,
    config: CloudinaryConfig,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: String,
}

impl CloudinaryPublisher {
    pub fn new(config: CloudinaryConfig, timeout_secs: u64) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            timeout_secs,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Signed parameters, sorted by name
    fn signed_params(
        &self,
        public_id: Option<&str>,
        timestamp: i64,
    ) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = public_id {
            params.push(("overwrite", "true".to_string()));
            params.push(("public_id", id.to_string()));
        }
        params.push(("timestamp", timestamp.to_string()));
        params
    }
}

/// Hex SHA-1 over `k1=v1&k2=v2...` followed by the secret
pub(crate) fn sign(params: &[(&str, String)], secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ArtifactPublisher for CloudinaryPublisher {
    async fn upload(&self, image: &[u8], public_id: Option<&str>) -> Result<String, PublishError> {
        let timestamp = chrono::Utc::now().timestamp();
        let params = self.signed_params(public_id, timestamp);
        let signature = sign(&params, &self.config.api_secret);

        let file = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(image)
        );

        let mut form: Vec<(&str, String)> = params;
        form.push(("file", file));
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));

        let response = self
            .client
            .post(self.upload_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PublishError::Timeout(self.timeout_secs)
                } else {
                    PublishError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PublishError::InvalidResponse(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(PublishError::Rejected(err.message));
        }
        if !status.is_success() {
            return Err(PublishError::Rejected(format!("status {}", status.as_u16())));
        }

        body.secure_url
            .ok_or_else(|| PublishError::InvalidResponse("missing secure_url".to_string()))
    }
}
