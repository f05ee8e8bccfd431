//! Artifact Publisher
//!
//! Uploads rendered images to external hosting and hands back a stable
//! reference. Failed uploads are reported, never retried here.

mod cloudinary;

use async_trait::async_trait;
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use cloudinary::CloudinaryPublisher;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Upload transport error: {0}")]
    Transport(String),

    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Upload timed out after {0} seconds")]
    Timeout(u64),

    #[error("Invalid upload response: {0}")]
    InvalidResponse(String),
}

/// Image hosting contract
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Upload PNG bytes, optionally under an explicit id; returns the reference
    async fn upload(&self, image: &[u8], public_id: Option<&str>) -> Result<String, PublishError>;
}

/// Deterministic hosting id for one (group, date), so a re-publish
/// overwrites the previous image
pub fn public_id_for(group: &str, date: NaiveDate) -> String {
    let digest = hex::encode(Sha256::digest(group.as_bytes()));
    format!("schedule/{}/{}", date.format("%Y-%m-%d"), &digest[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_id_is_stable_and_ascii() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        let id = public_id_for("РП-21-1", date);

        assert_eq!(id, public_id_for("РП-21-1", date));
        assert!(id.starts_with("schedule/2024-12-25/"));
        assert_eq!(id.len(), "schedule/2024-12-25/".len() + 12);
        assert!(id.is_ascii());
        assert_ne!(id, public_id_for("РП-22-1", date));
    }
}
