//! Test fixtures shared by unit tests

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::notifier::{MessageSender, SendError};
use crate::publisher::{ArtifactPublisher, PublishError};

/// Build a small PDF with Helvetica text runs.
///
/// `pages[i]` lists `(x, y, text)` runs for page `i`; coordinates are PDF
/// user space on a 612x792 page. Text must be ASCII.
pub fn synthetic_pdf(pages: &[&[(f32, f32, &str)]]) -> Vec<u8> {
    let page_count = pages.len();
    let mut objects: Vec<String> = Vec::new();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", 3 + i * 2))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids, page_count
    ));

    for (i, runs) in pages.iter().enumerate() {
        let content_obj = 4 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R \
             /Resources << /Font << /F1 << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> >> >> >>",
            content_obj
        ));

        let mut content = String::new();
        for (x, y, text) in runs.iter() {
            let escaped = text
                .replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)");
            content.push_str(&format!(
                "BT /F1 12 Tf 1 0 0 1 {} {} Tm ({}) Tj ET\n",
                x, y, escaped
            ));
        }
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));

    pdf.into_bytes()
}

/// Publisher double that records uploads and returns numbered references
#[derive(Default)]
pub struct RecordingPublisher {
    pub uploads: Mutex<Vec<(usize, Option<String>)>>,
    pub fail: bool,
}

#[async_trait]
impl ArtifactPublisher for RecordingPublisher {
    async fn upload(&self, image: &[u8], public_id: Option<&str>) -> Result<String, PublishError> {
        if self.fail {
            return Err(PublishError::Rejected("quota exceeded".into()));
        }
        let mut uploads = self.uploads.lock();
        uploads.push((image.len(), public_id.map(str::to_string)));
        Ok(format!("https://img.example/{}.png", uploads.len()))
    }
}

/// Sender double that records deliveries and fails for chosen chat ids
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(i64, String, String)>>,
    pub failing: Vec<i64>,
}

impl RecordingSender {
    pub fn failing_for(ids: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            failing: ids.to_vec(),
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<(i64, String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_photo(
        &self,
        chat_id: i64,
        reference: &str,
        caption: &str,
    ) -> Result<(), SendError> {
        if self.failing.contains(&chat_id) {
            return Err(SendError::Rejected {
                chat_id,
                description: "Forbidden: bot was blocked by the user".into(),
            });
        }
        self.sent
            .lock()
            .push((chat_id, reference.to_string(), caption.to_string()));
        Ok(())
    }
}
