//! Thread-safe document wrapper for MuPDF
//!
//! Provides a safe abstraction over MuPDF documents that ensures
//! thread-safe access through serialization.
//!
//! # Design
//!
//! MuPDF documents are not thread-safe. This wrapper:
//!
//! 1. Stores the document bytes
//! 2. Opens a fresh document for each operation
//! 3. Uses `parking_lot::Mutex` to serialize access
//!
//! Each operation gets a clean document state, so nothing done to a page
//! while rendering one region is visible to the next operation.

use std::sync::Arc;

use mupdf::Document;
use parking_lot::Mutex;

use crate::document::{DocumentError, DocumentResult};

const PDF_MIME: &str = "application/pdf";

/// Thread-safe document wrapper
pub struct SafeDocument {
    /// Document bytes, shared with the pipeline invocation that fetched them
    data: Arc<Vec<u8>>,
    /// Document identifier (used in logs)
    id: String,
    /// Cached page count
    page_count: usize,
    /// Mutex for serializing access
    lock: Mutex<()>,
}

impl SafeDocument {
    /// Create a SafeDocument from bytes
    pub fn from_bytes(data: Arc<Vec<u8>>, id: String) -> DocumentResult<Self> {
        if !data.starts_with(b"%PDF") {
            return Err(DocumentError::UnsupportedFormat(format!(
                "{} does not start with a PDF header",
                id
            )));
        }

        // Validate document can be opened and get page count
        let doc = Document::from_bytes(&data, PDF_MIME)?;
        let page_count = doc.page_count()?.max(0) as usize;

        Ok(Self {
            data,
            id,
            page_count,
            lock: Mutex::new(()),
        })
    }

    /// Get the document ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the number of pages
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Open a fresh document instance for an operation
    fn open_document(&self) -> DocumentResult<Document> {
        Document::from_bytes(&self.data, PDF_MIME).map_err(Into::into)
    }

    /// Execute a closure with access to a freshly opened document
    ///
    /// Access is serialized via mutex; the document is dropped afterwards.
    pub fn with_doc<F, R>(&self, f: F) -> DocumentResult<R>
    where
        F: FnOnce(&Document) -> DocumentResult<R>,
    {
        let _guard = self.lock.lock();
        let doc = self.open_document()?;
        f(&doc)
    }

    /// Execute a closure with a freshly loaded page
    pub fn with_page<F, R>(&self, page_index: usize, f: F) -> DocumentResult<R>
    where
        F: FnOnce(&mupdf::Page) -> DocumentResult<R>,
    {
        if page_index >= self.page_count {
            return Err(DocumentError::PageNotFound(page_index));
        }
        self.with_doc(|doc| {
            let page = doc.load_page(page_index as i32)?;
            f(&page)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let result = SafeDocument::from_bytes(Arc::new(b"<html></html>".to_vec()), "x".into());
        assert!(matches!(result, Err(DocumentError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_opens_synthetic_pdf() {
        let bytes = crate::testing::synthetic_pdf(&[&[(72.0, 720.0, "hello")], &[]]);
        let doc = SafeDocument::from_bytes(Arc::new(bytes), "synthetic".into()).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.id(), "synthetic");
        assert!(matches!(
            doc.with_page(5, |_| Ok(())),
            Err(DocumentError::PageNotFound(5))
        ));
    }
}
