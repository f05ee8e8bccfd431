//! Document error types
//!
//! Errors raised while opening, reading or rasterizing a bulletin document.

use thiserror::Error;

/// Unified document error type
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Bytes do not look like a PDF
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Page not found
    #[error("Page not found: index {0}")]
    PageNotFound(usize),

    /// Failed to parse document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to render content
    #[error("Render error: {0}")]
    RenderError(String),

    /// MuPDF context error
    #[error("MuPDF context error: {0}")]
    ContextError(String),

    /// Invalid date pattern configuration
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Image processing error
    #[error("Image error: {0}")]
    ImageError(String),
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Alias for Result (used by the renderer and mupdf wrappers)
pub type DocumentResult<T> = Result<T>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::ContextError(err.to_string())
    }
}

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        DocumentError::ImageError(err.to_string())
    }
}
