//! Bulletin document model
//!
//! Format-level types shared by the analyzer and the renderer: the raw
//! fetched bytes, page geometry, and the positioned text extracted from
//! each page.

mod error;
mod types;

pub use error::{DocumentError, DocumentResult, Result};
pub use types::{CharPosition, DocumentLayout, PageLayout, RawDocument, Rect, TextLine};
