//! Low-level MuPDF Wrapper
//!
//! MuPDF's `fz_context` is **NOT thread-safe**. Documents are therefore
//! never shared: [`SafeDocument`] keeps the bytes and opens a fresh MuPDF
//! document for every operation, so cropping or rendering one group's region
//! can never leak state into another group's.
//!
//! # Usage
//!
//! ```rust,ignore
//! let doc = SafeDocument::from_bytes(raw.bytes(), "seq-3412".into())?;
//! let layout = doc.with_doc(|d| extract_layout(d, &StextOptions::default()))?;
//! ```

mod safe;
mod stext;

pub use safe::SafeDocument;
pub use stext::{extract_layout, StextOptions};
