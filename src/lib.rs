//! Schedule Relay Library
//!
//! Watches the upstream source for new bulletin revisions and delivers each
//! group's part of the bulletin to its subscribers.
//!
//! # Modules
//!
//! - `poller`: sequence-code polling and the background loop
//! - `analyzer`: publication date and group label search over page text
//! - `render`: calibrated crop box rasterization
//! - `publisher`: image hosting
//! - `db`: distribution ledger and subscriber registry
//! - `notifier`: per-subscriber delivery
//! - `pipeline`: the per-group chain tying the above together

pub mod analyzer;
pub mod callback;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod groups;
pub mod notifier;
pub mod pipeline;
pub mod poller;
pub mod publisher;
pub mod render;

mod mupdf;

#[cfg(test)]
mod testing;
