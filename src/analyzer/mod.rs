//! Document Analyzer
//!
//! Finds two things in an otherwise opaque bulletin layout:
//!
//! - the publication date, from a fixed header phrase on the first page
//! - each group's anchor, the first occurrence of its literal label on any
//!   page, moved by the calibration offsets
//!
//! All searches run over a [`DocumentLayout`] extracted once per document,
//! so locating many groups never touches MuPDF again.

mod date;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::config::{AnalyzerConfig, CropCalibration};
use crate::document::{DocumentLayout, DocumentResult, Rect};

pub use date::{format_ledger_date, parse_bulletin_date, parse_ledger_date};

/// Publication date plus the weekday label printed next to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub date: NaiveDate,
    pub weekday: Option<String>,
}

/// Located region of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRegion {
    pub group: String,
    /// Zero-based page the label was found on
    pub page_index: usize,
    /// Calibrated anchor rectangle
    pub rect: Rect,
}

pub struct DocumentAnalyzer {
    date_pattern: Regex,
    offset_x: f32,
    offset_y: f32,
}

impl DocumentAnalyzer {
    pub fn new(config: &AnalyzerConfig, calibration: &CropCalibration) -> DocumentResult<Self> {
        Ok(Self {
            date_pattern: Regex::new(&config.date_pattern)?,
            offset_x: calibration.offset_x,
            offset_y: calibration.offset_y,
        })
    }

    /// Publication date from the first page, if the header phrase is present
    pub fn extract_date(&self, layout: &DocumentLayout) -> Option<NaiveDate> {
        self.extract_publication(layout).map(|p| p.date)
    }

    /// Date and weekday from the first match whose date parses
    pub fn extract_publication(&self, layout: &DocumentLayout) -> Option<Publication> {
        let text = layout.first_page()?.joined_text();

        self.date_pattern.captures_iter(&text).find_map(|caps| {
            let date = parse_bulletin_date(caps.get(1)?.as_str())?;
            let weekday = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());
            Some(Publication { date, weekday })
        })
    }

    /// Calibrated rectangle of the first occurrence of `label`, or the zero
    /// sentinel when the label is absent from every page.
    ///
    /// Callers must check [`Rect::is_sentinel`] before cropping.
    pub fn locate_group(&self, layout: &DocumentLayout, label: &str) -> Rect {
        self.find_group(layout, label)
            .map(|region| region.rect)
            .unwrap_or_else(Rect::sentinel)
    }

    /// Like [`locate_group`](Self::locate_group) but keeps the page index and
    /// makes absence explicit
    pub fn find_group(&self, layout: &DocumentLayout, label: &str) -> Option<GroupRegion> {
        if label.is_empty() {
            return None;
        }
        let label_len = label.chars().count();

        for page in &layout.pages {
            for line in &page.lines {
                let Some(byte_idx) = line.text.find(label) else {
                    continue;
                };
                let start = line.text[..byte_idx].chars().count();
                let Some(raw) = line.span_rect(start, label_len) else {
                    continue;
                };

                return Some(GroupRegion {
                    group: label.to_string(),
                    page_index: page.index,
                    rect: raw.translate(self.offset_x, self.offset_y),
                });
            }
        }

        None
    }
}
