//! Core document types
//!
//! Page geometry uses PDF user space: the origin is the lower-left corner of
//! the page and `y` grows upwards. A [`Rect`] is anchored at its lower-left
//! corner.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Raw bulletin bytes plus the sequence code they were fetched under
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Arc<Vec<u8>>,
    sequence_code: u64,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, sequence_code: u64) -> Self {
        Self {
            bytes: Arc::new(bytes),
            sequence_code,
        }
    }

    /// Shared handle to the document bytes
    pub fn bytes(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sequence_code(&self) -> u64 {
        self.sequence_code
    }

    /// SHA-256 of the document bytes, hex encoded
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.bytes.as_slice()))
    }
}

/// Rectangle in page units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from left/bottom/right/top edges
    pub fn from_edges(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            x: left,
            y: bottom,
            width: right - left,
            height: top - bottom,
        }
    }

    /// The zero rectangle returned when a label is absent
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// True for the zero "not found" rectangle
    pub fn is_sentinel(&self) -> bool {
        *self == Self::sentinel()
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Same size, origin moved by `(dx, dy)`
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Self {
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.top().max(other.top()),
        )
    }

    /// Equivalent rectangle with non-negative width and height
    pub fn normalized(&self) -> Self {
        Self::from_edges(
            self.x.min(self.right()),
            self.y.min(self.top()),
            self.x.max(self.right()),
            self.y.max(self.top()),
        )
    }
}

/// A single glyph and its box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharPosition {
    pub ch: char,
    pub rect: Rect,
}

/// A line of text; `text` holds exactly the characters of `chars`, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: Rect,
    pub chars: Vec<CharPosition>,
    pub text: String,
}

impl TextLine {
    pub fn from_chars(chars: Vec<CharPosition>) -> Self {
        let text = chars.iter().map(|c| c.ch).collect();
        let bbox = chars
            .iter()
            .map(|c| c.rect)
            .reduce(|acc, r| acc.union(&r))
            .unwrap_or_default();
        Self { bbox, chars, text }
    }

    /// Lay out `text` with a fixed advance per character, starting at `(x, y)`
    pub fn monospaced(text: &str, x: f32, y: f32, advance: f32, height: f32) -> Self {
        let chars = text
            .chars()
            .enumerate()
            .map(|(i, ch)| CharPosition {
                ch,
                rect: Rect::new(x + advance * i as f32, y, advance, height),
            })
            .collect();
        Self::from_chars(chars)
    }

    /// Box covering characters `[start, start + len)`
    pub fn span_rect(&self, start: usize, len: usize) -> Option<Rect> {
        self.chars
            .get(start..start.checked_add(len)?)?
            .iter()
            .map(|c| c.rect)
            .reduce(|acc, r| acc.union(&r))
    }
}

/// Text lines of one page, in document scan order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub lines: Vec<TextLine>,
}

impl PageLayout {
    /// Page text with lines joined by a single space
    pub fn joined_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Positioned text of a whole document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn first_page(&self) -> Option<&PageLayout> {
        self.pages.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union_and_normalize() {
        let a = Rect::new(10.0, 10.0, 5.0, 5.0);
        let b = Rect::new(12.0, 4.0, 10.0, 2.0);
        assert_eq!(a.union(&b), Rect::new(10.0, 4.0, 12.0, 11.0));

        let inverted = Rect::new(100.0, 500.0, 49.0, -174.0);
        assert_eq!(inverted.normalized(), Rect::new(100.0, 326.0, 49.0, 174.0));
    }

    #[test]
    fn test_sentinel() {
        assert!(Rect::sentinel().is_sentinel());
        assert!(!Rect::new(0.0, 0.0, 1.0, 0.0).is_sentinel());
    }

    #[test]
    fn test_span_rect() {
        let line = TextLine::monospaced("ab RP-21-1", 100.0, 50.0, 5.0, 10.0);
        assert_eq!(line.text, "ab RP-21-1");
        assert_eq!(line.span_rect(3, 7), Some(Rect::new(115.0, 50.0, 35.0, 10.0)));
        assert_eq!(line.span_rect(8, 7), None);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = RawDocument::new(b"%PDF-1.4".to_vec(), 7);
        let b = RawDocument::new(b"%PDF-1.4".to_vec(), 8);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
