//! Structured Text Helpers
//!
//! Extracts positioned text from MuPDF pages and converts MuPDF's
//! top-left, y-down coordinates into the lower-left, y-up page space used by
//! [`crate::document`].

use mupdf::{Document, Page, Quad, TextPageOptions};

use crate::document::{
    CharPosition, DocumentLayout, DocumentResult, PageLayout, Rect, TextLine,
};

/// Options for structured text extraction
#[derive(Debug, Clone, Default)]
pub struct StextOptions {
    /// Preserve whitespace
    pub preserve_whitespace: bool,
    /// Preserve ligatures
    pub preserve_ligatures: bool,
    /// Inhibit spaces between characters
    pub inhibit_spaces: bool,
}

impl StextOptions {
    /// Convert to MuPDF TextPageOptions
    pub fn to_mupdf_options(&self) -> TextPageOptions {
        let mut opts = TextPageOptions::empty();

        if self.preserve_whitespace {
            opts |= TextPageOptions::PRESERVE_WHITESPACE;
        }
        if self.preserve_ligatures {
            opts |= TextPageOptions::PRESERVE_LIGATURES;
        }
        if self.inhibit_spaces {
            opts |= TextPageOptions::INHIBIT_SPACES;
        }

        opts
    }
}

/// Extract the positioned text of every page
pub fn extract_layout(doc: &Document, options: &StextOptions) -> DocumentResult<DocumentLayout> {
    let page_count = doc.page_count()?.max(0);
    let mut pages = Vec::with_capacity(page_count as usize);

    for index in 0..page_count {
        let page = doc.load_page(index)?;
        pages.push(extract_page_layout(&page, index as usize, options)?);
    }

    Ok(DocumentLayout { pages })
}

/// Extract the positioned text of one page, blocks flattened in scan order
fn extract_page_layout(
    page: &Page,
    index: usize,
    options: &StextOptions,
) -> DocumentResult<PageLayout> {
    let text_page = page.to_text_page(options.to_mupdf_options())?;
    let bounds = page.bounds()?;

    let width = bounds.x1 - bounds.x0;
    let height = bounds.y1 - bounds.y0;

    let mut lines = Vec::new();

    for block in text_page.blocks() {
        for line in block.lines() {
            let chars: Vec<CharPosition> = line
                .chars()
                .filter_map(|ch| {
                    ch.char().map(|c| CharPosition {
                        ch: c,
                        rect: quad_to_page_rect(&ch.quad(), bounds.x0, bounds.y1),
                    })
                })
                .collect();

            if !chars.is_empty() {
                lines.push(TextLine::from_chars(chars));
            }
        }
    }

    Ok(PageLayout {
        index,
        width,
        height,
        lines,
    })
}

/// Convert a MuPDF quad (y-down) into a page rectangle (y-up)
fn quad_to_page_rect(quad: &Quad, origin_x: f32, page_top: f32) -> Rect {
    let left = quad.ul.x.min(quad.ll.x);
    let right = quad.ur.x.max(quad.lr.x);
    let top = quad.ul.y.min(quad.ur.y);
    let bottom = quad.ll.y.max(quad.lr.y);

    Rect::from_edges(
        left - origin_x,
        page_top - bottom,
        right - origin_x,
        page_top - top,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mupdf::SafeDocument;

    #[test]
    fn test_stext_options_default() {
        let opts = StextOptions::default();
        assert!(opts.to_mupdf_options().is_empty());
    }

    #[test]
    fn test_stext_options_preserve_whitespace() {
        let opts = StextOptions {
            preserve_whitespace: true,
            ..Default::default()
        };
        assert!(opts
            .to_mupdf_options()
            .contains(TextPageOptions::PRESERVE_WHITESPACE));
    }

    #[test]
    fn test_quad_flips_to_page_space() {
        let quad = Quad {
            ul: mupdf::Point { x: 72.0, y: 60.0 },
            ur: mupdf::Point { x: 100.0, y: 60.0 },
            ll: mupdf::Point { x: 72.0, y: 72.0 },
            lr: mupdf::Point { x: 100.0, y: 72.0 },
        };
        let rect = quad_to_page_rect(&quad, 0.0, 792.0);
        assert_eq!(rect, Rect::new(72.0, 720.0, 28.0, 12.0));
    }

    #[test]
    fn test_extract_layout_from_synthetic_pdf() {
        let bytes = crate::testing::synthetic_pdf(&[
            &[(72.0, 720.0, "Bulletin")],
            &[(200.0, 400.0, "RP-21-1")],
        ]);
        let doc = SafeDocument::from_bytes(Arc::new(bytes), "layout".into()).unwrap();
        let layout = doc
            .with_doc(|d| extract_layout(d, &StextOptions::default()))
            .unwrap();

        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages[1].index, 1);
        assert!(layout.pages[0].joined_text().contains("Bulletin"));

        let line = layout.pages[1]
            .lines
            .iter()
            .find(|l| l.text.contains("RP-21-1"))
            .unwrap();
        assert!((line.bbox.x - 200.0).abs() < 1.0);
        assert!(line.bbox.y < 400.0 && line.bbox.top() > 400.0);
    }
}
