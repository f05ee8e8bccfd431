//! Region Renderer
//!
//! Cuts a fixed-size box out of one bulletin page and rasterizes it.
//!
//! The box is anchored at a located group rectangle and sized by
//! [`CropCalibration`]. Rendering never mutates the document: the page is
//! rasterized from a freshly opened instance and the box is cut out of the
//! resulting pixels, so any number of groups can be rendered from the same
//! bytes in any order.

use std::io::Cursor;
use std::sync::Arc;

use mupdf::{Colorspace, Matrix};

use crate::document::{DocumentError, DocumentResult, Rect};
use crate::mupdf::SafeDocument;

pub use crate::config::CropCalibration;

/// Crop box in page units, normalized to non-negative size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropBox {
    pub rect: Rect,
}

impl CropBox {
    /// Box of the calibrated size whose origin is the anchor's origin
    pub fn anchored_at(anchor: &Rect, calibration: &CropCalibration) -> Self {
        Self {
            rect: Rect::new(anchor.x, anchor.y, calibration.width, calibration.height).normalized(),
        }
    }
}

/// Pixel rectangle relative to a rendered page, top-left origin.
///
/// `left` and `top` are negative when the box starts above or left of the
/// page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub left: i64,
    pub top: i64,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    fn overlaps(&self, pixmap_width: usize, pixmap_height: usize) -> bool {
        self.left < pixmap_width as i64
            && self.top < pixmap_height as i64
            && self.left + self.width as i64 > 0
            && self.top + self.height as i64 > 0
    }
}

/// Map a crop box to pixel coordinates of a page rendered at `scale`.
///
/// The window keeps the full calibrated size even where it overhangs the
/// `pixmap_width` x `pixmap_height` raster; `None` when nothing of the box
/// lies on the page.
pub fn pixel_window(
    crop: &Rect,
    page_height: f32,
    scale: f32,
    pixmap_width: usize,
    pixmap_height: usize,
) -> Option<PixelWindow> {
    let window = PixelWindow {
        left: (crop.x * scale).round() as i64,
        top: ((page_height - crop.top()) * scale).round() as i64,
        width: (crop.width * scale).round().max(0.0) as usize,
        height: (crop.height * scale).round().max(0.0) as usize,
    };

    if window.width == 0 || window.height == 0 || !window.overlaps(pixmap_width, pixmap_height) {
        return None;
    }

    Some(window)
}

/// Rasterized region, 8-bit BGRA, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Encode as PNG
    pub fn to_png(&self) -> DocumentResult<Vec<u8>> {
        let rgba: Vec<u8> = self
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect();

        let img = image::RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| DocumentError::ImageError("Failed to create image buffer".to_string()))?;

        let mut output = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)?;

        Ok(output)
    }
}

/// Opaque white, used where the window overhangs the page
const PAD: [u8; 4] = [255, 255, 255, 255];

/// Copy `window` out of a `columns` x `rows` raster of packed samples with
/// `n` components per pixel. Pixels outside the raster are white.
pub fn crop_pixels(
    samples: &[u8],
    n: usize,
    columns: usize,
    rows: usize,
    window: &PixelWindow,
) -> PixelBuffer {
    let mut data = Vec::with_capacity(window.width * window.height * 4);

    for dy in 0..window.height {
        let y = window.top + dy as i64;
        for dx in 0..window.width {
            let x = window.left + dx as i64;
            if x < 0 || y < 0 || x >= columns as i64 || y >= rows as i64 {
                data.extend_from_slice(&PAD);
                continue;
            }

            let offset = (y as usize * columns + x as usize) * n;
            let r = samples.get(offset).copied().unwrap_or(255);
            let g = samples.get(offset + 1).copied().unwrap_or(255);
            let b = samples.get(offset + 2).copied().unwrap_or(255);
            let a = if n >= 4 {
                samples.get(offset + 3).copied().unwrap_or(255)
            } else {
                255
            };
            data.extend_from_slice(&[b, g, r, a]);
        }
    }

    PixelBuffer {
        width: window.width as u32,
        height: window.height as u32,
        data,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RegionRenderer {
    calibration: CropCalibration,
}

impl RegionRenderer {
    pub fn new(calibration: CropCalibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> &CropCalibration {
        &self.calibration
    }

    /// Render the calibrated box anchored at `anchor` on `page_index`.
    ///
    /// Returns `None` for the not-found sentinel or when the box lies
    /// entirely off the page.
    pub fn render_blocking(
        &self,
        doc: &SafeDocument,
        page_index: usize,
        anchor: Rect,
    ) -> DocumentResult<Option<PixelBuffer>> {
        if anchor.is_sentinel() {
            return Ok(None);
        }

        let crop = CropBox::anchored_at(&anchor, &self.calibration);
        let scale = self.calibration.scale;

        doc.with_page(page_index, |page| {
            let bounds = page.bounds()?;
            let page_height = bounds.y1 - bounds.y0;

            let matrix = Matrix::new_scale(scale, scale);
            let colorspace = Colorspace::device_rgb();
            let pixmap = page.to_pixmap(&matrix, &colorspace, false, false)?;

            let width = pixmap.width() as usize;
            let height = pixmap.height() as usize;

            let Some(window) = pixel_window(&crop.rect, page_height, scale, width, height) else {
                return Ok(None);
            };

            let buffer =
                crop_pixels(pixmap.samples(), pixmap.n() as usize, width, height, &window);
            Ok(Some(buffer).filter(|b| !b.is_empty()))
        })
    }

    /// [`render_blocking`](Self::render_blocking) on the blocking pool
    pub async fn render(
        &self,
        doc: Arc<SafeDocument>,
        page_index: usize,
        anchor: Rect,
    ) -> DocumentResult<Option<PixelBuffer>> {
        let renderer = *self;

        tokio::task::spawn_blocking(move || renderer.render_blocking(&doc, page_index, anchor))
            .await
            .map_err(|e| DocumentError::RenderError(format!("Task join error: {}", e)))?
    }
}
