//! Headless stand-in for the page renderer and the chunk list pane.

use std::path::Path;

use engine_logging::{engine_debug, engine_warn};
use grounding_core::{ChunkIndex, ListContainer, ListElement, PageLayout};

use super::constants::CARD_HEIGHT_PX;

/// Measures pages with MuPDF instead of rasterising them. Pages render at
/// one pixel per point at 100% zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessLayout {
    /// Page height at 100% zoom when the document cannot be opened.
    pub fallback_page_height_px: f64,
    pub viewport_height_px: f64,
}

/// Page count and first-page height of a document, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_count: u32,
    pub first_page_height_pt: f64,
}

impl PageGeometry {
    pub fn read(document: &Path) -> Result<Self, mupdf::Error> {
        let path = document.to_string_lossy();
        let doc = mupdf::Document::open(&*path)?;
        let page_count = doc.page_count()?;
        let bounds = doc.load_page(0)?.bounds()?;
        Ok(Self {
            page_count: u32::try_from(page_count).unwrap_or(0).max(1),
            first_page_height_pt: f64::from(bounds.y1 - bounds.y0),
        })
    }
}

impl HeadlessLayout {
    /// Measure the cached document at `scale`.
    pub fn measure(&self, document: &Path, scale: f64) -> PageLayout {
        let geometry = match PageGeometry::read(document) {
            Ok(geometry) => geometry,
            Err(err) => {
                engine_warn!("cannot measure {:?}: {}", document, err);
                PageGeometry {
                    page_count: 1,
                    first_page_height_pt: self.fallback_page_height_px,
                }
            }
        };
        let layout = PageLayout {
            page_height_px: geometry.first_page_height_pt * scale,
            viewport_height_px: self.viewport_height_px,
            page_count: geometry.page_count,
        };
        engine_debug!("headless layout {:?}", layout);
        layout
    }

    /// The chunk list as a container of equally tall cards, scrolled to
    /// `scroll_top`.
    pub fn list_geometry(&self, scroll_top: f64, index: ChunkIndex) -> (ListContainer, ListElement) {
        let container = ListContainer {
            scroll_top,
            top: 0.0,
            height: self.viewport_height_px,
        };
        let element = ListElement {
            top: index as f64 * CARD_HEIGHT_PX - scroll_top,
            height: CARD_HEIGHT_PX,
        };
        (container, element)
    }
}

/// A small but well-formed PDF with `pages` blank pages of `width` x `height`
/// points.
#[cfg(test)]
pub(crate) fn blank_pdf(pages: usize, width: u32, height: u32) -> Vec<u8> {
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Count {pages} /Kids [{}] >>",
            (0..pages)
                .map(|page| format!("{} 0 R", page + 3))
                .collect::<Vec<_>>()
                .join(" ")
        ),
    ];
    for _ in 0..pages {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] >>"
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (number, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", number + 1).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}
