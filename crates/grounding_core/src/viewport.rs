//! Scroll and zoom math for the continuously stacked page canvas.

use crate::chunk::{BoundingBox, Chunk};

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.0;
pub const DEFAULT_SCALE: f64 = 1.0;
pub const ZOOM_STEP: f64 = 0.2;
/// Vertical gap between two rendered pages, in pixels.
pub const INTER_PAGE_MARGIN_PX: f64 = 16.0;

/// Page geometry as reported by the renderer once layout has settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Rendered height of the first page at the current scale.
    pub page_height_px: f64,
    pub viewport_height_px: f64,
    pub page_count: u32,
}

/// The part of a chunk's grounding that drives the page scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollAnchor {
    pub page_index: u32,
    /// Vertical centre of the region as a fraction of the page height.
    pub region_center_y: f64,
}

impl ScrollAnchor {
    pub fn new(page_index: u32, bbox: &BoundingBox) -> Self {
        Self {
            page_index,
            region_center_y: bbox.center_y(),
        }
    }

    pub fn for_chunk(chunk: &Chunk) -> Option<Self> {
        chunk
            .overlay()
            .map(|(page, bbox)| Self::new(page, &bbox))
    }
}

/// `page * (height + margin) + center * height - viewport / 2`, never negative.
pub fn page_scroll_target(anchor: ScrollAnchor, layout: &PageLayout) -> f64 {
    let page_top = f64::from(anchor.page_index) * (layout.page_height_px + INTER_PAGE_MARGIN_PX);
    let region = anchor.region_center_y * layout.page_height_px;
    (page_top + region - layout.viewport_height_px / 2.0).max(0.0)
}

/// Scroll container measured in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListContainer {
    pub scroll_top: f64,
    pub top: f64,
    pub height: f64,
}

/// A card inside the list, in the same coordinate space as its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListElement {
    pub top: f64,
    pub height: f64,
}

/// `scrollTop` that puts the element's centre on the container's centre.
pub fn list_scroll_target(container: &ListContainer, element: &ListElement) -> f64 {
    container.scroll_top + (element.top - container.top) - container.height / 2.0
        + element.height / 2.0
}

/// Zoom level plus the last layout measurement taken at that zoom level.
///
/// A page scroll requested before any measurement exists is parked and
/// released by the next [`measure`](ViewportSync::measure).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportSync {
    scale: f64,
    layout: Option<PageLayout>,
    pending: Option<ScrollAnchor>,
}

impl Default for ViewportSync {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            layout: None,
            pending: None,
        }
    }
}

impl ViewportSync {
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn layout(&self) -> Option<&PageLayout> {
        self.layout.as_ref()
    }

    pub fn has_pending_scroll(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the scroll offset right away when the layout is known.
    pub fn request_scroll(&mut self, anchor: ScrollAnchor) -> Option<f64> {
        match self.layout.as_ref() {
            Some(layout) => {
                self.pending = None;
                Some(page_scroll_target(anchor, layout))
            }
            None => {
                self.pending = Some(anchor);
                None
            }
        }
    }

    /// Record a settled layout and flush a parked scroll, if any.
    pub fn measure(&mut self, layout: PageLayout) -> Option<f64> {
        if layout.page_height_px.is_nan() || layout.page_height_px <= 0.0 {
            return None;
        }
        self.layout = Some(layout);
        self.pending
            .take()
            .map(|anchor| page_scroll_target(anchor, &layout))
    }

    /// Drop the measurement and any parked scroll; used when the page set changes.
    pub fn reset_layout(&mut self) {
        self.layout = None;
        self.pending = None;
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_scale(self.scale + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_scale(self.scale - ZOOM_STEP)
    }

    /// "100%" style label.
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.scale * 100.0).round())
    }

    fn set_scale(&mut self, raw: f64) -> bool {
        // Snap to hundredths so repeated steps do not drift.
        let next = ((raw * 100.0).round() / 100.0).clamp(MIN_SCALE, MAX_SCALE);
        if next == self.scale {
            return false;
        }
        self.scale = next;
        // Page height is scale-dependent; overlays are not.
        self.layout = None;
        true
    }
}
