/// Positional identifier of a chunk inside the currently loaded list.
///
/// Only meaningful for the list it was taken from; a reload or a document
/// switch invalidates every index handed out before it.
pub type ChunkIndex = usize;

/// A box in page-relative coordinates, every edge a fraction of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// `0 <= left < right <= 1` and `0 <= top < bottom <= 1`. NaN edges fail.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.left)
            && (0.0..=1.0).contains(&self.right)
            && (0.0..=1.0).contains(&self.top)
            && (0.0..=1.0).contains(&self.bottom)
            && self.left < self.right
            && self.top < self.bottom
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Vertical midpoint, still as a fraction of the page height.
    pub fn center_y(&self) -> f64 {
        self.top + self.height() / 2.0
    }
}

/// Where a chunk sits in the source document. `page` is 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grounding {
    pub page: u32,
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Identity issued by the chunk source, or the decimal position when the
    /// source did not issue one.
    pub key: String,
    pub text: String,
    pub chunk_type: String,
    pub grounding: Option<Grounding>,
}

impl Chunk {
    pub fn page(&self) -> Option<u32> {
        self.grounding.map(|g| g.page)
    }

    /// Page and box for drawing an overlay. `None` when the grounding is
    /// missing or its box breaks the unit-square invariant.
    pub fn overlay(&self) -> Option<(u32, BoundingBox)> {
        let grounding = self.grounding?;
        let bbox = grounding.bbox?;
        bbox.is_valid().then_some((grounding.page, bbox))
    }

    /// "Page N" with N 1-indexed, or "N/A" without grounding.
    pub fn page_label(&self) -> String {
        match self.page() {
            Some(page) => format!("Page {}", u64::from(page) + 1),
            None => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(grounding: Option<Grounding>) -> Chunk {
        Chunk {
            key: "0".into(),
            text: "t".into(),
            chunk_type: "text".into(),
            grounding,
        }
    }

    #[test]
    fn inverted_or_out_of_range_boxes_are_invalid() {
        assert!(BoundingBox::new(0.1, 0.1, 0.5, 0.2).is_valid());
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!BoundingBox::new(0.5, 0.1, 0.5, 0.2).is_valid());
        assert!(!BoundingBox::new(0.6, 0.1, 0.5, 0.2).is_valid());
        assert!(!BoundingBox::new(0.1, 0.3, 0.5, 0.2).is_valid());
        assert!(!BoundingBox::new(-0.1, 0.1, 0.5, 0.2).is_valid());
        assert!(!BoundingBox::new(0.1, 0.1, 1.2, 0.2).is_valid());
        assert!(!BoundingBox::new(f64::NAN, 0.1, 0.5, 0.2).is_valid());
    }

    #[test]
    fn overlay_requires_a_valid_box() {
        let boxed = chunk(Some(Grounding {
            page: 2,
            bbox: Some(BoundingBox::new(0.2, 0.3, 0.6, 0.4)),
        }));
        assert_eq!(
            boxed.overlay(),
            Some((2, BoundingBox::new(0.2, 0.3, 0.6, 0.4)))
        );

        let page_only = chunk(Some(Grounding { page: 1, bbox: None }));
        assert_eq!(page_only.overlay(), None);
        assert_eq!(page_only.page_label(), "Page 2");

        let broken = chunk(Some(Grounding {
            page: 0,
            bbox: Some(BoundingBox::new(0.7, 0.3, 0.6, 0.4)),
        }));
        assert_eq!(broken.overlay(), None);
        assert_eq!(chunk(None).page_label(), "N/A");
    }

    #[test]
    fn center_is_midpoint_of_top_and_bottom() {
        let bbox = BoundingBox::new(0.2, 0.3, 0.6, 0.4);
        assert!((bbox.center_y() - 0.35).abs() < 1e-12);
    }
}
