//! Page geometry: visible box, effective bounds and display transform.
//!
//! Combines a page's MediaBox, optional CropBox and `/Rotate` value. The
//! visible box is the CropBox clipped to the MediaBox, in unrotated page
//! space. The effective bounds are that box as displayed, with width and
//! height swapped for quarter-turn rotations.

use formflat_core::{Matrix, Rect, display_transform, effective_bounds, normalize_rotation, visible_box};

use crate::backend::PdfBackend;

/// Page box configuration of one page.
///
/// # Example
///
/// ```
/// use formflat_core::Rect;
/// use formflat_parse::page_geometry::PageGeometry;
///
/// let media = Rect::new(0.0, 0.0, 612.0, 792.0);
/// let geo = PageGeometry::new(media, None, 90);
///
/// let bounds = geo.effective_bounds();
/// assert_eq!(bounds.width, 792.0);
/// assert_eq!(bounds.height, 612.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    media_box: Rect,
    crop_box: Option<Rect>,
    rotation: i64,
}

impl PageGeometry {
    /// Create a `PageGeometry` from page metadata.
    ///
    /// * `media_box` - Page MediaBox in PDF space.
    /// * `crop_box` - Optional CropBox. If `None`, the MediaBox is visible.
    /// * `rotation` - Page `/Rotate` value, normalized modulo 360.
    pub fn new(media_box: Rect, crop_box: Option<Rect>, rotation: i64) -> Self {
        Self {
            media_box,
            crop_box,
            rotation: normalize_rotation(rotation),
        }
    }

    /// Read the geometry of one page through a backend.
    pub fn from_backend<B: PdfBackend>(
        doc: &B::Document,
        page: &B::Page,
    ) -> Result<Self, B::Error> {
        let media_box = B::page_media_box(doc, page)?;
        let crop_box = B::page_crop_box(doc, page)?;
        let rotation = B::page_rotate(doc, page)?;
        Ok(Self::new(media_box, crop_box, rotation))
    }

    pub fn media_box(&self) -> Rect {
        self.media_box
    }

    pub fn crop_box(&self) -> Option<Rect> {
        self.crop_box
    }

    /// Rotation in degrees, in `0..360`.
    pub fn rotation(&self) -> i64 {
        self.rotation
    }

    /// The CropBox (or MediaBox) clipped to the MediaBox, unrotated.
    pub fn visible_box(&self) -> Rect {
        visible_box(&self.crop_box.unwrap_or(self.media_box), &self.media_box)
    }

    /// The visible box as displayed: axes swapped for 90° and 270°.
    pub fn effective_bounds(&self) -> Rect {
        effective_bounds(&self.crop_box.unwrap_or(self.media_box), &self.media_box, self.rotation)
    }

    /// Matrix mapping the unrotated visible box onto the effective bounds in
    /// display orientation.
    pub fn display_transform(&self) -> Matrix {
        display_transform(&self.visible_box(), self.rotation)
    }
}
