//! Rectangles and affine transforms in PDF user space.
//!
//! All coordinates here use the native PDF convention: origin at the
//! bottom-left, y growing upwards. [`Rect`] is stored as origin plus size,
//! normalized so that width and height are never negative.

/// Axis-aligned rectangle in PDF user space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners, as found in PDF
    /// `[llx lly urx ury]` arrays. Corners may be given in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Right edge.
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Top edge.
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// The rectangle as a PDF `[llx lly urx ury]` array.
    pub fn to_corners(&self) -> [f64; 4] {
        [self.x, self.y, self.max_x(), self.max_y()]
    }

    /// Overlapping region of two rectangles, or `None` when they do not
    /// overlap with a positive area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.max_x().min(other.max_x());
        let y1 = self.max_y().min(other.max_y());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::from_corners(x0, y0, x1, y1))
    }

    /// Shrink the rectangle around its center so that each side is
    /// `ratio` times its original length.
    pub fn inset_by_ratio(&self, ratio: f64) -> Rect {
        let width = self.width * ratio;
        let height = self.height * ratio;
        Rect {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }

    /// Same rectangle with x/y origins and width/height exchanged.
    pub fn transposed(&self) -> Rect {
        Rect {
            x: self.y,
            y: self.x,
            width: self.height,
            height: self.width,
        }
    }
}

/// Affine transform `[a b c d e f]` as used by the PDF `cm` operator.
///
/// A point `(x, y)` maps to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Transform flipping the vertical axis of a region `height` tall:
    /// translate by `height`, then scale y by -1.
    ///
    /// Converts top-down layout coordinates into bottom-up PDF coordinates
    /// and back (the transform is its own inverse).
    pub fn flip_vertical(height: f64) -> Self {
        Self::scale(1.0, -1.0).then(&Self::translate(0.0, height))
    }

    /// Compose: apply `self` first, then `next`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Bounding rectangle of a transformed rectangle.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        let (x0, y0) = self.transform_point(rect.x, rect.y);
        let (x1, y1) = self.transform_point(rect.max_x(), rect.max_y());
        Rect::from_corners(x0, y0, x1, y1)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Operands for the `cm` operator.
    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// Normalize a `/Rotate` value into `0..360`.
pub fn normalize_rotation(rotation: i64) -> i64 {
    rotation.rem_euclid(360)
}

/// Effective page box: the crop box clipped to the media box, expressed in
/// display orientation.
///
/// When the crop box does not overlap the media box at all, the media box
/// is used. For 90° and 270° rotations the origin and size are transposed;
/// every other rotation value passes the box through unchanged.
pub fn effective_bounds(crop_box: &Rect, media_box: &Rect, rotation: i64) -> Rect {
    let visible = visible_box(crop_box, media_box);
    match normalize_rotation(rotation) {
        90 | 270 => visible.transposed(),
        _ => visible,
    }
}

/// Crop box clipped to the media box, in the page's own unrotated space.
pub fn visible_box(crop_box: &Rect, media_box: &Rect) -> Rect {
    crop_box.intersection(media_box).unwrap_or(*media_box)
}

/// Transform mapping the unrotated visible box onto the rotated effective
/// bounds returned by [`effective_bounds`].
///
/// PDF `/Rotate` turns the page clockwise for display; the returned matrix
/// applies that turn so content drawn in page space shows up upright in the
/// output page.
pub fn display_transform(visible: &Rect, rotation: i64) -> Matrix {
    let (x, y, w, h) = (visible.x, visible.y, visible.width, visible.height);
    match normalize_rotation(rotation) {
        90 => Matrix::new(0.0, -1.0, 1.0, 0.0, 0.0, 2.0 * x + w),
        180 => Matrix::new(-1.0, 0.0, 0.0, -1.0, 2.0 * x + w, 2.0 * y + h),
        270 => Matrix::new(0.0, 1.0, -1.0, 0.0, 2.0 * y + h, 0.0),
        _ => Matrix::IDENTITY,
    }
}
