//! Free-standing page annotations drawn on top of the flattened page.
//!
//! These are not PDF annotation objects. They are marks added by the caller
//! (typed notes, freehand strokes) that the renderer burns into the page
//! content after the form field appearances.

use std::collections::BTreeMap;

use crate::Rect;

/// An RGB color with components in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Components clamped to [0.0, 1.0].
    pub fn clamped(&self) -> [f64; 3] {
        [self.r, self.g, self.b].map(|c| c.clamp(0.0, 1.0))
    }
}

/// One annotation, in page space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Annotation {
    /// Black Helvetica text whose first line starts at the top-left corner
    /// of `rect`. Lines break at `\n`.
    Text {
        rect: Rect,
        text: String,
        font_size: f64,
    },
    /// A polyline through `points`, stroked with `stroke_width`, or filled
    /// as a closed shape when `fill` is set.
    Path {
        points: Vec<(f64, f64)>,
        stroke_width: f64,
        color: Color,
        fill: bool,
    },
}

impl Annotation {
    pub fn text(rect: Rect, text: impl Into<String>, font_size: f64) -> Self {
        Annotation::Text {
            rect,
            text: text.into(),
            font_size,
        }
    }

    /// A stroked (unfilled) path.
    pub fn stroke(points: Vec<(f64, f64)>, stroke_width: f64, color: Color) -> Self {
        Annotation::Path {
            points,
            stroke_width,
            color,
            fill: false,
        }
    }
}

/// Annotations bucketed by 1-based page number, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotationStore {
    pages: BTreeMap<u32, Vec<Annotation>>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `annotation` to `page`, creating the page's bucket if needed.
    pub fn add(&mut self, page: u32, annotation: Annotation) {
        self.pages.entry(page).or_default().push(annotation);
    }

    /// Annotations of `page` in drawing order. Empty when there are none.
    pub fn annotations_for_page(&self, page: u32) -> &[Annotation] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove and return the annotations of `page`.
    pub fn clear_page(&mut self, page: u32) -> Vec<Annotation> {
        self.pages.remove(&page).unwrap_or_default()
    }

    pub fn page_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.values().all(Vec::is_empty)
    }
}
