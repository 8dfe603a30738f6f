//! formflat-core: Backend-independent data types for PDF form flattening.
//!
//! This crate provides the geometry types ([`Rect`], [`Matrix`]), the
//! effective page box computation, the form field instances produced by
//! discovery, the per-page [`FormFieldRegistry`] and the caller's
//! [`AnnotationStore`]. It has no dependency on any PDF parser.

pub mod annotation;
pub mod error;
pub mod form_field;
pub mod geometry;
pub mod options;
pub mod registry;

pub use annotation::{Annotation, AnnotationStore, Color};
pub use error::PdfError;
pub use form_field::{ButtonKind, FieldKind, FieldType, FormFieldInstance, TextAlignment, flags};
pub use geometry::{
    Matrix, Rect, display_transform, effective_bounds, normalize_rotation, visible_box,
};
pub use options::{FormOptions, PageNumbering};
pub use registry::FormFieldRegistry;
