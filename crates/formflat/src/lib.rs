//! formflat: Discover AcroForm fields in PDF documents and flatten their
//! values into page content.
//!
//! This is the public API facade crate. It re-exports types from
//! formflat-core and uses formflat-parse for reading the source document.
//!
//! # Architecture
//!
//! - **formflat-core**: Backend-independent geometry, field and registry types
//! - **formflat-parse**: Object decoding, field discovery and page geometry over lopdf
//! - **formflat** (this crate): Background tasks, overlay appearance and the
//!   flattening renderer
//!
//! # Example
//!
//! ```ignore
//! use formflat::FormDocument;
//!
//! let doc = FormDocument::open_file("form.pdf", None)?;
//! let mut form = doc.discover();
//! form.registry.set_value_by_name("name", "Hello");
//! doc.flatten(&form.registry)?.save("flat.pdf")?;
//! ```

pub mod appearance;
mod document;
mod flatten;
mod tasks;
pub mod text_layout;

pub use appearance::{Appearance, OverlayContext};
pub use document::FormDocument;
pub use flatten::{FlattenedOutput, Flattener};
pub use formflat_core::{
    Annotation, AnnotationStore, ButtonKind, Color, FieldKind, FieldType, FormFieldInstance,
    FormFieldRegistry, FormOptions, Matrix, PageNumbering, PdfError, Rect, TextAlignment,
};
pub use formflat_parse::{DiscoveredForm, DiscoveryReport, PageGeometry};
pub use tasks::{DiscoveryHandle, FlattenTask};

pub use formflat_core;
pub use formflat_parse;
