//! formflat-parse: object-graph layer over lopdf.
//!
//! This crate turns the raw lopdf object graph into typed, lazily decoded
//! values ([`object`]), walks the AcroForm field tree ([`field_tree`]),
//! finds the page of every terminal field ([`page_locator`]) and builds the
//! per-page [`FormFieldRegistry`](formflat_core::FormFieldRegistry)
//! ([`discovery`]). Page boxes, content and resources are read through the
//! [`PdfBackend`] trait.

pub mod backend;
pub mod discovery;
pub mod error;
pub mod field_factory;
pub mod field_tree;
pub mod lopdf_backend;
pub mod object;
pub mod page_geometry;
pub mod page_locator;

pub use backend::PdfBackend;
pub use discovery::{DiscoveredForm, DiscoveryReport, FormDiscovery, discover_form_fields};
pub use error::BackendError;
pub use field_factory::{Skipped, instantiate};
pub use field_tree::{FieldNode, FieldWalker, InheritedAttributes, TerminalField, WalkOutcome};
pub use formflat_core;
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use object::{DecodedArray, DecodedDictionary, DecodedValue, decode, document_catalog};
pub use page_geometry::PageGeometry;
pub use page_locator::PageLocator;
