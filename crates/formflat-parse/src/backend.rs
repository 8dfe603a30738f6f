//! PDF parsing backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts the page-level access the
//! flattening renderer needs: page boxes, rotation, content and resources.

use formflat_core::{PdfError, Rect};

/// Trait abstracting PDF page access.
///
/// # Associated Types
///
/// - `Document`: The parsed PDF document representation.
/// - `Page`: A reference to a single page within a document.
/// - `Resources`: The page's resource dictionary, as the backend represents it.
/// - `Error`: Backend-specific error type, convertible to [`PdfError`].
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page = MyBackend::get_page(&doc, 0)?;
/// let media_box = MyBackend::page_media_box(&doc, &page)?;
/// let content = MyBackend::page_content(&doc, &page)?;
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single page within a document.
    type Page;

    /// The resource dictionary of a page.
    type Resources;

    /// Backend-specific error type, convertible to [`PdfError`].
    type Error: std::error::Error + Into<PdfError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not represent a valid PDF document,
    /// or if the document is encrypted.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error>;

    /// Parse PDF bytes, decrypting with `password` when the document is
    /// encrypted.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the password is wrong.
    fn open_with_password(bytes: &[u8], password: &str) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// Get the MediaBox for a page, inherited through the page tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the MediaBox is missing from the page and all of
    /// its ancestors, or is malformed.
    fn page_media_box(doc: &Self::Document, page: &Self::Page) -> Result<Rect, Self::Error>;

    /// Get the CropBox for a page, inherited through the page tree.
    ///
    /// Returns `None` when no CropBox is set (the MediaBox is then visible).
    fn page_crop_box(doc: &Self::Document, page: &Self::Page) -> Result<Option<Rect>, Self::Error>;

    /// Get the raw `/Rotate` value of a page, defaulting to 0.
    ///
    /// The value is not normalized; see [`formflat_core::normalize_rotation`].
    fn page_rotate(doc: &Self::Document, page: &Self::Page) -> Result<i64, Self::Error>;

    /// Get the decoded content stream bytes of a page. Multiple content
    /// streams are concatenated.
    fn page_content(doc: &Self::Document, page: &Self::Page) -> Result<Vec<u8>, Self::Error>;

    /// Get the resource dictionary of a page, inherited through the page tree.
    fn page_resources(
        doc: &Self::Document,
        page: &Self::Page,
    ) -> Result<Self::Resources, Self::Error>;
}
