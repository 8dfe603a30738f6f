//! Top-level document type for form discovery and flattening.

use std::path::Path;
use std::sync::Arc;

use formflat_core::{AnnotationStore, FormFieldRegistry, FormOptions, PdfError, Rect};
use formflat_parse::{
    DiscoveredForm, LopdfBackend, LopdfDocument, PageGeometry, PdfBackend, discover_form_fields,
};

use crate::flatten::{FlattenedOutput, Flattener};
use crate::tasks::{DiscoveryHandle, FlattenTask};

/// A PDF document opened for form flattening.
///
/// # Example
///
/// ```ignore
/// let doc = FormDocument::open(&bytes, None)?;
/// let mut form = doc.discover_in_background().wait()?;
/// form.registry.set_value_by_name("full_name", "Ada Lovelace");
/// let output = doc.flatten(&form.registry)?;
/// output.save("flattened.pdf")?;
/// ```
#[derive(Debug, Clone)]
pub struct FormDocument {
    doc: Arc<LopdfDocument>,
    options: FormOptions,
}

impl FormDocument {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::IoError`] if the file cannot be read, or any
    /// error of [`FormDocument::open`].
    pub fn open_file(
        path: impl AsRef<Path>,
        options: Option<FormOptions>,
    ) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| PdfError::IoError(e.to_string()))?;
        Self::open(&bytes, options)
    }

    /// Open a PDF document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PasswordRequired`] if the PDF is encrypted.
    /// Returns [`PdfError::ParseError`] if the bytes are not a valid PDF.
    pub fn open(bytes: &[u8], options: Option<FormOptions>) -> Result<Self, PdfError> {
        let doc = LopdfBackend::open(bytes)?;
        Ok(Self::from_document(doc, options))
    }

    /// Open an encrypted PDF document with a password.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::InvalidPassword`] if the password is wrong.
    pub fn open_with_password(
        bytes: &[u8],
        password: &str,
        options: Option<FormOptions>,
    ) -> Result<Self, PdfError> {
        let doc = LopdfBackend::open_with_password(bytes, password)?;
        Ok(Self::from_document(doc, options))
    }

    fn from_document(doc: LopdfDocument, options: Option<FormOptions>) -> Self {
        Self {
            doc: Arc::new(doc),
            options: options.unwrap_or_default(),
        }
    }

    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.doc)
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// The parsed source document.
    pub fn source(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Box geometry of the 1-based page `page`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] for a page outside the document.
    pub fn page_geometry(&self, page: u32) -> Result<PageGeometry, PdfError> {
        let page_count = self.page_count();
        if page == 0 || page as usize > page_count {
            return Err(PdfError::PageOutOfRange {
                page,
                page_count: page_count as u32,
            });
        }
        let lopdf_page = LopdfBackend::get_page(&self.doc, page as usize - 1)?;
        Ok(PageGeometry::from_backend::<LopdfBackend>(
            &self.doc,
            &lopdf_page,
        )?)
    }

    /// Effective bounds of the 1-based page `page`: CropBox ∩ MediaBox,
    /// axes swapped for 90° and 270° rotations.
    pub fn effective_bounds(&self, page: u32) -> Result<Rect, PdfError> {
        Ok(self.page_geometry(page)?.effective_bounds())
    }

    /// Discover form fields on the calling thread.
    pub fn discover(&self) -> DiscoveredForm {
        discover_form_fields(self.doc.inner(), &self.options)
    }

    /// Discover form fields on a background thread.
    pub fn discover_in_background(&self) -> DiscoveryHandle {
        DiscoveryHandle::spawn(Arc::clone(&self.doc), self.options.clone())
    }

    /// Flatten the document with the field values of `registry` on the
    /// calling thread.
    pub fn flatten(&self, registry: &FormFieldRegistry) -> Result<FlattenedOutput, PdfError> {
        Flattener::new(&self.doc, registry, &self.options).render_all_pages()
    }

    /// Flatten the document with the field values of `registry`, then burn
    /// the marks of `annotations` on top of each page.
    pub fn flatten_with_annotations(
        &self,
        registry: &FormFieldRegistry,
        annotations: &AnnotationStore,
    ) -> Result<FlattenedOutput, PdfError> {
        Flattener::new(&self.doc, registry, &self.options)
            .with_annotations(annotations)
            .render_all_pages()
    }

    /// Flatten the document on a background thread over a snapshot of
    /// `registry`.
    pub fn flatten_in_background(&self, registry: &FormFieldRegistry) -> FlattenTask {
        self.flatten_with_annotations_in_background(registry, &AnnotationStore::new())
    }

    /// Background variant of
    /// [`flatten_with_annotations`](Self::flatten_with_annotations), over
    /// snapshots of both `registry` and `annotations`.
    pub fn flatten_with_annotations_in_background(
        &self,
        registry: &FormFieldRegistry,
        annotations: &AnnotationStore,
    ) -> FlattenTask {
        FlattenTask::spawn(
            Arc::clone(&self.doc),
            registry.clone(),
            annotations.clone(),
            self.options.clone(),
        )
    }
}
