//! Flattening renderer: source pages + field overlay → new PDF.
//!
//! Every source page is replayed as a Form XObject (its content stream and
//! a deep copy of its resources) on a fresh output page whose MediaBox is
//! the page's effective bounds. The field overlay is drawn after the
//! replay, inside the same display transform, so overlay coordinates are
//! the fields' own page-space rectangles. Annotations follow the fields.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use formflat_core::{AnnotationStore, FormFieldRegistry, FormOptions, PdfError, Rect};
use formflat_parse::{LopdfBackend, LopdfDocument, PageGeometry, PdfBackend};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tempfile::{NamedTempFile, TempPath};

use crate::appearance::{Appearance, OVERLAY_FONT, OverlayContext};

/// Resource name of the replayed source page in the output page.
const PAGE_XOBJECT: &str = "Px";

/// A flattened document written to a private temporary file.
///
/// The file is deleted when the output is dropped; [`save`](Self::save)
/// copies it to a permanent location first.
#[derive(Debug)]
pub struct FlattenedOutput {
    path: TempPath,
    page_bounds: Vec<Rect>,
}

impl FlattenedOutput {
    /// Location of the temporary file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.page_bounds.len()
    }

    /// MediaBox of every output page, in page order.
    pub fn page_bounds(&self) -> &[Rect] {
        &self.page_bounds
    }

    /// Read the flattened document into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PdfError> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Copy the flattened document to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::IoError`] if the copy fails. The temporary file
    /// is left in place.
    pub fn save(&self, dest: impl AsRef<Path>) -> Result<(), PdfError> {
        let dest = dest.as_ref();
        std::fs::copy(&self.path, dest).map_err(|e| {
            PdfError::IoError(format!("failed to save to {}: {e}", dest.display()))
        })?;
        #[cfg(feature = "tracing")]
        tracing::debug!(dest = %dest.display(), "saved flattened document");
        Ok(())
    }

    /// Keep the temporary file on disk and return its path.
    pub fn keep(self) -> Result<PathBuf, PdfError> {
        self.path
            .keep()
            .map_err(|e| PdfError::IoError(format!("failed to keep flattened output: {e}")))
    }
}

/// Renders a source document plus a field registry into a flattened PDF.
#[derive(Debug)]
pub struct Flattener<'d> {
    source: &'d LopdfDocument,
    registry: &'d FormFieldRegistry,
    annotations: Option<&'d AnnotationStore>,
    options: &'d FormOptions,
}

impl<'d> Flattener<'d> {
    pub fn new(
        source: &'d LopdfDocument,
        registry: &'d FormFieldRegistry,
        options: &'d FormOptions,
    ) -> Self {
        Self {
            source,
            registry,
            annotations: None,
            options,
        }
    }

    /// Also burn `annotations` into the pages, after the field overlay.
    pub fn with_annotations(mut self, annotations: &'d AnnotationStore) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Build the output document in memory. Pages are emitted in source
    /// order; output page `n` carries the registry's fields for page `n`.
    pub fn build_document(&self) -> Result<(Document, Vec<Rect>), PdfError> {
        let mut output = Document::with_version("1.5");
        let pages_id = output.new_object_id();
        let font_id = output.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut copier = ObjectCopier::new(self.source.inner());
        let mut kids = Vec::new();
        let mut page_bounds = Vec::new();
        for index in 0..LopdfBackend::page_count(self.source) {
            let (page_id, bounds) =
                self.render_page(&mut output, &mut copier, index, pages_id, font_id)?;
            kids.push(Object::Reference(page_id));
            page_bounds.push(bounds);
        }

        output.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = output.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        output.trailer.set("Root", catalog_id);
        Ok((output, page_bounds))
    }

    fn render_page(
        &self,
        output: &mut Document,
        copier: &mut ObjectCopier<'_>,
        index: usize,
        pages_id: ObjectId,
        font_id: ObjectId,
    ) -> Result<(ObjectId, Rect), PdfError> {
        let page = LopdfBackend::get_page(self.source, index)?;
        let geometry = PageGeometry::from_backend::<LopdfBackend>(self.source, &page)?;
        let content = LopdfBackend::page_content(self.source, &page)?;
        let resources = LopdfBackend::page_resources(self.source, &page)?;

        let visible = geometry.visible_box();
        let bounds = geometry.effective_bounds();
        #[cfg(feature = "tracing")]
        tracing::trace!(
            page = index + 1,
            rotation = geometry.rotation(),
            ?bounds,
            "rendering page"
        );

        let resources = copier.copy_dictionary(output, &resources)?;
        let xobject_id = output.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "FormType" => 1,
                "BBox" => rect_array(&visible),
                "Resources" => resources,
            },
            content,
        ));

        let transform = geometry.display_transform();
        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                transform.to_array().iter().map(|v| Object::Real(*v as f32)).collect(),
            ),
            Operation::new("Do", vec![Object::Name(PAGE_XOBJECT.as_bytes().to_vec())]),
        ];
        let mut overlay = OverlayContext::new(self.options);
        let page_number = index as u32 + 1;
        for field in self.registry.fields_for_page(page_number) {
            field.render_into(&mut overlay);
        }
        if let Some(store) = self.annotations {
            for annotation in store.annotations_for_page(page_number) {
                annotation.render_into(&mut overlay);
            }
        }
        operations.extend(overlay.into_operations());
        operations.push(Operation::new("Q", vec![]));

        let content = Content { operations }
            .encode()
            .map_err(|e| PdfError::Other(format!("failed to encode page content: {e}")))?;
        let content_id = output.add_object(Stream::new(Dictionary::new(), content));

        let page_id = output.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => rect_array(&bounds),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { PAGE_XOBJECT => xobject_id },
                "Font" => dictionary! { OVERLAY_FONT => font_id },
            },
        });
        Ok((page_id, bounds))
    }

    /// Render every page and write the result to a temporary file in
    /// [`FormOptions::temp_dir`] (or the system temp directory).
    pub fn render_all_pages(&self) -> Result<FlattenedOutput, PdfError> {
        let (mut document, page_bounds) = self.build_document()?;

        let mut file = match &self.options.temp_dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|e| PdfError::IoError(format!("failed to create temporary file: {e}")))?;
        document
            .save_to(&mut file)
            .map_err(|e| PdfError::IoError(format!("failed to write flattened document: {e}")))?;
        file.flush()?;

        let path = file.into_temp_path();
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), pages = page_bounds.len(), "flattened document written");
        Ok(FlattenedOutput { path, page_bounds })
    }
}

fn rect_array(rect: &Rect) -> Vec<Object> {
    rect.to_corners()
        .iter()
        .map(|v| Object::Real(*v as f32))
        .collect()
}

/// Deep copy of objects from the source document into the output,
/// following indirect references.
///
/// Every source object is copied at most once. The output id of a
/// reference is reserved before its target is copied, so reference cycles
/// resolve to the reserved id.
struct ObjectCopier<'s> {
    source: &'s Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'s> ObjectCopier<'s> {
    fn new(source: &'s Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    fn copy_dictionary(
        &mut self,
        output: &mut Document,
        dict: &Dictionary,
    ) -> Result<Dictionary, PdfError> {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            copy.set(key.clone(), self.copy_object(output, value)?);
        }
        Ok(copy)
    }

    fn copy_object(&mut self, output: &mut Document, object: &Object) -> Result<Object, PdfError> {
        match object {
            Object::Reference(id) => {
                if let Some(new_id) = self.copied.get(id) {
                    return Ok(Object::Reference(*new_id));
                }
                let new_id = output.new_object_id();
                self.copied.insert(*id, new_id);
                let copied = match self.source.get_object(*id) {
                    Ok(target) => self.copy_object(output, target)?,
                    Err(_) => Object::Null,
                };
                output.objects.insert(new_id, copied);
                Ok(Object::Reference(new_id))
            }
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(output, dict)?)),
            Object::Array(items) => items
                .iter()
                .map(|item| self.copy_object(output, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Object::Array),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(output, &stream.dict)?;
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Ok(Object::Stream(copy))
            }
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formflat_core::{Annotation, Color, FieldKind, FormFieldInstance, TextAlignment};

    fn source_document(rotate: i64) -> LopdfDocument {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        // Resources with a cycle: the form XObject's resources point back
        // at the resource dictionary that contains it.
        let resources_id = doc.new_object_id();
        let form_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                "Resources" => resources_id,
            },
            b"0 0 10 10 re f".to_vec(),
        ));
        doc.objects.insert(
            resources_id,
            Object::Dictionary(dictionary! { "XObject" => dictionary! { "Fm0" => form_id } }),
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"q /Fm0 Do Q".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "CropBox" => vec![36.into(), 36.into(), 576.into(), 756.into()],
            "Rotate" => rotate,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        LopdfBackend::open(&bytes).unwrap()
    }

    fn registry_with_text(value: &str) -> FormFieldRegistry {
        let mut registry = FormFieldRegistry::new();
        registry.insert(
            1,
            FormFieldInstance::new(
                "name",
                Rect::new(100.0, 600.0, 200.0, 20.0),
                0,
                FieldKind::Text {
                    multiline: false,
                    alignment: TextAlignment::Left,
                    font_size: None,
                },
            )
            .with_value(Some(value.to_string())),
        );
        registry
    }

    fn page_operations(doc: &Document) -> Vec<Operation> {
        let page_id = *doc.get_pages().get(&1).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content).unwrap().operations
    }

    #[test]
    fn output_page_uses_effective_bounds() {
        let source = source_document(0);
        let registry = FormFieldRegistry::new();
        let options = FormOptions::default();
        let (doc, bounds) = Flattener::new(&source, &registry, &options)
            .build_document()
            .unwrap();
        assert_eq!(bounds, vec![Rect::new(36.0, 36.0, 540.0, 720.0)]);
        let page_id = *doc.get_pages().get(&1).unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media: Vec<f32> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect();
        assert_eq!(media, vec![36.0, 36.0, 576.0, 756.0]);
    }

    #[test]
    fn rotated_page_swaps_bounds_and_transforms_replay() {
        let source = source_document(90);
        let registry = FormFieldRegistry::new();
        let options = FormOptions::default();
        let (doc, bounds) = Flattener::new(&source, &registry, &options)
            .build_document()
            .unwrap();
        assert_eq!(bounds, vec![Rect::new(36.0, 36.0, 720.0, 540.0)]);
        let ops = page_operations(&doc);
        let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
        let m: Vec<f32> = cm.operands.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(&m[..4], &[0.0, -1.0, 1.0, 0.0]);
    }

    #[test]
    fn overlay_is_drawn_after_replay() {
        let source = source_document(0);
        let registry = registry_with_text("Hello");
        let options = FormOptions::default();
        let (doc, _) = Flattener::new(&source, &registry, &options)
            .build_document()
            .unwrap();
        let ops = page_operations(&doc);
        let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        let do_at = names.iter().position(|n| *n == "Do").unwrap();
        let tj_at = names.iter().position(|n| *n == "Tj").unwrap();
        assert!(do_at < tj_at);
        assert_eq!(names.first(), Some(&"q"));
        assert_eq!(names.last(), Some(&"Q"));
        let tj = &ops[tj_at];
        assert_eq!(tj.operands[0].as_str().unwrap(), b"Hello");
    }

    #[test]
    fn annotations_follow_fields_in_insertion_order() {
        let source = source_document(0);
        let registry = registry_with_text("Hello");
        let mut annotations = AnnotationStore::new();
        annotations.add(
            1,
            Annotation::stroke(vec![(10.0, 10.0), (50.0, 50.0)], 1.5, Color::new(0.0, 0.0, 1.0)),
        );
        annotations.add(1, Annotation::text(Rect::new(40.0, 700.0, 200.0, 30.0), "Note", 11.0));
        annotations.add(2, Annotation::text(Rect::new(0.0, 0.0, 10.0, 10.0), "elsewhere", 11.0));
        let options = FormOptions::default();
        let (doc, _) = Flattener::new(&source, &registry, &options)
            .with_annotations(&annotations)
            .build_document()
            .unwrap();

        let ops = page_operations(&doc);
        let shown: Vec<&[u8]> = ops
            .iter()
            .filter(|op| op.operator == "Tj")
            .map(|op| op.operands[0].as_str().unwrap())
            .collect();
        assert_eq!(shown, vec![&b"Hello"[..], &b"Note"[..]]);

        let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
        let field_at = names.iter().position(|n| *n == "Tj").unwrap();
        let stroke_at = names.iter().position(|n| *n == "RG").unwrap();
        let note_at = names.iter().rposition(|n| *n == "Tj").unwrap();
        assert!(field_at < stroke_at && stroke_at < note_at);
        assert_eq!(names.last(), Some(&"Q"));
    }

    #[test]
    fn cyclic_resources_are_copied_once() {
        let source = source_document(0);
        let registry = FormFieldRegistry::new();
        let options = FormOptions::default();
        let (doc, _) = Flattener::new(&source, &registry, &options)
            .build_document()
            .unwrap();
        let forms = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| s.content == b"0 0 10 10 re f".to_vec())
            .count();
        assert_eq!(forms, 1);
    }

    #[test]
    fn render_all_pages_writes_temp_file() {
        let source = source_document(0);
        let registry = registry_with_text("Hello");
        let dir = tempfile::tempdir().unwrap();
        let options = FormOptions {
            temp_dir: Some(dir.path().to_path_buf()),
            ..FormOptions::default()
        };
        let output = Flattener::new(&source, &registry, &options)
            .render_all_pages()
            .unwrap();
        assert!(output.path().starts_with(dir.path()));
        assert_eq!(output.page_count(), 1);
        let reopened = LopdfBackend::open(&output.to_bytes().unwrap()).unwrap();
        assert_eq!(LopdfBackend::page_count(&reopened), 1);

        let path = output.path().to_path_buf();
        drop(output);
        assert!(!path.exists());
    }

    #[test]
    fn save_copies_output() {
        let source = source_document(0);
        let registry = FormFieldRegistry::new();
        let options = FormOptions::default();
        let output = Flattener::new(&source, &registry, &options)
            .render_all_pages()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("flat.pdf");
        output.save(&dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), output.to_bytes().unwrap());
    }

    #[test]
    fn save_to_missing_directory_fails() {
        let source = source_document(0);
        let registry = FormFieldRegistry::new();
        let options = FormOptions::default();
        let output = Flattener::new(&source, &registry, &options)
            .render_all_pages()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = output.save(dir.path().join("missing").join("flat.pdf")).unwrap_err();
        assert!(matches!(err, PdfError::IoError(_)));
        assert!(output.path().exists());
    }
}
