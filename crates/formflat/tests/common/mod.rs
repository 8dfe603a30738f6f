//! Shared helpers for building form PDFs and inspecting flattened output.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

pub fn text(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

pub fn rect(corners: [i64; 4]) -> Object {
    Object::Array(corners.iter().map(|v| Object::Integer(*v)).collect())
}

/// Box and content setup of one source page.
#[derive(Debug, Clone)]
pub struct PageSpec {
    pub media_box: [i64; 4],
    pub crop_box: Option<[i64; 4]>,
    pub rotate: i64,
    pub content: Vec<u8>,
}

impl PageSpec {
    /// US Letter page drawing a single filled square.
    pub fn letter() -> Self {
        Self {
            media_box: [0, 0, 612, 792],
            crop_box: None,
            rotate: 0,
            content: b"0.5 g 72 72 144 144 re f".to_vec(),
        }
    }

    pub fn with_crop_box(mut self, crop: [i64; 4]) -> Self {
        self.crop_box = Some(crop);
        self
    }

    pub fn with_rotate(mut self, rotate: i64) -> Self {
        self.rotate = rotate;
        self
    }
}

/// Incremental builder for a PDF with an AcroForm.
pub struct FormBuilder {
    pub doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    specs: Vec<PageSpec>,
    annots: Vec<Vec<Object>>,
    fields: Vec<Object>,
}

impl FormBuilder {
    pub fn new(pages: Vec<PageSpec>) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_ids = pages.iter().map(|_| doc.new_object_id()).collect();
        let annots = vec![Vec::new(); pages.len()];
        Self {
            doc,
            pages_id,
            page_ids,
            specs: pages,
            annots,
            fields: Vec::new(),
        }
    }

    pub fn page_id(&self, index: usize) -> ObjectId {
        self.page_ids[index]
    }

    /// Add a widget annotation. With `page = Some(i)` it is listed in the
    /// `/Annots` array of page `i` (0-based position in `/Kids`).
    pub fn add_widget(&mut self, page: Option<usize>, mut dict: Dictionary) -> ObjectId {
        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        if let Some(index) = page {
            dict.set("P", self.page_ids[index]);
        }
        let id = self.doc.add_object(dict);
        if let Some(index) = page {
            self.annots[index].push(Object::Reference(id));
        }
        id
    }

    /// List `id` in the AcroForm `/Fields` array.
    pub fn add_field(&mut self, id: ObjectId) {
        self.fields.push(Object::Reference(id));
    }

    /// Add a radio group whose kids sit on `page`, one per export value.
    pub fn add_radio_group(
        &mut self,
        name: &str,
        page: usize,
        exports: &[&str],
        selected: Option<&str>,
    ) -> ObjectId {
        let group_id = self.doc.new_object_id();
        let mut kids = Vec::new();
        for (i, export) in exports.iter().enumerate() {
            let x = 100 + 40 * i as i64;
            let on = self
                .doc
                .add_object(Stream::new(dictionary! {}, b"0 g 2 2 8 8 re f".to_vec()));
            let off = self.doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let state = match selected {
                Some(s) if s == *export => *export,
                _ => "Off",
            };
            let kid = self.add_widget(
                Some(page),
                dictionary! {
                    "Parent" => group_id,
                    "Rect" => rect([x, 400, x + 12, 412]),
                    "AS" => state,
                    "AP" => dictionary! {
                        "N" => dictionary! { *export => on, "Off" => off },
                    },
                },
            );
            kids.push(Object::Reference(kid));
        }
        let mut group = dictionary! {
            "FT" => "Btn",
            "Ff" => Object::Integer((1 << 15) | (1 << 14)),
            "T" => text(name),
            "Kids" => kids,
        };
        if let Some(value) = selected {
            group.set("V", Object::Name(value.as_bytes().to_vec()));
        }
        self.doc.objects.insert(group_id, Object::Dictionary(group));
        self.add_field(group_id);
        group_id
    }

    pub fn build(mut self) -> Vec<u8> {
        let helv = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        for (i, spec) in self.specs.iter().enumerate() {
            let content_id = self
                .doc
                .add_object(Stream::new(dictionary! {}, spec.content.clone()));
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "MediaBox" => rect(spec.media_box),
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "Helv" => helv } },
            };
            if let Some(crop) = spec.crop_box {
                page.set("CropBox", rect(crop));
            }
            if spec.rotate != 0 {
                page.set("Rotate", spec.rotate);
            }
            if !self.annots[i].is_empty() {
                page.set("Annots", std::mem::take(&mut self.annots[i]));
            }
            self.doc.objects.insert(self.page_ids[i], Object::Dictionary(page));
        }
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let acroform = self.doc.add_object(dictionary! {
            "Fields" => std::mem::take(&mut self.fields),
            "DA" => text("/Helv 0 Tf 0 g"),
        });
        let catalog = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
            "AcroForm" => acroform,
        });
        self.doc.trailer.set("Root", catalog);

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }
}

/// Decoded content operations of the 1-based page `page` of a PDF.
pub fn page_operations(bytes: &[u8], page: u32) -> Vec<Operation> {
    let doc = Document::load_mem(bytes).expect("flattened output should parse");
    let page_id = doc.get_pages()[&page];
    let content = doc.get_page_content(page_id).expect("page content");
    Content::decode(&content).expect("content decodes").operations
}

/// MediaBox of the 1-based page `page` of a PDF.
pub fn media_box(bytes: &[u8], page: u32) -> [f64; 4] {
    let doc = Document::load_mem(bytes).expect("flattened output should parse");
    let page_id = doc.get_pages()[&page];
    let array = doc
        .get_dictionary(page_id)
        .and_then(|d| d.get(b"MediaBox"))
        .and_then(|o| o.as_array())
        .expect("MediaBox");
    let values: Vec<f64> = array.iter().map(|o| o.as_float().unwrap() as f64).collect();
    [values[0], values[1], values[2], values[3]]
}

/// Byte strings shown with `Tj`, each with the `Tm` position before it.
pub fn shown_text(operations: &[Operation]) -> Vec<(Vec<u8>, f64, f64)> {
    let mut position = (0.0, 0.0);
    let mut shown = Vec::new();
    for op in operations {
        match op.operator.as_str() {
            "Tm" => {
                position = (
                    op.operands[4].as_float().unwrap() as f64,
                    op.operands[5].as_float().unwrap() as f64,
                );
            }
            "Tj" => {
                if let Ok(bytes) = op.operands[0].as_str() {
                    shown.push((bytes.to_vec(), position.0, position.1));
                }
            }
            _ => {}
        }
    }
    shown
}

/// Number of times `operator` occurs.
pub fn count_operator(operations: &[Operation], operator: &str) -> usize {
    operations.iter().filter(|op| op.operator == operator).count()
}
