//! Typed, lazily decoded view over the lopdf object graph.
//!
//! [`DecodedDictionary`] wraps one dictionary (or stream dictionary) of the
//! source document and decodes its entries into [`DecodedValue`]s on first
//! access. Nested dictionaries and arrays are wrapped, not decoded, so a
//! value is only materialized when something asks for it.
//!
//! The object graph contains cycles: field dictionaries point back at their
//! group through `/Parent`, widgets point at their page through `/P`, and
//! page nodes point at the page tree through `/Parent`. Dictionary or stream
//! values stored under those two keys always decode to absent. No other
//! cycle detection is done.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use formflat_core::Rect;
use lopdf::{Dictionary, Document, Object};

/// Keys that point back to an enclosing structure and are never followed.
pub const BACK_REFERENCE_KEYS: [&str; 2] = ["Parent", "P"];

/// Upper bound on `obj -> ref -> ref ...` chains while resolving a value.
const MAX_REFERENCE_CHAIN: usize = 32;

/// One decoded PDF object.
#[derive(Debug, Clone)]
pub enum DecodedValue<'a> {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Name(String),
    String(String),
    Array(DecodedArray<'a>),
    Dictionary(DecodedDictionary<'a>),
    /// A stream, represented by its dictionary. The payload is not decoded.
    Stream(DecodedDictionary<'a>),
}

impl<'a> DecodedValue<'a> {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DecodedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integer or real, widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Integer(i) => Some(*i as f64),
            DecodedValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            DecodedValue::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            DecodedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Name or string contents.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DecodedValue::Name(s) | DecodedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&DecodedArray<'a>> {
        match self {
            DecodedValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Dictionary, or the dictionary of a stream.
    pub fn as_dictionary(&self) -> Option<&DecodedDictionary<'a>> {
        match self {
            DecodedValue::Dictionary(d) | DecodedValue::Stream(d) => Some(d),
            _ => None,
        }
    }
}

impl PartialEq for DecodedValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DecodedValue::Boolean(a), DecodedValue::Boolean(b)) => a == b,
            (DecodedValue::Integer(a), DecodedValue::Integer(b)) => a == b,
            (DecodedValue::Real(a), DecodedValue::Real(b)) => a == b,
            (DecodedValue::Name(a), DecodedValue::Name(b)) => a == b,
            (DecodedValue::String(a), DecodedValue::String(b)) => a == b,
            (DecodedValue::Array(a), DecodedValue::Array(b)) => a == b,
            (DecodedValue::Dictionary(a), DecodedValue::Dictionary(b))
            | (DecodedValue::Stream(a), DecodedValue::Stream(b)) => a == b,
            _ => false,
        }
    }
}

/// Decode a single object of `doc`, resolving indirect references first.
///
/// Returns `None` for null objects and references that cannot be resolved.
pub fn decode<'a>(doc: &'a Document, object: &'a Object) -> Option<DecodedValue<'a>> {
    let object = resolve(doc, object)?;
    let value = match object {
        Object::Boolean(b) => DecodedValue::Boolean(*b),
        Object::Integer(i) => DecodedValue::Integer(*i),
        Object::Real(r) => DecodedValue::Real(*r as f64),
        Object::Name(name) => DecodedValue::Name(String::from_utf8_lossy(name).into_owned()),
        Object::String(bytes, _) => DecodedValue::String(decode_pdf_string(bytes)),
        Object::Array(items) => DecodedValue::Array(DecodedArray::new(doc, items)),
        Object::Dictionary(dict) => DecodedValue::Dictionary(DecodedDictionary::new(doc, dict)),
        Object::Stream(stream) => DecodedValue::Stream(DecodedDictionary::new(doc, &stream.dict)),
        Object::Null | Object::Reference(_) => return None,
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(value)
}

/// Decode the value stored under `key`, applying the back-reference guard.
fn decode_entry<'a>(doc: &'a Document, key: &str, object: &'a Object) -> Option<DecodedValue<'a>> {
    let value = decode(doc, object)?;
    let is_back_reference = BACK_REFERENCE_KEYS.contains(&key);
    match value {
        DecodedValue::Dictionary(_) | DecodedValue::Stream(_) if is_back_reference => None,
        value => Some(value),
    }
}

/// Follow indirect references until a direct object is reached.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    let mut current = object;
    for _ in 0..MAX_REFERENCE_CHAIN {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            direct => return Some(direct),
        }
    }
    None
}

/// Decode a PDF string, handling UTF-16 BE BOM and falling back to UTF-8.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// The document catalog (`/Root` of the trailer), decoded.
pub fn document_catalog(doc: &Document) -> Option<DecodedDictionary<'_>> {
    let root = doc.trailer.get(b"Root").ok()?;
    match decode(doc, root)? {
        DecodedValue::Dictionary(catalog) => Some(catalog),
        _ => None,
    }
}

/// A PDF array whose elements are decoded on first access.
///
/// Elements that decode to absent (null, dangling references) are left out.
#[derive(Clone)]
pub struct DecodedArray<'a> {
    doc: &'a Document,
    items: &'a [Object],
    decoded: OnceCell<Vec<DecodedValue<'a>>>,
}

impl<'a> DecodedArray<'a> {
    pub fn new(doc: &'a Document, items: &'a [Object]) -> Self {
        Self {
            doc,
            items,
            decoded: OnceCell::new(),
        }
    }

    fn values(&self) -> &[DecodedValue<'a>] {
        self.decoded.get_or_init(|| {
            self.items
                .iter()
                .filter_map(|item| decode(self.doc, item))
                .collect()
        })
    }

    /// Number of decoded (present) elements.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Every element in source order, absent ones (null, dangling) as `None`.
    /// Not cached.
    pub fn positions(&self) -> impl Iterator<Item = Option<DecodedValue<'a>>> + '_ {
        self.items.iter().map(|item| decode(self.doc, item))
    }

    pub fn get(&self, index: usize) -> Option<&DecodedValue<'a>> {
        self.values().get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecodedValue<'a>> {
        self.values().iter()
    }

    /// Elements that are dictionaries or streams.
    pub fn dictionaries(&self) -> impl Iterator<Item = &DecodedDictionary<'a>> {
        self.iter().filter_map(DecodedValue::as_dictionary)
    }

    /// Interpret a 4-number array `[x0 y0 x1 y1]` as a rectangle.
    pub fn rect(&self) -> Option<Rect> {
        let values = self.values();
        if values.len() != 4 {
            return None;
        }
        let x0 = values[0].as_f64()?;
        let y0 = values[1].as_f64()?;
        let x1 = values[2].as_f64()?;
        let y1 = values[3].as_f64()?;
        Some(Rect::from_corners(x0, y0, x1, y1))
    }
}

impl<'s, 'a> IntoIterator for &'s DecodedArray<'a> {
    type Item = &'s DecodedValue<'a>;
    type IntoIter = std::slice::Iter<'s, DecodedValue<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for DecodedArray<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.values() == other.values()
    }
}

impl fmt::Debug for DecodedArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedArray")
            .field("len", &self.items.len())
            .finish_non_exhaustive()
    }
}

/// A dictionary (or stream dictionary) whose entries are decoded lazily.
///
/// Keys keep the order in which the source dictionary stores them. The
/// key → value map is built once, on the first typed access, and reused
/// for the lifetime of this value.
#[derive(Clone)]
pub struct DecodedDictionary<'a> {
    doc: &'a Document,
    dict: &'a Dictionary,
    keys: OnceCell<Vec<String>>,
    attributes: OnceCell<HashMap<String, DecodedValue<'a>>>,
}

impl<'a> DecodedDictionary<'a> {
    pub fn new(doc: &'a Document, dict: &'a Dictionary) -> Self {
        Self {
            doc,
            dict,
            keys: OnceCell::new(),
            attributes: OnceCell::new(),
        }
    }

    /// The wrapped source dictionary.
    pub fn raw(&self) -> &'a Dictionary {
        self.dict
    }

    /// Key names in source order. Keys that are not valid UTF-8 are skipped.
    pub fn keys(&self) -> &[String] {
        self.keys.get_or_init(|| {
            self.dict
                .iter()
                .filter_map(|(key, _)| String::from_utf8(key.clone()).ok())
                .collect()
        })
    }

    fn attributes(&self) -> &HashMap<String, DecodedValue<'a>> {
        self.attributes.get_or_init(|| {
            let mut attributes = HashMap::with_capacity(self.keys().len());
            for key in self.keys() {
                let Ok(object) = self.dict.get(key.as_bytes()) else {
                    continue;
                };
                if let Some(value) = decode_entry(self.doc, key, object) {
                    attributes.insert(key.clone(), value);
                }
            }
            attributes
        })
    }

    /// Decoded value under `key`, or `None` when the key is missing, its
    /// value is null, or it is a back-reference to an enclosing dictionary.
    pub fn get(&self, key: &str) -> Option<&DecodedValue<'a>> {
        self.attributes().get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn name(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_name()
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_string()
    }

    /// Name or string value under `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_text()
    }

    pub fn array(&self, key: &str) -> Option<&DecodedArray<'a>> {
        self.get(key)?.as_array()
    }

    /// Dictionary or stream dictionary under `key`.
    pub fn dictionary(&self, key: &str) -> Option<&DecodedDictionary<'a>> {
        self.get(key)?.as_dictionary()
    }

    /// Rectangle stored as a 4-number array under `key`.
    pub fn rect(&self, key: &str) -> Option<Rect> {
        self.array(key)?.rect()
    }

    fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys().iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Structural equality over the `/Rect` rectangle, the key set and the `/T`
/// name.
///
/// Enough to recognize one field dictionary reached through two paths (the
/// field tree and a page's `/Annots`). Two distinct widgets with the same
/// rectangle, keys and name compare equal.
impl PartialEq for DecodedDictionary<'_> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self.dict, other.dict) {
            return true;
        }
        self.rect("Rect") == other.rect("Rect")
            && self.sorted_keys() == other.sorted_keys()
            && self.text("T") == other.text("T")
    }
}

impl fmt::Debug for DecodedDictionary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedDictionary")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}
