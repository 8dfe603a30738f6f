//! Form field instances discovered from an AcroForm.
//!
//! A [`FormFieldInstance`] is the concrete, mutable object behind one
//! terminal field (widget). Its [`FieldKind`] is a closed set of variants,
//! each carrying only the attributes its rendering needs.

use crate::Rect;

/// The type of a PDF form field.
///
/// Corresponds to the `/FT` entry in a field dictionary (PDF 1.7 Table 220).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldType {
    /// Text field (`/FT /Tx`).
    Text,
    /// Button field (`/FT /Btn`): checkboxes, radio buttons, push buttons.
    Button,
    /// Choice field (`/FT /Ch`): dropdowns, list boxes.
    Choice,
    /// Signature field (`/FT /Sig`).
    Signature,
}

impl FieldType {
    /// Parse a field type from its PDF name string.
    ///
    /// Returns `None` if the string is not a recognized field type.
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "Tx" => Some(Self::Text),
            "Btn" => Some(Self::Button),
            "Ch" => Some(Self::Choice),
            "Sig" => Some(Self::Signature),
            _ => None,
        }
    }

    /// Return the PDF name string for this field type.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            Self::Text => "Tx",
            Self::Button => "Btn",
            Self::Choice => "Ch",
            Self::Signature => "Sig",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "Text"),
            Self::Button => write!(f, "Button"),
            Self::Choice => write!(f, "Choice"),
            Self::Signature => write!(f, "Signature"),
        }
    }
}

/// Bits of the `/Ff` field flags entry used by the type dispatch.
pub mod flags {
    /// Field may not be changed by the user.
    pub const READ_ONLY: u32 = 1 << 0;
    /// Text field may contain multiple lines.
    pub const MULTILINE: u32 = 1 << 12;
    /// Exactly one radio button must be selected at all times.
    pub const NO_TOGGLE_TO_OFF: u32 = 1 << 14;
    /// Button is a radio button.
    pub const RADIO: u32 = 1 << 15;
    /// Button is a push button without a persistent value.
    pub const PUSHBUTTON: u32 = 1 << 16;
}

/// Horizontal alignment of a text field's value (`/Q` entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlignment {
    /// Map a `/Q` quadding value; unknown values fall back to left.
    pub fn from_quadding(q: i64) -> Self {
        match q {
            1 => Self::Center,
            2 => Self::Right,
            _ => Self::Left,
        }
    }
}

/// Sub-kind of a button field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ButtonKind {
    Radio,
    Push,
    CheckBox,
}

impl ButtonKind {
    /// Derive the button sub-kind from `/Ff` flags.
    pub fn from_flags(field_flags: u32) -> Self {
        if field_flags & flags::PUSHBUTTON != 0 {
            Self::Push
        } else if field_flags & flags::RADIO != 0 {
            Self::Radio
        } else {
            Self::CheckBox
        }
    }
}

/// Kind-specific attributes of a form field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    Text {
        multiline: bool,
        alignment: TextAlignment,
        /// Font size from the default appearance string; `None` means automatic.
        font_size: Option<f64>,
    },
    Button {
        kind: ButtonKind,
        /// Value the field takes when this widget is selected.
        export_value: String,
    },
}

/// A concrete form field bound to one widget rectangle on one page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormFieldInstance {
    /// Partial field name from `/T` (inherited from the group when the
    /// widget has none).
    pub name: String,
    /// Widget rectangle from `/Rect`, in page space.
    pub rect: Rect,
    /// Field flags from `/Ff`.
    pub flags: u32,
    /// Kind-specific attributes.
    pub kind: FieldKind,
    value: Option<String>,
}

impl FormFieldInstance {
    pub fn new(name: impl Into<String>, rect: Rect, flags: u32, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            rect,
            flags,
            kind,
            value: None,
        }
    }

    /// Builder-style initial value.
    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    /// The field type this instance was dispatched from.
    pub fn field_type(&self) -> FieldType {
        match self.kind {
            FieldKind::Text { .. } => FieldType::Text,
            FieldKind::Button { .. } => FieldType::Button,
        }
    }

    pub fn current_value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn clear_value(&mut self) {
        self.value = None;
    }

    pub fn is_read_only(&self) -> bool {
        self.flags & flags::READ_ONLY != 0
    }

    /// Whether a button shows as selected: its value equals its export value.
    ///
    /// Always `false` for text fields and push buttons.
    pub fn is_selected(&self) -> bool {
        match &self.kind {
            FieldKind::Button {
                kind: ButtonKind::Push,
                ..
            } => false,
            FieldKind::Button { export_value, .. } => {
                self.value.as_deref() == Some(export_value.as_str())
            }
            FieldKind::Text { .. } => false,
        }
    }

    /// Toggle a button: a selected button is cleared to the empty value,
    /// an unselected one takes its export value.
    ///
    /// Returns the new selection state. Text fields are left untouched.
    pub fn toggle(&mut self) -> bool {
        let FieldKind::Button { export_value, .. } = &self.kind else {
            return false;
        };
        if self.is_selected() {
            self.value = Some(String::new());
            false
        } else {
            self.value = Some(export_value.clone());
            true
        }
    }
}
