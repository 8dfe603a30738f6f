//! Type dispatch from a terminal field to a [`FormFieldInstance`].

use formflat_core::{ButtonKind, FieldKind, FieldType, FormFieldInstance, TextAlignment, flags};

use crate::field_tree::TerminalField;
use crate::object::DecodedDictionary;

/// Export value of a button whose appearance does not name one.
const DEFAULT_EXPORT_VALUE: &str = "Yes";

/// Why a terminal field produced no instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    /// `/FT` is missing or names a type without a renderer (choice,
    /// signature, unknown names).
    UnsupportedType(Option<String>),
    /// The widget has no usable `/Rect`.
    MissingRect,
}

/// Build the concrete field instance for `terminal`.
///
/// Dispatches on the inherited `/FT`: `Btn` becomes a push button, radio
/// button or checkbox depending on `/Ff`; `Tx` becomes a text field.
pub fn instantiate(terminal: &TerminalField<'_>) -> Result<FormFieldInstance, Skipped> {
    let attrs = &terminal.attributes;
    let field_type = attrs.field_type.as_deref().and_then(FieldType::from_pdf_name);
    let field_flags = attrs.flags.unwrap_or(0);

    let kind = match field_type {
        Some(FieldType::Button) => FieldKind::Button {
            kind: ButtonKind::from_flags(field_flags),
            export_value: export_value(&terminal.dict),
        },
        Some(FieldType::Text) => FieldKind::Text {
            multiline: field_flags & flags::MULTILINE != 0,
            alignment: TextAlignment::from_quadding(attrs.quadding.unwrap_or(0)),
            font_size: attrs.default_appearance.as_deref().and_then(font_size_from_da),
        },
        Some(FieldType::Choice | FieldType::Signature) | None => {
            return Err(Skipped::UnsupportedType(attrs.field_type.clone()));
        }
    };

    let rect = terminal.dict.rect("Rect").ok_or(Skipped::MissingRect)?;
    let name = attrs.name.clone().unwrap_or_default();
    Ok(FormFieldInstance::new(name, rect, field_flags, kind).with_value(attrs.value.clone()))
}

/// The value a button takes when this widget is on.
///
/// The first key of the normal appearance dictionary `/AP /N` other than
/// `Off`, then the appearance state `/AS` when it is not `Off`, then `Yes`.
pub fn export_value(widget: &DecodedDictionary<'_>) -> String {
    let from_appearance = widget
        .dictionary("AP")
        .and_then(|ap| ap.dictionary("N"))
        .and_then(|normal| normal.keys().iter().find(|k| k.as_str() != "Off").cloned());
    from_appearance
        .or_else(|| {
            widget
                .name("AS")
                .filter(|state| *state != "Off")
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_EXPORT_VALUE.to_string())
}

/// Font size operand of the `Tf` operator in a default appearance string
/// such as `/Helv 12 Tf 0 g`. Zero or a missing operator means automatic.
pub fn font_size_from_da(da: &str) -> Option<f64> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let tf = tokens.iter().rposition(|t| *t == "Tf")?;
    let size: f64 = tokens.get(tf.checked_sub(1)?)?.parse().ok()?;
    (size > 0.0).then_some(size)
}
