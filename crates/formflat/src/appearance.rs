//! Overlay appearance of form fields.
//!
//! Every [`FormFieldInstance`] renders its current value as content stream
//! operations in page space, drawn on top of the replayed page content.
//! Text fields draw their value in Helvetica, clipped to the field
//! rectangle; buttons draw an inset square that is filled when selected.
//! Caller [`Annotation`]s are drawn the same way, after the fields.

use formflat_core::{
    Annotation, Color, FieldKind, FormFieldInstance, FormOptions, Matrix, Rect, TextAlignment,
};
use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use crate::text_layout::{HELVETICA_DESCENT, encode_win_ansi, text_width, wrap_lines};

/// Resource name of the overlay font in the output page's `/Font` dictionary.
pub const OVERLAY_FONT: &str = "FHelv";

/// Horizontal and vertical text padding inside a field, in points.
const TEXT_PADDING: f64 = 2.0;

/// Line height of multiline text as a multiple of the font size.
const LINE_SPACING: f64 = 1.15;

/// Stroke width of button markers.
const MARKER_LINE_WIDTH: f64 = 1.0;

/// Collects overlay operations for one page.
#[derive(Debug)]
pub struct OverlayContext<'o> {
    options: &'o FormOptions,
    operations: Vec<Operation>,
}

impl<'o> OverlayContext<'o> {
    pub fn new(options: &'o FormOptions) -> Self {
        Self {
            options,
            operations: Vec::new(),
        }
    }

    pub fn options(&self) -> &FormOptions {
        self.options
    }

    pub fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    fn rectangle(&mut self, rect: &Rect) {
        self.push(
            "re",
            vec![
                real(rect.x),
                real(rect.y),
                real(rect.width),
                real(rect.height),
            ],
        );
    }

    fn show_line(&mut self, encoded: Vec<u8>, x: f64, y: f64) {
        self.push(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                real(x),
                real(y),
            ],
        );
        self.push("Tj", vec![Object::String(encoded, StringFormat::Literal)]);
    }
}

/// Something that can draw itself into a page overlay.
pub trait Appearance {
    fn render_into(&self, context: &mut OverlayContext<'_>);
}

impl Appearance for FormFieldInstance {
    fn render_into(&self, context: &mut OverlayContext<'_>) {
        match &self.kind {
            FieldKind::Button { .. } => render_button(self, context),
            FieldKind::Text {
                multiline,
                alignment,
                font_size,
            } => {
                let Some(value) = self.current_value().filter(|v| !v.is_empty()) else {
                    return;
                };
                let size = font_size.unwrap_or_else(|| {
                    if *multiline {
                        context.options().multiline_font_size
                    } else {
                        self.rect.height * context.options().text_size_ratio
                    }
                });
                if size <= 0.0 {
                    return;
                }
                render_text(&self.rect, value, *multiline, *alignment, size, context);
            }
        }
    }
}

impl Appearance for Annotation {
    fn render_into(&self, context: &mut OverlayContext<'_>) {
        match self {
            Annotation::Text {
                rect,
                text,
                font_size,
            } => render_note(rect, text, *font_size, context),
            Annotation::Path {
                points,
                stroke_width,
                color,
                fill,
            } => render_path(points, *stroke_width, color, *fill, context),
        }
    }
}

/// Unclipped text lines running down from the top-left corner of `rect`.
fn render_note(rect: &Rect, text: &str, size: f64, context: &mut OverlayContext<'_>) {
    if text.is_empty() || size <= 0.0 {
        return;
    }
    let to_page = Matrix::flip_vertical(rect.height).then(&Matrix::translate(rect.x, rect.y));
    let leading = size * LINE_SPACING;
    context.push("q", vec![]);
    context.push("BT", vec![]);
    context.push("Tf", vec![Object::Name(OVERLAY_FONT.as_bytes().to_vec()), real(size)]);
    context.push("g", vec![0.into()]);
    for (i, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = size * (1.0 - HELVETICA_DESCENT) + leading * i as f64;
        let (x, y) = to_page.transform_point(0.0, baseline);
        context.show_line(encode_win_ansi(line), x, y);
    }
    context.push("ET", vec![]);
    context.push("Q", vec![]);
}

fn render_path(
    points: &[(f64, f64)],
    stroke_width: f64,
    color: &Color,
    fill: bool,
    context: &mut OverlayContext<'_>,
) {
    let [(x0, y0), rest @ ..] = points else {
        return;
    };
    if rest.is_empty() {
        return;
    }
    let [r, g, b] = color.clamped();
    context.push("q", vec![]);
    context.push("w", vec![real(stroke_width.max(0.0))]);
    context.push("J", vec![1.into()]);
    context.push("j", vec![1.into()]);
    if fill {
        context.push("rg", vec![real(r), real(g), real(b)]);
    } else {
        context.push("RG", vec![real(r), real(g), real(b)]);
    }
    context.push("m", vec![real(*x0), real(*y0)]);
    for (x, y) in rest {
        context.push("l", vec![real(*x), real(*y)]);
    }
    if fill {
        context.push("h", vec![]);
        context.push("f", vec![]);
    } else {
        context.push("S", vec![]);
    }
    context.push("Q", vec![]);
}

fn render_button(field: &FormFieldInstance, context: &mut OverlayContext<'_>) {
    let marker = field.rect.inset_by_ratio(context.options().button_inset);
    context.push("q", vec![]);
    context.push("w", vec![real(MARKER_LINE_WIDTH)]);
    context.push("G", vec![0.into()]);
    context.push("g", vec![0.into()]);
    context.rectangle(&marker);
    if field.is_selected() {
        context.push("B", vec![]);
    } else {
        context.push("S", vec![]);
    }
    context.push("Q", vec![]);
}

fn render_text(
    rect: &Rect,
    value: &str,
    multiline: bool,
    alignment: TextAlignment,
    size: f64,
    context: &mut OverlayContext<'_>,
) {
    let available = (rect.width - 2.0 * TEXT_PADDING).max(0.0);
    context.push("q", vec![]);
    context.rectangle(rect);
    context.push("W", vec![]);
    context.push("n", vec![]);
    context.push("BT", vec![]);
    context.push("Tf", vec![Object::Name(OVERLAY_FONT.as_bytes().to_vec()), real(size)]);
    context.push("g", vec![0.into()]);

    if multiline {
        // Lines are laid out top-down inside the field, then flipped into
        // page space.
        let to_page = Matrix::flip_vertical(rect.height).then(&Matrix::translate(rect.x, rect.y));
        let leading = size * LINE_SPACING;
        for (i, line) in wrap_lines(value, size, available).into_iter().enumerate() {
            let top_down_baseline = TEXT_PADDING + size * (1.0 - HELVETICA_DESCENT) + leading * i as f64;
            if top_down_baseline > rect.height {
                break;
            }
            if line.is_empty() {
                continue;
            }
            let x = aligned_offset(alignment, text_width(&line, size), available);
            let (page_x, page_y) = to_page.transform_point(x, top_down_baseline);
            context.show_line(line, page_x, page_y);
        }
    } else {
        let line = encode_win_ansi(&value.replace(['\r', '\n'], " "));
        let x = rect.x + aligned_offset(alignment, text_width(&line, size), available);
        let baseline = rect.y + (rect.height - size) / 2.0 + size * HELVETICA_DESCENT;
        context.show_line(line, x, baseline);
    }

    context.push("ET", vec![]);
    context.push("Q", vec![]);
}

/// Offset of a line from the field's left edge.
fn aligned_offset(alignment: TextAlignment, line_width: f64, available: f64) -> f64 {
    match alignment {
        TextAlignment::Left => TEXT_PADDING,
        TextAlignment::Center => TEXT_PADDING + (available - line_width) / 2.0,
        TextAlignment::Right => TEXT_PADDING + available - line_width,
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}
