//! Options controlling field discovery and flattening.

use std::path::PathBuf;

/// How the Page Locator numbers the entries of the page tree's `/Kids` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageNumbering {
    /// The entry at index `i` of an `n`-entry `/Kids` array is page `n - i`.
    #[default]
    Countdown,
    /// The entry at index `i` is page `i + 1`.
    TopDown,
}

impl PageNumbering {
    /// Page number of the `/Kids` entry at `index` in an array of `count` entries.
    pub fn page_number(&self, index: usize, count: usize) -> u32 {
        match self {
            PageNumbering::Countdown => (count - index) as u32,
            PageNumbering::TopDown => (index + 1) as u32,
        }
    }
}

/// Options for form discovery and flattening.
///
/// All settings have defaults matching the behavior of the interactive
/// viewer the flattened output should look like.
#[derive(Debug, Clone)]
pub struct FormOptions {
    /// Page numbering convention used when locating a field's page
    /// (default: [`PageNumbering::Countdown`]).
    pub page_numbering: PageNumbering,
    /// Maximum nesting depth of the AcroForm field tree (default: 64).
    pub max_field_depth: usize,
    /// Size of the button marker relative to the field rectangle (default: 0.8).
    pub button_inset: f64,
    /// Automatic font size of single-line text fields as a fraction of the
    /// field height (default: 0.7).
    pub text_size_ratio: f64,
    /// Automatic font size of multiline text fields (default: 12.0).
    pub multiline_font_size: f64,
    /// Directory for the temporary flattened output (default: system temp dir).
    pub temp_dir: Option<PathBuf>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            page_numbering: PageNumbering::Countdown,
            max_field_depth: 64,
            button_inset: 0.8,
            text_size_ratio: 0.7,
            multiline_font_size: 12.0,
            temp_dir: None,
        }
    }
}
