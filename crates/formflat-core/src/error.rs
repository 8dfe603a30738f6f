//! Error types for formflat.
//!
//! Provides [`PdfError`] for fatal errors that stop an operation. Problems
//! found while discovering form fields are not errors: they are skipped and
//! reported through logging instead.

use std::fmt;

/// Fatal error types for PDF form processing.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading the source or writing the flattened output.
    IoError(String),
    /// The PDF is encrypted and requires a password to open.
    PasswordRequired,
    /// The supplied password is incorrect for this encrypted PDF.
    InvalidPassword,
    /// A 1-based page number outside the document.
    PageOutOfRange {
        /// The requested page number.
        page: u32,
        /// Number of pages in the document.
        page_count: u32,
    },
    /// A background task (discovery or flattening) ended without a result.
    TaskFailed(String),
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            PdfError::InvalidPassword => write!(f, "the supplied password is incorrect"),
            PdfError::PageOutOfRange { page, page_count } => {
                write!(f, "page {page} out of range (1..={page_count})")
            }
            PdfError::TaskFailed(msg) => write!(f, "background task failed: {msg}"),
            PdfError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}
