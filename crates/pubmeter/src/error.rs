//! Fatal error types for document processing.
//!
//! Only conditions that abort the whole document surface here; page-level
//! and advisory conditions accumulate as
//! [`Diagnostic`](pubmeter_core::Diagnostic) values on the result instead.

use thiserror::Error;

/// Fatal error for document extraction and annotation.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input could not be parsed as a PDF.
    #[error("corrupt document: {0}")]
    CorruptDocument(String),

    /// The PDF is encrypted and no password was supplied.
    #[error("document is encrypted and requires a password")]
    EncryptedDocument,

    /// The supplied password is incorrect for this encrypted PDF.
    #[error("the supplied password is incorrect")]
    InvalidPassword,

    /// Error reading input data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A page index outside the document was requested.
    #[error("page index {index} out of range (0..{count})")]
    PageOutOfRange { index: usize, count: usize },

    /// The annotated document could not be serialized back to bytes.
    #[error("failed to write annotated document: {0}")]
    Write(String),
}
