//! pubmeter: structural measurement extraction and reviewer annotation for
//! PDF publications.
//!
//! This crate owns the lopdf backend: document loading, content stream
//! interpretation, and annotation serialization. The measurement data model
//! and the pure algorithms (font normalization, reading order, margins,
//! DPI math, classification, annotation layout) live in `pubmeter-core`
//! and are re-exported here.
//!
//! # Example
//!
//! ```no_run
//! let bytes = std::fs::read("report.pdf")?;
//! let result = pubmeter::extract_document(&bytes)?;
//! println!(
//!     "{} pages, detected as {}",
//!     result.metadata.page_count,
//!     result.detection.predicted_type.label()
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod annotate;
pub mod cmap;
pub mod content;
pub mod document;
pub mod error;
pub mod extract;

pub use annotate::{AnnotatedPdf, AnnotationWriter, annotate_document};
pub use document::Document;
pub use error::ExtractError;
pub use extract::{
    ExtractOptions, extract_document, extract_document_with, extract_document_with_password,
};
pub use pubmeter_core;
pub use pubmeter_core::{
    AnnotationRequest, DetectionResult, Diagnostic, DiagnosticCode, DocumentMetadata,
    DocumentType, ExtractionResult, ImageRecord, MarginSet, PageKind, Severity, TextRun,
};
