//! pubmeter-core: Backend-independent measurement types and algorithms.
//!
//! This crate provides the data model (text runs, image records, margin
//! sets, detection results, annotation requests) and the pure algorithms
//! behind pubmeter: font name normalization, column-aware reading order,
//! effective-DPI math, margin measurement, identifier scanning, document
//! type classification, rasterization scoring, and annotation layout.
//! It performs no PDF I/O; the `pubmeter` crate owns the lopdf backend.
//!
//! All coordinates use a top-left origin in points. Conversion from PDF's
//! native bottom-left space happens only at the document loader boundary.

pub mod annotate;
pub mod classify;
pub mod columns;
pub mod diagnostics;
pub mod fonts;
pub mod geometry;
pub mod images;
pub mod margins;
pub mod metadata;
pub mod raster;
pub mod result;
pub mod text;

pub use annotate::{
    AnnotationRequest, NOTE_SPACING_PT, PageLayout, PlacedAnnotation, Severity, summary_message,
};
pub use classify::{DetectionResult, DocumentType, FiredSignal, SignalInput, classify};
pub use columns::{assign_reading_order, detect_column_edges};
pub use diagnostics::{Diagnostic, DiagnosticCode};
pub use fonts::{derive_weight, normalize_family, strip_subset_tag, weight_from_name};
pub use geometry::{BBox, Ctm, MM_PER_PT, PT_PER_INCH, Point, pt_to_mm};
pub use images::{FULL_BLEED_TOLERANCE_PT, ImageRecord, effective_dpi, is_full_bleed, placement_bbox};
pub use margins::{MarginOptions, MarginSet, PageSide, compute_margins};
pub use metadata::{
    DocumentMetadata, IdentifierKind, IdentifierSource, fold_text, scan_identifiers, valid_isbn,
};
pub use raster::{PageKind, RasterOptions, classify_page_content};
pub use result::{ExtractionResult, PageExtraction, PageRecord};
pub use text::{FontWeight, Rgb, TextRun};
