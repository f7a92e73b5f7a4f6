//! Aggregated extraction output, keyed by page.
//!
//! [`ExtractionResult`] is the JSON-serializable boundary consumed by the
//! surrounding review layer. Serializing and deserializing must reproduce
//! identical text run and image collections.

use serde::{Deserialize, Serialize};

use crate::classify::DetectionResult;
use crate::diagnostics::Diagnostic;
use crate::geometry::BBox;
use crate::images::ImageRecord;
use crate::margins::MarginSet;
use crate::metadata::DocumentMetadata;
use crate::raster::PageKind;
use crate::text::TextRun;

/// Per-page facts established at document open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 0-based page index.
    pub index: usize,
    /// Page rotation in degrees, normalized to 0/90/180/270.
    pub rotation: i32,
    /// Crop rectangle in top-left origin coordinates (points).
    pub crop_box: BBox,
    /// Content classification of the page.
    pub kind: PageKind,
    /// Number of characters extracted from the page.
    pub text_yield: usize,
    /// Fraction of extracted characters that could not be decoded, 0..1.
    pub undecodable_ratio: f64,
}

impl PageRecord {
    /// Whether the page lacks a usable text layer.
    pub fn is_rasterized(&self) -> bool {
        self.kind == PageKind::Rasterized
    }
}

/// Everything extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageExtraction {
    pub page: PageRecord,
    pub text_runs: Vec<TextRun>,
    pub images: Vec<ImageRecord>,
    pub margins: MarginSet,
}

/// Full extraction output for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub metadata: DocumentMetadata,
    pub detection: DetectionResult,
    pub pages: Vec<PageExtraction>,
    /// Non-fatal conditions accumulated across the whole pass.
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    /// All text runs across pages, in page order then reading order.
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.pages.iter().flat_map(|p| p.text_runs.iter())
    }

    /// All image records across pages, in page order.
    pub fn images(&self) -> impl Iterator<Item = &ImageRecord> {
        self.pages.iter().flat_map(|p| p.images.iter())
    }

    /// Pretty-printed JSON rendering of the whole result.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
