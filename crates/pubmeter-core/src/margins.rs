//! Page margin measurement from observed content.
//!
//! Margins derive solely from the union of extracted text and image
//! bounding boxes against the crop rectangle — never from declared trim
//! or art boxes. This module only measures; whether a margin is "too
//! small" is policy and lives outside this crate.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::geometry::{BBox, pt_to_mm};
use crate::images::ImageRecord;
use crate::text::TextRun;

/// Boxes with either dimension below this threshold are treated as
/// decorative hairlines and excluded from the content bounding box.
pub const HAIRLINE_PT: f64 = 0.75;

/// Which side of the spine a page sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSide {
    /// Right-hand page; the inside (spine) margin is on the left.
    Recto,
    /// Left-hand page; the inside margin is on the right.
    Verso,
}

impl PageSide {
    pub fn opposite(&self) -> PageSide {
        match self {
            PageSide::Recto => PageSide::Verso,
            PageSide::Verso => PageSide::Recto,
        }
    }
}

/// Options for margin measurement.
#[derive(Debug, Clone, Copy)]
pub struct MarginOptions {
    /// Side assumed for the first page. There is no reliable
    /// machine-readable binding signal in a PDF, so page 1 defaults to
    /// recto; override for left-bound or cover-included documents.
    pub first_page_side: PageSide,
}

impl Default for MarginOptions {
    fn default() -> Self {
        Self {
            first_page_side: PageSide::Recto,
        }
    }
}

/// Measured margins for one page, in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginSet {
    /// 0-based page index.
    pub page: usize,
    pub top_mm: f64,
    pub bottom_mm: f64,
    /// Spine-adjacent margin.
    pub inside_mm: f64,
    /// Outer-edge margin.
    pub outside_mm: f64,
    pub page_side: PageSide,
    /// Union of observed content boxes (points), `None` for empty pages.
    pub content_bbox: Option<BBox>,
}

fn is_hairline(bbox: &BBox) -> bool {
    bbox.width() < HAIRLINE_PT || bbox.height() < HAIRLINE_PT
}

/// Measure margins for one page from its extracted content.
///
/// `crop` is the page crop rectangle in top-left origin coordinates.
/// Negative distances (content outside the crop) clamp to zero and emit a
/// [`DiagnosticCode::ClampedMargin`] diagnostic rather than silently
/// coercing.
pub fn compute_margins(
    page_index: usize,
    crop: &BBox,
    runs: &[TextRun],
    images: &[ImageRecord],
    options: &MarginOptions,
) -> (MarginSet, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let content = runs
        .iter()
        .map(|r| r.bbox)
        .chain(images.iter().map(|i| i.bbox))
        .filter(|b| !is_hairline(b))
        .reduce(|acc, b| acc.union(&b));

    // 1-indexed odd pages take the configured first-page side.
    let page_side = if page_index % 2 == 0 {
        options.first_page_side
    } else {
        options.first_page_side.opposite()
    };

    let Some(content) = content else {
        return (
            MarginSet {
                page: page_index,
                top_mm: 0.0,
                bottom_mm: 0.0,
                inside_mm: 0.0,
                outside_mm: 0.0,
                page_side,
                content_bbox: None,
            },
            diagnostics,
        );
    };

    let mut clamp = |raw_pt: f64, edge: &str| -> f64 {
        if raw_pt < 0.0 {
            diagnostics.push(Diagnostic::on_page(
                DiagnosticCode::ClampedMargin,
                format!("{edge} margin measured {raw_pt:.2}pt outside the crop box, clamped to 0"),
                page_index,
            ));
            0.0
        } else {
            raw_pt
        }
    };

    let top_pt = clamp(content.top - crop.top, "top");
    let bottom_pt = clamp(crop.bottom - content.bottom, "bottom");
    let left_pt = clamp(content.x0 - crop.x0, "left");
    let right_pt = clamp(crop.x1 - content.x1, "right");

    let (inside_pt, outside_pt) = match page_side {
        PageSide::Recto => (left_pt, right_pt),
        PageSide::Verso => (right_pt, left_pt),
    };

    (
        MarginSet {
            page: page_index,
            top_mm: pt_to_mm(top_pt),
            bottom_mm: pt_to_mm(bottom_pt),
            inside_mm: pt_to_mm(inside_pt),
            outside_mm: pt_to_mm(outside_pt),
            page_side,
            content_bbox: Some(content),
        },
        diagnostics,
    )
}
