//! Deterministic annotation layout.
//!
//! Reviewer notes are stacked down a fixed margin column at fixed vertical
//! spacing. Anchored notes probe downward from their anchor in spacing
//! increments until they clear every note already placed on the page. When
//! a column would run past a fixed fraction of the page height, placement
//! wraps to a secondary column at a fixed horizontal offset. All resolved
//! positions stay inside the page crop rectangle.

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Point};

/// Vertical spacing between stacked notes (points).
pub const NOTE_SPACING_PT: f64 = 20.0;

/// Horizontal inset of the primary margin column from the crop edge.
pub const COLUMN_INSET_PT: f64 = 20.0;

/// Vertical inset of the first note from the crop top.
pub const COLUMN_TOP_PT: f64 = 20.0;

/// Fraction of the crop height past which placement wraps to the
/// secondary column.
pub const WRAP_FRACTION: f64 = 0.85;

/// Horizontal offset of the secondary column from the primary one.
pub const SECOND_COLUMN_OFFSET_PT: f64 = 36.0;

/// Approximate rendered size of a note icon, used for edge clamping.
const NOTE_SIZE_PT: f64 = 18.0;

/// Severity of a reviewer issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Note color for this severity, as unit-interval RGB. Purely a
    /// rendering concern resolved at write time.
    pub fn color(&self) -> (f32, f32, f32) {
        match self {
            Severity::Error => (1.0, 0.0, 0.0),
            Severity::Warning => (1.0, 1.0, 0.0),
            Severity::Info => (0.0, 0.0, 1.0),
        }
    }
}

/// A reviewer issue to be written onto the PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    /// 0-based page index.
    pub page: usize,
    /// Anchor point in top-left origin coordinates, if the issue has a
    /// location on the page.
    pub anchor: Option<Point>,
    /// Issue message shown in the note.
    pub message: String,
    pub severity: Severity,
    /// Optional reviewer note appended to the message.
    pub reviewer_note: Option<String>,
}

/// A resolved note position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedAnnotation {
    /// 0-based page index.
    pub page: usize,
    /// Resolved x in top-left origin coordinates (points).
    pub x: f64,
    /// Resolved y in top-left origin coordinates (points).
    pub y: f64,
    /// Stacking rank on this page, 0-based in placement order.
    pub rank: usize,
}

/// Per-page placement state. Create one per page, feed it each request in
/// order, and it guarantees no two notes on the page overlap under the
/// default spacing.
#[derive(Debug)]
pub struct PageLayout {
    crop: BBox,
    used: Vec<Point>,
    rank: usize,
}

impl PageLayout {
    pub fn new(crop: BBox) -> Self {
        Self {
            crop,
            used: Vec::new(),
            rank: 0,
        }
    }

    fn wrap_limit(&self) -> f64 {
        self.crop.top + self.crop.height() * WRAP_FRACTION
    }

    fn clamp_x(&self, x: f64) -> f64 {
        x.clamp(self.crop.x0 + 2.0, self.crop.x1 - NOTE_SIZE_PT)
    }

    fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(self.crop.top + 2.0, self.crop.bottom - NOTE_SIZE_PT)
    }

    fn conflicts(&self, x: f64, y: f64) -> bool {
        // Icons render NOTE_SIZE_PT wide, so anything nearer than that
        // horizontally still collides.
        self.used
            .iter()
            .any(|p| (p.x - x).abs() < NOTE_SIZE_PT && (p.y - y).abs() < NOTE_SPACING_PT)
    }

    /// Resolve the next note position, probing downward from the anchor
    /// (or the top of the margin column) and wrapping to the secondary
    /// column when the primary would overflow.
    pub fn resolve(&mut self, page: usize, anchor: Option<Point>) -> PlacedAnnotation {
        let column_x = self.clamp_x(self.crop.x0 + COLUMN_INSET_PT);
        let (start_x, start_y) = match anchor {
            Some(p) => (self.clamp_x(p.x), self.clamp_y(p.y)),
            None => (column_x, self.clamp_y(self.crop.top + COLUMN_TOP_PT)),
        };

        let mut x = start_x;
        let mut y = start_y;
        let mut wrapped = false;
        while self.conflicts(x, y) || y > self.wrap_limit() {
            if y > self.wrap_limit() {
                if wrapped {
                    // Secondary column full as well: clamp into the page
                    // and accept the position.
                    y = self.clamp_y(y);
                    break;
                }
                wrapped = true;
                x = self.clamp_x(column_x + SECOND_COLUMN_OFFSET_PT);
                y = self.clamp_y(self.crop.top + COLUMN_TOP_PT);
                continue;
            }
            y += NOTE_SPACING_PT;
        }
        let y = self.clamp_y(y);

        self.used.push(Point::new(x, y));
        let rank = self.rank;
        self.rank += 1;
        PlacedAnnotation { page, x, y, rank }
    }
}

/// Build the synthetic page-1 summary message from severity counts.
pub fn summary_message(requests: &[AnnotationRequest]) -> String {
    let errors = requests
        .iter()
        .filter(|r| r.severity == Severity::Error)
        .count();
    let warnings = requests
        .iter()
        .filter(|r| r.severity == Severity::Warning)
        .count();
    format!("Review summary: {errors} errors, {warnings} warnings")
}
