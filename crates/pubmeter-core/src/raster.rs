//! Rasterized-page detection.
//!
//! A scanned or flattened page has almost no extractable text while raster
//! images cover essentially the whole page. The thresholds were chosen
//! empirically and are carried on [`RasterOptions`] as tunable values, not
//! fixed law.

use serde::{Deserialize, Serialize};

/// Maximum extracted characters for a page to count as text-free.
pub const RASTER_TEXT_MAX_CHARS: usize = 50;

/// Minimum fractional image coverage for a text-free page to count as
/// rasterized.
pub const RASTER_COVERAGE_MIN: f64 = 0.95;

/// Minimum fractional image coverage for a page with text to count as
/// mixed rather than native.
pub const MIXED_COVERAGE_MIN: f64 = 0.50;

/// Content classification of a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageKind {
    /// Native text content; text-based measurements are reliable.
    Native,
    /// Image-only page (a scan or a flattened export); no usable text layer.
    Rasterized,
    /// Real text over large raster coverage.
    Mixed,
}

/// Tunable thresholds for page content classification.
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    pub max_text_chars: usize,
    pub min_coverage: f64,
    pub mixed_min_coverage: f64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            max_text_chars: RASTER_TEXT_MAX_CHARS,
            min_coverage: RASTER_COVERAGE_MIN,
            mixed_min_coverage: MIXED_COVERAGE_MIN,
        }
    }
}

/// Classify one page from its extracted text length and the fraction of
/// page area covered by painted raster images.
///
/// Rules are evaluated first-match. A page with image-heavy but well-tagged
/// content stays `Native` or `Mixed`; only true scans hit `Rasterized`.
/// Zero image coverage can never classify as rasterized.
pub fn classify_page_content(
    text_len: usize,
    image_coverage: f64,
    options: &RasterOptions,
) -> PageKind {
    type Rule = (PageKind, fn(usize, f64, &RasterOptions) -> bool);
    const RULES: &[Rule] = &[
        (PageKind::Rasterized, |text, coverage, o| {
            coverage > 0.0 && coverage >= o.min_coverage && text < o.max_text_chars
        }),
        (PageKind::Mixed, |text, coverage, o| {
            text >= o.max_text_chars && coverage >= o.mixed_min_coverage
        }),
        (PageKind::Native, |_, _, _| true),
    ];

    RULES
        .iter()
        .find(|(_, predicate)| predicate(text_len, image_coverage, options))
        .map(|(kind, _)| *kind)
        .expect("rule table ends with a catch-all")
}
