//! Text run types extracted from a PDF page.

use serde::{Deserialize, Serialize};

use crate::geometry::BBox;

/// An RGB color with 0–255 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from unit-interval components as used by PDF color operators.
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let scale = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self {
            r: scale(r),
            g: scale(g),
            b: scale(b),
        }
    }
}

/// Font weight derived from the normalized font name and descriptor flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Medium,
    SemiBold,
    Bold,
    Black,
}

impl FontWeight {
    /// Whether this weight reads as bold or heavier.
    pub fn is_bold(&self) -> bool {
        matches!(self, FontWeight::SemiBold | FontWeight::Bold | FontWeight::Black)
    }
}

/// An ordered run of text extracted from a PDF page.
///
/// Coordinates use the top-left origin convention in points. `font_family`
/// is always normalized; `font_family_raw` preserves the exact name from the
/// content stream for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// 0-based page index.
    pub page: usize,
    /// The text content of this run. Undecodable glyphs appear as U+FFFD.
    pub text: String,
    /// Bounding box in top-left origin coordinates (points).
    pub bbox: BBox,
    /// Normalized font family (subset tag and style suffixes removed).
    pub font_family: String,
    /// Raw font name as it appears in the PDF.
    pub font_family_raw: String,
    /// Font size in points.
    pub size_pt: f64,
    /// Derived font weight.
    pub weight: FontWeight,
    /// Fill color of the text.
    pub color: Rgb,
    /// Position in column-aware reading order, 0-based per page.
    pub reading_order_index: usize,
}

impl TextRun {
    /// Number of undecodable placeholder glyphs in this run.
    pub fn undecodable_count(&self) -> usize {
        self.text.chars().filter(|&c| c == '\u{FFFD}').count()
    }
}
