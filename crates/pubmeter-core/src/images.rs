//! Placed image records and effective-DPI math.
//!
//! Only images actually painted by the page content stream are recorded.
//! Resolution is always computed from pixel dimensions against the physical
//! placement rectangle; embedded metadata DPI is never trusted.

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, Ctm, PT_PER_INCH, Point};

/// Distance (points) within which an image edge counts as touching the
/// crop rectangle for full-bleed detection.
pub const FULL_BLEED_TOLERANCE_PT: f64 = 2.0;

/// An image painted on a PDF page via the `Do` operator.
///
/// Coordinates use the top-left origin convention in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// 0-based page index.
    pub page: usize,
    /// Placement bounding box on the page (points).
    pub bbox: BBox,
    /// Source pixel width.
    pub pixel_width: u32,
    /// Source pixel height.
    pub pixel_height: u32,
    /// Effective horizontal resolution from placement size.
    pub dpi_x: f64,
    /// Effective vertical resolution from placement size.
    pub dpi_y: f64,
    /// Color space name, with indexed spaces resolved to their base.
    pub color_space: String,
    /// Whether the placement touches or exceeds the crop rectangle edge.
    pub is_full_bleed: bool,
}

impl ImageRecord {
    /// The worse (smaller) of the two axis resolutions.
    ///
    /// Non-uniform scaling makes the axes differ; the limiting axis is
    /// what matters for print quality, so the axes are never averaged.
    pub fn worse_dpi(&self) -> f64 {
        self.dpi_x.min(self.dpi_y)
    }
}

/// Effective resolution of `pixels` source pixels placed over
/// `placement_pt` points: `pixels / (placement_pt / 72)`.
///
/// Degenerate placements report 0 rather than dividing by zero.
pub fn effective_dpi(pixels: u32, placement_pt: f64) -> f64 {
    if placement_pt <= 0.0 {
        return 0.0;
    }
    pixels as f64 / (placement_pt / PT_PER_INCH)
}

/// Placement bbox of an image XObject from the CTM active at its `Do`.
///
/// Image XObjects live in a 1×1 unit square mapped to the page by the CTM.
/// The four unit-square corners are transformed and the result converted
/// from PDF bottom-left space to top-left origin using `page_height`.
pub fn placement_bbox(ctm: &Ctm, page_height: f64) -> BBox {
    let corners = [
        ctm.transform_point(Point::new(0.0, 0.0)),
        ctm.transform_point(Point::new(1.0, 0.0)),
        ctm.transform_point(Point::new(0.0, 1.0)),
        ctm.transform_point(Point::new(1.0, 1.0)),
    ];

    let x0 = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let x1 = corners
        .iter()
        .map(|p| p.x)
        .fold(f64::NEG_INFINITY, f64::max);
    let y0 = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let y1 = corners
        .iter()
        .map(|p| p.y)
        .fold(f64::NEG_INFINITY, f64::max);

    BBox::new(x0, page_height - y1, x1, page_height - y0)
}

/// Whether a placement touches or exceeds the crop rectangle on at least
/// one edge, within [`FULL_BLEED_TOLERANCE_PT`].
pub fn is_full_bleed(bbox: &BBox, crop: &BBox) -> bool {
    bbox.x0 <= crop.x0 + FULL_BLEED_TOLERANCE_PT
        || bbox.top <= crop.top + FULL_BLEED_TOLERANCE_PT
        || bbox.x1 >= crop.x1 - FULL_BLEED_TOLERANCE_PT
        || bbox.bottom >= crop.bottom - FULL_BLEED_TOLERANCE_PT
}
