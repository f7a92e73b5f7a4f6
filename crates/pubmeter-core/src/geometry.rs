//! Geometry primitives with top-left origin coordinate system.
//!
//! All cross-component coordinates are expressed in points with the origin
//! at the top-left of the page. Conversion from PDF native bottom-left
//! space happens only at the document loader boundary.

use serde::{Deserialize, Serialize};

/// Points per inch in PDF user space.
pub const PT_PER_INCH: f64 = 72.0;

/// Millimeters per point (25.4 mm per inch / 72 pt per inch).
pub const MM_PER_PT: f64 = 25.4 / 72.0;

/// Convert a length in points to millimeters.
pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_PT
}

/// A 2D point in top-left origin coordinates (points).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding box with top-left origin coordinate system.
///
/// - `x0`: left edge
/// - `top`: top edge (distance from top of page)
/// - `x1`: right edge
/// - `bottom`: bottom edge (distance from top of page)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BBox {
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Area of the bounding box. Degenerate boxes report 0.
    pub fn area(&self) -> f64 {
        (self.width().max(0.0)) * (self.height().max(0.0))
    }

    /// Compute the union of two bounding boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Area of the intersection with another box, 0 if they do not overlap.
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.bottom.min(other.bottom) - self.top.max(other.top);
        if w > 0.0 && h > 0.0 { w * h } else { 0.0 }
    }

    /// Whether the point lies inside this box (edges inclusive).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.top && p.y <= self.bottom
    }
}

/// Current transformation matrix `[a, b, c, d, e, f]`.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)` in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ctm(pub [f64; 6]);

impl Ctm {
    /// The identity transform.
    pub const IDENTITY: Ctm = Ctm([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    /// Transform a point through this matrix.
    pub fn transform_point(&self, p: Point) -> Point {
        let [a, b, c, d, e, f] = self.0;
        Point::new(a * p.x + c * p.y + e, b * p.x + d * p.y + f)
    }

    /// Concatenate another matrix: `self = other × self` in PDF `cm` order.
    pub fn concat(&self, m: &Ctm) -> Ctm {
        let [a1, b1, c1, d1, e1, f1] = m.0;
        let [a2, b2, c2, d2, e2, f2] = self.0;
        Ctm([
            a1 * a2 + b1 * c2,
            a1 * b2 + b1 * d2,
            c1 * a2 + d1 * c2,
            c1 * b2 + d1 * d2,
            e1 * a2 + f1 * c2 + e2,
            e1 * b2 + f1 * d2 + f2,
        ])
    }
}

impl Default for Ctm {
    fn default() -> Self {
        Ctm::IDENTITY
    }
}
