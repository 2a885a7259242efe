//! Screen geometry shared by the selector, the cropper and the injector.
//!
//! A `Rect` is what the region selector hands back: two drag corners in
//! logical screen coordinates, in whatever order the user dragged them.
//! The same structure doubles as a click target through its midpoint.

use serde::{Deserialize, Serialize};

/// Two corners of a dragged rectangle, in logical screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// A degenerate rectangle standing for a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Top-left origin plus absolute extents, independent of corner order.
    pub fn normalize(&self) -> Region {
        Region {
            x: self.x0.min(self.x1),
            y: self.y0.min(self.y1),
            width: (self.x1 - self.x0).abs(),
            height: (self.y1 - self.y0).abs(),
        }
    }

    /// Zero-area (or non-finite) rectangles cannot be captured.
    pub fn has_area(&self) -> bool {
        let region = self.normalize();
        region.width.is_finite()
            && region.height.is_finite()
            && region.width > 0.0
            && region.height > 0.0
    }

    /// Click target derived from the rectangle: the midpoint of its corners.
    pub fn midpoint(&self) -> Point {
        Point {
            x: (self.x0 + self.x1) / 2.0,
            y: (self.y0 + self.y1) / 2.0,
        }
    }
}

/// A normalized rectangle in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    /// Converts logical coordinates into physical pixels for a display
    /// with the given density factor (2.0 on a typical retina panel).
    pub fn to_pixels(&self, scale_factor: f64) -> PixelRect {
        PixelRect {
            x: (self.x * scale_factor).round() as i64,
            y: (self.y * scale_factor).round() as i64,
            width: (self.width * scale_factor).round().max(0.0) as u32,
            height: (self.height * scale_factor).round().max(0.0) as u32,
        }
    }
}

/// A rectangle in physical pixels. The origin may be negative or past the
/// captured image when the selection spans another monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}
