//! Axis-aligned bounding boxes and the spatial predicates used by value search.

use serde::{Deserialize, Serialize};

/// Default vertical tolerance, in frame pixels, for two boxes to share a row.
///
/// Not normalised by frame size, so it behaves differently across camera
/// resolutions.
pub const DEFAULT_ROW_TOLERANCE: f32 = 10.0;

/// Axis-aligned bounding box in frame-pixel coordinates.
///
/// Deserializes from either `{"left", "top", "right", "bottom"}` or a
/// `[left, top, right, bottom]` array; edges are normalised on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BoxRepr")]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoxRepr {
    Edges {
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
    },
    Array([f32; 4]),
}

impl From<BoxRepr> for BoundingBox {
    fn from(repr: BoxRepr) -> Self {
        match repr {
            BoxRepr::Edges {
                left,
                top,
                right,
                bottom,
            } => BoundingBox::new(left, top, right, bottom),
            BoxRepr::Array([left, top, right, bottom]) => {
                BoundingBox::new(left, top, right, bottom)
            }
        }
    }
}

impl BoundingBox {
    /// Create a box, swapping edges so that `left <= right` and `top <= bottom`.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Create a box from its origin and size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Get the width of the box.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Get the height of the box.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Check if this box overlaps with another.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    /// Check if the tops of the two boxes are within `tolerance` pixels.
    pub fn same_row(&self, other: &BoundingBox, tolerance: f32) -> bool {
        (self.top - other.top).abs() <= tolerance
    }

    /// Check if this box starts at or after the right edge of `anchor`.
    pub fn starts_right_of(&self, anchor: &BoundingBox) -> bool {
        self.left >= anchor.right
    }

    /// Check if this box's top lies strictly below the top of `anchor`.
    pub fn is_below(&self, anchor: &BoundingBox) -> bool {
        self.top > anchor.top
    }
}
