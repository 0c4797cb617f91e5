//! Integer Axis-Aligned Rectangles
//!
//! Hit regions in logical playfield units. Integer-only so that collision
//! results are identical on every platform.

use serde::{Serialize, Deserialize};

/// Axis-aligned rectangle with `left <= right` and `top <= bottom`.
///
/// Y grows downward (screen convention): obstacles fall toward larger `top`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge (inclusive)
    pub left: i32,
    /// Top edge (inclusive)
    pub top: i32,
    /// Right edge (exclusive)
    pub right: i32,
    /// Bottom edge (exclusive)
    pub bottom: i32,
}

impl Rect {
    /// Create a rectangle from its edges.
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Create a rectangle centred horizontally on `center_x`.
    #[inline]
    pub const fn centered_x(center_x: i32, top: i32, width: i32, height: i32) -> Self {
        let left = center_x - width / 2;
        Self::new(left, top, left + width, top + height)
    }

    /// Width (never negative).
    #[inline]
    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    /// Height (never negative).
    #[inline]
    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    /// True if the rectangle has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Shrink by `margin` on every side.
    ///
    /// A margin larger than half the size collapses the rectangle to an empty
    /// one at its centre, which never intersects anything.
    pub fn inset(self, margin: i32) -> Self {
        let cx = (self.left + self.right) / 2;
        let cy = (self.top + self.bottom) / 2;
        let left = (self.left + margin).min(cx);
        let top = (self.top + margin).min(cy);
        let right = (self.right - margin).max(left);
        let bottom = (self.bottom - margin).max(top);
        Self::new(left, top, right, bottom)
    }

    /// Standard overlap test: true iff neither rectangle lies entirely to
    /// one side of the other on either axis. Touching edges do not overlap,
    /// and an empty rectangle overlaps nothing.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}
