//! Planar geometry primitives shared by every simulation system.

use serde::{Deserialize, Serialize};

/// Location in world space measured in screen units (y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Exact Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Returns the point translated by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle anchored at its upper-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl Rect {
    /// Creates a rectangle from its upper-left corner and dimensions.
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Creates a rectangle of the given size centred on `center`.
    #[must_use]
    pub fn centered_at(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    /// Square extending `radius` units from `center` along both axes.
    #[must_use]
    pub fn around(center: Point, radius: f64) -> Self {
        Self::centered_at(center, radius * 2.0, radius * 2.0)
    }

    /// Left edge.
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.left
    }

    /// Top edge.
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.top
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Reports whether two rectangles overlap.
    ///
    /// Rectangles whose edges touch are considered intersecting. A gap of any
    /// positive width between them is not.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.left() > self.right()
            || other.right() < self.left()
            || other.top() > self.bottom()
            || other.bottom() < self.top())
    }

    /// Reports whether the point lies inside the rectangle.
    ///
    /// The left and top edges are inclusive, the right and bottom exclusive.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }
}
