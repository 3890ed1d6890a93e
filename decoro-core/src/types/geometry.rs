//! Geometric primitives like points, sizes, and rectangles.
//!
//! Only the small subset needed by shadow geometry and clip regions is
//! provided here.

use num_traits::Num;
use serde::{Deserialize, Serialize};

// --- Generic Point<T> ---

/// Represents a 2D point with generic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Num + Copy",
    deserialize = "T: Deserialize<'de> + Num + Copy"
))]
pub struct Point<T: Num + Copy> {
    /// The x-coordinate of the point.
    pub x: T,
    /// The y-coordinate of the point.
    pub y: T,
}

impl<T: Num + Copy + Eq> Eq for Point<T> {}
impl<T: Num + Copy + std::hash::Hash> std::hash::Hash for Point<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
    }
}

impl<T: Num + Copy> Point<T> {
    /// Creates a new point with the given coordinates.
    pub const fn new(x: T, y: T) -> Self {
        Point { x, y }
    }
}

// --- Generic Size<T> ---

/// Represents a 2D size with generic dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Num + Copy",
    deserialize = "T: Deserialize<'de> + Num + Copy"
))]
pub struct Size<T: Num + Copy> {
    /// The width component.
    pub width: T,
    /// The height component.
    pub height: T,
}

impl<T: Num + Copy + Eq> Eq for Size<T> {}
impl<T: Num + Copy + std::hash::Hash> std::hash::Hash for Size<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        self.height.hash(state);
    }
}

impl<T: Num + Copy> Size<T> {
    /// Creates a new size with the given dimensions.
    pub const fn new(width: T, height: T) -> Self {
        Size { width, height }
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool
    where
        T: PartialEq,
    {
        self.width == T::zero() || self.height == T::zero()
    }
}

// --- Generic Rect<T> ---

/// Represents an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Num + Copy",
    deserialize = "T: Deserialize<'de> + Num + Copy"
))]
pub struct Rect<T: Num + Copy> {
    /// The x-coordinate of the top-left corner.
    pub x: T,
    /// The y-coordinate of the top-left corner.
    pub y: T,
    /// The width of the rectangle.
    pub width: T,
    /// The height of the rectangle.
    pub height: T,
}

impl<T: Num + Copy + Eq> Eq for Rect<T> {}
impl<T: Num + Copy + std::hash::Hash> std::hash::Hash for Rect<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
        self.width.hash(state);
        self.height.hash(state);
    }
}

impl<T: Num + Copy> Rect<T> {
    /// Creates a new rectangle from its top-left corner and dimensions.
    pub const fn new(x: T, y: T, width: T, height: T) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// The top-left corner of the rectangle.
    pub fn origin(&self) -> Point<T> {
        Point::new(self.x, self.y)
    }

    /// The dimensions of the rectangle.
    pub fn size(&self) -> Size<T> {
        Size::new(self.width, self.height)
    }

    /// Returns `true` if either dimension is zero.
    pub fn is_empty(&self) -> bool
    where
        T: PartialEq,
    {
        self.size().is_empty()
    }
}

impl<T: Num + Copy + PartialOrd + std::ops::Add<Output = T>> Rect<T> {
    /// Returns `true` if the given point lies within the rectangle.
    pub fn contains(&self, point: &Point<T>) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}
