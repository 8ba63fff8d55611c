// src/geometry.rs

//! Plain value types for screen geometry.
//!
//! These are deliberately thin containers: the window subsystem only needs to
//! carry positions, sizes, and rectangles between the platform layer and the
//! consumer, not do vector math on them.

use serde::{Deserialize, Serialize};

/// A position in pixels. Screen-relative or client-relative depending on
/// context; the owning API documents which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// A size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Size { width, height }
    }
}

impl Default for Size {
    fn default() -> Self {
        Size {
            width: 1,
            height: 1,
        }
    }
}

/// An axis-aligned rectangle: origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn x(&self) -> i32 {
        self.origin.x
    }

    pub fn y(&self) -> i32 {
        self.origin.y
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Center of the rectangle in the same coordinate space as the origin.
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + (self.size.width / 2) as i32,
            self.origin.y + (self.size.height / 2) as i32,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.origin.x
            && p.y >= self.origin.y
            && p.x < self.origin.x + self.size.width as i32
            && p.y < self.origin.y + self.size.height as i32
    }
}

/// Clamps a client-relative position to the valid pixel range
/// `[0, width-1] x [0, height-1]`.
///
/// X reports pointer coordinates slightly outside the client area during
/// grabs and fast drags, so every mouse event position passes through here.
pub fn clamp_to_client(p: Point, size: Size) -> Point {
    let max_x = size.width.saturating_sub(1) as i32;
    let max_y = size.height.saturating_sub(1) as i32;
    Point::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
}
