//! Integer geometry
//!
//! Whole-pixel points and rectangles. Points are `glam::IVec2`; rectangles
//! are half-open on the right and bottom, so `x2()`/`y2()` are one past the
//! last contained pixel.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in whole pixels, half-open on `x2`/`y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Build from two corners; the corners may be given in any order.
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let (x, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let (y, y2) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        Self {
            x,
            y,
            w: x2 - x,
            h: y2 - y,
        }
    }

    /// One past the rightmost contained pixel.
    pub const fn x2(&self) -> i32 {
        self.x + self.w
    }

    /// One past the bottommost contained pixel.
    pub const fn y2(&self) -> i32 {
        self.y + self.h
    }

    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Pixel midpoint, truncating toward the top-left.
    pub const fn midpoint(&self) -> IVec2 {
        IVec2::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    pub const fn contains(&self, p: IVec2) -> bool {
        p.x >= self.x && p.x < self.x2() && p.y >= self.y && p.y < self.y2()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.x2()
            && other.x < self.x2()
            && self.y < other.y2()
            && other.y < self.y2()
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(Rect {
            x,
            y,
            w: self.x2().min(other.x2()) - x,
            h: self.y2().min(other.y2()) - y,
        })
    }

    pub const fn translated(&self, by: IVec2) -> Rect {
        Rect {
            x: self.x + by.x,
            y: self.y + by.y,
            w: self.w,
            h: self.h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_contains() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(IVec2::new(0, 0)));
        assert!(r.contains(IVec2::new(9, 9)));
        assert!(!r.contains(IVec2::new(10, 9)));
        assert!(!r.contains(IVec2::new(-1, 0)));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Rect::new(5, 5, 5, 5)));

        let c = Rect::new(10, 0, 5, 5);
        assert!(!a.intersects(&c));
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_empty_rect_never_intersects() {
        let empty = Rect::new(3, 3, 0, 5);
        let full = Rect::new(0, 0, 10, 10);
        assert!(!empty.intersects(&full));
        assert!(!full.intersects(&empty));
    }

    #[test]
    fn test_from_corners_normalizes() {
        assert_eq!(Rect::from_corners(5, 7, 1, 2), Rect::new(1, 2, 4, 5));
    }
}
