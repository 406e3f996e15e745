use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned rectangle in device pixels.
///
/// The origin may be negative: bleed rectangles extend past a slot that sits
/// on the page edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// A rectangular region on a sheet reserved for one card image.
pub type Slot = PixelRect;

impl PixelRect {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when the two rectangles share any area. Touching edges do not count.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grow the rectangle by `by` pixels on every side.
    pub fn inflate(&self, by: u32) -> PixelRect {
        let by_i = i64::from(by);
        PixelRect {
            x: self.x - by_i,
            y: self.y - by_i,
            width: self.width.saturating_add(by.saturating_mul(2)),
            height: self.height.saturating_add(by.saturating_mul(2)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The whole page as a rectangle anchored at the origin.
    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }
}

/// Page orientation of a US Letter sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    /// Physical page size in inches as `(width, height)`.
    pub fn page_inches(self) -> (f64, f64) {
        match self {
            Orientation::Portrait => (8.5, 11.0),
            Orientation::Landscape => (11.0, 8.5),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Portrait => f.write_str("portrait"),
            Orientation::Landscape => f.write_str("landscape"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_rects_do_not_intersect() {
        let a = PixelRect::new(0, 0, 750, 1050);
        let b = PixelRect::new(750, 0, 750, 1050);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_overlapping_rects_intersect() {
        let a = PixelRect::new(0, 0, 750, 1050);
        let b = PixelRect::new(749, 1049, 10, 10);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_inflate_extends_past_origin() {
        let slot = PixelRect::new(0, 10, 100, 100);
        let bleed = slot.inflate(6);
        assert_eq!(bleed, PixelRect::new(-6, 4, 112, 112));
        assert!(bleed.contains_rect(&slot));
    }

    #[test]
    fn test_page_inches_swap_with_orientation() {
        assert_eq!(Orientation::Portrait.page_inches(), (8.5, 11.0));
        assert_eq!(Orientation::Landscape.page_inches(), (11.0, 8.5));
        assert_eq!(Orientation::Landscape.to_string(), "landscape");
    }
}
