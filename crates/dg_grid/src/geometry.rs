//! Small geometric value types shared by the grid, the generators, and the
//! connectivity graph: integer points and axis-aligned rectangles.

use serde::{Deserialize, Serialize};

/// An integer grid coordinate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (L1) distance, used for the room-connectivity graph weights.
    pub fn manhattan_distance(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn chebyshev_distance(self, other: Point) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

/// An axis-aligned integer rectangle in cell coordinates, origin at the
/// top-left corner, width/height exclusive of the far edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn centroid(self) -> Point {
        Point::new(self.x + self.width as i32 / 2, self.y + self.height as i32 / 2)
    }

    pub fn left(self) -> i32 {
        self.x
    }
    pub fn right(self) -> i32 {
        self.x + self.width as i32
    }
    pub fn top(self) -> i32 {
        self.y
    }
    pub fn bottom(self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains(self, p: Point) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }

    /// Inclusive padded rectangle: the area a sibling room must avoid.
    pub fn inflated(self, padding: i32) -> Rect {
        Rect::new(
            self.x - padding,
            self.y - padding,
            (self.width as i32 + 2 * padding).max(0) as u32,
            (self.height as i32 + 2 * padding).max(0) as u32,
        )
    }

    pub fn intersects(self, other: Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_even_rect() {
        let r = Rect::new(0, 0, 10, 6);
        assert_eq!(r.centroid(), Point::new(5, 3));
    }

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.manhattan_distance(b), 7);
        assert_eq!(b.manhattan_distance(a), 7);
    }

    #[test]
    fn inflated_padding_grows_on_both_sides() {
        let r = Rect::new(5, 5, 4, 4).inflated(2);
        assert_eq!(r, Rect::new(3, 3, 8, 8));
    }
}
