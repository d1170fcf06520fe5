//! Geometry primitives
//!
//! Integer 2D vectors, rectangles and the 8-way compass used throughout the
//! map, FOV and generation code.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// The 8 compass directions, ordered North then clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

/// Unit offsets per direction, same order as the enum. North is -y.
pub const DIRECTION_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Unit `(dx, dy)` offset for this direction.
    pub fn offset(&self) -> (i32, i32) {
        DIRECTION_OFFSETS[*self as usize]
    }
}

/// Integer-valued 2D point or offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Vec2) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean length.
    pub fn mag(&self) -> f64 {
        self.distance_to(Vec2::ZERO)
    }

    /// Squared length, for boundary comparisons without the sqrt.
    pub fn mag_squared(&self) -> i64 {
        let x = self.x as i64;
        let y = self.y as i64;
        x * x + y * y
    }

    /// Compass direction of this vector's sign pattern.
    ///
    /// `(sign(x), sign(y))` is matched against the direction offset table;
    /// every sign combination except the zero vector maps to exactly one of
    /// the 8 directions, so only `Vec2::ZERO` returns `None`.
    pub fn direction(&self) -> Option<Direction> {
        let pattern = (self.x.signum(), self.y.signum());
        DIRECTION_OFFSETS
            .iter()
            .position(|&off| off == pattern)
            .map(|i| Direction::ALL[i])
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle with half-open extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the rectangles overlap. Edges that merely touch do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// True if the point lies inside the half-open extents.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_ops() {
        let a = Vec2::new(3, -1);
        let b = Vec2::new(-1, 4);
        assert_eq!(a + b, Vec2::new(2, 3));
        assert_eq!(a - b, Vec2::new(4, -5));
        assert_eq!(Vec2::new(3, 4).mag(), 5.0);
        assert_eq!(Vec2::new(0, 0).distance_to(Vec2::new(0, 7)), 7.0);
    }

    #[test]
    fn test_direction_sign_patterns() {
        assert_eq!(Vec2::new(0, -5).direction(), Some(Direction::North));
        assert_eq!(Vec2::new(9, -2).direction(), Some(Direction::NorthEast));
        assert_eq!(Vec2::new(4, 0).direction(), Some(Direction::East));
        assert_eq!(Vec2::new(1, 1).direction(), Some(Direction::SouthEast));
        assert_eq!(Vec2::new(0, 3).direction(), Some(Direction::South));
        assert_eq!(Vec2::new(-2, 8).direction(), Some(Direction::SouthWest));
        assert_eq!(Vec2::new(-6, 0).direction(), Some(Direction::West));
        assert_eq!(Vec2::new(-1, -1).direction(), Some(Direction::NorthWest));
        assert_eq!(Vec2::ZERO.direction(), None);
    }

    #[test]
    fn test_rect_touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(!a.intersects(&Rect::new(10, 0, 5, 5)));
        assert!(!a.intersects(&Rect::new(0, 10, 5, 5)));
        assert!(!a.intersects(&Rect::new(-5, 0, 5, 10)));
        assert!(a.intersects(&Rect::new(9, 9, 5, 5)));
        assert!(a.intersects(&Rect::new(-4, -4, 5, 5)));
    }

    #[test]
    fn test_rect_contains_half_open() {
        let r = Rect::new(2, 2, 4, 4);
        assert!(r.contains(Vec2::new(2, 2)));
        assert!(r.contains(Vec2::new(5, 5)));
        assert!(!r.contains(Vec2::new(6, 5)));
        assert!(!r.contains(Vec2::new(1, 3)));
    }
}
