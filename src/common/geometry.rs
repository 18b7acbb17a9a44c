use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

/// Integer screen coordinate, origin at the top-left of the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Self {
        Self::new(self.x + by.x, self.y + by.y)
    }

    /// Scale a reference-resolution offset to the capture resolution.
    pub fn scale(self, scale_x: f32, scale_y: f32) -> Self {
        Self::new(
            (self.x as f32 * scale_x) as i32,
            (self.y as f32 * scale_y) as i32,
        )
    }

    pub fn sqr_distance(self, other: Point) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx * dx + dy * dy
    }
}

/// Axis aligned screen rectangle. `right()`/`bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners, the way bounding boxes are built from name lines.
    pub fn from_corners(min: Point, max: Point) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn min(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn bottom_centre(&self) -> Point {
        Point::new(self.x + self.width / 2, self.bottom())
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Touching edges count as intersecting.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && other.left() <= self.right()
            && self.top() <= other.bottom()
            && other.top() <= self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let min = Point::new(self.x.min(other.x), self.y.min(other.y));
        let max = Point::new(
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        );
        Rect::from_corners(min, max)
    }
}

/// Planar helpers for world positions. Height (z) never participates in distances.
pub trait WorldVecExt {
    fn as_vec2(&self) -> Vec2;
    fn distance_xy(&self, other: Vec3) -> f32;
}

impl WorldVecExt for Vec3 {
    fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn distance_xy(&self, other: Vec3) -> f32 {
        self.as_vec2().distance(other.as_vec2())
    }
}

/// Closest point to `p` on the segment `a`..`b`.
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    let ab = b - a;
    let magnitude = ab.length_squared();
    if magnitude <= f32::EPSILON {
        return a;
    }

    let t = (p - a).dot(ab) / magnitude;
    if t < 0.0 {
        a
    } else if t > 1.0 {
        b
    } else {
        a + ab * t
    }
}

/// Bearing from `from` to `to` in radians within `[0, TAU)`.
///
/// Zero points along +x and the angle grows towards +y, so a heading `h`
/// moves the player along `(cos h, sin h)`.
pub fn heading_to(from: Vec3, to: Vec3) -> f32 {
    (to.y - from.y).atan2(to.x - from.x).rem_euclid(TAU)
}

/// Absolute shortest-turn difference between two headings, within `[0, PI]`.
pub fn heading_difference(current: f32, target: f32) -> f32 {
    let forward = (target - current).rem_euclid(TAU);
    forward.min(TAU - forward)
}

/// Total planar length of a polyline.
pub fn route_length_xy(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance_xy(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn union_covers_both_rectangles() {
        let a = Rect::new(0, 0, 10, 5);
        let b = Rect::new(20, 8, 5, 5);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0, 0, 25, 13));
    }

    #[test]
    fn touching_rectangles_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        let c = Rect::new(11, 0, 10, 10);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn closest_point_clamps_to_segment() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(5.0, 3.0)), Vec2::new(5.0, 0.0));
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(-4.0, 1.0)), a);
        assert_eq!(closest_point_on_segment(a, b, Vec2::new(14.0, 1.0)), b);
        assert_eq!(closest_point_on_segment(a, a, Vec2::new(3.0, 3.0)), a);
    }

    #[test]
    fn heading_difference_takes_the_short_way_round() {
        let diff = heading_difference(0.1, TAU - 0.1);
        assert!((diff - 0.2).abs() < 1e-5);
        assert!((heading_difference(0.0, PI) - PI).abs() < 1e-5);
    }

    #[test]
    fn heading_points_along_positive_x_at_zero() {
        let h = heading_to(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert!(h.abs() < 1e-6);
        let h = heading_to(Vec3::ZERO, Vec3::new(0.0, -10.0, 0.0));
        assert!((h - 1.5 * PI).abs() < 1e-5);
    }

    #[test]
    fn distances_ignore_height() {
        let a = Vec3::new(0.0, 0.0, 100.0);
        let b = Vec3::new(3.0, 4.0, -50.0);
        assert!((a.distance_xy(b) - 5.0).abs() < 1e-6);
        assert!((route_length_xy(&[a, b, Vec3::new(3.0, 10.0, 0.0)]) - 11.0).abs() < 1e-5);
    }
}
