//! Plane geometry shared by movement, combat detection and NPC steering.
//!
//! Positions are local to a star system. Systems themselves live on the
//! galaxy plane using the same [`Point`] type.

use serde::{Deserialize, Serialize};

/// A position on a 2D plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Move from `from` toward `to` by at most `max_step` units.
///
/// Returns the new position and whether the target was reached. On arrival
/// the returned point is exactly `to`, so repeated steps never overshoot or
/// jitter around the destination.
pub fn step_toward(from: Point, to: Point, max_step: f64) -> (Point, bool) {
    let remaining = from.distance_to(to);
    if remaining <= max_step || remaining <= f64::EPSILON {
        return (to, true);
    }
    if max_step <= 0.0 {
        return (from, false);
    }
    let ux = (to.x - from.x) / remaining;
    let uy = (to.y - from.y) / remaining;
    (from.offset(ux * max_step, uy * max_step), false)
}

/// Point at `radius` units from `origin` in the direction of `toward`.
///
/// Falls back to `origin` when the two points coincide.
pub fn point_along(origin: Point, toward: Point, radius: f64) -> Point {
    let d = origin.distance_to(toward);
    if d <= f64::EPSILON {
        return origin;
    }
    origin.offset((toward.x - origin.x) / d * radius, (toward.y - origin.y) / d * radius)
}
