//! Travel distances and arrival times for ship movement orders.

use crate::geometry::Point;

/// Every wormhole jump counts as this many units regardless of geometry.
pub const WORMHOLE_TRAVEL_DISTANCE: f64 = 300.0;

/// Distance for a move order. Jumps use the fixed wormhole distance;
/// in-system moves are Euclidean.
pub fn travel_distance(crosses_wormhole: bool, from: Point, to: Point) -> f64 {
    if crosses_wormhole {
        WORMHOLE_TRAVEL_DISTANCE
    } else {
        from.distance_to(to)
    }
}

/// Seconds needed to cover `distance` at `speed`. `None` if the ship
/// cannot move.
pub fn travel_seconds(distance: f64, speed: f64) -> Option<f64> {
    if speed <= 0.0 || !speed.is_finite() {
        return None;
    }
    Some(distance / speed)
}
