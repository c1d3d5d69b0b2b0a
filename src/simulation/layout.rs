//! Fixed geometry of the intersection
//!
//! Coordinates are in layout units on a 1400 x 800 canvas with the origin at
//! the top-left corner. A vehicle's position is the top-left of its footprint,
//! so its leading edge depends on the direction of travel.

use super::types::{Approach, Position};

pub const CANVAS_WIDTH: f32 = 1400.0;
pub const CANVAS_HEIGHT: f32 = 800.0;

/// Number of physical lanes on every approach
pub const LANE_COUNT: usize = 3;

/// Lane reserved for bikes
pub const BIKE_LANE: usize = 0;

/// Only vehicles in this lane may be flagged to turn
pub const TURN_LANE: usize = 2;

/// Degrees of rotation applied per motion tick while turning
pub const TURN_RATE_DEGREES: f32 = 3.0;

/// Rotation at which a turn completes
pub const TURN_COMPLETE_DEGREES: f32 = 90.0;

/// Diagonal displacement per axis per motion tick while turning
pub const TURN_STEP: f32 = 2.0;

/// Coordinate of the stop line along the approach axis
pub fn stop_line(approach: Approach) -> f32 {
    match approach {
        Approach::Right => 590.0,
        Approach::Down => 330.0,
        Approach::Left => 800.0,
        Approach::Up => 535.0,
    }
}

/// Leading-edge coordinate where the head of a held queue waits
pub fn default_hold(approach: Approach) -> f32 {
    match approach {
        Approach::Right => 580.0,
        Approach::Down => 320.0,
        Approach::Left => 810.0,
        Approach::Up => 545.0,
    }
}

/// Distance between the default hold line and the stop line
pub fn hold_margin(approach: Approach) -> f32 {
    (stop_line(approach) - default_hold(approach)).abs()
}

/// Top-left position at which a vehicle enters the given lane
pub fn entry_position(approach: Approach, lane: usize) -> Position {
    let lane = lane.min(LANE_COUNT - 1);
    match approach {
        Approach::Right => Position::new(0.0, [348.0, 370.0, 398.0][lane]),
        Approach::Down => Position::new([755.0, 727.0, 697.0][lane], 0.0),
        Approach::Left => Position::new(CANVAS_WIDTH, [498.0, 466.0, 436.0][lane]),
        Approach::Up => Position::new([602.0, 627.0, 657.0][lane], CANVAS_HEIGHT),
    }
}

/// Per-tick (dx, dy) applied to a vehicle turning off the given approach
pub fn turn_displacement(approach: Approach) -> (f32, f32) {
    match approach {
        Approach::Right => (TURN_STEP, TURN_STEP),
        Approach::Down => (-TURN_STEP, TURN_STEP),
        Approach::Left => (-TURN_STEP, -TURN_STEP),
        Approach::Up => (TURN_STEP, -TURN_STEP),
    }
}

/// Leading edge of a footprint of `length` at `position` travelling on `approach`
pub fn leading_edge(approach: Approach, position: &Position, length: f32) -> f32 {
    let origin = position.along(approach.axis());
    if approach.sign() > 0.0 {
        origin + length
    } else {
        origin
    }
}

/// Signed distance from the leading edge to the stop line; negative once past it
pub fn distance_to_stop_line(approach: Approach, leading_edge: f32) -> f32 {
    approach.sign() * (stop_line(approach) - leading_edge)
}

/// Whether a square of side `extent` at `position` lies completely outside the canvas
pub fn is_off_canvas(position: &Position, extent: f32) -> bool {
    position.x + extent < 0.0
        || position.x > CANVAS_WIDTH
        || position.y + extent < 0.0
        || position.y > CANVAS_HEIGHT
}
