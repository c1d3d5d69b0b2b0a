//! Vehicle movement logic for the intersection simulation
//!
//! A vehicle only knows about the vehicle directly ahead of it in its lane
//! queue and whether its own approach currently holds a green. Everything
//! else (queue membership, counters) is handled by the registry.

use super::layout;
use super::types::{Approach, Position, StopBound, TurnState, VehicleClass, VehicleId};

/// Result of a motion tick indicating what the caller has to record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionResult {
    Continue,                                  // Vehicle moved or held
    Discharged(Approach),                      // Leading edge crossed the stop line
    Turned { from: Approach, to: Approach },   // Turn completed, needs migration
    Exited,                                    // Crossed and left the canvas
}

/// What a vehicle sees of the vehicle ahead of it in its lane queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leader {
    pub leading_edge: f32,
    pub length: f32,
    pub crossed: bool,
}

/// Per-tick inputs to [`SimVehicle::update`]
#[derive(Debug, Clone, Copy)]
pub struct MotionContext {
    pub leader: Option<Leader>,
    /// The vehicle's approach is the current green and not in yellow
    pub has_green: bool,
    pub gap: f32,
}

/// A vehicle in the intersection simulation
#[derive(Debug, Clone)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub lane: usize,
    /// Approach whose queue currently holds the vehicle; changes after a turn
    pub approach: Approach,
    /// Approach the vehicle arrived on
    pub origin: Approach,
    pub speed: f32,
    pub position: Position,
    pub crossed: bool,
    pub will_turn: bool,
    pub turn_state: TurnState,
    pub turn_angle: f32,
    /// Last stop bound written by the motion model or the controller
    ///
    /// A hold order from the controller only lasts until the vehicle's next
    /// motion tick, which recomputes the bound from the vehicle ahead.
    pub stop: StopBound,
    /// Order within the current lane queue
    pub queue_seq: u64,
}

impl SimVehicle {
    pub fn new(
        id: VehicleId,
        class: VehicleClass,
        approach: Approach,
        lane: usize,
        speed: f32,
        position: Position,
        will_turn: bool,
    ) -> Self {
        Self {
            id,
            class,
            lane,
            approach,
            origin: approach,
            speed,
            position,
            crossed: false,
            will_turn,
            turn_state: TurnState::Straight,
            turn_angle: 0.0,
            stop: StopBound::Hold(layout::default_hold(approach)),
            queue_seq: 0,
        }
    }

    pub fn length(&self) -> f32 {
        self.class.length()
    }

    pub fn leading_edge(&self) -> f32 {
        layout::leading_edge(self.approach, &self.position, self.length())
    }

    /// Signed distance to this approach's stop line; negative once past it
    pub fn distance_to_stop_line(&self) -> f32 {
        layout::distance_to_stop_line(self.approach, self.leading_edge())
    }

    pub fn as_leader(&self) -> Leader {
        Leader {
            leading_edge: self.leading_edge(),
            length: self.length(),
            crossed: self.crossed,
        }
    }

    /// Send the vehicle back to the default hold line of its approach
    pub fn hold_at_default(&mut self) {
        self.stop = StopBound::Hold(layout::default_hold(self.approach));
    }

    /// Car-following bound: one gap behind the rear of the vehicle ahead
    fn following_bound(&self, leader: Option<Leader>, gap: f32) -> StopBound {
        match leader {
            Some(leader) if !leader.crossed => StopBound::Hold(
                leader.leading_edge - self.approach.sign() * (leader.length + gap),
            ),
            _ => StopBound::Hold(layout::default_hold(self.approach)),
        }
    }

    /// Advance the vehicle by one motion tick
    pub fn update(&mut self, ctx: &MotionContext) -> MotionResult {
        let sign = self.approach.sign();

        let may_advance = if self.crossed {
            true
        } else {
            self.stop = self.following_bound(ctx.leader, ctx.gap);

            let effective = if self.class.is_emergency() && ctx.has_green {
                StopBound::Unbounded
            } else {
                self.stop
            };

            let before_bound = match effective {
                StopBound::Hold(bound) => sign * self.leading_edge() <= sign * bound,
                StopBound::Unbounded => true,
            };
            before_bound || ctx.has_green
        };

        if may_advance {
            *self.position.along_mut(self.approach.axis()) += sign * self.speed;
        }

        // The registry marks the vehicle crossed when it records the discharge
        if !self.crossed && self.distance_to_stop_line() < 0.0 {
            return MotionResult::Discharged(self.approach);
        }

        if let Some(result) = self.advance_turn() {
            return result;
        }

        if self.crossed && layout::is_off_canvas(&self.position, self.length()) {
            return MotionResult::Exited;
        }

        MotionResult::Continue
    }

    /// Rotate a crossed turning vehicle; reports completion of the turn
    fn advance_turn(&mut self) -> Option<MotionResult> {
        if !self.will_turn || !self.crossed || self.turn_state == TurnState::Turned {
            return None;
        }

        self.turn_state = TurnState::Turning;
        self.turn_angle += layout::TURN_RATE_DEGREES;
        let (dx, dy) = layout::turn_displacement(self.approach);
        self.position.x += dx;
        self.position.y += dy;

        if self.turn_angle >= layout::TURN_COMPLETE_DEGREES {
            let from = self.approach;
            let to = from.clockwise();
            self.turn_state = TurnState::Turned;
            self.approach = to;
            return Some(MotionResult::Turned { from, to });
        }
        None
    }
}
