//! Read-only view of the world for dashboards and tests

use super::types::{Approach, LightState, Position, TurnState, VehicleClass, VehicleId};

/// State of one signal head
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSnapshot {
    pub approach: Approach,
    pub state: LightState,
    /// Seconds left on the displayed state
    pub countdown: u32,
    pub discharged: u64,
    pub total_green_time: u32,
}

/// Drawable state of one vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub approach: Approach,
    pub lane: usize,
    pub position: Position,
    pub crossed: bool,
    pub turn_state: TurnState,
    pub turn_angle: f32,
}

/// Consistent copy of the world taken under a single lock
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub elapsed: u32,
    pub horizon: u32,
    pub current_green: Approach,
    pub in_yellow: bool,
    pub signals: Vec<SignalSnapshot>,
    /// Ordered by vehicle id
    pub vehicles: Vec<VehicleSnapshot>,
    pub emergencies_waiting: usize,
    pub total_discharged: u64,
}

impl WorldSnapshot {
    pub fn signal(&self, approach: Approach) -> Option<&SignalSnapshot> {
        self.signals.iter().find(|s| s.approach == approach)
    }

    /// Approaches whose light is currently green
    pub fn green_approaches(&self) -> Vec<Approach> {
        self.signals
            .iter()
            .filter(|s| s.state == LightState::Green)
            .map(|s| s.approach)
            .collect()
    }
}
