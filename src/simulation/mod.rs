//! Four-way intersection simulation
//!
//! This module contains the signal controller, the vehicle motion model, the
//! emergency detector and the arrival generator, plus the world that wires
//! them together. It runs headless, either in lockstep or on real-time
//! threads.

mod arrivals;
mod clock;
mod config;
mod controller;
mod detector;
mod layout;
mod registry;
mod runtime;
mod snapshot;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use arrivals::{conflict_graph, Arrival, ArrivalGenerator};
#[allow(unused_imports)]
pub use clock::SimClock;
#[allow(unused_imports)]
pub use config::{
    SimConfig, APPROACH_WEIGHTS, ARRIVAL_INTERVAL_SECS, CLASS_DISCHARGE_SECS, CLASS_SPEEDS,
    CLASS_WEIGHTS, DEFAULT_GREEN, DEFAULT_RED, DEFAULT_YELLOW, DETECTION_LOOKAHEAD,
    EMERGENCY_GREEN_FLOOR, EMERGENCY_LANE_CAPACITY, EMERGENCY_WARMUP_SECS, LANES_PER_APPROACH,
    MAXIMUM_GREEN, MINIMUM_GREEN, MOTION_HZ, SIMULATION_HORIZON, TURN_PROBABILITY, VEHICLE_GAP,
    WARMUP_CLASS_WEIGHTS,
};
#[allow(unused_imports)]
pub use controller::{
    adaptive_green, adaptive_green_for_counts, select_next, ControlEvent, SignalController,
    SignalTimers,
};
#[allow(unused_imports)]
pub use detector::{detect, detect_emergency, nearest_of_class, Detection};
#[allow(unused_imports)]
pub use layout::{
    default_hold, entry_position, stop_line, BIKE_LANE, CANVAS_HEIGHT, CANVAS_WIDTH, LANE_COUNT,
    TURN_LANE,
};
#[allow(unused_imports)]
pub use registry::VehicleRegistry;
#[allow(unused_imports)]
pub use runtime::{RunningSimulation, RuntimeOptions, SharedWorld};
#[allow(unused_imports)]
pub use snapshot::{SignalSnapshot, VehicleSnapshot, WorldSnapshot};
#[allow(unused_imports)]
pub use types::{
    Approach, Axis, LightState, Position, StopBound, TurnState, VehicleClass, VehicleId,
};
#[allow(unused_imports)]
pub use vehicle::{Leader, MotionContext, MotionResult, SimVehicle};
pub use world::{MotionTickSummary, RunReport, SimWorld};
