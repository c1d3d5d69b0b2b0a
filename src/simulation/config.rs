//! Configuration for the intersection simulation
//!
//! Every tunable lives here as a constant; [`SimConfig::default`] assembles
//! them and [`SimConfig::validate`] rejects inconsistent combinations before a
//! run starts.

use anyhow::{ensure, Result};

use super::layout::{self, LANE_COUNT};
use super::types::{Approach, VehicleClass};

/// Signal timing defaults, in seconds
pub const DEFAULT_RED: u32 = 150;
pub const DEFAULT_YELLOW: u32 = 5;
pub const DEFAULT_GREEN: u32 = 20;
pub const MINIMUM_GREEN: u32 = 10;
pub const MAXIMUM_GREEN: u32 = 60;

/// Green granted to an approach served because of an emergency vehicle
pub const EMERGENCY_GREEN_FLOOR: u32 = 10;

/// Lanes counted by the adaptive green formula
pub const LANES_PER_APPROACH: u32 = 2;

/// Red seconds remaining on the next approach when its green is computed
pub const DETECTION_LOOKAHEAD: u32 = 5;

/// Length of a run in simulated seconds
pub const SIMULATION_HORIZON: u32 = 400;

/// Motion ticks per simulated second
pub const MOTION_HZ: u32 = 30;

/// Seconds between generated arrivals
pub const ARRIVAL_INTERVAL_SECS: f32 = 0.7;

/// Seconds after start before emergency classes may be generated
pub const EMERGENCY_WARMUP_SECS: u32 = 30;

/// Minimum spacing between queued vehicles
pub const VEHICLE_GAP: f32 = 15.0;

/// Lane occupancy below which an emergency vehicle prefers a lane
pub const EMERGENCY_LANE_CAPACITY: usize = 6;

/// Chance that a vehicle entering the turning lane will turn
pub const TURN_PROBABILITY: f64 = 0.2;

/// Per-class tables, indexed by `VehicleClass::index`
pub const CLASS_SPEEDS: [f32; 8] = [4.5; 8];
pub const CLASS_DISCHARGE_SECS: [u32; 8] = [2, 3, 3, 1, 1, 1, 1, 1];
pub const WARMUP_CLASS_WEIGHTS: [u32; 8] = [25, 15, 15, 15, 30, 0, 0, 0];
pub const CLASS_WEIGHTS: [u32; 8] = [25, 15, 15, 15, 20, 3, 2, 1];

/// Approach weights for through traffic, indexed by `Approach::index`
pub const APPROACH_WEIGHTS: [u32; 4] = [40, 40, 10, 10];

/// Complete configuration of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub default_red: u32,
    pub default_yellow: u32,
    pub default_green: u32,
    pub minimum_green: u32,
    pub maximum_green: u32,
    pub emergency_green_floor: u32,
    pub lanes_per_approach: u32,
    pub detection_lookahead: u32,
    pub horizon: u32,
    pub motion_hz: u32,
    /// `None` disables the arrival generator
    pub arrival_interval: Option<f32>,
    pub emergency_warmup: u32,
    pub vehicle_gap: f32,
    pub emergency_lane_capacity: usize,
    pub turn_probability: f64,
    /// Keep emergencies off approaches that cross one already holding an emergency
    pub separate_conflicting_emergencies: bool,
    pub class_speeds: [f32; 8],
    pub class_discharge_secs: [u32; 8],
    pub warmup_class_weights: [u32; 8],
    pub class_weights: [u32; 8],
    pub approach_weights: [u32; 4],
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            default_red: DEFAULT_RED,
            default_yellow: DEFAULT_YELLOW,
            default_green: DEFAULT_GREEN,
            minimum_green: MINIMUM_GREEN,
            maximum_green: MAXIMUM_GREEN,
            emergency_green_floor: EMERGENCY_GREEN_FLOOR,
            lanes_per_approach: LANES_PER_APPROACH,
            detection_lookahead: DETECTION_LOOKAHEAD,
            horizon: SIMULATION_HORIZON,
            motion_hz: MOTION_HZ,
            arrival_interval: Some(ARRIVAL_INTERVAL_SECS),
            emergency_warmup: EMERGENCY_WARMUP_SECS,
            vehicle_gap: VEHICLE_GAP,
            emergency_lane_capacity: EMERGENCY_LANE_CAPACITY,
            turn_probability: TURN_PROBABILITY,
            separate_conflicting_emergencies: false,
            class_speeds: CLASS_SPEEDS,
            class_discharge_secs: CLASS_DISCHARGE_SECS,
            warmup_class_weights: WARMUP_CLASS_WEIGHTS,
            class_weights: CLASS_WEIGHTS,
            approach_weights: APPROACH_WEIGHTS,
        }
    }
}

impl SimConfig {
    pub fn speed(&self, class: VehicleClass) -> f32 {
        self.class_speeds[class.index()]
    }

    pub fn discharge_secs(&self, class: VehicleClass) -> u32 {
        self.class_discharge_secs[class.index()]
    }

    /// Green duration for an approach served because of an emergency
    pub fn emergency_green(&self) -> u32 {
        self.minimum_green.max(self.emergency_green_floor)
    }

    /// Check that the configuration describes a runnable intersection
    pub fn validate(&self) -> Result<()> {
        ensure!(self.default_yellow > 0, "default yellow must be positive");
        ensure!(self.minimum_green > 0, "minimum green must be positive");
        ensure!(
            self.minimum_green <= self.maximum_green,
            "minimum green ({}s) exceeds maximum green ({}s)",
            self.minimum_green,
            self.maximum_green
        );
        ensure!(
            (self.minimum_green..=self.maximum_green).contains(&self.default_green),
            "default green ({}s) outside [{}s, {}s]",
            self.default_green,
            self.minimum_green,
            self.maximum_green
        );
        ensure!(
            self.emergency_green_floor > 0,
            "emergency green floor must be positive"
        );
        ensure!(
            self.lanes_per_approach >= 1 && self.lanes_per_approach as usize <= LANE_COUNT,
            "lanes per approach must be between 1 and {}",
            LANE_COUNT
        );
        ensure!(
            self.detection_lookahead > 0 && self.detection_lookahead < self.default_red,
            "detection lookahead ({}s) must be positive and below default red ({}s)",
            self.detection_lookahead,
            self.default_red
        );
        ensure!(self.horizon > 0, "simulation horizon must be positive");
        ensure!(self.motion_hz > 0, "motion rate must be positive");
        if let Some(interval) = self.arrival_interval {
            ensure!(
                interval.is_finite() && interval > 0.0,
                "arrival interval must be a positive number of seconds"
            );
        }
        ensure!(self.vehicle_gap > 0.0, "vehicle gap must be positive");
        ensure!(
            (0.0..=1.0).contains(&self.turn_probability),
            "turn probability must lie in [0, 1]"
        );

        let hold_margin = Approach::ALL
            .iter()
            .map(|approach| layout::hold_margin(*approach))
            .fold(f32::INFINITY, f32::min);
        for class in VehicleClass::ALL {
            let speed = self.speed(class);
            ensure!(
                speed.is_finite() && speed > 0.0,
                "speed for {} must be positive",
                class
            );
            // A single step must never carry a held vehicle over the stop line
            // or into the vehicle ahead.
            ensure!(
                speed < hold_margin && speed < self.vehicle_gap,
                "speed for {} ({}) must stay below the hold margin ({}) and vehicle gap ({})",
                class,
                speed,
                hold_margin,
                self.vehicle_gap
            );
        }

        ensure!(
            self.warmup_class_weights.iter().any(|w| *w > 0),
            "warm-up class weights are all zero"
        );
        ensure!(
            self.class_weights.iter().any(|w| *w > 0),
            "class weights are all zero"
        );
        ensure!(
            self.approach_weights.iter().any(|w| *w > 0),
            "approach weights are all zero"
        );
        Ok(())
    }
}
