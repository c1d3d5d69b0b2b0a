//! Core types for the intersection simulation
//!
//! Approaches, vehicle classes and the small value types shared by the
//! registry, the motion model and the signal controller.

use std::fmt;

/// A unique identifier for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

/// One of the four approaches entering the intersection.
///
/// The discriminant is the approach index used for tie-breaking and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Approach {
    /// East-bound traffic, x increasing
    Right = 0,
    /// South-bound traffic, y increasing
    Down = 1,
    /// West-bound traffic, x decreasing
    Left = 2,
    /// North-bound traffic, y decreasing
    Up = 3,
}

impl Approach {
    pub const ALL: [Approach; 4] = [Approach::Right, Approach::Down, Approach::Left, Approach::Up];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Approach> {
        Self::ALL.get(index).copied()
    }

    /// The approach a vehicle joins after turning through the intersection
    pub fn clockwise(self) -> Approach {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn axis(self) -> Axis {
        match self {
            Approach::Right | Approach::Left => Axis::X,
            Approach::Down | Approach::Up => Axis::Y,
        }
    }

    /// +1 for approaches travelling towards increasing coordinates, -1 otherwise
    pub fn sign(self) -> f32 {
        match self {
            Approach::Right | Approach::Down => 1.0,
            Approach::Left | Approach::Up => -1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Approach::Right => "right",
            Approach::Down => "down",
            Approach::Left => "left",
            Approach::Up => "up",
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Travel axis of an approach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Closed set of vehicle classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VehicleClass {
    Car,
    Bus,
    Truck,
    Rickshaw,
    Bike,
    Ambulance,
    Firetruck,
    Vip,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 8] = [
        VehicleClass::Car,
        VehicleClass::Bus,
        VehicleClass::Truck,
        VehicleClass::Rickshaw,
        VehicleClass::Bike,
        VehicleClass::Ambulance,
        VehicleClass::Firetruck,
        VehicleClass::Vip,
    ];

    /// Emergency classes, highest preemption priority first
    pub const EMERGENCY_PRIORITY: [VehicleClass; 3] = [
        VehicleClass::Ambulance,
        VehicleClass::Firetruck,
        VehicleClass::Vip,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_emergency(self) -> bool {
        matches!(
            self,
            VehicleClass::Ambulance | VehicleClass::Firetruck | VehicleClass::Vip
        )
    }

    /// Footprint as (length along travel axis, width across it)
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            VehicleClass::Car | VehicleClass::Rickshaw => (40.0, 20.0),
            VehicleClass::Bus | VehicleClass::Truck => (80.0, 40.0),
            VehicleClass::Bike => (24.0, 12.0),
            VehicleClass::Ambulance | VehicleClass::Firetruck | VehicleClass::Vip => (48.0, 24.0),
        }
    }

    pub fn length(self) -> f32 {
        self.dimensions().0
    }

    pub fn name(self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Bus => "bus",
            VehicleClass::Truck => "truck",
            VehicleClass::Rickshaw => "rickshaw",
            VehicleClass::Bike => "bike",
            VehicleClass::Ambulance => "ambulance",
            VehicleClass::Firetruck => "firetruck",
            VehicleClass::Vip => "vip",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Displayed state of one approach's signal head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            LightState::Red => "red",
            LightState::Yellow => "yellow",
            LightState::Green => "green",
        })
    }
}

/// Turning sub-state of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Straight,
    Turning,
    Turned,
}

/// A 2D position in layout coordinates (top-left of the vehicle footprint)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn along(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub fn along_mut(&mut self, axis: Axis) -> &mut f32 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        }
    }
}

/// Where a vehicle must stop this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopBound {
    /// Leading-edge coordinate the vehicle may not pass while gated
    Hold(f32),
    /// Never gated (emergency vehicle on its own green)
    Unbounded,
}
