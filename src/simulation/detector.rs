//! Emergency vehicle detection
//!
//! Pure queries over the registry; safe to call as often as the controller
//! likes.

use ordered_float::OrderedFloat;

use super::registry::VehicleRegistry;
use super::types::{Approach, VehicleClass, VehicleId};

/// The emergency vehicle that currently wins preemption
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub approach: Approach,
    pub class: VehicleClass,
    pub vehicle: VehicleId,
    /// Signed distance to the stop line, negative once past it
    pub distance: f32,
}

/// Nearest undischarged vehicle of one emergency class
///
/// Equal distances are broken by approach index so repeated scans agree.
pub fn nearest_of_class(registry: &VehicleRegistry, class: VehicleClass) -> Option<Detection> {
    registry
        .iter_matching(move |v| v.class == class && !v.crossed)
        .min_by_key(|v| (OrderedFloat(v.distance_to_stop_line()), v.approach, v.id))
        .map(|v| Detection {
            approach: v.approach,
            class: v.class,
            vehicle: v.id,
            distance: v.distance_to_stop_line(),
        })
}

/// Highest-priority emergency: the nearest ambulance, else the nearest
/// firetruck, else the nearest VIP escort
pub fn detect(registry: &VehicleRegistry) -> Option<Detection> {
    VehicleClass::EMERGENCY_PRIORITY
        .iter()
        .find_map(|class| nearest_of_class(registry, *class))
}

/// Approach that must be served for an emergency, if any
pub fn detect_emergency(registry: &VehicleRegistry) -> Option<Approach> {
    detect(registry).map(|detection| detection.approach)
}
