//! Vehicle registry: lane queues and discharge counters
//!
//! Vehicles are stored once by id; each (approach, lane) pair keeps an
//! ordered index of the ids queued there, keyed by a per-queue sequence
//! number that is handed out at enqueue time and only ever grows.

use std::collections::{BTreeMap, HashMap};

use super::layout::LANE_COUNT;
use super::types::{Approach, TurnState, VehicleClass, VehicleId};
use super::vehicle::SimVehicle;

/// Ordered queue of vehicle ids for one lane of one approach
#[derive(Debug, Clone, Default)]
struct LaneQueue {
    order: BTreeMap<u64, VehicleId>,
    next_seq: u64,
}

impl LaneQueue {
    fn push(&mut self, id: VehicleId) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, id);
        seq
    }

    fn remove(&mut self, seq: u64, id: VehicleId) -> bool {
        match self.order.get(&seq) {
            Some(queued) if *queued == id => {
                self.order.remove(&seq);
                true
            }
            _ => false,
        }
    }
}

/// All vehicles currently tracked by the simulation
#[derive(Debug, Clone, Default)]
pub struct VehicleRegistry {
    vehicles: HashMap<VehicleId, SimVehicle>,
    lanes: [[LaneQueue; LANE_COUNT]; 4],
    discharged: [u64; 4],
    retired: u64,
    next_id: usize,
}

impl VehicleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh vehicle id
    pub fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a vehicle to the tail of its lane queue
    ///
    /// The vehicle's `queue_seq` is overwritten with the queue's next
    /// sequence number.
    pub fn enqueue(&mut self, mut vehicle: SimVehicle) -> VehicleId {
        let id = vehicle.id;
        let lane = vehicle.lane.min(LANE_COUNT - 1);
        vehicle.lane = lane;
        vehicle.queue_seq = self.lanes[vehicle.approach.index()][lane].push(id);
        self.vehicles.insert(id, vehicle);
        id
    }

    pub fn get(&self, id: VehicleId) -> Option<&SimVehicle> {
        self.vehicles.get(&id)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut SimVehicle> {
        self.vehicles.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Vehicles matching a predicate, in no particular order
    pub fn iter_matching<'a, F>(&'a self, predicate: F) -> impl Iterator<Item = &'a SimVehicle> + 'a
    where
        F: Fn(&SimVehicle) -> bool + 'a,
    {
        self.vehicles.values().filter(move |v| predicate(*v))
    }

    /// Visit every vehicle matching a predicate
    pub fn for_each<P, F>(&self, predicate: P, mut visit: F)
    where
        P: Fn(&SimVehicle) -> bool,
        F: FnMut(&SimVehicle),
    {
        for vehicle in self.vehicles.values().filter(|v| predicate(*v)) {
            visit(vehicle);
        }
    }

    /// Apply `update` to every vehicle queued on an approach
    pub fn for_each_on_approach_mut<F>(&mut self, approach: Approach, mut update: F)
    where
        F: FnMut(&mut SimVehicle),
    {
        for lane in &self.lanes[approach.index()] {
            for id in lane.order.values() {
                if let Some(vehicle) = self.vehicles.get_mut(id) {
                    update(vehicle);
                }
            }
        }
    }

    /// Ids queued in one lane, front of the queue first
    pub fn lane_ids(&self, approach: Approach, lane: usize) -> Vec<VehicleId> {
        self.lanes[approach.index()]
            .get(lane)
            .map(|queue| queue.order.values().copied().collect())
            .unwrap_or_default()
    }

    /// Vehicles queued in one lane, front of the queue first
    pub fn lane_vehicles(&self, approach: Approach, lane: usize) -> Vec<&SimVehicle> {
        self.lane_ids(approach, lane)
            .into_iter()
            .filter_map(|id| self.vehicles.get(&id))
            .collect()
    }

    /// Whether the vehicle is still queued in the given lane
    pub fn is_queued_in(&self, id: VehicleId, approach: Approach, lane: usize) -> bool {
        match (self.vehicles.get(&id), self.lanes[approach.index()].get(lane)) {
            (Some(vehicle), Some(queue)) => {
                vehicle.approach == approach
                    && vehicle.lane == lane
                    && queue.order.get(&vehicle.queue_seq) == Some(&id)
            }
            _ => false,
        }
    }

    /// The vehicle directly ahead of `id` in its lane queue
    ///
    /// Vehicles that joined the queue by turning into it are already inside
    /// the box, so they are skipped.
    pub fn leader_of(&self, id: VehicleId) -> Option<&SimVehicle> {
        let vehicle = self.vehicles.get(&id)?;
        let queue = &self.lanes[vehicle.approach.index()][vehicle.lane];
        queue
            .order
            .range(..vehicle.queue_seq)
            .rev()
            .filter_map(|(_, leader)| self.vehicles.get(leader))
            .find(|leader| leader.turn_state != TurnState::Turned)
    }

    /// The last vehicle that entered a lane at its entry point
    pub fn tail(&self, approach: Approach, lane: usize) -> Option<&SimVehicle> {
        self.lanes[approach.index()]
            .get(lane)?
            .order
            .values()
            .rev()
            .filter_map(|id| self.vehicles.get(id))
            .find(|vehicle| vehicle.turn_state != TurnState::Turned)
    }

    /// Move a vehicle whose turn completed into the same lane of another approach
    ///
    /// Returns `false` without touching anything when the vehicle is not
    /// queued on `from` any more.
    pub fn migrate(&mut self, id: VehicleId, from: Approach, to: Approach) -> bool {
        let Some(vehicle) = self.vehicles.get_mut(&id) else {
            return false;
        };
        let lane = vehicle.lane;
        if !self.lanes[from.index()][lane].remove(vehicle.queue_seq, id) {
            return false;
        }
        vehicle.approach = to;
        vehicle.queue_seq = self.lanes[to.index()][lane].push(id);
        true
    }

    /// Record that a vehicle's leading edge passed its stop line
    ///
    /// Marks the vehicle crossed and counts it on its approach. A vehicle
    /// already marked crossed, or no longer tracked, is not counted again.
    pub fn discharge(&mut self, id: VehicleId) -> Option<Approach> {
        let vehicle = self.vehicles.get_mut(&id)?;
        if vehicle.crossed {
            return None;
        }
        vehicle.crossed = true;
        self.discharged[vehicle.approach.index()] += 1;
        Some(vehicle.approach)
    }

    pub fn discharged(&self, approach: Approach) -> u64 {
        self.discharged[approach.index()]
    }

    pub fn total_discharged(&self) -> u64 {
        self.discharged.iter().sum()
    }

    /// Drop a vehicle from active tracking once it has left the layout
    pub fn retire(&mut self, id: VehicleId) -> Option<SimVehicle> {
        let vehicle = self.vehicles.remove(&id)?;
        self.lanes[vehicle.approach.index()][vehicle.lane].remove(vehicle.queue_seq, id);
        self.retired += 1;
        Some(vehicle)
    }

    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Vehicles on an approach that have not crossed its stop line
    pub fn undischarged_count(&self, approach: Approach) -> usize {
        self.lanes[approach.index()]
            .iter()
            .map(|lane| self.undischarged_in(lane))
            .sum()
    }

    /// Vehicles in one lane that have not crossed the stop line
    pub fn lane_occupancy(&self, approach: Approach, lane: usize) -> usize {
        self.lanes[approach.index()]
            .get(lane)
            .map(|queue| self.undischarged_in(queue))
            .unwrap_or(0)
    }

    fn undischarged_in(&self, queue: &LaneQueue) -> usize {
        queue
            .order
            .values()
            .filter_map(|id| self.vehicles.get(id))
            .filter(|v| !v.crossed)
            .count()
    }

    /// Undischarged vehicles on an approach, per class
    pub fn class_counts(&self, approach: Approach) -> [usize; 8] {
        let mut counts = [0; 8];
        for lane in &self.lanes[approach.index()] {
            for vehicle in lane.order.values().filter_map(|id| self.vehicles.get(id)) {
                if !vehicle.crossed {
                    counts[vehicle.class.index()] += 1;
                }
            }
        }
        counts
    }

    /// Approaches holding at least one undischarged emergency vehicle
    pub fn emergency_approaches(&self) -> Vec<Approach> {
        Approach::ALL
            .into_iter()
            .filter(|approach| {
                let counts = self.class_counts(*approach);
                VehicleClass::EMERGENCY_PRIORITY
                    .iter()
                    .any(|class| counts[class.index()] > 0)
            })
            .collect()
    }

    /// Undischarged emergency vehicles anywhere
    pub fn emergencies_waiting(&self) -> usize {
        self.iter_matching(|v| v.class.is_emergency() && !v.crossed)
            .count()
    }
}
