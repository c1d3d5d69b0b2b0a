//! Stochastic vehicle arrivals
//!
//! Draws the class, approach, lane and turn intent of the next vehicle. The
//! caller decides when arrivals happen and places the vehicle.

use anyhow::{anyhow, Result};
use petgraph::graphmap::UnGraphMap;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;

use super::config::SimConfig;
use super::layout::{BIKE_LANE, LANE_COUNT, TURN_LANE};
use super::registry::VehicleRegistry;
use super::types::{Approach, VehicleClass};

/// The next vehicle to enter the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    pub class: VehicleClass,
    pub approach: Approach,
    pub lane: usize,
    pub will_turn: bool,
}

/// Pairs of approaches whose movements cross inside the intersection
pub fn conflict_graph() -> UnGraphMap<Approach, ()> {
    UnGraphMap::from_edges([
        (Approach::Right, Approach::Down),
        (Approach::Right, Approach::Up),
        (Approach::Left, Approach::Down),
        (Approach::Left, Approach::Up),
    ])
}

/// Random source of arrivals
pub struct ArrivalGenerator {
    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
    warmup_classes: WeightedIndex<u32>,
    classes: WeightedIndex<u32>,
    approaches: WeightedIndex<u32>,
    conflicts: UnGraphMap<Approach, ()>,
    emergency_warmup: u32,
    emergency_lane_capacity: usize,
    turn_probability: f64,
    separate_conflicting_emergencies: bool,
}

impl ArrivalGenerator {
    pub fn new(config: &SimConfig) -> Result<Self> {
        Self::new_internal(config, None)
    }

    /// Create a generator with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: &SimConfig, seed: u64) -> Result<Self> {
        Self::new_internal(config, Some(StdRng::seed_from_u64(seed)))
    }

    fn new_internal(config: &SimConfig, rng: Option<StdRng>) -> Result<Self> {
        let warmup_classes = WeightedIndex::new(config.warmup_class_weights)
            .map_err(|e| anyhow!("invalid warm-up class weights: {e}"))?;
        let classes = WeightedIndex::new(config.class_weights)
            .map_err(|e| anyhow!("invalid class weights: {e}"))?;
        let approaches = WeightedIndex::new(config.approach_weights)
            .map_err(|e| anyhow!("invalid approach weights: {e}"))?;

        Ok(Self {
            rng,
            warmup_classes,
            classes,
            approaches,
            conflicts: conflict_graph(),
            emergency_warmup: config.emergency_warmup,
            emergency_lane_capacity: config.emergency_lane_capacity,
            turn_probability: config.turn_probability,
            separate_conflicting_emergencies: config.separate_conflicting_emergencies,
        })
    }

    fn random_range(&mut self, range: Range<usize>) -> usize {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    fn random_bool(&mut self, p: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(p),
            None => rand::rng().random_bool(p),
        }
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        match &mut self.rng {
            Some(rng) => slice.choose(rng),
            None => slice.choose(&mut rand::rng()),
        }
    }

    /// Whether two approaches' movements cross
    pub fn conflicts(&self, a: Approach, b: Approach) -> bool {
        self.conflicts.contains_edge(a, b)
    }

    /// Draw the next arrival for the given elapsed simulation time
    pub fn next_arrival(&mut self, elapsed: u32, registry: &VehicleRegistry) -> Arrival {
        let class = self.draw_class(elapsed);

        let (approach, lane) = if class.is_emergency() {
            self.place_emergency(registry)
        } else if class == VehicleClass::Bike {
            (self.draw_through_approach(), BIKE_LANE)
        } else {
            (self.draw_through_approach(), self.random_range(BIKE_LANE + 1..LANE_COUNT))
        };

        let will_turn = lane == TURN_LANE && self.random_bool(self.turn_probability);

        Arrival {
            class,
            approach,
            lane,
            will_turn,
        }
    }

    fn draw_class(&mut self, elapsed: u32) -> VehicleClass {
        let index = if elapsed < self.emergency_warmup {
            sample(&mut self.rng, &self.warmup_classes)
        } else {
            sample(&mut self.rng, &self.classes)
        };
        VehicleClass::ALL[index]
    }

    fn draw_through_approach(&mut self) -> Approach {
        Approach::ALL[sample(&mut self.rng, &self.approaches)]
    }

    /// Uniform approach, then a lane with spare capacity if there is one
    fn place_emergency(&mut self, registry: &VehicleRegistry) -> (Approach, usize) {
        let allowed: Vec<Approach> = if self.separate_conflicting_emergencies {
            let active = registry.emergency_approaches();
            Approach::ALL
                .into_iter()
                .filter(|a| !active.iter().any(|b| self.conflicts(*a, *b)))
                .collect()
        } else {
            Vec::new()
        };

        // Rule off, or every approach excluded: any approach will do
        let approach = match self.choose_random(&allowed) {
            Some(approach) => *approach,
            None => Approach::ALL[self.random_range(0..Approach::ALL.len())],
        };

        let open: Vec<usize> = (0..LANE_COUNT)
            .filter(|lane| registry.lane_occupancy(approach, *lane) < self.emergency_lane_capacity)
            .collect();
        let lane = match self.choose_random(&open) {
            Some(lane) => *lane,
            None => self.random_range(0..LANE_COUNT),
        };

        (approach, lane)
    }
}

fn sample(rng: &mut Option<StdRng>, table: &WeightedIndex<u32>) -> usize {
    match rng {
        Some(rng) => table.sample(rng),
        None => table.sample(&mut rand::rng()),
    }
}
