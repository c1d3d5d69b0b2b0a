//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the registry, the signal controller, the clock and the
//! arrival generator. Each concurrent activity of the intersection is a
//! separate tick method here; the threaded runtime calls them from their own
//! threads under one lock, and [`SimWorld::step_second`] calls them in a fixed
//! order for deterministic runs.

use anyhow::{Context, Result};
use log::{debug, info};

use super::arrivals::ArrivalGenerator;
use super::clock::SimClock;
use super::config::SimConfig;
use super::controller::{ControlEvent, SignalController};
use super::layout::{self, TURN_LANE};
use super::registry::VehicleRegistry;
use super::snapshot::{SignalSnapshot, VehicleSnapshot, WorldSnapshot};
use super::types::{Approach, Position, VehicleClass, VehicleId};
use super::vehicle::{MotionContext, MotionResult, SimVehicle};

/// What happened during one motion tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionTickSummary {
    pub moved: usize,
    pub discharged: usize,
    pub turned: usize,
    pub exited: usize,
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub elapsed: u32,
    /// Discharges per approach, indexed by `Approach::index`
    pub discharged: [u64; 4],
    pub total_discharged: u64,
    pub preemptions: u64,
    pub phases_served: u64,
    pub active_vehicles: usize,
    pub retired: u64,
}

/// The main simulation world
pub struct SimWorld {
    pub config: SimConfig,

    /// Every vehicle on the layout, queued per approach and lane
    pub registry: VehicleRegistry,

    pub controller: SignalController,

    pub clock: SimClock,

    /// Absent when arrivals are disabled
    arrivals: Option<ArrivalGenerator>,

    /// Simulated seconds accumulated towards the next arrival
    arrival_timer: f32,

    motion_ticks: u64,
}

impl SimWorld {
    fn new_internal(config: SimConfig, seed: Option<u64>) -> Result<Self> {
        config.validate().context("invalid simulation configuration")?;

        let arrivals = match (config.arrival_interval, seed) {
            (None, _) => None,
            (Some(_), Some(seed)) => Some(ArrivalGenerator::new_with_seed(&config, seed)?),
            (Some(_), None) => Some(ArrivalGenerator::new(&config)?),
        };

        Ok(Self {
            registry: VehicleRegistry::new(),
            controller: SignalController::new(&config),
            clock: SimClock::new(config.horizon),
            arrivals,
            arrival_timer: 0.0,
            motion_ticks: 0,
            config,
        })
    }

    pub fn new(config: SimConfig) -> Result<Self> {
        Self::new_internal(config, None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Result<Self> {
        Self::new_internal(config, Some(seed))
    }

    pub fn motion_ticks(&self) -> u64 {
        self.motion_ticks
    }

    pub fn is_finished(&self) -> bool {
        self.clock.is_finished()
    }

    /// Place a vehicle at the entry of a lane, upstream of anything still
    /// queued there, and register it at the tail of the lane queue
    ///
    /// The turn flag only sticks in the turning lane.
    pub fn spawn_vehicle(
        &mut self,
        approach: Approach,
        lane: usize,
        class: VehicleClass,
        will_turn: bool,
    ) -> VehicleId {
        let lane = lane.min(layout::LANE_COUNT - 1);
        let position = self.entry_position(approach, lane, class.length());
        let id = self.registry.next_vehicle_id();
        let vehicle = SimVehicle::new(
            id,
            class,
            approach,
            lane,
            self.config.speed(class),
            position,
            will_turn && lane == TURN_LANE,
        );
        self.registry.enqueue(vehicle);
        debug!("Spawned {} {:?} on {} lane {}", class, id, approach, lane);
        id
    }

    /// Spawn `count` vehicles of one class into a single lane
    pub fn seed_queue(
        &mut self,
        approach: Approach,
        lane: usize,
        class: VehicleClass,
        count: usize,
    ) -> Vec<VehicleId> {
        (0..count)
            .map(|_| self.spawn_vehicle(approach, lane, class, false))
            .collect()
    }

    /// Entry position for a new vehicle of `length`, backed off behind the
    /// last vehicle that has not crossed yet
    fn entry_position(&self, approach: Approach, lane: usize, length: f32) -> Position {
        let mut position = layout::entry_position(approach, lane);
        let Some(tail) = self.registry.tail(approach, lane) else {
            return position;
        };
        if tail.crossed {
            return position;
        }

        let sign = approach.sign();
        let tail_rear = tail.leading_edge() - sign * tail.length();
        let max_lead = tail_rear - sign * self.config.vehicle_gap;
        let entry_lead = layout::leading_edge(approach, &position, length);
        if sign * entry_lead > sign * max_lead {
            *position.along_mut(approach.axis()) = if sign > 0.0 {
                max_lead - length
            } else {
                max_lead
            };
        }
        position
    }

    /// One second of the signal controller
    pub fn control_tick(&mut self) -> Vec<ControlEvent> {
        self.controller.tick(&mut self.registry)
    }

    /// Advance the clock; returns true once the horizon is reached
    pub fn clock_tick(&mut self) -> bool {
        let finished = self.clock.tick();
        if finished {
            debug!("Horizon of {}s reached", self.clock.horizon());
        }
        finished
    }

    /// Move every queued vehicle by one step
    ///
    /// Queues are walked front to back from a snapshot of their ids. A
    /// vehicle that migrated to another queue earlier in the same tick is no
    /// longer queued where the snapshot found it and is skipped.
    pub fn motion_tick(&mut self) -> MotionTickSummary {
        let mut summary = MotionTickSummary::default();

        let order: Vec<(Approach, usize, VehicleId)> = Approach::ALL
            .into_iter()
            .flat_map(|approach| {
                (0..layout::LANE_COUNT).map(move |lane| (approach, lane))
            })
            .flat_map(|(approach, lane)| {
                self.registry
                    .lane_ids(approach, lane)
                    .into_iter()
                    .map(move |id| (approach, lane, id))
            })
            .collect();

        for (approach, lane, id) in order {
            if !self.registry.is_queued_in(id, approach, lane) {
                continue;
            }

            let ctx = MotionContext {
                leader: self.registry.leader_of(id).map(SimVehicle::as_leader),
                has_green: self.controller.has_green(approach),
                gap: self.config.vehicle_gap,
            };
            let Some(vehicle) = self.registry.get_mut(id) else {
                continue;
            };
            let result = vehicle.update(&ctx);
            summary.moved += 1;

            match result {
                MotionResult::Continue => {}
                MotionResult::Discharged(_) => {
                    if let Some(approach) = self.registry.discharge(id) {
                        summary.discharged += 1;
                        debug!("{:?} discharged from {}", id, approach);
                    }
                }
                MotionResult::Turned { from, to } => {
                    if self.registry.migrate(id, from, to) {
                        summary.turned += 1;
                        debug!("{:?} turned {} -> {}", id, from, to);
                    }
                }
                MotionResult::Exited => {
                    if self.registry.retire(id).is_some() {
                        summary.exited += 1;
                    }
                }
            }
        }

        self.motion_ticks += 1;
        summary
    }

    /// Generate and place one arrival; `None` when arrivals are disabled
    pub fn arrival_tick(&mut self) -> Option<VehicleId> {
        let arrival = {
            let generator = self.arrivals.as_mut()?;
            generator.next_arrival(self.clock.elapsed(), &self.registry)
        };
        Some(self.spawn_vehicle(
            arrival.approach,
            arrival.lane,
            arrival.class,
            arrival.will_turn,
        ))
    }

    /// Run one simulated second deterministically: controller, then the
    /// motion ticks with arrivals interleaved, then the clock
    ///
    /// Returns true once the horizon is reached.
    pub fn step_second(&mut self) -> bool {
        if self.clock.is_finished() {
            return true;
        }

        self.control_tick();

        let dt = 1.0 / self.config.motion_hz as f32;
        for _ in 0..self.config.motion_hz {
            self.motion_tick();
            if let Some(interval) = self.config.arrival_interval {
                self.arrival_timer += dt;
                while self.arrival_timer >= interval {
                    self.arrival_timer -= interval;
                    self.arrival_tick();
                }
            }
        }

        self.clock_tick()
    }

    /// Run until the horizon without sleeping, logging a summary every
    /// `summary_every` simulated seconds (0 disables)
    pub fn run_to_horizon(&mut self, summary_every: u32) -> RunReport {
        while !self.step_second() {
            let elapsed = self.clock.elapsed();
            if summary_every > 0 && elapsed % summary_every == 0 {
                self.log_progress();
            }
        }
        self.report()
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            elapsed: self.clock.elapsed(),
            discharged: Approach::ALL.map(|approach| self.registry.discharged(approach)),
            total_discharged: self.registry.total_discharged(),
            preemptions: self.controller.preemptions(),
            phases_served: self.controller.phases_served(),
            active_vehicles: self.registry.len(),
            retired: self.registry.retired(),
        }
    }

    /// Copy everything a dashboard draws
    pub fn snapshot(&self) -> WorldSnapshot {
        let signals = Approach::ALL
            .into_iter()
            .map(|approach| SignalSnapshot {
                approach,
                state: self.controller.light_state(approach),
                countdown: self.controller.countdown(approach),
                discharged: self.registry.discharged(approach),
                total_green_time: self.controller.timers(approach).total_green_time,
            })
            .collect();

        let mut vehicles: Vec<VehicleSnapshot> = self
            .registry
            .iter_matching(|_| true)
            .map(|v| VehicleSnapshot {
                id: v.id,
                class: v.class,
                approach: v.approach,
                lane: v.lane,
                position: v.position,
                crossed: v.crossed,
                turn_state: v.turn_state,
                turn_angle: v.turn_angle,
            })
            .collect();
        vehicles.sort_by_key(|v| v.id);

        WorldSnapshot {
            elapsed: self.clock.elapsed(),
            horizon: self.clock.horizon(),
            current_green: self.controller.current(),
            in_yellow: self.controller.in_yellow(),
            signals,
            vehicles,
            emergencies_waiting: self.registry.emergencies_waiting(),
            total_discharged: self.registry.total_discharged(),
        }
    }

    /// One-line progress log for long runs
    pub fn log_progress(&self) {
        let current = self.controller.current();
        info!(
            "t={}s green={} ({} {}s) waiting={} emergencies={} passed={}",
            self.clock.elapsed(),
            current,
            self.controller.light_state(current),
            self.controller.countdown(current),
            Approach::ALL
                .iter()
                .map(|a| self.registry.undischarged_count(*a))
                .sum::<usize>(),
            self.registry.emergencies_waiting(),
            self.registry.total_discharged()
        );
    }

    /// Print a summary of the current simulation state
    pub fn print_summary(&self) {
        let report = self.report();
        println!("=== Intersection Simulation Summary ===");
        println!("Time: {}s of {}s", report.elapsed, self.clock.horizon());
        println!(
            "Phases served: {}, preemptions: {}",
            report.phases_served, report.preemptions
        );
        println!("--- Approaches ---");
        for approach in Approach::ALL {
            let timers = self.controller.timers(approach);
            println!(
                "  {:<5}: passed={}, waiting={}, green served={}s",
                approach,
                self.registry.discharged(approach),
                self.registry.undischarged_count(approach),
                timers.total_green_time
            );
        }
        println!(
            "Active vehicles: {}, retired: {}",
            report.active_vehicles, report.retired
        );
        println!("Total vehicles passed: {}", report.total_discharged);
    }
}
