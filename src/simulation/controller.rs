//! Signal controller for the four-approach intersection
//!
//! One approach at a time is green or yellow, the other three are red. The
//! controller is ticked once per simulated second. Every tick starts with an
//! emergency poll; a detected emergency on any other approach cancels the
//! running phase on the spot.

use log::{debug, info};

use super::config::SimConfig;
use super::detector::{self, Detection};
use super::registry::VehicleRegistry;
use super::types::{Approach, LightState, VehicleClass};

/// Countdown timers of one signal head, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTimers {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
    /// Seconds of green served since the start of the run
    pub total_green_time: u32,
}

impl SignalTimers {
    fn new(config: &SimConfig) -> Self {
        Self {
            red: config.default_red,
            yellow: config.default_yellow,
            green: config.default_green,
            total_green_time: 0,
        }
    }

    fn reset(&mut self, config: &SimConfig) {
        self.red = config.default_red;
        self.yellow = config.default_yellow;
        self.green = config.default_green;
    }
}

/// Something the controller did during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// An emergency took the green away from `from`
    Preempted {
        from: Approach,
        to: Approach,
        class: VehicleClass,
        green: u32,
    },
    /// Adaptive green computed ahead of the switch
    GreenPlanned { approach: Approach, green: u32 },
    YellowStarted(Approach),
    /// A new phase began after a completed yellow
    PhaseChanged {
        from: Approach,
        to: Approach,
        green: u32,
        emergency: bool,
    },
}

/// Adaptive green for an approach given its undischarged vehicles per class
///
/// Any emergency vehicle yields the emergency green. Otherwise the summed
/// discharge time is spread over `lanes_per_approach + 1` and clamped to the
/// configured minimum and maximum.
pub fn adaptive_green_for_counts(counts: &[usize; 8], config: &SimConfig) -> u32 {
    if VehicleClass::EMERGENCY_PRIORITY
        .iter()
        .any(|class| counts[class.index()] > 0)
    {
        return config.emergency_green();
    }

    let demand: u32 = VehicleClass::ALL
        .iter()
        .map(|class| counts[class.index()] as u32 * config.discharge_secs(*class))
        .sum();
    demand
        .div_ceil(config.lanes_per_approach + 1)
        .clamp(config.minimum_green, config.maximum_green)
}

/// Adaptive green for the vehicles currently waiting on an approach
pub fn adaptive_green(registry: &VehicleRegistry, approach: Approach, config: &SimConfig) -> u32 {
    adaptive_green_for_counts(&registry.class_counts(approach), config)
}

/// Approach to serve next: the emergency approach if one is detected, else
/// the approach with the most undischarged vehicles (lowest index on ties).
/// The flag reports whether an emergency decided it.
pub fn select_next(registry: &VehicleRegistry) -> (Approach, bool) {
    if let Some(approach) = detector::detect_emergency(registry) {
        return (approach, true);
    }

    let busiest = Approach::ALL
        .into_iter()
        .map(|approach| (approach, registry.undischarged_count(approach)))
        .fold((Approach::Right, 0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        });
    (busiest.0, false)
}

/// Phase state machine of the intersection
#[derive(Debug, Clone)]
pub struct SignalController {
    config: SimConfig,
    signals: [SignalTimers; 4],
    current: Approach,
    next: Approach,
    in_yellow: bool,
    /// Green computed at the lookahead point for the approach expected next
    planned_green: Option<(Approach, u32)>,
    preemptions: u64,
    phases_served: u64,
}

impl SignalController {
    pub fn new(config: &SimConfig) -> Self {
        let mut controller = Self {
            config: config.clone(),
            signals: [SignalTimers::new(config); 4],
            current: Approach::Right,
            next: Approach::Right.clockwise(),
            in_yellow: false,
            planned_green: None,
            preemptions: 0,
            phases_served: 0,
        };
        controller.begin_phase();
        controller
    }

    pub fn current(&self) -> Approach {
        self.current
    }

    pub fn next(&self) -> Approach {
        self.next
    }

    pub fn in_yellow(&self) -> bool {
        self.in_yellow
    }

    pub fn timers(&self, approach: Approach) -> &SignalTimers {
        &self.signals[approach.index()]
    }

    pub fn preemptions(&self) -> u64 {
        self.preemptions
    }

    pub fn phases_served(&self) -> u64 {
        self.phases_served
    }

    /// Whether vehicles on `approach` currently have right-of-way
    pub fn has_green(&self, approach: Approach) -> bool {
        approach == self.current && !self.in_yellow
    }

    pub fn light_state(&self, approach: Approach) -> LightState {
        if approach != self.current {
            LightState::Red
        } else if self.in_yellow {
            LightState::Yellow
        } else {
            LightState::Green
        }
    }

    /// Seconds left on whatever the approach is currently showing
    pub fn countdown(&self, approach: Approach) -> u32 {
        let timers = self.timers(approach);
        match self.light_state(approach) {
            LightState::Green => timers.green,
            LightState::Yellow => timers.yellow,
            LightState::Red => timers.red,
        }
    }

    /// Advance the state machine by one second
    pub fn tick(&mut self, registry: &mut VehicleRegistry) -> Vec<ControlEvent> {
        let mut events = Vec::new();

        if let Some(detection) = detector::detect(registry) {
            if detection.approach != self.current {
                events.push(self.preempt(detection, registry));
                return events;
            }
        }

        let current = self.current.index();
        if !self.in_yellow {
            if self.signals[current].green > 0 {
                self.count_down();
                if self.planned_green.is_none()
                    && self.signals[self.next.index()].red == self.config.detection_lookahead
                {
                    events.push(self.plan_next(registry));
                }
            }
            if self.signals[current].green == 0 {
                self.begin_yellow(registry);
                events.push(ControlEvent::YellowStarted(self.current));
            }
        } else {
            if self.signals[current].yellow > 0 {
                self.count_down();
            }
            if self.signals[current].yellow == 0 {
                events.push(self.rotate(registry));
            }
        }

        events
    }

    fn count_down(&mut self) {
        for approach in Approach::ALL {
            let timers = &mut self.signals[approach.index()];
            if approach != self.current {
                timers.red = timers.red.saturating_sub(1);
            } else if self.in_yellow {
                timers.yellow = timers.yellow.saturating_sub(1);
            } else {
                timers.green = timers.green.saturating_sub(1);
                timers.total_green_time += 1;
            }
        }
    }

    /// Start waiting approaches' red countdowns for the phase of `current`
    fn begin_phase(&mut self) {
        let current = self.signals[self.current.index()];
        let cycle = current.green + current.yellow;
        for approach in Approach::ALL {
            self.signals[approach.index()].red = if approach == self.current { 0 } else { cycle };
        }
        self.next = self.current.clockwise();
        self.planned_green = None;
    }

    fn plan_next(&mut self, registry: &VehicleRegistry) -> ControlEvent {
        let (approach, _) = select_next(registry);
        let green = adaptive_green(registry, approach, &self.config);
        self.next = approach;
        self.planned_green = Some((approach, green));
        debug!("Planned {}s of green for {}", green, approach);
        ControlEvent::GreenPlanned { approach, green }
    }

    fn begin_yellow(&mut self, registry: &mut VehicleRegistry) {
        self.in_yellow = true;
        registry.for_each_on_approach_mut(self.current, |vehicle| vehicle.hold_at_default());
        debug!("Yellow on {}", self.current);
    }

    fn rotate(&mut self, registry: &mut VehicleRegistry) -> ControlEvent {
        let finished = self.current;
        self.signals[finished.index()].reset(&self.config);
        self.in_yellow = false;

        let (chosen, emergency) = select_next(registry);
        let green = match self.planned_green.take() {
            Some((planned, green)) if planned == chosen && !emergency => green,
            _ => adaptive_green(registry, chosen, &self.config),
        };

        self.current = chosen;
        let timers = &mut self.signals[chosen.index()];
        timers.green = green;
        timers.yellow = self.config.default_yellow;
        self.begin_phase();
        self.phases_served += 1;

        info!(
            "Phase {} -> {}: {}s green{}",
            finished,
            chosen,
            green,
            if emergency { " (emergency)" } else { "" }
        );
        ControlEvent::PhaseChanged {
            from: finished,
            to: chosen,
            green,
            emergency,
        }
    }

    fn preempt(&mut self, detection: Detection, registry: &mut VehicleRegistry) -> ControlEvent {
        let from = self.current;
        let to = detection.approach;

        for timers in &mut self.signals {
            timers.green = 0;
            timers.yellow = self.config.default_yellow;
            timers.red = self.config.default_red;
        }

        let green = self.config.emergency_green();
        self.current = to;
        self.in_yellow = false;
        self.next = to.clockwise();
        self.planned_green = None;
        let timers = &mut self.signals[to.index()];
        timers.green = green;
        timers.red = 0;
        self.preemptions += 1;

        for approach in Approach::ALL.into_iter().filter(|a| *a != to) {
            registry.for_each_on_approach_mut(approach, |vehicle| vehicle.hold_at_default());
        }

        info!(
            "Preempting {} -> {} for {} {:?} ({:.0} from stop line), {}s green",
            from, to, detection.class, detection.vehicle, detection.distance, green
        );
        ControlEvent::Preempted {
            from,
            to,
            class: detection.class,
            green,
        }
    }
}
