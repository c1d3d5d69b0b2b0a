//! Threaded real-time runtime
//!
//! Four threads share one `SimWorld` behind a mutex: the clock and the signal
//! controller tick once per simulated second, motion ticks at the configured
//! rate, and arrivals fire at the arrival interval. Every tick takes the lock
//! for its whole read-modify-write, so readers never see a half-applied step.
//! The clock clears the shared running flag at the horizon and every loop
//! exits at its next wake-up.

use anyhow::{anyhow, ensure, Context, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::snapshot::WorldSnapshot;
use super::world::{MotionTickSummary, RunReport, SimWorld};

/// Cloneable handle to the world shared by the runtime threads
#[derive(Clone)]
pub struct SharedWorld {
    inner: Arc<Mutex<SimWorld>>,
}

impl SharedWorld {
    pub fn new(world: SimWorld) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Lock the world; a panicked ticker poisons the lock and ends the run
    pub fn lock(&self) -> Result<MutexGuard<'_, SimWorld>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("simulation state lock poisoned"))
    }

    /// One motion tick under the lock
    pub fn advance_motion(&self) -> Result<MotionTickSummary> {
        Ok(self.lock()?.motion_tick())
    }

    /// Consistent copy of the world taken under the lock
    pub fn snapshot(&self) -> Result<WorldSnapshot> {
        Ok(self.lock()?.snapshot())
    }
}

/// Pacing of the threaded run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeOptions {
    /// Simulated seconds per wall-clock second
    pub time_scale: f64,
    /// Log progress every this many simulated seconds (0 disables)
    pub summary_every: u32,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            summary_every: 10,
        }
    }
}

/// Handle to a simulation running on its own threads
pub struct RunningSimulation {
    world: SharedWorld,
    running: Arc<AtomicBool>,
    handles: Vec<JoinHandle<Result<()>>>,
}

impl RunningSimulation {
    /// Start the clock, controller, motion and arrival threads
    pub fn spawn(world: SimWorld, options: RuntimeOptions) -> Result<Self> {
        ensure!(
            options.time_scale.is_finite() && options.time_scale > 0.0,
            "time scale must be a positive number"
        );

        let motion_hz = world.config.motion_hz;
        let arrival_interval = world.config.arrival_interval;
        let world = SharedWorld::new(world);
        let running = Arc::new(AtomicBool::new(true));
        let second = Duration::from_secs_f64(1.0 / options.time_scale);

        let mut simulation = Self {
            world: world.clone(),
            running: running.clone(),
            handles: Vec::new(),
        };

        let clock_world = world.clone();
        let clock_running = running.clone();
        let summary_every = options.summary_every;
        simulation.start("clock", second, move || {
            let mut world = clock_world.lock()?;
            let finished = world.clock_tick();
            let elapsed = world.clock.elapsed();
            if summary_every > 0 && elapsed % summary_every == 0 && !finished {
                world.log_progress();
            }
            if finished {
                clock_running.store(false, Ordering::Release);
            }
            Ok(finished)
        })?;

        let controller_world = world.clone();
        simulation.start("controller", second, move || {
            controller_world.lock()?.control_tick();
            Ok(false)
        })?;

        let motion_world = world.clone();
        simulation.start("motion", second / motion_hz, move || {
            motion_world.advance_motion()?;
            Ok(false)
        })?;

        if let Some(interval) = arrival_interval {
            let arrival_world = world.clone();
            let period = Duration::from_secs_f64(f64::from(interval) / options.time_scale);
            simulation.start("arrivals", period, move || {
                arrival_world.lock()?.arrival_tick();
                Ok(false)
            })?;
        }

        info!(
            "Simulation started: {} threads, {}x real time",
            simulation.handles.len(),
            options.time_scale
        );
        Ok(simulation)
    }

    fn start<F>(&mut self, name: &str, period: Duration, tick: F) -> Result<()>
    where
        F: FnMut() -> Result<bool> + Send + 'static,
    {
        let running = self.running.clone();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let result = run_periodic(&running, period, tick);
                if let Err(err) = &result {
                    warn!("{} thread failed: {:#}", thread_name, err);
                    running.store(false, Ordering::Release);
                }
                debug!("{} thread stopped", thread_name);
                result
            })
            .with_context(|| format!("failed to spawn {} thread", name))?;
        self.handles.push(handle);
        Ok(())
    }

    /// Handle for reading the world while the run is in progress
    pub fn world(&self) -> SharedWorld {
        self.world.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask every thread to stop at its next wake-up
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Wait for every thread and report the final totals
    pub fn join(self) -> Result<RunReport> {
        let mut first_error = None;
        for handle in self.handles {
            let outcome = handle
                .join()
                .map_err(|_| anyhow!("simulation thread panicked"))
                .and_then(|result| result);
            if let Err(err) = outcome {
                first_error.get_or_insert(err);
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }
        let report = self.world.lock()?.report();
        Ok(report)
    }
}

/// Call `tick` every `period` until it returns true or `running` is cleared
///
/// Wake-ups are scheduled against absolute deadlines so slow ticks do not
/// accumulate drift.
fn run_periodic<F>(running: &AtomicBool, period: Duration, mut tick: F) -> Result<()>
where
    F: FnMut() -> Result<bool>,
{
    let mut deadline = Instant::now() + period;
    while running.load(Ordering::Acquire) {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        deadline += period;

        if !running.load(Ordering::Acquire) {
            break;
        }
        if tick()? {
            break;
        }
    }
    Ok(())
}
