use std::thread;
use std::time::Duration;

use intersection_sim::simulation::{
    LightState, RunningSimulation, RuntimeOptions, SimConfig, SimWorld,
};

#[test]
fn test_threaded_run_reaches_horizon() {
    let world = SimWorld::new_with_seed(
        SimConfig {
            horizon: 4,
            ..SimConfig::default()
        },
        31,
    )
    .expect("valid config");

    let simulation = RunningSimulation::spawn(
        world,
        RuntimeOptions {
            time_scale: 100.0,
            summary_every: 0,
        },
    )
    .expect("threads start");
    let shared = simulation.world();

    let report = simulation.join().expect("run completes");
    assert_eq!(report.elapsed, 4);

    let snapshot = shared.snapshot().expect("lock not poisoned");
    assert_eq!(snapshot.elapsed, 4);
    assert!(shared.lock().expect("lock not poisoned").motion_ticks() > 0);
}

#[test]
fn test_snapshots_during_run_show_one_non_red_approach() {
    let world = SimWorld::new_with_seed(
        SimConfig {
            horizon: 6,
            ..SimConfig::default()
        },
        8,
    )
    .expect("valid config");
    let simulation = RunningSimulation::spawn(
        world,
        RuntimeOptions {
            time_scale: 50.0,
            summary_every: 0,
        },
    )
    .expect("threads start");
    let shared = simulation.world();

    for _ in 0..10 {
        let snapshot = shared.snapshot().expect("lock not poisoned");
        let non_red = snapshot
            .signals
            .iter()
            .filter(|signal| signal.state != LightState::Red)
            .count();
        assert_eq!(non_red, 1);
        thread::sleep(Duration::from_millis(5));
    }

    simulation.join().expect("run completes");
}

#[test]
fn test_stop_ends_run_early() {
    let world = SimWorld::new(SimConfig {
        arrival_interval: None,
        ..SimConfig::default()
    })
    .expect("valid config");
    let simulation = RunningSimulation::spawn(world, RuntimeOptions::default()).expect("threads start");

    simulation.stop();
    assert!(!simulation.is_running());

    let report = simulation.join().expect("threads exit cleanly");
    assert!(report.elapsed < 400);
}

#[test]
fn test_non_positive_time_scale_is_rejected() {
    let world = SimWorld::new(SimConfig::default()).expect("valid config");
    let result = RunningSimulation::spawn(
        world,
        RuntimeOptions {
            time_scale: 0.0,
            summary_every: 0,
        },
    );
    assert!(result.is_err());
}
