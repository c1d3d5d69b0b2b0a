use intersection_sim::simulation::{
    adaptive_green_for_counts, default_hold, select_next, Approach, ControlEvent, LightState,
    SimConfig, SimWorld, StopBound, VehicleClass, VehicleRegistry,
};

fn quiet_config() -> SimConfig {
    SimConfig {
        arrival_interval: None,
        ..SimConfig::default()
    }
}

fn quiet_world() -> SimWorld {
    SimWorld::new(quiet_config()).expect("default configuration is valid")
}

fn counts(pairs: &[(VehicleClass, usize)]) -> [usize; 8] {
    let mut counts = [0; 8];
    for (class, count) in pairs {
        counts[class.index()] = *count;
    }
    counts
}

#[test]
fn test_initial_phase_is_right_with_default_green() {
    let world = quiet_world();
    let controller = &world.controller;

    assert_eq!(controller.current(), Approach::Right);
    assert_eq!(controller.light_state(Approach::Right), LightState::Green);
    assert_eq!(controller.timers(Approach::Right).green, 20);
    for approach in [Approach::Down, Approach::Left, Approach::Up] {
        assert_eq!(controller.light_state(approach), LightState::Red);
        assert_eq!(controller.timers(approach).red, 25);
    }
}

#[test]
fn test_adaptive_green_spreads_demand_over_lanes() {
    let waiting = counts(&[
        (VehicleClass::Car, 4),
        (VehicleClass::Bus, 1),
        (VehicleClass::Rickshaw, 2),
        (VehicleClass::Bike, 3),
    ]);

    let config = SimConfig {
        minimum_green: 1,
        ..SimConfig::default()
    };
    assert_eq!(adaptive_green_for_counts(&waiting, &config), 6);

    // Clamped up to the default minimum
    assert_eq!(adaptive_green_for_counts(&waiting, &SimConfig::default()), 10);
}

#[test]
fn test_adaptive_green_clamps_to_maximum() {
    let waiting = counts(&[(VehicleClass::Car, 100)]);
    assert_eq!(adaptive_green_for_counts(&waiting, &SimConfig::default()), 60);
}

#[test]
fn test_adaptive_green_for_emergency_uses_floor() {
    let waiting = counts(&[(VehicleClass::Car, 40), (VehicleClass::Firetruck, 1)]);
    assert_eq!(adaptive_green_for_counts(&waiting, &SimConfig::default()), 10);

    let config = SimConfig {
        minimum_green: 15,
        ..SimConfig::default()
    };
    assert_eq!(adaptive_green_for_counts(&waiting, &config), 15);
}

#[test]
fn test_select_next_on_empty_registry_picks_first_approach() {
    let registry = VehicleRegistry::new();
    assert_eq!(select_next(&registry), (Approach::Right, false));
}

#[test]
fn test_select_next_prefers_emergency_over_demand() {
    let mut world = quiet_world();
    world.seed_queue(Approach::Down, 1, VehicleClass::Car, 8);
    world.spawn_vehicle(Approach::Up, 2, VehicleClass::Vip, false);

    assert_eq!(select_next(&world.registry), (Approach::Up, true));
}

#[test]
fn test_preemption_cuts_running_green() {
    let mut world = quiet_world();
    let right_queue = world.seed_queue(Approach::Right, 1, VehicleClass::Car, 4);
    // Followers pick up car-following bounds while Right is green
    for _ in 0..10 {
        world.motion_tick();
    }
    let default_stop = StopBound::Hold(default_hold(Approach::Right));
    assert!(right_queue
        .iter()
        .filter_map(|id| world.registry.get(*id))
        .any(|vehicle| vehicle.stop != default_stop));

    for _ in 0..5 {
        world.control_tick();
    }
    assert_eq!(world.controller.timers(Approach::Right).green, 15);

    world.spawn_vehicle(Approach::Left, 1, VehicleClass::Ambulance, false);
    let events = world.control_tick();

    for id in &right_queue {
        let vehicle = world.registry.get(*id).expect("vehicle registered");
        assert!(!vehicle.crossed);
        assert_eq!(vehicle.stop, default_stop);
    }

    assert_eq!(
        events,
        vec![ControlEvent::Preempted {
            from: Approach::Right,
            to: Approach::Left,
            class: VehicleClass::Ambulance,
            green: 10,
        }]
    );
    assert_eq!(world.controller.current(), Approach::Left);
    assert!(world.controller.has_green(Approach::Left));
    assert_eq!(world.controller.light_state(Approach::Right), LightState::Red);
    assert_eq!(world.controller.timers(Approach::Right).green, 0);
    assert_eq!(world.controller.timers(Approach::Left).green, 10);
    assert_eq!(world.controller.preemptions(), 1);
}

#[test]
fn test_emergency_on_current_green_does_not_preempt() {
    let mut world = quiet_world();
    world.spawn_vehicle(Approach::Right, 1, VehicleClass::Ambulance, false);

    let events = world.control_tick();

    assert!(events.is_empty(), "unexpected events: {:?}", events);
    assert_eq!(world.controller.current(), Approach::Right);
    assert_eq!(world.controller.timers(Approach::Right).green, 19);
    assert_eq!(world.controller.preemptions(), 0);
}

#[test]
fn test_yellow_then_rotation_to_busiest_approach() {
    let mut world = quiet_world();
    world.seed_queue(Approach::Up, 1, VehicleClass::Car, 5);
    world.seed_queue(Approach::Down, 1, VehicleClass::Car, 2);

    let mut events = Vec::new();
    for _ in 0..25 {
        events.extend(world.control_tick());
    }

    assert!(events.contains(&ControlEvent::YellowStarted(Approach::Right)));
    assert!(events.contains(&ControlEvent::GreenPlanned {
        approach: Approach::Up,
        green: 10,
    }));
    assert_eq!(
        events.last(),
        Some(&ControlEvent::PhaseChanged {
            from: Approach::Right,
            to: Approach::Up,
            green: 10,
            emergency: false,
        })
    );
    assert_eq!(world.controller.current(), Approach::Up);
    assert_eq!(world.controller.light_state(Approach::Right), LightState::Red);
    assert_eq!(world.controller.timers(Approach::Right).green, 20);
    assert_eq!(world.controller.phases_served(), 1);
}

#[test]
fn test_yellow_lasts_default_yellow() {
    let mut world = quiet_world();
    for _ in 0..20 {
        world.control_tick();
    }
    assert_eq!(world.controller.light_state(Approach::Right), LightState::Yellow);
    assert!(!world.controller.has_green(Approach::Right));

    for _ in 0..4 {
        world.control_tick();
    }
    assert_eq!(world.controller.light_state(Approach::Right), LightState::Yellow);
    assert_eq!(world.controller.countdown(Approach::Right), 1);
}

#[test]
fn test_single_non_red_approach_every_second() {
    let mut world = SimWorld::new_with_seed(SimConfig::default(), 21).expect("valid config");

    for _ in 0..150 {
        world.step_second();
        let snapshot = world.snapshot();
        let non_red = snapshot
            .signals
            .iter()
            .filter(|signal| signal.state != LightState::Red)
            .count();
        assert_eq!(non_red, 1, "at t={}s: {:?}", snapshot.elapsed, snapshot.signals);
        assert!(snapshot.green_approaches().len() <= 1);
    }
}

#[test]
fn test_total_green_time_accumulates_on_served_approach() {
    let mut world = quiet_world();
    for _ in 0..7 {
        world.control_tick();
    }
    assert_eq!(world.controller.timers(Approach::Right).total_green_time, 7);
    assert_eq!(world.controller.timers(Approach::Down).total_green_time, 0);
}
