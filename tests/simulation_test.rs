//! End-to-end simulation tests
//!
//! Whole runs through `SimWorld::run` with the report sinks, plus config
//! validation.

use signal_sim::simulation::{
    Approach, ApproachGeometry, ConfigError, GreenTiming, LogReport, MemoryReport, NoopReport,
    Phase, ReportSink, SchedulingPolicy, SimConfig, SimWorld, SpawnRequest, StopHandle,
    Telemetry, TextFileReport, VehicleKind, MAX_PHASE_DURATION,
};

#[test]
fn test_single_car_crosses_during_first_green() {
    let config = SimConfig {
        policy: SchedulingPolicy::FixedRoundRobin,
        green: GreenTiming::Fixed([10; 4]),
        yellow: 5,
        generate_arrivals: false,
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(config).unwrap();
    let id = world
        .spawn(SpawnRequest::straight(VehicleKind::Car, Approach::East, 0))
        .unwrap();

    let geometry = ApproachGeometry::of(Approach::East);
    let per_tick = VehicleKind::Car.base_speed() * world.config().motion_substeps as f32;
    let ticks_to_cross = ((geometry.stop_line - geometry.entry) / per_tick).ceil() as u32;
    assert!(ticks_to_cross <= 10);

    for t in 1..=15 {
        world.tick();
        let crossed = world.traffic().vehicle(id).unwrap().crossed;
        if t >= ticks_to_cross {
            assert!(crossed, "car should have crossed by {}s", t);
        }
        if t == 10 {
            assert_eq!(world.phase(), Phase::Yellow(Approach::East));
        }
    }
    assert_eq!(world.phase(), Phase::Green(Approach::South));

    let telemetry = world.telemetry();
    assert_eq!(telemetry.approach(Approach::East).crossed, 1);
    assert_eq!(telemetry.approach(Approach::East).straight, 1);
    assert_eq!(telemetry.approach(Approach::East).average_delay, 0.0);
    assert_eq!(telemetry.total_crossed(), 1);
}

#[test]
fn test_run_reports_at_each_interval_and_at_end() {
    let config = SimConfig {
        total_duration: 60,
        report_interval: 20,
        seed: Some(5),
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(config).unwrap();
    let mut sink = MemoryReport::default();

    let last = world.run(&mut sink);

    let times: Vec<u32> = sink.reports.iter().map(|r| r.elapsed).collect();
    assert_eq!(times, vec![20, 40, 60, 60]);
    assert_eq!(last.elapsed, 60);
    assert!(world.is_finished());
    assert!(!world.traffic().vehicles().is_empty());
}

#[test]
fn test_stop_before_run_yields_zero_report() {
    let mut world = SimWorld::new(SimConfig::default()).unwrap();
    world.stop_handle().request_stop();

    let mut sink = MemoryReport::default();
    let last = world.run(&mut sink);

    assert_eq!(last.elapsed, 0);
    assert_eq!(sink.reports.len(), 1);
    assert_eq!(last.total_crossed(), 0);
    assert_eq!(last.stopped_counts(), [0; 4]);
}

/// Requests a stop once the run reaches a given time
struct StopAt {
    at: u32,
    handle: StopHandle,
    ended: bool,
}

impl ReportSink for StopAt {
    fn report(&mut self, _telemetry: &Telemetry) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_tick(&mut self, telemetry: &Telemetry) {
        if telemetry.elapsed == self.at {
            self.handle.request_stop();
        }
    }

    fn on_sim_end(&mut self, _telemetry: &Telemetry) {
        self.ended = true;
    }
}

#[test]
fn test_stop_handle_ends_run_early() {
    let mut world = SimWorld::new(SimConfig::default()).unwrap();
    let mut sink = StopAt {
        at: 5,
        handle: world.stop_handle(),
        ended: false,
    };

    let last = world.run(&mut sink);
    assert_eq!(last.elapsed, 5);
    assert!(sink.ended);
}

#[test]
fn test_total_duration_can_be_shortened() {
    let mut world = SimWorld::new(SimConfig::default()).unwrap();
    world.set_total_duration(5).unwrap();
    let last = world.run(&mut NoopReport);
    assert_eq!(last.elapsed, 5);
}

#[test]
fn test_log_report_runs_to_completion() {
    let config = SimConfig {
        total_duration: 20,
        report_interval: 10,
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(config).unwrap();
    let last = world.run(&mut LogReport);
    assert_eq!(last.elapsed, 20);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let config = SimConfig {
        total_duration: 120,
        policy: SchedulingPolicy::GreedyLongestQueue,
        green: GreenTiming::Random { min: 8, max: 16 },
        seed: Some(99),
        ..SimConfig::default()
    };
    let mut first = SimWorld::new(config.clone()).unwrap();
    let mut second = SimWorld::new(config).unwrap();

    let a = first.run(&mut NoopReport);
    let b = second.run(&mut NoopReport);
    assert_eq!(a, b);
    assert_eq!(first.traffic().vehicles().len(), second.traffic().vehicles().len());
}

#[test]
fn test_long_run_moves_traffic_for_every_policy() {
    for policy in [
        SchedulingPolicy::FixedRoundRobin,
        SchedulingPolicy::SkipEmptyRoundRobin,
        SchedulingPolicy::GreedyLongestQueue,
    ] {
        let config = SimConfig {
            total_duration: 300,
            policy,
            seed: Some(17),
            ..SimConfig::default()
        };
        let mut world = SimWorld::new(config).unwrap();
        let last = world.run(&mut NoopReport);

        assert_eq!(last.elapsed, 300);
        assert!(last.total_crossed() > 0, "{:?} crossed nothing", policy);
        assert!(last.total_crossed() <= world.traffic().vehicles().len());
    }
}

#[test]
fn test_text_file_report_appends_snapshots() {
    let path = std::env::temp_dir().join(format!("signal_sim_report_{}.txt", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let config = SimConfig {
        total_duration: 10,
        report_interval: 5,
        seed: Some(1),
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(config).unwrap();
    let mut sink = TextFileReport::open(&path).unwrap();
    assert_eq!(sink.path(), path.as_path());
    world.run(&mut sink);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("Time: 5s"));
    assert!(contents.contains("Time: 10s"));
    assert!(contents.contains("Average Delays:"));
    assert!(contents.contains("Stopped Vehicles:"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_default_config_is_valid() {
    assert_eq!(SimConfig::default().validate(), Ok(()));
}

#[test]
fn test_invalid_configs_are_rejected() {
    let zero_duration = SimConfig {
        total_duration: 0,
        ..SimConfig::default()
    };
    assert_eq!(
        zero_duration.validate(),
        Err(ConfigError::NonPositive {
            what: "total duration"
        })
    );

    let zero_green = SimConfig {
        green: GreenTiming::Fixed([10, 0, 10, 10]),
        ..SimConfig::default()
    };
    assert_eq!(
        zero_green.validate(),
        Err(ConfigError::NonPositive {
            what: "green duration"
        })
    );

    let backwards = SimConfig {
        green: GreenTiming::Random { min: 20, max: 10 },
        ..SimConfig::default()
    };
    assert_eq!(
        backwards.validate(),
        Err(ConfigError::MalformedRange { min: 20, max: 10 })
    );

    let no_kinds = SimConfig {
        allowed_kinds: Vec::new(),
        ..SimConfig::default()
    };
    assert_eq!(no_kinds.validate(), Err(ConfigError::NoVehicleKinds));

    let no_weights = SimConfig {
        approach_weights: [0; 4],
        ..SimConfig::default()
    };
    assert_eq!(no_weights.validate(), Err(ConfigError::ZeroApproachWeights));

    assert!(SimWorld::new(zero_duration).is_err());
}

#[test]
fn test_unbounded_durations_are_rejected() {
    let huge_green = SimConfig {
        green: GreenTiming::Fixed([u32::MAX; 4]),
        ..SimConfig::default()
    };
    assert_eq!(
        huge_green.validate(),
        Err(ConfigError::TooLong {
            what: "green duration",
            value: u32::MAX,
            max: MAX_PHASE_DURATION,
        })
    );
    assert!(SimWorld::new(huge_green).is_err());

    let huge_yellow = SimConfig {
        yellow: MAX_PHASE_DURATION + 1,
        ..SimConfig::default()
    };
    assert!(matches!(
        huge_yellow.validate(),
        Err(ConfigError::TooLong {
            what: "yellow duration",
            ..
        })
    ));

    let huge_range = SimConfig {
        green: GreenTiming::Random {
            min: 10,
            max: u32::MAX,
        },
        ..SimConfig::default()
    };
    assert!(huge_range.validate().is_err());

    let longest = SimConfig {
        green: GreenTiming::Fixed([MAX_PHASE_DURATION; 4]),
        yellow: MAX_PHASE_DURATION,
        ..SimConfig::default()
    };
    assert_eq!(longest.validate(), Ok(()));
}

#[test]
fn test_negative_red_is_rejected() {
    let config = SimConfig {
        red: -1,
        ..SimConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::NegativeRed(-1)));
    assert!(SimWorld::new(config).is_err());

    let zero = SimConfig {
        red: 0,
        ..SimConfig::default()
    };
    assert_eq!(zero.validate(), Ok(()));
}

#[test]
fn test_extreme_approach_weights_still_generate_arrivals() {
    let config = SimConfig {
        total_duration: 50,
        approach_weights: [u32::MAX, 1, 0, 0],
        seed: Some(8),
        ..SimConfig::default()
    };
    let mut world = SimWorld::new(config).unwrap();
    let last = world.run(&mut NoopReport);

    assert_eq!(last.elapsed, 50);
    let vehicles = world.traffic().vehicles();
    assert!(!vehicles.is_empty());
    assert!(vehicles
        .iter()
        .all(|v| matches!(v.approach, Approach::East | Approach::South)));
}
