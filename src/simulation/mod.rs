//! Four-way signalized intersection simulation
//!
//! This module contains the signal-phase scheduler, the vehicle motion and
//! queuing engine, and the data model they share. It runs headless; renderers
//! and reporting read [`Telemetry`] snapshots.

mod approach;
mod config;
mod generator;
mod geometry;
mod motion;
mod report;
mod scheduler;
mod signal;
mod telemetry;
mod traffic;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
pub use approach::{ApproachState, LaneQueue, ManeuverCounts};
pub use config::{
    ConfigError, ConfigResult, DelayFormula, GreenTiming, SchedulingPolicy, SimConfig,
    StoppedRule, WaitingRule, DEFAULT_GREEN, DEFAULT_MOTION_SUBSTEPS, DEFAULT_RANDOM_GREEN,
    DEFAULT_RED, DEFAULT_YELLOW, MAX_PHASE_DURATION,
};
pub use generator::{SpawnRequest, VehicleGenerator};
pub use geometry::ApproachGeometry;
pub use report::{LogReport, MemoryReport, NoopReport, ReportSink, TextFileReport};
pub use scheduler::{
    greedy_longest_queue, round_robin_with_skip, DecisionPolicy, Phase, PhaseEvent, Scheduler,
};
pub use signal::{LightState, Signal, RED_DISPLAY_LIMIT};
pub use telemetry::{average_delay, ApproachTelemetry, SignalSnapshot, Telemetry};
pub use traffic::Traffic;
pub use types::{
    Approach, Maneuver, VehicleId, VehicleKind, DETECTION_ZONE, LANES_PER_APPROACH, MOVING_GAP,
    ROTATION_STEP, STOPPING_GAP, TURN_COMPLETE,
};
pub use vehicle::{Vehicle, VehicleStage};
pub use world::{SimWorld, StopHandle};
