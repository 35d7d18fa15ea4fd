//! Simulation configuration and its validation
//!
//! A configuration is validated once before the first tick; live updates go
//! through the same checks so an invalid value never reaches the tick loop.

use clap::ValueEnum;
use thiserror::Error;

use super::types::VehicleKind;

/// Default red countdown shown for signals far from their turn
pub const DEFAULT_RED: i32 = 150;
pub const DEFAULT_GREEN: u32 = 10;
pub const DEFAULT_YELLOW: u32 = 5;
/// Default range for randomised green durations, inclusive
pub const DEFAULT_RANDOM_GREEN: (u32, u32) = (10, 20);
/// Default number of motion steps per simulated second
pub const DEFAULT_MOTION_SUBSTEPS: u32 = 30;
/// Longest green or yellow phase accepted, one simulated day
pub const MAX_PHASE_DURATION: u32 = 86_400;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{what} must be greater than zero")]
    NonPositive { what: &'static str },

    #[error("{what} of {value}s exceeds the {max}s limit")]
    TooLong {
        what: &'static str,
        value: u32,
        max: u32,
    },

    #[error("red countdown {0} must not be negative")]
    NegativeRed(i32),

    #[error("green range is malformed: min {min} is greater than max {max}")]
    MalformedRange { min: u32, max: u32 },

    #[error("at least one vehicle kind must be allowed")]
    NoVehicleKinds,

    #[error("turn probability {0} is outside 0..=1")]
    TurnProbability(f64),

    #[error("approach weights must not all be zero")]
    ZeroApproachWeights,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How the next green approach is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchedulingPolicy {
    /// Always hand over to the next approach in order
    FixedRoundRobin,
    /// Next approach in order that has waiting vehicles; empty greens end early
    SkipEmptyRoundRobin,
    /// Approach with the most stopped vehicles; empty greens end early
    GreedyLongestQueue,
}

impl SchedulingPolicy {
    /// Whether a green phase with no waiting vehicles is cut short
    pub fn ends_empty_green(self) -> bool {
        !matches!(self, SchedulingPolicy::FixedRoundRobin)
    }

    /// Switch between the adaptive policy and skip-empty round robin
    pub fn toggled(self) -> SchedulingPolicy {
        match self {
            SchedulingPolicy::GreedyLongestQueue => SchedulingPolicy::SkipEmptyRoundRobin,
            SchedulingPolicy::FixedRoundRobin | SchedulingPolicy::SkipEmptyRoundRobin => {
                SchedulingPolicy::GreedyLongestQueue
            }
        }
    }
}

/// Which vehicles make an approach count as "waiting"
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WaitingRule {
    /// Any vehicle that has not crossed the stop line
    NotCrossed,
    /// A not-crossed vehicle whose leading edge is inside the detection zone
    InDetectionZone,
}

/// When a vehicle on its approach counts as stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoppedRule {
    /// At or past its stop threshold, or within the moving gap of a
    /// not-crossed vehicle ahead
    AtThreshold,
    /// Held by a red or yellow light at its stop threshold, or queued within
    /// the moving gap of a vehicle ahead that is itself stopped
    Blocked,
}

/// Formula for the per-approach average delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DelayFormula {
    /// Stopped-seconds divided by crossed plus currently stopped vehicles
    PerVehicleSeen,
    /// Stopped-seconds divided by the vehicles that were ever stopped
    PerDelayedVehicle,
}

/// Green phase durations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreenTiming {
    /// Fixed seconds per approach
    Fixed([u32; 4]),
    /// Drawn uniformly from `min..=max` whenever a phase is reset
    Random { min: u32, max: u32 },
}

/// Configuration for a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Simulated seconds before the run ends
    pub total_duration: u32,
    /// Seconds between periodic reports
    pub report_interval: u32,
    pub policy: SchedulingPolicy,
    pub green: GreenTiming,
    pub yellow: u32,
    pub red: i32,
    pub allowed_kinds: Vec<VehicleKind>,
    /// Global speed multiplier in percent
    pub speed_percentage: u32,
    /// Motion steps applied per simulated second
    pub motion_substeps: u32,
    pub waiting_rule: WaitingRule,
    pub stopped_rule: StoppedRule,
    pub delay_formula: DelayFormula,
    /// Whether the built-in generator spawns arrivals each tick
    pub generate_arrivals: bool,
    /// Chance that a lane 1 or lane 2 arrival intends to turn
    pub turn_probability: f64,
    /// Relative arrival weights for East, South, West, North
    pub approach_weights: [u32; 4],
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_duration: 300,
            report_interval: 30,
            policy: SchedulingPolicy::SkipEmptyRoundRobin,
            green: GreenTiming::Fixed([DEFAULT_GREEN; 4]),
            yellow: DEFAULT_YELLOW,
            red: DEFAULT_RED,
            allowed_kinds: VehicleKind::ALL.to_vec(),
            speed_percentage: 100,
            motion_substeps: DEFAULT_MOTION_SUBSTEPS,
            waiting_rule: WaitingRule::NotCrossed,
            stopped_rule: StoppedRule::AtThreshold,
            delay_formula: DelayFormula::PerVehicleSeen,
            generate_arrivals: true,
            turn_probability: 0.4,
            approach_weights: [25; 4],
            seed: None,
        }
    }
}

impl SimConfig {
    /// Check every field, failing on the first invalid one
    pub fn validate(&self) -> ConfigResult<()> {
        positive(self.total_duration, "total duration")?;
        positive(self.report_interval, "report interval")?;
        phase_duration(self.yellow, "yellow duration")?;
        positive(self.speed_percentage, "speed percentage")?;
        positive(self.motion_substeps, "motion substeps")?;

        match self.green {
            GreenTiming::Fixed(durations) => {
                for duration in durations {
                    phase_duration(duration, "green duration")?;
                }
            }
            GreenTiming::Random { min, max } => {
                positive(min, "minimum green duration")?;
                if min > max {
                    return Err(ConfigError::MalformedRange { min, max });
                }
                phase_duration(max, "maximum green duration")?;
            }
        }

        if self.red < 0 {
            return Err(ConfigError::NegativeRed(self.red));
        }
        if self.allowed_kinds.is_empty() {
            return Err(ConfigError::NoVehicleKinds);
        }
        if !(0.0..=1.0).contains(&self.turn_probability) {
            return Err(ConfigError::TurnProbability(self.turn_probability));
        }
        if self.approach_weights.iter().all(|&w| w == 0) {
            return Err(ConfigError::ZeroApproachWeights);
        }
        Ok(())
    }

    pub fn allows(&self, kind: VehicleKind) -> bool {
        self.allowed_kinds.contains(&kind)
    }
}

/// Reject zero for a duration-like setting
pub fn positive(value: u32, what: &'static str) -> ConfigResult<u32> {
    if value == 0 {
        Err(ConfigError::NonPositive { what })
    } else {
        Ok(value)
    }
}

/// Accept a green or yellow duration between 1 s and [`MAX_PHASE_DURATION`]
pub fn phase_duration(value: u32, what: &'static str) -> ConfigResult<u32> {
    positive(value, what)?;
    if value > MAX_PHASE_DURATION {
        return Err(ConfigError::TooLong {
            what,
            value,
            max: MAX_PHASE_DURATION,
        });
    }
    Ok(value)
}
