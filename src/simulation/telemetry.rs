//! Read-only snapshots of the simulation for reporting and rendering
//!
//! A [`Telemetry`] is copied out of the world at a tick boundary, so
//! collaborators never observe a half-applied tick.

use std::fmt;

use super::scheduler::Phase;
use super::signal::LightState;
use super::types::Approach;

/// Countdown state of one signal head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSnapshot {
    pub approach: Approach,
    pub light: LightState,
    pub red: i32,
    pub yellow: u32,
    pub green: u32,
    pub label: String,
}

/// Counters for one approach
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApproachTelemetry {
    pub crossed: usize,
    pub straight: usize,
    pub left: usize,
    pub right: usize,
    /// Vehicles stopped at the moment of the snapshot
    pub stopped: usize,
    pub stopped_seconds: u64,
    pub average_delay: f64,
}

/// Point-in-time view of the whole intersection
#[derive(Debug, Clone, PartialEq)]
pub struct Telemetry {
    /// Simulated seconds elapsed
    pub elapsed: u32,
    pub phase: Phase,
    pub signals: Vec<SignalSnapshot>,
    pub approaches: [ApproachTelemetry; 4],
}

impl Telemetry {
    pub fn approach(&self, approach: Approach) -> &ApproachTelemetry {
        &self.approaches[approach.index()]
    }

    pub fn signal(&self, approach: Approach) -> &SignalSnapshot {
        &self.signals[approach.index()]
    }

    /// Stopped vehicles per approach, indexed by [`Approach::index`]
    pub fn stopped_counts(&self) -> [usize; 4] {
        self.approaches.map(|a| a.stopped)
    }

    pub fn total_crossed(&self) -> usize {
        self.approaches.iter().map(|a| a.crossed).sum()
    }
}

/// Average of `stopped_seconds` over `vehicles`, defined as 0 for no vehicles
pub fn average_delay(stopped_seconds: u64, vehicles: usize) -> f64 {
    if vehicles == 0 {
        0.0
    } else {
        stopped_seconds as f64 / vehicles as f64
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time: {}s", self.elapsed)?;
        writeln!(f, "Phase: {}", self.phase)?;
        writeln!(f, "Direction-wise Vehicle Counts:")?;
        for approach in Approach::ALL {
            let a = self.approach(approach);
            writeln!(
                f,
                "{:<6} Total={} (Straight={}, Left={}, Right={})",
                format!("{}:", approach.label()),
                a.crossed,
                a.straight,
                a.left,
                a.right
            )?;
        }
        writeln!(f, "Average Delays:")?;
        for approach in Approach::ALL {
            writeln!(
                f,
                "{:<6} {:.2}",
                format!("{}:", approach.label()),
                self.approach(approach).average_delay
            )?;
        }
        writeln!(f, "Stopped Vehicles:")?;
        for approach in Approach::ALL {
            writeln!(
                f,
                "{:<6} {}",
                format!("{}:", approach.label()),
                self.approach(approach).stopped
            )?;
        }
        writeln!(f, "Signals:")?;
        for signal in &self.signals {
            writeln!(
                f,
                "{:<6} {:?} {}",
                format!("{}:", signal.approach.label()),
                signal.light,
                signal.label
            )?;
        }
        write!(f, "----------------------------------------")
    }
}
