//! Signal-phase scheduler
//!
//! Exactly one approach is green or yellow at any time; every other approach
//! is red. The scheduler advances once per simulated second and reports phase
//! boundaries to the world so it can apply their side effects to the queues.

use std::fmt;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::{GreenTiming, SchedulingPolicy, SimConfig, MAX_PHASE_DURATION};
use super::signal::{LightState, Signal};
use super::telemetry::Telemetry;
use super::types::Approach;

/// Which approach holds the right of way, and in which colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Green(Approach),
    Yellow(Approach),
}

impl Phase {
    /// The approach that is green or yellow
    pub fn approach(self) -> Approach {
        match self {
            Phase::Green(approach) | Phase::Yellow(approach) => approach,
        }
    }

    pub fn light_for(self, approach: Approach) -> LightState {
        match self {
            Phase::Green(active) if active == approach => LightState::Green,
            Phase::Yellow(active) if active == approach => LightState::Yellow,
            _ => LightState::Red,
        }
    }

    /// Whether vehicles on `approach` may pass their stop threshold
    pub fn is_go(self, approach: Approach) -> bool {
        self == Phase::Green(approach)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Green(approach) => write!(f, "GREEN({})", approach),
            Phase::Yellow(approach) => write!(f, "YELLOW({})", approach),
        }
    }
}

/// Phase boundary crossed during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The approach's green ran out (or was cut short) and it is now yellow
    GreenEnded(Approach),
    /// The yellow of `from` ran out and `to` is now green
    YellowEnded { from: Approach, to: Approach },
}

/// Pluggable decision policy consulted at phase boundaries.
///
/// When installed it replaces the built-in choice of the next approach, and
/// may override the green duration the chosen approach receives.
pub trait DecisionPolicy {
    /// Pick the approach that turns green after `current`
    fn choose_next_approach(&mut self, telemetry: &Telemetry, current: Approach) -> Approach;

    /// Seconds of green for `approach`; `None` keeps the configured duration
    fn choose_green_duration(&mut self, _telemetry: &Telemetry, _approach: Approach) -> Option<u32> {
        None
    }
}

/// Next approach in round-robin order that has waiting vehicles.
///
/// Scans `current+1` through `current+4` (the current approach last) and
/// falls back to `current+1` when nobody is waiting.
pub fn round_robin_with_skip(current: Approach, waiting: [bool; 4]) -> Approach {
    (1..=Approach::ALL.len())
        .filter_map(|offset| Approach::from_index((current.index() + offset) % Approach::ALL.len()))
        .find(|candidate| waiting[candidate.index()])
        .unwrap_or_else(|| current.next())
}

/// Approach other than `current` with the most stopped vehicles.
///
/// Ties go to the lowest index; when nothing is stopped anywhere else the
/// next approach in order is chosen.
pub fn greedy_longest_queue(current: Approach, stopped: [usize; 4]) -> Approach {
    let mut best: Option<Approach> = None;
    let mut best_count = 0;
    for candidate in Approach::ALL {
        if candidate == current {
            continue;
        }
        let count = stopped[candidate.index()];
        if count > best_count {
            best = Some(candidate);
            best_count = count;
        }
    }
    best.unwrap_or_else(|| current.next())
}

/// The signal-phase state machine
pub struct Scheduler {
    phase: Phase,
    signals: [Signal; 4],
    policy: SchedulingPolicy,
    green: GreenTiming,
    yellow: u32,
    red: i32,
    /// Optional seeded RNG for reproducible random green durations
    rng: Option<StdRng>,
    decision: Option<Box<dyn DecisionPolicy>>,
}

impl Scheduler {
    /// Build the initial `GREEN(East)` state from a validated configuration
    pub fn new(config: &SimConfig) -> Self {
        let mut scheduler = Self {
            phase: Phase::Green(Approach::East),
            signals: std::array::from_fn(|_| Signal::new(config.red, config.yellow, 1)),
            policy: config.policy,
            green: config.green,
            yellow: config.yellow,
            red: config.red,
            rng: config.seed.map(StdRng::seed_from_u64),
            decision: None,
        };

        for approach in Approach::ALL {
            let green = scheduler.draw_green(approach);
            scheduler.signals[approach.index()].green = green;
        }

        let first = &scheduler.signals[Approach::East.index()];
        let second_red = red_until_next_green(first);
        scheduler.signals[Approach::East.index()].red = 0;
        scheduler.signals[Approach::South.index()].red = second_red;
        scheduler
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    pub fn signal(&self, approach: Approach) -> &Signal {
        &self.signals[approach.index()]
    }

    pub fn light(&self, approach: Approach) -> LightState {
        self.phase.light_for(approach)
    }

    pub fn set_decision_policy(&mut self, decision: Box<dyn DecisionPolicy>) {
        self.decision = Some(decision);
    }

    pub fn clear_decision_policy(&mut self) {
        self.decision = None;
    }

    pub fn set_policy(&mut self, policy: SchedulingPolicy) {
        self.policy = policy;
    }

    /// Change one approach's green time; also restarts its current countdown
    pub fn set_green(&mut self, approach: Approach, seconds: u32) {
        if let GreenTiming::Fixed(durations) = &mut self.green {
            durations[approach.index()] = seconds;
        }
        self.signals[approach.index()].green = seconds;
    }

    /// Change the yellow time of every approach
    pub fn set_yellow(&mut self, seconds: u32) {
        self.yellow = seconds;
        for signal in &mut self.signals {
            signal.yellow = seconds;
        }
    }

    /// Advance every countdown by one second.
    ///
    /// `waiting` holds, per approach index, whether the approach has vehicles
    /// waiting to cross; `telemetry` is the snapshot of the previous tick.
    pub fn tick(&mut self, telemetry: &Telemetry, waiting: [bool; 4]) -> Option<PhaseEvent> {
        let active = self.phase.approach();
        for approach in Approach::ALL {
            if approach != active {
                self.signals[approach.index()].count_down(LightState::Red);
            }
        }

        match self.phase {
            Phase::Green(approach) => {
                let signal = &mut self.signals[approach.index()];
                let mut expired = signal.count_down(LightState::Green);
                if !expired && self.policy.ends_empty_green() && !waiting[approach.index()] {
                    debug!("Ending empty green for {} with {}s left", approach, signal.green);
                    signal.green = 0;
                    expired = true;
                }
                if expired {
                    self.phase = Phase::Yellow(approach);
                    debug!("Phase {}", self.phase);
                    return Some(PhaseEvent::GreenEnded(approach));
                }
            }
            Phase::Yellow(approach) => {
                if self.signals[approach.index()].count_down(LightState::Yellow) {
                    let next = self.select_next(approach, telemetry, waiting);
                    self.reset_signal(approach);

                    let chosen = self
                        .decision
                        .as_mut()
                        .and_then(|decision| decision.choose_green_duration(telemetry, next));
                    if let Some(seconds) = chosen {
                        self.signals[next.index()].green = seconds.clamp(1, MAX_PHASE_DURATION);
                    }

                    let signal = &mut self.signals[next.index()];
                    signal.red = red_until_next_green(signal);
                    self.phase = Phase::Green(next);
                    info!(
                        "Phase {} for {}s (previous: {})",
                        self.phase, self.signals[next.index()].green, approach
                    );
                    return Some(PhaseEvent::YellowEnded {
                        from: approach,
                        to: next,
                    });
                }
            }
        }
        None
    }

    fn select_next(&mut self, current: Approach, telemetry: &Telemetry, waiting: [bool; 4]) -> Approach {
        if let Some(decision) = self.decision.as_mut() {
            return decision.choose_next_approach(telemetry, current);
        }
        match self.policy {
            SchedulingPolicy::FixedRoundRobin => current.next(),
            SchedulingPolicy::SkipEmptyRoundRobin => round_robin_with_skip(current, waiting),
            SchedulingPolicy::GreedyLongestQueue => {
                greedy_longest_queue(current, telemetry.stopped_counts())
            }
        }
    }

    /// Restore an approach's countdowns to their configured values
    fn reset_signal(&mut self, approach: Approach) {
        let green = self.draw_green(approach);
        let signal = &mut self.signals[approach.index()];
        signal.green = green;
        signal.yellow = self.yellow;
        signal.red = self.red;
    }

    fn draw_green(&mut self, approach: Approach) -> u32 {
        match self.green {
            GreenTiming::Fixed(durations) => durations[approach.index()],
            GreenTiming::Random { min, max } => match &mut self.rng {
                Some(rng) => rng.random_range(min..=max),
                None => rand::rng().random_range(min..=max),
            },
        }
    }
}

/// Red countdown shown while `signal`'s green and yellow run
fn red_until_next_green(signal: &Signal) -> i32 {
    i32::try_from(signal.yellow.saturating_add(signal.green)).unwrap_or(i32::MAX)
}
