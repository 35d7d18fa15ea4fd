//! Main simulation world that ties everything together
//!
//! `SimWorld` is the single simulation context: it owns the traffic, the
//! scheduler and the arrival generator and advances them in one tick loop,
//! so every part of a tick sees the same committed phase.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};

use super::config::{
    phase_duration, positive, ConfigResult, DelayFormula, GreenTiming, SchedulingPolicy, SimConfig,
};
use super::generator::{SpawnRequest, VehicleGenerator};
use super::report::ReportSink;
use super::scheduler::{DecisionPolicy, Phase, PhaseEvent, Scheduler};
use super::telemetry::{average_delay, ApproachTelemetry, SignalSnapshot, Telemetry};
use super::traffic::Traffic;
use super::types::{Approach, VehicleId, LANES_PER_APPROACH};

/// Cloneable handle for ending a run from outside the tick loop
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,

    /// Vehicles and lane queues
    traffic: Traffic,

    /// Signal phase state machine
    scheduler: Scheduler,

    /// Built-in arrival generator, if enabled
    generator: Option<VehicleGenerator>,

    /// Simulated seconds elapsed
    elapsed: u32,

    /// Elapsed time of the last periodic report
    last_report: u32,

    stop: StopHandle,
}

impl SimWorld {
    /// Create a world from a configuration, rejecting invalid settings
    pub fn new(config: SimConfig) -> ConfigResult<Self> {
        config.validate()?;
        let generator = config
            .generate_arrivals
            .then(|| VehicleGenerator::new(&config));
        Ok(Self {
            traffic: Traffic::new(),
            scheduler: Scheduler::new(&config),
            generator,
            elapsed: 0,
            last_report: 0,
            stop: StopHandle::default(),
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn traffic(&self) -> &Traffic {
        &self.traffic
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Whether the run has reached its duration or a stop was requested
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.config.total_duration || self.stop.is_stop_requested()
    }

    /// Install a decision policy that overrides the built-in phase choices
    pub fn set_decision_policy(&mut self, decision: Box<dyn DecisionPolicy>) {
        self.scheduler.set_decision_policy(decision);
    }

    /// Go back to the configured scheduling policy
    pub fn clear_decision_policy(&mut self) {
        self.scheduler.clear_decision_policy();
    }

    /// Place a new vehicle at the back of its lane.
    ///
    /// Requests with a disallowed kind, a lane outside 0..=2, or turn intent
    /// on the straight-only lane 0 are ignored and return `None`.
    pub fn spawn(&mut self, request: SpawnRequest) -> Option<VehicleId> {
        if !self.config.allows(request.kind) {
            debug!("Ignoring spawn of disallowed kind {}", request.kind.label());
            return None;
        }
        if request.lane >= LANES_PER_APPROACH || (request.lane == 0 && request.will_turn) {
            debug!(
                "Ignoring spawn on {} lane {} (turn: {})",
                request.approach, request.lane, request.will_turn
            );
            return None;
        }
        Some(self.traffic.spawn(request))
    }

    /// Advance the simulation by one second.
    ///
    /// Order within a tick: phase countdowns, arrivals, motion, delay
    /// accounting. Returns the phase boundary crossed this tick, if any.
    pub fn tick(&mut self) -> Option<PhaseEvent> {
        let snapshot = self.telemetry();
        let waiting = self.traffic.waiting(self.config.waiting_rule);
        let event = self.scheduler.tick(&snapshot, waiting);
        if let Some(PhaseEvent::GreenEnded(approach)) = event {
            self.traffic.reset_stops(approach);
        }

        let arrival = self
            .generator
            .as_mut()
            .and_then(VehicleGenerator::next_arrival);
        if let Some(request) = arrival {
            self.spawn(request);
        }

        let speed_factor = self.config.speed_percentage as f32 / 100.0;
        self.traffic
            .advance(self.scheduler.phase(), speed_factor, self.config.motion_substeps);
        self.traffic
            .accumulate_delay(self.scheduler.phase(), self.config.stopped_rule);

        self.elapsed += 1;
        event
    }

    /// Run until the configured duration elapses or a stop is requested.
    ///
    /// Reports go to `sink` every report interval and once more at the end;
    /// the final snapshot is returned.
    pub fn run(&mut self, sink: &mut dyn ReportSink) -> Telemetry {
        info!(
            "Starting simulation: {}s, policy {:?}, report every {}s",
            self.config.total_duration, self.config.policy, self.config.report_interval
        );

        while !self.is_finished() {
            self.tick();
            let snapshot = self.telemetry();
            sink.on_tick(&snapshot);
            if self.elapsed - self.last_report >= self.config.report_interval {
                self.last_report = self.elapsed;
                deliver(sink, &snapshot);
            }
        }

        let last = self.telemetry();
        deliver(sink, &last);
        sink.on_sim_end(&last);

        info!("=== SIMULATION COMPLETE ===");
        info!("Elapsed time: {}s", last.elapsed);
        info!("Total vehicles spawned: {}", self.traffic.vehicles().len());
        info!("Total vehicles crossed: {}", last.total_crossed());
        last
    }

    /// Point-in-time snapshot for reporting and decision policies
    pub fn telemetry(&self) -> Telemetry {
        let stopped = self
            .traffic
            .stopped_counts(self.scheduler.phase(), self.config.stopped_rule);
        let approaches = Approach::ALL.map(|approach| {
            let state = self.traffic.approach(approach);
            let stopped = stopped[approach.index()];
            let vehicles = match self.config.delay_formula {
                DelayFormula::PerVehicleSeen => state.crossed + stopped,
                DelayFormula::PerDelayedVehicle => state.delayed_vehicles,
            };
            ApproachTelemetry {
                crossed: state.crossed,
                straight: state.maneuvers.straight,
                left: state.maneuvers.left,
                right: state.maneuvers.right,
                stopped,
                stopped_seconds: state.stopped_seconds,
                average_delay: average_delay(state.stopped_seconds, vehicles),
            }
        });

        let signals = Approach::ALL
            .iter()
            .map(|&approach| {
                let signal = self.scheduler.signal(approach);
                let light = self.scheduler.light(approach);
                SignalSnapshot {
                    approach,
                    light,
                    red: signal.red,
                    yellow: signal.yellow,
                    green: signal.green,
                    label: signal.label(light),
                }
            })
            .collect();

        Telemetry {
            elapsed: self.elapsed,
            phase: self.scheduler.phase(),
            signals,
            approaches,
        }
    }

    /// Set one approach's green time, taking effect from the next tick.
    ///
    /// Under `GreenTiming::Random` only the current countdown changes; the
    /// next green of that approach is drawn from the range again.
    pub fn set_green_duration(&mut self, approach: Approach, seconds: u32) -> ConfigResult<()> {
        phase_duration(seconds, "green duration")?;
        match &mut self.config.green {
            GreenTiming::Fixed(durations) => durations[approach.index()] = seconds,
            GreenTiming::Random { min, max } => warn!(
                "Green time for {} is drawn from {}..={}s; {}s lasts until its next green",
                approach, min, max, seconds
            ),
        }
        self.scheduler.set_green(approach, seconds);
        info!("Green time for {} set to {}s", approach, seconds);
        Ok(())
    }

    /// Set the yellow time of every approach
    pub fn set_yellow_duration(&mut self, seconds: u32) -> ConfigResult<()> {
        self.config.yellow = phase_duration(seconds, "yellow duration")?;
        self.scheduler.set_yellow(seconds);
        info!("Yellow time set to {}s", seconds);
        Ok(())
    }

    pub fn set_speed_percentage(&mut self, percentage: u32) -> ConfigResult<()> {
        self.config.speed_percentage = positive(percentage, "speed percentage")?;
        info!("Speed set to {}%", percentage);
        Ok(())
    }

    pub fn set_total_duration(&mut self, seconds: u32) -> ConfigResult<()> {
        self.config.total_duration = positive(seconds, "total duration")?;
        if seconds <= self.elapsed {
            warn!(
                "Total duration {}s is not after the elapsed {}s; the run ends now",
                seconds, self.elapsed
            );
        }
        Ok(())
    }

    pub fn set_policy(&mut self, policy: SchedulingPolicy) {
        self.config.policy = policy;
        self.scheduler.set_policy(policy);
        info!("Scheduling policy set to {:?}", policy);
    }

    /// Flip between the adaptive and round-robin policies; returns the new one
    pub fn toggle_policy(&mut self) -> SchedulingPolicy {
        let policy = self.config.policy.toggled();
        self.set_policy(policy);
        policy
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Intersection Summary ===");
        println!("Time: {}s, phase: {}", self.elapsed, self.phase());
        println!("Vehicles spawned: {}", self.traffic.vehicles().len());
        println!();
        println!("--- Approaches ---");
        let telemetry = self.telemetry();
        for approach in Approach::ALL {
            let state = self.traffic.approach(approach);
            let stats = telemetry.approach(approach);
            let signal = telemetry.signal(approach);
            let lead = state
                .all_vehicles()
                .filter_map(|id| self.traffic.vehicle(id))
                .filter(|vehicle| !vehicle.crossed)
                .map(|vehicle| vehicle.progress)
                .max();
            println!(
                "  {:<5} {:?} [{}]: spawned={}, crossed={}, stopped={}, avg delay={:.2}, lead={}",
                approach.label(),
                signal.light,
                signal.label,
                state.vehicle_count(),
                stats.crossed,
                stats.stopped,
                stats.average_delay,
                lead.map_or_else(|| "-".to_string(), |p| format!("{:.1}", p.into_inner()))
            );
        }
    }
}

/// Hand a report to the sink; a failing sink never stops the simulation
fn deliver(sink: &mut dyn ReportSink, telemetry: &Telemetry) {
    if let Err(err) = sink.report(telemetry) {
        warn!("Failed to write report at {}s: {:#}", telemetry.elapsed, err);
    }
}
