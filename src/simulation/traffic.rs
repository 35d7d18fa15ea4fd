//! Vehicles and approaches of the intersection
//!
//! `Traffic` owns every vehicle and the four approaches. Spawning and the
//! stateless queries used by the scheduler and by reporting live here; the
//! per-step motion rules are in the `motion` module.

use log::debug;
use ordered_float::OrderedFloat;

use super::approach::ApproachState;
use super::config::{StoppedRule, WaitingRule};
use super::generator::SpawnRequest;
use super::geometry::ApproachGeometry;
use super::scheduler::Phase;
use super::types::{
    Approach, VehicleId, DETECTION_ZONE, LANES_PER_APPROACH, MOVING_GAP, STOPPING_GAP,
};
use super::vehicle::Vehicle;

/// All vehicles and lane queues of the intersection
#[derive(Debug, Clone)]
pub struct Traffic {
    /// Every vehicle ever spawned, indexed by `VehicleId`
    pub(crate) vehicles: Vec<Vehicle>,
    pub(crate) approaches: [ApproachState; 4],
}

impl Default for Traffic {
    fn default() -> Self {
        Self::new()
    }
}

impl Traffic {
    pub fn new() -> Self {
        Self {
            vehicles: Vec::new(),
            approaches: Approach::ALL.map(ApproachState::new),
        }
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn approach(&self, approach: Approach) -> &ApproachState {
        &self.approaches[approach.index()]
    }

    /// The vehicle immediately ahead in the same lane, if any
    pub fn predecessor(&self, vehicle: &Vehicle) -> Option<&Vehicle> {
        self.approach(vehicle.approach).lanes[vehicle.lane]
            .predecessor(vehicle.queue_index)
            .and_then(|id| self.vehicle(id))
    }

    /// Append a vehicle to the back of its lane.
    ///
    /// The request must already be validated. The new vehicle is placed a
    /// stopping gap behind the last vehicle of the lane (or at the lane entry),
    /// and its stop threshold queues it behind a vehicle that has not crossed.
    pub fn spawn(&mut self, request: SpawnRequest) -> VehicleId {
        let geometry = ApproachGeometry::of(request.approach);
        let id = VehicleId(self.vehicles.len());

        let last = self.approaches[request.approach.index()].lanes[request.lane]
            .last()
            .map(|last| &self.vehicles[last.0]);
        let (progress, stop) = match last {
            Some(ahead) => {
                let progress = geometry.entry.min(ahead.rear() - STOPPING_GAP);
                let stop = if ahead.crossed {
                    geometry.default_stop
                } else {
                    ahead.stop.into_inner() - ahead.kind.length() - STOPPING_GAP
                };
                (progress, stop)
            }
            None => (geometry.entry, geometry.default_stop),
        };

        let queue_index = self.approaches[request.approach.index()].lanes[request.lane].push(id);
        self.vehicles.push(Vehicle::new(
            id,
            request.kind,
            request.approach,
            request.lane,
            request.will_turn,
            progress,
            stop,
            queue_index,
        ));
        debug!(
            "Spawned {} {:?} on {} lane {} (turn: {}) at {:.1}, stop {:.1}",
            request.kind.label(),
            id,
            request.approach,
            request.lane,
            request.will_turn,
            progress,
            stop
        );
        id
    }

    /// Put every vehicle of an approach back on the default stop threshold
    pub fn reset_stops(&mut self, approach: Approach) {
        let default_stop = self.approach(approach).geometry().default_stop;
        for lane in 0..LANES_PER_APPROACH {
            for id in self.approaches[approach.index()].lanes[lane].vehicles() {
                self.vehicles[id.0].stop = OrderedFloat(default_stop);
            }
        }
    }

    /// Which vehicles are stopped under `phase`, indexed by `VehicleId`.
    ///
    /// A vehicle is only ever stopped while it has not crossed and is still
    /// before the stop line; `rule` decides what holds it there. Recomputed
    /// from positions on every call, walking each lane front to back.
    pub fn stopped_flags(&self, phase: Phase, rule: StoppedRule) -> Vec<bool> {
        let mut flags = vec![false; self.vehicles.len()];
        for state in &self.approaches {
            let go = phase.is_go(state.approach);
            for lane in &state.lanes {
                let mut ahead: Option<(&Vehicle, bool)> = None;
                for id in lane.vehicles() {
                    let vehicle = &self.vehicles[id.0];
                    let held = match rule {
                        StoppedRule::AtThreshold => {
                            at_threshold(vehicle) || within_gap(vehicle, ahead.map(|(v, _)| v))
                        }
                        StoppedRule::Blocked => {
                            (!go && at_threshold(vehicle))
                                || within_gap(vehicle, ahead.filter(|&(_, s)| s).map(|(v, _)| v))
                        }
                    };
                    let stopped = !vehicle.crossed && vehicle.before_stop_line() && held;
                    flags[id.0] = stopped;
                    ahead = Some((vehicle, stopped));
                }
            }
        }
        flags
    }

    /// Stopped vehicles per approach
    pub fn stopped_counts(&self, phase: Phase, rule: StoppedRule) -> [usize; 4] {
        let mut counts = [0; 4];
        for (vehicle, stopped) in self.vehicles.iter().zip(self.stopped_flags(phase, rule)) {
            if stopped {
                counts[vehicle.approach.index()] += 1;
            }
        }
        counts
    }

    /// Add one stopped-second per stopped vehicle to its approach
    pub fn accumulate_delay(&mut self, phase: Phase, rule: StoppedRule) {
        let flags = self.stopped_flags(phase, rule);
        for (vehicle, stopped) in self.vehicles.iter_mut().zip(flags) {
            if !stopped {
                continue;
            }
            let state = &mut self.approaches[vehicle.approach.index()];
            state.stopped_seconds += 1;
            if !vehicle.was_stopped {
                vehicle.was_stopped = true;
                state.delayed_vehicles += 1;
            }
        }
    }

    /// Whether each approach has vehicles waiting to cross under `rule`
    pub fn waiting(&self, rule: WaitingRule) -> [bool; 4] {
        let mut waiting = [false; 4];
        for vehicle in &self.vehicles {
            if vehicle.crossed {
                continue;
            }
            let counts = match rule {
                WaitingRule::NotCrossed => true,
                WaitingRule::InDetectionZone => {
                    let geometry = ApproachGeometry::of(vehicle.approach);
                    vehicle.progress.into_inner() >= geometry.stop_line - DETECTION_ZONE
                }
            };
            if counts {
                waiting[vehicle.approach.index()] = true;
            }
        }
        waiting
    }
}

/// Leading edge at or past the vehicle's own stop threshold
fn at_threshold(vehicle: &Vehicle) -> bool {
    vehicle.progress >= vehicle.stop
}

/// Within the moving gap of a not-crossed vehicle ahead
fn within_gap(vehicle: &Vehicle, ahead: Option<&Vehicle>) -> bool {
    ahead.is_some_and(|ahead| {
        !ahead.crossed && vehicle.progress.into_inner() >= ahead.rear() - MOVING_GAP
    })
}
