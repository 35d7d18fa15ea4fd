//! Per-step vehicle motion
//!
//! One motion step advances every vehicle, in spawn order, by its cruise
//! speed subject to the gating rules of its current stage. All steps of a
//! tick see the same committed phase.

use log::debug;

use super::geometry::ApproachGeometry;
use super::scheduler::Phase;
use super::traffic::Traffic;
use super::types::{Maneuver, VehicleId, MOVING_GAP, ROTATION_STEP, TURN_COMPLETE};
use super::vehicle::{Vehicle, VehicleStage};

impl Traffic {
    /// Run `steps` motion steps under `phase`.
    ///
    /// `speed_factor` is the global speed percentage divided by 100.
    pub fn advance(&mut self, phase: Phase, speed_factor: f32, steps: u32) {
        for _ in 0..steps {
            self.step(phase, speed_factor);
        }
    }

    /// Move every vehicle once
    pub fn step(&mut self, phase: Phase, speed_factor: f32) {
        for index in 0..self.vehicles.len() {
            self.step_vehicle(VehicleId(index), phase, speed_factor);
        }
    }

    fn step_vehicle(&mut self, id: VehicleId, phase: Phase, speed_factor: f32) {
        let vehicle = &self.vehicles[id.0];
        let geometry = ApproachGeometry::of(vehicle.approach);
        if !vehicle.crossed && vehicle.progress.into_inner() > geometry.stop_line {
            self.mark_crossed(id);
        }

        let vehicle = &self.vehicles[id.0];
        let speed = vehicle.kind.base_speed() * speed_factor;
        match vehicle.stage() {
            VehicleStage::Approaching => {
                if self.may_approach(vehicle, phase) {
                    self.vehicles[id.0].progress += speed;
                }
            }
            VehicleStage::Turning => self.turn(id),
            VehicleStage::ClearedStraight => {
                if self.straight_clear(vehicle) {
                    self.vehicles[id.0].progress += speed;
                }
            }
            VehicleStage::ClearedTurned => {
                if self.exit_clear(vehicle) {
                    let exit_sign = geometry.exit_sign(vehicle.approach, vehicle.lane);
                    self.vehicles[id.0].lateral += exit_sign * speed;
                }
            }
        }
    }

    /// Gate for a vehicle on its approach: the signal (or its own stop
    /// threshold) must let it through, and the vehicle ahead must be clear.
    fn may_approach(&self, vehicle: &Vehicle, phase: Phase) -> bool {
        let front = vehicle.progress.into_inner();
        let signal_clear =
            front <= vehicle.stop.into_inner() || phase.is_go(vehicle.approach) || vehicle.crossed;
        if !signal_clear {
            return false;
        }
        match self.predecessor(vehicle) {
            None => true,
            Some(ahead) => ahead.started_turning() || front < ahead.rear() - MOVING_GAP,
        }
    }

    /// Gap to the previous straight-through vehicle of the lane
    fn straight_clear(&self, vehicle: &Vehicle) -> bool {
        let lane = &self.approach(vehicle.approach).lanes[vehicle.lane];
        match vehicle.exit_index.and_then(|index| lane.not_turned_before(index)) {
            None => true,
            Some(ahead) => {
                let ahead = &self.vehicles[ahead.0];
                vehicle.progress.into_inner() < ahead.rear() - MOVING_GAP
            }
        }
    }

    /// Gap to the previous vehicle that made the same turn
    fn exit_clear(&self, vehicle: &Vehicle) -> bool {
        let lane = &self.approach(vehicle.approach).lanes[vehicle.lane];
        match vehicle.exit_index.and_then(|index| lane.turned_before(index)) {
            None => true,
            Some(ahead) => {
                let ahead = &self.vehicles[ahead.0];
                vehicle.exit_progress() < ahead.exit_progress() - ahead.kind.length() - MOVING_GAP
            }
        }
    }

    /// One step of a turn maneuver; completes the turn at full rotation
    fn turn(&mut self, id: VehicleId) {
        let vehicle = &mut self.vehicles[id.0];
        let geometry = ApproachGeometry::of(vehicle.approach);
        let (along, lateral) = geometry.turn_delta(vehicle.approach, vehicle.lane);
        vehicle.rotation += ROTATION_STEP;
        vehicle.progress += along;
        vehicle.lateral += lateral;

        if vehicle.rotation >= TURN_COMPLETE {
            vehicle.turned = true;
            let state = &mut self.approaches[vehicle.approach.index()];
            vehicle.exit_index = Some(state.lanes[vehicle.lane].push_turned(id));
            let maneuver = Maneuver::for_turning_lane(vehicle.lane);
            state.maneuvers.record(maneuver);
            debug!("{:?} on {} completed {:?} turn", id, vehicle.approach, maneuver);
        }
    }

    /// Record a vehicle passing the stop line
    fn mark_crossed(&mut self, id: VehicleId) {
        let vehicle = &mut self.vehicles[id.0];
        vehicle.crossed = true;
        let state = &mut self.approaches[vehicle.approach.index()];
        state.crossed += 1;
        if !vehicle.will_turn {
            vehicle.exit_index = Some(state.lanes[vehicle.lane].push_not_turned(id));
            state.maneuvers.record(Maneuver::Straight);
        }
        debug!("{:?} crossed the {} stop line", id, vehicle.approach);
    }
}
