//! A single simulated vehicle
//!
//! Vehicles are never removed once spawned; crossing and turning are recorded
//! as flags so lane orderings stay stable for the whole run.

use ordered_float::OrderedFloat;

use super::geometry::ApproachGeometry;
use super::types::{Approach, VehicleId, VehicleKind, TURN_COMPLETE};

/// Stage of a vehicle's trip through the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStage {
    /// Travelling along its approach, subject to the signal and the queue
    Approaching,
    /// Rotating through the turn zone
    Turning,
    /// Past the stop line, travelling straight on
    ClearedStraight,
    /// Turn complete, travelling along the exit road
    ClearedTurned,
}

/// A vehicle in the intersection simulation
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub approach: Approach,
    pub lane: usize,
    pub will_turn: bool,
    /// Leading edge along the approach axis, increasing in the direction of travel
    pub progress: OrderedFloat<f32>,
    /// Raw coordinate on the perpendicular axis; only moves while and after turning
    pub lateral: f32,
    /// Degrees of turn completed so far
    pub rotation: u32,
    /// Progress at which the vehicle must halt unless its approach has a go light
    pub stop: OrderedFloat<f32>,
    pub crossed: bool,
    pub turned: bool,
    /// Position in the lane queue; fixed at spawn
    pub queue_index: usize,
    /// Position in the turned or not-turned ordering once the vehicle joins one
    pub exit_index: Option<usize>,
    /// Whether the vehicle has ever been counted as stopped
    pub was_stopped: bool,
}

impl Vehicle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: VehicleId,
        kind: VehicleKind,
        approach: Approach,
        lane: usize,
        will_turn: bool,
        progress: f32,
        stop: f32,
        queue_index: usize,
    ) -> Self {
        let geometry = ApproachGeometry::of(approach);
        Self {
            id,
            kind,
            approach,
            lane,
            will_turn,
            progress: OrderedFloat(progress),
            lateral: geometry.lane_lateral[lane],
            rotation: 0,
            stop: OrderedFloat(stop),
            crossed: false,
            turned: false,
            queue_index,
            exit_index: None,
            was_stopped: false,
        }
    }

    /// Progress of the trailing edge
    pub fn rear(&self) -> f32 {
        self.progress.into_inner() - self.kind.length()
    }

    /// Whether the vehicle has begun (or finished) its turn maneuver
    pub fn started_turning(&self) -> bool {
        self.rotation > 0 || self.turned
    }

    /// Position along the exit road after a turn, increasing in the direction of travel
    pub fn exit_progress(&self) -> f32 {
        let geometry = ApproachGeometry::of(self.approach);
        geometry.exit_sign(self.approach, self.lane) * self.lateral
    }

    pub fn stage(&self) -> VehicleStage {
        let geometry = ApproachGeometry::of(self.approach);
        if self.will_turn {
            if self.turned {
                VehicleStage::ClearedTurned
            } else if self.crossed && self.progress.into_inner() >= geometry.turn_zone(self.lane) {
                VehicleStage::Turning
            } else {
                VehicleStage::Approaching
            }
        } else if self.crossed {
            VehicleStage::ClearedStraight
        } else {
            VehicleStage::Approaching
        }
    }

    /// Whether the leading edge is still on the approach side of the stop line
    pub fn before_stop_line(&self) -> bool {
        self.progress.into_inner() <= ApproachGeometry::of(self.approach).stop_line
    }

    /// Raw (x, y) screen coordinates of the leading edge, for renderers
    pub fn coordinates(&self) -> (f32, f32) {
        let along = ApproachGeometry::of(self.approach).raw(self.progress.into_inner());
        if ApproachGeometry::horizontal(self.approach) {
            (along, self.lateral)
        } else {
            (self.lateral, along)
        }
    }

    /// Signed heading change in degrees, positive for counter-clockwise turns
    pub fn heading_change(&self) -> i32 {
        let rotation = self.rotation.min(TURN_COMPLETE) as i32;
        rotation * ApproachGeometry::rotation_sign(self.lane)
    }
}
