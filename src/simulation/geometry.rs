//! Fixed layout of the intersection
//!
//! Positions along an approach are stored as "progress": the raw screen
//! coordinate of the vehicle's leading edge multiplied by the approach's axis
//! sign, so travel always increases progress regardless of direction.

use super::types::{Approach, LANES_PER_APPROACH};

/// Geometry of one approach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApproachGeometry {
    /// +1 when travel increases the raw coordinate, -1 otherwise
    pub axis_sign: f32,
    /// Progress of the leading edge of a freshly spawned vehicle
    pub entry: f32,
    /// Progress of the stop line; passing it marks a vehicle as crossed
    pub stop_line: f32,
    /// Stop threshold used when nothing is queued ahead
    pub default_stop: f32,
    /// Raw coordinate of each lane on the perpendicular axis
    pub lane_lateral: [f32; LANES_PER_APPROACH],
    /// Progress at which lane 1 / lane 2 vehicles start their turn
    pub turn_start: [f32; 2],
    /// Raw (dx, dy) offset applied per turning step for lane 1 / lane 2
    pub turn_step: [(f32, f32); 2],
}

const EAST: ApproachGeometry = ApproachGeometry {
    axis_sign: 1.0,
    entry: 0.0,
    stop_line: 590.0,
    default_stop: 580.0,
    lane_lateral: [348.0, 370.0, 398.0],
    turn_start: [630.0, 705.0],
    turn_step: [(2.4, -2.8), (2.0, 1.8)],
};

const SOUTH: ApproachGeometry = ApproachGeometry {
    axis_sign: 1.0,
    entry: 0.0,
    stop_line: 330.0,
    default_stop: 320.0,
    lane_lateral: [755.0, 727.0, 697.0],
    turn_start: [380.0, 450.0],
    turn_step: [(1.2, 1.8), (-2.5, 2.0)],
};

const WEST: ApproachGeometry = ApproachGeometry {
    axis_sign: -1.0,
    entry: -1400.0,
    stop_line: -800.0,
    default_stop: -810.0,
    lane_lateral: [498.0, 466.0, 436.0],
    turn_start: [-730.0, -695.0],
    turn_step: [(-1.0, 1.2), (-1.8, -2.5)],
};

const NORTH: ApproachGeometry = ApproachGeometry {
    axis_sign: -1.0,
    entry: -800.0,
    stop_line: -535.0,
    default_stop: -545.0,
    lane_lateral: [602.0, 627.0, 657.0],
    turn_start: [-485.0, -400.0],
    turn_step: [(-1.2, -1.8), (2.5, -2.0)],
};

impl ApproachGeometry {
    pub fn of(approach: Approach) -> &'static ApproachGeometry {
        match approach {
            Approach::East => &EAST,
            Approach::South => &SOUTH,
            Approach::West => &WEST,
            Approach::North => &NORTH,
        }
    }

    /// Whether travel runs along the raw x axis
    pub fn horizontal(approach: Approach) -> bool {
        matches!(approach, Approach::East | Approach::West)
    }

    /// Turn offset for a turning lane, split into (along-axis progress, lateral) deltas
    pub fn turn_delta(&self, approach: Approach, lane: usize) -> (f32, f32) {
        let (dx, dy) = self.turn_step[Self::turn_slot(lane)];
        if Self::horizontal(approach) {
            (self.axis_sign * dx, dy)
        } else {
            (self.axis_sign * dy, dx)
        }
    }

    /// Direction along the lateral axis a vehicle travels after completing its turn
    pub fn exit_sign(&self, approach: Approach, lane: usize) -> f32 {
        self.turn_delta(approach, lane).1.signum()
    }

    /// Rotation direction of the turn: lane 1 turns counter-clockwise
    pub fn rotation_sign(lane: usize) -> i32 {
        if lane == 1 {
            1
        } else {
            -1
        }
    }

    pub fn turn_zone(&self, lane: usize) -> f32 {
        self.turn_start[Self::turn_slot(lane)]
    }

    /// Convert a progress value on this approach back to a raw axis coordinate
    pub fn raw(&self, progress: f32) -> f32 {
        progress * self.axis_sign
    }

    fn turn_slot(lane: usize) -> usize {
        lane.clamp(1, 2) - 1
    }
}
