//! Lane queues and per-approach bookkeeping

use super::geometry::ApproachGeometry;
use super::types::{Approach, Maneuver, VehicleId, LANES_PER_APPROACH};

/// Vehicles of one (approach, lane) in spawn order.
#[derive(Debug, Clone)]
pub struct LaneQueue {
    /// Every vehicle that has entered the lane, oldest first
    vehicles: Vec<VehicleId>,
    /// Straight-through vehicles in the order they crossed the stop line
    not_turned: Vec<VehicleId>,
    /// Turning vehicles in the order they completed their turn
    turned: Vec<VehicleId>,
}

impl LaneQueue {
    fn new() -> Self {
        Self {
            vehicles: Vec::new(),
            not_turned: Vec::new(),
            turned: Vec::new(),
        }
    }

    /// Append a vehicle and return its queue index
    pub fn push(&mut self, id: VehicleId) -> usize {
        self.vehicles.push(id);
        self.vehicles.len() - 1
    }

    /// Record a crossed straight-through vehicle; returns its exit index
    pub fn push_not_turned(&mut self, id: VehicleId) -> usize {
        self.not_turned.push(id);
        self.not_turned.len() - 1
    }

    /// Record a vehicle that completed its turn; returns its exit index
    pub fn push_turned(&mut self, id: VehicleId) -> usize {
        self.turned.push(id);
        self.turned.len() - 1
    }

    pub fn vehicles(&self) -> &[VehicleId] {
        &self.vehicles
    }

    pub fn last(&self) -> Option<VehicleId> {
        self.vehicles.last().copied()
    }

    /// The vehicle immediately ahead of `index` in spawn order
    pub fn predecessor(&self, index: usize) -> Option<VehicleId> {
        index.checked_sub(1).and_then(|i| self.vehicles.get(i).copied())
    }

    pub fn not_turned_before(&self, exit_index: usize) -> Option<VehicleId> {
        exit_index
            .checked_sub(1)
            .and_then(|i| self.not_turned.get(i).copied())
    }

    pub fn turned_before(&self, exit_index: usize) -> Option<VehicleId> {
        exit_index
            .checked_sub(1)
            .and_then(|i| self.turned.get(i).copied())
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

/// Completed movements through the intersection for one approach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManeuverCounts {
    pub straight: usize,
    pub left: usize,
    pub right: usize,
}

impl ManeuverCounts {
    pub fn record(&mut self, maneuver: Maneuver) {
        match maneuver {
            Maneuver::Straight => self.straight += 1,
            Maneuver::Left => self.left += 1,
            Maneuver::Right => self.right += 1,
        }
    }
}

/// One of the four approaches with its lanes and counters
#[derive(Debug, Clone)]
pub struct ApproachState {
    pub approach: Approach,
    pub lanes: [LaneQueue; LANES_PER_APPROACH],
    /// Vehicles that have passed the stop line
    pub crossed: usize,
    pub maneuvers: ManeuverCounts,
    /// Sum over ticks of the number of stopped vehicles
    pub stopped_seconds: u64,
    /// Distinct vehicles that have been stopped at least once
    pub delayed_vehicles: usize,
}

impl ApproachState {
    pub fn new(approach: Approach) -> Self {
        Self {
            approach,
            lanes: [LaneQueue::new(), LaneQueue::new(), LaneQueue::new()],
            crossed: 0,
            maneuvers: ManeuverCounts::default(),
            stopped_seconds: 0,
            delayed_vehicles: 0,
        }
    }

    pub fn geometry(&self) -> &'static ApproachGeometry {
        ApproachGeometry::of(self.approach)
    }

    /// Total vehicles spawned on this approach
    pub fn vehicle_count(&self) -> usize {
        self.lanes.iter().map(LaneQueue::len).sum()
    }

    pub fn all_vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.lanes.iter().flat_map(|lane| lane.vehicles().iter().copied())
    }
}
