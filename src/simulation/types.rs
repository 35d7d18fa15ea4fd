//! Core types for the intersection simulation
//!
//! Identifiers, the four approaches, vehicle kinds and the shared gap constants.

use clap::ValueEnum;

/// A unique identifier for a simulated vehicle
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

/// One of the four compass approaches feeding the intersection.
///
/// The variant names the direction of travel: `East` vehicles enter from the
/// left edge and travel right, `South` vehicles enter from the top, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Approach {
    East,
    South,
    West,
    North,
}

impl Approach {
    /// All approaches in signal order
    pub const ALL: [Approach; 4] = [
        Approach::East,
        Approach::South,
        Approach::West,
        Approach::North,
    ];

    pub fn index(self) -> usize {
        match self {
            Approach::East => 0,
            Approach::South => 1,
            Approach::West => 2,
            Approach::North => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Approach> {
        Self::ALL.get(index).copied()
    }

    /// The approach that follows this one in round-robin order
    pub fn next(self) -> Approach {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Label used in reports ("right", "down", "left", "up")
    pub fn label(self) -> &'static str {
        match self {
            Approach::East => "right",
            Approach::South => "down",
            Approach::West => "left",
            Approach::North => "up",
        }
    }
}

impl std::fmt::Display for Approach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Type of vehicle in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum VehicleKind {
    Car,
    Bus,
    Truck,
    Bike,
}

impl VehicleKind {
    pub const ALL: [VehicleKind; 4] = [
        VehicleKind::Car,
        VehicleKind::Bus,
        VehicleKind::Truck,
        VehicleKind::Bike,
    ];

    /// Cruise distance covered in one motion step at 100% speed
    pub fn base_speed(self) -> f32 {
        match self {
            VehicleKind::Car => 2.25,
            VehicleKind::Bus => 1.8,
            VehicleKind::Truck => 1.8,
            VehicleKind::Bike => 2.5,
        }
    }

    /// Body length along the direction of travel
    pub fn length(self) -> f32 {
        match self {
            VehicleKind::Car => 40.0,
            VehicleKind::Bus => 80.0,
            VehicleKind::Truck => 70.0,
            VehicleKind::Bike => 20.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VehicleKind::Car => "car",
            VehicleKind::Bus => "bus",
            VehicleKind::Truck => "truck",
            VehicleKind::Bike => "bike",
        }
    }
}

/// The movement a vehicle made through the intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    Straight,
    Left,
    Right,
}

impl Maneuver {
    /// Lane 1 carries left turns and lane 2 right turns on every approach
    pub fn for_turning_lane(lane: usize) -> Maneuver {
        if lane == 1 {
            Maneuver::Left
        } else {
            Maneuver::Right
        }
    }
}

/// Number of lanes on each approach
pub const LANES_PER_APPROACH: usize = 3;

/// Gap left between a queued vehicle's stop threshold and the vehicle ahead
pub const STOPPING_GAP: f32 = 25.0;

/// Minimum following distance while moving
pub const MOVING_GAP: f32 = 25.0;

/// Rotation applied per motion step while turning, in degrees
pub const ROTATION_STEP: u32 = 3;

/// Rotation at which a turn is complete, in degrees
pub const TURN_COMPLETE: u32 = 90;

/// Distance upstream of the stop line inside which vehicles are detected
pub const DETECTION_ZONE: f32 = 300.0;
