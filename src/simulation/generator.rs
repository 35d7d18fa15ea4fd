//! Random vehicle arrivals

use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use super::config::SimConfig;
use super::types::{Approach, VehicleKind};

/// A request to place a new vehicle at the back of a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnRequest {
    pub kind: VehicleKind,
    pub approach: Approach,
    pub lane: usize,
    pub will_turn: bool,
}

impl SpawnRequest {
    pub fn straight(kind: VehicleKind, approach: Approach, lane: usize) -> Self {
        Self {
            kind,
            approach,
            lane,
            will_turn: false,
        }
    }

    /// Build a request from raw indices as handed over by an external
    /// generator; an approach index outside 0..4 yields `None`
    pub fn from_indices(
        kind: VehicleKind,
        approach: usize,
        lane: usize,
        will_turn: bool,
    ) -> Option<Self> {
        Approach::from_index(approach).map(|approach| Self {
            kind,
            approach,
            lane,
            will_turn,
        })
    }
}

/// Produces one arrival per simulated second
pub struct VehicleGenerator {
    kinds: Vec<VehicleKind>,
    turn_probability: f64,
    approach_weights: [u32; 4],
    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl VehicleGenerator {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            kinds: config.allowed_kinds.clone(),
            turn_probability: config.turn_probability,
            approach_weights: config.approach_weights,
            // Offset so arrivals and green draws don't share a stream
            rng: config
                .seed
                .map(|seed| StdRng::seed_from_u64(seed.wrapping_add(1))),
        }
    }

    /// Draw the next arrival, or `None` if no kinds are configured
    pub fn next_arrival(&mut self) -> Option<SpawnRequest> {
        let kind = match &mut self.rng {
            Some(rng) => self.kinds.choose(rng),
            None => self.kinds.choose(&mut rand::rng()),
        }
        .copied()?;

        let lane: u32 = self.random_range(1..=2);
        let will_turn = self.random_bool(self.turn_probability);
        let approach = self.pick_approach();

        Some(SpawnRequest {
            kind,
            approach,
            lane: lane as usize,
            will_turn,
        })
    }

    fn pick_approach(&mut self) -> Approach {
        let total: u64 = self.approach_weights.iter().map(|&w| u64::from(w)).sum();
        let mut roll = self.random_range(0..total.max(1));
        for approach in Approach::ALL {
            let weight = u64::from(self.approach_weights[approach.index()]);
            if roll < weight {
                return approach;
            }
            roll -= weight;
        }
        Approach::North
    }

    fn random_range<T: SampleUniform, R: SampleRange<T>>(&mut self, range: R) -> T {
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    fn random_bool(&mut self, probability: f64) -> bool {
        match &mut self.rng {
            Some(rng) => rng.random_bool(probability),
            None => rand::rng().random_bool(probability),
        }
    }
}
