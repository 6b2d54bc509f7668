//! Ball state store
//!
//! Structure-of-arrays over a dense index space. Index `i` names the same
//! ball for the lifetime of the store; balls are never added, removed or
//! reordered after spawning.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use crate::settings::SimulationConfig;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BallStoreError {
    #[error("{positions} positions but {velocities} velocities")]
    LengthMismatch { positions: usize, velocities: usize },
}

/// Mutable borrow of every array at once, for the stages
pub struct BallsMut<'a> {
    pub positions: &'a mut [Vec3],
    pub velocities: &'a mut [Vec3],
    pub pending_deltas: &'a mut [Vec3],
    pub radii: &'a [f32],
}

/// Position, velocity, pending velocity delta and radius per ball
#[derive(Debug, Clone)]
pub struct BallStore {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    /// Written by the contact stage, drained by the apply stage
    pending_deltas: Vec<Vec3>,
    /// Fixed after creation
    radii: Vec<f32>,
}

impl BallStore {
    /// Store from explicit state; all balls share `radius`
    pub fn from_parts(
        positions: Vec<Vec3>,
        velocities: Vec<Vec3>,
        radius: f32,
    ) -> Result<Self, BallStoreError> {
        if positions.len() != velocities.len() {
            return Err(BallStoreError::LengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        Ok(Self::filled(positions, velocities, radius))
    }

    fn filled(positions: Vec<Vec3>, velocities: Vec<Vec3>, radius: f32) -> Self {
        let count = positions.len();
        Self {
            positions,
            velocities,
            pending_deltas: vec![Vec3::ZERO; count],
            radii: vec![radius; count],
        }
    }

    /// Spawn `config.ball_count` balls with seeded random positions and velocities
    pub fn spawn(config: &SimulationConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let count = config.ball_count;
        let min = config.spawn.min;
        let max = config.spawn.max;
        let range = config.initial_velocity_range;

        let mut positions = Vec::with_capacity(count);
        let mut velocities = Vec::with_capacity(count);
        for _ in 0..count {
            positions.push(Vec3::new(
                rng.random_range(min.x..=max.x),
                rng.random_range(min.y..=max.y),
                rng.random_range(min.z..=max.z),
            ));
            velocities.push(Vec3::new(
                rng.random_range(-range.x..=range.x),
                rng.random_range(-range.y..=range.y),
                rng.random_range(-range.z..=range.z),
            ));
        }

        Self::filled(positions, velocities, config.ball_radius)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn split_mut(&mut self) -> BallsMut<'_> {
        BallsMut {
            positions: &mut self.positions,
            velocities: &mut self.velocities,
            pending_deltas: &mut self.pending_deltas,
            radii: &self.radii,
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    pub fn pending_deltas(&self) -> &[Vec3] {
        &self.pending_deltas
    }

    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    /// All four arrays describe the same balls
    pub fn is_consistent(&self) -> bool {
        let count = self.positions.len();
        self.velocities.len() == count
            && self.pending_deltas.len() == count
            && self.radii.len() == count
    }

    /// No contact response is waiting to be applied
    pub fn deltas_drained(&self) -> bool {
        self.pending_deltas.iter().all(|d| *d == Vec3::ZERO)
    }

    /// Total kinetic energy with unit masses
    pub fn kinetic_energy(&self) -> f32 {
        self.velocities
            .iter()
            .map(|v| 0.5 * v.length_squared())
            .sum()
    }
}
