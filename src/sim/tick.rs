//! Fixed timestep simulation tick
//!
//! `Simulation` owns every buffer for the lifetime of a scene and runs the
//! per-tick pipeline: refresh the collider snapshot, integrate, rebuild the
//! grid, resolve ball contacts, apply the deferred deltas. Each stage drains
//! completely before the next one starts.

use thiserror::Error;

use super::clock::FixedStepClock;
use super::collider::{ColliderSnapshot, PlanarCollider};
use super::contact::{ContactParams, ContactView, apply_stage, contact_stage};
use super::grid::SpatialHashGrid;
use super::integrate::{IntegrationParams, integrate_stage};
use super::pool::WorkerPool;
use super::state::BallStore;
use crate::settings::{ConfigError, SimulationConfig};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Collider {index} has a degenerate transform")]
    DegenerateCollider { index: usize },
}

/// Counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Ticks completed so far, including this one
    pub tick: u64,
    /// Ball-collider corrections applied during integration
    pub wall_contacts: usize,
    /// Pair impulses accumulated by the narrow phase
    pub ball_contacts: usize,
    /// Non-empty grid buckets
    pub occupied_cells: usize,
}

pub struct Simulation {
    config: SimulationConfig,
    balls: BallStore,
    colliders: Vec<PlanarCollider>,
    snapshot: ColliderSnapshot,
    grid: SpatialHashGrid,
    pool: WorkerPool,
    clock: FixedStepClock,
    tick: u64,
    last_stats: TickStats,
}

fn check_colliders(colliders: &[PlanarCollider]) -> Result<(), SimulationError> {
    match colliders.iter().position(|c| !c.is_valid()) {
        Some(index) => Err(SimulationError::DegenerateCollider { index }),
        None => Ok(()),
    }
}

impl Simulation {
    /// Validate the config and spawn `config.ball_count` balls
    pub fn new(
        config: SimulationConfig,
        colliders: Vec<PlanarCollider>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let balls = BallStore::spawn(&config);
        Self::assemble(config, colliders, balls)
    }

    /// Start from explicit ball state; `config.ball_count` follows the store
    pub fn with_balls(
        config: SimulationConfig,
        colliders: Vec<PlanarCollider>,
        balls: BallStore,
    ) -> Result<Self, SimulationError> {
        let config = config.with_ball_count(balls.len());
        config.validate()?;
        Self::assemble(config, colliders, balls)
    }

    fn assemble(
        config: SimulationConfig,
        colliders: Vec<PlanarCollider>,
        balls: BallStore,
    ) -> Result<Self, SimulationError> {
        check_colliders(&colliders)?;
        let pool = WorkerPool::new(config.worker_threads, config.batch_size)?;

        log::info!(
            "Simulation ready: {} balls, {} colliders, {} workers (batch {})",
            balls.len(),
            colliders.len(),
            pool.threads(),
            pool.batch_size()
        );

        Ok(Self {
            snapshot: ColliderSnapshot::from_colliders(&colliders),
            grid: SpatialHashGrid::new(config.cell_size, balls.len()),
            clock: FixedStepClock::new(config.fixed_dt),
            config,
            balls,
            colliders,
            pool,
            tick: 0,
            last_stats: TickStats::default(),
        })
    }

    /// Advance one fixed timestep
    pub fn tick(&mut self) -> TickStats {
        self.tick_with_dt(self.config.fixed_dt)
    }

    /// Advance one step of length `dt`
    pub fn tick_with_dt(&mut self, dt: f32) -> TickStats {
        debug_assert!(self.balls.deltas_drained());

        self.snapshot.refresh(&self.colliders);
        log::trace!("snapshot: {} colliders", self.snapshot.len());

        let integration = IntegrationParams {
            dt,
            gravity: self.config.gravity,
            restitution: self.config.restitution,
        };
        let wall_contacts = integrate_stage(
            &self.pool,
            self.balls.split_mut(),
            &self.snapshot,
            &integration,
        );

        log::trace!("integrate: {} wall corrections", wall_contacts);

        self.grid.build(&self.pool, self.balls.positions());
        log::trace!("grid: {} buckets", self.grid.occupied_buckets());

        let contact = ContactParams {
            restitution: self.config.restitution,
        };
        let balls = self.balls.split_mut();
        let ball_contacts = contact_stage(
            &self.pool,
            ContactView::new(balls.positions, balls.velocities, balls.radii),
            balls.pending_deltas,
            &self.grid,
            &contact,
        );
        apply_stage(&self.pool, balls.velocities, balls.pending_deltas);

        self.tick += 1;
        self.last_stats = TickStats {
            tick: self.tick,
            wall_contacts,
            ball_contacts,
            occupied_cells: self.grid.occupied_buckets(),
        };
        log::debug!("{:?}", self.last_stats);
        self.last_stats
    }

    /// Feed a frame's elapsed time; returns the number of ticks run
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let ticks = self.clock.advance(frame_dt);
        for _ in 0..ticks {
            self.tick();
        }
        ticks
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn toggle_pause(&mut self) {
        self.clock.toggle_pause();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Replace the collider set
    pub fn set_colliders(&mut self, colliders: Vec<PlanarCollider>) -> Result<(), SimulationError> {
        check_colliders(&colliders)?;
        self.colliders = colliders;
        Ok(())
    }

    /// Move colliders between ticks; transforms must stay valid
    pub fn colliders_mut(&mut self) -> &mut [PlanarCollider] {
        &mut self.colliders
    }

    pub fn colliders(&self) -> &[PlanarCollider] {
        &self.colliders
    }

    pub fn balls(&self) -> &BallStore {
        &self.balls
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.pool.threads()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn last_stats(&self) -> TickStats {
        self.last_stats
    }
}
