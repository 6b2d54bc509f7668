//! Ball Pit - parallel rigid-sphere simulation in a room of planar colliders
//!
//! Core modules:
//! - `sim`: Fixed-timestep physics pipeline (walls, spatial hash, ball contacts)
//! - `renderer`: Per-ball instance transforms handed to an external renderer
//! - `settings`: Data-driven simulation configuration

pub mod renderer;
pub mod settings;
pub mod sim;

pub use renderer::{BallInstance, InstanceBuffer};
pub use settings::{ConfigError, RoomConfig, SimulationConfig, SpawnVolume};
pub use sim::{Simulation, SimulationError, TickStats};

use glam::{IVec3, Vec3};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame time the clock will accept (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Ball defaults
    pub const DEFAULT_BALL_COUNT: usize = 20_000;
    pub const BALL_RADIUS: f32 = 0.2;
    /// Per-axis initial velocity range, sampled from [-r, r]
    pub const INITIAL_VELOCITY_RANGE: f32 = 2.0;

    /// World defaults
    pub const GRAVITY: f32 = -9.81;
    pub const RESTITUTION: f32 = 0.9;
    /// Spatial hash cell edge length
    pub const CELL_SIZE: f32 = 0.5;

    /// Spawn volume (balls are dropped into the middle of the room)
    pub const SPAWN_HALF_WIDTH: f32 = 5.0;
    pub const SPAWN_MAX_HEIGHT: f32 = 20.0;

    /// Room defaults
    pub const ROOM_HALF_WIDTH: f32 = 10.0;
    pub const WALL_HEIGHT: f32 = 30.0;

    /// Balls handed to each parallel task
    pub const WORKER_BATCH_SIZE: usize = 64;

    /// Span of the unit plane mesh; collider size = scale * PLANE_MESH_SPAN
    pub const PLANE_MESH_SPAN: f32 = 10.0;
    /// Normals with a larger Y component are treated as floors
    pub const FLOOR_NORMAL_MIN_Y: f32 = 0.5;
    /// Contacts closer than this have no usable normal
    pub const MIN_CONTACT_DISTANCE: f32 = 1e-6;

    /// Instances per draw batch on the render side
    pub const INSTANCES_PER_BATCH: usize = 1023;
}

/// Quantize a world position into its integer grid cell
#[inline]
pub fn cell_coord(pos: Vec3, cell_size: f32) -> IVec3 {
    (pos / cell_size).floor().as_ivec3()
}

/// Polynomial hash of a cell coordinate.
///
/// Not collision-free: distinct cells may share a bucket.
#[inline]
pub fn hash_cell(cell: IVec3) -> i32 {
    let mut hash: i32 = 17;
    hash = hash.wrapping_mul(31).wrapping_add(cell.x);
    hash = hash.wrapping_mul(31).wrapping_add(cell.y);
    hash = hash.wrapping_mul(31).wrapping_add(cell.z);
    hash
}
