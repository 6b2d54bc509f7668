//! Ball physics module
//!
//! All simulation logic lives here. The pipeline must stay deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Per-ball results independent of worker count and scheduling
//! - No rendering or platform dependencies

pub mod clock;
pub mod collider;
pub mod contact;
pub mod grid;
pub mod integrate;
pub mod pool;
pub mod room;
pub mod state;
pub mod tick;

pub use clock::FixedStepClock;
pub use collider::{ColliderSnapshot, ColliderTransform, PlanarCollider, SlabView};
pub use contact::{ContactParams, ContactView, apply_stage, ball_response, contact_stage, pair_impulse};
pub use grid::SpatialHashGrid;
pub use integrate::{IntegrationParams, integrate_ball, integrate_stage, reflect};
pub use pool::WorkerPool;
pub use room::build_room;
pub use state::{BallStore, BallStoreError, BallsMut};
pub use tick::{Simulation, SimulationError, TickStats};
