//! Rendering boundary
//!
//! Turns ball state into instance transforms for an external instanced
//! renderer. No GPU code lives in this crate.

pub mod instances;

pub use instances::{BallInstance, InstanceBuffer};
