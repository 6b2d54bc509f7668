//! Per-ball instance transforms
//!
//! The physics core hands the renderer one model matrix per ball each
//! frame. Draw submission happens elsewhere; instances are grouped into
//! fixed-size batches to match an instanced draw call's limit.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::consts::INSTANCES_PER_BATCH;
use crate::sim::BallStore;

/// Column-major model matrix for one ball
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BallInstance {
    pub model: [[f32; 4]; 4],
}

impl BallInstance {
    /// Unit-diameter sphere mesh scaled to the ball
    pub fn new(position: Vec3, radius: f32) -> Self {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::splat(radius * 2.0),
            Quat::IDENTITY,
            position,
        );
        Self {
            model: model.to_cols_array_2d(),
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::from_slice(&self.model[3][..3])
    }
}

/// Instance transforms for every ball, rebuilt in place each frame
#[derive(Debug, Clone, Default)]
pub struct InstanceBuffer {
    instances: Vec<BallInstance>,
}

impl InstanceBuffer {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            instances: Vec::with_capacity(count),
        }
    }

    /// Rebuild from the current ball state
    pub fn update(&mut self, balls: &BallStore) {
        self.instances.clear();
        self.instances.extend(
            balls
                .positions()
                .iter()
                .zip(balls.radii())
                .map(|(&position, &radius)| BallInstance::new(position, radius)),
        );
    }

    pub fn instances(&self) -> &[BallInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Slices of at most `INSTANCES_PER_BATCH`, one per draw call
    pub fn batches(&self) -> impl Iterator<Item = &[BallInstance]> {
        self.instances.chunks(INSTANCES_PER_BATCH)
    }

    pub fn batch_count(&self) -> usize {
        self.instances.len().div_ceil(INSTANCES_PER_BATCH)
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}
