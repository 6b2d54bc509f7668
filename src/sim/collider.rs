//! Planar colliders and the per-tick collider snapshot
//!
//! A collider is a finite rectangular slab described by a transform, the
//! same way a scaled unit plane mesh is placed in a scene. The snapshot
//! flattens every collider into parallel arrays once per tick so the
//! integration stage reads plain vectors.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::{FLOOR_NORMAL_MIN_Y, PLANE_MESH_SPAN};

/// Placement of a collider in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColliderTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for ColliderTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// A static (or externally moved) rectangular slab
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarCollider {
    pub transform: ColliderTransform,
    /// Floor-like surface; consumed by controllers outside the ball core
    pub ground: bool,
}

impl PlanarCollider {
    pub fn new(transform: ColliderTransform, ground: bool) -> Self {
        Self { transform, ground }
    }

    /// Build a slab centered at `origin` facing `normal`.
    ///
    /// `half_size` is the world-space half extent of the region the slab
    /// should cover; the component along the normal is ignored. Intended for
    /// axis-aligned slabs.
    pub fn facing(origin: Vec3, normal: Vec3, half_size: Vec3, ground: bool) -> Self {
        let rotation = match normal.try_normalize() {
            Some(normal) => Quat::from_rotation_arc(Vec3::Y, normal),
            // Degenerate; rejected by `is_valid`
            None => Quat::from_xyzw(0.0, 0.0, 0.0, 0.0),
        };
        let right = rotation * Vec3::X;
        let forward = rotation * Vec3::Z;
        let half_extents = Vec2::new(
            right.abs().dot(half_size),
            forward.abs().dot(half_size),
        );
        let full = half_extents * 2.0 / PLANE_MESH_SPAN;
        Self {
            transform: ColliderTransform {
                position: origin,
                rotation,
                scale: Vec3::new(full.x, 1.0, full.y),
            },
            ground,
        }
    }

    #[inline]
    fn rotation(&self) -> Quat {
        self.transform.rotation.normalize()
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.rotation() * Vec3::Y
    }

    #[inline]
    pub fn right(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.transform.position
    }

    /// Full width along right/forward
    #[inline]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.transform.scale.x, self.transform.scale.z) * PLANE_MESH_SPAN
    }

    /// True when the slab can produce a usable plane
    pub fn is_valid(&self) -> bool {
        let rotation = self.transform.rotation;
        rotation.is_finite()
            && rotation.length_squared() > 1e-6
            && self.transform.position.is_finite()
            && self.transform.scale.is_finite()
    }

    /// Treated as a floor by the tunneling guard
    #[inline]
    pub fn is_floor_like(&self) -> bool {
        self.normal().y > FLOOR_NORMAL_MIN_Y
    }
}

/// Flattened, read-only view of every collider for one tick
#[derive(Debug, Clone, Default)]
pub struct ColliderSnapshot {
    pub normals: Vec<Vec3>,
    pub rights: Vec<Vec3>,
    pub forwards: Vec<Vec3>,
    pub origins: Vec<Vec3>,
    pub half_extents: Vec<Vec2>,
}

/// One collider as seen by the integration stage
#[derive(Debug, Clone, Copy)]
pub struct SlabView {
    pub normal: Vec3,
    pub right: Vec3,
    pub forward: Vec3,
    pub origin: Vec3,
    pub half_extent: Vec2,
}

impl ColliderSnapshot {
    pub fn from_colliders(colliders: &[PlanarCollider]) -> Self {
        let mut snapshot = Self::default();
        snapshot.refresh(colliders);
        snapshot
    }

    /// Overwrite the snapshot from the authoritative colliders
    pub fn refresh(&mut self, colliders: &[PlanarCollider]) {
        self.normals.clear();
        self.rights.clear();
        self.forwards.clear();
        self.origins.clear();
        self.half_extents.clear();

        for collider in colliders {
            self.normals.push(collider.normal());
            self.rights.push(collider.right());
            self.forwards.push(collider.forward());
            self.origins.push(collider.origin());
            self.half_extents.push(collider.size() * 0.5);
        }
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }

    /// Colliders in snapshot order
    pub fn iter(&self) -> impl Iterator<Item = SlabView> + '_ {
        (0..self.len()).map(move |i| SlabView {
            normal: self.normals[i],
            right: self.rights[i],
            forward: self.forwards[i],
            origin: self.origins[i],
            half_extent: self.half_extents[i],
        })
    }
}
