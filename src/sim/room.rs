//! Room geometry built from planar colliders
//!
//! Floor, four inward-facing walls and an optional ceiling. Walls span the
//! full footprint so corners are covered by two slabs.

use glam::Vec3;

use super::collider::PlanarCollider;
use crate::settings::RoomConfig;

/// Build the colliders for a room, floor first
pub fn build_room(room: &RoomConfig) -> Vec<PlanarCollider> {
    let min = room.min();
    let max = room.max();
    let center = (min + max) * 0.5;
    let half = (max - min) * 0.5;

    let mut colliders = vec![
        // Floor
        PlanarCollider::facing(
            Vec3::new(center.x, room.ground_y, center.z),
            Vec3::Y,
            half,
            true,
        ),
        // Left wall
        PlanarCollider::facing(Vec3::new(room.left_x, center.y, center.z), Vec3::X, half, false),
        // Right wall
        PlanarCollider::facing(
            Vec3::new(room.right_x, center.y, center.z),
            Vec3::NEG_X,
            half,
            false,
        ),
        // Back wall
        PlanarCollider::facing(Vec3::new(center.x, center.y, room.back_z), Vec3::Z, half, false),
        // Front wall
        PlanarCollider::facing(
            Vec3::new(center.x, center.y, room.front_z),
            Vec3::NEG_Z,
            half,
            false,
        ),
    ];

    if room.ceiling {
        colliders.push(PlanarCollider::facing(
            Vec3::new(center.x, max.y, center.z),
            Vec3::NEG_Y,
            half,
            false,
        ));
    }

    colliders
}
