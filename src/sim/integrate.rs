//! Integration and wall collision
//!
//! Each ball falls, moves, then is pushed out of every collider it
//! penetrates, in snapshot order. A ball only ever touches its own slots, so
//! the stage runs over all balls in parallel.

use glam::Vec3;

use super::collider::{ColliderSnapshot, SlabView};
use super::pool::WorkerPool;
use super::state::BallsMut;
use crate::consts::FLOOR_NORMAL_MIN_Y;

/// Per-tick inputs of the integration stage
#[derive(Debug, Clone, Copy)]
pub struct IntegrationParams {
    pub dt: f32,
    pub gravity: f32,
    pub restitution: f32,
}

/// Reflect velocity off a surface with given normal
#[inline]
pub fn reflect(vel: Vec3, normal: Vec3) -> Vec3 {
    vel - 2.0 * vel.dot(normal) * normal
}

/// Whether the ball center projects inside the slab's rectangle
#[inline]
fn projects_inside(pos: Vec3, distance: f32, slab: &SlabView) -> bool {
    let local = pos - distance * slab.normal - slab.origin;
    local.dot(slab.right).abs() <= slab.half_extent.x
        && local.dot(slab.forward).abs() <= slab.half_extent.y
}

/// Push-out along the slab normal, or `None` when the ball is clear.
///
/// Floor-like slabs also catch a ball that ended the step fully below them,
/// lifting it back on top. Walls and ceilings have no such guard.
#[inline]
fn penetration(pos: Vec3, radius: f32, slab: &SlabView) -> Option<f32> {
    let distance = (pos - slab.origin).dot(slab.normal);

    let push = if distance.abs() < radius {
        let side = if distance >= 0.0 { 1.0 } else { -1.0 };
        (radius - distance.abs()) * side
    } else if slab.normal.y > FLOOR_NORMAL_MIN_Y && distance < radius {
        radius - distance
    } else {
        return None;
    };

    projects_inside(pos, distance, slab).then_some(push)
}

/// Advance one ball by a timestep and resolve its wall contacts.
///
/// Returns the number of corrections applied.
pub fn integrate_ball(
    pos: &mut Vec3,
    vel: &mut Vec3,
    radius: f32,
    colliders: &ColliderSnapshot,
    params: &IntegrationParams,
) -> usize {
    let mut v = *vel;
    v.y += params.gravity * params.dt;
    let mut p = *pos + v * params.dt;

    let mut corrections = 0;
    for slab in colliders.iter() {
        if let Some(push) = penetration(p, radius, &slab) {
            p += slab.normal * push;
            v = reflect(v, slab.normal) * params.restitution;
            corrections += 1;
        }
    }

    *pos = p;
    *vel = v;
    corrections
}

/// Integration stage over every ball; returns total wall corrections
pub fn integrate_stage(
    pool: &WorkerPool,
    balls: BallsMut<'_>,
    colliders: &ColliderSnapshot,
    params: &IntegrationParams,
) -> usize {
    let radii = balls.radii;
    pool.dispatch_zip_mut(balls.positions, balls.velocities, |i, pos, vel| {
        integrate_ball(pos, vel, radii[i], colliders, params)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collider::PlanarCollider;

    const DT: f32 = 1.0 / 60.0;

    fn params(gravity: f32, restitution: f32) -> IntegrationParams {
        IntegrationParams {
            dt: DT,
            gravity,
            restitution,
        }
    }

    fn floor_snapshot() -> ColliderSnapshot {
        ColliderSnapshot::from_colliders(&[PlanarCollider::facing(
            Vec3::ZERO,
            Vec3::Y,
            Vec3::new(10.0, 0.0, 10.0),
            true,
        )])
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect(Vec3::new(1.0, -2.0, 0.5), Vec3::Y);
        assert_eq!(reflected, Vec3::new(1.0, 2.0, 0.5));
    }

    #[test]
    fn test_free_fall_applies_gravity_then_moves() {
        let mut pos = Vec3::new(0.0, 5.0, 0.0);
        let mut vel = Vec3::ZERO;
        let hits = integrate_ball(&mut pos, &mut vel, 0.2, &floor_snapshot(), &params(-9.81, 0.9));
        assert_eq!(hits, 0);
        assert!((vel.y - (-9.81 * DT)).abs() < 1e-6);
        assert!((pos.y - (5.0 - 9.81 * DT * DT)).abs() < 1e-6);
    }

    #[test]
    fn test_penetrating_ball_is_pushed_out_and_bounces() {
        let mut pos = Vec3::new(1.0, 0.1, 1.0);
        let mut vel = Vec3::new(0.5, -1.0, 0.0);
        let hits = integrate_ball(&mut pos, &mut vel, 0.2, &floor_snapshot(), &params(0.0, 0.5));
        assert_eq!(hits, 1);
        assert!((pos.y - 0.2).abs() < 1e-5);
        assert!((vel - Vec3::new(0.25, 0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_ball_outside_slab_rectangle_is_ignored() {
        let mut pos = Vec3::new(12.0, 0.1, 0.0);
        let mut vel = Vec3::ZERO;
        let hits = integrate_ball(&mut pos, &mut vel, 0.2, &floor_snapshot(), &params(0.0, 0.9));
        assert_eq!(hits, 0);
        assert_eq!(pos, Vec3::new(12.0, 0.1, 0.0));
    }

    #[test]
    fn test_floor_guard_lifts_ball_that_fell_through() {
        // Starts above, ends the step well below the floor
        let mut pos = Vec3::new(0.0, 0.3, 0.0);
        let mut vel = Vec3::new(0.0, -60.0, 0.0);
        let hits = integrate_ball(&mut pos, &mut vel, 0.2, &floor_snapshot(), &params(0.0, 0.9));
        assert_eq!(hits, 1);
        assert!((pos.y - 0.2).abs() < 1e-4);
        assert!(vel.y > 0.0);
    }

    #[test]
    fn test_wall_has_no_tunneling_guard() {
        let wall = ColliderSnapshot::from_colliders(&[PlanarCollider::facing(
            Vec3::new(10.0, 5.0, 0.0),
            Vec3::NEG_X,
            Vec3::new(0.0, 5.0, 10.0),
            false,
        )]);
        let mut pos = Vec3::new(9.7, 5.0, 0.0);
        let mut vel = Vec3::new(60.0, 0.0, 0.0);
        let hits = integrate_ball(&mut pos, &mut vel, 0.2, &wall, &params(0.0, 0.9));
        assert_eq!(hits, 0);
        assert!(pos.x > 10.0);
    }

    #[test]
    fn test_ball_below_surface_within_radius_is_pushed_down() {
        // Penetrating from the far side keeps the ball on that side
        let mut pos = Vec3::new(0.0, -0.1, 0.0);
        let mut vel = Vec3::new(0.0, 0.0, 0.0);
        integrate_ball(&mut pos, &mut vel, 0.2, &floor_snapshot(), &params(0.0, 0.9));
        assert!((pos.y - (-0.2)).abs() < 1e-5);
    }

    #[test]
    fn test_corner_hits_two_colliders_in_order() {
        let snapshot = ColliderSnapshot::from_colliders(&[
            PlanarCollider::facing(Vec3::ZERO, Vec3::Y, Vec3::new(10.0, 0.0, 10.0), true),
            PlanarCollider::facing(
                Vec3::new(-10.0, 5.0, 0.0),
                Vec3::X,
                Vec3::new(0.0, 5.0, 10.0),
                false,
            ),
        ]);
        let mut pos = Vec3::new(-9.9, 0.1, 0.0);
        let mut vel = Vec3::new(-1.0, -1.0, 0.0);
        let hits = integrate_ball(&mut pos, &mut vel, 0.2, &snapshot, &params(0.0, 1.0));
        assert_eq!(hits, 2);
        assert!(pos.y >= 0.2 - 1e-4);
        assert!(pos.x >= -9.8 - 1e-4);
        assert!(vel.x > 0.0 && vel.y > 0.0);
    }
}
