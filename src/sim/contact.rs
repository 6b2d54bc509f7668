//! Ball-ball contact response (narrow phase)
//!
//! Every ball scans the 27 buckets around its own cell and sums its half of
//! the impulse against each overlapping, approaching neighbor. The sum goes
//! into the ball's own pending delta; the neighbor computes its own half on
//! its own pass. Positions and velocities are read-only here, so no ball
//! ever observes another's partially updated state.

use glam::Vec3;

use super::grid::SpatialHashGrid;
use super::pool::WorkerPool;
use super::state::BallStore;
use crate::consts::MIN_CONTACT_DISTANCE;

#[derive(Debug, Clone, Copy)]
pub struct ContactParams {
    pub restitution: f32,
}

/// Read-only ball state seen by the narrow phase
#[derive(Clone, Copy)]
pub struct ContactView<'a> {
    pub positions: &'a [Vec3],
    pub velocities: &'a [Vec3],
    pub radii: &'a [f32],
}

impl<'a> ContactView<'a> {
    pub fn new(positions: &'a [Vec3], velocities: &'a [Vec3], radii: &'a [f32]) -> Self {
        Self {
            positions,
            velocities,
            radii,
        }
    }
}

/// Impulse magnitude ball `a` takes from a contact, if any.
///
/// `diff` points from the other ball to `a`. Pairs that are separating or
/// merely touching get nothing, as do coincident centers.
#[inline]
pub fn pair_impulse(diff: Vec3, rel_vel: Vec3, rad_sum: f32, restitution: f32) -> Option<Vec3> {
    let dist_sq = diff.length_squared();
    if dist_sq >= rad_sum * rad_sum {
        return None;
    }
    let dist = dist_sq.sqrt();
    if dist <= MIN_CONTACT_DISTANCE {
        return None;
    }

    let normal = diff / dist;
    let closing = rel_vel.dot(normal);
    if closing >= 0.0 {
        return None;
    }

    let magnitude = (-(1.0 + restitution) * closing * 0.5).max(rad_sum - dist);
    Some(normal * magnitude)
}

/// Summed response of one ball against its neighborhood.
///
/// Returns the delta and the number of contacts that produced an impulse.
pub fn ball_response(
    index: usize,
    balls: ContactView<'_>,
    grid: &SpatialHashGrid,
    params: &ContactParams,
) -> (Vec3, usize) {
    let pos = balls.positions[index];
    let vel = balls.velocities[index];
    let radius = balls.radii[index];

    let mut delta = Vec3::ZERO;
    let mut contacts = 0;
    for other in grid.neighborhood(grid.cell_of(pos)) {
        let other = other as usize;
        if other == index {
            continue;
        }
        let diff = pos - balls.positions[other];
        let rel_vel = vel - balls.velocities[other];
        let rad_sum = radius + balls.radii[other];
        if let Some(impulse) = pair_impulse(diff, rel_vel, rad_sum, params.restitution) {
            delta += impulse;
            contacts += 1;
        }
    }
    (delta, contacts)
}

/// Narrow phase over every ball; returns the total contact count.
///
/// `pending_deltas` must be zero on entry for the result to equal this
/// tick's response.
pub fn contact_stage(
    pool: &WorkerPool,
    balls: ContactView<'_>,
    pending_deltas: &mut [Vec3],
    grid: &SpatialHashGrid,
    params: &ContactParams,
) -> usize {
    pool.dispatch_mut(pending_deltas, |i, slot| {
        let (delta, contacts) = ball_response(i, balls, grid, params);
        *slot += delta;
        contacts
    })
}

/// Apply stage: fold each pending delta into its velocity and zero it
pub fn apply_stage(pool: &WorkerPool, velocities: &mut [Vec3], pending_deltas: &mut [Vec3]) {
    pool.dispatch_zip_mut(velocities, pending_deltas, |_, vel, delta| {
        *vel += std::mem::take(delta);
        0
    });
}

/// Narrow phase and apply stage on a standalone store
pub fn resolve_and_apply(
    pool: &WorkerPool,
    store: &mut BallStore,
    grid: &SpatialHashGrid,
    params: &ContactParams,
) -> usize {
    let balls = store.split_mut();
    let contacts = contact_stage(
        pool,
        ContactView::new(balls.positions, balls.velocities, balls.radii),
        balls.pending_deltas,
        grid,
        params,
    );
    apply_stage(pool, balls.velocities, balls.pending_deltas);
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMS: ContactParams = ContactParams { restitution: 0.9 };

    fn pair(a: Vec3, va: Vec3, b: Vec3, vb: Vec3) -> (WorkerPool, BallStore, SpatialHashGrid) {
        let pool = WorkerPool::new(Some(2), 1).unwrap();
        let store = BallStore::from_parts(vec![a, b], vec![va, vb], 0.2).unwrap();
        let mut grid = SpatialHashGrid::new(0.5, 2);
        grid.build(&pool, store.positions());
        (pool, store, grid)
    }

    fn deltas(pool: &WorkerPool, store: &mut BallStore, grid: &SpatialHashGrid) -> Vec<Vec3> {
        let balls = store.split_mut();
        contact_stage(
            pool,
            ContactView::new(balls.positions, balls.velocities, balls.radii),
            balls.pending_deltas,
            grid,
            &PARAMS,
        );
        store.pending_deltas().to_vec()
    }

    #[test]
    fn test_head_on_pair_gets_opposite_deltas() {
        let (pool, mut store, grid) = pair(
            Vec3::new(-0.15, 1.0, 0.0),
            Vec3::X,
            Vec3::new(0.15, 1.0, 0.0),
            Vec3::NEG_X,
        );
        let d = deltas(&pool, &mut store, &grid);
        assert!((d[0] - Vec3::new(-1.9, 0.0, 0.0)).length() < 1e-5);
        assert!((d[1] - Vec3::new(1.9, 0.0, 0.0)).length() < 1e-5);
        assert!((d[0] + d[1]).length() < 1e-5);
    }

    #[test]
    fn test_penetration_floor_dominates_slow_contact() {
        // Closing speed is tiny, overlap is 0.3
        let impulse = pair_impulse(Vec3::new(0.1, 0.0, 0.0), Vec3::new(-0.01, 0.0, 0.0), 0.4, 0.9)
            .unwrap();
        assert!((impulse - Vec3::new(0.3, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_resting_overlap_gets_no_impulse() {
        // Zero relative velocity: no separation, even at half overlap
        let (pool, mut store, grid) = pair(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::ZERO,
            Vec3::new(0.2, 1.0, 0.0),
            Vec3::ZERO,
        );
        let before = (store.positions()[1] - store.positions()[0]).length();
        let contacts = resolve_and_apply(&pool, &mut store, &grid, &PARAMS);
        assert_eq!(contacts, 0);
        assert!(store.velocities().iter().all(|v| *v == Vec3::ZERO));
        assert_eq!((store.positions()[1] - store.positions()[0]).length(), before);
    }

    #[test]
    fn test_separating_pair_gets_no_impulse() {
        let (pool, mut store, grid) = pair(
            Vec3::new(-0.15, 1.0, 0.0),
            Vec3::NEG_X,
            Vec3::new(0.15, 1.0, 0.0),
            Vec3::X,
        );
        let d = deltas(&pool, &mut store, &grid);
        assert_eq!(d, vec![Vec3::ZERO, Vec3::ZERO]);
    }

    #[test]
    fn test_coincident_centers_are_skipped() {
        let (pool, mut store, grid) = pair(Vec3::ONE, Vec3::X, Vec3::ONE, Vec3::NEG_X);
        let d = deltas(&pool, &mut store, &grid);
        assert!(d.iter().all(|v| v.is_finite() && *v == Vec3::ZERO));
    }

    #[test]
    fn test_distant_pair_in_neighbor_cells_ignored() {
        let (pool, mut store, grid) = pair(
            Vec3::new(0.1, 1.0, 0.0),
            Vec3::X,
            Vec3::new(0.6, 1.0, 0.0),
            Vec3::NEG_X,
        );
        let d = deltas(&pool, &mut store, &grid);
        assert_eq!(d, vec![Vec3::ZERO, Vec3::ZERO]);
    }

    #[test]
    fn test_apply_stage_drains_deltas() {
        let pool = WorkerPool::new(Some(2), 2).unwrap();
        let mut velocities = vec![Vec3::X, Vec3::Y, Vec3::Z];
        let mut pending = vec![Vec3::ONE, Vec3::ZERO, Vec3::NEG_ONE];
        apply_stage(&pool, &mut velocities, &mut pending);
        assert_eq!(velocities, vec![Vec3::new(2.0, 1.0, 1.0), Vec3::Y, Vec3::new(-1.0, -1.0, 0.0)]);
        assert!(pending.iter().all(|d| *d == Vec3::ZERO));
    }

    #[test]
    fn test_contact_across_cell_boundary_detected() {
        // Centers in adjacent cells along every axis
        let (pool, mut store, grid) = pair(
            Vec3::new(0.45, 0.45, 0.45),
            Vec3::ONE,
            Vec3::new(0.55, 0.55, 0.55),
            Vec3::ZERO,
        );
        let d = deltas(&pool, &mut store, &grid);
        assert!(d[0].x < 0.0 && d[0].y < 0.0 && d[0].z < 0.0);
        assert!(d[1].x > 0.0);
    }
}
