//! Spatial hash grid (broad phase)
//!
//! A multi-map from cell hash to the balls whose centers lie in that cell,
//! rebuilt from scratch every tick. Keys are computed by the workers into
//! per-batch runs that rayon stitches together in index order; the merged
//! list is then sorted so every bucket lists its balls by ascending id,
//! whatever the worker count.
//!
//! The hash is not collision-free. Distinct cells may share a bucket, which
//! only adds candidate pairs for the narrow phase to reject.

use std::collections::HashMap;

use glam::{IVec3, Vec3};
use rayon::slice::ParallelSliceMut;

use super::pool::WorkerPool;
use crate::{cell_coord, hash_cell};

/// Offsets of the 3x3x3 neighborhood, x outermost
const NEIGHBOR_OFFSETS: [IVec3; 27] = {
    let mut offsets = [IVec3::ZERO; 27];
    let mut i = 0;
    let mut x = -1;
    while x <= 1 {
        let mut y = -1;
        while y <= 1 {
            let mut z = -1;
            while z <= 1 {
                offsets[i] = IVec3::new(x, y, z);
                i += 1;
                z += 1;
            }
            y += 1;
        }
        x += 1;
    }
    offsets
};

#[derive(Debug, Clone)]
pub struct SpatialHashGrid {
    cell_size: f32,
    /// (cell hash, ball id), grouped by hash after a build
    entries: Vec<(i32, u32)>,
    /// Ball ids in bucket order
    ids: Vec<u32>,
    /// Cell hash -> (start, len) into `ids`
    buckets: HashMap<i32, (u32, u32)>,
}

impl SpatialHashGrid {
    /// Empty grid with room for `capacity` balls
    pub fn new(cell_size: f32, capacity: usize) -> Self {
        Self {
            cell_size,
            entries: Vec::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            buckets: HashMap::with_capacity(capacity),
        }
    }

    /// Cell containing a world position
    #[inline]
    pub fn cell_of(&self, pos: Vec3) -> IVec3 {
        cell_coord(pos, self.cell_size)
    }

    /// Drop every entry, keeping allocations
    pub fn clear(&mut self) {
        self.entries.clear();
        self.ids.clear();
        self.buckets.clear();
    }

    /// Clear, then insert every ball at its current position
    pub fn build(&mut self, pool: &WorkerPool, positions: &[Vec3]) {
        self.clear();

        let cell_size = self.cell_size;
        pool.extend_indexed(positions.len(), &mut self.entries, |i| {
            (hash_cell(cell_coord(positions[i], cell_size)), i as u32)
        });
        let entries = &mut self.entries;
        pool.install(|| entries.par_sort_unstable());

        self.ids.extend(self.entries.iter().map(|&(_, id)| id));
        let mut start = 0;
        while start < self.entries.len() {
            let hash = self.entries[start].0;
            let end = start
                + self.entries[start..]
                    .iter()
                    .take_while(|(h, _)| *h == hash)
                    .count();
            self.buckets
                .insert(hash, (start as u32, (end - start) as u32));
            start = end;
        }
    }

    /// Balls in the bucket for `hash`, ascending by id
    pub fn bucket(&self, hash: i32) -> &[u32] {
        match self.buckets.get(&hash) {
            Some(&(start, len)) => &self.ids[start as usize..(start + len) as usize],
            None => &[],
        }
    }

    /// Balls in the buckets of `cell` and its 26 neighbors.
    ///
    /// Includes ids from aliased cells; a ball can appear more than once if
    /// two neighbor cells share a bucket. Coordinates wrap at the `i32` limits
    /// like the hash does.
    pub fn neighborhood(&self, cell: IVec3) -> impl Iterator<Item = u32> + '_ {
        NEIGHBOR_OFFSETS.iter().flat_map(move |offset| {
            self.bucket(hash_cell(cell.wrapping_add(*offset)))
                .iter()
                .copied()
        })
    }

    /// Number of inserted balls
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of non-empty buckets
    pub fn occupied_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Every (hash, ids) pair, in no particular order
    pub fn buckets(&self) -> impl Iterator<Item = (i32, &[u32])> + '_ {
        self.buckets.keys().map(move |&hash| (hash, self.bucket(hash)))
    }
}
