//! Worker pool for the data-parallel stages
//!
//! Every dispatch splits the ball index space into fixed-size batches, runs
//! them on the pool and returns only once every batch has finished, so
//! consecutive dispatches form a fork-join chain.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

pub struct WorkerPool {
    pool: ThreadPool,
    batch_size: usize,
}

impl WorkerPool {
    /// `threads = None` uses one worker per core
    pub fn new(threads: Option<usize>, batch_size: usize) -> Result<Self, ThreadPoolBuildError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("ball-pit-worker-{i}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        Ok(Self {
            pool: builder.build()?,
            batch_size: batch_size.max(1),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run `f(index, item)` over every item; returns the sum of `f`'s results
    pub fn dispatch_mut<T, F>(&self, items: &mut [T], f: F) -> usize
    where
        T: Send,
        F: Fn(usize, &mut T) -> usize + Sync + Send,
    {
        let batch = self.batch_size;
        self.pool.install(|| {
            items
                .par_chunks_mut(batch)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    let base = chunk_idx * batch;
                    chunk
                        .iter_mut()
                        .enumerate()
                        .map(|(offset, item)| f(base + offset, item))
                        .sum::<usize>()
                })
                .sum()
        })
    }

    /// Like `dispatch_mut`, over two arrays indexed by the same ball
    pub fn dispatch_zip_mut<A, B, F>(&self, a: &mut [A], b: &mut [B], f: F) -> usize
    where
        A: Send,
        B: Send,
        F: Fn(usize, &mut A, &mut B) -> usize + Sync + Send,
    {
        debug_assert_eq!(a.len(), b.len());
        let batch = self.batch_size;
        self.pool.install(|| {
            a.par_chunks_mut(batch)
                .zip(b.par_chunks_mut(batch))
                .enumerate()
                .map(|(chunk_idx, (a, b))| {
                    let base = chunk_idx * batch;
                    a.iter_mut()
                        .zip(b.iter_mut())
                        .enumerate()
                        .map(|(offset, (a, b))| f(base + offset, a, b))
                        .sum::<usize>()
                })
                .sum()
        })
    }

    /// Evaluate `f` for every index in `0..len`, appending results to `out` in index order
    pub fn extend_indexed<R, F>(&self, len: usize, out: &mut Vec<R>, f: F)
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        let batch = self.batch_size;
        self.pool.install(|| {
            out.par_extend((0..len).into_par_iter().with_min_len(batch).map(f));
        });
    }

    /// Run an arbitrary parallel job on this pool
    pub fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }
}
