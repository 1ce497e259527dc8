//! Fork-join coordinator for the Kick and Drift regions.
//!
//! Items are split into contiguous ranges, one per worker; the last range
//! absorbs the remainder. Each worker gets exclusive access to its own
//! range and returns a local result. The caller sees those results in
//! partition order once every worker has finished.

use std::ops::Range;

use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Pool with `workers` threads (at least one)
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("cdsim-worker-{i}"))
            .build()?;
        debug!("worker pool ready with {workers} threads");
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f(offset, partition)` on every partition of `items` in parallel.
    ///
    /// `offset` is the position of the partition's first item in `items`.
    pub fn run_partitioned<T, R, F>(&self, items: &mut [T], f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(usize, &mut [T]) -> R + Sync,
    {
        let ranges = partition_ranges(items.len(), self.workers);
        let parts = split_by_ranges(items, &ranges);

        self.pool.install(|| {
            parts
                .into_par_iter()
                .map(|(offset, part)| f(offset, part))
                .collect()
        })
    }
}

/// Contiguous ranges covering `0..len`, `len / workers` long each with the
/// last one taking the remainder. Never more ranges than items.
pub fn partition_ranges(len: usize, workers: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, len);
    let chunk = len / workers;

    (0..workers)
        .map(|w| {
            let start = w * chunk;
            let end = if w + 1 == workers { len } else { start + chunk };
            start..end
        })
        .collect()
}

fn split_by_ranges<'a, T>(mut items: &'a mut [T], ranges: &[Range<usize>]) -> Vec<(usize, &'a mut [T])> {
    let mut parts = Vec::with_capacity(ranges.len());
    let mut consumed = 0;

    for r in ranges {
        let (head, tail) = std::mem::take(&mut items).split_at_mut(r.end - consumed);
        parts.push((r.start, head));
        items = tail;
        consumed = r.end;
    }

    parts
}
