//! The intra-process worker pool: a rayon-driven round executor.
//!
//! Jobs are consumed at grain size 1 because subtree costs vary by orders of
//! magnitude; rayon's work stealing supplies the dynamic scheduling. Each
//! rayon worker folds jobs into a private state (frame stack, best slot,
//! explored tally) and the fold states are merged at the end of the round,
//! so the only cross-thread traffic in the hot path is the shared bound.

use crate::kernel::{self, BestSolution, SearchFrame};
use crate::prefix::PrefixJob;
use crossbeam::utils::CachePadded;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

// ============================================================================
// Shared per-process search state
// ============================================================================

/// Process-wide shared atomics, padded so the bound and the telemetry
/// counter never share a cache line. Reset at the start of every search.
pub struct SharedState {
    /// Exclusive upper bound: length of the shortest complete ruler seen.
    pub bound: CachePadded<AtomicI32>,
    /// Frames visited, summed over all workers and rounds.
    pub explored: CachePadded<AtomicU64>,
}

impl SharedState {
    /// Creates shared state with the bound at the `l_max + 1` sentinel.
    pub fn new(limit: i32) -> Self {
        Self {
            bound: CachePadded::new(AtomicI32::new(limit)),
            explored: CachePadded::new(AtomicU64::new(0)),
        }
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Private state of one pool worker: a pre-allocated frame stack, a best
/// slot, and a local explored tally flushed once per round.
struct Worker {
    stack: Vec<SearchFrame>,
    best: BestSolution,
    explored: u64,
}

impl Worker {
    fn new(n: usize, limit: i32) -> Self {
        Self {
            stack: vec![SearchFrame::default(); n],
            best: BestSolution::new(limit),
            explored: 0,
        }
    }

    fn run(&mut self, job: &PrefixJob, n: usize, bound: &AtomicI32) {
        // Re-check the admission prune against the bound as it is now; the
        // prefix was generated against the initial cap only.
        let snapshot = bound.load(Ordering::Acquire);
        let r = n as i32 - job.marks_count;
        if job.length + r * (r + 1) / 2 >= snapshot {
            return;
        }

        self.stack[0] = job.seed_frame();
        kernel::extend(&mut self.stack, n, &mut self.best, bound, &mut self.explored);
    }
}

// ============================================================================
// Round executor
// ============================================================================

/// Runs one round of jobs on the given pool and returns the round's best
/// solution. `limit` is the `l_max + 1` sentinel used for fresh best slots.
pub fn run_round(
    pool: &rayon::ThreadPool,
    jobs: &[PrefixJob],
    n: usize,
    limit: i32,
    shared: &SharedState,
) -> BestSolution {
    pool.install(|| {
        jobs.par_iter()
            .with_max_len(1)
            .fold(
                || Worker::new(n, limit),
                |mut worker, job| {
                    worker.run(job, n, &shared.bound);
                    worker
                },
            )
            .map(|worker| {
                shared.explored.fetch_add(worker.explored, Ordering::Relaxed);
                worker.best
            })
            .reduce(|| BestSolution::new(limit), BestSolution::merge)
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefix::generate_prefixes;
    use crate::ruler::marks_are_valid;

    fn pool_of(threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    #[test]
    fn round_over_all_prefixes_finds_optimum_order_six() {
        let jobs = generate_prefixes(6, 127, 2);
        assert!(!jobs.is_empty());
        let shared = SharedState::new(128);
        let pool = pool_of(2);

        let best = run_round(&pool, &jobs, 6, 128, &shared);
        assert_eq!(best.length, 17);
        assert!(marks_are_valid(&best.marks));
        assert!(shared.explored.load(Ordering::Relaxed) > 0);
        assert_eq!(shared.bound.load(Ordering::Relaxed), 17);
    }

    #[test]
    fn thread_count_does_not_change_length() {
        let jobs = generate_prefixes(5, 127, 2);
        for threads in [1, 2, 4] {
            let shared = SharedState::new(128);
            let best = run_round(&pool_of(threads), &jobs, 5, 128, &shared);
            assert_eq!(best.length, 11, "threads={threads}");
        }
    }

    #[test]
    fn pre_lowered_bound_yields_nothing_shorter() {
        let jobs = generate_prefixes(6, 127, 2);
        let shared = SharedState::new(128);
        // A bound at the optimum admits nothing strictly shorter.
        shared.bound.store(17, Ordering::Relaxed);

        let best = run_round(&pool_of(2), &jobs, 6, 128, &shared);
        assert!(best.marks.is_empty());
    }
}
