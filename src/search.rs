//! Search configuration and top-level entry points.
//!
//! `run_search` validates the configuration, spins up one rank per process
//! slot (each with a private rayon pool), runs the coordinator on every
//! rank, and returns rank 0's outcome — which the final reduction guarantees
//! is every rank's outcome.

use crate::comm::{SharedHub, SoloComm};
use crate::coordinator::{run_rank, RankOutcome};
use crate::error::SearchError;
use crate::ruler::{GolombRuler, MAX_LEN, MAX_MARKS};
use std::thread;

// ============================================================================
// Configuration
// ============================================================================

/// Search parameters. The defaults describe a single-process run using every
/// logical core.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Ruler order: number of marks, in `[2, 24]`.
    pub n: usize,
    /// Inclusive length cap, in `[0, 127]`. The search returns the shortest
    /// ruler no longer than this, or nothing.
    pub max_len: i32,
    /// Number of ranks (process slots).
    pub procs: usize,
    /// Worker threads per rank.
    pub threads_per_proc: usize,
    /// Prefixes processed between two bound-synchronization collectives.
    pub round_size: usize,
    /// Prefix depth override; `None` selects by order and worker count.
    pub prefix_depth: Option<usize>,
    /// Seed the bound with a greedy feasible ruler before searching.
    pub greedy_warm_start: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let threads = thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(1);
        Self {
            n: 11,
            max_len: MAX_LEN,
            procs: 1,
            threads_per_proc: threads,
            round_size: 64,
            prefix_depth: None,
            greedy_warm_start: false,
        }
    }
}

impl SearchConfig {
    /// Validates every boundary precondition.
    ///
    /// # Errors
    /// Returns the first violated precondition; no search work is started.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.n < 2 || self.n > MAX_MARKS {
            return Err(SearchError::InvalidOrder(self.n));
        }
        if self.max_len < 0 || self.max_len > MAX_LEN {
            return Err(SearchError::InvalidBound(self.max_len));
        }
        if self.procs == 0 || self.threads_per_proc == 0 {
            return Err(SearchError::InvalidWorkers {
                procs: self.procs,
                threads: self.threads_per_proc,
            });
        }
        if self.round_size == 0 {
            return Err(SearchError::InvalidRoundSize);
        }
        Ok(())
    }
}

// ============================================================================
// Report
// ============================================================================

/// The outcome of a completed search.
#[derive(Clone, Debug)]
pub struct SearchReport {
    /// The shortest ruler within the cap, or `None` if none exists.
    pub ruler: Option<GolombRuler>,
    /// Frames visited, summed over every worker of every rank.
    pub states_explored: u64,
}

impl From<RankOutcome> for SearchReport {
    fn from(outcome: RankOutcome) -> Self {
        Self {
            ruler: outcome.ruler,
            states_explored: outcome.states_explored,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Runs a search with explicit configuration.
///
/// # Errors
/// Returns a validation error before any work starts, or a runtime error if
/// a pool cannot be built or a rank fails mid-collective.
pub fn run_search(cfg: &SearchConfig) -> Result<SearchReport, SearchError> {
    cfg.validate()?;

    if cfg.procs == 1 {
        let pool = build_pool(cfg.threads_per_proc)?;
        return run_rank(&SoloComm, &pool, cfg).map(SearchReport::from);
    }

    // Build every pool before the first rank starts: a rank that dies
    // before its first collective would strand the others mid-barrier.
    let pools = (0..cfg.procs)
        .map(|_| build_pool(cfg.threads_per_proc))
        .collect::<Result<Vec<_>, _>>()?;

    let hub = SharedHub::new(cfg.procs);
    let outcomes: Vec<Result<RankOutcome, SearchError>> = thread::scope(|scope| {
        let handles: Vec<_> = pools
            .into_iter()
            .enumerate()
            .map(|(rank, pool)| {
                let comm = hub.attach(rank);
                scope.spawn(move || run_rank(&comm, &pool, cfg))
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .map_err(|_| SearchError::RankPanicked(rank))
                    .and_then(|outcome| outcome)
            })
            .collect()
    });

    // The final reduction makes every rank's outcome identical; report
    // rank 0's, but surface any rank's failure.
    let mut first: Option<RankOutcome> = None;
    for outcome in outcomes {
        let outcome = outcome?;
        first.get_or_insert(outcome);
    }
    Ok(SearchReport::from(first.expect("at least one rank")))
}

/// Searches for the shortest order-`n` ruler no longer than `max_len`,
/// using `workers` threads in a single process.
///
/// # Errors
/// Returns a validation error for out-of-range arguments.
pub fn search(n: usize, max_len: i32, workers: usize) -> Result<SearchReport, SearchError> {
    run_search(&SearchConfig {
        n,
        max_len,
        procs: 1,
        threads_per_proc: workers,
        ..SearchConfig::default()
    })
}

fn build_pool(threads: usize) -> Result<rayon::ThreadPool, SearchError> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_arguments() {
        assert!(matches!(
            search(1, 127, 1),
            Err(SearchError::InvalidOrder(1))
        ));
        assert!(matches!(
            search(25, 127, 1),
            Err(SearchError::InvalidOrder(25))
        ));
        assert!(matches!(
            search(5, 128, 1),
            Err(SearchError::InvalidBound(128))
        ));
        assert!(matches!(
            search(5, -1, 1),
            Err(SearchError::InvalidBound(-1))
        ));
        assert!(matches!(
            search(5, 127, 0),
            Err(SearchError::InvalidWorkers { .. })
        ));

        let cfg = SearchConfig {
            round_size: 0,
            ..SearchConfig::default()
        };
        assert!(matches!(
            run_search(&cfg),
            Err(SearchError::InvalidRoundSize)
        ));
    }

    #[test]
    fn finds_optimum_order_five() {
        let report = search(5, 127, 2).unwrap();
        let ruler = report.ruler.unwrap();
        assert_eq!(ruler.length, 11);
        assert!(ruler.is_valid());
        assert!(report.states_explored > 0);
    }

    #[test]
    fn worker_count_does_not_change_length() {
        let baseline = search(5, 127, 1).unwrap().ruler.unwrap().length;
        for workers in [2, 3] {
            assert_eq!(
                search(5, 127, workers).unwrap().ruler.unwrap().length,
                baseline
            );
        }
    }

    #[test]
    fn multi_rank_run_matches_solo_run() {
        let solo = search(6, 127, 2).unwrap().ruler.unwrap();

        let cfg = SearchConfig {
            n: 6,
            max_len: 127,
            procs: 2,
            threads_per_proc: 1,
            round_size: 8,
            ..SearchConfig::default()
        };
        let multi = run_search(&cfg).unwrap().ruler.unwrap();
        assert_eq!(multi.length, solo.length);
        assert!(multi.is_valid());
    }

    #[test]
    fn empty_result_within_cap_is_ok() {
        let report = search(5, 10, 1).unwrap();
        assert!(report.ruler.is_none());
    }
}
