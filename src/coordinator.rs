//! The rank driver: partitions the prefix list across ranks, keeps every
//! rank's bound tight through periodic collectives, and assembles one
//! answer for all.
//!
//! Partitioning is static — rank `r` owns every prefix whose index is
//! `r mod size` — because with thousands of fine-grained prefixes per worker
//! the variance evens out without a master handing out work. Rounds are
//! sized so the freshest bound crosses rank boundaries every `round_size`
//! prefixes, and every rank participates in the same number of rounds even
//! after its own jobs run out; anything else deadlocks the collectives.

use crate::comm::Collectives;
use crate::construction::greedy_ruler;
use crate::error::SearchError;
use crate::kernel::{self, BestSolution};
use crate::pool::{run_round, SharedState};
use crate::prefix::{generate_prefixes, prefix_depth, PrefixJob};
use crate::ruler::GolombRuler;
use crate::search::SearchConfig;
use std::sync::atomic::Ordering;

/// What one rank reports after the final reduction. Identical on every rank.
#[derive(Clone, Debug)]
pub struct RankOutcome {
    /// The winning ruler, or `None` if no ruler fit the cap.
    pub ruler: Option<GolombRuler>,
    /// Frames visited, summed over all ranks.
    pub states_explored: u64,
}

/// Runs one rank of the search to completion.
///
/// Every rank executes this with the same configuration; collective calls
/// line up by construction. The caller owns the rayon pool so rank threads
/// never share workers.
pub fn run_rank<C: Collectives>(
    comm: &C,
    pool: &rayon::ThreadPool,
    cfg: &SearchConfig,
) -> Result<RankOutcome, SearchError> {
    let limit = cfg.max_len + 1;
    let shared = SharedState::new(limit);
    let mut process_best = BestSolution::new(limit);

    // Optional warm start. The greedy ruler is deterministic, so every rank
    // seeds the same bound and keeps the same fallback solution.
    if cfg.greedy_warm_start {
        if let Some(ruler) = greedy_ruler(cfg.n, cfg.max_len) {
            process_best.length = ruler.length;
            process_best.marks = ruler.marks;
            kernel::fold_min(&shared.bound, process_best.length);
        }
    }

    // Identical generation on every rank; only the modulo slice differs.
    let depth = cfg
        .prefix_depth
        .unwrap_or_else(|| prefix_depth(cfg.n, comm.size() * cfg.threads_per_proc));
    let my_jobs: Vec<PrefixJob> = generate_prefixes(cfg.n, cfg.max_len, depth)
        .into_iter()
        .enumerate()
        .filter(|(i, _)| i % comm.size() == comm.rank())
        .map(|(_, job)| job)
        .collect();

    // Agree on the round count up front so exhausted ranks keep answering
    // the bound collectives.
    let max_jobs = comm.all_reduce_max_i32(my_jobs.len() as i32)? as usize;
    let rounds = max_jobs.div_ceil(cfg.round_size);

    let mut next = 0usize;
    for _ in 0..rounds {
        let end = (next + cfg.round_size).min(my_jobs.len());
        if next < end {
            let round_best = run_round(pool, &my_jobs[next..end], cfg.n, limit, &shared);
            process_best = process_best.merge(round_best);
            next = end;
        }

        let mine = shared.bound.load(Ordering::Acquire);
        let reduced = comm.all_reduce_min_i32(mine)?;
        kernel::fold_min(&shared.bound, reduced);
    }

    // Final reduction: agree on the winning length, elect the lowest rank
    // that holds a ruler of that length, and ship its marks to everyone.
    comm.barrier()?;
    let best_len = comm.all_reduce_min_i32(process_best.length)?;

    let claim = if process_best.length == best_len && !process_best.marks.is_empty() {
        comm.rank() as i32
    } else {
        comm.size() as i32
    };
    let winner = comm.all_reduce_min_i32(claim)?;

    let ruler = if winner < comm.size() as i32 {
        let winner = winner as usize;
        let mut count = [if comm.rank() == winner {
            process_best.marks.len() as i32
        } else {
            0
        }];
        comm.broadcast_i32s(winner, &mut count)?;

        let mut marks = vec![0i32; count[0] as usize];
        if comm.rank() == winner {
            marks.copy_from_slice(&process_best.marks);
        }
        comm.broadcast_i32s(winner, &mut marks)?;
        Some(GolombRuler::from_marks(marks))
    } else {
        None
    };

    let states_explored = comm.all_reduce_sum_u64(shared.explored.load(Ordering::Relaxed))?;

    Ok(RankOutcome {
        ruler,
        states_explored,
    })
}

// ============================================================================
// Tests
// ============================================================================
