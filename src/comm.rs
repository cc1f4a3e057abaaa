//! The collective contract between ranks, and two in-tree realizations.
//!
//! The coordinator needs exactly five collectives: barrier, all-reduce-min,
//! all-reduce-max, all-reduce-sum, and a small integer broadcast. They are
//! consumed through the [`Collectives`] trait so the rank driver is
//! indifferent to the transport. `SoloComm` is the single-rank degenerate
//! case; `SharedComm` runs any number of ranks as threads of one process
//! with standard collective semantics, which is how the whole distributed
//! layer is exercised without an external launcher.

use crate::error::CommError;
use crossbeam::utils::CachePadded;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Barrier, Mutex};

// ============================================================================
// Contract
// ============================================================================

/// Rank identity plus the collective operations the coordinator consumes.
///
/// Every rank of a communicator must call the same collectives in the same
/// order; a failure is fatal to the search.
pub trait Collectives {
    /// This rank's index in `[0, size)`.
    fn rank(&self) -> usize;

    /// Number of participating ranks.
    fn size(&self) -> usize;

    /// Blocks until every rank has arrived.
    fn barrier(&self) -> Result<(), CommError>;

    /// Reduces `value` with minimum across all ranks; every rank receives
    /// the result.
    fn all_reduce_min_i32(&self, value: i32) -> Result<i32, CommError>;

    /// Reduces `value` with maximum across all ranks; every rank receives
    /// the result.
    fn all_reduce_max_i32(&self, value: i32) -> Result<i32, CommError>;

    /// Reduces `value` with addition across all ranks; every rank receives
    /// the result.
    fn all_reduce_sum_u64(&self, value: u64) -> Result<u64, CommError>;

    /// Copies `buf` from `root` to every rank. All ranks must pass buffers
    /// of the same length.
    fn broadcast_i32s(&self, root: usize, buf: &mut [i32]) -> Result<(), CommError>;
}

// ============================================================================
// SoloComm
// ============================================================================

/// The one-rank communicator: every collective is the identity and none can
/// fail. The distributed coordinator degenerates to the local pool under it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoloComm;

impl Collectives for SoloComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }

    fn all_reduce_min_i32(&self, value: i32) -> Result<i32, CommError> {
        Ok(value)
    }

    fn all_reduce_max_i32(&self, value: i32) -> Result<i32, CommError> {
        Ok(value)
    }

    fn all_reduce_sum_u64(&self, value: u64) -> Result<u64, CommError> {
        Ok(value)
    }

    fn broadcast_i32s(&self, _root: usize, _buf: &mut [i32]) -> Result<(), CommError> {
        Ok(())
    }
}

// ============================================================================
// SharedComm
// ============================================================================

/// Shared collective state for a set of ranks running as threads of one
/// process.
///
/// Reductions go through per-rank contribution slots bracketed by two
/// barrier phases: the first publishes every contribution before anyone
/// reads, the second keeps a fast rank from overwriting a slot while a slow
/// one is still reading. Broadcasts stage through a single shared buffer the
/// same way.
pub struct SharedHub {
    size: usize,
    barrier: Barrier,
    slots: Vec<CachePadded<AtomicI64>>,
    stage: Mutex<Vec<i32>>,
}

impl SharedHub {
    /// Creates the hub for `size` ranks. Works for any positive size, not
    /// just powers of two.
    pub fn new(size: usize) -> Arc<Self> {
        assert!(size > 0, "a communicator needs at least one rank");
        Arc::new(Self {
            size,
            barrier: Barrier::new(size),
            slots: (0..size).map(|_| CachePadded::new(AtomicI64::new(0))).collect(),
            stage: Mutex::new(Vec::new()),
        })
    }

    /// Binds one rank to the hub.
    pub fn attach(self: &Arc<Self>, rank: usize) -> SharedComm {
        assert!(rank < self.size, "rank {rank} out of range");
        SharedComm {
            rank,
            hub: Arc::clone(self),
        }
    }
}

/// One rank's handle onto a [`SharedHub`].
pub struct SharedComm {
    rank: usize,
    hub: Arc<SharedHub>,
}

impl SharedComm {
    fn reduce_with(&self, value: i64, combine: impl Fn(i64, i64) -> i64) -> i64 {
        let hub = &self.hub;
        hub.slots[self.rank].store(value, Ordering::Release);
        hub.barrier.wait();
        let mut acc = hub.slots[0].load(Ordering::Acquire);
        for slot in &hub.slots[1..] {
            acc = combine(acc, slot.load(Ordering::Acquire));
        }
        hub.barrier.wait();
        acc
    }
}

impl Collectives for SharedComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.hub.size
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.hub.barrier.wait();
        Ok(())
    }

    fn all_reduce_min_i32(&self, value: i32) -> Result<i32, CommError> {
        Ok(self.reduce_with(i64::from(value), i64::min) as i32)
    }

    fn all_reduce_max_i32(&self, value: i32) -> Result<i32, CommError> {
        Ok(self.reduce_with(i64::from(value), i64::max) as i32)
    }

    fn all_reduce_sum_u64(&self, value: u64) -> Result<u64, CommError> {
        // Explored-state tallies fit i64 comfortably within the supported
        // orders; saturate rather than wrap if they ever do not.
        let v = i64::try_from(value).unwrap_or(i64::MAX);
        Ok(self.reduce_with(v, i64::saturating_add) as u64)
    }

    fn broadcast_i32s(&self, root: usize, buf: &mut [i32]) -> Result<(), CommError> {
        let hub = &self.hub;
        if root >= hub.size {
            return Err(CommError::InvalidRoot {
                root,
                size: hub.size,
            });
        }

        if self.rank == root {
            let mut stage = hub.stage.lock().map_err(|_| CommError::Poisoned)?;
            stage.clear();
            stage.extend_from_slice(buf);
        }
        hub.barrier.wait();

        // Read (and length-check) before the closing barrier so a mismatch
        // is reported without stranding peers mid-collective.
        let mismatch = if self.rank == root {
            None
        } else {
            match hub.stage.lock() {
                Ok(stage) if stage.len() == buf.len() => {
                    buf.copy_from_slice(&stage);
                    None
                }
                Ok(stage) => Some(CommError::LengthMismatch {
                    rank: self.rank,
                    expected: stage.len(),
                    got: buf.len(),
                }),
                Err(_) => Some(CommError::Poisoned),
            }
        };
        hub.barrier.wait();

        match mismatch {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
