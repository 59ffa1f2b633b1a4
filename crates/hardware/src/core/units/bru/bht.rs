//! Branch History Table Predictor.
//!
//! A direct-mapped table of 2-bit saturating counters indexed by the
//! fall-through address. Counters start at 3 (strongly taken); values of 2
//! and 3 predict taken.
//!
//! # Performance
//!
//! - **Time Complexity:** O(1) for both `predict()` and `feedback()`
//! - **Space Complexity:** 4096 bytes
//! - **Worst Case:** two hot branches aliasing to the same slot

use super::BranchPredictor;

/// Number of counters in the table.
pub const TABLE_SIZE: usize = 4096;

/// Reset value of every counter.
const INITIAL_COUNTER: u8 = 3;

/// Largest counter value.
const COUNTER_MAX: u8 = 3;

/// Smallest counter value that predicts taken.
const TAKEN_THRESHOLD: u8 = 2;

/// 2-bit branch history table.
#[derive(Clone, Debug)]
pub struct BhtPredictor {
    /// Saturating counters.
    table: Vec<u8>,
}

impl Default for BhtPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl BhtPredictor {
    /// Creates a table with every counter strongly taken.
    pub fn new() -> Self {
        Self {
            table: vec![INITIAL_COUNTER; TABLE_SIZE],
        }
    }

    /// Slot for a branch whose fall-through address is `next_pc`.
    ///
    /// Instructions are at least 2-byte aligned, so bit 0 carries nothing.
    #[inline]
    const fn index(next_pc: u64) -> usize {
        ((next_pc >> 1) % TABLE_SIZE as u64) as usize
    }

    /// Current counter value for `next_pc`.
    pub fn counter(&self, next_pc: u64) -> u8 {
        self.table[Self::index(next_pc)]
    }
}

impl BranchPredictor for BhtPredictor {
    fn predict(&self, next_pc: u64, target_pc: u64) -> u64 {
        if self.counter(next_pc) >= TAKEN_THRESHOLD {
            target_pc
        } else {
            next_pc
        }
    }

    fn feedback(&mut self, next_pc: u64, taken: bool) {
        let slot = &mut self.table[Self::index(next_pc)];
        if taken {
            *slot = (*slot + 1).min(COUNTER_MAX);
        } else {
            *slot = slot.saturating_sub(1);
        }
    }

    fn name(&self) -> &'static str {
        "2-bit branch history table"
    }
}
