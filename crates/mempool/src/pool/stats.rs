//! Per-pool counters
//!
//! Pools are single-threaded, so every counter is a [`Cell`] and recording is
//! a plain load/store.

use core::cell::Cell;

/// Allocation statistics for one [`MemoryPool`](super::MemoryPool)
#[derive(Debug, Default, Clone)]
pub struct PoolStats {
    allocations: Cell<u64>,
    deallocations: Cell<u64>,
    free_list_hits: Cell<u64>,
    bump_allocations: Cell<u64>,
    blocks_acquired: Cell<u64>,
    peak_live: Cell<u64>,
}

#[inline]
fn bump(cell: &Cell<u64>) {
    cell.set(cell.get() + 1);
}

impl PoolStats {
    pub(crate) fn record_free_list_hit(&self) {
        bump(&self.allocations);
        bump(&self.free_list_hits);
        self.update_peak();
    }

    pub(crate) fn record_bump_allocation(&self) {
        bump(&self.allocations);
        bump(&self.bump_allocations);
        self.update_peak();
    }

    pub(crate) fn record_deallocation(&self) {
        bump(&self.deallocations);
    }

    pub(crate) fn record_block(&self) {
        bump(&self.blocks_acquired);
    }

    fn update_peak(&self) {
        self.peak_live.set(self.peak_live.get().max(self.live_slots()));
    }

    /// Slots handed out since creation
    pub fn allocations(&self) -> u64 {
        self.allocations.get()
    }

    /// Slots returned since creation
    pub fn deallocations(&self) -> u64 {
        self.deallocations.get()
    }

    /// Allocations served from the free list
    pub fn free_list_hits(&self) -> u64 {
        self.free_list_hits.get()
    }

    /// Allocations served from never-used slots
    pub fn bump_allocations(&self) -> u64 {
        self.bump_allocations.get()
    }

    /// Blocks requested from the backing allocator
    pub fn blocks_acquired(&self) -> u64 {
        self.blocks_acquired.get()
    }

    /// Slots currently handed out
    pub fn live_slots(&self) -> u64 {
        self.allocations.get().saturating_sub(self.deallocations.get())
    }

    /// Highest value `live_slots` has reached
    pub fn peak_live_slots(&self) -> u64 {
        self.peak_live.get()
    }

    /// Fraction of allocations served by recycling (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.allocations.get();
        if total == 0 {
            0.0
        } else {
            self.free_list_hits.get() as f64 / total as f64
        }
    }
}
