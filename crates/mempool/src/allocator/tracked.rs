//! Instrumented block allocator
//!
//! Wraps another [`BlockAllocator`] and keeps running totals of what has been
//! acquired and released. Pools are single-threaded, so the counters are
//! plain [`Cell`]s rather than atomics.

use core::alloc::Layout;
use core::cell::Cell;
use core::fmt;
use core::ptr::NonNull;

use super::{BlockAllocator, SystemAllocator};
use crate::error::{MemoryError, MemoryResult};

/// Point-in-time snapshot of a [`TrackedAllocator`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackedStats {
    /// Blocks acquired and not yet released
    pub live_blocks: usize,
    /// Bytes acquired and not yet released
    pub live_bytes: usize,
    /// Highest value `live_blocks` has reached
    pub peak_blocks: usize,
    /// Successful acquisitions since creation
    pub total_acquired: u64,
    /// Releases since creation
    pub total_released: u64,
    /// Acquisitions refused by the inner allocator or the block limit
    pub failed_acquisitions: u64,
}

/// Block allocator wrapper that counts outstanding blocks and bytes
///
/// An optional block limit turns it into a bounded source: once `limit`
/// blocks are live, further requests fail with
/// [`MemoryError::AllocationFailed`] without reaching the inner allocator.
///
/// # Example
/// ```
/// use nebula_mempool::allocator::TrackedAllocator;
/// use nebula_mempool::pool::{MemoryPool, PoolConfig};
///
/// let tracked = TrackedAllocator::system();
/// {
///     let mut pool = MemoryPool::<u64, _>::with_allocator(PoolConfig::default(), &tracked)?;
///     let _slot = pool.allocate()?;
///     assert_eq!(tracked.live_blocks(), 1);
/// }
/// assert_eq!(tracked.live_blocks(), 0);
/// # Ok::<(), nebula_mempool::MemoryError>(())
/// ```
pub struct TrackedAllocator<A = SystemAllocator> {
    inner: A,
    limit: Option<usize>,
    live_blocks: Cell<usize>,
    live_bytes: Cell<usize>,
    peak_blocks: Cell<usize>,
    total_acquired: Cell<u64>,
    total_released: Cell<u64>,
    failed_acquisitions: Cell<u64>,
}

impl TrackedAllocator<SystemAllocator> {
    /// Track blocks taken from the global heap
    pub fn system() -> Self {
        Self::new(SystemAllocator)
    }
}

impl<A: BlockAllocator> TrackedAllocator<A> {
    /// Wrap `inner` without a block limit
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            limit: None,
            live_blocks: Cell::new(0),
            live_bytes: Cell::new(0),
            peak_blocks: Cell::new(0),
            total_acquired: Cell::new(0),
            total_released: Cell::new(0),
            failed_acquisitions: Cell::new(0),
        }
    }

    /// Wrap `inner`, refusing requests once `limit` blocks are live
    pub fn with_block_limit(inner: A, limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(inner)
        }
    }

    /// Blocks acquired and not yet released
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.get()
    }

    /// Bytes acquired and not yet released
    pub fn live_bytes(&self) -> usize {
        self.live_bytes.get()
    }

    /// Successful acquisitions since creation
    pub fn total_acquired(&self) -> u64 {
        self.total_acquired.get()
    }

    /// Snapshot all counters
    pub fn stats(&self) -> TrackedStats {
        TrackedStats {
            live_blocks: self.live_blocks.get(),
            live_bytes: self.live_bytes.get(),
            peak_blocks: self.peak_blocks.get(),
            total_acquired: self.total_acquired.get(),
            total_released: self.total_released.get(),
            failed_acquisitions: self.failed_acquisitions.get(),
        }
    }

    /// Get the wrapped allocator
    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn record_failure(&self, err: MemoryError) -> MemoryError {
        self.failed_acquisitions.set(self.failed_acquisitions.get() + 1);
        err
    }
}

// SAFETY: Blocks come from `inner`, which upholds the contract; the wrapper
// only observes sizes.
unsafe impl<A: BlockAllocator> BlockAllocator for TrackedAllocator<A> {
    fn acquire_block(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        if self.limit.is_some_and(|limit| self.live_blocks.get() >= limit) {
            return Err(self.record_failure(MemoryError::allocation_failed_with_layout(layout)));
        }

        let ptr = self
            .inner
            .acquire_block(layout)
            .map_err(|err| self.record_failure(err))?;

        let live = self.live_blocks.get() + 1;
        self.live_blocks.set(live);
        self.live_bytes.set(self.live_bytes.get() + layout.size());
        self.peak_blocks.set(self.peak_blocks.get().max(live));
        self.total_acquired.set(self.total_acquired.get() + 1);

        Ok(ptr)
    }

    unsafe fn release_block(&self, ptr: NonNull<u8>, layout: Layout) {
        debug_assert!(self.live_blocks.get() > 0, "release without acquire");

        self.live_blocks.set(self.live_blocks.get().saturating_sub(1));
        self.live_bytes
            .set(self.live_bytes.get().saturating_sub(layout.size()));
        self.total_released.set(self.total_released.get() + 1);

        // SAFETY: Caller's guarantees are forwarded unchanged.
        unsafe { self.inner.release_block(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        "tracked"
    }
}

impl<A> fmt::Debug for TrackedAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedAllocator")
            .field("limit", &self.limit)
            .field("live_blocks", &self.live_blocks.get())
            .field("live_bytes", &self.live_bytes.get())
            .field("total_acquired", &self.total_acquired.get())
            .finish_non_exhaustive()
    }
}
