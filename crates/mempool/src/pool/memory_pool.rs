//! Fixed-size slot pool
//!
//! # Safety
//!
//! This module hands out raw slot pointers under a manual ownership contract:
//! - Blocks are owned by the pool (`blocks`) and released exactly once, in
//!   [`Drop`], newest first, through the allocator that produced them
//! - A slot is in exactly one of three states: never used (between `cursor`
//!   and `end`), handed out, or on the free list
//! - Only free-list slots are read as links; handed-out slots belong to the
//!   caller until [`MemoryPool::deallocate`]
//! - `allocate` never constructs and `deallocate` never drops; the pool never
//!   runs destructors, including at teardown

use core::alloc::Layout;
use core::fmt;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::block::Block;
use super::slot::Slot;
use super::{PoolConfig, PoolStats};
use crate::allocator::{BlockAllocator, SystemAllocator};
use crate::error::{MemoryError, MemoryResult};

/// Pool of fixed-size slots for values of one type
///
/// Memory is requested from `A` one block at a time. Each block is split into
/// slots; slots are served from the free list first, then from the unused
/// tail of the newest block, and only when both are exhausted is another
/// block requested. Blocks are returned to `A` only when the pool is dropped.
///
/// # Example
/// ```
/// use nebula_mempool::pool::MemoryPool;
///
/// let mut pool = MemoryPool::<String>::new()?;
///
/// let slot = pool.allocate()?;
/// unsafe {
///     pool.construct(slot, String::from("pooled"));
///     assert_eq!(slot.as_ref(), "pooled");
///     pool.destroy(slot);
///     pool.deallocate(slot);
/// }
///
/// // Freed slots are handed out again, most recent first
/// assert_eq!(pool.allocate()?, slot);
/// # Ok::<(), nebula_mempool::MemoryError>(())
/// ```
pub struct MemoryPool<T, A: BlockAllocator = SystemAllocator> {
    allocator: A,
    config: PoolConfig,
    block_layout: Layout,
    /// Every block acquired so far, oldest first
    blocks: Vec<Block>,
    free_list: Option<NonNull<Slot<T>>>,
    /// Next never-used slot of the newest block
    cursor: *mut Slot<T>,
    /// One past the last whole slot of the newest block
    end: *mut Slot<T>,
    stats: PoolStats,
}

impl<T> MemoryPool<T> {
    /// Create a pool with the default configuration on the global heap
    pub fn new() -> MemoryResult<Self> {
        Self::with_config(PoolConfig::default())
    }

    /// Create a pool with custom configuration on the global heap
    pub fn with_config(config: PoolConfig) -> MemoryResult<Self> {
        Self::with_allocator(config, SystemAllocator)
    }
}

impl<T, A: BlockAllocator> MemoryPool<T, A> {
    /// Create a pool that takes its blocks from `allocator`
    ///
    /// Fails with [`MemoryError::InvalidConfig`] if a block cannot hold a
    /// single slot of `T`. No memory is requested until the first allocation.
    pub fn with_allocator(config: PoolConfig, allocator: A) -> MemoryResult<Self> {
        let block_layout = Self::block_layout(&config)?;

        Ok(Self {
            allocator,
            config,
            block_layout,
            blocks: Vec::new(),
            free_list: None,
            cursor: ptr::null_mut(),
            end: ptr::null_mut(),
            stats: PoolStats::default(),
        })
    }

    fn block_layout(config: &PoolConfig) -> MemoryResult<Layout> {
        if config.block_size < Slot::<T>::SIZE {
            return Err(MemoryError::invalid_pool_config(&format!(
                "block size {} is smaller than slot size {} of {}",
                config.block_size,
                Slot::<T>::SIZE,
                core::any::type_name::<T>(),
            )));
        }

        Layout::from_size_align(config.block_size, Slot::<T>::ALIGN)
            .map_err(|_| MemoryError::size_overflow("pool block layout"))
    }

    /// Create an empty pool for another type sharing this configuration
    ///
    /// The new pool clones the backing allocator and has its own blocks, free
    /// list and statistics. Use it when a consumer needs storage for a type
    /// derived from `T`, such as a node wrapping it.
    pub fn rebind<U>(&self) -> MemoryResult<MemoryPool<U, A>>
    where
        A: Clone,
    {
        #[cfg(feature = "logging")]
        trace!(
            from = core::any::type_name::<T>(),
            to = core::any::type_name::<U>(),
            block_size = self.config.block_size,
            "rebinding pool"
        );

        MemoryPool::with_allocator(self.config.clone(), self.allocator.clone())
    }

    /// Hand out one uninitialized slot
    ///
    /// The free list is consulted first, then the unused tail of the newest
    /// block; a new block is requested only when both are empty. If that
    /// request fails the error is returned and the pool is left as it was.
    pub fn allocate(&mut self) -> MemoryResult<NonNull<T>> {
        let slot = if let Some(head) = self.free_list {
            // SAFETY: `head` is on the free list, so its link is initialized.
            self.free_list = unsafe { Slot::next(head) };
            self.stats.record_free_list_hit();
            head
        } else {
            if self.cursor >= self.end {
                self.grow()?;
            }

            // SAFETY: `grow` (or an earlier one) left cursor < end, both inside
            // the newest block, so cursor is non-null and in bounds.
            let slot = unsafe { NonNull::new_unchecked(self.cursor) };
            // SAFETY: cursor < end, so cursor + 1 is at most one past the last slot.
            self.cursor = unsafe { self.cursor.add(1) };
            self.stats.record_bump_allocation();
            slot
        };

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: The slot is owned by this pool and spans Slot::SIZE bytes.
            unsafe { slot.cast::<u8>().as_ptr().write_bytes(pattern, Slot::<T>::SIZE) };
        }

        // SAFETY: `slot` points into one of our blocks.
        Ok(unsafe { Slot::element(slot) })
    }

    /// Hand out `count` slots; only `count == 1` is supported
    ///
    /// Any other count returns [`MemoryError::InvalidOperation`] without
    /// touching the pool.
    pub fn allocate_n(&mut self, count: usize) -> MemoryResult<NonNull<T>> {
        if count != 1 {
            return Err(MemoryError::unsupported_count(count));
        }
        self.allocate()
    }

    /// Request a new block and point the cursor at its first slot
    fn grow(&mut self) -> MemoryResult<()> {
        let base = self.allocator.acquire_block(self.block_layout)?;

        // SAFETY: The allocator returned a block valid for `block_layout`.
        let block = unsafe {
            Block::carve(base, self.block_layout, Slot::<T>::SIZE, Slot::<T>::ALIGN)
        };
        debug_assert!(block.slots() > 0, "block must hold at least one slot");

        let first = block.first().as_ptr().cast::<Slot<T>>();
        self.cursor = first;
        // SAFETY: `slots` whole slots fit after `first`, so the end marker is
        // within the block or one past it.
        self.end = unsafe { first.add(block.slots()) };
        self.blocks.push(block);
        self.stats.record_block();

        #[cfg(feature = "logging")]
        debug!(
            block = self.blocks.len(),
            block_size = self.block_layout.size(),
            slots = self.slots_per_block(),
            allocator = self.allocator.name(),
            "pool acquired block"
        );

        Ok(())
    }

    /// Return a slot to the free list
    ///
    /// The slot is handed out by the next [`allocate`](Self::allocate). Its
    /// content is not dropped and no memory goes back to the allocator.
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by `allocate` on this pool
    /// - `ptr` must not have been deallocated since
    /// - Any value constructed in the slot must already be destroyed or moved out
    pub unsafe fn deallocate(&mut self, ptr: NonNull<T>) {
        debug_assert!(self.owns(ptr), "slot was not allocated by this pool");

        let slot = Slot::from_element(ptr);

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: Caller guarantees the slot is ours and no longer in use.
            unsafe { slot.cast::<u8>().as_ptr().write_bytes(pattern, Slot::<T>::SIZE) };
        }

        // SAFETY: The slot holds no live value (caller contract), so it can
        // become a free-list link.
        unsafe { Slot::set_next(slot, self.free_list) };
        self.free_list = Some(slot);
        self.stats.record_deallocation();
    }

    /// Return `count` slots; only `count == 1` is supported
    ///
    /// # Safety
    ///
    /// Same as [`deallocate`](Self::deallocate).
    pub unsafe fn deallocate_n(&mut self, ptr: NonNull<T>, count: usize) {
        debug_assert_eq!(count, 1, "pool serves exactly one slot per request");
        // SAFETY: Caller's guarantees are forwarded unchanged.
        unsafe { self.deallocate(ptr) }
    }

    /// Initialize the slot at `ptr` with `value`
    ///
    /// # Safety
    ///
    /// `ptr` must be a slot of this pool that is allocated and holds no value.
    #[inline]
    pub unsafe fn construct(&self, ptr: NonNull<T>, value: T) {
        // SAFETY: Caller guarantees the slot is allocated and unconstructed.
        unsafe { ptr.write(value) }
    }

    /// Initialize the slot at `ptr` with the value produced by `init`
    ///
    /// # Safety
    ///
    /// Same as [`construct`](Self::construct).
    #[inline]
    pub unsafe fn construct_with<F>(&self, ptr: NonNull<T>, init: F)
    where
        F: FnOnce() -> T,
    {
        // SAFETY: Caller's guarantees are forwarded unchanged.
        unsafe { self.construct(ptr, init()) }
    }

    /// Run the destructor of the value at `ptr`, keeping the slot allocated
    ///
    /// # Safety
    ///
    /// `ptr` must be a slot of this pool holding a constructed value, which
    /// must not be used afterwards.
    #[inline]
    pub unsafe fn destroy(&self, ptr: NonNull<T>) {
        // SAFETY: Caller guarantees a live value sits at ptr.
        unsafe { ptr.drop_in_place() }
    }

    /// Allocate a slot and move `value` into it
    pub fn insert(&mut self, value: T) -> MemoryResult<NonNull<T>> {
        let ptr = self.allocate()?;
        // SAFETY: Fresh slot from `allocate`, nothing constructed in it yet.
        unsafe { self.construct(ptr, value) };
        Ok(ptr)
    }

    /// Move the value out of `ptr` and deallocate its slot
    ///
    /// # Safety
    ///
    /// `ptr` must be a slot of this pool holding a constructed value, and must
    /// not be used afterwards.
    pub unsafe fn remove(&mut self, ptr: NonNull<T>) -> T {
        // SAFETY: Caller guarantees a live value; reading moves it out, so the
        // slot is unconstructed again before it is deallocated.
        unsafe {
            let value = ptr.read();
            self.deallocate(ptr);
            value
        }
    }

    /// Whether `ptr` is a slot boundary inside one of this pool's blocks
    ///
    /// Says nothing about whether the slot is currently handed out.
    pub fn owns(&self, ptr: NonNull<T>) -> bool {
        let addr = ptr.as_ptr() as usize;
        self.blocks
            .iter()
            .any(|block| block.holds_slot(addr, Slot::<T>::SIZE))
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Backing block allocator
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Allocation statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Bytes between consecutive slots
    pub fn slot_size(&self) -> usize {
        Slot::<T>::SIZE
    }

    /// Alignment of every slot
    pub fn slot_align(&self) -> usize {
        Slot::<T>::ALIGN
    }

    /// Slots carved from each block
    ///
    /// Blocks are requested with slot alignment, so every block holds the
    /// same number.
    pub fn slots_per_block(&self) -> usize {
        self.config.block_size / Slot::<T>::SIZE
    }

    /// Blocks acquired so far
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total slots across all blocks, whatever their state
    pub fn capacity(&self) -> usize {
        self.blocks.iter().map(Block::slots).sum()
    }
}

impl<T, A: BlockAllocator> Drop for MemoryPool<T, A> {
    fn drop(&mut self) {
        #[cfg(feature = "logging")]
        let released = self.blocks.len();

        while let Some(block) = self.blocks.pop() {
            // SAFETY: Every block was acquired from `allocator` with
            // `block_layout` and is released exactly once, here.
            unsafe { self.allocator.release_block(block.base(), self.block_layout) };
        }

        #[cfg(feature = "logging")]
        {
            if released > 0 {
                debug!(
                    blocks = released,
                    live_slots = self.stats.live_slots(),
                    "pool released blocks"
                );
            }
        }
    }
}

impl<T, A: BlockAllocator> fmt::Debug for MemoryPool<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPool")
            .field("type", &core::any::type_name::<T>())
            .field("allocator", &self.allocator.name())
            .field("block_size", &self.config.block_size)
            .field("slot_size", &Slot::<T>::SIZE)
            .field("blocks", &self.blocks.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
