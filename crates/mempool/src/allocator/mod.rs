//! Block-level allocators backing the pools
//!
//! A [`MemoryPool`](crate::pool::MemoryPool) never talks to the global heap
//! directly. It requests whole blocks through a [`BlockAllocator`], which makes
//! the "system allocator" replaceable: [`SystemAllocator`] forwards to the
//! global allocator, [`TrackedAllocator`] wraps another allocator and counts
//! what is still outstanding.

mod system;
mod tracked;

pub use system::SystemAllocator;
pub use tracked::{TrackedAllocator, TrackedStats};

use core::alloc::Layout;
use core::ptr::NonNull;

use crate::error::MemoryResult;

/// Source of raw memory blocks for a pool
///
/// # Safety
///
/// Implementors must return blocks that are valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and not aliased by any
/// other live allocation until handed back through
/// [`release_block`](Self::release_block).
pub unsafe trait BlockAllocator {
    /// Acquire a block described by `layout`
    ///
    /// Zero-sized layouts are rejected with
    /// [`MemoryError::InvalidLayout`](crate::MemoryError::InvalidLayout).
    fn acquire_block(&self, layout: Layout) -> MemoryResult<NonNull<u8>>;

    /// Return a block to the allocator
    ///
    /// # Safety
    ///
    /// - `ptr` must have been returned by `acquire_block` on this allocator with `layout`
    /// - `ptr` must not be used after this call
    /// - Must not be called more than once for the same block
    unsafe fn release_block(&self, ptr: NonNull<u8>, layout: Layout);

    /// Get allocator name for debugging
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

// SAFETY: Forwards to the referenced allocator, which upholds the contract.
unsafe impl<A: BlockAllocator + ?Sized> BlockAllocator for &A {
    #[inline]
    fn acquire_block(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        (**self).acquire_block(layout)
    }

    #[inline]
    unsafe fn release_block(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Caller's guarantees are forwarded unchanged.
        unsafe { (**self).release_block(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

// SAFETY: Forwards to the shared allocator, which upholds the contract.
unsafe impl<A: BlockAllocator + ?Sized> BlockAllocator for std::rc::Rc<A> {
    #[inline]
    fn acquire_block(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        (**self).acquire_block(layout)
    }

    #[inline]
    unsafe fn release_block(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Caller's guarantees are forwarded unchanged.
        unsafe { (**self).release_block(ptr, layout) }
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
