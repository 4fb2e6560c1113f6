//! Global-heap block source

use core::alloc::Layout;
use core::ptr::NonNull;

use super::BlockAllocator;
use crate::error::{MemoryError, MemoryResult};

/// Forwards block requests to the process-wide global allocator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

// SAFETY: `std::alloc::alloc` returns memory valid for `layout` that stays
// exclusively ours until passed back to `std::alloc::dealloc`.
unsafe impl BlockAllocator for SystemAllocator {
    fn acquire_block(&self, layout: Layout) -> MemoryResult<NonNull<u8>> {
        if layout.size() == 0 {
            return Err(MemoryError::invalid_layout("zero-sized block"));
        }

        // SAFETY: layout has non-zero size (checked above).
        let ptr = unsafe { std::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| MemoryError::allocation_failed_with_layout(layout))
    }

    unsafe fn release_block(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Caller guarantees ptr came from `acquire_block` with this layout.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }

    fn name(&self) -> &'static str {
        "system"
    }
}
