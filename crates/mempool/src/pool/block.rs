//! Raw blocks carved into slots

use core::alloc::Layout;
use core::ptr::NonNull;

/// Handle to one block obtained from a [`BlockAllocator`](crate::allocator::BlockAllocator)
///
/// The handle does not free itself: the owning pool releases every block in a
/// single sweep on drop, through the same allocator that produced it.
#[derive(Debug)]
pub(crate) struct Block {
    base: NonNull<u8>,
    /// First slot boundary at or after `base`
    first: NonNull<u8>,
    /// Number of whole slots between `first` and the end of the block
    slots: usize,
}

impl Block {
    /// Partition the block at `base` into slots of `slot_size` bytes aligned to
    /// `slot_align`
    ///
    /// # Safety
    ///
    /// `base` must be valid for `layout.size()` bytes.
    pub(crate) unsafe fn carve(
        base: NonNull<u8>,
        layout: Layout,
        slot_size: usize,
        slot_align: usize,
    ) -> Self {
        // Padding is measured on the full address, never a truncated one.
        let padding = base.as_ptr().align_offset(slot_align).min(layout.size());
        let slots = (layout.size() - padding) / slot_size;

        // SAFETY: padding <= layout.size(), so the result stays within (or one
        // past the end of) the block and is non-null.
        let first = unsafe { base.add(padding) };

        Self { base, first, slots }
    }

    /// Start of the allocation, as returned by the allocator
    pub(crate) fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Address of the first usable slot
    pub(crate) fn first(&self) -> NonNull<u8> {
        self.first
    }

    /// Whole slots in this block
    pub(crate) fn slots(&self) -> usize {
        self.slots
    }

    /// Whether `addr` is the start of one of this block's slots
    pub(crate) fn holds_slot(&self, addr: usize, slot_size: usize) -> bool {
        let start = self.first.as_ptr() as usize;
        let end = start + self.slots * slot_size;
        addr >= start && addr < end && (addr - start) % slot_size == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carve_aligned_base() {
        let mut storage = [0u64; 8];
        let base = NonNull::from(&mut storage).cast::<u8>();
        let layout = Layout::from_size_align(64, 8).unwrap();

        let block = unsafe { Block::carve(base, layout, 16, 8) };
        assert_eq!(block.first(), base);
        assert_eq!(block.slots(), 4);
    }

    #[test]
    fn test_carve_pads_to_alignment() {
        let mut storage = [0u64; 8];
        // Start one byte in so the first 8-byte boundary is 7 bytes away
        let base = unsafe { NonNull::from(&mut storage).cast::<u8>().add(1) };
        let layout = Layout::from_size_align(63, 1).unwrap();

        let block = unsafe { Block::carve(base, layout, 8, 8) };
        assert_eq!(block.first().as_ptr() as usize % 8, 0);
        assert_eq!(block.first().as_ptr() as usize - base.as_ptr() as usize, 7);
        // 63 - 7 = 56 bytes left, exactly seven slots
        assert_eq!(block.slots(), 7);
    }

    #[test]
    fn test_holds_slot() {
        let mut storage = [0u64; 4];
        let base = NonNull::from(&mut storage).cast::<u8>();
        let layout = Layout::from_size_align(32, 8).unwrap();
        let block = unsafe { Block::carve(base, layout, 8, 8) };

        let start = base.as_ptr() as usize;
        assert!(block.holds_slot(start, 8));
        assert!(block.holds_slot(start + 24, 8));
        assert!(!block.holds_slot(start + 4, 8));
        assert!(!block.holds_slot(start + 32, 8));
        assert!(!block.holds_slot(start.wrapping_sub(8), 8));
    }
}
