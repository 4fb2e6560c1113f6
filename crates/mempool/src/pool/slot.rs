//! Slot representation shared by live elements and free-list links
//!
//! # Safety
//!
//! A slot is either a live (or merely allocated) element or a free-list link,
//! never both. The slot itself does not record which: the pool's bookkeeping
//! is the only source of truth, and only pool-internal code may reinterpret
//! the bytes. Reading `next` is valid only for slots currently on the free
//! list.

use core::mem::ManuallyDrop;
use core::ptr::NonNull;

/// One unit of pool storage
///
/// Its size and alignment cover both interpretations, so a slot is always at
/// least as large and as aligned as `T`.
#[repr(C)]
pub(crate) union Slot<T> {
    element: ManuallyDrop<T>,
    next: Option<NonNull<Slot<T>>>,
}

impl<T> Slot<T> {
    /// Distance between consecutive slots in a block
    pub(crate) const SIZE: usize = size_of::<Self>();

    /// Alignment of every slot, and of every block
    pub(crate) const ALIGN: usize = align_of::<Self>();

    /// Element storage inside `slot`
    ///
    /// # Safety
    ///
    /// `slot` must point into a block owned by a live pool.
    #[inline]
    pub(crate) unsafe fn element(slot: NonNull<Self>) -> NonNull<T> {
        // SAFETY: Projecting a field of a non-null in-bounds pointer stays
        // non-null; `repr(C)` puts every union field at offset 0.
        unsafe {
            NonNull::new_unchecked(core::ptr::addr_of_mut!((*slot.as_ptr()).element).cast::<T>())
        }
    }

    /// Slot that holds the element at `element`
    #[inline]
    pub(crate) fn from_element(element: NonNull<T>) -> NonNull<Self> {
        element.cast()
    }

    /// Read the free-list link stored in a free slot
    ///
    /// # Safety
    ///
    /// `slot` must be on the free list, its link written by [`Self::set_next`].
    #[inline]
    pub(crate) unsafe fn next(slot: NonNull<Self>) -> Option<NonNull<Self>> {
        // SAFETY: Caller guarantees the link interpretation is the active one.
        unsafe { (*slot.as_ptr()).next }
    }

    /// Turn `slot` into a free-list link pointing at `next`
    ///
    /// # Safety
    ///
    /// `slot` must be valid for writes and hold no constructed element.
    #[inline]
    pub(crate) unsafe fn set_next(slot: NonNull<Self>, next: Option<NonNull<Self>>) {
        // SAFETY: Writing a Copy union field never drops the previous content.
        unsafe { core::ptr::addr_of_mut!((*slot.as_ptr()).next).write(next) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(64))]
    struct CacheLine([u8; 64]);

    #[test]
    fn test_slot_covers_element_and_link() {
        assert_eq!(Slot::<u8>::SIZE, size_of::<usize>());
        assert_eq!(Slot::<u64>::SIZE, 8);
        assert_eq!(Slot::<[u64; 3]>::SIZE, 24);
        assert_eq!(Slot::<()>::SIZE, size_of::<usize>());

        assert_eq!(Slot::<CacheLine>::SIZE, 64);
        assert_eq!(Slot::<CacheLine>::ALIGN, 64);
        assert!(Slot::<u128>::ALIGN >= align_of::<u128>());
    }

    #[test]
    fn test_link_round_trip() {
        let mut a = Slot::<u32> {
            element: ManuallyDrop::new(7),
        };
        let mut b = Slot::<u32> {
            element: ManuallyDrop::new(9),
        };
        let a_ptr = NonNull::from(&mut a);
        let b_ptr = NonNull::from(&mut b);

        unsafe {
            Slot::set_next(b_ptr, None);
            Slot::set_next(a_ptr, Some(b_ptr));
            assert_eq!(Slot::next(a_ptr), Some(b_ptr));
            assert_eq!(Slot::next(b_ptr), None);
        }
    }
}
