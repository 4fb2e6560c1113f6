//! LIFO stack whose nodes live in a [`MemoryPool`]
//!
//! The stack is generic over an element type `T` but allocates
//! `Node<T>` values, so it owns a pool rebound to the node layout rather than
//! one sized for `T` itself.

use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::allocator::{BlockAllocator, SystemAllocator};
use crate::error::MemoryResult;
use crate::pool::{MemoryPool, PoolConfig, PoolStats};

struct Node<T> {
    value: T,
    prev: Option<NonNull<Node<T>>>,
}

/// Singly-linked LIFO stack backed by a node pool
///
/// # Example
/// ```
/// use nebula_mempool::Stack;
///
/// let mut stack = Stack::new()?;
/// stack.push(1)?;
/// stack.push(2)?;
///
/// assert_eq!(stack.top(), Some(2));
/// assert_eq!(stack.pop(), Some(2));
/// assert_eq!(stack.pop(), Some(1));
/// assert!(stack.is_empty());
/// # Ok::<(), nebula_mempool::MemoryError>(())
/// ```
pub struct Stack<T, A: BlockAllocator = SystemAllocator> {
    top: Option<NonNull<Node<T>>>,
    len: usize,
    pool: MemoryPool<Node<T>, A>,
    _owns: PhantomData<T>,
}

impl<T> Stack<T> {
    /// Create an empty stack with the default pool configuration
    pub fn new() -> MemoryResult<Self> {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty stack whose node pool uses `config`
    pub fn with_config(config: PoolConfig) -> MemoryResult<Self> {
        Self::with_allocator(config, SystemAllocator)
    }
}

impl<T, A: BlockAllocator> Stack<T, A> {
    /// Create an empty stack whose node pool takes blocks from `allocator`
    pub fn with_allocator(config: PoolConfig, allocator: A) -> MemoryResult<Self> {
        Ok(Self::from_node_pool(MemoryPool::with_allocator(
            config, allocator,
        )?))
    }

    /// Create an empty stack from an element pool, rebinding it to nodes
    ///
    /// `pool` keeps its own blocks; the stack gets a fresh pool with the same
    /// configuration and a clone of its allocator.
    pub fn from_pool(pool: &MemoryPool<T, A>) -> MemoryResult<Self>
    where
        A: Clone,
    {
        Ok(Self::from_node_pool(pool.rebind::<Node<T>>()?))
    }

    fn from_node_pool(pool: MemoryPool<Node<T>, A>) -> Self {
        Self {
            top: None,
            len: 0,
            pool,
            _owns: PhantomData,
        }
    }

    /// Whether the stack holds no values
    pub fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Number of values on the stack
    pub fn len(&self) -> usize {
        self.len
    }

    /// Push `value` on top
    ///
    /// Fails only if the node pool cannot obtain a new block, in which case
    /// the stack is unchanged and `value` is dropped.
    pub fn push(&mut self, value: T) -> MemoryResult<()> {
        let node = self.pool.allocate()?;
        // SAFETY: Fresh slot from the pool, nothing constructed in it.
        unsafe {
            self.pool.construct(
                node,
                Node {
                    value,
                    prev: self.top,
                },
            );
        }
        self.top = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Remove the top value and return it, or `None` if the stack is empty
    pub fn pop(&mut self) -> Option<T> {
        let node = self.top?;
        // SAFETY: `top` is a live node constructed by `push` and owned by
        // this stack; it is unlinked before its slot goes back to the pool.
        let Node { value, prev } = unsafe { self.pool.remove(node) };
        self.top = prev;
        self.len -= 1;
        Some(value)
    }

    /// Copy of the top value, or `None` if the stack is empty
    pub fn top(&self) -> Option<T>
    where
        T: Clone,
    {
        self.peek().cloned()
    }

    /// Reference to the top value
    pub fn peek(&self) -> Option<&T> {
        // SAFETY: Live node owned by this stack; the borrow is tied to &self.
        self.top.map(|node| unsafe { &node.as_ref().value })
    }

    /// Mutable reference to the top value
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        // SAFETY: Live node owned by this stack; the borrow is tied to &mut self.
        self.top.map(|mut node| unsafe { &mut node.as_mut().value })
    }

    /// Drop every value, top to bottom, returning all nodes to the pool
    ///
    /// The pool keeps its blocks for reuse by later pushes.
    pub fn clear(&mut self) {
        let mut current = self.top.take();
        while let Some(node) = current {
            // SAFETY: Each node is live, owned by this stack, and visited once;
            // `prev` is read before the node is destroyed.
            unsafe {
                current = node.as_ref().prev;
                self.pool.destroy(node);
                self.pool.deallocate(node);
            }
        }
        self.len = 0;
    }

    /// Iterate values from top to bottom
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.top,
            remaining: self.len,
            _stack: PhantomData,
        }
    }

    /// Statistics of the node pool
    pub fn pool_stats(&self) -> &PoolStats {
        self.pool.stats()
    }

    /// Configuration of the node pool
    pub fn pool_config(&self) -> &PoolConfig {
        self.pool.config()
    }
}

impl<T, A: BlockAllocator> Drop for Stack<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: BlockAllocator> Extend<T> for Stack<T, A> {
    /// Push every item in order
    ///
    /// # Panics
    ///
    /// Panics if the node pool cannot obtain memory, like `Vec` does.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.push(value) {
                panic!("stack node allocation failed: {err}");
            }
        }
    }
}

impl<T: fmt::Debug, A: BlockAllocator> fmt::Debug for Stack<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T, A: BlockAllocator> IntoIterator for &'a Stack<T, A> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over a [`Stack`], top to bottom
pub struct Iter<'a, T> {
    next: Option<NonNull<Node<T>>>,
    remaining: usize,
    _stack: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            // SAFETY: The stack is borrowed for 'a, so its nodes stay live and
            // unmodified while the iterator exists.
            let node = unsafe { node.as_ref() };
            self.next = node.prev;
            self.remaining -= 1;
            &node.value
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::allocator::TrackedAllocator;
    use crate::error::MemoryError;

    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_push_pop_order() {
        let mut stack = Stack::new().unwrap();
        for value in [1, 2, 3] {
            stack.push(value).unwrap();
        }

        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_top_does_not_remove() {
        let mut stack = Stack::new().unwrap();
        assert_eq!(stack.top(), None);

        stack.push(5).unwrap();
        assert_eq!(stack.top(), Some(5));
        assert_eq!(stack.top(), Some(5));
        assert!(!stack.is_empty());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_peek_mut() {
        let mut stack = Stack::new().unwrap();
        stack.push(String::from("a")).unwrap();

        stack.peek_mut().unwrap().push('b');
        assert_eq!(stack.peek().map(String::as_str), Some("ab"));
    }

    #[test]
    fn test_nodes_are_recycled() {
        let mut stack = Stack::new().unwrap();

        for round in 0..10 {
            for value in 0..100 {
                stack.push(round * 100 + value).unwrap();
            }
            while stack.pop().is_some() {}
        }

        let stats = stack.pool_stats();
        assert_eq!(stats.allocations(), 1000);
        assert_eq!(stats.bump_allocations(), 100);
        assert_eq!(stats.free_list_hits(), 900);
        assert_eq!(stats.live_slots(), 0);
    }

    #[test]
    fn test_clear_drops_every_value_once() {
        let drops = Rc::new(Cell::new(0));
        let mut stack = Stack::new().unwrap();
        for _ in 0..5 {
            stack.push(DropCounter(Rc::clone(&drops))).unwrap();
        }

        stack.clear();
        assert_eq!(drops.get(), 5);
        assert!(stack.is_empty());
        assert_eq!(stack.len(), 0);
        assert_eq!(stack.pool_stats().live_slots(), 0);

        stack.push(DropCounter(Rc::clone(&drops))).unwrap();
        drop(stack);
        assert_eq!(drops.get(), 6);
    }

    #[test]
    fn test_pop_moves_value_out() {
        let drops = Rc::new(Cell::new(0));
        let mut stack = Stack::new().unwrap();
        stack.push(DropCounter(Rc::clone(&drops))).unwrap();

        let value = stack.pop().unwrap();
        assert_eq!(drops.get(), 0);
        drop(value);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_from_pool_rebinds() {
        let tracked = TrackedAllocator::system();
        let elements =
            MemoryPool::<u8, _>::with_allocator(PoolConfig::production(), &tracked).unwrap();

        let mut stack = Stack::from_pool(&elements).unwrap();
        stack.push(7u8).unwrap();

        assert_eq!(stack.pool_config(), elements.config());
        assert_eq!(elements.block_count(), 0);
        assert_eq!(tracked.live_blocks(), 1);

        drop(stack);
        assert_eq!(tracked.live_blocks(), 0);
    }

    #[test]
    fn test_push_failure_leaves_stack_unchanged() {
        let tracked = TrackedAllocator::with_block_limit(SystemAllocator, 1);
        let config = PoolConfig::production().with_block_size(2 * size_of::<Node<u64>>());
        let mut stack = Stack::with_allocator(config, &tracked).unwrap();

        stack.push(1u64).unwrap();
        stack.push(2).unwrap();
        let err = stack.push(3).unwrap_err();

        assert!(matches!(err, MemoryError::AllocationFailed { .. }));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top(), Some(2));
    }

    #[test]
    fn test_iter_and_debug() {
        let mut stack = Stack::new().unwrap();
        stack.extend([1, 2, 3]);

        let values: Vec<_> = stack.iter().copied().collect();
        assert_eq!(values, vec![3, 2, 1]);
        assert_eq!(stack.iter().len(), 3);
        assert_eq!(format!("{stack:?}"), "[3, 2, 1]");
    }
}
