//! # nebula-mempool
//!
//! Fixed-size object pools for allocation-heavy workloads in the Nebula
//! ecosystem.
//!
//! Building and tearing down linked structures one node at a time puts a
//! general-purpose allocator on the hot path. This crate amortizes that cost:
//! - [`MemoryPool`] carves large blocks into fixed-size slots for one type,
//!   recycles freed slots through an intrusive LIFO free list, and returns
//!   blocks to the system only when it is dropped
//! - [`Stack`] is a LIFO container that takes its nodes from a pool rebound
//!   to the node layout
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_mempool::prelude::*;
//!
//! let mut stack = Stack::with_config(PoolConfig::performance())?;
//! for i in 0..1000 {
//!     stack.push(i)?;
//! }
//! while stack.pop().is_some() {}
//!
//! // The second round reuses the nodes freed by the first
//! stack.extend(0..1000);
//! assert_eq!(stack.pool_stats().free_list_hits(), 1000);
//! # Ok::<(), nebula_mempool::MemoryError>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): Block acquisition, teardown and error events via `tracing`
//!
//! ## Architecture
//!
//! - Standalone error handling via [`error`] module
//! - Blocks come from a pluggable [`allocator::BlockAllocator`]; the pool never
//!   calls the global heap directly
//! - Single-threaded by design: pools and stacks are neither `Send` nor `Sync`

#![cfg_attr(docsrs, feature(doc_cfg))]
// Slot and block management is raw-pointer code by nature
#![allow(unsafe_code)]

// Error types
pub mod error;

// Core modules
pub mod allocator;
pub mod pool;
pub mod stack;

pub use crate::error::{MemoryError, MemoryResult, Result};
pub use crate::pool::{MemoryPool, PoolConfig};
pub use crate::stack::Stack;

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::allocator::{BlockAllocator, SystemAllocator, TrackedAllocator};
    pub use crate::error::{MemoryError, MemoryResult};
    pub use crate::pool::{MemoryPool, PoolConfig, PoolStats};
    pub use crate::stack::Stack;
}
