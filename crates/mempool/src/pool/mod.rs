//! Fixed-size object pool
//!
//! [`MemoryPool`] serves storage for one element type out of large blocks,
//! recycles freed slots through an intrusive LIFO free list, and returns
//! blocks to the backing allocator only when it is dropped.

mod block;
mod config;
mod memory_pool;
mod slot;
mod stats;

pub use config::{DEFAULT_BLOCK_SIZE, PoolConfig};
pub use memory_pool::MemoryPool;
pub use stats::PoolStats;
