//! Pool allocator configuration

use super::slot::Slot;

/// Block size used when none is configured
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Configuration for pool allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Size in bytes of every block requested from the backing allocator
    ///
    /// Must hold at least one slot of the pooled type; checked when a pool is
    /// built from this config.
    pub block_size: usize,

    /// Fill pattern byte for newly allocated memory (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for deallocated memory (for debugging)
    pub dealloc_pattern: Option<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
        }
    }
}

impl PoolConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Performance configuration - large blocks, minimal overhead
    #[must_use]
    pub fn performance() -> Self {
        Self {
            block_size: 64 * 1024,
            ..Self::production()
        }
    }

    /// Configuration whose blocks hold exactly `slots` slots of `T`
    ///
    /// Blocks are allocated with the slot alignment, so no padding is lost at
    /// the start of a block.
    #[must_use]
    pub fn for_slots<T>(slots: usize) -> Self {
        Self::default().with_block_size(Slot::<T>::SIZE.saturating_mul(slots))
    }

    /// Set the block size
    #[must_use = "builder methods must be chained or built"]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set both debug fill patterns
    #[must_use = "builder methods must be chained or built"]
    pub fn with_patterns(mut self, alloc: Option<u8>, dealloc: Option<u8>) -> Self {
        self.alloc_pattern = alloc;
        self.dealloc_pattern = dealloc;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(PoolConfig::default().block_size, DEFAULT_BLOCK_SIZE);

        let production = PoolConfig::production();
        assert_eq!(production.alloc_pattern, None);

        let debug = PoolConfig::debug();
        assert_eq!(debug.alloc_pattern, Some(0xBB));
        assert_eq!(debug.dealloc_pattern, Some(0xDD));

        assert_eq!(PoolConfig::performance().block_size, 64 * 1024);
    }

    #[test]
    fn test_for_slots() {
        let config = PoolConfig::for_slots::<u64>(16);
        assert_eq!(config.block_size, 16 * 8);

        // Slots never shrink below a free-list link
        let config = PoolConfig::for_slots::<u8>(4);
        assert_eq!(config.block_size, 4 * size_of::<usize>());
    }
}
