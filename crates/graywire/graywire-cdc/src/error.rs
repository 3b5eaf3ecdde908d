//! Error types for construction and for the two domain-side operations.
//!
//! `Full` and `Empty` are flow-control signals, not faults: a caller is
//! expected to see them constantly and simply retry later.

/// Rejected FIFO geometry. Fatal to construction only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("depth {depth} is not a power of two")]
    NotPowerOfTwo { depth: usize },

    #[error("depth {depth} exceeds the maximum of {max}", max = crate::ring::MAX_DEPTH)]
    DepthTooLarge { depth: usize },

    #[error("item width {width} must be between 1 and 64 bits")]
    InvalidWidth { width: usize },

    #[error("{stages} sync stages requested, at least 2 are required")]
    TooFewSyncStages { stages: usize },
}

/// Why the producer refused an item. Nothing was stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    #[error("fifo is full")]
    Full,

    #[error("value {value:#x} does not fit in {width} bits")]
    TooWide { value: u64, width: usize },
}

/// Why the consumer returned no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("fifo is empty")]
    Empty,
}
