//! Ring geometry and counter arithmetic.
//!
//! Every counter in this crate is `log2(depth) + 1` bits wide. The low bits
//! address a slot, the extra top bit (the guard bit) records whether the
//! counter has wrapped an odd or even number of times. This module owns the
//! validated geometry and the masks derived from it.

use crate::error::ConfigError;

/// Largest accepted depth. Keeps `2 * depth` and every counter well inside `u64`.
pub const MAX_DEPTH: usize = 1 << 31;

/// Relay depth used by [`RingConfig::new`].
pub const DEFAULT_SYNC_STAGES: usize = 2;

/// Validated FIFO geometry.
///
/// The depth must always be a power of 2, so that slot addresses come from a
/// bitmask and the guard bit sits directly above them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RingConfig {
    /// Item width in bits, 1..=64.
    width: usize,
    /// Number of slots. Power of 2.
    depth: usize,
    /// Length of each cross-domain relay pipeline. At least 2.
    sync_stages: usize,
}

impl RingConfig {
    /// Validates `width` and `depth` and uses [`DEFAULT_SYNC_STAGES`].
    ///
    /// # Example
    /// ```
    /// use graywire_cdc::{ConfigError, RingConfig};
    /// assert!(RingConfig::new(8, 1024).is_ok());
    /// assert_eq!(
    ///     RingConfig::new(8, 1000),
    ///     Err(ConfigError::NotPowerOfTwo { depth: 1000 })
    /// );
    /// ```
    pub fn new(width: usize, depth: usize) -> Result<Self, ConfigError> {
        if !depth.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo { depth });
        }
        if depth > MAX_DEPTH {
            return Err(ConfigError::DepthTooLarge { depth });
        }
        if width == 0 || width > 64 {
            return Err(ConfigError::InvalidWidth { width });
        }
        Ok(Self {
            width,
            depth,
            sync_stages: DEFAULT_SYNC_STAGES,
        })
    }

    /// Replaces the relay depth. Each extra stage adds one step of latency.
    pub fn with_sync_stages(mut self, stages: usize) -> Result<Self, ConfigError> {
        if stages < 2 {
            return Err(ConfigError::TooFewSyncStages { stages });
        }
        self.sync_stages = stages;
        Ok(self)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn sync_stages(&self) -> usize {
        self.sync_stages
    }

    /// Mask selecting the address bits of a counter.
    ///
    /// # Example
    /// ```
    /// use graywire_cdc::RingConfig;
    /// let cfg = RingConfig::new(8, 8).unwrap();
    /// assert_eq!(cfg.address_mask(), 0b0111);
    /// ```
    #[inline(always)]
    pub fn address_mask(&self) -> u64 {
        (self.depth as u64) - 1
    }

    /// Mask selecting every counter bit, guard bit included.
    ///
    /// # Example
    /// ```
    /// use graywire_cdc::RingConfig;
    /// let cfg = RingConfig::new(8, 8).unwrap();
    /// assert_eq!(cfg.counter_mask(), 0b1111);
    /// ```
    #[inline(always)]
    pub fn counter_mask(&self) -> u64 {
        (self.depth as u64) * 2 - 1
    }

    /// The guard bit on its own. Numerically equal to the depth.
    #[inline(always)]
    pub fn guard_bit(&self) -> u64 {
        self.depth as u64
    }

    /// Mask of the bits an item may carry.
    #[inline(always)]
    pub fn item_mask(&self) -> u64 {
        if self.width == 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }
}

/// Converts a counter to a storage address by dropping the guard bit.
///
/// With `depth = 4` (mask = `0b011`):
/// ```text
/// counter = 0b001 → 1
/// counter = 0b011 → 3
/// counter = 0b100 → 0  (guard bit set, same slot as 0b000)
/// counter = 0b111 → 3
/// ```
#[inline(always)]
pub fn counter_to_index(counter: u64, address_mask: u64) -> usize {
    (counter & address_mask) as usize
}
