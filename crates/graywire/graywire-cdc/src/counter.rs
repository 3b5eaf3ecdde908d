use crate::gray::GrayValue;
use crate::ring::{RingConfig, counter_to_index};

/// A domain's own position, `log2(depth) + 1` bits wide.
///
/// Owned by exactly one domain and mutated only through [`advance`]. The
/// caller must have checked full/empty first; the counter itself has no
/// notion of capacity.
///
/// [`advance`]: PositionCounter::advance
#[derive(Debug, Clone)]
pub struct PositionCounter {
    value: u64,
    counter_mask: u64,
    address_mask: u64,
}

impl PositionCounter {
    pub fn new(cfg: &RingConfig) -> Self {
        Self {
            value: 0,
            counter_mask: cfg.counter_mask(),
            address_mask: cfg.address_mask(),
        }
    }

    /// Moves forward one item, wrapping through the guard bit. Returns the new value.
    #[inline(always)]
    pub fn advance(&mut self) -> u64 {
        self.value = (self.value + 1) & self.counter_mask;
        self.value
    }

    #[inline(always)]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Storage slot this counter currently points at.
    #[inline(always)]
    pub fn address(&self) -> usize {
        counter_to_index(self.value, self.address_mask)
    }

    #[inline(always)]
    pub fn gray(&self) -> GrayValue {
        GrayValue::encode(self.value)
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }
}
