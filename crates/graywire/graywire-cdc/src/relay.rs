//! Cross-domain relay for Gray-coded counters.
//!
//! A relay has two halves:
//!
//! - [`GrayRegister`] lives in shared memory. Only the owning domain stores
//!   into it; it holds the latest Gray image of that domain's counter.
//! - [`SyncRelay`] is owned by the observing domain. It is a fixed chain of
//!   `N >= 2` stages; on every local step the chain shifts by one and the
//!   first stage samples the register.
//!
//! ```text
//!   owning domain          │           observing domain
//!                          │
//!   counter ─► gray ─► [register] ─► stage0 ─► stage1 ─► … ─► stage(N-1) ─► observe()
//!                          │         (sample)  (shift on every local step)
//! ```
//!
//! Only the last stage is ever acted on. A value that reaches it has sat in the
//! chain for `N` steps, so a sample taken while the register was changing has
//! long been replaced by a settled one, and every value that comes out is one
//! the owning domain really held.
//!
//! # Memory Ordering
//!
//! The register is an `AtomicU64`, so a sample can never mix bits of two
//! stores. `publish` uses `Release` and `sample` uses `Acquire`: once the
//! observer holds a counter value, every storage write the owner made before
//! publishing it is visible too.

use crate::gray::GrayValue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared slot carrying one domain's Gray counter to the other.
///
/// Padded to its own cache line so the producer's and consumer's registers
/// do not false-share.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct GrayRegister {
    value: AtomicU64,
}

impl GrayRegister {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Makes `value` the newest counter visible to the other domain.
    ///
    /// # Single-Writer
    /// Only the domain that owns the counter may call this.
    #[inline(always)]
    pub fn publish(&self, value: GrayValue) {
        self.value.store(value.0, Ordering::Release);
    }

    /// Takes one snapshot of the register. Used by the first relay stage only.
    #[inline(always)]
    pub fn sample(&self) -> GrayValue {
        GrayValue(self.value.load(Ordering::Acquire))
    }
}

/// The observing domain's staged view of a remote counter.
#[derive(Debug, Clone)]
pub struct SyncRelay {
    /// `stages[0]` is the newest sample, the last entry is the output.
    stages: Box<[u64]>,
}

impl SyncRelay {
    /// Builds a chain of `stages` stages, all holding the zero encoding.
    ///
    /// # Panics
    /// Panics if `stages < 2`. [`RingConfig`](crate::RingConfig) rejects such
    /// configurations before a relay is ever built.
    pub fn new(stages: usize) -> Self {
        assert!(stages >= 2, "a relay needs at least two stages");
        Self {
            stages: vec![0u64; stages].into_boxed_slice(),
        }
    }

    /// One local step: shift every stage toward the output, then sample.
    #[inline]
    pub fn step(&mut self, source: &GrayRegister) {
        self.stages.copy_within(..self.stages.len() - 1, 1);
        self.stages[0] = source.sample().0;
    }

    /// The settled remote counter, as of `N` local steps ago.
    #[inline(always)]
    pub fn observe(&self) -> GrayValue {
        GrayValue(self.stages[self.stages.len() - 1])
    }

    /// Overwrites every stage. Used when the observing domain resets.
    pub fn flush_to(&mut self, value: GrayValue) {
        self.stages.fill(value.0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_surfaces_after_exactly_n_steps() {
        for n in 2..=5 {
            let reg = GrayRegister::new();
            let mut relay = SyncRelay::new(n);
            reg.publish(GrayValue::encode(3));
            for step in 1..n {
                relay.step(&reg);
                assert_eq!(relay.observe(), GrayValue::ZERO, "n={n} step={step}");
            }
            relay.step(&reg);
            assert_eq!(relay.observe().decode(), 3, "n={n}");
        }
    }

    #[test]
    fn preserves_publication_order() {
        let reg = GrayRegister::new();
        let mut relay = SyncRelay::new(3);
        let mut seen = Vec::new();
        for v in 1..=6u64 {
            reg.publish(GrayValue::encode(v));
            relay.step(&reg);
            seen.push(relay.observe().decode());
        }
        assert_eq!(seen, vec![0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn only_outputs_published_values() {
        let reg = GrayRegister::new();
        let mut relay = SyncRelay::new(2);
        let published = [0u64, 1, 2, 3, 4, 5, 6, 7];
        for &v in &published {
            reg.publish(GrayValue::encode(v));
            relay.step(&reg);
            relay.step(&reg);
            assert!(published.contains(&relay.observe().decode()));
        }
    }

    #[test]
    fn flush_overwrites_every_stage() {
        let reg = GrayRegister::new();
        let mut relay = SyncRelay::new(4);
        reg.publish(GrayValue::encode(9));
        for _ in 0..4 {
            relay.step(&reg);
        }
        relay.flush_to(GrayValue::ZERO);
        assert_eq!(relay.observe(), GrayValue::ZERO);
        assert_eq!(relay.len(), 4);
    }

    #[test]
    #[should_panic]
    fn single_stage_relay_is_rejected() {
        let _ = SyncRelay::new(1);
    }

    #[test]
    fn register_is_cache_line_aligned() {
        assert_eq!(std::mem::align_of::<GrayRegister>(), 64);
    }
}
