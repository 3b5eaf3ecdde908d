//! Slot storage shared by the two domains.
//!
//! Storage does no synchronization of its own. At any moment each slot is
//! either writable by the producer (outside the occupied range) or readable
//! by the consumer (inside it), and the counters decide which. Slots are
//! accessed `Relaxed`; the counter relays carry the `Release`/`Acquire` edge.
//!
//! # Memory Layout
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬─────┬─────────────────┐
//! │ slot[0]  │ slot[1]  │ slot[2]  │ ... │ slot[depth - 1] │
//! │ (8B)     │ (8B)     │ (8B)     │     │ (8B)            │
//! └──────────┴──────────┴──────────┴─────┴─────────────────┘
//! ```
//!
//! Contents survive a reset untouched.

use std::sync::atomic::{AtomicU64, Ordering};

pub struct RingStorage {
    slots: Box<[AtomicU64]>,
}

impl RingStorage {
    pub fn new(depth: usize) -> Self {
        let slots: Vec<AtomicU64> = (0..depth).map(|_| AtomicU64::new(0)).collect();
        Self {
            slots: slots.into_boxed_slice(),
        }
    }

    /// Stores `value` at `index`. Producer only, at its own counter's address.
    #[inline(always)]
    pub fn write(&self, index: usize, value: u64) {
        self.slots[index].store(value, Ordering::Relaxed);
    }

    /// Loads the item at `index`. Consumer only, at its own counter's address.
    #[inline(always)]
    pub fn read(&self, index: usize) -> u64 {
        self.slots[index].load(Ordering::Relaxed)
    }
}
