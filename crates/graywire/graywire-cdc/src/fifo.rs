//! Two-domain FIFO built from Gray-coded counters and staged relays.
//!
//! One [`Producer`] and one [`Consumer`] share a ring of `depth` slots. Each
//! owns its position counter and learns the other's only through a
//! [`SyncRelay`], so neither side ever blocks on or locks against the other.
//!
//! # Design
//! - **Producer**: writes at its own counter's address, then publishes the
//!   Gray image of the new count. Refuses with `Full` when its relayed view of
//!   the read counter says every slot is taken.
//! - **Consumer**: reads at its own counter's address, then publishes.
//!   Refuses with `Empty` when its relayed view of the write counter equals
//!   its own.
//!
//! # Steps
//! Each `try_write`/`try_read` call, and each `tick`, is one step of that
//! domain: the reset line is checked and the relay advances one stage. A
//! remote update becomes visible after `sync_stages` local steps; `settle`
//! runs exactly that many.
//!
//! # Thread Safety
//! - `Producer` and `Consumer` are `Send`; move each to its own thread.
//! - Mutating operations take `&mut self`, so each side stays single-threaded.

use crate::counter::PositionCounter;
use crate::error::{ConfigError, ReadError, WriteError};
use crate::gray::GrayValue;
use crate::oracle;
use crate::relay::{GrayRegister, SyncRelay};
use crate::reset::{Domain, ResetLine, ResetPhase, ResetTracker};
use crate::ring::RingConfig;
use crate::storage::RingStorage;
use std::sync::Arc;

/// State both domains can reach. Everything mutable in here is atomic.
struct Shared {
    cfg: RingConfig,
    storage: RingStorage,
    /// Published Gray counters, indexed by [`Domain`].
    registers: [GrayRegister; 2],
    reset: ResetLine,
}

/// The part of a domain that is the same on both sides.
struct Endpoint {
    domain: Domain,
    shared: Arc<Shared>,
    counter: PositionCounter,
    relay: SyncRelay,
    reset: ResetTracker,
}

impl Endpoint {
    fn new(domain: Domain, shared: Arc<Shared>) -> Self {
        let stages = shared.cfg.sync_stages();
        Self {
            domain,
            counter: PositionCounter::new(&shared.cfg),
            relay: SyncRelay::new(stages),
            reset: ResetTracker::new(domain, stages),
            shared,
        }
    }

    #[inline(always)]
    fn own_register(&self) -> &GrayRegister {
        &self.shared.registers[self.domain as usize]
    }

    fn step(&mut self) {
        let generation = self.shared.reset.generation();
        if generation != self.reset.seen() {
            tracing::debug!(domain = ?self.domain, generation, "reset observed");
            self.take_reset(generation);
        }
        if self.reset.may_sample(&self.shared.reset) {
            let peer = &self.shared.registers[self.domain.peer() as usize];
            self.relay.step(peer);
            self.reset.after_sample();
        }
    }

    fn settle(&mut self) {
        for _ in 0..self.relay.len() {
            self.step();
        }
    }

    fn take_reset(&mut self, generation: u64) {
        self.counter.reset();
        self.own_register().publish(GrayValue::ZERO);
        self.relay.flush_to(GrayValue::ZERO);
        self.reset.acknowledge(&self.shared.reset, generation);
    }

    fn assert_reset(&mut self) {
        let generation = self.shared.reset.assert();
        tracing::debug!(domain = ?self.domain, generation, "reset asserted");
        self.take_reset(generation);
    }

    /// Advances the local counter past the slot just used and publishes it.
    #[inline(always)]
    fn commit(&mut self) {
        self.counter.advance();
        self.own_register().publish(self.counter.gray());
    }

    #[inline(always)]
    fn remote_view(&self) -> u64 {
        self.relay.observe().decode()
    }

    #[inline(always)]
    fn blocked(&self) -> bool {
        self.reset.blocked(&self.shared.reset)
    }
}

/// Producing domain of a [`Fifo`].
pub struct Producer {
    end: Endpoint,
}

/// Consuming domain of a [`Fifo`].
pub struct Consumer {
    end: Endpoint,
}

impl Producer {
    /// Stores `value` and advances the write counter, or refuses.
    ///
    /// Counts as one producer step whether or not the item is accepted.
    ///
    /// # Errors
    /// - [`WriteError::TooWide`] if `value` has bits above the configured width
    /// - [`WriteError::Full`] if the producer's view says every slot is taken
    pub fn try_write(&mut self, value: u64) -> Result<(), WriteError> {
        self.end.step();

        let cfg = &self.end.shared.cfg;
        if value & !cfg.item_mask() != 0 {
            return Err(WriteError::TooWide {
                value,
                width: cfg.width(),
            });
        }
        if self.is_full() {
            tracing::trace!(write = self.end.counter.value(), "write refused, fifo full");
            return Err(WriteError::Full);
        }

        let idx = self.end.counter.address();
        self.end.shared.storage.write(idx, value);
        self.end.commit();
        Ok(())
    }

    /// `true` when a write would be refused right now. Does not step.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.end.blocked()
            || oracle::is_full(
                self.end.counter.value(),
                self.end.remote_view(),
                self.end.shared.cfg.guard_bit(),
            )
    }

    /// Items held as the producer sees them. Never below the true count.
    ///
    /// Reads as `capacity()` while a reset is pending or in flight, matching
    /// [`is_full`](Producer::is_full).
    pub fn occupancy(&self) -> usize {
        if self.end.blocked() {
            return self.capacity();
        }
        oracle::occupancy(
            self.end.counter.value(),
            self.end.remote_view(),
            self.end.shared.cfg.guard_bit(),
        ) as usize
    }

    /// One idle producer step.
    pub fn tick(&mut self) {
        self.end.step();
    }

    /// Runs enough steps for every consumer update published so far to be visible.
    pub fn settle(&mut self) {
        self.end.settle();
    }

    /// Asserts reset from the producer's side.
    pub fn reset(&mut self) {
        self.end.assert_reset();
    }

    pub fn reset_phase(&self) -> ResetPhase {
        self.end.reset.phase()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.end.shared.cfg.depth()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.end.shared.cfg.width()
    }
}

impl Consumer {
    /// Takes the oldest item and advances the read counter, or refuses.
    ///
    /// Counts as one consumer step whether or not an item is returned.
    ///
    /// # Errors
    /// [`ReadError::Empty`] if the consumer's view shows nothing to read.
    pub fn try_read(&mut self) -> Result<u64, ReadError> {
        self.end.step();

        if self.is_empty() {
            tracing::trace!(read = self.end.counter.value(), "read refused, fifo empty");
            return Err(ReadError::Empty);
        }

        let idx = self.end.counter.address();
        let value = self.end.shared.storage.read(idx);
        self.end.commit();
        Ok(value)
    }

    /// `true` when a read would be refused right now. Does not step.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end.blocked() || oracle::is_empty(self.end.counter.value(), self.end.remote_view())
    }

    /// Items held as the consumer sees them. Never above the true count.
    ///
    /// Reads as 0 while a reset is pending or in flight, matching
    /// [`is_empty`](Consumer::is_empty).
    pub fn occupancy(&self) -> usize {
        if self.end.blocked() {
            return 0;
        }
        oracle::occupancy(
            self.end.remote_view(),
            self.end.counter.value(),
            self.end.shared.cfg.guard_bit(),
        ) as usize
    }

    /// One idle consumer step.
    pub fn tick(&mut self) {
        self.end.step();
    }

    /// Runs enough steps for every producer update published so far to be visible.
    pub fn settle(&mut self) {
        self.end.settle();
    }

    /// Asserts reset from the consumer's side.
    pub fn reset(&mut self) {
        self.end.assert_reset();
    }

    pub fn reset_phase(&self) -> ResetPhase {
        self.end.reset.phase()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.end.shared.cfg.depth()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.end.shared.cfg.width()
    }
}

/// A FIFO with both domains in hand.
///
/// Useful for driving the two sides in lockstep from one thread; call
/// [`split`](Fifo::split) to hand each side to its own thread.
///
/// # Example
/// ```
/// use graywire_cdc::{Fifo, ReadError};
///
/// let mut fifo = Fifo::new(8, 4).unwrap();
/// fifo.try_write(7).unwrap();
/// assert_eq!(fifo.try_read(), Err(ReadError::Empty)); // not relayed yet
/// fifo.settle();
/// assert_eq!(fifo.try_read(), Ok(7));
/// ```
pub struct Fifo {
    producer: Producer,
    consumer: Consumer,
}

impl Fifo {
    /// Builds a FIFO of `depth` items of `width` bits with two-stage relays.
    ///
    /// # Errors
    /// [`ConfigError::NotPowerOfTwo`] for a depth that is not a power of two,
    /// and the other [`ConfigError`] variants for out-of-range parameters.
    pub fn new(width: usize, depth: usize) -> Result<Self, ConfigError> {
        Ok(Self::with_config(RingConfig::new(width, depth)?))
    }

    pub fn with_config(cfg: RingConfig) -> Self {
        let shared = Arc::new(Shared {
            cfg,
            storage: RingStorage::new(cfg.depth()),
            registers: [GrayRegister::new(), GrayRegister::new()],
            reset: ResetLine::new(),
        });
        Self {
            producer: Producer {
                end: Endpoint::new(Domain::Producer, Arc::clone(&shared)),
            },
            consumer: Consumer {
                end: Endpoint::new(Domain::Consumer, shared),
            },
        }
    }

    pub fn split(self) -> (Producer, Consumer) {
        (self.producer, self.consumer)
    }

    pub fn config(&self) -> RingConfig {
        self.producer.end.shared.cfg
    }

    pub fn producer(&mut self) -> &mut Producer {
        &mut self.producer
    }

    pub fn consumer(&mut self) -> &mut Consumer {
        &mut self.consumer
    }

    pub fn try_write(&mut self, value: u64) -> Result<(), WriteError> {
        self.producer.try_write(value)
    }

    pub fn try_read(&mut self) -> Result<u64, ReadError> {
        self.consumer.try_read()
    }

    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// True item count from both real counters. Only meaningful in lockstep use.
    ///
    /// Reads as 0 while either side has a reset pending or in flight, since
    /// the two counters then belong to different generations.
    pub fn occupancy(&self) -> usize {
        if self.producer.end.blocked() || self.consumer.end.blocked() {
            return 0;
        }
        oracle::occupancy(
            self.producer.end.counter.value(),
            self.consumer.end.counter.value(),
            self.config().guard_bit(),
        ) as usize
    }

    pub fn tick_producer(&mut self) {
        self.producer.tick();
    }

    pub fn tick_consumer(&mut self) {
        self.consumer.tick();
    }

    pub fn reset_producer(&mut self) {
        self.producer.reset();
    }

    pub fn reset_consumer(&mut self) {
        self.consumer.reset();
    }

    /// Asserts reset from both sides.
    pub fn reset(&mut self) {
        self.producer.reset();
        self.consumer.reset();
    }

    /// Steps both domains until every published update, and any reset in
    /// progress, has fully propagated.
    pub fn settle(&mut self) {
        // One extra round lets a domain held on the peer's acknowledgement
        // start its flush after the peer takes the reset.
        for _ in 0..=self.config().sync_stages() {
            self.producer.tick();
            self.consumer.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_not_full() {
        let fifo = Fifo::new(8, 4).unwrap();
        assert!(fifo.is_empty());
        assert!(!fifo.is_full());
        assert_eq!(fifo.occupancy(), 0);
    }

    #[test]
    fn write_visible_after_sync_stages_consumer_steps() {
        for stages in 2..=4 {
            let cfg = RingConfig::new(8, 4).unwrap().with_sync_stages(stages).unwrap();
            let (mut tx, mut rx) = Fifo::with_config(cfg).split();
            tx.try_write(5).unwrap();
            for _ in 1..stages {
                rx.tick();
                assert!(rx.is_empty(), "visible too early with {stages} stages");
            }
            rx.tick();
            assert!(!rx.is_empty());
            assert_eq!(rx.try_read(), Ok(5));
        }
    }

    #[test]
    fn rejects_values_wider_than_width() {
        let mut fifo = Fifo::new(4, 4).unwrap();
        assert_eq!(
            fifo.try_write(0x10),
            Err(WriteError::TooWide {
                value: 0x10,
                width: 4
            })
        );
        assert_eq!(fifo.occupancy(), 0);
        assert!(fifo.try_write(0xf).is_ok());
    }

    #[test]
    fn full_width_items_pass_through() {
        let mut fifo = Fifo::new(64, 2).unwrap();
        fifo.try_write(u64::MAX).unwrap();
        fifo.settle();
        assert_eq!(fifo.try_read(), Ok(u64::MAX));
    }

    #[test]
    fn producer_view_lags_consumer_reads() {
        let mut fifo = Fifo::new(8, 2).unwrap();
        fifo.try_write(1).unwrap();
        fifo.try_write(2).unwrap();
        assert!(fifo.is_full());
        fifo.settle();
        assert_eq!(fifo.try_read(), Ok(1));

        // Slot freed, but the producer has not stepped since.
        assert!(fifo.is_full());
        assert_eq!(fifo.producer().occupancy(), 2);
        fifo.producer().settle();
        assert!(!fifo.is_full());
        assert_eq!(fifo.producer().occupancy(), 1);
    }

    #[test]
    fn depth_one_alternates() {
        let mut fifo = Fifo::new(8, 1).unwrap();
        for v in 0..5u64 {
            fifo.try_write(v).unwrap();
            assert_eq!(fifo.try_write(99), Err(WriteError::Full));
            fifo.settle();
            assert_eq!(fifo.try_read(), Ok(v));
            fifo.settle();
        }
    }

    #[test]
    fn reset_phase_returns_to_running() {
        let mut fifo = Fifo::new(8, 4).unwrap();
        fifo.reset_producer();
        assert_eq!(fifo.producer().reset_phase(), ResetPhase::Held);
        fifo.settle();
        assert_eq!(fifo.producer().reset_phase(), ResetPhase::Running);
        assert_eq!(fifo.consumer().reset_phase(), ResetPhase::Running);
    }
}
