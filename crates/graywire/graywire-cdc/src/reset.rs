//! Reset delivery across the two domains.
//!
//! Reset can be asserted from either side at any time, and each side takes it
//! at one of its own steps, not at the same instant. The shared [`ResetLine`]
//! carries a generation number; a domain that sees a generation newer than
//! the one it last took resets itself and acknowledges the new generation.
//!
//! # Protocol
//!
//! **Taking reset (per domain):**
//! 1. Zero the local counter
//! 2. Publish `gray(0)` in the domain's register
//! 3. Fill the local relay with `gray(0)`
//! 4. Acknowledge the generation (`Release`)
//! 5. Hold until the peer has acknowledged it too
//! 6. Flush: sample the peer for `N` steps without acting on the relay
//! 7. Run
//!
//! Acknowledging after step 2 means that once a domain sees the peer's
//! acknowledgement, the peer's register already reads zero for this
//! generation. Everything sampled while flushing is therefore a value the peer
//! held after its own reset.
//!
//! ```text
//!  Running ──(newer generation seen)──► Held ──(peer acked)──► Flushing{N} ──(N steps)──► Running
//! ```
//!
//! While a reset is pending, held, or flushing, the producer reports full and
//! the consumer reports empty.

use std::sync::atomic::{AtomicU64, Ordering};

/// Which side of the FIFO a piece of state belongs to.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Producer = 0,
    Consumer = 1,
}

impl Domain {
    #[inline(always)]
    pub fn peer(self) -> Domain {
        match self {
            Domain::Producer => Domain::Consumer,
            Domain::Consumer => Domain::Producer,
        }
    }
}

/// The out-of-band reset signal shared by both domains.
#[derive(Debug, Default)]
pub struct ResetLine {
    /// Bumped once per assertion. Never decreases.
    generation: AtomicU64,
    /// Last generation each domain has fully taken, indexed by [`Domain`].
    acked: [AtomicU64; 2],
}

impl ResetLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the line. Returns the new generation.
    pub fn assert(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[inline(always)]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Records that `domain` has zeroed and republished its counter for `generation`.
    pub fn acknowledge(&self, domain: Domain, generation: u64) {
        self.acked[domain as usize].store(generation, Ordering::Release);
    }

    #[inline(always)]
    pub fn acknowledged(&self, domain: Domain) -> u64 {
        self.acked[domain as usize].load(Ordering::Acquire)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetPhase {
    /// Normal operation.
    Running,
    /// Reset taken locally, waiting for the peer to take it.
    Held,
    /// Both sides reset; relay is refilling with post-reset samples.
    Flushing { remaining: usize },
}

/// One domain's position in the reset protocol.
#[derive(Debug, Clone)]
pub struct ResetTracker {
    domain: Domain,
    seen: u64,
    phase: ResetPhase,
    flush_steps: usize,
}

impl ResetTracker {
    pub fn new(domain: Domain, flush_steps: usize) -> Self {
        Self {
            domain,
            seen: 0,
            phase: ResetPhase::Running,
            flush_steps,
        }
    }

    #[inline]
    pub fn phase(&self) -> ResetPhase {
        self.phase
    }

    #[inline]
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// A generation this domain has not taken yet is on the line.
    #[inline(always)]
    pub fn pending(&self, line: &ResetLine) -> bool {
        line.generation() != self.seen
    }

    /// The domain must refuse every transfer right now.
    #[inline(always)]
    pub fn blocked(&self, line: &ResetLine) -> bool {
        self.phase != ResetPhase::Running || self.pending(line)
    }

    /// Finishes taking `generation`. Call only after the counter is zero and published.
    pub fn acknowledge(&mut self, line: &ResetLine, generation: u64) {
        self.seen = generation;
        self.phase = ResetPhase::Held;
        line.acknowledge(self.domain, generation);
    }

    /// Moves a held domain to flushing once the peer has caught up.
    ///
    /// Returns `true` when the relay may sample on this step.
    pub fn may_sample(&mut self, line: &ResetLine) -> bool {
        if self.phase == ResetPhase::Held {
            if line.acknowledged(self.domain.peer()) < self.seen {
                return false;
            }
            tracing::debug!(domain = ?self.domain, generation = self.seen, "peer reset observed, flushing relay");
            self.phase = ResetPhase::Flushing {
                remaining: self.flush_steps,
            };
        }
        true
    }

    /// Counts one flush step. Call after the relay has sampled.
    pub fn after_sample(&mut self) {
        if let ResetPhase::Flushing { remaining } = self.phase {
            if remaining <= 1 {
                tracing::debug!(domain = ?self.domain, generation = self.seen, "reset released");
                self.phase = ResetPhase::Running;
            } else {
                self.phase = ResetPhase::Flushing {
                    remaining: remaining - 1,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_bumps_generation() {
        let line = ResetLine::new();
        assert_eq!(line.generation(), 0);
        assert_eq!(line.assert(), 1);
        assert_eq!(line.assert(), 2);
        assert_eq!(line.generation(), 2);
    }

    #[test]
    fn fresh_tracker_runs() {
        let line = ResetLine::new();
        let t = ResetTracker::new(Domain::Producer, 2);
        assert_eq!(t.phase(), ResetPhase::Running);
        assert!(!t.blocked(&line));
    }

    #[test]
    fn pending_generation_blocks() {
        let line = ResetLine::new();
        let t = ResetTracker::new(Domain::Consumer, 2);
        line.assert();
        assert!(t.pending(&line));
        assert!(t.blocked(&line));
    }

    #[test]
    fn held_until_peer_acknowledges() {
        let line = ResetLine::new();
        let mut p = ResetTracker::new(Domain::Producer, 2);
        let g = line.assert();
        p.acknowledge(&line, g);
        assert_eq!(p.phase(), ResetPhase::Held);
        assert!(!p.may_sample(&line));
        assert_eq!(p.phase(), ResetPhase::Held);

        line.acknowledge(Domain::Consumer, g);
        assert!(p.may_sample(&line));
        assert_eq!(p.phase(), ResetPhase::Flushing { remaining: 2 });
    }

    #[test]
    fn flush_lasts_configured_steps() {
        let line = ResetLine::new();
        let mut c = ResetTracker::new(Domain::Consumer, 3);
        let g = line.assert();
        line.acknowledge(Domain::Producer, g);
        c.acknowledge(&line, g);

        for _ in 0..2 {
            assert!(c.may_sample(&line));
            c.after_sample();
            assert!(c.blocked(&line));
        }
        assert!(c.may_sample(&line));
        c.after_sample();
        assert_eq!(c.phase(), ResetPhase::Running);
        assert!(!c.blocked(&line));
    }

    #[test]
    fn peer_of_peer_is_self() {
        assert_eq!(Domain::Producer.peer(), Domain::Consumer);
        assert_eq!(Domain::Consumer.peer().peer(), Domain::Consumer);
    }
}
