use graywire_cdc::{Fifo, RingConfig};
use std::thread;
use std::time::{Duration, Instant};

// ─── Fixtures ───────────────────────────────────────────────────────────────

pub fn ring(depth: usize, stages: usize) -> RingConfig {
    RingConfig::new(64, depth)
        .and_then(|c| c.with_sync_stages(stages))
        .expect("bench geometry must be valid")
}

/// A lockstep fifo with `fill` items already visible to the consumer.
pub fn primed_fifo(depth: usize, fill: usize) -> Fifo {
    let mut fifo = Fifo::with_config(ring(depth, 2));
    for i in 0..fill as u64 {
        fifo.try_write(i).expect("fill must fit");
    }
    fifo.settle();
    fifo
}

// ─── Cross-thread transfer ──────────────────────────────────────────────────

pub struct Transfer {
    pub elapsed: Duration,
    pub full_polls: u64,
    pub empty_polls: u64,
}

/// Moves `items` sequential values between two threads and times the whole run.
pub fn threaded_transfer(cfg: RingConfig, items: u64) -> Transfer {
    let (mut tx, mut rx) = Fifo::with_config(cfg).split();
    let start = Instant::now();

    let producer = thread::spawn(move || {
        let mut full_polls = 0u64;
        for i in 0..items {
            while tx.try_write(i).is_err() {
                full_polls += 1;
                std::hint::spin_loop();
            }
        }
        full_polls
    });

    let mut empty_polls = 0u64;
    let mut received = 0u64;
    while received < items {
        match rx.try_read() {
            Ok(v) => {
                debug_assert_eq!(v, received);
                received += 1;
            }
            Err(_) => {
                empty_polls += 1;
                std::hint::spin_loop();
            }
        }
    }

    let full_polls = producer.join().expect("producer thread panicked");
    Transfer {
        elapsed: start.elapsed(),
        full_polls,
        empty_polls,
    }
}

pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primed_fifo_is_readable() {
        let mut fifo = primed_fifo(8, 3);
        assert_eq!(fifo.try_read(), Ok(0));
        assert_eq!(fifo.occupancy(), 2);
    }

    #[test]
    fn threaded_transfer_completes() {
        let t = threaded_transfer(ring(8, 2), 10_000);
        assert!(t.elapsed > Duration::ZERO);
    }

    #[test]
    fn counts_are_abbreviated() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_500), "1.5K");
        assert_eq!(format_count(2_000_000), "2.00M");
    }
}
