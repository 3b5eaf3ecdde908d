use anyhow::{Context, bail};
use graywire_cdc::{Consumer, Fifo, Producer};
use graywire_config::GraywireConfig;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cfg = match std::env::args().nth(1) {
        Some(path) => GraywireConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => GraywireConfig::default(),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ring = cfg.ring_config()?;
    let mask = ring.item_mask();
    let items = cfg.items;

    info!(
        depth = ring.depth(),
        width = ring.width(),
        sync_stages = ring.sync_stages(),
        items,
        "GRAYWIRE: starting soak"
    );

    let (tx, rx) = Fifo::with_config(ring).split();
    let start = Instant::now();

    let producer = std::thread::Builder::new()
        .name("graywire-producer".into())
        .spawn(move || produce(tx, items, mask))
        .context("spawning producer")?;
    let consumer = std::thread::Builder::new()
        .name("graywire-consumer".into())
        .spawn(move || consume(rx, items, mask))
        .context("spawning consumer")?;

    let full_polls = producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))?;
    let report = consumer
        .join()
        .map_err(|_| anyhow::anyhow!("consumer thread panicked"))?;

    let elapsed = start.elapsed();
    let rate = report.received as f64 / elapsed.as_secs_f64();
    info!(
        received = report.received,
        full_polls,
        empty_polls = report.empty_polls,
        ?elapsed,
        "GRAYWIRE: soak finished (~{rate:.0} items/s)"
    );

    if let Some((index, got, want)) = report.first_mismatch {
        bail!("order violation at item {index}: got {got:#x}, expected {want:#x}");
    }
    Ok(())
}

fn produce(mut tx: Producer, items: u64, mask: u64) -> u64 {
    let mut full_polls = 0u64;
    let mut last = Instant::now();
    let mut sent_since = 0u64;

    for i in 0..items {
        while tx.try_write(i & mask).is_err() {
            full_polls += 1;
            std::hint::spin_loop();
        }
        sent_since += 1;

        if last.elapsed() >= Duration::from_secs(1) {
            info!("GRAYWIRE: write rate ~ {sent_since} items/s");
            sent_since = 0;
            last = Instant::now();
        }
    }
    full_polls
}

struct ConsumeReport {
    received: u64,
    empty_polls: u64,
    first_mismatch: Option<(u64, u64, u64)>,
}

fn consume(mut rx: Consumer, items: u64, mask: u64) -> ConsumeReport {
    let mut report = ConsumeReport {
        received: 0,
        empty_polls: 0,
        first_mismatch: None,
    };

    while report.received < items {
        match rx.try_read() {
            Ok(v) => {
                let want = report.received & mask;
                if v != want && report.first_mismatch.is_none() {
                    warn!(index = report.received, got = v, want, "out-of-order item");
                    report.first_mismatch = Some((report.received, v, want));
                }
                report.received += 1;
            }
            Err(_) => {
                report.empty_polls += 1;
                std::hint::spin_loop();
            }
        }
    }
    report
}
