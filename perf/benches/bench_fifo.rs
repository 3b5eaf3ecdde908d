use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use graywire_cdc::{Fifo, GrayValue};
use graywire_perf::{primed_fifo, ring};

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("gray");
    group.throughput(Throughput::Elements(1));

    group.bench_function("encode", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n = n.wrapping_add(1);
            black_box(GrayValue::encode(black_box(n)))
        });
    });

    group.bench_function("decode", |b| {
        let g = GrayValue::encode(0x0123_4567_89ab_cdef);
        b.iter(|| black_box(black_box(g).decode()));
    });

    group.finish();
}

fn bench_lockstep(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo");
    group.throughput(Throughput::Elements(1));

    group.bench_function("round_trip", |b| {
        let mut fifo = primed_fifo(1024, 512);
        let mut v = 0u64;
        b.iter(|| {
            let _ = fifo.try_write(black_box(v));
            v = v.wrapping_add(1);
            black_box(fifo.try_read())
        });
    });

    group.bench_function("try_read (empty)", |b| {
        let mut fifo = Fifo::with_config(ring(1024, 2));
        b.iter(|| black_box(fifo.try_read()));
    });

    group.bench_function("try_write (full)", |b| {
        let mut fifo = primed_fifo(16, 16);
        b.iter(|| black_box(fifo.try_write(black_box(1))));
    });

    group.bench_function("is_empty", |b| {
        let fifo = primed_fifo(1024, 8);
        b.iter(|| black_box(fifo.is_empty()));
    });

    group.finish();
}

fn bench_sync_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo_stages");
    group.throughput(Throughput::Elements(1));

    for &stages in &[2usize, 3, 4, 8] {
        group.bench_function(format!("round_trip_stages_{stages}"), |b| {
            let mut fifo = Fifo::with_config(ring(1024, stages));
            for i in 0..512 {
                fifo.try_write(i).expect("fill must fit");
            }
            fifo.settle();
            let mut v = 0u64;
            b.iter(|| {
                let _ = fifo.try_write(black_box(v));
                v = v.wrapping_add(1);
                black_box(fifo.try_read())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_lockstep, bench_sync_stages);
criterion_main!(benches);
