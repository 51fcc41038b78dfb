//! Criterion benchmarks for `EventQueue`.
//!
//! `enqueue` runs inside the OS keyboard hook and must stay O(1) whatever the
//! queue depth, including when the queue is full and the event is dropped.
//!
//! Run with:
//! ```bash
//! cargo bench --package keyweave-core --bench queue_bench
//! ```

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keyweave_core::{EventQueue, KeyEvent, PipelineEvent};

fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_enqueue");
    let event = PipelineEvent::Key(KeyEvent::new(0x41, false, false));

    group.bench_function("enqueue_then_dequeue", |b| {
        let queue = EventQueue::new(1024);
        b.iter(|| {
            queue.enqueue(black_box(event));
            queue.try_dequeue(Duration::ZERO)
        })
    });

    group.bench_function("enqueue_into_full_queue", |b| {
        let queue = EventQueue::new(16);
        while queue.enqueue(event) {}
        b.iter(|| queue.enqueue(black_box(event)))
    });

    group.bench_function("enqueue_after_dispose", |b| {
        let queue = EventQueue::new(16);
        queue.dispose();
        b.iter(|| queue.enqueue(black_box(event)))
    });

    group.finish();
}

criterion_group!(benches, bench_enqueue);
criterion_main!(benches);
