//! Benchmarks for the orchestrator hot paths.
//!
//! Benchmarks cover:
//! - Queue operations (push/select, equal-priority rotation)
//! - Change filtering in the summarizer
//! - Envelope and MQTT packet encoding
//! - End-to-end scheduler iterations

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use edgeiq_orchestrator::core::{
    AlwaysOk, Envelope, FnTask, Publisher, Scheduler, SchedulerOptions, Selection, Summarizer, TaskQueue, Verdict,
};
use edgeiq_orchestrator::infra::publisher::mqtt::encode_publish;
use edgeiq_orchestrator::infra::InMemoryPublisher;
use serde_json::json;
use tokio::runtime::Runtime;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_queue_push_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_select");

    for size in [10_u64, 100, 1_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let names: Vec<String> = (0..size).map(|i| format!("task-{i}")).collect();
            b.iter(|| {
                let now = Instant::now();
                let mut q = TaskQueue::new();
                for (i, name) in names.iter().enumerate() {
                    q.push(name, i, (i % 7) as i32, now);
                }
                while let Selection::Ready(entry) = q.select(now) {
                    black_box(entry);
                }
            });
        });
    }
    group.finish();
}

fn bench_queue_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_rotation");

    for size in [3_u64, 30, 300] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let now = Instant::now();
            let mut q = TaskQueue::new();
            for i in 0..size {
                q.push(&format!("task-{i}"), i, 5, now);
            }
            b.iter(|| {
                for _ in 0..size {
                    if let Selection::Ready(entry) = q.select(now) {
                        q.push(&entry.name, entry.item, entry.priority, now);
                    }
                }
            });
        });
    }
    group.finish();
}

fn bench_queue_mostly_waiting(c: &mut Criterion) {
    c.bench_function("queue_select_with_deferred_head", |b| {
        let now = Instant::now();
        let mut q = TaskQueue::new();
        for i in 0..100_u32 {
            q.push(&format!("deferred-{i}"), i, 0, now + Duration::from_secs(60));
        }
        q.push("ready", 100, 9, now);
        b.iter(|| {
            if let Selection::Ready(entry) = q.select(now) {
                q.push(&entry.name, entry.item, entry.priority, now);
            }
        });
    });
}

// ============================================================================
// Summarizer Benchmarks
// ============================================================================

fn bench_summarizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarizer");
    let reading = json!({
        "prediction": "normal",
        "confidence": 0.91,
        "features": [0.1, 0.4, 0.9, 1.3, 2.2],
    });

    group.bench_function("suppress_unchanged", |b| {
        let mut s = Summarizer::new();
        s.summarize("ml", reading.clone());
        b.iter(|| black_box(s.summarize("ml", reading.clone())));
    });

    group.bench_function("emit_alternating", |b| {
        let mut s = Summarizer::new();
        let other = json!({ "prediction": "anomaly", "confidence": 0.77 });
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let next = if flip { reading.clone() } else { other.clone() };
            let verdict = s.summarize("ml", next);
            debug_assert!(matches!(verdict, Verdict::Emit(_)));
            black_box(verdict)
        });
    });
    group.finish();
}

// ============================================================================
// Encoding Benchmarks
// ============================================================================

fn bench_encoding(c: &mut Criterion) {
    let envelope = Envelope::new(
        "ml",
        json!({ "prediction": "normal", "confidence": 0.91 }),
        1_700_000_000.25,
    );

    c.bench_function("envelope_to_mqtt_publish", |b| {
        b.iter(|| {
            let payload = black_box(&envelope).to_json().unwrap();
            black_box(encode_publish("edgeiq/results", &payload).unwrap())
        });
    });
}

// ============================================================================
// Scheduler Benchmarks
// ============================================================================

fn bench_scheduler_iterations(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("scheduler_iterations");

    for iterations in [100_u64, 1_000] {
        group.throughput(Throughput::Elements(iterations));
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &iterations,
            |b, &iterations| {
                b.to_async(&rt).iter(|| async move {
                    let options = SchedulerOptions {
                        inter_task_gap: Duration::ZERO,
                        ..SchedulerOptions::default()
                    };
                    let mut scheduler = Scheduler::new(options);
                    let cancel = CancellationToken::new();
                    let stop = cancel.clone();
                    let mut runs = 0_u64;
                    scheduler
                        .add_task(
                            FnTask::new("sensor", move || {
                                runs += 1;
                                if runs >= iterations {
                                    stop.cancel();
                                }
                                Ok(json!(runs % 4))
                            }),
                            1,
                            Duration::ZERO,
                        )
                        .unwrap();
                    let mut publisher = InMemoryPublisher::new();
                    publisher.connect().await.unwrap();
                    scheduler
                        .run(&mut AlwaysOk, &mut AlwaysOk, &mut publisher, &cancel)
                        .await
                        .unwrap();
                    black_box(publisher.envelopes().len())
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(
    queue_benches,
    bench_queue_push_select,
    bench_queue_rotation,
    bench_queue_mostly_waiting
);

criterion_group!(filter_benches, bench_summarizer, bench_encoding);

criterion_group!(scenario_benches, bench_scheduler_iterations);

criterion_main!(queue_benches, filter_benches, scenario_benches);
