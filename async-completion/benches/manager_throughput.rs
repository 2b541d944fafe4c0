//! Throughput benchmarks for submitting writes through the normal manager at
//! different payload sizes and concurrency levels.

use std::sync::Arc;

use async_completion::infrastructure::Settings;
use async_completion::Subsystem;
use async_completion_domain::entities::CompletionEvent;
use async_completion_domain::value_objects::{BackendKind, OpenFlags};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::NamedTempFile;
use tokio::runtime::Runtime;

fn noop_callback() -> Arc<dyn Fn(CompletionEvent) + Send + Sync> {
    Arc::new(|_event: CompletionEvent| {})
}

fn benchmark_write_sizes(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let subsystem = Subsystem::new(Settings::default()).unwrap();
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = rt.block_on(subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write())).unwrap();
    let template = subsystem.create_device_template(0, noop_callback());

    let mut group = c.benchmark_group("submit_write");
    for size_kb in [4, 64, 256, 1024].iter() {
        let data = vec![0u8; size_kb * 1024];
        group.bench_with_input(BenchmarkId::new("write", size_kb), size_kb, |b, _| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let start = std::time::Instant::now();
                    for i in 0..iters {
                        let offset = (i % 64) * data.len() as u64;
                        let (_task, rx) = subsystem.write(endpoint.clone(), template, offset, data.clone(), None).unwrap();
                        black_box(rx.await.unwrap().unwrap());
                    }
                    start.elapsed()
                })
            });
        });
    }
    group.finish();
}

fn benchmark_concurrent_submissions(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let subsystem = Arc::new(Subsystem::new(Settings::default()).unwrap());
    let tmp = NamedTempFile::new().unwrap();
    let endpoint = rt.block_on(subsystem.create_endpoint_for_file(tmp.path(), BackendKind::Buffered, OpenFlags::read_write())).unwrap();
    let template = subsystem.create_device_template(0, noop_callback());
    let data = vec![0u8; 4096];

    let mut group = c.benchmark_group("concurrent_submissions");
    for in_flight in [1, 8, 32].iter() {
        group.bench_with_input(BenchmarkId::new("writes", in_flight), in_flight, |b, &in_flight| {
            b.iter_custom(|iters| {
                rt.block_on(async {
                    let start = std::time::Instant::now();
                    for _ in 0..iters {
                        let mut receivers = Vec::with_capacity(in_flight);
                        for j in 0..in_flight {
                            let offset = (j as u64) * data.len() as u64;
                            let (_task, rx) = subsystem.write(endpoint.clone(), template, offset, data.clone(), None).unwrap();
                            receivers.push(rx);
                        }
                        for rx in receivers {
                            black_box(rx.await.unwrap().unwrap());
                        }
                    }
                    start.elapsed()
                })
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_write_sizes, benchmark_concurrent_submissions);
criterion_main!(benches);
