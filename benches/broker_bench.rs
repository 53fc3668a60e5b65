use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use bufferhub::{
    BufferBroker, BufferDescription, BufferUsage, NativeHandle, PixelFormat, SharedMemoryAllocator,
};
use std::sync::Arc;

fn benchmark_allocate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Allocate");

    for size in [64u32, 256, 1024].iter() {
        group.bench_with_input(BenchmarkId::new("rgba_square", size), size, |b, &size| {
            let broker = BufferBroker::new(Arc::new(SharedMemoryAllocator::new()));
            let desc = BufferDescription::new(size, size, 1, PixelFormat::RGBA_8888, BufferUsage::CPU_WRITE_OFTEN);

            b.iter(|| {
                let allocated = broker.allocate(&desc, 0).unwrap();
                broker.close(&allocated.client).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("Handoff");
    let broker = BufferBroker::new(Arc::new(SharedMemoryAllocator::new()));
    let producer = broker
        .allocate(&BufferDescription::blob(4096, BufferUsage::CPU_READ_OFTEN), 0)
        .unwrap()
        .client;

    group.bench_function("unknown_token", |b| {
        let forged = NativeHandle::from_token(0);
        b.iter(|| broker.import(&forged).is_err());
    });

    group.bench_function("mint_import_close", |b| {
        b.iter(|| {
            let token = producer.duplicate().unwrap();
            let consumer = broker.import(&token).unwrap().client;
            broker.close(&consumer).unwrap();
        });
    });

    group.finish();
}

fn benchmark_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("Report");

    for buffers in [1usize, 16, 128].iter() {
        group.bench_with_input(BenchmarkId::new("snapshot", buffers), buffers, |b, &buffers| {
            let broker = BufferBroker::new(Arc::new(SharedMemoryAllocator::new()));
            let desc = BufferDescription::blob(256, BufferUsage::CPU_READ_RARELY);
            let _clients: Vec<_> = (0..buffers)
                .map(|_| broker.allocate(&desc, 0).unwrap().client)
                .collect();

            b.iter(|| broker.report());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_allocate, benchmark_handoff, benchmark_report);
criterion_main!(benches);
