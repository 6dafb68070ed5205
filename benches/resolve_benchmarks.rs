//! Micro benchmarks for target resolution
//!
//! Run with: cargo bench --bench resolve_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pgtwixt::{ConnectionString, Connector, SslMode};

fn resolve_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let connector = Connector::new(|_: &str| {});

    group.bench_function("defaults", |b| {
        let cs = ConnectionString::new();
        b.iter(|| connector.resolve(black_box(&cs)).unwrap())
    });

    for targets in [1usize, 4, 16, 64] {
        let hosts: Vec<String> = (0..targets).map(|i| format!("db{}.example.com", i)).collect();
        let addrs: Vec<String> = (0..targets).map(|i| format!("10.0.{}.{}", i / 256, i % 256)).collect();
        let cs = ConnectionString::new()
            .with_host(hosts)
            .with_hostaddr(addrs)
            .with_port(["5432"])
            .with_sslmode(SslMode::VerifyFull)
            .with_connect_timeout("10");

        group.throughput(Throughput::Elements(targets as u64));
        group.bench_with_input(BenchmarkId::new("tcp_targets", targets), &cs, |b, cs| {
            b.iter(|| connector.resolve(black_box(cs)).unwrap())
        });
    }

    group.bench_function("length_mismatch", |b| {
        let cs = ConnectionString::new()
            .with_host(["a", "b"])
            .with_port(["1", "2", "3"]);
        b.iter(|| connector.resolve(black_box(&cs)).unwrap_err())
    });

    group.finish();
}

criterion_group!(benches, resolve_benchmarks);
criterion_main!(benches);
