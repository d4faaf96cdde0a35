//! Benchmarks for category selection and the runner's per-test overhead.
//!
//! Uses Criterion for statistically rigorous measurement with regression
//! detection and HTML reports.
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench filter              # run all benchmarks
//! cargo bench --bench filter -- eligible  # filter by name
//! ```
//!
//! Reports are generated in `target/criterion/report/index.html`.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use tinyunit::{CategoryFilter, Registry, Runner, RunnerConfig, TestEntry};

// ------------------------------------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------------------------------------

/// Category tags cycled through the generated registries.
const TAGS: &[&str] = &["net", "disk", "cpu,slow", "io,net", "fast", "Net,Disk,slow"];

/// Registry of `n` no-op tests with rotating tags.
fn registry(n: usize) -> Registry {
    (0..n)
        .map(|i| TestEntry::new(format!("test_{i:05}"), TAGS[i % TAGS.len()], || 0))
        .collect()
}

fn filter(included: &str, excluded: &str) -> CategoryFilter {
    let mut filter = CategoryFilter::default();
    filter.set_included(included).expect("included");
    filter.set_excluded(excluded).expect("excluded");
    filter
}

// ------------------------------------------------------------------------------------------------
// Benchmarks
// ------------------------------------------------------------------------------------------------

fn bench_is_eligible(c: &mut Criterion) {
    let mut group = c.benchmark_group("eligible");
    let cases = [
        ("unfiltered", filter("", "")),
        ("included", filter("net,disk", "")),
        ("excluded", filter("", "slow")),
        ("both", filter("net,disk,io,cpu", "slow,fast")),
    ];

    for (name, f) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), f, |b, f| {
            b.iter(|| {
                TAGS.iter()
                    .filter(|tags| f.is_eligible(black_box(tags)))
                    .count()
            });
        });
    }
    group.finish();
}

fn bench_set_included(c: &mut Criterion) {
    let csv = "net, disk, cpu, io, fast, slow, gpu, mem, fs, tls, dns, http, grpc, sql, kv, log";
    c.bench_function("set_included_16", |b| {
        let mut f = CategoryFilter::default();
        b.iter(|| f.set_included(black_box(csv)).expect("fits"));
    });
}

fn bench_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("run");
    let runner = Runner::new(RunnerConfig { ansi: false });
    let f = filter("net", "slow");

    for n in [100, 1_000] {
        let reg = registry(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &reg, |b, reg| {
            let mut sink = Vec::with_capacity(64 * 1024);
            b.iter(|| {
                sink.clear();
                runner.run_to(reg, &f, &mut sink).expect("run")
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_is_eligible, bench_set_included, bench_run);
criterion_main!(benches);
