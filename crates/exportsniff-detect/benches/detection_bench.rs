//! Detection benchmarks: full scoring at several input sizes, the fast path,
//! the quick path, and cache hits.
//! Run with: cargo bench -p exportsniff-detect --bench detection_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use exportsniff_core::ExportSniffConfig;
use exportsniff_detect::FormatDetector;
use serde_json::{json, Value};

fn detector() -> FormatDetector {
    let mut config = ExportSniffConfig::default();
    config.detection.min_detection_time_ms = Some(0);
    FormatDetector::new(&config)
}

/// TestRail-shaped export with one unique key at the top level, so the
/// fast path never fires.
fn testrail_cases(count: usize) -> Value {
    let cases: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "case_id": i,
                "title": format!("Case {i}"),
                "priority_id": i % 4,
                "refs": format!("REQ-{i}")
            })
        })
        .collect();
    json!({"suite_id": 1, "cases": cases})
}

fn full_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scoring");
    group.sample_size(20);

    for size in [10, 100, 250] {
        let data = testrail_cases(size);
        let d = detector();
        group.bench_with_input(BenchmarkId::new("testrail_cases", size), &data, |b, data| {
            b.iter(|| {
                d.clear_cache();
                d.detect(data)
            });
        });
    }
    group.finish();
}

fn shortcut_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("shortcut_paths");

    let zephyr = json!({
        "testCase": {"name": "Login", "testCaseKey": "PROJ-T1"},
        "execution": {"status": "PASSED"},
        "cycle": {"id": 1}
    });
    let d = detector();
    group.bench_function("fast_path", |b| {
        b.iter(|| {
            d.clear_cache();
            d.detect(&zephyr)
        });
    });

    let large = testrail_cases(1500);
    group.bench_function("quick_path_large_input", |b| {
        b.iter(|| {
            d.clear_cache();
            d.detect(&large)
        });
    });

    let cached = testrail_cases(50);
    d.detect(&cached);
    group.bench_function("cache_hit", |b| b.iter(|| d.detect(&cached)));

    group.finish();
}

fn confidence(c: &mut Criterion) {
    let d = detector();
    let data = testrail_cases(50);
    c.bench_function("get_format_confidence", |b| {
        b.iter(|| d.get_format_confidence(&data, exportsniff_detect::SupportedFormat::TestRail))
    });
}

criterion_group!(benches, full_scoring, shortcut_paths, confidence);
criterion_main!(benches);
