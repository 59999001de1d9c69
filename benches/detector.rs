//! Benchmarks for gap detection

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fvg_scanner::bars::{Bar, BarSeries};
use fvg_scanner::detector::FvgDetector;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Synthetic series with a gap roughly every 25 bars
fn synthetic_series(len: i64) -> BarSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
    let bars = (0..len)
        .map(|i| {
            let base = dec!(100) + Decimal::from(i % 25) * dec!(0.3);
            let jump = if i % 25 == 20 { dec!(5) } else { Decimal::ZERO };
            let base = base + jump;
            Bar {
                timestamp: start + Duration::minutes(i * 5),
                open: base,
                high: base + dec!(0.5),
                low: base - dec!(0.5),
                close: base + dec!(0.2),
                volume: dec!(1000),
            }
        })
        .collect();
    BarSeries::new(bars)
}

fn benchmark_detect_fvg(c: &mut Criterion) {
    let detector = FvgDetector::with_defaults();
    let series = synthetic_series(500);

    c.bench_function("detect_fvg_500", |b| {
        b.iter(|| detector.detect_fvg(black_box(&series)))
    });
}

fn benchmark_analyze_symbol(c: &mut Criterion) {
    let detector = FvgDetector::with_defaults();
    let series = synthetic_series(500);

    c.bench_function("analyze_symbol_500", |b| {
        b.iter(|| detector.analyze_symbol(black_box("BENCH"), Some(black_box(&series))))
    });
}

criterion_group!(benches, benchmark_detect_fvg, benchmark_analyze_symbol);
criterion_main!(benches);
