//! Benchmarks for the indicator engine and pattern detection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use chartsense::prelude::*;

/// Deterministic pseudo-random walk
fn generate_candles(n: usize) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0;
        let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

        let open = price;
        let close = (price + change).max(1.0);
        let high = open.max(close) + volatility * 0.5;
        let low = (open.min(close) - volatility * 0.5).max(0.5);

        candles.push(Candle::new(i as i64, open, high, low, close, 1_000 + (i % 17) as u64 * 50));
        price = close;
    }

    candles
}

fn bench_single_indicator(c: &mut Criterion) {
    let candles = generate_candles(1000);
    let engine = EngineBuilder::new().indicator("rsi_14", Rsi::default()).build().unwrap();
    let token = CancelToken::new();

    c.bench_function("rsi_1000_candles", |b| {
        b.iter(|| {
            let _ = black_box(engine.calculate(&token, "rsi_14", black_box(&candles)));
        })
    });
}

fn bench_all_indicators(c: &mut Criterion) {
    let candles = generate_candles(1000);
    let engine = Engine::with_defaults().unwrap();
    let token = CancelToken::new();

    c.bench_function("calculate_all_1000_candles", |b| {
        b.iter(|| {
            let _ = black_box(engine.calculate_all(&token, black_box(&candles)));
        })
    });
}

fn bench_workers(c: &mut Criterion) {
    let candles = generate_candles(5000);
    let token = CancelToken::new();

    let mut group = c.benchmark_group("workers");

    for workers in [1, 2, 4, 8].iter() {
        let engine = EngineBuilder::new()
            .workers(*workers)
            .with_all_defaults()
            .build()
            .unwrap();

        group.bench_with_input(BenchmarkId::new("calculate_all", workers), workers, |b, _| {
            b.iter(|| {
                let _ = black_box(engine.calculate_all(&token, black_box(&candles)));
            })
        });
    }

    group.finish();
}

fn bench_chart_patterns(c: &mut Criterion) {
    let detector = ChartPatternDetector::default();

    let mut group = c.benchmark_group("chart_patterns");

    for size in [100, 500, 1000, 5000].iter() {
        let candles = generate_candles(*size);

        group.bench_with_input(BenchmarkId::new("detect", size), size, |b, _| {
            b.iter(|| {
                let _ = black_box(detector.detect(black_box(&candles)));
            })
        });
    }

    group.finish();
}

fn bench_swing_points(c: &mut Criterion) {
    let candles = generate_candles(1000);

    c.bench_function("swing_points_1000_candles", |b| {
        b.iter(|| {
            let _ = black_box(find_swing_points(black_box(&candles), 3));
        })
    });
}

fn bench_candlesticks(c: &mut Criterion) {
    let candles = generate_candles(1000);
    let detector = CandlestickDetector::default();

    c.bench_function("candlesticks_1000_candles", |b| {
        b.iter(|| {
            let _ = black_box(detector.detect(black_box(&candles)));
        })
    });
}

criterion_group!(
    benches,
    bench_single_indicator,
    bench_all_indicators,
    bench_workers,
    bench_chart_patterns,
    bench_swing_points,
    bench_candlesticks,
);

criterion_main!(benches);
