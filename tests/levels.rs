//! Integration tests for Fibonacci levels and pivot points.

use chartsense::prelude::*;

fn bar(i: usize, high: f64, low: f64) -> Candle {
    let mid = (high + low) / 2.0;
    Candle::new(i as i64, mid, high, low, mid, 1_000)
}

#[test]
fn test_fibonacci_uptrend() {
    // low at bar 2, high at bar 7
    let candles: Vec<Candle> = [
        (105.0, 101.0),
        (104.0, 100.5),
        (103.0, 100.0),
        (108.0, 102.0),
        (112.0, 106.0),
        (116.0, 110.0),
        (119.0, 114.0),
        (120.0, 115.0),
        (118.0, 113.0),
        (117.0, 112.0),
    ]
    .iter()
    .enumerate()
    .map(|(i, &(h, l))| bar(i, h, l))
    .collect();

    let fib = FibonacciRetracement::new(10).calculate(&candles).unwrap();
    assert_eq!(fib.direction, Direction::Bullish);
    assert_eq!((fib.low_index, fib.high_index), (2, 7));
    assert_eq!(fib.level(0.0), Some(120.0));
    assert!((fib.level(0.5).unwrap() - 110.0).abs() < 1e-9);
    assert!((fib.level(0.618).unwrap() - 107.64).abs() < 1e-9);
    assert!((fib.level(1.618).unwrap() - 87.64).abs() < 1e-9);
    assert!(fib.retracements().all(|l| l.price >= 100.0 && l.price <= 120.0));
}

#[test]
fn test_fibonacci_downtrend_uses_trailing_window() {
    let mut candles: Vec<Candle> = (0..5).map(|i| bar(i, 200.0, 10.0)).collect();
    candles.extend((0..6).map(|k| {
        let top = 130.0 - 5.0 * k as f64;
        bar(5 + k, top, top - 4.0)
    }));

    let fib = FibonacciRetracement::new(6).calculate(&candles).unwrap();
    assert_eq!(fib.direction, Direction::Bearish);
    assert_eq!((fib.high_index, fib.low_index), (5, 10));
    assert_eq!(fib.swing_high, 130.0);
    assert_eq!(fib.swing_low, 101.0);
    assert_eq!(fib.level(0.0), Some(101.0));
    assert_eq!(fib.nearest(129.0).map(|l| l.ratio), Some(1.0));
}

#[test]
fn test_fibonacci_rejects_short_series() {
    let candles: Vec<Candle> = (0..5).map(|i| bar(i, 110.0, 100.0)).collect();
    assert!(matches!(
        FibonacciRetracement::default().calculate(&candles),
        Err(IndicatorError::InsufficientData { need: 50, got: 5 })
    ));
    assert!(matches!(
        FibonacciRetracement::new(0).calculate(&candles),
        Err(IndicatorError::InvalidPeriod { .. })
    ));
}

#[test]
fn test_standard_pivots_from_series() {
    let candles = vec![
        Candle::new(0, 95.0, 99.0, 94.0, 98.0, 1_000),
        Candle::new(1, 98.0, 110.0, 90.0, 100.0, 1_000),
    ];
    let p = PivotLevels::from_series(PivotMethod::Standard, &candles).unwrap();
    assert_eq!(p.pivot, 100.0);
    assert_eq!(p.resistances(), vec![110.0, 120.0, 130.0]);
    assert_eq!(p.supports(), vec![90.0, 80.0, 70.0]);
}

#[test]
fn test_pivot_methods() {
    let c = Candle::new(0, 98.0, 110.0, 90.0, 104.0, 1_000);

    let woodie = PivotLevels::from_candle(PivotMethod::Woodie, &c);
    assert!((woodie.pivot - 102.0).abs() < 1e-9);

    let camarilla = PivotLevels::from_candle(PivotMethod::Camarilla, &c);
    assert!((camarilla.r1 - (104.0 + 22.0 / 12.0)).abs() < 1e-9);
    assert!((camarilla.s3.unwrap() - (104.0 - 22.0 / 4.0)).abs() < 1e-9);

    // close above open: x = 2H + L + C = 414
    let demark = PivotLevels::from_candle(PivotMethod::DeMark, &c);
    assert!((demark.pivot - 103.5).abs() < 1e-9);
    assert!((demark.r1 - 117.0).abs() < 1e-9);
    assert!((demark.s1 - 97.0).abs() < 1e-9);
    assert_eq!(demark.resistances().len(), 1);
    assert!(demark.r2.is_none() && demark.s3.is_none());
}

#[test]
fn test_pivots_require_a_candle() {
    assert!(matches!(
        PivotLevels::from_series(PivotMethod::Standard, &[]),
        Err(IndicatorError::InsufficientData { need: 1, got: 0 })
    ));
}

#[test]
fn test_levels_serialize() {
    let fib = FibonacciLevels::from_swing(120.0, 100.0, Direction::Bullish);
    let json = serde_json::to_value(&fib).unwrap();
    assert_eq!(json["levels"].as_array().map(Vec::len), Some(FIB_RATIOS.len()));

    let pivots = PivotLevels::calculate(PivotMethod::DeMark, 100.0, 110.0, 90.0, 100.0);
    let json = serde_json::to_value(pivots).unwrap();
    assert!(json["r2"].is_null());
}
