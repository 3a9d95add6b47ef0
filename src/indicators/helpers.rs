//! Shared windowed math used by every indicator
//!
//! Rolling functions return a series of the input length with `0.0` before the first full
//! window, matching the indicator output convention.

use crate::{Candle, OHLCVExt};

// ============================================================
// SERIES EXTRACTION
// ============================================================

#[inline]
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

#[inline]
pub fn highs(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.high).collect()
}

#[inline]
pub fn lows(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.low).collect()
}

#[inline]
pub fn typical_prices(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.typical_price()).collect()
}

// ============================================================
// WINDOW STATISTICS
// ============================================================

#[inline]
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean, 0 for an empty slice
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sum(values) / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Mean absolute deviation around the mean
pub fn mean_abs_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).abs()).sum::<f64>() / values.len() as f64
}

#[inline]
pub fn highest(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[inline]
pub fn lowest(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

// ============================================================
// TRUE RANGE
// ============================================================

/// True range of bar `i`. Bar 0 has no previous close and uses `high - low`.
#[inline]
pub fn true_range(candles: &[Candle], i: usize) -> f64 {
    let bar = &candles[i];
    if i == 0 {
        return bar.range();
    }
    let prev_close = candles[i - 1].close;
    bar.range()
        .max((bar.high - prev_close).abs())
        .max((bar.low - prev_close).abs())
}

pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    (0..candles.len()).map(|i| true_range(candles, i)).collect()
}

// ============================================================
// MOVING AVERAGES
// ============================================================

/// Simple moving average; first value at `period - 1`
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        out[i] = mean(&values[i + 1 - period..=i]);
    }
    out
}

/// SMA over `values[start..]`, leaving everything before `start + period - 1` at zero.
/// Used to smooth series that themselves have a warm-up prefix.
pub fn sma_from(values: &[f64], period: usize, start: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if period == 0 || start >= values.len() {
        return out;
    }
    let tail = sma(&values[start..], period);
    out[start..].copy_from_slice(&tail);
    out
}

/// Exponential moving average seeded with the SMA of the first `period` values,
/// `k = 2 / (period + 1)`; first value at `period - 1`
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    ema_from(values, period, 0)
}

/// EMA over `values[start..]`; first value at `start + period - 1`
pub fn ema_from(values: &[f64], period: usize, start: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if period == 0 || start + period > values.len() {
        return out;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed_at = start + period - 1;
    let mut prev = mean(&values[start..=seed_at]);
    out[seed_at] = prev;
    for i in (seed_at + 1)..values.len() {
        prev = (values[i] - prev) * k + prev;
        out[i] = prev;
    }
    out
}

/// Wilder smoothing of `values[start..]`: seed is the simple mean of the first `period` values
/// (placed at `start + period - 1`), then `avg = (avg * (period - 1) + new) / period`
pub fn wilder_smooth(values: &[f64], period: usize, start: usize) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if period == 0 || start + period > values.len() {
        return out;
    }
    let p = period as f64;
    let seed_at = start + period - 1;
    let mut avg = mean(&values[start..=seed_at]);
    out[seed_at] = avg;
    for i in (seed_at + 1)..values.len() {
        avg = (avg * (p - 1.0) + values[i]) / p;
        out[i] = avg;
    }
    out
}

// ============================================================
// TESTS
// ============================================================
