//! Fibonacci retracement and extension levels

use crate::{indicators::ensure_len, indicators::ensure_period, Candle, Direction, Result};

/// Retracement ratios followed by the two extensions
pub const FIB_RATIOS: [f64; 9] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0, 1.272, 1.618];

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FibLevel {
    pub ratio: f64,
    pub price: f64,
}

/// Levels measured from one swing high/low pair.
///
/// Bullish (uptrend, low before high): levels retrace down from the high.
/// Bearish (downtrend, high before low): levels retrace up from the low.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FibonacciLevels {
    pub swing_high: f64,
    pub swing_low: f64,
    pub high_index: usize,
    pub low_index: usize,
    pub direction: Direction,
    pub levels: Vec<FibLevel>,
}

impl FibonacciLevels {
    /// Levels for an explicit swing pair. Indices are left at zero.
    pub fn from_swing(swing_high: f64, swing_low: f64, direction: Direction) -> Self {
        Self::build(swing_high, swing_low, 0, 0, direction)
    }

    fn build(
        swing_high: f64,
        swing_low: f64,
        high_index: usize,
        low_index: usize,
        direction: Direction,
    ) -> Self {
        let range = swing_high - swing_low;
        let levels = FIB_RATIOS
            .iter()
            .map(|&ratio| FibLevel {
                ratio,
                price: if direction.is_bearish() {
                    swing_low + range * ratio
                } else {
                    swing_high - range * ratio
                },
            })
            .collect();
        Self {
            swing_high,
            swing_low,
            high_index,
            low_index,
            direction,
            levels,
        }
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.swing_high - self.swing_low
    }

    /// Price at `ratio`, if it is one of [`FIB_RATIOS`]
    pub fn level(&self, ratio: f64) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| (l.ratio - ratio).abs() < 1e-9)
            .map(|l| l.price)
    }

    /// Level closest to `price`
    pub fn nearest(&self, price: f64) -> Option<FibLevel> {
        self.levels.iter().copied().min_by(|a, b| {
            (a.price - price)
                .abs()
                .total_cmp(&(b.price - price).abs())
        })
    }

    /// Retracement levels only (ratios 0 through 1)
    pub fn retracements(&self) -> impl Iterator<Item = &FibLevel> {
        self.levels.iter().filter(|l| l.ratio <= 1.0)
    }
}

/// Fibonacci levels over the raw extremes of the last `lookback` candles
#[derive(Debug, Clone, Copy)]
pub struct FibonacciRetracement {
    pub lookback: usize,
}

impl Default for FibonacciRetracement {
    fn default() -> Self {
        Self { lookback: 50 }
    }
}

impl FibonacciRetracement {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    /// Trend comes from which extreme occurs first: low at or before high is an uptrend.
    /// Ties on price keep the earliest bar.
    pub fn calculate(&self, candles: &[Candle]) -> Result<FibonacciLevels> {
        ensure_period("lookback", self.lookback)?;
        ensure_len(candles, self.lookback)?;

        let start = candles.len() - self.lookback;
        let (mut high_index, mut low_index) = (start, start);
        for (i, candle) in candles.iter().enumerate().skip(start) {
            if candle.high > candles[high_index].high {
                high_index = i;
            }
            if candle.low < candles[low_index].low {
                low_index = i;
            }
        }

        let direction = if low_index <= high_index {
            Direction::Bullish
        } else {
            Direction::Bearish
        };
        Ok(FibonacciLevels::build(
            candles[high_index].high,
            candles[low_index].low,
            high_index,
            low_index,
            direction,
        ))
    }
}
