//! Shared geometry for chart pattern recognizers

use crate::{Candle, Direction, SwingPoint};

/// Relative price comparison. Receives `(a, b, tolerance)`.
pub type PriceEq = fn(f64, f64, f64) -> bool;

/// Completion reported while the neckline is intact
pub const FORMING: f64 = 0.8;
/// Completion reported once the last close broke the neckline
pub const CONFIRMED: f64 = 1.0;

/// `|a - b| / a <= tolerance`. A zero reference only equals zero.
#[inline]
pub fn prices_equal(a: f64, b: f64, tolerance: f64) -> bool {
    if a == 0.0 {
        return b == 0.0;
    }
    ((a - b) / a).abs() <= tolerance
}

/// Price change per bar between two swings
#[inline]
pub fn slope(from: &SwingPoint, to: &SwingPoint) -> f64 {
    if to.index == from.index {
        return 0.0;
    }
    (to.price - from.price) / (to.index as f64 - from.index as f64)
}

/// Lowest swing strictly between two bar indices
pub fn lowest_between(swings: &[SwingPoint], from: usize, to: usize) -> Option<SwingPoint> {
    swings
        .iter()
        .filter(|s| s.index > from && s.index < to)
        .copied()
        .min_by(|a, b| a.price.total_cmp(&b.price))
}

/// Highest swing strictly between two bar indices
pub fn highest_between(swings: &[SwingPoint], from: usize, to: usize) -> Option<SwingPoint> {
    swings
        .iter()
        .filter(|s| s.index > from && s.index < to)
        .copied()
        .max_by(|a, b| a.price.total_cmp(&b.price))
}

/// Trend into bar `start`, from the close `bars` earlier (clamped to the first bar).
/// An unchanged close, or no history at all, is Neutral.
pub fn prior_trend(candles: &[Candle], start: usize, bars: usize) -> Direction {
    if start == 0 || start >= candles.len() {
        return Direction::Neutral;
    }
    let from = start.saturating_sub(bars);
    let change = candles[start].close - candles[from].close;
    if change > 0.0 {
        Direction::Bullish
    } else if change < 0.0 {
        Direction::Bearish
    } else {
        Direction::Neutral
    }
}

/// [`CONFIRMED`] once `last_close` is beyond the neckline in the pattern direction
pub fn completion(direction: Direction, neckline: f64, last_close: f64) -> f64 {
    let broken = match direction {
        Direction::Bullish => last_close > neckline,
        Direction::Bearish => last_close < neckline,
        Direction::Neutral => false,
    };
    if broken {
        CONFIRMED
    } else {
        FORMING
    }
}

/// Two consecutive swing highs and two consecutive swing lows bounding one formation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub h1: SwingPoint,
    pub h2: SwingPoint,
    pub l1: SwingPoint,
    pub l2: SwingPoint,
}

impl Channel {
    #[inline]
    pub fn start(&self) -> usize {
        self.h1.index.min(self.l1.index)
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.h2.index.max(self.l2.index)
    }

    #[inline]
    pub fn high_slope(&self) -> f64 {
        slope(&self.h1, &self.h2)
    }

    #[inline]
    pub fn low_slope(&self) -> f64 {
        slope(&self.l1, &self.l2)
    }
}

/// Channels from the most recent high pair backward, and within each, the most recent low pair
/// backward. Both first points must precede both second points.
pub fn channels<'a>(
    highs: &'a [SwingPoint],
    lows: &'a [SwingPoint],
) -> impl Iterator<Item = Channel> + 'a {
    (1..highs.len()).rev().flat_map(move |hk| {
        (1..lows.len()).rev().filter_map(move |lk| {
            let (h1, h2) = (highs[hk - 1], highs[hk]);
            let (l1, l2) = (lows[lk - 1], lows[lk]);
            (h1.index.max(l1.index) < h2.index.min(l2.index)).then_some(Channel { h1, h2, l1, l2 })
        })
    })
}
