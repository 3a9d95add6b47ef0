//! Confirmed swing highs and lows

use crate::{Candle, SwingPoint};

/// Bars with `strength` neighbours on both sides whose high (low) strictly beats every
/// neighbour's. Ties are not swings. Index-ordered; on a bar that is both, the high comes first.
/// A strength of 0 is treated as 1.
pub fn find_swing_points(candles: &[Candle], strength: usize) -> Vec<SwingPoint> {
    let strength = strength.max(1);
    let mut swings = Vec::new();
    if candles.len() < 2 * strength + 1 {
        return swings;
    }

    for i in strength..candles.len() - strength {
        let window = (i - strength..=i + strength).filter(|&j| j != i);
        let (high, low) = (candles[i].high, candles[i].low);

        if window.clone().all(|j| candles[j].high < high) {
            swings.push(SwingPoint {
                index: i,
                price: high,
                is_high: true,
                strength,
            });
        }
        if window.clone().all(|j| candles[j].low > low) {
            swings.push(SwingPoint {
                index: i,
                price: low,
                is_high: false,
                strength,
            });
        }
    }
    swings
}

pub fn swing_highs(swings: &[SwingPoint]) -> Vec<SwingPoint> {
    swings.iter().filter(|s| s.is_high).copied().collect()
}

pub fn swing_lows(swings: &[SwingPoint]) -> Vec<SwingPoint> {
    swings.iter().filter(|s| !s.is_high).copied().collect()
}
