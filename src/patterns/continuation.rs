//! Continuation and bilateral recognizers
//!
//! Triangles, wedges, flag, pennant and rectangle, all built on [`Channel`]s: two consecutive
//! swing highs against two consecutive swing lows.

use super::{helpers::Channel, ChartRecognizer, Formation, SwingContext};
use crate::{Direction, Pattern, PatternId};

/// Target for a formation whose direction comes from the prior trend.
/// Bullish breaks `upper`, Bearish breaks `lower`, Neutral sits at the midpoint.
fn bilateral(direction: Direction, upper: f64, lower: f64, height: f64) -> (f64, f64) {
    match direction {
        Direction::Bullish => (upper, upper + height),
        Direction::Bearish => (lower, lower - height),
        Direction::Neutral => {
            let mid = (upper + lower) / 2.0;
            (mid, mid)
        }
    }
}

// ============================================================
// TRIANGLES
// ============================================================

/// Flat resistance over rising lows
#[derive(Debug, Clone, Copy, Default)]
pub struct AscendingTriangleRecognizer;

impl ChartRecognizer for AscendingTriangleRecognizer {
    fn id(&self) -> PatternId {
        PatternId("ASCENDING_TRIANGLE")
    }

    fn strength(&self) -> f64 {
        0.70
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            let flat_top = ctx.eq(c.h1.price, c.h2.price);
            let rising = c.l2.price > c.l1.price && !ctx.eq(c.l1.price, c.l2.price);
            if !(flat_top && rising) {
                return None;
            }
            let resistance = (c.h1.price + c.h2.price) / 2.0;
            let height = resistance - c.l1.price;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bullish,
                    start: c.start(),
                    end: c.end(),
                    neckline: resistance,
                    target: resistance + height,
                },
            ))
        })
    }
}

/// Flat support under falling highs
#[derive(Debug, Clone, Copy, Default)]
pub struct DescendingTriangleRecognizer;

impl ChartRecognizer for DescendingTriangleRecognizer {
    fn id(&self) -> PatternId {
        PatternId("DESCENDING_TRIANGLE")
    }

    fn strength(&self) -> f64 {
        0.70
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            let flat_bottom = ctx.eq(c.l1.price, c.l2.price);
            let falling = c.h2.price < c.h1.price && !ctx.eq(c.h1.price, c.h2.price);
            if !(flat_bottom && falling) {
                return None;
            }
            let support = (c.l1.price + c.l2.price) / 2.0;
            let height = c.h1.price - support;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bearish,
                    start: c.start(),
                    end: c.end(),
                    neckline: support,
                    target: support - height,
                },
            ))
        })
    }
}

/// Lower highs and higher lows. Direction follows the prior trend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymmetricalTriangleRecognizer;

impl ChartRecognizer for SymmetricalTriangleRecognizer {
    fn id(&self) -> PatternId {
        PatternId("SYMMETRICAL_TRIANGLE")
    }

    fn strength(&self) -> f64 {
        0.65
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            let lower_highs = c.h2.price < c.h1.price && !ctx.eq(c.h1.price, c.h2.price);
            let higher_lows = c.l2.price > c.l1.price && !ctx.eq(c.l1.price, c.l2.price);
            if !(lower_highs && higher_lows) {
                return None;
            }
            let direction = ctx.prior_trend(c.start());
            let height = c.h1.price - c.l1.price;
            let (neckline, target) = bilateral(direction, c.h2.price, c.l2.price, height);
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction,
                    start: c.start(),
                    end: c.end(),
                    neckline,
                    target,
                },
            ))
        })
    }
}

// ============================================================
// WEDGES
// ============================================================

/// Both lines rising, support steeper than resistance
#[derive(Debug, Clone, Copy, Default)]
pub struct RisingWedgeRecognizer;

impl ChartRecognizer for RisingWedgeRecognizer {
    fn id(&self) -> PatternId {
        PatternId("RISING_WEDGE")
    }

    fn strength(&self) -> f64 {
        0.70
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            let (sh, sl) = (c.high_slope(), c.low_slope());
            if !(sh > 0.0 && sl > 0.0 && sl > sh) {
                return None;
            }
            let height = c.h1.price - c.l1.price;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bearish,
                    start: c.start(),
                    end: c.end(),
                    neckline: c.l2.price,
                    target: c.l2.price - height,
                },
            ))
        })
    }
}

/// Both lines falling, resistance steeper than support
#[derive(Debug, Clone, Copy, Default)]
pub struct FallingWedgeRecognizer;

impl ChartRecognizer for FallingWedgeRecognizer {
    fn id(&self) -> PatternId {
        PatternId("FALLING_WEDGE")
    }

    fn strength(&self) -> f64 {
        0.70
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            let (sh, sl) = (c.high_slope(), c.low_slope());
            if !(sh < 0.0 && sl < 0.0 && sh < sl) {
                return None;
            }
            let height = c.h1.price - c.l1.price;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bullish,
                    start: c.start(),
                    end: c.end(),
                    neckline: c.h2.price,
                    target: c.h2.price + height,
                },
            ))
        })
    }
}

// ============================================================
// FLAG / PENNANT
// ============================================================

/// Sharp move over the `pole_bars` bars ending at `start`
#[derive(Debug, Clone, Copy)]
struct Pole {
    direction: Direction,
    height: f64,
    start: usize,
}

fn pole(ctx: &SwingContext<'_>, start: usize) -> Option<Pole> {
    let bars = ctx.config.pole_bars;
    if start < bars || start >= ctx.candles.len() {
        return None;
    }
    let from = ctx.candles[start - bars].close;
    let to = ctx.candles[start].close;
    if from <= 0.0 {
        return None;
    }
    let change = (to - from) / from;
    if change.abs() < ctx.config.pole_min_move {
        return None;
    }
    Some(Pole {
        direction: if change > 0.0 {
            Direction::Bullish
        } else {
            Direction::Bearish
        },
        height: (to - from).abs(),
        start: start - bars,
    })
}

/// Breakout line and measured target for a pole-based formation
fn pole_formation(pole: Pole, c: &Channel) -> Formation {
    let (neckline, target) = match pole.direction {
        Direction::Bearish => (c.l2.price, c.l2.price - pole.height),
        _ => (c.h2.price, c.h2.price + pole.height),
    };
    Formation {
        direction: pole.direction,
        start: pole.start,
        end: c.end(),
        neckline,
        target,
    }
}

/// Pole followed by a parallel channel drifting against it (or flat)
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagRecognizer;

impl ChartRecognizer for FlagRecognizer {
    fn id(&self) -> PatternId {
        PatternId("FLAG")
    }

    fn strength(&self) -> f64 {
        0.65
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            let pole = pole(ctx, c.start())?;
            let (sh, sl) = (c.high_slope(), c.low_slope());
            let tolerance = ctx.config.slope_tolerance * ctx.candles[c.start()].close;
            if (sh - sl).abs() > tolerance {
                return None;
            }
            let against_pole = match pole.direction {
                Direction::Bullish => sh <= tolerance && sl <= tolerance,
                _ => sh >= -tolerance && sl >= -tolerance,
            };
            if !against_pole {
                return None;
            }
            Some(ctx.finish(self.id(), self.strength(), pole_formation(pole, &c)))
        })
    }
}

/// Pole followed by converging lines
#[derive(Debug, Clone, Copy, Default)]
pub struct PennantRecognizer;

impl ChartRecognizer for PennantRecognizer {
    fn id(&self) -> PatternId {
        PatternId("PENNANT")
    }

    fn strength(&self) -> f64 {
        0.65
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            let pole = pole(ctx, c.start())?;
            if !(c.high_slope() < 0.0 && c.low_slope() > 0.0) {
                return None;
            }
            Some(ctx.finish(self.id(), self.strength(), pole_formation(pole, &c)))
        })
    }
}

// ============================================================
// RECTANGLE
// ============================================================

/// Equal highs over equal lows, distinct levels. Direction follows the prior trend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectangleRecognizer;

impl ChartRecognizer for RectangleRecognizer {
    fn id(&self) -> PatternId {
        PatternId("RECTANGLE")
    }

    fn strength(&self) -> f64 {
        0.65
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        ctx.channels().find_map(|c| {
            if !(ctx.eq(c.h1.price, c.h2.price) && ctx.eq(c.l1.price, c.l2.price)) {
                return None;
            }
            let resistance = (c.h1.price + c.h2.price) / 2.0;
            let support = (c.l1.price + c.l2.price) / 2.0;
            if resistance <= support || ctx.eq(resistance, support) {
                return None;
            }
            let direction = ctx.prior_trend(c.start());
            let (neckline, target) =
                bilateral(direction, resistance, support, resistance - support);
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction,
                    start: c.start(),
                    end: c.end(),
                    neckline,
                    target,
                },
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        patterns::{prices_equal, PatternConfig},
        Candle, SwingPoint,
    };

    fn high(index: usize, price: f64) -> SwingPoint {
        SwingPoint {
            index,
            price,
            is_high: true,
            strength: 3,
        }
    }

    fn low(index: usize, price: f64) -> SwingPoint {
        SwingPoint {
            index,
            price,
            is_high: false,
            strength: 3,
        }
    }

    fn from_closes(closes: impl IntoIterator<Item = f64>) -> Vec<Candle> {
        closes
            .into_iter()
            .enumerate()
            .map(|(i, c)| Candle::new(i as i64, c, c + 1.0, c - 1.0, c, 0))
            .collect()
    }

    fn flat(n: usize, close: f64) -> Vec<Candle> {
        from_closes(std::iter::repeat(close).take(n))
    }

    fn run<R: ChartRecognizer>(r: R, candles: &[Candle], swings: &[SwingPoint]) -> Option<Pattern> {
        let config = PatternConfig::default();
        let ctx = SwingContext::new(candles, swings, &config, prices_equal);
        r.recognize(&ctx)
    }

    #[test]
    fn test_ascending_triangle() {
        let swings = [high(5, 110.0), low(7, 100.0), high(10, 110.5), low(12, 104.0)];
        let p = run(AscendingTriangleRecognizer, &flat(15, 105.0), &swings).unwrap();
        assert_eq!(p.direction, Direction::Bullish);
        assert_eq!((p.start_index, p.end_index), (5, 12));
        assert!((p.target_price - 120.5).abs() < 1e-9);
    }

    #[test]
    fn test_descending_triangle() {
        let swings = [high(5, 110.0), low(7, 100.0), high(10, 105.0), low(12, 100.5)];
        let p = run(DescendingTriangleRecognizer, &flat(15, 102.0), &swings).unwrap();
        assert_eq!(p.direction, Direction::Bearish);
        assert!((p.target_price - 90.5).abs() < 1e-9);
        assert!(run(AscendingTriangleRecognizer, &flat(15, 102.0), &swings).is_none());
    }

    #[test]
    fn test_symmetrical_triangle_flat_trend_is_neutral() {
        let swings = [high(5, 110.0), low(7, 100.0), high(10, 106.0), low(12, 104.0)];
        let p = run(SymmetricalTriangleRecognizer, &flat(15, 105.0), &swings).unwrap();
        assert_eq!(p.direction, Direction::Neutral);
        assert!((p.target_price - 105.0).abs() < 1e-9);
        assert_eq!(p.completion, 0.8);
    }

    #[test]
    fn test_symmetrical_triangle_follows_uptrend() {
        let swings = [high(5, 110.0), low(7, 100.0), high(10, 106.0), low(12, 104.0)];
        let candles = from_closes((0..15).map(|i| 100.0 + i as f64 * 0.5));
        let p = run(SymmetricalTriangleRecognizer, &candles, &swings).unwrap();
        assert_eq!(p.direction, Direction::Bullish);
        assert!((p.target_price - 116.0).abs() < 1e-9);
    }

    #[test]
    fn test_wedges() {
        let rising = [high(5, 110.0), low(7, 100.0), high(15, 112.0), low(17, 106.0)];
        let p = run(RisingWedgeRecognizer, &flat(20, 108.0), &rising).unwrap();
        assert_eq!(p.direction, Direction::Bearish);
        assert!((p.target_price - 96.0).abs() < 1e-9);
        assert!(run(FallingWedgeRecognizer, &flat(20, 108.0), &rising).is_none());

        let falling = [high(5, 110.0), low(7, 100.0), high(15, 104.0), low(17, 98.0)];
        let p = run(FallingWedgeRecognizer, &flat(20, 101.0), &falling).unwrap();
        assert_eq!(p.direction, Direction::Bullish);
        assert!((p.target_price - 114.0).abs() < 1e-9);
    }

    fn pole_then(rest: usize, close: f64) -> Vec<Candle> {
        from_closes((0..=11).map(|i| 100.0 + i as f64).chain(std::iter::repeat(close).take(rest)))
    }

    #[test]
    fn test_bull_flag() {
        let candles = pole_then(10, 109.0);
        let swings = [high(11, 111.0), low(13, 108.0), high(15, 110.8), low(17, 107.8)];
        let p = run(FlagRecognizer, &candles, &swings).unwrap();
        assert_eq!(p.direction, Direction::Bullish);
        assert_eq!(p.start_index, 1);
        assert!((p.target_price - 120.8).abs() < 1e-9);
        assert_eq!(p.completion, 0.8);
    }

    #[test]
    fn test_flag_needs_pole() {
        let swings = [high(11, 111.0), low(13, 108.0), high(15, 110.8), low(17, 107.8)];
        assert!(run(FlagRecognizer, &flat(22, 109.0), &swings).is_none());
    }

    #[test]
    fn test_pennant() {
        let candles = pole_then(10, 109.0);
        let swings = [high(11, 112.0), low(13, 106.0), high(15, 110.0), low(17, 108.0)];
        let p = run(PennantRecognizer, &candles, &swings).unwrap();
        assert_eq!(p.direction, Direction::Bullish);
        assert!((p.target_price - 120.0).abs() < 1e-9);
        // converging lines are not parallel
        assert!(run(FlagRecognizer, &candles, &swings).is_none());
    }

    #[test]
    fn test_rectangle() {
        let swings = [high(5, 110.0), low(7, 100.0), high(10, 110.5), low(12, 100.5)];
        let p = run(RectangleRecognizer, &flat(15, 105.0), &swings).unwrap();
        assert_eq!(p.direction, Direction::Neutral);
        assert!((p.target_price - 105.25).abs() < 1e-9);

        let falling = from_closes((0..15).map(|i| 120.0 - i as f64));
        let p = run(RectangleRecognizer, &falling, &swings).unwrap();
        assert_eq!(p.direction, Direction::Bearish);
        assert!((p.target_price - 90.25).abs() < 1e-9);
        // last close 106 is above support
        assert_eq!(p.completion, 0.8);
    }
}
