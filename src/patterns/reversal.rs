//! Reversal recognizers
//!
//! Head and shoulders, double and triple tops/bottoms, cup and handle, rounding bottom.
//! Each scans swing groups from the most recent backward and reports the first match.

use super::{
    helpers::{highest_between, lowest_between},
    ChartRecognizer, Formation, SwingContext,
};
use crate::{Direction, Pattern, PatternId};

// ============================================================
// HEAD AND SHOULDERS
// ============================================================

/// Three highs, the middle one highest, equal shoulders, troughs on both sides of the head.
/// Neckline is the mean of the two troughs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadAndShouldersRecognizer;

impl ChartRecognizer for HeadAndShouldersRecognizer {
    fn id(&self) -> PatternId {
        PatternId("HEAD_AND_SHOULDERS")
    }

    fn strength(&self) -> f64 {
        0.85
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let highs = &ctx.highs;
        (2..highs.len()).rev().find_map(|k| {
            let (left, head, right) = (highs[k - 2], highs[k - 1], highs[k]);
            if head.price <= left.price || head.price <= right.price {
                return None;
            }
            if !ctx.eq(left.price, right.price) {
                return None;
            }
            let t1 = lowest_between(&ctx.lows, left.index, head.index)?;
            let t2 = lowest_between(&ctx.lows, head.index, right.index)?;
            let neckline = (t1.price + t2.price) / 2.0;
            let height = head.price - neckline;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bearish,
                    start: left.index,
                    end: right.index,
                    neckline,
                    target: neckline - height,
                },
            ))
        })
    }
}

/// Mirror of [`HeadAndShouldersRecognizer`] on swing lows
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseHeadAndShouldersRecognizer;

impl ChartRecognizer for InverseHeadAndShouldersRecognizer {
    fn id(&self) -> PatternId {
        PatternId("INVERSE_HEAD_AND_SHOULDERS")
    }

    fn strength(&self) -> f64 {
        0.85
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let lows = &ctx.lows;
        (2..lows.len()).rev().find_map(|k| {
            let (left, head, right) = (lows[k - 2], lows[k - 1], lows[k]);
            if head.price >= left.price || head.price >= right.price {
                return None;
            }
            if !ctx.eq(left.price, right.price) {
                return None;
            }
            let p1 = highest_between(&ctx.highs, left.index, head.index)?;
            let p2 = highest_between(&ctx.highs, head.index, right.index)?;
            let neckline = (p1.price + p2.price) / 2.0;
            let height = neckline - head.price;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bullish,
                    start: left.index,
                    end: right.index,
                    neckline,
                    target: neckline + height,
                },
            ))
        })
    }
}

// ============================================================
// DOUBLE TOP / BOTTOM
// ============================================================

/// Two consecutive equal highs with a lower trough between them. Neckline is the trough.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleTopRecognizer;

impl ChartRecognizer for DoubleTopRecognizer {
    fn id(&self) -> PatternId {
        PatternId("DOUBLE_TOP")
    }

    fn strength(&self) -> f64 {
        0.75
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let highs = &ctx.highs;
        (1..highs.len()).rev().find_map(|k| {
            let (first, second) = (highs[k - 1], highs[k]);
            if !ctx.eq(first.price, second.price) {
                return None;
            }
            let trough = lowest_between(&ctx.lows, first.index, second.index)?;
            if trough.price >= first.price.min(second.price) {
                return None;
            }
            let neckline = trough.price;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bearish,
                    start: first.index,
                    end: second.index,
                    neckline,
                    target: neckline - (first.price - neckline),
                },
            ))
        })
    }
}

/// Two consecutive equal lows with a higher peak between them. Neckline is the peak.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleBottomRecognizer;

impl ChartRecognizer for DoubleBottomRecognizer {
    fn id(&self) -> PatternId {
        PatternId("DOUBLE_BOTTOM")
    }

    fn strength(&self) -> f64 {
        0.75
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let lows = &ctx.lows;
        (1..lows.len()).rev().find_map(|k| {
            let (first, second) = (lows[k - 1], lows[k]);
            if !ctx.eq(first.price, second.price) {
                return None;
            }
            let peak = highest_between(&ctx.highs, first.index, second.index)?;
            if peak.price <= first.price.max(second.price) {
                return None;
            }
            let neckline = peak.price;
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bullish,
                    start: first.index,
                    end: second.index,
                    neckline,
                    target: neckline + (neckline - first.price),
                },
            ))
        })
    }
}

// ============================================================
// TRIPLE TOP / BOTTOM
// ============================================================

/// Three pairwise equal highs with troughs in both gaps. Neckline is the lower trough.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripleTopRecognizer;

impl ChartRecognizer for TripleTopRecognizer {
    fn id(&self) -> PatternId {
        PatternId("TRIPLE_TOP")
    }

    fn strength(&self) -> f64 {
        0.80
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let highs = &ctx.highs;
        (2..highs.len()).rev().find_map(|k| {
            let (a, b, c) = (highs[k - 2], highs[k - 1], highs[k]);
            if !(ctx.eq(a.price, b.price) && ctx.eq(b.price, c.price) && ctx.eq(a.price, c.price)) {
                return None;
            }
            let t1 = lowest_between(&ctx.lows, a.index, b.index)?;
            let t2 = lowest_between(&ctx.lows, b.index, c.index)?;
            let neckline = t1.price.min(t2.price);
            let top = a.price.max(b.price).max(c.price);
            if neckline >= a.price.min(b.price).min(c.price) {
                return None;
            }
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bearish,
                    start: a.index,
                    end: c.index,
                    neckline,
                    target: neckline - (top - neckline),
                },
            ))
        })
    }
}

/// Three pairwise equal lows with peaks in both gaps. Neckline is the higher peak.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripleBottomRecognizer;

impl ChartRecognizer for TripleBottomRecognizer {
    fn id(&self) -> PatternId {
        PatternId("TRIPLE_BOTTOM")
    }

    fn strength(&self) -> f64 {
        0.80
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let lows = &ctx.lows;
        (2..lows.len()).rev().find_map(|k| {
            let (a, b, c) = (lows[k - 2], lows[k - 1], lows[k]);
            if !(ctx.eq(a.price, b.price) && ctx.eq(b.price, c.price) && ctx.eq(a.price, c.price)) {
                return None;
            }
            let p1 = highest_between(&ctx.highs, a.index, b.index)?;
            let p2 = highest_between(&ctx.highs, b.index, c.index)?;
            let neckline = p1.price.max(p2.price);
            let bottom = a.price.min(b.price).min(c.price);
            if neckline <= a.price.max(b.price).max(c.price) {
                return None;
            }
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bullish,
                    start: a.index,
                    end: c.index,
                    neckline,
                    target: neckline + (neckline - bottom),
                },
            ))
        })
    }
}

// ============================================================
// CUP AND HANDLE
// ============================================================

/// Two equal rims around a centred bottom, then a shallow handle low after the right rim.
/// Neckline is the mean rim.
#[derive(Debug, Clone, Copy, Default)]
pub struct CupAndHandleRecognizer;

impl ChartRecognizer for CupAndHandleRecognizer {
    fn id(&self) -> PatternId {
        PatternId("CUP_AND_HANDLE")
    }

    fn strength(&self) -> f64 {
        0.80
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let highs = &ctx.highs;
        (1..highs.len()).rev().find_map(|k| {
            let (left, right) = (highs[k - 1], highs[k]);
            if !ctx.eq(left.price, right.price) {
                return None;
            }
            let bottom = lowest_between(&ctx.lows, left.index, right.index)?;
            let rim = (left.price + right.price) / 2.0;
            let depth = rim - bottom.price;
            if depth <= 0.0 {
                return None;
            }

            // Rounded, not V-shaped at an edge: bottom in the middle half
            let width = right.index - left.index;
            if 4 * (bottom.index - left.index) < width || 4 * (right.index - bottom.index) < width {
                return None;
            }

            let handle = ctx.lows.iter().find(|l| l.index > right.index)?;
            let floor = bottom.price + depth * (1.0 - ctx.config.handle_max_retrace);
            if handle.price <= floor || handle.price >= rim {
                return None;
            }

            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bullish,
                    start: left.index,
                    end: handle.index,
                    neckline: rim,
                    target: rim + depth,
                },
            ))
        })
    }
}

// ============================================================
// ROUNDING BOTTOM
// ============================================================

/// Five consecutive swing lows falling then rising, with steps shrinking into the bottom.
/// Neckline is the highest swing high across the span.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundingBottomRecognizer;

impl ChartRecognizer for RoundingBottomRecognizer {
    fn id(&self) -> PatternId {
        PatternId("ROUNDING_BOTTOM")
    }

    fn strength(&self) -> f64 {
        0.70
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let lows = &ctx.lows;
        (4..lows.len()).rev().find_map(|k| {
            let w = &lows[k - 4..=k];
            let p: Vec<f64> = w.iter().map(|s| s.price).collect();
            if !(p[0] > p[1] && p[1] > p[2] && p[2] < p[3] && p[3] < p[4]) {
                return None;
            }
            // Descent and ascent both flatten toward the bottom
            if p[0] - p[1] <= p[1] - p[2] || p[4] - p[3] <= p[3] - p[2] {
                return None;
            }

            let (start, end) = (w[0].index, w[4].index);
            let neckline = ctx
                .highs
                .iter()
                .filter(|h| h.index >= start && h.index <= end)
                .map(|h| h.price)
                .fold(f64::NEG_INFINITY, f64::max);
            if !neckline.is_finite() {
                return None;
            }
            let height = neckline - p[2];
            Some(ctx.finish(
                self.id(),
                self.strength(),
                Formation {
                    direction: Direction::Bullish,
                    start,
                    end,
                    neckline,
                    target: neckline + height,
                },
            ))
        })
    }
}
