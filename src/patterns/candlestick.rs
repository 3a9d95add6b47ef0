//! Candlestick patterns
//!
//! TA-Lib style thresholds: "short" and "long" bodies are measured against the trailing
//! average body, shadow and doji thresholds against the trailing average range.

use crate::{Candle, Direction, OHLCVExt, Pattern, PatternId, PatternType};

/// Doji: body <= avg_range * DOJI_FACTOR
pub const DOJI_FACTOR: f64 = 0.1;
/// Very short shadow: shadow < avg_range * SHADOW_VERYSHORT_FACTOR
pub const SHADOW_VERYSHORT_FACTOR: f64 = 0.1;
/// Near: within avg_range * NEAR_FACTOR
pub const NEAR_FACTOR: f64 = 0.2;
/// Star third bar must close this share of the first body past the first close
pub const STAR_PENETRATION: f64 = 0.3;

// Ratio fallbacks when the trailing average is zero
const DOJI_RATIO: f64 = 0.1;
const BODY_SHORT_RATIO: f64 = 0.3;
const BODY_LONG_RATIO: f64 = 0.7;
const SHADOW_SHORT_RATIO: f64 = 0.1;

/// Mean body of the `period` bars before `at`; bar 0 uses its own body
fn trailing_avg_body(candles: &[Candle], at: usize, period: usize) -> f64 {
    if at == 0 {
        return candles[0].body();
    }
    let window = &candles[at.saturating_sub(period)..at];
    window.iter().map(|c| c.body()).sum::<f64>() / window.len() as f64
}

/// Mean range of the `period` bars before `at`; bar 0 uses its own range
fn trailing_avg_range(candles: &[Candle], at: usize, period: usize) -> f64 {
    if at == 0 {
        return candles[0].range();
    }
    let window = &candles[at.saturating_sub(period)..at];
    window.iter().map(|c| c.range()).sum::<f64>() / window.len() as f64
}

#[inline]
fn is_doji(body: f64, avg_range: f64, range: f64) -> bool {
    if body <= 0.0 {
        return true;
    }
    if avg_range > 0.0 {
        body <= avg_range * DOJI_FACTOR
    } else {
        range > 0.0 && body / range <= DOJI_RATIO
    }
}

#[inline]
fn is_body_short(body: f64, avg_body: f64, range: f64) -> bool {
    if avg_body > 0.0 {
        body < avg_body
    } else {
        range > 0.0 && body / range <= BODY_SHORT_RATIO
    }
}

#[inline]
fn is_body_long(body: f64, avg_body: f64, range: f64) -> bool {
    if avg_body > 0.0 {
        body > avg_body
    } else {
        range > 0.0 && body / range >= BODY_LONG_RATIO
    }
}

#[inline]
fn is_shadow_very_short(shadow: f64, avg_range: f64, range: f64) -> bool {
    if avg_range > 0.0 {
        shadow < avg_range * SHADOW_VERYSHORT_FACTOR
    } else {
        range > 0.0 && shadow / range <= SHADOW_SHORT_RATIO
    }
}

/// Matched bars before conversion into a [`Pattern`]
#[derive(Debug, Clone, Copy)]
struct CandleMatch {
    id: &'static str,
    direction: Direction,
    strength: f64,
    start: usize,
}

/// Scans every bar for the supported candlestick patterns
#[derive(Debug, Clone, Copy)]
pub struct CandlestickDetector {
    /// Bars in the trailing body/range averages
    pub lookback: usize,
}

impl Default for CandlestickDetector {
    fn default() -> Self {
        Self { lookback: 10 }
    }
}

impl CandlestickDetector {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
        }
    }

    /// All matches, ordered by ending bar
    pub fn detect(&self, candles: &[Candle]) -> Vec<Pattern> {
        let rules: [fn(&Self, &[Candle], usize) -> Option<CandleMatch>; 8] = [
            Self::doji,
            Self::hammer,
            Self::shooting_star,
            Self::engulfing,
            Self::morning_star,
            Self::evening_star,
            Self::three_white_soldiers,
            Self::three_black_crows,
        ];

        let mut patterns = Vec::new();
        for i in 0..candles.len() {
            for rule in rules {
                if let Some(m) = rule(self, candles, i) {
                    patterns.push(Pattern {
                        id: PatternId(m.id),
                        pattern_type: PatternType::Candlestick,
                        direction: m.direction,
                        start_index: m.start,
                        end_index: i,
                        strength: m.strength,
                        target_price: candles[i].close,
                        completion: 1.0,
                    });
                }
            }
        }
        patterns
    }

    // ============================================================
    // SINGLE BAR
    // ============================================================

    fn doji(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        let bar = &candles[i];
        let (body, range) = (bar.body(), bar.range());
        let avg_range = trailing_avg_range(candles, i, self.lookback);
        if !is_doji(body, avg_range, range) {
            return None;
        }
        let tightness = if range > 0.0 {
            1.0 - (body / range / DOJI_RATIO).min(1.0)
        } else {
            0.5
        };
        Some(CandleMatch {
            id: "CDL_DOJI",
            direction: Direction::Neutral,
            strength: 0.5 + tightness * 0.5,
            start: i,
        })
    }

    /// Short body, long lower shadow, almost no upper shadow, at or below the prior low
    fn hammer(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        if i < 1 {
            return None;
        }
        let (bar, prev) = (&candles[i], &candles[i - 1]);
        let (body, range) = (bar.body(), bar.range());

        if !is_body_short(body, trailing_avg_body(candles, i, self.lookback), range) {
            return None;
        }
        if bar.lower_shadow() <= body {
            return None;
        }
        let avg_range = trailing_avg_range(candles, i, self.lookback);
        if !is_shadow_very_short(bar.upper_shadow(), avg_range, range) {
            return None;
        }
        let near = trailing_avg_range(candles, i - 1, 5) * NEAR_FACTOR;
        if bar.open.min(bar.close) > prev.low + near {
            return None;
        }
        Some(CandleMatch {
            id: "CDL_HAMMER",
            direction: Direction::Bullish,
            strength: 0.6,
            start: i,
        })
    }

    /// Short body gapped above the prior body, long upper shadow, almost no lower shadow
    fn shooting_star(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        if i < 1 {
            return None;
        }
        let (bar, prev) = (&candles[i], &candles[i - 1]);
        if bar.open.min(bar.close) <= prev.open.max(prev.close) {
            return None;
        }
        let (body, range) = (bar.body(), bar.range());
        if !is_body_short(body, trailing_avg_body(candles, i, self.lookback), range) {
            return None;
        }
        if bar.upper_shadow() <= body {
            return None;
        }
        let avg_range = trailing_avg_range(candles, i, self.lookback);
        if !is_shadow_very_short(bar.lower_shadow(), avg_range, range) {
            return None;
        }
        Some(CandleMatch {
            id: "CDL_SHOOTINGSTAR",
            direction: Direction::Bearish,
            strength: 0.7,
            start: i,
        })
    }

    // ============================================================
    // TWO BAR
    // ============================================================

    /// Opposite-colour body engulfing the previous one; 0.7 when both ends are strictly outside
    fn engulfing(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        if i < 1 {
            return None;
        }
        let (prev, curr) = (&candles[i - 1], &candles[i]);
        let curr_white = curr.close >= curr.open;
        let prev_white = prev.close >= prev.open;
        let strict = curr.open != prev.close && curr.close != prev.open;
        let strength = if strict { 0.7 } else { 0.6 };

        if curr_white && !prev_white {
            let case_a = curr.close >= prev.open && curr.open < prev.close;
            let case_b = curr.close > prev.open && curr.open <= prev.close;
            if case_a || case_b {
                return Some(CandleMatch {
                    id: "CDL_ENGULFING_BULLISH",
                    direction: Direction::Bullish,
                    strength,
                    start: i - 1,
                });
            }
        }
        if !curr_white && prev_white {
            let case_a = curr.open >= prev.close && curr.close < prev.open;
            let case_b = curr.open > prev.close && curr.close <= prev.open;
            if case_a || case_b {
                return Some(CandleMatch {
                    id: "CDL_ENGULFING_BEARISH",
                    direction: Direction::Bearish,
                    strength,
                    start: i - 1,
                });
            }
        }
        None
    }

    // ============================================================
    // THREE BAR
    // ============================================================

    /// Long black, short body gapped down, white closing well into the first body
    fn morning_star(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        if i < 2 {
            return None;
        }
        let (first, second, third) = (&candles[i - 2], &candles[i - 1], &candles[i]);
        if first.close >= first.open || third.close < third.open {
            return None;
        }
        let first_body = first.body();
        let lb = self.lookback;
        if !is_body_long(first_body, trailing_avg_body(candles, i - 2, lb), first.range()) {
            return None;
        }
        if !is_body_short(second.body(), trailing_avg_body(candles, i - 1, lb), second.range()) {
            return None;
        }
        if second.open.max(second.close) >= first.open.min(first.close) {
            return None;
        }
        if third.body() <= trailing_avg_body(candles, i, lb) {
            return None;
        }
        if third.close <= first.close + first_body * STAR_PENETRATION {
            return None;
        }
        Some(CandleMatch {
            id: "CDL_MORNINGSTAR",
            direction: Direction::Bullish,
            strength: 0.75,
            start: i - 2,
        })
    }

    /// Long white, short body gapped up, black closing well into the first body
    fn evening_star(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        if i < 2 {
            return None;
        }
        let (first, second, third) = (&candles[i - 2], &candles[i - 1], &candles[i]);
        if first.close < first.open || third.close >= third.open {
            return None;
        }
        let first_body = first.body();
        let lb = self.lookback;
        if !is_body_long(first_body, trailing_avg_body(candles, i - 2, lb), first.range()) {
            return None;
        }
        if !is_body_short(second.body(), trailing_avg_body(candles, i - 1, lb), second.range()) {
            return None;
        }
        if second.open.min(second.close) <= first.open.max(first.close) {
            return None;
        }
        if third.body() <= trailing_avg_body(candles, i, lb) {
            return None;
        }
        if third.close >= first.close - first_body * STAR_PENETRATION {
            return None;
        }
        Some(CandleMatch {
            id: "CDL_EVENINGSTAR",
            direction: Direction::Bearish,
            strength: 0.75,
            start: i - 2,
        })
    }

    /// Three rising white bars, each opening inside the prior body and closing near its high
    fn three_white_soldiers(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        if i < 2 {
            return None;
        }
        let bars = &candles[i - 2..=i];
        if !bars.iter().all(|b| b.is_bullish()) {
            return None;
        }
        for (k, pair) in bars.windows(2).enumerate() {
            let (prev, curr) = (&pair[0], &pair[1]);
            let near = trailing_avg_range(candles, i - 2 + k, 5) * NEAR_FACTOR;
            if curr.close <= prev.close || curr.open <= prev.open || curr.open > prev.close + near {
                return None;
            }
        }
        for (k, bar) in bars.iter().enumerate() {
            let avg_range = trailing_avg_range(candles, i - 2 + k, self.lookback);
            if !is_shadow_very_short(bar.high - bar.close, avg_range, bar.range()) {
                return None;
            }
        }
        Some(CandleMatch {
            id: "CDL_3WHITESOLDIERS",
            direction: Direction::Bullish,
            strength: 0.8,
            start: i - 2,
        })
    }

    /// Three falling black bars, each opening inside the prior body and closing near its low
    fn three_black_crows(&self, candles: &[Candle], i: usize) -> Option<CandleMatch> {
        if i < 2 {
            return None;
        }
        let bars = &candles[i - 2..=i];
        if !bars.iter().all(|b| b.is_bearish()) {
            return None;
        }
        for (k, pair) in bars.windows(2).enumerate() {
            let (prev, curr) = (&pair[0], &pair[1]);
            let near = trailing_avg_range(candles, i - 2 + k, 5) * NEAR_FACTOR;
            if curr.close >= prev.close || curr.open >= prev.open || curr.open < prev.close - near {
                return None;
            }
        }
        for (k, bar) in bars.iter().enumerate() {
            let avg_range = trailing_avg_range(candles, i - 2 + k, self.lookback);
            if !is_shadow_very_short(bar.close - bar.low, avg_range, bar.range()) {
                return None;
            }
        }
        Some(CandleMatch {
            id: "CDL_3BLACKCROWS",
            direction: Direction::Bearish,
            strength: 0.8,
            start: i - 2,
        })
    }
}
