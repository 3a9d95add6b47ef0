//! Integration tests for swing detection and chart pattern recognition.

use chartsense::patterns::{DoubleTopRecognizer, Formation};
use chartsense::prelude::*;

/// Closes interpolated linearly between `(index, close)` knots; high/low are close +- 0.2
fn path(knots: &[(usize, f64)]) -> Vec<Candle> {
    let mut closes = vec![knots[0].1];
    for w in knots.windows(2) {
        let ((i0, c0), (i1, c1)) = (w[0], w[1]);
        for i in i0 + 1..=i1 {
            closes.push(c0 + (c1 - c0) * (i - i0) as f64 / (i1 - i0) as f64);
        }
    }
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(i as i64, c, c + 0.2, c - 0.2, c, 1_000))
        .collect()
}

fn double_top() -> Vec<Candle> {
    path(&[(0, 100.0), (20, 120.0), (27, 110.0), (34, 120.0), (45, 105.0)])
}

fn head_and_shoulders() -> Vec<Candle> {
    path(&[
        (0, 100.0),
        (10, 110.0),
        (15, 102.0),
        (22, 120.0),
        (29, 102.0),
        (34, 111.0),
        (44, 95.0),
    ])
}

fn find<'a>(patterns: &'a [Pattern], id: &str) -> Option<&'a Pattern> {
    patterns.iter().find(|p| p.id.as_str() == id)
}

#[test]
fn test_swing_points_at_turns() {
    let candles = double_top();
    let swings = find_swing_points(&candles, 3);
    let highs: Vec<usize> = swings.iter().filter(|s| s.is_high).map(|s| s.index).collect();
    let lows: Vec<usize> = swings.iter().filter(|s| !s.is_high).map(|s| s.index).collect();
    assert_eq!(highs, vec![20, 34]);
    assert_eq!(lows, vec![27]);
    assert!(swings.iter().all(|s| s.strength == 3));
}

#[test]
fn test_double_top_confirmed() {
    let candles = double_top();
    let patterns = ChartPatternDetector::default().detect(&candles);
    let p = find(&patterns, "DOUBLE_TOP").expect("double top");

    assert_eq!(p.pattern_type, PatternType::Chart);
    assert_eq!(p.direction, Direction::Bearish);
    assert_eq!((p.start_index, p.end_index), (20, 34));
    // neckline 109.8, peak 120.2
    assert!((p.target_price - 99.4).abs() < 1e-9);
    assert_eq!(p.completion, 1.0);
}

#[test]
fn test_double_top_forming_before_break() {
    // last close 112 is still above the 109.8 neckline
    let candles = path(&[(0, 100.0), (20, 120.0), (27, 110.0), (34, 120.0), (40, 112.0)]);
    let patterns = ChartPatternDetector::default().detect(&candles);
    let p = find(&patterns, "DOUBLE_TOP").expect("double top");
    assert_eq!(p.completion, 0.8);
}

#[test]
fn test_head_and_shoulders() {
    let candles = head_and_shoulders();
    let patterns = ChartPatternDetector::default().detect(&candles);
    let p = find(&patterns, "HEAD_AND_SHOULDERS").expect("head and shoulders");

    assert_eq!(p.direction, Direction::Bearish);
    assert_eq!((p.start_index, p.end_index), (10, 34));
    // neckline 101.8, head 120.2
    assert!((p.target_price - 83.4).abs() < 1e-9);
    assert_eq!(p.completion, 1.0);
    assert!(find(&patterns, "DOUBLE_TOP").is_none());
}

#[test]
fn test_strict_equality_rejects_uneven_shoulders() {
    let candles = head_and_shoulders();
    let patterns = ChartPatternDetector::default()
        .with_price_eq(|a, b, _| a == b)
        .detect(&candles);
    assert!(find(&patterns, "HEAD_AND_SHOULDERS").is_none());
}

#[test]
fn test_restricted_builtin_set() {
    let candles = head_and_shoulders();
    let patterns = ChartPatternDetector::default()
        .with_builtin(vec![BuiltinRecognizer::DoubleTop(DoubleTopRecognizer)])
        .detect(&candles);
    assert!(patterns.is_empty());

    let patterns = ChartPatternDetector::default()
        .with_builtin(vec![BuiltinRecognizer::DoubleTop(DoubleTopRecognizer)])
        .detect(&double_top());
    assert_eq!(patterns.len(), 1);
}

#[test]
fn test_no_patterns_without_swings() {
    let flat: Vec<Candle> = (0..60)
        .map(|i| Candle::new(i, 100.0, 100.0, 100.0, 100.0, 0))
        .collect();
    assert!(ChartPatternDetector::default().detect(&flat).is_empty());
    assert!(ChartPatternDetector::default().detect(&[]).is_empty());
}

struct LastSwingHigh;

impl ChartRecognizer for LastSwingHigh {
    fn id(&self) -> PatternId {
        PatternId("LAST_SWING_HIGH")
    }

    fn strength(&self) -> f64 {
        0.1
    }

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
        let last = ctx.highs.last()?;
        Some(ctx.finish(
            self.id(),
            self.strength(),
            Formation {
                direction: Direction::Bearish,
                start: last.index,
                end: last.index,
                neckline: last.price,
                target: last.price,
            },
        ))
    }
}

#[test]
fn test_custom_recognizer_runs_after_builtin() {
    let patterns = ChartPatternDetector::default()
        .with_recognizer(LastSwingHigh)
        .detect(&double_top());
    let last = patterns.last().expect("patterns");
    assert_eq!(last.id.as_str(), "LAST_SWING_HIGH");
    assert_eq!(last.end_index, 34);
}

#[test]
fn test_invalid_config_rejected() {
    let config = PatternConfig {
        tolerance: 1.5,
        ..PatternConfig::default()
    };
    assert!(ChartPatternDetector::try_new(config).is_err());

    let config = PatternConfig {
        min_swing_strength: 0,
        ..PatternConfig::default()
    };
    assert!(matches!(
        ChartPatternDetector::try_new(config),
        Err(IndicatorError::InvalidPeriod { .. })
    ));
}

#[test]
fn test_candlestick_patterns_on_series() {
    let mut candles: Vec<Candle> = (0..12)
        .map(|i| {
            let o = 110.0 - i as f64;
            Candle::new(i, o, o + 0.5, o - 1.5, o - 1.0, 1_000)
        })
        .collect();
    // bullish candle engulfing the last bearish body
    candles.push(Candle::new(12, 97.8, 101.5, 97.6, 101.2, 3_000));

    let found = CandlestickDetector::default().detect(&candles);
    assert!(found.iter().all(|p| p.pattern_type == PatternType::Candlestick));
    assert!(found
        .iter()
        .any(|p| p.id.as_str() == "CDL_ENGULFING_BULLISH" && p.end_index == 12));
}

#[test]
fn test_patterns_serialize() {
    let patterns = ChartPatternDetector::default().detect(&double_top());
    let json = serde_json::to_value(&patterns).unwrap();
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert!(ids.contains(&"DOUBLE_TOP"));
}
