//! Property tests for indicator bounds and level ordering.

use chartsense::prelude::*;
use proptest::prelude::*;

/// Valid candles: positive prices, low <= open/close <= high
fn candle_series(min: usize, max: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec(
        (1.0f64..500.0, 0.0f64..20.0, 0.0f64..=1.0, 0.0f64..=1.0, 0u64..50_000),
        min..max,
    )
    .prop_map(|bars| {
        bars.into_iter()
            .enumerate()
            .map(|(i, (low, spread, open_at, close_at, volume))| {
                let high = low + spread;
                Candle::new(
                    i as i64,
                    low + spread * open_at,
                    high,
                    low,
                    low + spread * close_at,
                    volume,
                )
            })
            .collect()
    })
}

fn within(values: &[f64], from: usize, lo: f64, hi: f64) -> bool {
    values[from..]
        .iter()
        .all(|&v| v.is_finite() && v >= lo - 1e-9 && v <= hi + 1e-9)
}

proptest! {
    #[test]
    fn prop_oscillators_bounded(candles in candle_series(60, 120)) {
        let rsi = Rsi::default().calculate(&candles).unwrap();
        prop_assert!(within(&rsi, 14, 0.0, 100.0));

        let williams = WilliamsR::default().calculate(&candles).unwrap();
        prop_assert!(within(&williams, 13, -100.0, 0.0));

        let mfi = Mfi::default().calculate(&candles).unwrap();
        prop_assert!(within(&mfi, 14, 0.0, 100.0));

        let uo = UltimateOscillator::default().calculate(&candles).unwrap();
        prop_assert!(within(&uo, 28, 0.0, 100.0));

        let stoch = Stochastic::default().calculate(&candles).unwrap();
        prop_assert!(within(&stoch["percent_k"], 0, 0.0, 100.0));
        prop_assert!(within(&stoch["percent_d"], 0, 0.0, 100.0));
    }

    #[test]
    fn prop_volatility_ordered(candles in candle_series(40, 100)) {
        let atr = Atr::default().calculate(&candles).unwrap();
        prop_assert!(atr.iter().all(|&v| v >= 0.0));

        let bands = BollingerBands::default().calculate(&candles).unwrap();
        for i in 19..candles.len() {
            prop_assert!(bands["upper"][i] >= bands["middle"][i] - 1e-9);
            prop_assert!(bands["middle"][i] >= bands["lower"][i] - 1e-9);
        }

        let donchian = DonchianChannels::default().calculate(&candles).unwrap();
        for i in 19..candles.len() {
            prop_assert!(donchian["upper"][i] >= candles[i].high);
            prop_assert!(donchian["lower"][i] <= candles[i].low);
        }
    }

    #[test]
    fn prop_output_depends_only_on_past(candles in candle_series(60, 100), cut in 40usize..60) {
        let full = Rsi::default().calculate(&candles).unwrap();
        let prefix = Rsi::default().calculate(&candles[..cut]).unwrap();
        for i in 0..cut {
            prop_assert!((full[i] - prefix[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_standard_pivots_ordered(
        low in 1.0f64..1000.0,
        spread in 0.01f64..100.0,
        close_at in 0.0f64..=1.0,
    ) {
        let high = low + spread;
        let close = low + spread * close_at;
        let p = PivotLevels::calculate(PivotMethod::Standard, close, high, low, close);
        let (r2, r3, s2, s3) = (p.r2.unwrap(), p.r3.unwrap(), p.s2.unwrap(), p.s3.unwrap());
        let ladder = [s3, s2, p.s1, p.pivot, p.r1, r2, r3];
        for pair in ladder.windows(2) {
            prop_assert!(pair[0] < pair[1], "levels not strictly ordered: {:?}", ladder);
        }
    }

    #[test]
    fn prop_fibonacci_retracements_within_range(candles in candle_series(50, 80)) {
        let fib = FibonacciRetracement::default().calculate(&candles).unwrap();
        prop_assert!(fib.swing_high >= fib.swing_low);
        for level in fib.retracements() {
            prop_assert!(level.price >= fib.swing_low - 1e-9);
            prop_assert!(level.price <= fib.swing_high + 1e-9);
        }
    }

    #[test]
    fn prop_swings_are_strict_extremes(candles in candle_series(10, 80), strength in 1usize..5) {
        for s in find_swing_points(&candles, strength) {
            prop_assert!(s.index >= strength && s.index + strength < candles.len());
            for j in s.index - strength..=s.index + strength {
                if j == s.index {
                    continue;
                }
                if s.is_high {
                    prop_assert!(candles[j].high < s.price);
                } else {
                    prop_assert!(candles[j].low > s.price);
                }
            }
        }
    }

    #[test]
    fn prop_pattern_fields_in_range(candles in candle_series(30, 120)) {
        for p in ChartPatternDetector::default().detect(&candles) {
            prop_assert!(p.start_index <= p.end_index);
            prop_assert!(p.end_index < candles.len());
            prop_assert!((0.0..=1.0).contains(&p.strength));
            prop_assert!(p.completion == 0.8 || p.completion == 1.0);
        }
    }
}
