//! Momentum oscillators: RSI, Stochastic, CCI, Williams %R, ROC, Momentum, Ultimate Oscillator

use std::collections::HashMap;

use super::helpers::{closes, highest, lowest, mean, mean_abs_deviation, sma_from, typical_prices};
use super::{ensure_len, ensure_period};
use crate::{
    params::{get_period, ParamMeta, ParameterizedIndicator},
    Candle, Indicator, MultiSeries, MultiValueIndicator, Result,
};

// ============================================================
// RSI
// ============================================================

/// Relative Strength Index with Wilder smoothing
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    pub period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        "RSI"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, period + 1)?;

        let closes = closes(candles);
        let p = period as f64;
        let mut out = vec![0.0; closes.len()];

        // Seed: simple mean of the first `period` deltas
        let (sum_gain, sum_loss) = (1..=period).fold((0.0, 0.0), |(g, l), i| {
            let delta = closes[i] - closes[i - 1];
            (g + delta.max(0.0), l + (-delta).max(0.0))
        });
        let mut avg_gain = sum_gain / p;
        let mut avg_loss = sum_loss / p;
        out[period] = rsi_from_averages(avg_gain, avg_loss);

        for i in (period + 1)..closes.len() {
            let delta = closes[i] - closes[i - 1];
            avg_gain = (avg_gain * (p - 1.0) + delta.max(0.0)) / p;
            avg_loss = (avg_loss * (p - 1.0) + (-delta).max(0.0)) / p;
            out[i] = rsi_from_averages(avg_gain, avg_loss);
        }

        Ok(out)
    }
}

/// 100 when there were no losses, else `100 - 100 / (1 + RS)`
#[inline]
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
}

// ============================================================
// STOCHASTIC
// ============================================================

/// Stochastic oscillator -> `percent_k`, `percent_d`
#[derive(Debug, Clone, Copy)]
pub struct Stochastic {
    pub k_period: usize,
    pub d_period: usize,
    /// SMA applied to raw %K; `<= 1` leaves %K unsmoothed
    pub smooth: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
            smooth: 3,
        }
    }
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize, smooth: usize) -> Self {
        Self {
            k_period,
            d_period,
            smooth,
        }
    }
}

impl MultiValueIndicator for Stochastic {
    fn name(&self) -> &str {
        "Stochastic"
    }

    fn period(&self) -> usize {
        self.k_period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<MultiSeries> {
        let k = self.k_period;
        let d = self.d_period;
        ensure_period("k_period", k)?;
        ensure_period("d_period", d)?;
        let smooth = self.smooth.max(1);
        ensure_len(candles, (k + smooth + d - 2).max(k + 1))?;

        let n = candles.len();
        let mut raw_k = vec![0.0; n];
        for i in (k - 1)..n {
            let window = &candles[i + 1 - k..=i];
            let hh = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let ll = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let range = hh - ll;
            raw_k[i] = if range <= 0.0 {
                // Flat market
                50.0
            } else {
                (100.0 * (candles[i].close - ll) / range).clamp(0.0, 100.0)
            };
        }

        let percent_k = if smooth <= 1 {
            raw_k
        } else {
            sma_from(&raw_k, smooth, k - 1)
        };
        let k_start = k - 1 + smooth - 1;
        let percent_d = sma_from(&percent_k, d, k_start);

        Ok(HashMap::from([
            ("percent_k".to_string(), percent_k),
            ("percent_d".to_string(), percent_d),
        ]))
    }
}

// ============================================================
// CCI
// ============================================================

/// Commodity Channel Index. Unbounded.
#[derive(Debug, Clone, Copy)]
pub struct Cci {
    pub period: usize,
}

impl Default for Cci {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl Cci {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Cci {
    fn name(&self) -> &str {
        "CCI"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, period + 1)?;

        let tp = typical_prices(candles);
        let mut out = vec![0.0; tp.len()];
        for i in (period - 1)..tp.len() {
            let window = &tp[i + 1 - period..=i];
            let mad = mean_abs_deviation(window);
            if mad == 0.0 {
                continue;
            }
            out[i] = (tp[i] - mean(window)) / (0.015 * mad);
        }
        Ok(out)
    }
}

// ============================================================
// WILLIAMS %R
// ============================================================

/// Williams %R in [-100, 0]
#[derive(Debug, Clone, Copy)]
pub struct WilliamsR {
    pub period: usize,
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for WilliamsR {
    fn name(&self) -> &str {
        "Williams %R"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, period + 1)?;

        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let mut out = vec![0.0; candles.len()];
        for i in (period - 1)..candles.len() {
            let hh = highest(&highs[i + 1 - period..=i]);
            let ll = lowest(&lows[i + 1 - period..=i]);
            let range = hh - ll;
            out[i] = if range <= 0.0 {
                -50.0
            } else {
                // Clamp absorbs closes marginally outside the band
                (-100.0 * (hh - candles[i].close) / range).clamp(-100.0, 0.0)
            };
        }
        Ok(out)
    }
}

// ============================================================
// ROC / MOMENTUM
// ============================================================

/// Rate of change in percent vs. `period` bars back
#[derive(Debug, Clone, Copy)]
pub struct Roc {
    pub period: usize,
}

impl Default for Roc {
    fn default() -> Self {
        Self { period: 12 }
    }
}

impl Roc {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        "ROC"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, period + 1)?;

        let mut out = vec![0.0; candles.len()];
        for i in period..candles.len() {
            let reference = candles[i - period].close;
            if reference != 0.0 {
                out[i] = 100.0 * (candles[i].close - reference) / reference;
            }
        }
        Ok(out)
    }
}

/// Absolute change vs. `period` bars back
#[derive(Debug, Clone, Copy)]
pub struct Momentum {
    pub period: usize,
}

impl Default for Momentum {
    fn default() -> Self {
        Self { period: 10 }
    }
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        "Momentum"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, period + 1)?;

        let mut out = vec![0.0; candles.len()];
        for i in period..candles.len() {
            out[i] = candles[i].close - candles[i - period].close;
        }
        Ok(out)
    }
}

// ============================================================
// ULTIMATE OSCILLATOR
// ============================================================

/// Ultimate Oscillator, weights 4:2:1 over three periods
#[derive(Debug, Clone, Copy)]
pub struct UltimateOscillator {
    pub short_period: usize,
    pub mid_period: usize,
    pub long_period: usize,
}

impl Default for UltimateOscillator {
    fn default() -> Self {
        Self {
            short_period: 7,
            mid_period: 14,
            long_period: 28,
        }
    }
}

impl UltimateOscillator {
    pub fn new(short_period: usize, mid_period: usize, long_period: usize) -> Self {
        Self {
            short_period,
            mid_period,
            long_period,
        }
    }
}

impl Indicator for UltimateOscillator {
    fn name(&self) -> &str {
        "Ultimate Oscillator"
    }

    fn period(&self) -> usize {
        self.long_period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        ensure_period("short_period", self.short_period)?;
        ensure_period("mid_period", self.mid_period)?;
        ensure_period("long_period", self.long_period)?;
        let longest = self
            .short_period
            .max(self.mid_period)
            .max(self.long_period);
        ensure_len(candles, longest + 1)?;

        let n = candles.len();
        let mut buying_pressure = vec![0.0; n];
        let mut true_range = vec![0.0; n];
        for i in 1..n {
            let prev_close = candles[i - 1].close;
            let true_low = candles[i].low.min(prev_close);
            let true_high = candles[i].high.max(prev_close);
            buying_pressure[i] = candles[i].close - true_low;
            true_range[i] = true_high - true_low;
        }

        let average = |i: usize, period: usize| -> f64 {
            let window = i + 1 - period..=i;
            let tr: f64 = true_range[window.clone()].iter().sum();
            if tr <= 0.0 {
                return 0.0;
            }
            buying_pressure[window].iter().sum::<f64>() / tr
        };

        let mut out = vec![0.0; n];
        for i in longest..n {
            let a1 = average(i, self.short_period);
            let a2 = average(i, self.mid_period);
            let a3 = average(i, self.long_period);
            out[i] = (100.0 * (4.0 * a1 + 2.0 * a2 + a3) / 7.0).clamp(0.0, 100.0);
        }
        Ok(out)
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

const RSI_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    14.0,
    (2.0, 50.0, 1.0),
    "Wilder smoothing period",
)];

const STOCHASTIC_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("k_period", 14.0, (5.0, 30.0, 1.0), "Raw %K lookback"),
    ParamMeta::period("d_period", 3.0, (1.0, 10.0, 1.0), "%D smoothing period"),
    ParamMeta::period("smooth", 3.0, (1.0, 10.0, 1.0), "%K smoothing period"),
];

const CCI_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    20.0,
    (5.0, 50.0, 1.0),
    "Typical price window",
)];

const WILLIAMS_R_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    14.0,
    (5.0, 50.0, 1.0),
    "High/low lookback",
)];

const ROC_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    12.0,
    (1.0, 50.0, 1.0),
    "Bars back for the reference close",
)];

const MOMENTUM_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    10.0,
    (1.0, 50.0, 1.0),
    "Bars back for the reference close",
)];

const ULTIMATE_OSCILLATOR_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("short_period", 7.0, (3.0, 14.0, 1.0), "Short average"),
    ParamMeta::period("mid_period", 14.0, (7.0, 28.0, 1.0), "Medium average"),
    ParamMeta::period("long_period", 28.0, (14.0, 56.0, 1.0), "Long average"),
];

impl ParameterizedIndicator for Rsi {
    fn param_meta() -> &'static [ParamMeta] {
        RSI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 14)?.get()))
    }

    fn kind() -> &'static str {
        "rsi"
    }
}

impl ParameterizedIndicator for Stochastic {
    fn param_meta() -> &'static [ParamMeta] {
        STOCHASTIC_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(
            get_period(params, "k_period", 14)?.get(),
            get_period(params, "d_period", 3)?.get(),
            get_period(params, "smooth", 3)?.get(),
        ))
    }

    fn kind() -> &'static str {
        "stochastic"
    }
}

impl ParameterizedIndicator for Cci {
    fn param_meta() -> &'static [ParamMeta] {
        CCI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 20)?.get()))
    }

    fn kind() -> &'static str {
        "cci"
    }
}

impl ParameterizedIndicator for WilliamsR {
    fn param_meta() -> &'static [ParamMeta] {
        WILLIAMS_R_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 14)?.get()))
    }

    fn kind() -> &'static str {
        "williams_r"
    }
}

impl ParameterizedIndicator for Roc {
    fn param_meta() -> &'static [ParamMeta] {
        ROC_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 12)?.get()))
    }

    fn kind() -> &'static str {
        "roc"
    }
}

impl ParameterizedIndicator for Momentum {
    fn param_meta() -> &'static [ParamMeta] {
        MOMENTUM_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 10)?.get()))
    }

    fn kind() -> &'static str {
        "momentum"
    }
}

impl ParameterizedIndicator for UltimateOscillator {
    fn param_meta() -> &'static [ParamMeta] {
        ULTIMATE_OSCILLATOR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(
            get_period(params, "short_period", 7)?.get(),
            get_period(params, "mid_period", 14)?.get(),
            get_period(params, "long_period", 28)?.get(),
        ))
    }

    fn kind() -> &'static str {
        "ultimate_oscillator"
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndicatorError;

    fn rising(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(i as i64, c - 0.5, c + 0.5, c - 1.0, c, 1_000)
            })
            .collect()
    }

    fn falling(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 200.0 - i as f64;
                Candle::new(i as i64, c + 0.5, c + 1.0, c - 0.5, c, 1_000)
            })
            .collect()
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let out = Rsi::new(14).calculate(&rising(20)).unwrap();
        assert_eq!(out.len(), 20);
        assert_eq!(out[13], 0.0);
        assert!((out[19] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let out = Rsi::new(14).calculate(&falling(30)).unwrap();
        assert!(out[14..].iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert_eq!(
            Rsi::new(14).calculate(&rising(14)),
            Err(IndicatorError::InsufficientData { need: 15, got: 14 })
        );
    }

    #[test]
    fn test_rsi_zero_period() {
        assert!(matches!(
            Rsi::new(0).calculate(&rising(20)),
            Err(IndicatorError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn test_stochastic_flat_market_is_50() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| Candle::new(i, 100.0, 100.0, 100.0, 100.0, 10))
            .collect();
        let out = Stochastic::default().calculate(&candles).unwrap();
        assert_eq!(out["percent_k"][19], 50.0);
        assert_eq!(out["percent_d"][19], 50.0);
    }

    #[test]
    fn test_stochastic_unsmoothed_k() {
        let candles = rising(10);
        let out = Stochastic::new(5, 3, 1).calculate(&candles).unwrap();
        // close = high - 0.5 of the last bar; window low = low of bar i-4
        let i = 9;
        let hh = candles[i].high;
        let ll = candles[i - 4].low;
        let expected = 100.0 * (candles[i].close - ll) / (hh - ll);
        assert!((out["percent_k"][i] - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stochastic_zero_d_period() {
        assert!(matches!(
            Stochastic::new(14, 0, 3).calculate(&rising(40)),
            Err(IndicatorError::InvalidPeriod {
                name: "d_period",
                ..
            })
        ));
    }

    #[test]
    fn test_cci_flat_is_zero() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| Candle::new(i, 50.0, 51.0, 49.0, 50.0, 10))
            .collect();
        let out = Cci::default().calculate(&candles).unwrap();
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_williams_r_close_at_high_is_zero() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(i, c - 1.0, c, c - 2.0, c, 10)
            })
            .collect();
        let out = WilliamsR::new(14).calculate(&candles).unwrap();
        assert_eq!(out[19], 0.0);
    }

    #[test]
    fn test_roc_and_momentum() {
        let candles = rising(15);
        let roc = Roc::new(10).calculate(&candles).unwrap();
        let mom = Momentum::new(10).calculate(&candles).unwrap();
        assert!((roc[10] - 10.0).abs() < 1e-9);
        assert!((mom[14] - 10.0).abs() < 1e-9);
        assert_eq!(roc[9], 0.0);
    }

    #[test]
    fn test_ultimate_oscillator_close_at_true_high_is_100() {
        let candles: Vec<Candle> = (0..40)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(i, c - 1.0, c, c - 1.5, c, 10)
            })
            .collect();
        let out = UltimateOscillator::default().calculate(&candles).unwrap();
        assert!((out[39] - 100.0).abs() < 1e-9);
        assert_eq!(out[27], 0.0);
    }

    #[test]
    fn test_with_params() {
        let params = HashMap::from([("period", 21.0)]);
        assert_eq!(Rsi::with_params(&params).unwrap().period, 21);
        let params = HashMap::from([("k_period", 0.0)]);
        assert!(Stochastic::with_params(&params).is_err());
    }
}
