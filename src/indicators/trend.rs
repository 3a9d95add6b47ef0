//! Trend indicators: SMA, EMA, MACD, ADX

use std::collections::HashMap;

use super::helpers::{closes, ema, ema_from, sma, true_ranges, wilder_smooth};
use super::{ensure_len, ensure_period};
use crate::{
    params::{get_period, ParamMeta, ParameterizedIndicator},
    Candle, Indicator, IndicatorError, MultiSeries, MultiValueIndicator, Result,
};

// ============================================================
// MOVING AVERAGES
// ============================================================

/// Simple moving average of closes
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    pub period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "SMA"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        ensure_period("period", self.period)?;
        ensure_len(candles, self.period + 1)?;
        Ok(sma(&closes(candles), self.period))
    }
}

/// Exponential moving average of closes, seeded with the SMA
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    pub period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        "EMA"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        ensure_period("period", self.period)?;
        ensure_len(candles, self.period + 1)?;
        Ok(ema(&closes(candles), self.period))
    }
}

// ============================================================
// MACD
// ============================================================

/// MACD -> `macd`, `signal`, `histogram`
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }
}

impl MultiValueIndicator for Macd {
    fn name(&self) -> &str {
        "MACD"
    }

    fn period(&self) -> usize {
        self.slow_period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<MultiSeries> {
        ensure_period("fast_period", self.fast_period)?;
        ensure_period("slow_period", self.slow_period)?;
        ensure_period("signal_period", self.signal_period)?;
        if self.fast_period >= self.slow_period {
            return Err(IndicatorError::InvalidValue(
                "MACD fast period must be shorter than slow period",
            ));
        }
        let slow = self.slow_period;
        ensure_len(candles, (slow + self.signal_period - 1).max(slow + 1))?;

        let closes = closes(candles);
        let fast_ema = ema(&closes, self.fast_period);
        let slow_ema = ema(&closes, slow);

        let n = closes.len();
        let mut macd = vec![0.0; n];
        for i in (slow - 1)..n {
            macd[i] = fast_ema[i] - slow_ema[i];
        }
        let signal = ema_from(&macd, self.signal_period, slow - 1);
        let mut histogram = vec![0.0; n];
        for i in (slow + self.signal_period - 2)..n {
            histogram[i] = macd[i] - signal[i];
        }

        Ok(HashMap::from([
            ("macd".to_string(), macd),
            ("signal".to_string(), signal),
            ("histogram".to_string(), histogram),
        ]))
    }
}

// ============================================================
// ADX
// ============================================================

/// Average Directional Index -> `adx`, `plus_di`, `minus_di`.
/// DI lines start at `period`, ADX at `2 * period - 1`.
#[derive(Debug, Clone, Copy)]
pub struct Adx {
    pub period: usize,
}

impl Default for Adx {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Adx {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl MultiValueIndicator for Adx {
    fn name(&self) -> &str {
        "ADX"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<MultiSeries> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, (2 * period).max(period + 1))?;

        let n = candles.len();
        let mut plus_dm = vec![0.0; n];
        let mut minus_dm = vec![0.0; n];
        for i in 1..n {
            let up = candles[i].high - candles[i - 1].high;
            let down = candles[i - 1].low - candles[i].low;
            if up > down && up > 0.0 {
                plus_dm[i] = up;
            }
            if down > up && down > 0.0 {
                minus_dm[i] = down;
            }
        }

        // Directional movement starts at bar 1
        let tr = wilder_smooth(&true_ranges(candles), period, 1);
        let pdm = wilder_smooth(&plus_dm, period, 1);
        let mdm = wilder_smooth(&minus_dm, period, 1);

        let mut plus_di = vec![0.0; n];
        let mut minus_di = vec![0.0; n];
        let mut dx = vec![0.0; n];
        for i in period..n {
            if tr[i] > 0.0 {
                plus_di[i] = 100.0 * pdm[i] / tr[i];
                minus_di[i] = 100.0 * mdm[i] / tr[i];
            }
            let di_sum = plus_di[i] + minus_di[i];
            if di_sum > 0.0 {
                dx[i] = 100.0 * (plus_di[i] - minus_di[i]).abs() / di_sum;
            }
        }
        let adx = wilder_smooth(&dx, period, period);

        Ok(HashMap::from([
            ("adx".to_string(), adx),
            ("plus_di".to_string(), plus_di),
            ("minus_di".to_string(), minus_di),
        ]))
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

const SMA_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    20.0,
    (5.0, 200.0, 5.0),
    "Averaging window",
)];

const EMA_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    12.0,
    (5.0, 200.0, 5.0),
    "Smoothing period",
)];

const MACD_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("fast_period", 12.0, (5.0, 20.0, 1.0), "Fast EMA"),
    ParamMeta::period("slow_period", 26.0, (20.0, 40.0, 2.0), "Slow EMA"),
    ParamMeta::period("signal_period", 9.0, (5.0, 15.0, 1.0), "Signal line EMA"),
];

const ADX_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    14.0,
    (7.0, 30.0, 1.0),
    "Directional movement smoothing",
)];

impl ParameterizedIndicator for Sma {
    fn param_meta() -> &'static [ParamMeta] {
        SMA_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 20)?.get()))
    }

    fn kind() -> &'static str {
        "sma"
    }
}

impl ParameterizedIndicator for Ema {
    fn param_meta() -> &'static [ParamMeta] {
        EMA_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 12)?.get()))
    }

    fn kind() -> &'static str {
        "ema"
    }
}

impl ParameterizedIndicator for Macd {
    fn param_meta() -> &'static [ParamMeta] {
        MACD_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let macd = Self::new(
            get_period(params, "fast_period", 12)?.get(),
            get_period(params, "slow_period", 26)?.get(),
            get_period(params, "signal_period", 9)?.get(),
        );
        if macd.fast_period >= macd.slow_period {
            return Err(IndicatorError::InvalidValue(
                "MACD fast period must be shorter than slow period",
            ));
        }
        Ok(macd)
    }

    fn kind() -> &'static str {
        "macd"
    }
}

impl ParameterizedIndicator for Adx {
    fn param_meta() -> &'static [ParamMeta] {
        ADX_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 14)?.get()))
    }

    fn kind() -> &'static str {
        "adx"
    }
}

// ============================================================
// TESTS
// ============================================================
