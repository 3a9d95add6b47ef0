//! Volatility indicators: ATR, Bollinger Bands, Keltner Channels, Donchian Channels,
//! Historical Volatility

use std::collections::HashMap;

use super::helpers::{
    closes, ema, highest, lowest, mean, std_dev, true_ranges, typical_prices, wilder_smooth,
};
use super::{ensure_len, ensure_period};
use crate::{
    params::{get_period, get_value, ParamMeta, ParameterizedIndicator},
    Candle, Indicator, IndicatorError, MultiSeries, MultiValueIndicator, Result,
};

/// Band multipliers must be finite and non-negative
fn ensure_multiplier(multiplier: f64) -> Result<()> {
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(IndicatorError::InvalidValue(
            "multiplier must be finite and non-negative",
        ));
    }
    Ok(())
}

// ============================================================
// ATR
// ============================================================

/// Average True Range, Wilder-smoothed. First value at `period - 1`.
#[derive(Debug, Clone, Copy)]
pub struct Atr {
    pub period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        "ATR"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        ensure_period("period", self.period)?;
        ensure_len(candles, self.period + 1)?;
        Ok(wilder_smooth(&true_ranges(candles), self.period, 0))
    }
}

// ============================================================
// BOLLINGER BANDS
// ============================================================

/// Bollinger Bands -> `upper`, `middle`, `lower`, `bandwidth`, `percent_b`
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    pub period: usize,
    /// Standard deviations from the middle band
    pub multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, multiplier: f64) -> Self {
        Self { period, multiplier }
    }
}

impl MultiValueIndicator for BollingerBands {
    fn name(&self) -> &str {
        "Bollinger Bands"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<MultiSeries> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_multiplier(self.multiplier)?;
        ensure_len(candles, period + 1)?;

        let closes = closes(candles);
        let n = closes.len();
        let mut upper = vec![0.0; n];
        let mut middle = vec![0.0; n];
        let mut lower = vec![0.0; n];
        let mut bandwidth = vec![0.0; n];
        let mut percent_b = vec![0.0; n];

        for i in (period - 1)..n {
            let window = &closes[i + 1 - period..=i];
            let mid = mean(window);
            let offset = self.multiplier * std_dev(window);
            let (up, low) = (mid + offset, mid - offset);
            upper[i] = up;
            middle[i] = mid;
            lower[i] = low;
            if mid != 0.0 {
                bandwidth[i] = (up - low) / mid;
            }
            percent_b[i] = if up - low > 0.0 {
                (closes[i] - low) / (up - low)
            } else {
                0.5
            };
        }

        Ok(HashMap::from([
            ("upper".to_string(), upper),
            ("middle".to_string(), middle),
            ("lower".to_string(), lower),
            ("bandwidth".to_string(), bandwidth),
            ("percent_b".to_string(), percent_b),
        ]))
    }
}

// ============================================================
// KELTNER CHANNELS
// ============================================================

/// Keltner Channels -> `upper`, `middle`, `lower`.
/// Middle is the EMA of typical price; bands are `multiplier * ATR` away.
#[derive(Debug, Clone, Copy)]
pub struct KeltnerChannels {
    pub ema_period: usize,
    pub atr_period: usize,
    pub multiplier: f64,
}

impl Default for KeltnerChannels {
    fn default() -> Self {
        Self {
            ema_period: 20,
            atr_period: 10,
            multiplier: 2.0,
        }
    }
}

impl KeltnerChannels {
    pub fn new(ema_period: usize, atr_period: usize, multiplier: f64) -> Self {
        Self {
            ema_period,
            atr_period,
            multiplier,
        }
    }
}

impl MultiValueIndicator for KeltnerChannels {
    fn name(&self) -> &str {
        "Keltner Channels"
    }

    fn period(&self) -> usize {
        self.ema_period.max(self.atr_period)
    }

    fn calculate(&self, candles: &[Candle]) -> Result<MultiSeries> {
        ensure_period("ema_period", self.ema_period)?;
        ensure_period("atr_period", self.atr_period)?;
        ensure_multiplier(self.multiplier)?;
        ensure_len(candles, self.ema_period.max(self.atr_period) + 1)?;

        let mid = ema(&typical_prices(candles), self.ema_period);
        let atr = wilder_smooth(&true_ranges(candles), self.atr_period, 0);

        let n = candles.len();
        let mut upper = vec![0.0; n];
        let mut middle = vec![0.0; n];
        let mut lower = vec![0.0; n];
        // Both sub-series must be warm
        let start = (self.ema_period - 1).max(self.atr_period - 1);
        for i in start..n {
            let offset = self.multiplier * atr[i];
            middle[i] = mid[i];
            upper[i] = mid[i] + offset;
            lower[i] = mid[i] - offset;
        }

        Ok(HashMap::from([
            ("upper".to_string(), upper),
            ("middle".to_string(), middle),
            ("lower".to_string(), lower),
        ]))
    }
}

// ============================================================
// DONCHIAN CHANNELS
// ============================================================

/// Donchian Channels -> rolling highest high, lowest low and their midpoint
#[derive(Debug, Clone, Copy)]
pub struct DonchianChannels {
    pub period: usize,
}

impl Default for DonchianChannels {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl DonchianChannels {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl MultiValueIndicator for DonchianChannels {
    fn name(&self) -> &str {
        "Donchian Channels"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<MultiSeries> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, period + 1)?;

        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let n = candles.len();
        let mut upper = vec![0.0; n];
        let mut middle = vec![0.0; n];
        let mut lower = vec![0.0; n];
        for i in (period - 1)..n {
            let hh = highest(&highs[i + 1 - period..=i]);
            let ll = lowest(&lows[i + 1 - period..=i]);
            upper[i] = hh;
            lower[i] = ll;
            middle[i] = (hh + ll) / 2.0;
        }

        Ok(HashMap::from([
            ("upper".to_string(), upper),
            ("middle".to_string(), middle),
            ("lower".to_string(), lower),
        ]))
    }
}

// ============================================================
// HISTORICAL VOLATILITY
// ============================================================

/// Annualized standard deviation of log returns, in percent
#[derive(Debug, Clone, Copy)]
pub struct HistoricalVolatility {
    pub period: usize,
    pub trading_days: usize,
}

impl Default for HistoricalVolatility {
    fn default() -> Self {
        Self {
            period: 20,
            trading_days: 252,
        }
    }
}

impl HistoricalVolatility {
    pub fn new(period: usize, trading_days: usize) -> Self {
        Self {
            period,
            trading_days,
        }
    }
}

impl Indicator for HistoricalVolatility {
    fn name(&self) -> &str {
        "Historical Volatility"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_period("trading_days", self.trading_days)?;
        ensure_len(candles, period + 1)?;

        let closes = closes(candles);
        let n = closes.len();
        // returns[i] is the log return into bar i; returns[0] is unused
        let mut returns = vec![0.0; n];
        for i in 1..n {
            let (prev, cur) = (closes[i - 1], closes[i]);
            if prev > 0.0 && cur > 0.0 {
                returns[i] = (cur / prev).ln();
            }
        }

        let annualize = (self.trading_days as f64).sqrt() * 100.0;
        let mut out = vec![0.0; n];
        for i in period..n {
            out[i] = std_dev(&returns[i + 1 - period..=i]) * annualize;
        }
        Ok(out)
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

const ATR_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    14.0,
    (5.0, 50.0, 1.0),
    "Wilder smoothing period",
)];

const BOLLINGER_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("period", 20.0, (10.0, 50.0, 5.0), "Moving average window"),
    ParamMeta::value("multiplier", 2.0, (1.0, 3.0, 0.5), "Standard deviations per band"),
];

const KELTNER_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("ema_period", 20.0, (10.0, 50.0, 5.0), "Middle line EMA"),
    ParamMeta::period("atr_period", 10.0, (5.0, 30.0, 5.0), "ATR period for band width"),
    ParamMeta::value("multiplier", 2.0, (1.0, 3.0, 0.5), "ATRs per band"),
];

const DONCHIAN_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    20.0,
    (10.0, 55.0, 5.0),
    "Channel lookback",
)];

const HISTORICAL_VOLATILITY_PARAMS: &[ParamMeta] = &[
    ParamMeta::period("period", 20.0, (10.0, 60.0, 10.0), "Return window"),
    ParamMeta::period("trading_days", 252.0, (252.0, 365.0, 113.0), "Periods per year"),
];

impl ParameterizedIndicator for Atr {
    fn param_meta() -> &'static [ParamMeta] {
        ATR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 14)?.get()))
    }

    fn kind() -> &'static str {
        "atr"
    }
}

impl ParameterizedIndicator for BollingerBands {
    fn param_meta() -> &'static [ParamMeta] {
        BOLLINGER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let multiplier = get_value(params, "multiplier", 2.0)?;
        ensure_multiplier(multiplier)?;
        Ok(Self::new(get_period(params, "period", 20)?.get(), multiplier))
    }

    fn kind() -> &'static str {
        "bollinger_bands"
    }
}

impl ParameterizedIndicator for KeltnerChannels {
    fn param_meta() -> &'static [ParamMeta] {
        KELTNER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let multiplier = get_value(params, "multiplier", 2.0)?;
        ensure_multiplier(multiplier)?;
        Ok(Self::new(
            get_period(params, "ema_period", 20)?.get(),
            get_period(params, "atr_period", 10)?.get(),
            multiplier,
        ))
    }

    fn kind() -> &'static str {
        "keltner_channels"
    }
}

impl ParameterizedIndicator for DonchianChannels {
    fn param_meta() -> &'static [ParamMeta] {
        DONCHIAN_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 20)?.get()))
    }

    fn kind() -> &'static str {
        "donchian_channels"
    }
}

impl ParameterizedIndicator for HistoricalVolatility {
    fn param_meta() -> &'static [ParamMeta] {
        HISTORICAL_VOLATILITY_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(
            get_period(params, "period", 20)?.get(),
            get_period(params, "trading_days", 252)?.get(),
        ))
    }

    fn kind() -> &'static str {
        "historical_volatility"
    }
}

// ============================================================
// TESTS
// ============================================================
