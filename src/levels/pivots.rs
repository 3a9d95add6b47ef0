//! Pivot points from the prior period's OHLC

use crate::{indicators::ensure_len, Candle, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum PivotMethod {
    #[default]
    Standard,
    Woodie,
    Camarilla,
    /// Defines only the pivot, R1 and S1
    DeMark,
}

/// Pivot and support/resistance levels. `r2`, `r3`, `s2`, `s3` are `None` for DeMark.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PivotLevels {
    pub method: PivotMethod,
    pub pivot: f64,
    pub r1: f64,
    pub s1: f64,
    pub r2: Option<f64>,
    pub r3: Option<f64>,
    pub s2: Option<f64>,
    pub s3: Option<f64>,
}

impl PivotLevels {
    pub fn calculate(method: PivotMethod, open: f64, high: f64, low: f64, close: f64) -> Self {
        match method {
            PivotMethod::Standard => Self::floor(method, (high + low + close) / 3.0, high, low),
            PivotMethod::Woodie => Self::floor(method, (high + low + 2.0 * close) / 4.0, high, low),
            PivotMethod::Camarilla => Self::camarilla(high, low, close),
            PivotMethod::DeMark => Self::demark(open, high, low, close),
        }
    }

    pub fn from_candle(method: PivotMethod, candle: &Candle) -> Self {
        Self::calculate(method, candle.open, candle.high, candle.low, candle.close)
    }

    /// Levels for the next period, taken from the last candle of the series
    pub fn from_series(method: PivotMethod, candles: &[Candle]) -> Result<Self> {
        ensure_len(candles, 1)?;
        let last = &candles[candles.len() - 1];
        Ok(Self::from_candle(method, last))
    }

    /// Floor-trader levels around a given pivot (Standard and Woodie)
    fn floor(method: PivotMethod, pivot: f64, high: f64, low: f64) -> Self {
        let range = high - low;
        Self {
            method,
            pivot,
            r1: 2.0 * pivot - low,
            s1: 2.0 * pivot - high,
            r2: Some(pivot + range),
            s2: Some(pivot - range),
            r3: Some(high + 2.0 * (pivot - low)),
            s3: Some(low - 2.0 * (high - pivot)),
        }
    }

    fn camarilla(high: f64, low: f64, close: f64) -> Self {
        let range = (high - low) * 1.1;
        Self {
            method: PivotMethod::Camarilla,
            pivot: (high + low + close) / 3.0,
            r1: close + range / 12.0,
            s1: close - range / 12.0,
            r2: Some(close + range / 6.0),
            s2: Some(close - range / 6.0),
            r3: Some(close + range / 4.0),
            s3: Some(close - range / 4.0),
        }
    }

    fn demark(open: f64, high: f64, low: f64, close: f64) -> Self {
        let x = if close < open {
            high + 2.0 * low + close
        } else if close > open {
            2.0 * high + low + close
        } else {
            high + low + 2.0 * close
        };
        Self {
            method: PivotMethod::DeMark,
            pivot: x / 4.0,
            r1: x / 2.0 - low,
            s1: x / 2.0 - high,
            r2: None,
            r3: None,
            s2: None,
            s3: None,
        }
    }

    /// Resistance levels that are defined, nearest first
    pub fn resistances(&self) -> Vec<f64> {
        [Some(self.r1), self.r2, self.r3].into_iter().flatten().collect()
    }

    /// Support levels that are defined, nearest first
    pub fn supports(&self) -> Vec<f64> {
        [Some(self.s1), self.s2, self.s3].into_iter().flatten().collect()
    }
}
