//! Indicator implementations
//!
//! Indicators are grouped by category:
//! - `momentum`: RSI, Stochastic, CCI, Williams %R, ROC, Momentum, Ultimate Oscillator
//! - `volatility`: ATR, Bollinger Bands, Keltner and Donchian channels, historical volatility
//! - `trend`: SMA, EMA, MACD, ADX
//! - `volume`: OBV, MFI, VWAP
//! - `helpers`: shared window math

pub mod helpers;
pub mod momentum;
pub mod trend;
pub mod volatility;
pub mod volume;

use std::sync::Arc;

pub use momentum::{Cci, Momentum, Roc, Rsi, Stochastic, UltimateOscillator, WilliamsR};
pub use trend::{Adx, Ema, Macd, Sma};
pub use volatility::{Atr, BollingerBands, DonchianChannels, HistoricalVolatility, KeltnerChannels};
pub use volume::{Mfi, Obv, Vwap};

use crate::{Candle, Indicator, IndicatorError, MultiValueIndicator, Result};

/// Fail with `InvalidPeriod` when a period is zero
#[inline]
pub(crate) fn ensure_period(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(IndicatorError::InvalidPeriod { name, value });
    }
    Ok(())
}

/// Fail with `InsufficientData` when the series is shorter than `need`
#[inline]
pub(crate) fn ensure_len(candles: &[Candle], need: usize) -> Result<()> {
    if candles.len() < need {
        return Err(IndicatorError::InsufficientData {
            need,
            got: candles.len(),
        });
    }
    Ok(())
}

// ============================================================
// DEFAULT SET
// ============================================================

/// Default single-value indicators under their registry names
pub fn default_indicators() -> Vec<(&'static str, Arc<dyn Indicator>)> {
    let set: [(&'static str, Arc<dyn Indicator>); 15] = [
        ("sma_20", Arc::new(Sma::new(20))),
        ("sma_50", Arc::new(Sma::new(50))),
        ("ema_12", Arc::new(Ema::new(12))),
        ("ema_26", Arc::new(Ema::new(26))),
        ("rsi_14", Arc::new(Rsi::default())),
        ("cci_20", Arc::new(Cci::default())),
        ("williams_r_14", Arc::new(WilliamsR::default())),
        ("roc_12", Arc::new(Roc::default())),
        ("momentum_10", Arc::new(Momentum::default())),
        ("ultimate_oscillator", Arc::new(UltimateOscillator::default())),
        ("atr_14", Arc::new(Atr::default())),
        ("historical_volatility_20", Arc::new(HistoricalVolatility::default())),
        ("obv", Arc::new(Obv)),
        ("mfi_14", Arc::new(Mfi::default())),
        ("vwap", Arc::new(Vwap)),
    ];
    set.into()
}

/// Default multi-value indicators under their registry names
pub fn default_multi_indicators() -> Vec<(&'static str, Arc<dyn MultiValueIndicator>)> {
    let set: [(&'static str, Arc<dyn MultiValueIndicator>); 6] = [
        ("stochastic", Arc::new(Stochastic::default())),
        ("macd", Arc::new(Macd::default())),
        ("adx", Arc::new(Adx::default())),
        ("bollinger_bands", Arc::new(BollingerBands::default())),
        ("keltner_channels", Arc::new(KeltnerChannels::default())),
        ("donchian_channels", Arc::new(DonchianChannels::default())),
    ];
    set.into()
}
