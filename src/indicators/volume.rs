//! Volume indicators: OBV, MFI, VWAP

use std::collections::HashMap;

use super::helpers::typical_prices;
use super::{ensure_len, ensure_period};
use crate::{
    params::{get_period, ParamMeta, ParameterizedIndicator},
    Candle, Indicator, Result,
};

/// On-Balance Volume. `obv[0] = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Obv;

impl Indicator for Obv {
    fn name(&self) -> &str {
        "OBV"
    }

    fn period(&self) -> usize {
        1
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        ensure_len(candles, 2)?;
        let mut out = vec![0.0; candles.len()];
        for i in 1..candles.len() {
            let volume = candles[i].volume as f64;
            let delta = candles[i].close - candles[i - 1].close;
            out[i] = out[i - 1]
                + if delta > 0.0 {
                    volume
                } else if delta < 0.0 {
                    -volume
                } else {
                    0.0
                };
        }
        Ok(out)
    }
}

/// Money Flow Index in [0, 100]
#[derive(Debug, Clone, Copy)]
pub struct Mfi {
    pub period: usize,
}

impl Default for Mfi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Mfi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Mfi {
    fn name(&self) -> &str {
        "MFI"
    }

    fn period(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        let period = self.period;
        ensure_period("period", period)?;
        ensure_len(candles, period + 1)?;

        let tp = typical_prices(candles);
        let n = tp.len();
        let mut out = vec![0.0; n];
        for i in period..n {
            let (mut positive, mut negative) = (0.0, 0.0);
            for j in (i + 1 - period)..=i {
                let flow = tp[j] * candles[j].volume as f64;
                if tp[j] > tp[j - 1] {
                    positive += flow;
                } else if tp[j] < tp[j - 1] {
                    negative += flow;
                }
            }
            out[i] = if negative == 0.0 {
                if positive > 0.0 {
                    100.0
                } else {
                    50.0
                }
            } else {
                (100.0 - 100.0 / (1.0 + positive / negative)).clamp(0.0, 100.0)
            };
        }
        Ok(out)
    }
}

/// Volume-weighted average price, cumulative over the whole series
#[derive(Debug, Clone, Copy, Default)]
pub struct Vwap;

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "VWAP"
    }

    fn period(&self) -> usize {
        1
    }

    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>> {
        ensure_len(candles, 2)?;
        let tp = typical_prices(candles);
        let (mut price_volume, mut volume) = (0.0, 0.0);
        Ok(tp
            .iter()
            .zip(candles)
            .map(|(&price, candle)| {
                price_volume += price * candle.volume as f64;
                volume += candle.volume as f64;
                if volume > 0.0 {
                    price_volume / volume
                } else {
                    price
                }
            })
            .collect())
    }
}

const MFI_PARAMS: &[ParamMeta] = &[ParamMeta::period(
    "period",
    14.0,
    (5.0, 30.0, 1.0),
    "Money flow window",
)];

impl ParameterizedIndicator for Obv {
    fn param_meta() -> &'static [ParamMeta] {
        &[]
    }

    fn with_params(_params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self)
    }

    fn kind() -> &'static str {
        "obv"
    }
}

impl ParameterizedIndicator for Mfi {
    fn param_meta() -> &'static [ParamMeta] {
        MFI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self::new(get_period(params, "period", 14)?.get()))
    }

    fn kind() -> &'static str {
        "mfi"
    }
}

impl ParameterizedIndicator for Vwap {
    fn param_meta() -> &'static [ParamMeta] {
        &[]
    }

    fn with_params(_params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self)
    }

    fn kind() -> &'static str {
        "vwap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndicatorError;

    fn bar(i: i64, close: f64, volume: u64) -> Candle {
        Candle::new(i, close, close + 1.0, close - 1.0, close, volume)
    }

    #[test]
    fn test_obv_signed_volume() {
        let candles = vec![
            bar(0, 10.0, 100),
            bar(1, 11.0, 200),
            bar(2, 10.5, 50),
            bar(3, 10.5, 70),
        ];
        assert_eq!(Obv.calculate(&candles).unwrap(), vec![0.0, 200.0, 150.0, 150.0]);
    }

    #[test]
    fn test_mfi_only_inflows_is_100() {
        let candles: Vec<Candle> = (0..20).map(|i| bar(i, 100.0 + i as f64, 1_000)).collect();
        let out = Mfi::default().calculate(&candles).unwrap();
        assert_eq!(out[13], 0.0);
        assert_eq!(out[19], 100.0);
    }

    #[test]
    fn test_mfi_flat_is_50() {
        let candles: Vec<Candle> = (0..20).map(|i| bar(i, 100.0, 1_000)).collect();
        assert_eq!(Mfi::default().calculate(&candles).unwrap()[19], 50.0);
    }

    #[test]
    fn test_vwap_weights_by_volume() {
        let candles = vec![bar(0, 10.0, 100), bar(1, 20.0, 300)];
        let out = Vwap.calculate(&candles).unwrap();
        assert_eq!(out[0], 10.0);
        assert!((out[1] - 17.5).abs() < 1e-12);
    }

    #[test]
    fn test_vwap_zero_volume_falls_back_to_typical_price() {
        let candles = vec![bar(0, 10.0, 0), bar(1, 12.0, 0)];
        assert_eq!(Vwap.calculate(&candles).unwrap(), vec![10.0, 12.0]);
    }

    #[test]
    fn test_single_candle_is_insufficient() {
        let candles = vec![bar(0, 10.0, 100)];
        assert_eq!(
            Obv.calculate(&candles),
            Err(IndicatorError::InsufficientData { need: 2, got: 1 })
        );
    }
}
