//! # chartsense - technical analysis engine
//!
//! Concurrent indicator computation and chart pattern detection over OHLCV candle series.
//!
//! ## Quick Start
//!
//! ```rust
//! use chartsense::prelude::*;
//!
//! // Any chronologically ordered candle series
//! let candles: Vec<Candle> = (0..120)
//!     .map(|i| {
//!         let base = 100.0 + (i as f64 * 0.3).sin() * 5.0;
//!         Candle::new(i, base, base + 1.0, base - 1.0, base + 0.5, 1_000)
//!     })
//!     .collect();
//!
//! // Engine with the default indicator set
//! let engine = EngineBuilder::new()
//!     .workers(4)
//!     .with_all_defaults()
//!     .build()
//!     .unwrap();
//!
//! let results = engine.calculate_all(&CancelToken::new(), &candles);
//! assert!(results.values.contains_key("rsi_14"));
//!
//! // Chart patterns from confirmed swing points
//! let detector = ChartPatternDetector::default();
//! let _patterns = detector.detect(&candles);
//! ```

pub mod engine;
pub mod indicators;
pub mod levels;
pub mod params;
pub mod patterns;

pub mod prelude {
    pub use crate::{
        // Engine
        engine::{CancelToken, Calculations, Engine, EngineBuilder, EngineConfig},
        // Indicators
        indicators::*,
        // Levels
        levels::{
            FibLevel, FibonacciLevels, FibonacciRetracement, PivotLevels, PivotMethod, FIB_RATIOS,
        },
        // Parameters
        params::{get_period, get_ratio, get_value, ParamMeta, ParamType, ParameterizedIndicator},
        // Patterns
        patterns::{
            find_swing_points, prices_equal, BuiltinRecognizer, CandlestickDetector,
            ChartPatternDetector, ChartRecognizer, PatternConfig, SwingContext,
        },
        // Core types
        candles_from,
        validate_candles,
        Candle,
        Direction,
        // Core traits
        Indicator,
        // Errors
        IndicatorError,
        MultiSeries,
        MultiValueIndicator,
        OHLCVExt,
        Pattern,
        PatternId,
        PatternType,
        Period,
        Ratio,
        Result,
        SwingPoint,
        OHLCV,
    };
}

use std::collections::HashMap;

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, IndicatorError>;

/// Errors that can occur during indicator calculation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("Insufficient data: need {need} candles, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid period: {name} = {value}, must be > 0")]
    InvalidPeriod { name: &'static str, value: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Indicator not found: {0}")]
    NotFound(String),

    #[error("Invalid candle at index {index}: {reason}")]
    InvalidCandle { index: usize, reason: &'static str },

    #[error("Calculation cancelled")]
    Cancelled,

    #[error("Worker pool: {0}")]
    WorkerPool(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(IndicatorError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(IndicatorError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        Self::named("period", value)
    }

    /// Like [`Period::new`] but reports `name` in the error
    pub fn named(name: &'static str, value: usize) -> Result<Self> {
        if value == 0 {
            return Err(IndicatorError::InvalidPeriod { name, value });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait, implemented by caller bar types that are converted into [`Candle`]s
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;

    fn timestamp(&self) -> Option<i64> {
        None
    }
}

/// Extension trait with computed properties for OHLCV data
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn typical_price(&self) -> f64 {
        (self.high() + self.low() + self.close()) / 3.0
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range ≈ 0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    /// Validate OHLC consistency
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(IndicatorError::InvalidCandle {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(IndicatorError::InvalidCandle {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err(IndicatorError::InvalidCandle {
                index: 0,
                reason: "non-positive price",
            });
        }
        if self.high() < self.low() {
            return Err(IndicatorError::InvalidCandle {
                index: 0,
                reason: "high < low",
            });
        }
        if self.high() < self.open().max(self.close()) {
            return Err(IndicatorError::InvalidCandle {
                index: 0,
                reason: "high below open/close",
            });
        }
        if self.low() > self.open().min(self.close()) {
            return Err(IndicatorError::InvalidCandle {
                index: 0,
                reason: "low above open/close",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// CANDLE
// ============================================================

/// One OHLCV bar. A series is a chronologically ordered `&[Candle]` that indicators never mutate.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    /// Bar open time (unix milliseconds by convention)
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Convert any [`OHLCV`] bar. Negative or fractional volume is truncated toward zero.
    pub fn from_ohlcv<T: OHLCV>(bar: &T) -> Self {
        Self {
            timestamp: bar.timestamp().unwrap_or(0),
            open: bar.open(),
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            volume: bar.volume().max(0.0) as u64,
        }
    }
}

impl OHLCV for Candle {
    #[inline]
    fn open(&self) -> f64 {
        self.open
    }

    #[inline]
    fn high(&self) -> f64 {
        self.high
    }

    #[inline]
    fn low(&self) -> f64 {
        self.low
    }

    #[inline]
    fn close(&self) -> f64 {
        self.close
    }

    #[inline]
    fn volume(&self) -> f64 {
        self.volume as f64
    }

    fn timestamp(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

/// Convert a slice of caller bars into candles
pub fn candles_from<T: OHLCV>(bars: &[T]) -> Vec<Candle> {
    bars.iter().map(Candle::from_ohlcv).collect()
}

/// Validate every candle, reporting the first failing index
pub fn validate_candles(candles: &[Candle]) -> Result<()> {
    for (i, candle) in candles.iter().enumerate() {
        candle.validate().map_err(|e| match e {
            IndicatorError::InvalidCandle { reason, .. } => {
                IndicatorError::InvalidCandle { index: i, reason }
            }
            other => other,
        })?;
    }
    Ok(())
}

// ============================================================
// INDICATOR TRAITS
// ============================================================

/// Named sub-series of a multi-value indicator (e.g. Stochastic -> `percent_k`, `percent_d`)
pub type MultiSeries = HashMap<String, Vec<f64>>;

/// Indicator producing one value per candle.
///
/// The output has the same length as the input. Index `i` depends only on candles `0..=i`;
/// indices before the warm-up period hold `0.0`.
pub trait Indicator: Send + Sync {
    fn name(&self) -> &str;
    fn period(&self) -> usize;
    fn calculate(&self, candles: &[Candle]) -> Result<Vec<f64>>;
}

/// Indicator producing several named series per candle, with the same per-index semantics as
/// [`Indicator`]
pub trait MultiValueIndicator: Send + Sync {
    fn name(&self) -> &str;
    fn period(&self) -> usize;
    fn calculate(&self, candles: &[Candle]) -> Result<MultiSeries>;
}

// ============================================================
// PATTERNS - result of detection (Copy, no allocations)
// ============================================================

/// Unique identifier for a pattern type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns the typical/expected direction of this pattern.
    ///
    /// - `Some(Direction::Bullish)` - pattern typically signals bullish moves
    /// - `Some(Direction::Bearish)` - pattern typically signals bearish moves
    /// - `Some(Direction::Neutral)` - pattern has no directional bias
    /// - `None` - direction depends on the preceding trend or pole
    pub fn typical_direction(&self) -> Option<Direction> {
        match self.0 {
            "INVERSE_HEAD_AND_SHOULDERS"
            | "DOUBLE_BOTTOM"
            | "TRIPLE_BOTTOM"
            | "ASCENDING_TRIANGLE"
            | "FALLING_WEDGE"
            | "CUP_AND_HANDLE"
            | "ROUNDING_BOTTOM"
            | "CDL_HAMMER"
            | "CDL_ENGULFING_BULLISH"
            | "CDL_MORNINGSTAR"
            | "CDL_3WHITESOLDIERS" => Some(Direction::Bullish),
            "HEAD_AND_SHOULDERS"
            | "DOUBLE_TOP"
            | "TRIPLE_TOP"
            | "DESCENDING_TRIANGLE"
            | "RISING_WEDGE"
            | "CDL_SHOOTINGSTAR"
            | "CDL_ENGULFING_BEARISH"
            | "CDL_EVENINGSTAR"
            | "CDL_3BLACKCROWS" => Some(Direction::Bearish),
            "CDL_DOJI" => Some(Direction::Neutral),
            // SYMMETRICAL_TRIANGLE, RECTANGLE, FLAG, PENNANT and custom ids
            _ => None,
        }
    }

    /// Returns true if the direction depends on market context
    pub fn is_bidirectional(&self) -> bool {
        self.typical_direction().is_none()
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Family a detected pattern belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PatternType {
    Chart,
    Candlestick,
}

/// A detected pattern. Produced fresh per detection call.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Pattern {
    pub id: PatternId,
    pub pattern_type: PatternType,
    pub direction: Direction,
    pub start_index: usize,
    pub end_index: usize,
    /// Recognizer reliability 0.0..=1.0
    pub strength: f64,
    /// Measured-move target
    pub target_price: f64,
    /// 1.0 once price broke the neckline, 0.8 while forming
    pub completion: f64,
}

/// Confirmed local extremum
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub is_high: bool,
    pub strength: usize,
}

// ============================================================
// TESTS
// ============================================================
