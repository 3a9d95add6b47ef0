//! Pattern detection
//!
//! - `swing`: confirmed swing highs/lows
//! - `reversal`: head and shoulders, double/triple tops and bottoms, cup and handle,
//!   rounding bottom
//! - `continuation`: triangles, wedges, flag, pennant, rectangle
//! - `candlestick`: single- to three-bar candlestick patterns
//! - `helpers`: tolerance comparison, trendline geometry, completion

pub mod candlestick;
pub mod continuation;
pub mod helpers;
pub mod reversal;
pub mod swing;

use std::sync::Arc;

use tracing::{debug, trace};

pub use candlestick::CandlestickDetector;
pub use continuation::*;
pub use helpers::{prices_equal, Channel, PriceEq};
pub use reversal::*;
pub use swing::{find_swing_points, swing_highs, swing_lows};

use crate::{
    Candle, Direction, IndicatorError, Pattern, PatternId, PatternType, Period, Ratio, Result,
    SwingPoint,
};

// ============================================================
// CONFIGURATION
// ============================================================

/// Chart pattern thresholds
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Relative tolerance for "equal" prices
    pub tolerance: f64,
    /// Neighbours required on each side of a swing point
    pub min_swing_strength: usize,
    /// Max slope difference (per bar, relative to price) for parallel flag lines
    pub slope_tolerance: f64,
    /// Minimum relative pole move before a flag or pennant
    pub pole_min_move: f64,
    /// Pole length in bars
    pub pole_bars: usize,
    /// Lookback for the prior-trend heuristic
    pub trend_bars: usize,
    /// Max share of the cup depth a handle may retrace
    pub handle_max_retrace: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            min_swing_strength: 3,
            slope_tolerance: 0.002,
            pole_min_move: 0.05,
            pole_bars: 10,
            trend_bars: 10,
            handle_max_retrace: 0.5,
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<()> {
        Ratio::new(self.tolerance)?;
        Period::named("min_swing_strength", self.min_swing_strength)?;
        if !self.slope_tolerance.is_finite() || self.slope_tolerance < 0.0 {
            return Err(IndicatorError::InvalidValue(
                "slope_tolerance must be finite and non-negative",
            ));
        }
        Ratio::new(self.pole_min_move)?;
        Period::named("pole_bars", self.pole_bars)?;
        Period::named("trend_bars", self.trend_bars)?;
        Ratio::new(self.handle_max_retrace)?;
        Ok(())
    }
}

// ============================================================
// RECOGNIZER CONTEXT
// ============================================================

/// Geometry of a matched formation, before scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formation {
    pub direction: Direction,
    pub start: usize,
    pub end: usize,
    pub neckline: f64,
    pub target: f64,
}

/// Candles plus their swing points, split by side, for one detection pass
pub struct SwingContext<'a> {
    pub candles: &'a [Candle],
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
    pub config: &'a PatternConfig,
    price_eq: PriceEq,
}

impl<'a> SwingContext<'a> {
    /// Swings pointing past the end of `candles` are dropped
    pub fn new(
        candles: &'a [Candle],
        swings: &[SwingPoint],
        config: &'a PatternConfig,
        price_eq: PriceEq,
    ) -> Self {
        let in_range = swings.iter().filter(|s| s.index < candles.len());
        Self {
            candles,
            highs: in_range.clone().filter(|s| s.is_high).copied().collect(),
            lows: in_range.filter(|s| !s.is_high).copied().collect(),
            config,
            price_eq,
        }
    }

    /// Tolerance equality under the configured comparison
    #[inline]
    pub fn eq(&self, a: f64, b: f64) -> bool {
        (self.price_eq)(a, b, self.config.tolerance)
    }

    #[inline]
    pub fn last_close(&self) -> f64 {
        self.candles.last().map_or(0.0, |c| c.close)
    }

    #[inline]
    pub fn prior_trend(&self, start: usize) -> Direction {
        helpers::prior_trend(self.candles, start, self.config.trend_bars)
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        helpers::channels(&self.highs, &self.lows)
    }

    /// Score a formation into a chart pattern
    pub fn finish(&self, id: PatternId, strength: f64, formation: Formation) -> Pattern {
        Pattern {
            id,
            pattern_type: PatternType::Chart,
            direction: formation.direction,
            start_index: formation.start,
            end_index: formation.end,
            strength,
            target_price: formation.target,
            completion: helpers::completion(
                formation.direction,
                formation.neckline,
                self.last_close(),
            ),
        }
    }
}

// ============================================================
// RECOGNIZER TRAIT
// ============================================================

/// One chart pattern. Returns the most recent match only.
pub trait ChartRecognizer: Send + Sync {
    fn id(&self) -> PatternId;

    /// Fixed reliability score in 0.0..=1.0
    fn strength(&self) -> f64;

    fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern>;
}

macro_rules! define_builtin_recognizers {
    (
        $(
            $variant:ident($recognizer:ty)
        ),* $(,)?
    ) => {
        /// All builtin chart recognizers - enum dispatch
        #[derive(Debug, Clone, Copy)]
        pub enum BuiltinRecognizer {
            $($variant($recognizer)),*
        }

        impl BuiltinRecognizer {
            /// Every builtin recognizer with its default settings
            pub fn all() -> Vec<Self> {
                vec![$(Self::$variant(<$recognizer>::default())),*]
            }

            #[inline]
            pub fn recognize(&self, ctx: &SwingContext<'_>) -> Option<Pattern> {
                match self {
                    $(Self::$variant(r) => ChartRecognizer::recognize(r, ctx)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(r) => ChartRecognizer::id(r)),*
                }
            }

            #[inline]
            pub fn strength(&self) -> f64 {
                match self {
                    $(Self::$variant(r) => ChartRecognizer::strength(r)),*
                }
            }
        }
    };
}

define_builtin_recognizers! {
    // Reversal (8)
    HeadAndShoulders(HeadAndShouldersRecognizer),
    InverseHeadAndShoulders(InverseHeadAndShouldersRecognizer),
    DoubleTop(DoubleTopRecognizer),
    DoubleBottom(DoubleBottomRecognizer),
    TripleTop(TripleTopRecognizer),
    TripleBottom(TripleBottomRecognizer),
    CupAndHandle(CupAndHandleRecognizer),
    RoundingBottom(RoundingBottomRecognizer),

    // Continuation / bilateral (8)
    AscendingTriangle(AscendingTriangleRecognizer),
    DescendingTriangle(DescendingTriangleRecognizer),
    SymmetricalTriangle(SymmetricalTriangleRecognizer),
    RisingWedge(RisingWedgeRecognizer),
    FallingWedge(FallingWedgeRecognizer),
    Flag(FlagRecognizer),
    Pennant(PennantRecognizer),
    Rectangle(RectangleRecognizer),
}

// ============================================================
// DETECTOR
// ============================================================

/// Runs every recognizer over one candle series. Matches are not mutually exclusive.
#[derive(Clone)]
pub struct ChartPatternDetector {
    config: PatternConfig,
    price_eq: PriceEq,
    builtin: Vec<BuiltinRecognizer>,
    custom: Vec<Arc<dyn ChartRecognizer>>,
}

impl Default for ChartPatternDetector {
    fn default() -> Self {
        Self::new(PatternConfig::default())
    }
}

impl ChartPatternDetector {
    /// Detector with all builtin recognizers
    pub fn new(config: PatternConfig) -> Self {
        Self {
            config,
            price_eq: prices_equal,
            builtin: BuiltinRecognizer::all(),
            custom: Vec::new(),
        }
    }

    /// Like [`ChartPatternDetector::new`], rejecting an invalid config
    pub fn try_new(config: PatternConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Replace the price equality test
    pub fn with_price_eq(mut self, price_eq: PriceEq) -> Self {
        self.price_eq = price_eq;
        self
    }

    /// Restrict to the given builtin recognizers
    pub fn with_builtin(mut self, recognizers: Vec<BuiltinRecognizer>) -> Self {
        self.builtin = recognizers;
        self
    }

    /// Add a custom recognizer, run after the builtin ones
    pub fn with_recognizer<R: ChartRecognizer + 'static>(mut self, recognizer: R) -> Self {
        self.custom.push(Arc::new(recognizer));
        self
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Detect from swings found with `min_swing_strength`
    pub fn detect(&self, candles: &[Candle]) -> Vec<Pattern> {
        let swings = find_swing_points(candles, self.config.min_swing_strength);
        self.detect_with_swings(candles, &swings)
    }

    /// Detect from precomputed swings
    pub fn detect_with_swings(&self, candles: &[Candle], swings: &[SwingPoint]) -> Vec<Pattern> {
        if candles.is_empty() {
            return Vec::new();
        }
        let ctx = SwingContext::new(candles, swings, &self.config, self.price_eq);
        debug!(
            candles = candles.len(),
            highs = ctx.highs.len(),
            lows = ctx.lows.len(),
            "scanning chart patterns"
        );

        let builtin = self.builtin.iter().filter_map(|r| r.recognize(&ctx));
        let custom = self.custom.iter().filter_map(|r| r.recognize(&ctx));
        let patterns: Vec<Pattern> = builtin
            .chain(custom)
            .inspect(|p| {
                trace!(
                    id = p.id.as_str(),
                    start = p.start_index,
                    end = p.end_index,
                    "chart pattern matched"
                )
            })
            .collect();

        debug!(found = patterns.len(), "chart pattern scan finished");
        patterns
    }
}
