//! Concurrent indicator engine
//!
//! An [`Engine`] owns a fixed-size rayon pool and two registries of named indicators. Batch
//! calls run every selected indicator concurrently and omit the ones that fail, so one broken
//! indicator never costs the caller the rest of the batch.

use crate::indicators::{default_indicators, default_multi_indicators};
use crate::{
    validate_candles, Candle, Indicator, IndicatorError, MultiSeries, MultiValueIndicator, Result,
};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Pool size used when the configuration asks for zero workers
pub const DEFAULT_WORKERS: usize = 4;

// ============================================================
// CONFIG
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads; `0` means [`DEFAULT_WORKERS`]
    pub workers: usize,
    /// Reject candles failing [`Candle::validate`](crate::Candle::validate) before calculating
    pub validate_data: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            validate_data: false,
        }
    }
}

impl EngineConfig {
    #[inline]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            DEFAULT_WORKERS
        } else {
            self.workers
        }
    }
}

// ============================================================
// CANCELLATION
// ============================================================

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================
// RESULTS
// ============================================================

/// Output of a batch call, keyed by registration name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Calculations {
    pub values: HashMap<String, Vec<f64>>,
    pub multi_values: HashMap<String, MultiSeries>,
}

impl Calculations {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.multi_values.is_empty()
    }

    /// Number of indicators that produced output
    pub fn len(&self) -> usize {
        self.values.len() + self.multi_values.len()
    }
}

// ============================================================
// ENGINE
// ============================================================

type SingleEntry = (String, Arc<dyn Indicator>);
type MultiEntry = (String, Arc<dyn MultiValueIndicator>);

pub struct Engine {
    indicators: RwLock<HashMap<String, Arc<dyn Indicator>>>,
    multi_indicators: RwLock<HashMap<String, Arc<dyn MultiValueIndicator>>>,
    pool: rayon::ThreadPool,
    config: EngineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("indicators", &self.list_indicators())
            .field("multi_indicators", &self.list_multi_indicators())
            .finish()
    }
}

impl Engine {
    /// Empty engine with its own worker pool
    pub fn new(config: EngineConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .thread_name(|i| format!("chartsense-{i}"))
            .build()
            .map_err(|e| IndicatorError::WorkerPool(e.to_string()))?;

        Ok(Self {
            indicators: RwLock::new(HashMap::new()),
            multi_indicators: RwLock::new(HashMap::new()),
            pool,
            config,
        })
    }

    /// Engine with the default configuration and the default indicator set
    pub fn with_defaults() -> Result<Self> {
        EngineBuilder::new().with_all_defaults().build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Threads in the worker pool
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Register under `name`, replacing any indicator already registered there
    pub fn register_indicator(&self, name: impl Into<String>, indicator: Arc<dyn Indicator>) {
        let name = name.into();
        if self.indicators.write().insert(name.clone(), indicator).is_some() {
            debug!(indicator = %name, "replaced registered indicator");
        }
    }

    /// Register under `name`, replacing any multi-value indicator already registered there
    pub fn register_multi_indicator(
        &self,
        name: impl Into<String>,
        indicator: Arc<dyn MultiValueIndicator>,
    ) {
        let name = name.into();
        if self.multi_indicators.write().insert(name.clone(), indicator).is_some() {
            debug!(indicator = %name, "replaced registered multi-value indicator");
        }
    }

    /// Remove `name` from both registries. Returns whether anything was removed.
    pub fn unregister(&self, name: &str) -> bool {
        let single = self.indicators.write().remove(name).is_some();
        let multi = self.multi_indicators.write().remove(name).is_some();
        single || multi
    }

    /// Registered single-value names, sorted
    pub fn list_indicators(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indicators.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered multi-value names, sorted
    pub fn list_multi_indicators(&self) -> Vec<String> {
        let mut names: Vec<String> = self.multi_indicators.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Run one single-value indicator on the calling thread
    pub fn calculate(
        &self,
        token: &CancelToken,
        name: &str,
        candles: &[Candle],
    ) -> Result<Vec<f64>> {
        self.check_single(token, candles)?;
        let indicator = self
            .indicators
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| IndicatorError::NotFound(name.to_string()))?;
        indicator.calculate(candles)
    }

    /// Run one multi-value indicator on the calling thread
    pub fn calculate_multi(
        &self,
        token: &CancelToken,
        name: &str,
        candles: &[Candle],
    ) -> Result<MultiSeries> {
        self.check_single(token, candles)?;
        let indicator = self
            .multi_indicators
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| IndicatorError::NotFound(name.to_string()))?;
        indicator.calculate(candles)
    }

    /// Run every registered indicator concurrently. Failing indicators are omitted.
    pub fn calculate_all(&self, token: &CancelToken, candles: &[Candle]) -> Calculations {
        let singles: Vec<SingleEntry> = self
            .indicators
            .read()
            .iter()
            .map(|(name, ind)| (name.clone(), Arc::clone(ind)))
            .collect();
        let multis: Vec<MultiEntry> = self
            .multi_indicators
            .read()
            .iter()
            .map(|(name, ind)| (name.clone(), Arc::clone(ind)))
            .collect();
        self.run_batch(token, candles, singles, multis)
    }

    /// Like [`Engine::calculate_all`] restricted to `names`; unknown names are skipped
    pub fn calculate_selected(
        &self,
        token: &CancelToken,
        candles: &[Candle],
        names: &[&str],
    ) -> Calculations {
        let (singles, multis) = {
            let indicators = self.indicators.read();
            let multi_indicators = self.multi_indicators.read();
            let mut singles: Vec<SingleEntry> = Vec::new();
            let mut multis: Vec<MultiEntry> = Vec::new();
            for &name in names {
                let single = indicators.get(name);
                let multi = multi_indicators.get(name);
                if let Some(ind) = single {
                    singles.push((name.to_string(), Arc::clone(ind)));
                }
                if let Some(ind) = multi {
                    multis.push((name.to_string(), Arc::clone(ind)));
                }
                if single.is_none() && multi.is_none() {
                    debug!(indicator = name, "skipping unregistered indicator");
                }
            }
            (singles, multis)
        };
        self.run_batch(token, candles, singles, multis)
    }

    fn check_single(&self, token: &CancelToken, candles: &[Candle]) -> Result<()> {
        if token.is_cancelled() {
            return Err(IndicatorError::Cancelled);
        }
        if self.config.validate_data {
            validate_candles(candles)?;
        }
        Ok(())
    }

    fn run_batch(
        &self,
        token: &CancelToken,
        candles: &[Candle],
        singles: Vec<SingleEntry>,
        multis: Vec<MultiEntry>,
    ) -> Calculations {
        if self.config.validate_data {
            if let Err(err) = validate_candles(candles) {
                debug!(error = %err, "rejecting batch with invalid candles");
                return Calculations::default();
            }
        }

        debug!(
            indicators = singles.len(),
            multi_indicators = multis.len(),
            candles = candles.len(),
            workers = self.workers(),
            "calculating batch"
        );

        let values = Mutex::new(HashMap::with_capacity(singles.len()));
        let multi_values = Mutex::new(HashMap::with_capacity(multis.len()));

        self.pool.scope(|s| {
            let values = &values;
            let multi_values = &multi_values;

            for (name, indicator) in singles {
                if token.is_cancelled() {
                    trace!(indicator = %name, "not dispatched, batch cancelled");
                    continue;
                }
                s.spawn(move |_| {
                    if token.is_cancelled() {
                        trace!(indicator = %name, "skipped, batch cancelled");
                        return;
                    }
                    match indicator.calculate(candles) {
                        Ok(series) => {
                            values.lock().insert(name, series);
                        }
                        Err(err) => debug!(indicator = %name, error = %err, "indicator failed"),
                    }
                });
            }

            for (name, indicator) in multis {
                if token.is_cancelled() {
                    trace!(indicator = %name, "not dispatched, batch cancelled");
                    continue;
                }
                s.spawn(move |_| {
                    if token.is_cancelled() {
                        trace!(indicator = %name, "skipped, batch cancelled");
                        return;
                    }
                    match indicator.calculate(candles) {
                        Ok(series) => {
                            multi_values.lock().insert(name, series);
                        }
                        Err(err) => debug!(indicator = %name, error = %err, "indicator failed"),
                    }
                });
            }
        });

        Calculations {
            values: values.into_inner(),
            multi_values: multi_values.into_inner(),
        }
    }
}

// ============================================================
// BUILDER
// ============================================================

/// Fluent construction of an [`Engine`]
#[derive(Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    indicators: Vec<SingleEntry>,
    multi_indicators: Vec<MultiEntry>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    pub fn validate_data(mut self, validate: bool) -> Self {
        self.config.validate_data = validate;
        self
    }

    pub fn indicator(
        mut self,
        name: impl Into<String>,
        indicator: impl Indicator + 'static,
    ) -> Self {
        self.indicators.push((name.into(), Arc::new(indicator)));
        self
    }

    pub fn multi_indicator(
        mut self,
        name: impl Into<String>,
        indicator: impl MultiValueIndicator + 'static,
    ) -> Self {
        self.multi_indicators.push((name.into(), Arc::new(indicator)));
        self
    }

    /// Add the default indicator set from [`crate::indicators`]
    pub fn with_all_defaults(mut self) -> Self {
        self.indicators.extend(
            default_indicators()
                .into_iter()
                .map(|(name, ind)| (name.to_string(), ind)),
        );
        self.multi_indicators.extend(
            default_multi_indicators()
                .into_iter()
                .map(|(name, ind)| (name.to_string(), ind)),
        );
        self
    }

    pub fn build(self) -> Result<Engine> {
        let engine = Engine::new(self.config)?;
        for (name, indicator) in self.indicators {
            engine.register_indicator(name, indicator);
        }
        for (name, indicator) in self.multi_indicators {
            engine.register_multi_indicator(name, indicator);
        }
        debug!(
            workers = engine.workers(),
            indicators = engine.indicators.read().len(),
            multi_indicators = engine.multi_indicators.read().len(),
            "engine built"
        );
        Ok(engine)
    }
}
