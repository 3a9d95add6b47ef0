//! Parameter metadata for indicators
//!
//! Every indicator publishes the parameters it accepts, so callers can:
//! - build an indicator from a plain `name -> value` map
//! - sweep a parameter grid when tuning
//! - render a configuration form
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use chartsense::params::ParameterizedIndicator;
//! use chartsense::prelude::*;
//!
//! for param in BollingerBands::param_meta() {
//!     println!("{}: {:?} (default: {})", param.name, param.param_type, param.default);
//! }
//!
//! let params = HashMap::from([("period", 10.0), ("multiplier", 2.5)]);
//! let bands = BollingerBands::with_params(&params).unwrap();
//! assert_eq!(bands.period, 10);
//! ```

use std::collections::HashMap;

use crate::{IndicatorError, Period, Ratio, Result};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Ratio value in 0.0..=1.0
    Ratio,
    /// Period value (positive integer)
    Period,
    /// Unbounded finite value, e.g. a band multiplier
    Value,
}

/// Metadata for a single indicator parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
    /// Parameter name (e.g., "multiplier")
    pub name: &'static str,
    pub param_type: ParamType,
    pub default: f64,
    /// Range for optimization: (min, max, step)
    pub range: (f64, f64, f64),
    pub description: &'static str,
}

impl ParamMeta {
    pub const fn ratio(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Ratio,
            default,
            range,
            description,
        }
    }

    pub const fn period(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Period,
            default,
            range,
            description,
        }
    }

    pub const fn value(
        name: &'static str,
        default: f64,
        range: (f64, f64, f64),
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type: ParamType::Value,
            default,
            range,
            description,
        }
    }

    /// Generate all values for grid search
    pub fn generate_grid(&self) -> Vec<f64> {
        let (min, max, step) = self.range;
        if step <= 0.0 {
            return vec![min];
        }
        let mut values = Vec::new();
        let mut v = min;
        while v <= max + f64::EPSILON {
            values.push(v);
            v += step;
        }
        values
    }

    /// Validate a value for this parameter
    pub fn validate(&self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(IndicatorError::InvalidValue("parameter must be finite"));
        }
        let (min, max, _) = self.range;
        if value < min || value > max {
            return Err(IndicatorError::OutOfRange {
                field: self.name,
                value,
                min,
                max,
            });
        }
        match self.param_type {
            ParamType::Ratio => Ratio::new(value).map(|_| ()),
            ParamType::Period => {
                if value < 1.0 || value.fract() != 0.0 {
                    return Err(IndicatorError::InvalidValue(
                        "Period must be a positive integer",
                    ));
                }
                Ok(())
            }
            ParamType::Value => Ok(()),
        }
    }
}

// ============================================================
// PARAMETERIZED INDICATOR TRAIT
// ============================================================

/// Indicators that can be discovered and built from parameter maps
pub trait ParameterizedIndicator: Sized {
    /// Metadata for all configurable parameters
    fn param_meta() -> &'static [ParamMeta];

    /// Build with parameters from a map. Missing parameters use their defaults.
    fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

    /// Stable lowercase kind, e.g. `"rsi"`
    fn kind() -> &'static str;

    /// Build with every parameter at its default
    fn from_defaults() -> Result<Self> {
        let params: HashMap<&str, f64> = Self::param_meta()
            .iter()
            .map(|meta| (meta.name, meta.default))
            .collect();
        Self::with_params(&params)
    }
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

/// Get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
    let value = params.get(key).copied().unwrap_or(default);
    Ratio::new(value)
}

/// Get a Period from params with default fallback. Negative or NaN values map to zero and fail.
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
    let value = params.get(key).copied().unwrap_or(default as f64);
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(IndicatorError::InvalidValue("Period must be a positive integer"));
    }
    Period::new(value as usize)
}

/// Get a finite value from params with default fallback
pub fn get_value(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
    let value = params.get(key).copied().unwrap_or(default);
    if !value.is_finite() {
        return Err(IndicatorError::InvalidValue("parameter must be finite"));
    }
    Ok(value)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_meta_period() {
        let meta = ParamMeta::period("period", 14.0, (10.0, 20.0, 2.0), "Lookback");

        assert_eq!(meta.name, "period");
        assert_eq!(meta.param_type, ParamType::Period);
        assert_eq!(meta.default, 14.0);
    }

    #[test]
    fn test_generate_grid() {
        let meta = ParamMeta::value("multiplier", 2.0, (1.5, 2.5, 0.5), "Band width");

        let grid = meta.generate_grid();
        assert_eq!(grid.len(), 3);
        assert!((grid[0] - 1.5).abs() < f64::EPSILON);
        assert!((grid[1] - 2.0).abs() < f64::EPSILON);
        assert!((grid[2] - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_generate_grid_zero_step() {
        let meta = ParamMeta::value("x", 1.0, (1.0, 5.0, 0.0), "Fixed");
        assert_eq!(meta.generate_grid(), vec![1.0]);
    }

    #[test]
    fn test_validate_ratio() {
        let meta = ParamMeta::ratio("tolerance", 0.02, (0.0, 0.1, 0.01), "Equality tolerance");

        assert!(meta.validate(0.05).is_ok());
        assert!(meta.validate(0.2).is_err());
        assert!(meta.validate(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_period() {
        let meta = ParamMeta::period("period", 14.0, (10.0, 20.0, 2.0), "Lookback");

        assert!(meta.validate(14.0).is_ok());
        assert!(meta.validate(10.0).is_ok());
        assert!(meta.validate(20.0).is_ok());
        assert!(meta.validate(12.5).is_err());
        assert!(meta.validate(8.0).is_err());
        assert!(meta.validate(22.0).is_err());
    }

    #[test]
    fn test_get_ratio_helper() {
        let params = HashMap::from([("key1", 0.8)]);

        assert!((get_ratio(&params, "key1", 0.5).unwrap().get() - 0.8).abs() < f64::EPSILON);
        assert!((get_ratio(&params, "key2", 0.5).unwrap().get() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_get_period_helper() {
        let params = HashMap::from([("key1", 20.0), ("neg", -3.0)]);

        assert_eq!(get_period(&params, "key1", 14).unwrap().get(), 20);
        assert_eq!(get_period(&params, "key2", 14).unwrap().get(), 14);
        assert!(get_period(&params, "neg", 14).is_err());
    }

    #[test]
    fn test_get_period_rejects_fraction() {
        let params = HashMap::from([("frac", 14.7), ("zero", 0.0), ("nan", f64::NAN)]);

        assert!(matches!(
            get_period(&params, "frac", 14),
            Err(IndicatorError::InvalidValue(_))
        ));
        assert!(matches!(
            get_period(&params, "zero", 14),
            Err(IndicatorError::InvalidPeriod { .. })
        ));
        assert!(get_period(&params, "nan", 14).is_err());
    }

    #[test]
    fn test_get_value_helper() {
        let params = HashMap::from([("mult", 2.5), ("bad", f64::INFINITY)]);

        assert_eq!(get_value(&params, "mult", 2.0).unwrap(), 2.5);
        assert_eq!(get_value(&params, "missing", 2.0).unwrap(), 2.0);
        assert!(get_value(&params, "bad", 2.0).is_err());
    }
}
