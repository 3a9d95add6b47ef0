//! Price level calculators: Fibonacci retracements and pivot points

pub mod fibonacci;
pub mod pivots;

pub use fibonacci::{FibLevel, FibonacciLevels, FibonacciRetracement, FIB_RATIOS};
pub use pivots::{PivotLevels, PivotMethod};
