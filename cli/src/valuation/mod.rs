//! Valuation math: the reverse DCF engine, the earnings projector that feeds
//! it in earnings mode, and parameter sweeps over both.

pub mod engine;
pub mod projection;
pub mod sensitivity;

pub use engine::{compute, ValuationAssumptions, ValuationEngine};
pub use projection::{parse_eps, EarningsProjector, MAX_PROJECTION_YEARS};
pub use sensitivity::{sweep, PercentRange, SensitivityCell, SensitivityGrid, SweepSeries};
