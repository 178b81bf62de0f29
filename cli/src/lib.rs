//! # rdcf - Reverse DCF Valuation
//!
//! Estimates a company's intrinsic value from a series of free-cash-flow or
//! projected earnings figures, a discount rate, a terminal growth rate and a
//! forecast horizon:
//! - Pure discounting and terminal-value engine with typed failures
//! - Earnings projection from a trailing EPS figure
//! - Sensitivity grids over discount and terminal rates
//! - Pluggable company-name resolution and financials sources
//!
//! ## Quick Start
//!
//! ```rust
//! use rdcf::valuation::compute;
//!
//! let value = compute(&[100.0; 5], 0.10, 0.03, 5).unwrap();
//! assert!((value - 1292.74).abs() < 1e-2);
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod valuation;

// Prelude for convenient imports
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use rdcf::prelude::*;
    //! ```

    pub use crate::api::{AnalyzerBuilder, ValuationAnalyzer};
    pub use crate::config::Settings;
    pub use crate::error::{FetchError, RdcfError, ValuationError};
    pub use crate::models::{Company, CompanyDirectory, RawFacts, ValuationMode, ValuationParams, ValuationReport};
    pub use crate::services::{FinancialsSource, FuzzyResolver, NameResolver};
    pub use crate::valuation::{compute, EarningsProjector, ValuationAssumptions, ValuationEngine};
}

pub use utils::{init_logger, Logger, Timer};
