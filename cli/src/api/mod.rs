//! High-level API for easy library usage
//!
//! This module provides the end-to-end valuation pipeline and its builder.

pub mod analyzer;
pub mod builder;

pub use analyzer::{ResolvedCompany, SensitivityReport, ValuationAnalyzer};
pub use builder::AnalyzerBuilder;
