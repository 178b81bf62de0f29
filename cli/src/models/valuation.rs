use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Company;

/// Which financial series feeds the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValuationMode {
    #[serde(rename = "fcf", alias = "FCF-based")]
    FreeCashFlow,
    #[serde(rename = "earnings", alias = "Earnings-based")]
    Earnings,
}

impl ValuationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationMode::FreeCashFlow => "fcf",
            ValuationMode::Earnings => "earnings",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ValuationMode::FreeCashFlow => "FCF-based",
            ValuationMode::Earnings => "Earnings-based",
        }
    }
}

impl Default for ValuationMode {
    fn default() -> Self {
        ValuationMode::FreeCashFlow
    }
}

impl fmt::Display for ValuationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fcf" | "cash-flow" | "cashflow" | "fcf-based" => Ok(ValuationMode::FreeCashFlow),
            "earnings" | "eps" | "earnings-based" => Ok(ValuationMode::Earnings),
            other => Err(format!("unknown valuation mode '{}': expected fcf or earnings", other)),
        }
    }
}

/// The three scalar parameters of one valuation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationParams {
    /// Fraction, e.g. 0.10 for 10%
    pub discount_rate: f64,
    /// Fraction, e.g. 0.03 for 3%
    pub terminal_rate: f64,
    pub years: usize,
}

impl ValuationParams {
    pub fn new(discount_rate: f64, terminal_rate: f64, years: usize) -> Self {
        Self {
            discount_rate,
            terminal_rate,
            years,
        }
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    pub fn with_terminal_rate(mut self, terminal_rate: f64) -> Self {
        self.terminal_rate = terminal_rate;
        self
    }

    pub fn with_years(mut self, years: usize) -> Self {
        self.years = years;
        self
    }
}

impl Default for ValuationParams {
    fn default() -> Self {
        Self::new(0.10, 0.03, 5)
    }
}

/// A series plus the parameters it is valued under.
///
/// Earnings mode builds one of these from a projected EPS series instead of an
/// observed one; the engine treats both identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInput {
    /// One value per fiscal period, oldest first
    pub series: Vec<f64>,
    pub params: ValuationParams,
}

impl ValuationInput {
    pub fn new(series: Vec<f64>, params: ValuationParams) -> Self {
        Self { series, params }
    }
}

/// The two components of an intrinsic value estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationBreakdown {
    pub present_value_sum: f64,
    pub terminal_value: f64,
}

impl ValuationBreakdown {
    pub fn total(&self) -> f64 {
        self.present_value_sum + self.terminal_value
    }
}

/// Outcome of valuing one company under one set of parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationReport {
    pub company: Company,
    pub mode: ValuationMode,
    pub params: ValuationParams,
    /// Series actually handed to the engine (observed or projected)
    pub series: Vec<f64>,
    pub breakdown: ValuationBreakdown,
    pub value: f64,
    pub unit: String,
    pub formatted: String,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("fcf".parse::<ValuationMode>().unwrap(), ValuationMode::FreeCashFlow);
        assert_eq!("Earnings".parse::<ValuationMode>().unwrap(), ValuationMode::Earnings);
        assert_eq!("FCF-based".parse::<ValuationMode>().unwrap(), ValuationMode::FreeCashFlow);
        assert!("dividends".parse::<ValuationMode>().is_err());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&ValuationMode::Earnings).unwrap();
        assert_eq!(json, "\"earnings\"");
        let mode: ValuationMode = serde_json::from_str("\"fcf\"").unwrap();
        assert_eq!(mode, ValuationMode::FreeCashFlow);
    }

    #[test]
    fn test_breakdown_total() {
        let breakdown = ValuationBreakdown {
            present_value_sum: 379.08,
            terminal_value: 913.66,
        };
        assert!((breakdown.total() - 1292.74).abs() < 1e-9);
    }

    #[test]
    fn test_params_builder_methods() {
        let params = ValuationParams::default()
            .with_discount_rate(0.12)
            .with_terminal_rate(0.04)
            .with_years(7);
        assert_eq!(params, ValuationParams::new(0.12, 0.04, 7));
    }
}
