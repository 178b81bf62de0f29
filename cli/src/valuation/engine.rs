//! Reverse discounted-cash-flow engine.
//!
//! Given a series of per-period values, a discount rate `r`, a terminal growth
//! rate `g` and a horizon of `years`, the engine:
//!
//! 1. fails with [`ValuationError::InsufficientData`] when the series is shorter
//!    than the horizon,
//! 2. keeps the last `years` values,
//! 3. discounts value `i` (0-based, oldest first) by `(1 + r)^(i + 1)`,
//! 4. adds a Gordon-growth terminal value `last * (1 + g) / (r - g)` discounted
//!    by `(1 + r)^years`.
//!
//! Under the default assumptions the retained window of *trailing* periods is
//! read as the *forward* forecast: the oldest retained period is one year out
//! and the newest is `years` out.

use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::models::{ValuationBreakdown, ValuationInput, ValuationParams};

/// Modelling assumptions that change how a series is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationAssumptions {
    /// Read the trailing window as the forward forecast. When false, the
    /// forecast is the latest observed value grown at the terminal rate.
    #[serde(default = "default_true")]
    pub treat_trailing_as_forward: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        Self {
            treat_trailing_as_forward: true,
        }
    }
}

/// Stateless valuation engine; every call is independent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValuationEngine {
    assumptions: ValuationAssumptions,
}

impl ValuationEngine {
    pub fn new(assumptions: ValuationAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> ValuationAssumptions {
        self.assumptions
    }

    /// Intrinsic value implied by `series`, in the series' unit.
    pub fn compute(
        &self,
        series: &[f64],
        discount_rate: f64,
        terminal_rate: f64,
        years: usize,
    ) -> Result<f64, ValuationError> {
        self.compute_breakdown(series, discount_rate, terminal_rate, years)
            .map(|b| b.total())
    }

    pub fn compute_input(&self, input: &ValuationInput) -> Result<f64, ValuationError> {
        let ValuationParams {
            discount_rate,
            terminal_rate,
            years,
        } = input.params;
        self.compute(&input.series, discount_rate, terminal_rate, years)
    }

    /// Same as [`compute`](Self::compute) but keeps the present-value and
    /// terminal-value components apart.
    pub fn compute_breakdown(
        &self,
        series: &[f64],
        discount_rate: f64,
        terminal_rate: f64,
        years: usize,
    ) -> Result<ValuationBreakdown, ValuationError> {
        if series.len() < years {
            return Err(ValuationError::InsufficientData {
                required: years,
                available: series.len(),
            });
        }

        validate_scalars(discount_rate, terminal_rate, years)?;

        let window = &series[series.len() - years..];
        if let Some(pos) = window.iter().position(|v| !v.is_finite()) {
            return Err(ValuationError::malformed(
                "series",
                format!("value at period {} is not finite", series.len() - years + pos),
            ));
        }

        if discount_rate <= terminal_rate {
            return Err(ValuationError::InvalidRateRelation {
                discount_rate,
                terminal_rate,
            });
        }

        let forecast: Vec<f64> = if self.assumptions.treat_trailing_as_forward {
            window.to_vec()
        } else {
            let latest = window[years - 1];
            (1..=years)
                .map(|i| latest * (1.0 + terminal_rate).powi(i as i32))
                .collect()
        };

        Ok(discount(&forecast, discount_rate, terminal_rate))
    }
}

/// Convenience wrapper using the default assumptions.
pub fn compute(
    series: &[f64],
    discount_rate: f64,
    terminal_rate: f64,
    years: usize,
) -> Result<f64, ValuationError> {
    ValuationEngine::default().compute(series, discount_rate, terminal_rate, years)
}

fn validate_scalars(discount_rate: f64, terminal_rate: f64, years: usize) -> Result<(), ValuationError> {
    if years == 0 {
        return Err(ValuationError::malformed("years", "forecast horizon must be at least one year"));
    }
    if !discount_rate.is_finite() {
        return Err(ValuationError::malformed("discount_rate", "not a finite number"));
    }
    if !terminal_rate.is_finite() {
        return Err(ValuationError::malformed("terminal_rate", "not a finite number"));
    }
    if discount_rate <= -1.0 {
        return Err(ValuationError::malformed("discount_rate", "discount factor base 1 + r must be positive"));
    }
    Ok(())
}

// `forecast` is non-empty and r > g has been checked
fn discount(forecast: &[f64], discount_rate: f64, terminal_rate: f64) -> ValuationBreakdown {
    let base = 1.0 + discount_rate;

    let present_value_sum: f64 = forecast
        .iter()
        .enumerate()
        .map(|(i, value)| value / base.powi(i as i32 + 1))
        .sum();

    let years = forecast.len() as i32;
    let last = forecast[forecast.len() - 1];
    let terminal_raw = last * (1.0 + terminal_rate) / (discount_rate - terminal_rate);
    let terminal_value = terminal_raw / base.powi(years);

    ValuationBreakdown {
        present_value_sum,
        terminal_value,
    }
}
