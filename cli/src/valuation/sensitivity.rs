use serde::{Deserialize, Serialize};

use super::engine::ValuationEngine;
use super::projection::EarningsProjector;
use crate::error::ValuationError;

/// Inclusive range of whole percentages, e.g. 5..=15 step 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentRange {
    pub min: u32,
    pub max: u32,
    #[serde(default = "default_step")]
    pub step: u32,
}

fn default_step() -> u32 {
    1
}

impl PercentRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max, step: 1 }
    }

    /// Each percentage in the range as a fraction
    pub fn fractions(&self) -> Vec<f64> {
        let step = self.step.max(1) as usize;
        (self.min..=self.max)
            .step_by(step)
            .map(|pct| pct as f64 / 100.0)
            .collect()
    }
}

/// Where the swept series comes from.
#[derive(Debug, Clone, Copy)]
pub enum SweepSeries<'a> {
    /// An observed series, valued as-is for every pair
    Observed(&'a [f64]),
    /// A trailing EPS, re-projected at each terminal rate
    Earnings(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCell {
    pub discount_rate: f64,
    pub terminal_rate: f64,
    pub value: Option<f64>,
    pub error: Option<String>,
}

/// Intrinsic values over a grid of discount and terminal rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub years: usize,
    pub discount_rates: Vec<f64>,
    pub terminal_rates: Vec<f64>,
    /// One row per discount rate, one column per terminal rate
    pub rows: Vec<Vec<SensitivityCell>>,
}

impl SensitivityGrid {
    pub fn cell(&self, discount_idx: usize, terminal_idx: usize) -> Option<&SensitivityCell> {
        self.rows.get(discount_idx).and_then(|row| row.get(terminal_idx))
    }

    pub fn valid_cells(&self) -> impl Iterator<Item = &SensitivityCell> {
        self.rows.iter().flatten().filter(|c| c.value.is_some())
    }
}

/// Value every (discount, terminal) pair at a fixed horizon.
///
/// Pairs where the terminal rate is not below the discount rate become cells
/// carrying the failure message; any other failure aborts the sweep since it
/// would repeat in every cell.
pub fn sweep(
    engine: &ValuationEngine,
    series: SweepSeries<'_>,
    discount_rates: &[f64],
    terminal_rates: &[f64],
    years: usize,
) -> Result<SensitivityGrid, ValuationError> {
    let mut rows = Vec::with_capacity(discount_rates.len());

    for &discount_rate in discount_rates {
        let mut row = Vec::with_capacity(terminal_rates.len());
        for &terminal_rate in terminal_rates {
            let projected;
            let values: &[f64] = match series {
                SweepSeries::Observed(values) => values,
                SweepSeries::Earnings(eps) => {
                    projected = EarningsProjector.project(eps, terminal_rate, years)?;
                    &projected
                }
            };

            let cell = match engine.compute(values, discount_rate, terminal_rate, years) {
                Ok(value) => SensitivityCell {
                    discount_rate,
                    terminal_rate,
                    value: Some(value),
                    error: None,
                },
                Err(e @ ValuationError::InvalidRateRelation { .. }) => SensitivityCell {
                    discount_rate,
                    terminal_rate,
                    value: None,
                    error: Some(e.user_message().to_string()),
                },
                Err(e) => return Err(e),
            };
            row.push(cell);
        }
        rows.push(row);
    }

    Ok(SensitivityGrid {
        years,
        discount_rates: discount_rates.to_vec(),
        terminal_rates: terminal_rates.to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::engine::compute;

    #[test]
    fn test_percent_range_fractions() {
        let range = PercentRange::new(5, 8);
        assert_eq!(range.fractions(), vec![0.05, 0.06, 0.07, 0.08]);

        let stepped = PercentRange { min: 1, max: 6, step: 2 };
        assert_eq!(stepped.fractions(), vec![0.01, 0.03, 0.05]);
    }

    #[test]
    fn test_sweep_marks_invalid_pairs() {
        let series = [100.0; 5];
        let grid = sweep(
            &ValuationEngine::default(),
            SweepSeries::Observed(&series),
            &[0.05, 0.10],
            &[0.03, 0.06],
            5,
        )
        .unwrap();

        assert_eq!(grid.rows.len(), 2);
        let invalid = grid.cell(0, 1).unwrap();
        assert!(invalid.value.is_none());
        assert_eq!(invalid.error.as_deref(), Some("Terminal growth rate must be below discount rate."));

        let reference = grid.cell(1, 0).unwrap().value.unwrap();
        assert!((reference - 1292.74).abs() < 1e-2);
        assert_eq!(grid.valid_cells().count(), 3);
    }

    #[test]
    fn test_sweep_values_decrease_down_each_column() {
        let series = [80.0, 90.0, 100.0, 110.0, 120.0];
        let discount: Vec<f64> = PercentRange::new(7, 15).fractions();
        let grid = sweep(
            &ValuationEngine::default(),
            SweepSeries::Observed(&series),
            &discount,
            &[0.02, 0.04],
            5,
        )
        .unwrap();

        for col in 0..2 {
            let column: Vec<f64> = grid.rows.iter().map(|row| row[col].value.unwrap()).collect();
            assert!(column.windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[test]
    fn test_earnings_sweep_reprojects_per_terminal_rate() {
        let grid = sweep(
            &ValuationEngine::default(),
            SweepSeries::Earnings(10.0),
            &[0.10],
            &[0.02, 0.04],
            3,
        )
        .unwrap();

        let expected = compute(&EarningsProjector.project(10.0, 0.04, 3).unwrap(), 0.10, 0.04, 3).unwrap();
        assert_eq!(grid.cell(0, 1).unwrap().value, Some(expected));
    }

    #[test]
    fn test_sweep_aborts_on_insufficient_data() {
        let err = sweep(
            &ValuationEngine::default(),
            SweepSeries::Observed(&[1.0, 2.0]),
            &[0.10],
            &[0.03],
            5,
        )
        .unwrap_err();
        assert!(matches!(err, ValuationError::InsufficientData { .. }));
    }
}
