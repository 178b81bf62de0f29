use regex::Regex;
use std::sync::OnceLock;

use crate::error::ValuationError;

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("EPS pattern is valid"))
}

/// Longest horizon the projector will build a series for
pub const MAX_PROJECTION_YEARS: usize = 1_000;

/// Builds the synthetic earnings series used in earnings mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarningsProjector;

impl EarningsProjector {
    /// `eps * (1 + terminal_rate)^i` for `i` in `0..years`
    pub fn project(&self, eps: f64, terminal_rate: f64, years: usize) -> Result<Vec<f64>, ValuationError> {
        if !eps.is_finite() {
            return Err(ValuationError::malformed("eps", "not a finite number"));
        }
        if !terminal_rate.is_finite() {
            return Err(ValuationError::malformed("terminal_rate", "not a finite number"));
        }
        if years > MAX_PROJECTION_YEARS {
            return Err(ValuationError::malformed(
                "years",
                format!("projection horizon is limited to {} years", MAX_PROJECTION_YEARS),
            ));
        }

        let growth = 1.0 + terminal_rate;
        let mut series = Vec::with_capacity(years);
        let mut factor = 1.0;
        for _ in 0..years {
            series.push(eps * factor);
            factor *= growth;
        }
        Ok(series)
    }

    /// Parse and project a raw EPS field in one step.
    pub fn project_raw(
        &self,
        raw: Option<&str>,
        currency_symbol: &str,
        terminal_rate: f64,
        years: usize,
    ) -> Result<Vec<f64>, ValuationError> {
        let raw = raw.ok_or_else(|| ValuationError::malformed("eps", "EPS field missing"))?;
        let eps = parse_eps(raw, currency_symbol)?;
        self.project(eps, terminal_rate, years)
    }
}

/// Parse a provider EPS string such as `"₹ 1,234.50"`.
///
/// Surrounding whitespace, the configured currency symbol and thousands
/// separators are removed; what remains must be a plain decimal number.
pub fn parse_eps(raw: &str, currency_symbol: &str) -> Result<f64, ValuationError> {
    let mut cleaned = raw.trim();
    if !currency_symbol.is_empty() {
        if let Some(rest) = cleaned.strip_prefix(currency_symbol) {
            cleaned = rest.trim_start();
        }
    }
    let cleaned = cleaned.replace(',', "");

    if !decimal_pattern().is_match(&cleaned) {
        return Err(ValuationError::malformed(
            "eps",
            format!("{:?} is not a plain decimal number", raw),
        ));
    }

    cleaned
        .parse::<f64>()
        .map_err(|e| ValuationError::malformed("eps", e.to_string()))
}
