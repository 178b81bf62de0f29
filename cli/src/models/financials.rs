use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label of the trailing EPS entry among the labelled facts
pub const EPS_FACT_LABEL: &str = "EPS (TTM)";

/// Financial data for one company as returned by a financials source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFacts {
    /// Labelled key facts, values kept as displayed by the provider
    #[serde(default)]
    pub facts: BTreeMap<String, String>,
    /// Free cash flow per fiscal period, oldest first
    #[serde(default, alias = "FCF_5Y")]
    pub fcf_series: Vec<f64>,
    /// Trailing earnings per share, unparsed
    #[serde(default)]
    pub eps: Option<String>,
}

impl RawFacts {
    /// The EPS field, falling back to the `EPS (TTM)` fact
    pub fn eps_field(&self) -> Option<&str> {
        self.eps
            .as_deref()
            .or_else(|| self.facts.get(EPS_FACT_LABEL).map(String::as_str))
    }

    /// Keep only the most recent `periods` cash-flow values
    pub fn truncate_series(&mut self, periods: usize) {
        if self.fcf_series.len() > periods {
            let excess = self.fcf_series.len() - periods;
            self.fcf_series.drain(..excess);
        }
    }
}
