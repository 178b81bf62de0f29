use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{RdcfError, Result};
use crate::models::{ValuationMode, ValuationParams};
use crate::valuation::{PercentRange, ValuationAssumptions};

/// Unit labels shown next to a formatted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLabels {
    pub cash_flow: String,
    pub per_share: String,
}

impl UnitLabels {
    pub fn for_mode(&self, mode: ValuationMode) -> &str {
        match mode {
            ValuationMode::FreeCashFlow => &self.cash_flow,
            ValuationMode::Earnings => &self.per_share,
        }
    }
}

impl Default for UnitLabels {
    fn default() -> Self {
        Self {
            cash_flow: "Cr".to_string(),
            per_share: "₹/share".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: usize,
    pub max: usize,
}

impl YearRange {
    pub fn contains(&self, years: usize) -> bool {
        years >= self.min && years <= self.max
    }
}

/// Ranges offered to interactive users (slider bounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterRanges {
    pub discount_rate_pct: PercentRange,
    pub terminal_rate_pct: PercentRange,
    pub years: YearRange,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            discount_rate_pct: PercentRange::new(5, 15),
            terminal_rate_pct: PercentRange::new(1, 6),
            years: YearRange { min: 3, max: 10 },
        }
    }
}

/// Library-wide settings; every field has a default so a YAML file only
/// needs to list what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub defaults: ValuationParams,
    pub ranges: ParameterRanges,
    /// A resolved name is accepted only when its score is above this
    pub min_match_score: u8,
    pub units: UnitLabels,
    /// Stripped from EPS fields before parsing
    pub currency_symbol: String,
    /// Number of most recent cash-flow periods kept from a fetch
    pub fcf_periods: usize,
    /// 0 disables the on-disk financials cache
    pub cache_ttl_secs: u64,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub assumptions: ValuationAssumptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            defaults: ValuationParams::default(),
            ranges: ParameterRanges::default(),
            min_match_score: 70,
            units: UnitLabels::default(),
            currency_symbol: "₹".to_string(),
            fcf_periods: 5,
            cache_ttl_secs: 3600,
            user_agent: "Mozilla/5.0".to_string(),
            request_timeout_secs: 30,
            assumptions: ValuationAssumptions::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let settings: Settings =
            serde_yaml::from_str(content).map_err(|e| RdcfError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RdcfError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let settings = Self::from_yaml_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fcf_periods == 0 {
            return Err(RdcfError::Config("fcf_periods must be at least 1".to_string()));
        }
        if self.min_match_score > 100 {
            return Err(RdcfError::Config("min_match_score must be within 0..=100".to_string()));
        }
        let ranges = &self.ranges;
        if ranges.discount_rate_pct.min > ranges.discount_rate_pct.max
            || ranges.terminal_rate_pct.min > ranges.terminal_rate_pct.max
            || ranges.years.min > ranges.years.max
        {
            return Err(RdcfError::Config("parameter range min exceeds max".to_string()));
        }
        Ok(())
    }

    pub fn unit_for(&self, mode: ValuationMode) -> &str {
        self.units.for_mode(mode)
    }
}
