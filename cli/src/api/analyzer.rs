//! End-to-end valuation: resolve a company, fetch its financials, build the
//! series for the chosen mode and run the engine.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Settings;
use crate::error::{FetchError, Result, ValuationError};
use crate::models::{
    Company, CompanyDirectory, RawFacts, ValuationBreakdown, ValuationMode, ValuationParams,
    ValuationReport,
};
use crate::services::{FinancialsSource, FuzzyResolver, NameResolver};
use crate::utils::{format_rate, format_value, Logger, Timer};
use crate::valuation::{
    parse_eps, sweep, EarningsProjector, SensitivityGrid, SweepSeries, ValuationEngine,
};

/// A company together with its match score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCompany {
    #[serde(flatten)]
    pub company: Company,
    pub score: u8,
}

/// Sensitivity grid for one company and mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub company: Company,
    pub mode: ValuationMode,
    pub unit: String,
    pub grid: SensitivityGrid,
}

/// High-level entry point tying the directory, resolver, financials source
/// and engine together. Holds no per-request state.
pub struct ValuationAnalyzer {
    directory: Arc<CompanyDirectory>,
    resolver: Box<dyn NameResolver>,
    source: Arc<dyn FinancialsSource>,
    engine: ValuationEngine,
    settings: Settings,
    logger: Logger,
}

impl ValuationAnalyzer {
    pub fn new(
        directory: Arc<CompanyDirectory>,
        source: Arc<dyn FinancialsSource>,
        settings: Settings,
    ) -> Self {
        Self {
            directory,
            resolver: Box::new(FuzzyResolver),
            source,
            engine: ValuationEngine::new(settings.assumptions),
            settings,
            logger: Logger::new("ANALYZER"),
        }
    }

    pub fn with_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_boxed_resolver(mut self, resolver: Box<dyn NameResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn directory(&self) -> &CompanyDirectory {
        &self.directory
    }

    pub fn engine(&self) -> &ValuationEngine {
        &self.engine
    }

    /// Resolve a free-text company name against the directory
    pub fn resolve(&self, query: &str) -> Result<ResolvedCompany> {
        let (company, score) =
            self.directory
                .resolve(self.resolver.as_ref(), query, self.settings.min_match_score)?;
        Ok(ResolvedCompany { company, score })
    }

    pub async fn fetch(&self, company: &Company) -> Result<RawFacts> {
        let timer = Timer::start(&format!("{} fetch", company.identifier));
        let facts = self.source.fetch_financials(&company.identifier).await?;
        self.logger.debug(&format!(
            "Fetched {} via {} source: {} facts, {} cash-flow periods",
            company.identifier,
            self.source.name(),
            facts.facts.len(),
            facts.fcf_series.len()
        ));
        timer.log_elapsed();
        Ok(facts)
    }

    /// Value a raw numeric series directly
    pub fn compute_series(
        &self,
        series: &[f64],
        params: ValuationParams,
    ) -> std::result::Result<ValuationBreakdown, ValuationError> {
        self.engine
            .compute_breakdown(series, params.discount_rate, params.terminal_rate, params.years)
    }

    /// Value already-fetched facts; no I/O
    pub fn value_facts(
        &self,
        company: &Company,
        facts: &RawFacts,
        mode: ValuationMode,
        params: ValuationParams,
    ) -> Result<ValuationReport> {
        self.check_years(params.years)?;
        let series = self.series_for(company, facts, mode, params)?;
        let breakdown = self.compute_series(&series, params)?;
        let value = breakdown.total();
        let unit = self.settings.unit_for(mode).to_string();

        self.logger.info(&format!(
            "📈 {} [{}] r={} g={} years={} -> {}",
            company.name,
            mode.display_name(),
            format_rate(params.discount_rate),
            format_rate(params.terminal_rate),
            params.years,
            format_value(value, &unit)
        ));

        Ok(ValuationReport {
            company: company.clone(),
            mode,
            params,
            series,
            breakdown,
            value,
            formatted: format_value(value, &unit),
            unit,
            computed_at: chrono::Utc::now(),
        })
    }

    pub async fn value(
        &self,
        company: &Company,
        mode: ValuationMode,
        params: ValuationParams,
    ) -> Result<ValuationReport> {
        self.check_years(params.years)?;
        let facts = self.fetch(company).await?;
        self.value_facts(company, &facts, mode, params)
    }

    pub async fn value_query(
        &self,
        query: &str,
        mode: ValuationMode,
        params: ValuationParams,
    ) -> Result<ValuationReport> {
        let resolved = self.resolve(query)?;
        self.value(&resolved.company, mode, params).await
    }

    /// Sweep the configured discount and terminal rate ranges at `years`
    pub async fn sensitivity(
        &self,
        company: &Company,
        mode: ValuationMode,
        years: usize,
    ) -> Result<SensitivityReport> {
        self.check_years(years)?;
        let facts = self.fetch(company).await?;
        self.sensitivity_facts(company, &facts, mode, years)
    }

    pub fn sensitivity_facts(
        &self,
        company: &Company,
        facts: &RawFacts,
        mode: ValuationMode,
        years: usize,
    ) -> Result<SensitivityReport> {
        self.check_years(years)?;
        let discount_rates = self.settings.ranges.discount_rate_pct.fractions();
        let terminal_rates = self.settings.ranges.terminal_rate_pct.fractions();

        let series = match mode {
            ValuationMode::FreeCashFlow => SweepSeries::Observed(self.fcf_series(company, facts)?),
            ValuationMode::Earnings => SweepSeries::Earnings(self.eps(facts)?),
        };
        let grid = sweep(&self.engine, series, &discount_rates, &terminal_rates, years)?;

        Ok(SensitivityReport {
            company: company.clone(),
            mode,
            unit: self.settings.unit_for(mode).to_string(),
            grid,
        })
    }

    /// Horizons outside the configured year range are rejected before any
    /// series is built
    fn check_years(&self, years: usize) -> std::result::Result<(), ValuationError> {
        let range = self.settings.ranges.years;
        if range.contains(years) {
            Ok(())
        } else {
            Err(ValuationError::malformed(
                "years",
                format!("horizon must be within {}..={} years", range.min, range.max),
            ))
        }
    }

    fn series_for(
        &self,
        company: &Company,
        facts: &RawFacts,
        mode: ValuationMode,
        params: ValuationParams,
    ) -> Result<Vec<f64>> {
        match mode {
            ValuationMode::FreeCashFlow => Ok(self.fcf_series(company, facts)?.to_vec()),
            ValuationMode::Earnings => {
                let eps = self.eps(facts)?;
                Ok(EarningsProjector.project(eps, params.terminal_rate, params.years)?)
            }
        }
    }

    fn fcf_series<'a>(&self, company: &Company, facts: &'a RawFacts) -> Result<&'a [f64]> {
        if facts.fcf_series.is_empty() {
            self.logger.warn(&format!("FCF data not available for {}", company.identifier));
            return Err(FetchError::unavailable(&company.identifier, "FCF data not available").into());
        }
        Ok(&facts.fcf_series)
    }

    fn eps(&self, facts: &RawFacts) -> Result<f64> {
        let raw = facts
            .eps_field()
            .ok_or_else(|| ValuationError::malformed("eps", "EPS field missing"))?;
        Ok(parse_eps(raw, &self.settings.currency_symbol)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RdcfError;
    use crate::models::EPS_FACT_LABEL;
    use crate::services::InMemoryFinancialsSource;
    use crate::valuation::compute;

    fn analyzer() -> ValuationAnalyzer {
        let directory = CompanyDirectory::new(vec![
            Company::new("Tata Consultancy Services", "TCS"),
            Company::new("Infosys", "INFY"),
            Company::new("Reliance Industries", "RELIANCE"),
        ]);

        let mut infy = RawFacts {
            fcf_series: vec![100.0; 5],
            ..Default::default()
        };
        infy.facts.insert(EPS_FACT_LABEL.to_string(), "₹ 10".to_string());

        let tcs = RawFacts {
            fcf_series: vec![],
            eps: Some("not available".to_string()),
            ..Default::default()
        };

        let source = InMemoryFinancialsSource::new()
            .with("INFY", infy)
            .with("TCS", tcs);

        ValuationAnalyzer::new(Arc::new(directory), Arc::new(source), Settings::default())
    }

    #[tokio::test]
    async fn test_fcf_valuation_reference_value() {
        let report = analyzer()
            .value_query("infosys", ValuationMode::FreeCashFlow, ValuationParams::default())
            .await
            .unwrap();

        assert_eq!(report.company.identifier, "INFY");
        assert!((report.value - 1292.74).abs() < 1e-2);
        assert_eq!(report.formatted, "1292.74 Cr");
        assert_eq!(report.unit, "Cr");
    }

    #[tokio::test]
    async fn test_earnings_valuation_uses_projection() {
        let params = ValuationParams::new(0.10, 0.03, 3);
        let report = analyzer()
            .value_query("Infosys", ValuationMode::Earnings, params)
            .await
            .unwrap();

        let expected = compute(&[10.0, 10.3, 10.609], 0.10, 0.03, 3).unwrap();
        assert!((report.value - expected).abs() < 1e-9);
        assert_eq!(report.series.len(), 3);
        assert!(report.formatted.ends_with("₹/share"));
    }

    #[tokio::test]
    async fn test_horizon_beyond_fetched_periods() {
        let params = ValuationParams::default().with_years(8);
        let err = analyzer()
            .value_query("Infosys", ValuationMode::FreeCashFlow, params)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RdcfError::Valuation(ValuationError::InsufficientData {
                required: 8,
                available: 5
            })
        ));
    }

    #[test]
    fn test_horizon_outside_year_range_is_rejected_before_projection() {
        let analyzer = analyzer();
        let company = Company::new("Infosys", "INFY");
        let mut facts = RawFacts::default();
        facts.eps = Some("10".to_string());

        for years in [0, 2, 11, 1_000_000_000, usize::MAX] {
            let params = ValuationParams::new(0.10, 0.03, years);
            let err = analyzer
                .value_facts(&company, &facts, ValuationMode::Earnings, params)
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    RdcfError::Valuation(ValuationError::MalformedInput { ref field, .. }) if field == "years"
                ),
                "years={} gave {:?}",
                years,
                err
            );

            let err = analyzer
                .sensitivity_facts(&company, &facts, ValuationMode::Earnings, years)
                .unwrap_err();
            assert_eq!(err.kind(), "malformed_input");
        }
    }

    #[tokio::test]
    async fn test_horizon_check_runs_before_fetch() {
        // RELIANCE has no financials; the horizon is rejected first
        let err = analyzer()
            .value_query(
                "Reliance Industries",
                ValuationMode::Earnings,
                ValuationParams::default().with_years(usize::MAX),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[tokio::test]
    async fn test_missing_fcf_is_data_unavailable() {
        let err = analyzer()
            .value_query("Tata Consultancy Services", ValuationMode::FreeCashFlow, ValuationParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "data_unavailable");
        assert_eq!(err.user_message(), "Data unavailable: FCF data not available.");
    }

    #[tokio::test]
    async fn test_unreadable_eps_is_malformed() {
        let err = analyzer()
            .value_query("Tata Consultancy Services", ValuationMode::Earnings, ValuationParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Earnings figure could not be read.");
    }

    #[tokio::test]
    async fn test_company_missing_from_source() {
        let err = analyzer()
            .value_query("Reliance Industries", ValuationMode::FreeCashFlow, ValuationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RdcfError::Fetch(FetchError::DataUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_equal_rates_rejected_through_pipeline() {
        let params = ValuationParams::new(0.05, 0.05, 5);
        let err = analyzer()
            .value_query("Infosys", ValuationMode::FreeCashFlow, params)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_rate_relation");
    }

    #[test]
    fn test_unknown_company() {
        let err = analyzer().resolve("Zomato Qwerty").unwrap_err();
        assert!(matches!(err, RdcfError::NoCloseMatch { .. }));
    }

    #[tokio::test]
    async fn test_sensitivity_covers_configured_ranges() {
        let analyzer = analyzer();
        let company = analyzer.resolve("Infosys").unwrap().company;
        let report = analyzer
            .sensitivity(&company, ValuationMode::FreeCashFlow, 5)
            .await
            .unwrap();

        assert_eq!(report.grid.discount_rates.len(), 11);
        assert_eq!(report.grid.terminal_rates.len(), 6);
        // r = 5% against g = 5%, 6%
        assert!(report.grid.cell(0, 4).unwrap().value.is_none());
        assert!(report.grid.cell(0, 5).unwrap().value.is_none());
        assert!(report.grid.cell(0, 3).unwrap().value.is_some());
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let analyzer = analyzer();
        let company = Company::new("Infosys", "INFY");
        let facts = RawFacts {
            fcf_series: vec![50.0, 60.0, 70.0, 80.0, 90.0],
            ..Default::default()
        };

        let defaults = ValuationParams::default();
        let mode = ValuationMode::FreeCashFlow;

        let a = analyzer.value_facts(&company, &facts, mode, defaults).unwrap();
        let _ = analyzer
            .value_facts(&company, &facts, mode, defaults.with_discount_rate(0.15))
            .unwrap();
        let c = analyzer.value_facts(&company, &facts, mode, defaults).unwrap();
        assert_eq!(a.value, c.value);
    }
}
