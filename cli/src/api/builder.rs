//! Builder for assembling a [`ValuationAnalyzer`] from its collaborators

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::analyzer::ValuationAnalyzer;
use crate::config::Settings;
use crate::error::{RdcfError, Result};
use crate::models::CompanyDirectory;
use crate::services::{FileFinancialsSource, FinancialsSource, HttpFinancialsSource, NameResolver};

/// Fluent configuration for a [`ValuationAnalyzer`].
///
/// # Example
/// ```no_run
/// use rdcf::api::AnalyzerBuilder;
///
/// # fn main() -> rdcf::error::Result<()> {
/// let analyzer = AnalyzerBuilder::new()
///     .with_companies_csv("data/company_list.csv")
///     .with_source_dir("data/financials")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct AnalyzerBuilder {
    settings: Option<Settings>,
    directory: Option<Arc<CompanyDirectory>>,
    companies_csv: Option<PathBuf>,
    resolver: Option<Box<dyn NameResolver>>,
    source: Option<Arc<dyn FinancialsSource>>,
    source_url: Option<String>,
    source_dir: Option<PathBuf>,
}

impl AnalyzerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Use an already-loaded directory; takes precedence over a CSV path
    pub fn with_directory(mut self, directory: Arc<CompanyDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_companies_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.companies_csv = Some(path.into());
        self
    }

    pub fn with_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Use a custom source; takes precedence over URL and directory sources
    pub fn with_source(mut self, source: Arc<dyn FinancialsSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Fetch over HTTP; `{id}` in the template is replaced by the identifier
    pub fn with_source_url(mut self, url_template: impl Into<String>) -> Self {
        self.source_url = Some(url_template.into());
        self
    }

    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> Result<ValuationAnalyzer> {
        let settings = self.settings.unwrap_or_default();

        let directory = match (self.directory, self.companies_csv) {
            (Some(directory), _) => directory,
            (None, Some(path)) => Arc::new(CompanyDirectory::from_csv_path(&path)?),
            (None, None) => {
                return Err(RdcfError::Config("no company directory configured".to_string()))
            }
        };

        let source: Arc<dyn FinancialsSource> = match (self.source, self.source_url, self.source_dir) {
            (Some(source), _, _) => source,
            (None, Some(url), _) => Arc::new(HttpFinancialsSource::new(url, &settings)?),
            (None, None, Some(dir)) => Arc::new(FileFinancialsSource::new(dir, &settings)),
            (None, None, None) => {
                return Err(RdcfError::Config("no financials source configured".to_string()))
            }
        };

        let analyzer = ValuationAnalyzer::new(directory, source, settings);
        Ok(match self.resolver {
            Some(resolver) => analyzer.with_boxed_resolver(resolver),
            None => analyzer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Company, ValuationMode, ValuationParams};
    use crate::services::{InMemoryFinancialsSource, NameMatch};
    use std::fs;

    struct ExactResolver;

    impl NameResolver for ExactResolver {
        fn resolve(&self, query: &str, candidates: &[String]) -> Option<NameMatch> {
            candidates.iter().find(|c| c.as_str() == query).map(|c| NameMatch {
                name: c.clone(),
                score: 100,
            })
        }
    }

    #[test]
    fn test_build_requires_directory_and_source() {
        let err = AnalyzerBuilder::new().build().err().unwrap();
        assert!(matches!(err, RdcfError::Config(_)));

        let err = AnalyzerBuilder::new()
            .with_directory(Arc::new(CompanyDirectory::default()))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, RdcfError::Config(_)));
    }

    #[tokio::test]
    async fn test_build_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("company_list.csv");
        fs::write(&csv_path, "name,slug\nInfosys,INFY\n").unwrap();
        fs::write(dir.path().join("INFY.json"), r#"{"fcf_series": [100, 100, 100, 100, 100]}"#).unwrap();

        let analyzer = AnalyzerBuilder::new()
            .with_companies_csv(&csv_path)
            .with_source_dir(dir.path())
            .build()
            .unwrap();

        let report = analyzer
            .value_query("Infosys", ValuationMode::FreeCashFlow, ValuationParams::default())
            .await
            .unwrap();
        assert_eq!(report.formatted, "1292.74 Cr");
    }

    #[test]
    fn test_custom_resolver_is_used() {
        let analyzer = AnalyzerBuilder::new()
            .with_directory(Arc::new(CompanyDirectory::new(vec![Company::new("Infosys", "INFY")])))
            .with_source(Arc::new(InMemoryFinancialsSource::new()))
            .with_resolver(ExactResolver)
            .build()
            .unwrap();

        assert!(analyzer.resolve("Infosys").is_ok());
        assert!(analyzer.resolve("infosys").is_err());
    }
}
