use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    config::Settings,
    error::FetchError,
    models::RawFacts,
    utils::{Logger, Timer},
};

/// Placeholder replaced by the company identifier in URL templates
pub const IDENTIFIER_PLACEHOLDER: &str = "{id}";

/// Capability for acquiring a company's financial facts.
///
/// Implementations return already-parsed values; the valuation core never sees
/// provider-specific page structure.
#[async_trait]
pub trait FinancialsSource: Send + Sync {
    async fn fetch_financials(&self, identifier: &str) -> Result<RawFacts, FetchError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Reject identifiers that could escape a URL path segment or directory
pub fn validate_identifier(identifier: &str) -> Result<&str, FetchError> {
    let valid = !identifier.is_empty()
        && identifier != "."
        && identifier != ".."
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(identifier)
    } else {
        Err(FetchError::InvalidIdentifier(identifier.to_string()))
    }
}

/// Fetches financials as JSON over HTTP with an on-disk response cache
pub struct HttpFinancialsSource {
    client: reqwest::Client,
    url_template: String,
    user_agent: String,
    fcf_periods: usize,
    cache_dir: Option<PathBuf>,
    cache_ttl: Duration,
    logger: Logger,
}

impl HttpFinancialsSource {
    pub fn new(url_template: impl Into<String>, settings: &Settings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        let mut source = Self {
            client,
            url_template: url_template.into(),
            user_agent: settings.user_agent.clone(),
            fcf_periods: settings.fcf_periods,
            cache_dir: None,
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            logger: Logger::new("FINANCIALS_HTTP"),
        };

        if settings.cache_ttl_secs > 0 {
            source = source.with_cache_dir(std::env::temp_dir().join("rdcf_cache"))?;
        }
        Ok(source)
    }

    /// Responses are cached under `<cache_dir>/<template key>/`, so sources with
    /// different URL templates can share one cache root
    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Result<Self, FetchError> {
        let cache_dir = cache_dir.join(template_key(&self.url_template));
        fs::create_dir_all(&cache_dir)?;
        self.logger.info(&format!(
            "📁 Financials cache initialized: folder={}",
            cache_dir.display()
        ));
        self.cache_dir = Some(cache_dir);
        Ok(self)
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    pub fn url_for(&self, identifier: &str) -> String {
        if self.url_template.contains(IDENTIFIER_PLACEHOLDER) {
            self.url_template.replace(IDENTIFIER_PLACEHOLDER, identifier)
        } else {
            format!("{}/{}", self.url_template.trim_end_matches('/'), identifier)
        }
    }

    fn cache_file(&self, identifier: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", identifier)))
    }

    /// Cached body if present and younger than the TTL
    async fn load_from_cache(&self, cache_file: &Path) -> Option<String> {
        let metadata = match tokio::fs::metadata(cache_file).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                self.logger.warn_with_error("Failed to stat cache", &e);
                return None;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok());

        match age {
            Some(age) if age <= self.cache_ttl => match tokio::fs::read_to_string(cache_file).await {
                Ok(content) => Some(content),
                Err(e) => {
                    self.logger.warn_with_error("Failed to read cache", &e);
                    None
                }
            },
            _ => {
                self.logger.debug(&format!(
                    "Cache expired for {}, removing",
                    cache_file.display()
                ));
                let _ = tokio::fs::remove_file(cache_file).await;
                None
            }
        }
    }

    async fn save_to_cache(&self, cache_file: &Path, content: &str) -> Result<(), FetchError> {
        tokio::fs::write(cache_file, content).await?;
        Ok(())
    }

    fn decode(&self, content: &str) -> Result<RawFacts, FetchError> {
        let mut facts: RawFacts = serde_json::from_str(content)?;
        facts.truncate_series(self.fcf_periods);
        Ok(facts)
    }

    /// Remove every cached response
    pub async fn clear_cache(&self) -> Result<usize, FetchError> {
        let mut cleared = 0;
        if let Some(dir) = &self.cache_dir {
            let mut entries = tokio::fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    tokio::fs::remove_file(entry.path()).await?;
                    cleared += 1;
                }
            }
            self.logger.info(&format!("Cleared {} cached files", cleared));
        }
        Ok(cleared)
    }
}

/// Short hex digest of a URL template, used as its cache subdirectory
fn template_key(url_template: &str) -> String {
    let digest = Sha256::digest(url_template.as_bytes());
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl FinancialsSource for HttpFinancialsSource {
    async fn fetch_financials(&self, identifier: &str) -> Result<RawFacts, FetchError> {
        let identifier = validate_identifier(identifier)?;
        let cache_file = self.cache_file(identifier);

        let cached = match cache_file.as_deref() {
            Some(file) => self.load_from_cache(file).await,
            None => None,
        };
        if let Some(cached) = cached {
            match self.decode(&cached) {
                Ok(facts) => {
                    self.logger.info(&format!("💾 Cache HIT: {}.json", identifier));
                    return Ok(facts);
                }
                Err(e) => self
                    .logger
                    .warn_with_error("Discarding undecodable cache entry", &e),
            }
        }

        let url = self.url_for(identifier);
        self.logger.info(&format!("🌐 Downloading financials for {} from {}", identifier, url));
        let timer = Timer::start(&format!("{} financials fetch", identifier));

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                identifier: identifier.to_string(),
            });
        }

        let content = response.text().await?;
        let facts = self.decode(&content)?;

        if let Some(cache_file) = &cache_file {
            if let Err(e) = self.save_to_cache(cache_file, &content).await {
                self.logger.warn_with_error("Failed to write cache", &e);
            }
        }

        self.logger.info(&format!(
            "✅ Download complete: {} ({} cash-flow periods, {:.1}ms)",
            identifier,
            facts.fcf_series.len(),
            timer.elapsed_ms()
        ));
        Ok(facts)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Reads `<dir>/<identifier>.json`
pub struct FileFinancialsSource {
    dir: PathBuf,
    fcf_periods: usize,
    logger: Logger,
}

impl FileFinancialsSource {
    pub fn new(dir: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            dir: dir.into(),
            fcf_periods: settings.fcf_periods,
            logger: Logger::new("FINANCIALS_FILE"),
        }
    }
}

#[async_trait]
impl FinancialsSource for FileFinancialsSource {
    async fn fetch_financials(&self, identifier: &str) -> Result<RawFacts, FetchError> {
        let identifier = validate_identifier(identifier)?;
        let path = self.dir.join(format!("{}.json", identifier));

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::unavailable(identifier, "no financials on file"));
            }
            Err(e) => return Err(e.into()),
        };
        let mut facts: RawFacts = serde_json::from_str(&content)?;
        facts.truncate_series(self.fcf_periods);
        self.logger.debug(&format!("Loaded financials from {}", path.display()));
        Ok(facts)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Fixed financials keyed by identifier
#[derive(Debug, Clone, Default)]
pub struct InMemoryFinancialsSource {
    data: HashMap<String, RawFacts>,
}

impl InMemoryFinancialsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, identifier: impl Into<String>, facts: RawFacts) -> Self {
        self.data.insert(identifier.into(), facts);
        self
    }
}

#[async_trait]
impl FinancialsSource for InMemoryFinancialsSource {
    async fn fetch_financials(&self, identifier: &str) -> Result<RawFacts, FetchError> {
        self.data
            .get(identifier)
            .cloned()
            .ok_or_else(|| FetchError::unavailable(identifier, "no financials for company"))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = r#"{"facts": {"EPS (TTM)": "₹ 42.5"}, "fcf_series": [1, 2, 3, 4, 5, 6, 7]}"#;

    fn no_cache_settings() -> Settings {
        Settings {
            cache_ttl_secs: 0,
            ..Settings::default()
        }
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("TCS").is_ok());
        assert!(validate_identifier("bajaj-auto_ltd.v2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("..").is_err());
        assert!(validate_identifier("../etc/passwd").is_err());
        assert!(validate_identifier("a b").is_err());
    }

    #[test]
    fn test_url_template() {
        let source = HttpFinancialsSource::new("https://data.example/c/{id}/consolidated", &no_cache_settings()).unwrap();
        assert_eq!(source.url_for("TCS"), "https://data.example/c/TCS/consolidated");

        let source = HttpFinancialsSource::new("https://data.example/c/", &no_cache_settings()).unwrap();
        assert_eq!(source.url_for("TCS"), "https://data.example/c/TCS");
    }

    #[tokio::test]
    async fn test_http_fetch_truncates_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/companies/TCS"))
            .and(header("User-Agent", "Mozilla/5.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .mount(&server)
            .await;

        let source = HttpFinancialsSource::new(format!("{}/companies/{{id}}", server.uri()), &no_cache_settings()).unwrap();
        let facts = source.fetch_financials("TCS").await.unwrap();

        assert_eq!(facts.fcf_series, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(facts.eps_field(), Some("₹ 42.5"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpFinancialsSource::new(format!("{}/companies/{{id}}", server.uri()), &no_cache_settings()).unwrap();
        let err = source.fetch_financials("NOPE").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_http_invalid_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let source = HttpFinancialsSource::new(server.uri(), &no_cache_settings()).unwrap();
        let err = source.fetch_financials("TCS").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_http_responses_are_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/TCS"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;

        let cache_dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            cache_ttl_secs: 600,
            ..Settings::default()
        };
        let source = HttpFinancialsSource::new(server.uri(), &settings)
            .unwrap()
            .with_cache_dir(cache_dir.path().to_path_buf())
            .unwrap();

        let first = source.fetch_financials("TCS").await.unwrap();
        let second = source.fetch_financials("TCS").await.unwrap();
        assert_eq!(first, second);
        let cached = source.cache_dir().unwrap().join("TCS.json");
        assert!(cached.starts_with(cache_dir.path()));
        assert!(cached.exists());
        assert_eq!(source.clear_cache().await.unwrap(), 1);
        assert!(!cached.exists());
    }

    #[tokio::test]
    async fn test_cache_is_separated_per_url_template() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/standalone/TCS"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/consolidated/TCS"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"facts": {}, "fcf_series": [9, 9, 9, 9, 9]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let cache_root = tempfile::tempdir().unwrap();
        let settings = Settings {
            cache_ttl_secs: 600,
            ..Settings::default()
        };
        let standalone = HttpFinancialsSource::new(format!("{}/standalone/{{id}}", server.uri()), &settings)
            .unwrap()
            .with_cache_dir(cache_root.path().to_path_buf())
            .unwrap();
        let consolidated = HttpFinancialsSource::new(format!("{}/consolidated/{{id}}", server.uri()), &settings)
            .unwrap()
            .with_cache_dir(cache_root.path().to_path_buf())
            .unwrap();
        assert_ne!(standalone.cache_dir(), consolidated.cache_dir());

        let first = standalone.fetch_financials("TCS").await.unwrap();
        let second = consolidated.fetch_financials("TCS").await.unwrap();
        assert_eq!(first.fcf_series, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(second.fcf_series, vec![9.0; 5]);

        // served from each source's own cache entry
        assert_eq!(standalone.fetch_financials("TCS").await.unwrap(), first);
        assert_eq!(consolidated.fetch_financials("TCS").await.unwrap(), second);
    }

    #[test]
    fn test_template_key_is_stable_hex() {
        let key = template_key("https://data.example/c/{id}");
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, template_key("https://data.example/c/{id}"));
        assert_ne!(key, template_key("https://data.example/c/{id}/consolidated"));
    }

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("INFY.json"), BODY).unwrap();

        let source = FileFinancialsSource::new(dir.path(), &Settings::default());
        let facts = source.fetch_financials("INFY").await.unwrap();
        assert_eq!(facts.fcf_series.len(), 5);

        let err = source.fetch_financials("WIPRO").await.unwrap_err();
        assert!(matches!(err, FetchError::DataUnavailable { .. }));

        let err = source.fetch_financials("../INFY").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let source = InMemoryFinancialsSource::new().with("TCS", RawFacts::default());
        assert!(source.fetch_financials("TCS").await.is_ok());
        assert!(matches!(
            source.fetch_financials("INFY").await,
            Err(FetchError::DataUnavailable { .. })
        ));
    }
}
