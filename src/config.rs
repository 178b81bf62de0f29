use anyhow::{bail, Context};
use rdcf::config::Settings;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

// Where per-company financials are read from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialsLocation {
    Url(String),
    Dir(PathBuf),
}

// Per-peer-IP limit applied to the valuation routes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateLimit {
    pub per_second: u64,
    pub burst_size: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            per_second: 10,
            burst_size: 20,
        }
    }
}

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub companies_csv: Option<PathBuf>,
    pub financials_url: Option<String>,
    pub financials_dir: Option<PathBuf>,
    pub rate_limit: Option<RateLimit>,
    pub settings_file: Option<PathBuf>,
    pub settings: Option<Settings>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub companies_csv: PathBuf,
    pub financials: FinancialsLocation,
    pub rate_limit: RateLimit,
    pub settings: Settings,
}

const DEFAULT_PORT: u16 = 8888;
const DEFAULT_COMPANIES_CSV: &str = "data/company_list.csv";
const DEFAULT_FINANCIALS_DIR: &str = "data/financials";

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(content).context("Failed to parse YAML config")?;

        let settings = match (yaml_config.settings, yaml_config.settings_file) {
            (Some(_), Some(_)) => bail!("settings and settings_file are mutually exclusive"),
            (Some(settings), None) => {
                settings.validate()?;
                settings
            }
            (None, Some(path)) => Settings::from_yaml_file(path)?,
            (None, None) => Settings::default(),
        };

        Ok(Self {
            node_name: yaml_config.node_name.unwrap_or_else(|| "rdcf-server".to_string()),
            environment: yaml_config.environment.unwrap_or_else(|| "development".to_string()),
            port: yaml_config.port.unwrap_or(DEFAULT_PORT),
            companies_csv: yaml_config
                .companies_csv
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPANIES_CSV)),
            financials: financials_location(yaml_config.financials_url, yaml_config.financials_dir)?,
            rate_limit: yaml_config.rate_limit.unwrap_or_default(),
            settings,
        })
    }

    // Load all configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);

        let rate_limit = RateLimit {
            per_second: parse_var(&lookup, "RATE_LIMIT_PER_SECOND")?
                .unwrap_or(RateLimit::default().per_second),
            burst_size: parse_var(&lookup, "RATE_LIMIT_BURST")?
                .unwrap_or(RateLimit::default().burst_size),
        };

        let settings = match lookup("SETTINGS_FILE") {
            Some(path) => Settings::from_yaml_file(path)?,
            None => Settings::default(),
        };

        Ok(Self {
            node_name: lookup("NODE_NAME").unwrap_or_else(|| "rdcf-server".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            port,
            companies_csv: lookup("COMPANIES_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMPANIES_CSV)),
            financials: financials_location(
                lookup("FINANCIALS_URL"),
                lookup("FINANCIALS_DIR").map(PathBuf::from),
            )?,
            rate_limit,
            settings,
        })
    }
}

fn financials_location(url: Option<String>, dir: Option<PathBuf>) -> anyhow::Result<FinancialsLocation> {
    match (url, dir) {
        (Some(_), Some(_)) => bail!("configure either a financials URL or a financials directory, not both"),
        (Some(url), None) => Ok(FinancialsLocation::Url(url)),
        (None, Some(dir)) => Ok(FinancialsLocation::Dir(dir)),
        (None, None) => Ok(FinancialsLocation::Dir(PathBuf::from(DEFAULT_FINANCIALS_DIR))),
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.parse::<T>().with_context(|| format!("Invalid value for {}: {}", key, raw)))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8888);
        assert_eq!(config.companies_csv, PathBuf::from("data/company_list.csv"));
        assert_eq!(config.financials, FinancialsLocation::Dir(PathBuf::from("data/financials")));
        assert_eq!(config.rate_limit, RateLimit::default());
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("FINANCIALS_URL", "https://data.example.com/company/{id}.json"),
            ("RATE_LIMIT_PER_SECOND", "2"),
            ("RATE_LIMIT_BURST", "4"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.financials,
            FinancialsLocation::Url("https://data.example.com/company/{id}.json".to_string())
        );
        assert_eq!(config.rate_limit, RateLimit { per_second: 2, burst_size: 4 });
    }

    #[test]
    fn test_env_invalid_port_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_url_and_dir_conflict() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("FINANCIALS_URL", "https://data.example.com/{id}"),
            ("FINANCIALS_DIR", "data/financials"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_with_inline_settings() {
        let config = AppConfig::from_yaml_str(
            r#"
port: 8080
environment: production
financials_dir: /srv/financials
rate_limit:
  per_second: 5
  burst_size: 10
settings:
  min_match_score: 80
  defaults:
    discount_rate: 0.12
    terminal_rate: 0.04
    years: 7
"#,
        )
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "production");
        assert_eq!(config.financials, FinancialsLocation::Dir(PathBuf::from("/srv/financials")));
        assert_eq!(config.settings.min_match_score, 80);
        assert_eq!(config.settings.defaults.years, 7);
        assert_eq!(config.settings.fcf_periods, 5);
    }

    #[test]
    fn test_yaml_rejects_invalid_settings() {
        let result = AppConfig::from_yaml_str("settings:\n  fcf_periods: 0\n");
        assert!(result.is_err());
    }
}
