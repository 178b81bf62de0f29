use axum::extract::FromRef;
use rdcf::api::ValuationAnalyzer;
use rdcf::config::Settings;
use rdcf::models::{ValuationBreakdown, ValuationMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// --- Shared State ---

// Analyzer is immutable after startup; requests share it read-only
pub type SharedAnalyzer = Arc<ValuationAnalyzer>;
pub type SharedSettings = Arc<Settings>;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: SharedAnalyzer,
    pub settings: SharedSettings,
}

impl AppState {
    pub fn new(analyzer: ValuationAnalyzer) -> Self {
        let settings = Arc::new(analyzer.settings().clone());
        Self {
            analyzer: Arc::new(analyzer),
            settings,
        }
    }
}

impl FromRef<AppState> for SharedAnalyzer {
    fn from_ref(app_state: &AppState) -> SharedAnalyzer {
        app_state.analyzer.clone()
    }
}

impl FromRef<AppState> for SharedSettings {
    fn from_ref(app_state: &AppState) -> SharedSettings {
        app_state.settings.clone()
    }
}

// --- Requests ---

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    pub series: Vec<f64>,
    pub discount_rate: f64,
    pub terminal_rate: f64,
    pub years: usize,
    pub unit: Option<String>,
}

// Missing rates and horizon fall back to the configured defaults
#[derive(Debug, Deserialize)]
pub struct ValuationQuery {
    pub company: String,
    #[serde(default)]
    pub mode: ValuationMode,
    pub discount_rate: Option<f64>,
    pub terminal_rate: Option<f64>,
    pub years: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GridQuery {
    pub company: String,
    #[serde(default)]
    pub mode: ValuationMode,
    pub years: Option<usize>,
}

// --- Responses ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub query: String,
    pub name: String,
    pub identifier: String,
    pub score: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComputeResponse {
    pub value: f64,
    pub present_value_sum: f64,
    pub terminal_value: f64,
    pub formatted: String,
}

impl ComputeResponse {
    pub fn new(breakdown: ValuationBreakdown, unit: &str) -> Self {
        let value = breakdown.total();
        Self {
            value,
            present_value_sum: breakdown.present_value_sum,
            terminal_value: breakdown.terminal_value,
            formatted: rdcf::utils::format_value(value, unit),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
