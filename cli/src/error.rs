//! Error types for valuation, data acquisition and the end-to-end pipeline.

use thiserror::Error;

/// Failures raised by the valuation engine and the earnings projector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// The series holds fewer periods than the requested horizon.
    #[error("insufficient data: {available} periods available, {required} required")]
    InsufficientData { required: usize, available: usize },

    /// The discount rate is not strictly greater than the terminal growth rate.
    #[error("invalid rate relation: discount rate {discount_rate} must exceed terminal rate {terminal_rate}")]
    InvalidRateRelation { discount_rate: f64, terminal_rate: f64 },

    /// A scalar or series input could not be used as a number.
    #[error("malformed input for {field}: {reason}")]
    MalformedInput { field: String, reason: String },
}

impl ValuationError {
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        ValuationError::MalformedInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValuationError::InsufficientData { .. } => {
                "Not enough historical data for the chosen horizon."
            }
            ValuationError::InvalidRateRelation { .. } => {
                "Terminal growth rate must be below discount rate."
            }
            ValuationError::MalformedInput { field, .. } if field == "eps" => {
                "Earnings figure could not be read."
            }
            ValuationError::MalformedInput { .. } => "Valuation input could not be read.",
        }
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            ValuationError::InsufficientData { .. } => "insufficient_data",
            ValuationError::InvalidRateRelation { .. } => "invalid_rate_relation",
            ValuationError::MalformedInput { .. } => "malformed_input",
        }
    }
}

/// Failures raised while acquiring financial data for a company.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error {status} for {identifier}")]
    Status { status: u16, identifier: String },

    #[error("failed to decode financials: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid company identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("data unavailable for {identifier}: {reason}")]
    DataUnavailable { identifier: String, reason: String },
}

impl FetchError {
    pub fn unavailable(identifier: &str, reason: impl Into<String>) -> Self {
        FetchError::DataUnavailable {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the end-to-end valuation pipeline.
#[derive(Debug, Error)]
pub enum RdcfError {
    #[error("no close match found for {query:?}")]
    NoCloseMatch { query: String, best_score: Option<u8> },

    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to load company list: {0}")]
    Directory(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RdcfError {
    pub fn user_message(&self) -> String {
        match self {
            RdcfError::NoCloseMatch { .. } => "No close match found.".to_string(),
            RdcfError::Valuation(e) => e.user_message().to_string(),
            RdcfError::Fetch(FetchError::DataUnavailable { reason, .. }) => {
                format!("Data unavailable: {}.", reason)
            }
            RdcfError::Fetch(_) => "Data unavailable: financials could not be fetched.".to_string(),
            RdcfError::Directory(_) => "Company list could not be loaded.".to_string(),
            RdcfError::Config(msg) => format!("Configuration error: {}", msg),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RdcfError::NoCloseMatch { .. } => "no_close_match",
            RdcfError::Valuation(e) => e.kind(),
            RdcfError::Fetch(_) => "data_unavailable",
            RdcfError::Directory(_) => "directory",
            RdcfError::Config(_) => "config",
        }
    }
}

pub type Result<T, E = RdcfError> = std::result::Result<T, E>;
