// Error types for the birth report pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Numerical failures raised while fitting or projecting the ARIMA model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Insufficient data: required {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Series is constant; the differenced series has zero variance")]
    ConstantSeries,

    #[error("Model fit did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("Non-finite value encountered: {0}")]
    NonFinite(String),

    #[error("Forecast horizon must be at least 1")]
    InvalidHorizon,
}

/// Errors surfaced by cleaning, aggregation, forecasting and the views.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Schema error: missing required columns [{}]", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Schema error: cannot coerce {column} value {value:?} at row {row} (line {line})")]
    Coercion {
        row: usize,
        line: u64,
        column: String,
        value: String,
    },

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
