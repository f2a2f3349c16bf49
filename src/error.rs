//! Error types for the spread monitor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpreadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fetch failed ({status}) for {url}")]
    Fetch { status: u16, url: String },

    #[error("Malformed snapshot record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for SpreadError {
    fn from(err: config::ConfigError) -> Self {
        SpreadError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SpreadError>;
