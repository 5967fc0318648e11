//! Error types for Delve.

use thiserror::Error;

/// Library-level error type for Delve operations.
#[derive(Error, Debug)]
pub enum DelveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API error: {0}")]
    OpenAI(String),

    #[error("Wikipedia error: {0}")]
    Wikipedia(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Output parsing failed: {0}")]
    Schema(#[from] SchemaError),
}

/// Reasons model output could not be coerced into a research result.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("no JSON object found in model output")]
    NoJson,

    #[error("malformed JSON: {0}")]
    InvalidJson(String),

    #[error("output does not match schema: {0}")]
    Invalid(String),
}

/// Result type alias for Delve operations.
pub type Result<T> = std::result::Result<T, DelveError>;
