use stream_resolver::ExtractorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Extractor error: {0}")]
    Extractor(#[from] ExtractorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Cannot write configuration: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[cfg(feature = "regex-filters")]
    #[error("Invalid filter: {0}")]
    Filter(#[from] regex::Error),

    #[cfg(feature = "interactive")]
    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}
