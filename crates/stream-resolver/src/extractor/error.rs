use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractorError {
    /// A page or endpoint could not be fetched after every mirror was tried.
    #[error("unreachable: {url}")]
    Unreachable { url: String },
    /// A single strategy could not interpret the page content.
    #[error("parse degraded: {0}")]
    ParseDegraded(String),
    #[error("authentication failed: {0}")]
    AuthFailure(String),
    #[error("no streams found")]
    NoStreamsFound,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("other: {0}")]
    Other(String),
}

impl ExtractorError {
    pub fn unreachable(url: impl Into<String>) -> Self {
        Self::Unreachable { url: url.into() }
    }

    pub fn parse_degraded(msg: impl Into<String>) -> Self {
        Self::ParseDegraded(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthFailure(msg.into())
    }
}

impl From<url::ParseError> for ExtractorError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
