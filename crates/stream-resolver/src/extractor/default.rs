use reqwest::Client;
use std::time::Duration;

use super::error::ExtractorError;
use crate::config::ResolverConfig;

pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Builds the HTTP client used for every page and API call.
pub fn default_client(config: &ResolverConfig) -> Result<Client, ExtractorError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .build()?;
    Ok(client)
}
