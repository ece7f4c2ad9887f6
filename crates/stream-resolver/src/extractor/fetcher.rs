use async_trait::async_trait;
use reqwest::{Client, header};
use std::sync::Arc;
use tracing::{debug, info};

use super::{default::default_client, error::ExtractorError, utils::swap_authority};
use crate::config::ResolverConfig;

/// A page body together with the URL that finally served it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub content: String,
    pub effective_url: String,
}

/// Retrieves watch pages for the resolver.
///
/// Implementations report every failure as [`ExtractorError::Unreachable`];
/// callers treat it as a soft failure of that single page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ExtractorError>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ExtractorError> {
        (**self).fetch(url).await
    }
}

/// Fetches pages over HTTP, retrying once against each configured mirror.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: Arc<ResolverConfig>,
}

impl HttpFetcher {
    pub fn new(client: Client, config: Arc<ResolverConfig>) -> Self {
        Self { client, config }
    }

    pub fn from_config(config: Arc<ResolverConfig>) -> Result<Self, ExtractorError> {
        let client = default_client(&config)?;
        Ok(Self::new(client, config))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn get_once(&self, url: &str) -> Result<FetchedPage, ExtractorError> {
        let response = self
            .client
            .get(url)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await?
            .error_for_status()?;

        let effective_url = response.url().to_string();
        let content = response.text().await?;
        Ok(FetchedPage {
            content,
            effective_url,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ExtractorError> {
        match self.get_once(url).await {
            Ok(page) => return Ok(page),
            Err(e) => debug!(url = %url, error = %e, "Primary fetch failed"),
        }

        for mirror in self.config.domains.mirrors_for(url) {
            let Some(mirror_url) = swap_authority(url, mirror) else {
                continue;
            };
            match self.get_once(&mirror_url).await {
                Ok(page) => {
                    info!(url = %url, mirror = %mirror, "Fetched page from mirror");
                    return Ok(page);
                }
                Err(e) => debug!(url = %mirror_url, error = %e, "Mirror fetch failed"),
            }
        }

        Err(ExtractorError::unreachable(url))
    }
}
