use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::config::ResolverConfig;
use crate::extractor::{ExtractorError, FetchedPage, PageFetcher};

/// Initialize tracing for tests with appropriate settings
#[inline]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer() // Write to test output
        .try_init();
}

#[inline]
pub fn test_config() -> Arc<ResolverConfig> {
    Arc::new(ResolverConfig::builder().user_agent("TestAgent/1.0").build())
}

/// In-memory fetcher serving canned pages and counting every request.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: FxHashMap<String, String>,
    fetches: Mutex<FxHashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.pages.insert(url.into(), content.into());
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .get(url)
            .copied()
            .unwrap_or_default()
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ExtractorError> {
        *self.fetches.lock().entry(url.to_string()).or_default() += 1;
        match self.pages.get(url) {
            Some(content) => Ok(FetchedPage {
                content: content.clone(),
                effective_url: url.to_string(),
            }),
            None => Err(ExtractorError::unreachable(url)),
        }
    }
}
