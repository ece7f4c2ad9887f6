//! Independent heuristics that mine a watch page for stream candidates.
//!
//! Every strategy sees the same page and knows nothing about the others. A
//! strategy that cannot make sense of the page reports
//! [`ExtractorError::ParseDegraded`]; [`run_strategies`] turns that into an
//! empty contribution so the remaining strategies still run.

mod alternate;
mod base64_payload;
mod direct_scan;
mod markup;
mod player_setup;
mod script_vars;

use scraper::Html;
use tracing::debug;

use crate::extractor::error::ExtractorError;
use crate::media::{SourceStrategy, StreamCandidate};

pub use alternate::{
    ALT_MARKER_PARAM, ALT_MARKER_VALUE, AlternatePlayerDiscovery, SERVER_PARAM,
    is_alternate_player_link, synthesized_alternate,
};
pub use base64_payload::Base64PayloadDecoding;
pub use direct_scan::{DirectUrlScan, scan_media_urls};
pub use markup::MarkupInspection;
pub use player_setup::PlayerSetupBlocks;
pub use script_vars::ScriptVariableMining;

/// Everything a strategy may look at for one page.
pub struct PageContext<'a> {
    pub content: &'a str,
    pub markup: &'a Html,
    pub page_url: &'a str,
}

impl<'a> PageContext<'a> {
    pub fn new(content: &'a str, markup: &'a Html, page_url: &'a str) -> Self {
        Self {
            content,
            markup,
            page_url,
        }
    }
}

/// Outcome of a single strategy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(Vec<StreamCandidate>),
    NotFound,
}

impl Extraction {
    pub fn from_candidates(candidates: Vec<StreamCandidate>) -> Self {
        if candidates.is_empty() {
            Extraction::NotFound
        } else {
            Extraction::Found(candidates)
        }
    }

    pub fn into_candidates(self) -> Vec<StreamCandidate> {
        match self {
            Extraction::Found(candidates) => candidates,
            Extraction::NotFound => Vec::new(),
        }
    }
}

pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> SourceStrategy;

    fn extract(&self, page: &PageContext<'_>) -> Result<Extraction, ExtractorError>;
}

/// The fixed strategy order; earlier strategies win ties during deduplication.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    vec![
        Box::new(DirectUrlScan),
        Box::new(MarkupInspection),
        Box::new(ScriptVariableMining),
        Box::new(PlayerSetupBlocks),
        Box::new(Base64PayloadDecoding),
        Box::new(AlternatePlayerDiscovery),
    ]
}

/// Runs every strategy over the page and concatenates their candidates.
///
/// Parsed markup never outlives this call, so callers may hold the result
/// across await points.
pub fn run_strategies(
    strategies: &[Box<dyn ExtractionStrategy>],
    content: &str,
    page_url: &str,
) -> Vec<StreamCandidate> {
    let markup = Html::parse_document(content);
    let page = PageContext::new(content, &markup, page_url);

    let mut candidates = Vec::new();
    for strategy in strategies {
        match strategy.extract(&page) {
            Ok(Extraction::Found(found)) => {
                debug!(
                    strategy = strategy.kind().as_str(),
                    count = found.len(),
                    "Strategy found candidates"
                );
                candidates.extend(found);
            }
            Ok(Extraction::NotFound) => {}
            Err(e) => {
                debug!(strategy = strategy.kind().as_str(), error = %e, "Strategy degraded");
            }
        }
    }
    candidates
}
