//! Recursive merging of strategy results across a watch page and its
//! alternate-player variants.

use futures::{FutureExt, future::BoxFuture};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    builder::DescriptorBuilder,
    classifier::{CandidateSet, classify},
    error::ExtractorError,
    fetcher::{HttpFetcher, PageFetcher},
    strategies::{ExtractionStrategy, default_strategies, is_alternate_player_link, run_strategies, synthesized_alternate},
};
use crate::config::ResolverConfig;
use crate::media::{SourceStrategy, StreamCategory, StreamDescriptor};

/// Pages already fetched during one top-level resolution.
pub type VisitedSet = FxHashSet<String>;

/// State owned by a single `resolve` call.
#[derive(Debug, Default)]
struct Traversal {
    visited: VisitedSet,
    // absolute urls already emitted anywhere in the traversal
    seen: FxHashSet<String>,
}

#[derive(Debug, Default)]
struct PageStreams {
    direct: Vec<StreamDescriptor>,
    playlists: Vec<StreamDescriptor>,
    alternates: Vec<StreamDescriptor>,
}

/// Resolves a watch page into an ordered, deduplicated list of streams.
///
/// Direct files come first, then HLS playlists. Alternate-player pages are
/// followed at most once each; their streams are labelled `Alt: `. Only when
/// nothing playable was found anywhere are the alternate-player links of the
/// requested page returned instead.
pub struct StreamResolver<F = HttpFetcher> {
    fetcher: F,
    config: Arc<ResolverConfig>,
    builder: DescriptorBuilder,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl StreamResolver<HttpFetcher> {
    pub fn from_config(config: Arc<ResolverConfig>) -> Result<Self, ExtractorError> {
        let fetcher = HttpFetcher::from_config(config.clone())?;
        Ok(Self::new(fetcher, config))
    }
}

impl<F: PageFetcher> StreamResolver<F> {
    pub fn new(fetcher: F, config: Arc<ResolverConfig>) -> Self {
        Self {
            fetcher,
            builder: DescriptorBuilder::new(config.clone()),
            config,
            strategies: default_strategies(),
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Never fails; an unreachable or empty page yields an empty list.
    pub async fn resolve(&self, watch_url: &str) -> Vec<StreamDescriptor> {
        info!(url = %watch_url, "Resolving streams");
        let mut traversal = Traversal::default();

        let PageStreams {
            mut direct,
            playlists,
            alternates,
        } = self
            .resolve_page(watch_url.to_string(), &mut traversal)
            .await;
        direct.extend(playlists);

        if direct.is_empty() {
            if !alternates.is_empty() {
                info!(
                    url = %watch_url,
                    count = alternates.len(),
                    "No playable stream found, returning alternate player links"
                );
                return alternates;
            }
            debug!(url = %watch_url, error = %ExtractorError::NoStreamsFound, "Nothing resolved");
            return direct;
        }

        info!(
            url = %watch_url,
            count = direct.len(),
            pages = traversal.visited.len(),
            "Resolved streams"
        );
        direct
    }

    fn resolve_page<'a>(
        &'a self,
        page_url: String,
        traversal: &'a mut Traversal,
    ) -> BoxFuture<'a, PageStreams> {
        async move {
            let mut streams = PageStreams::default();

            if !traversal.visited.insert(page_url.clone()) {
                debug!(url = %page_url, "Page already visited");
                return streams;
            }

            let page = match self.fetcher.fetch(&page_url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(url = %page_url, error = %e, "Skipping page");
                    return streams;
                }
            };
            if page.effective_url != page_url {
                debug!(url = %page_url, effective_url = %page.effective_url, "Page served from another location");
            }

            let candidates: CandidateSet =
                run_strategies(&self.strategies, &page.content, &page_url)
                    .into_iter()
                    .collect();

            for candidate in candidates.into_vec() {
                let category = classify(&candidate.url);
                let alternate = !category.is_terminal()
                    && candidate.source_strategy == SourceStrategy::AlternatePlayer
                    && is_alternate_player_link(&candidate.url);
                if !category.is_terminal() && !alternate {
                    debug!(url = %candidate.url, category = category.as_str(), "Discarding candidate");
                    continue;
                }

                let descriptor = match self.builder.build(&candidate, &page_url, category) {
                    Ok(descriptor) => descriptor,
                    Err(e) => {
                        debug!(url = %candidate.url, error = %e, "Discarding candidate");
                        continue;
                    }
                };

                if alternate {
                    if !streams.alternates.iter().any(|d| d.url == descriptor.url) {
                        streams.alternates.push(descriptor);
                    }
                    continue;
                }
                if !traversal.seen.insert(descriptor.url.clone()) {
                    continue;
                }
                match category {
                    StreamCategory::DirectFile => streams.direct.push(descriptor),
                    _ => streams.playlists.push(descriptor),
                }
            }

            let mut follow: Vec<String> = streams.alternates.iter().map(|d| d.url.clone()).collect();
            if self.config.follow_synthesized_alternate {
                if let Some(synthesized) = synthesized_alternate(&page_url) {
                    if !follow.contains(&synthesized) {
                        follow.push(synthesized);
                    }
                }
            }

            for link in follow {
                if traversal.visited.contains(&link) {
                    continue;
                }
                debug!(url = %link, parent = %page_url, "Following alternate player");
                let child = self.resolve_page(link, traversal).await;
                streams
                    .direct
                    .extend(child.direct.into_iter().map(StreamDescriptor::into_alternate));
                streams
                    .playlists
                    .extend(child.playlists.into_iter().map(StreamDescriptor::into_alternate));
            }

            debug!(
                url = %page_url,
                direct = streams.direct.len(),
                playlists = streams.playlists.len(),
                alternates = streams.alternates.len(),
                "Page merged"
            );
            streams
        }
        .boxed()
    }
}
