use scraper::Selector;
use std::sync::LazyLock;
use url::Url;

use super::{Extraction, ExtractionStrategy, PageContext};
use crate::extractor::{error::ExtractorError, utils::query_param};
use crate::media::{SourceStrategy, StreamCandidate};

/// Query parameter marking an alternate player variant of the same episode.
pub const ALT_MARKER_PARAM: &str = "s";
pub const ALT_MARKER_VALUE: &str = "alt";
/// Query parameter selecting a numbered server; such links are never followed.
pub const SERVER_PARAM: &str = "server";

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href], iframe[src], [data-src], option[value]")
        .expect("selector is hard-coded, thus must be valid")
});

const LINK_ATTRIBUTES: [&str; 4] = ["href", "src", "data-src", "value"];

/// Whether `url` selects the alternate player rather than a numbered server.
pub fn is_alternate_player_link(url: &str) -> bool {
    query_param(url, ALT_MARKER_PARAM).as_deref() == Some(ALT_MARKER_VALUE)
        && query_param(url, SERVER_PARAM).is_none()
}

/// The alternate-player variant of a watch page, built from its `file` parameter.
///
/// Returns `None` when the page has no `file` parameter or already is the
/// alternate variant.
pub fn synthesized_alternate(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    if is_alternate_player_link(page_url) {
        return None;
    }
    let file = parsed
        .query_pairs()
        .find(|(k, _)| k == "file")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())?;

    let mut alternate = parsed;
    alternate.set_path("/watch");
    alternate.set_fragment(None);
    alternate
        .query_pairs_mut()
        .clear()
        .append_pair("file", &file)
        .append_pair(ALT_MARKER_PARAM, ALT_MARKER_VALUE);
    Some(alternate.into())
}

/// Finds links to the alternate player variant of the current page.
pub struct AlternatePlayerDiscovery;

impl ExtractionStrategy for AlternatePlayerDiscovery {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::AlternatePlayer
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Extraction, ExtractorError> {
        let mut candidates: Vec<StreamCandidate> = Vec::new();

        for element in page.markup.select(&LINK_SELECTOR) {
            for attr in LINK_ATTRIBUTES {
                let Some(link) = element.value().attr(attr).map(str::trim) else {
                    continue;
                };
                if link.is_empty() || !is_alternate_player_link(link) {
                    continue;
                }
                if !candidates.iter().any(|c| c.url == link) {
                    candidates.push(StreamCandidate::new(link, self.kind()));
                }
            }
        }

        Ok(Extraction::from_candidates(candidates))
    }
}
