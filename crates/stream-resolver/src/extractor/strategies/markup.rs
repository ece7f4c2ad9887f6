use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::{Extraction, ExtractionStrategy, PageContext};
use crate::extractor::error::ExtractorError;
use crate::media::{SourceStrategy, StreamCandidate};

static VIDEO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video").expect("selector is hard-coded, thus must be valid"));
static SOURCE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("source").expect("selector is hard-coded, thus must be valid"));

const SRC_ATTRIBUTES: [&str; 2] = ["src", "data-src"];
const QUALITY_ATTRIBUTES: [&str; 4] = ["label", "res", "size", "data-quality"];

fn first_attr<'a>(element: &ElementRef<'a>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

/// Reads `<video src>` and nested `<source src label>` elements.
pub struct MarkupInspection;

impl ExtractionStrategy for MarkupInspection {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::Markup
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Extraction, ExtractorError> {
        let mut candidates = Vec::new();

        for video in page.markup.select(&VIDEO_SELECTOR) {
            if let Some(src) = first_attr(&video, &SRC_ATTRIBUTES) {
                candidates.push(
                    StreamCandidate::new(src, self.kind())
                        .with_quality(first_attr(&video, &QUALITY_ATTRIBUTES)),
                );
            }

            for source in video.select(&SOURCE_SELECTOR) {
                let Some(src) = first_attr(&source, &SRC_ATTRIBUTES) else {
                    continue;
                };
                candidates.push(
                    StreamCandidate::new(src, self.kind())
                        .with_quality(first_attr(&source, &QUALITY_ATTRIBUTES)),
                );
            }
        }

        Ok(Extraction::from_candidates(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn extract(html: &str) -> Vec<StreamCandidate> {
        let markup = Html::parse_document(html);
        let page = PageContext::new(html, &markup, "https://site.example/watch?file=a");
        MarkupInspection.extract(&page).unwrap().into_candidates()
    }

    #[test]
    fn reads_sources_with_labels() {
        let candidates = extract(
            r#"<video controls>
                 <source src="https://cdn.example/a.mp4" label="HD" type="video/mp4">
                 <source src="/hls/a.m3u8" res="720">
                 <source type="video/webm">
               </video>"#,
        );

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].url, "https://cdn.example/a.mp4");
        assert_eq!(candidates[0].raw_quality_hint.as_deref(), Some("HD"));
        assert_eq!(candidates[1].url, "/hls/a.m3u8");
        assert_eq!(candidates[1].raw_quality_hint.as_deref(), Some("720"));
    }

    #[test]
    fn reads_video_src_attribute() {
        let candidates = extract(r#"<video src="//cdn.example/b.webm" data-src=""></video>"#);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "//cdn.example/b.webm");
        assert_eq!(candidates[0].raw_quality_hint, None);
    }

    #[test]
    fn page_without_video_is_not_found() {
        let markup = Html::parse_document("<p>nothing here</p>");
        let page = PageContext::new("<p>nothing here</p>", &markup, "https://site.example/");
        assert_eq!(MarkupInspection.extract(&page).unwrap(), Extraction::NotFound);
    }
}
