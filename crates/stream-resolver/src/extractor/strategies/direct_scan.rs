use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::{Extraction, ExtractionStrategy, PageContext};
use crate::extractor::{error::ExtractorError, utils::unescape_script_text};
use crate::media::{MediaExtension, SourceStrategy, StreamCandidate};

static URL_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>\\`]+"#).unwrap());

// punctuation that ends a sentence or a script expression rather than the url
const TRAILING_NOISE: [char; 6] = [')', ';', ',', '.', ']', '}'];

/// Absolute URLs in `text` whose path ends in a known media extension.
///
/// Results are unique and in order of first appearance.
pub fn scan_media_urls(text: &str) -> Vec<String> {
    let text = unescape_script_text(text).replace("&amp;", "&");

    let mut urls: Vec<String> = Vec::new();
    for token in URL_TOKEN_REGEX.find_iter(&text) {
        let url = token.as_str().trim_end_matches(TRAILING_NOISE);
        if MediaExtension::from_url(url).is_none() || Url::parse(url).is_err() {
            continue;
        }
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Scans the raw page text for media URLs, wherever they appear.
pub struct DirectUrlScan;

impl ExtractionStrategy for DirectUrlScan {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::DirectScan
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Extraction, ExtractorError> {
        let candidates = scan_media_urls(page.content)
            .into_iter()
            .map(|url| StreamCandidate::new(url, self.kind()))
            .collect();
        Ok(Extraction::from_candidates(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_every_media_extension() {
        let text = r#"
            <a href="https://cdn.example/a.mp4">a</a>
            var b = 'https://cdn.example/b.webm?x=1';
            "https://cdn.example/c/master.m3u8"
            https://cdn.example/seg-1.ts
        "#;
        assert_eq!(
            scan_media_urls(text),
            vec![
                "https://cdn.example/a.mp4",
                "https://cdn.example/b.webm?x=1",
                "https://cdn.example/c/master.m3u8",
                "https://cdn.example/seg-1.ts",
            ]
        );
    }

    #[test]
    fn ignores_pages_and_trailing_punctuation() {
        let text = "see https://cdn.example/a.mp4. and https://site.example/watch?file=a.mp4 \
                    or play(https://cdn.example/b.mp4);";
        assert_eq!(
            scan_media_urls(text),
            vec!["https://cdn.example/a.mp4", "https://cdn.example/b.mp4"]
        );
    }

    #[test]
    fn unescapes_script_encoded_urls() {
        let text = r#"{"file":"https:\/\/cdn.example\/v\/ep1.mp4?a=1&amp;b=2"}"#;
        assert_eq!(scan_media_urls(text), vec!["https://cdn.example/v/ep1.mp4?a=1&b=2"]);
    }

    #[test]
    fn mp4_url_is_always_found() {
        for wrapper in ["{}", "'{}'", "\"{}\"", "<source src=\"{}\">", "url({})", "x{} y"] {
            let url = "https://cdn.example/path/video.mp4";
            let text = wrapper.replace("{}", url);
            let found = scan_media_urls(&text);
            assert!(found.contains(&url.to_string()), "missed url in {text}");
        }
    }

    #[test]
    fn duplicates_are_reported_once() {
        let text = "https://cdn.example/a.mp4 https://cdn.example/a.mp4";
        assert_eq!(scan_media_urls(text).len(), 1);
    }
}
