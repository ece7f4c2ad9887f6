use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::{Extraction, ExtractionStrategy, PageContext, direct_scan::scan_media_urls};
use crate::extractor::{error::ExtractorError, utils::capture_groups_1};
use crate::media::{SourceStrategy, StreamCandidate};

static DECODE_CALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:atob|Base64\.decode|base64_decode)\(\s*["']([A-Za-z0-9+/=_-]+)["']\s*\)"#)
        .unwrap()
});

/// Decodes a base64 literal with whichever alphabet and padding it was written in.
pub(crate) fn decode_payload(literal: &str) -> Option<String> {
    let bytes = [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD]
        .into_iter()
        .find_map(|engine| engine.decode(literal).ok())?;
    String::from_utf8(bytes).ok()
}

/// Decodes `atob('...')` style payloads and scans the result for media URLs.
pub struct Base64PayloadDecoding;

impl ExtractionStrategy for Base64PayloadDecoding {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::Base64Payload
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Extraction, ExtractorError> {
        let mut candidates: Vec<StreamCandidate> = Vec::new();
        let mut calls = 0usize;
        let mut undecodable = 0usize;

        for literal in capture_groups_1(&DECODE_CALL_REGEX, page.content) {
            calls += 1;
            let Some(decoded) = decode_payload(literal) else {
                undecodable += 1;
                debug!(literal = %literal, "Base64 literal did not decode to text");
                continue;
            };
            for url in scan_media_urls(&decoded) {
                if !candidates.iter().any(|c| c.url == url) {
                    candidates.push(StreamCandidate::new(url, self.kind()));
                }
            }
        }

        if calls > 0 && undecodable == calls {
            return Err(ExtractorError::parse_degraded(format!(
                "none of {calls} base64 payload(s) decoded"
            )));
        }
        Ok(Extraction::from_candidates(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn run(content: &str) -> Result<Extraction, ExtractorError> {
        let markup = Html::parse_document(content);
        let page = PageContext::new(content, &markup, "https://site.example/watch?file=a");
        Base64PayloadDecoding.extract(&page)
    }

    #[test]
    fn decodes_atob_payloads() {
        let content = "<script>var s = atob('aHR0cHM6Ly9jZG4uZXhhbXBsZS9iLm0zdTg=');</script>";
        let candidates = run(content).unwrap().into_candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://cdn.example/b.m3u8");
        assert_eq!(candidates[0].source_strategy, SourceStrategy::Base64Payload);
    }

    #[test]
    fn accepts_unpadded_and_url_safe_literals() {
        assert_eq!(
            decode_payload("aHR0cHM6Ly9jZG4uZXhhbXBsZS9iLm0zdTg").as_deref(),
            Some("https://cdn.example/b.m3u8")
        );
        // "?>>" encodes to "Pz4-" in the url-safe alphabet
        assert_eq!(decode_payload("Pz4-").as_deref(), Some("?>>"));
    }

    #[test]
    fn decoded_text_without_media_is_not_found() {
        // "hello world"
        let content = r#"atob("aGVsbG8gd29ybGQ=")"#;
        assert_eq!(run(content).unwrap(), Extraction::NotFound);
    }

    #[test]
    fn undecodable_payloads_degrade() {
        let content = r#"atob("@@@"); atob("A")"#;
        // "@@@" never matches the literal pattern, "A" is not valid base64
        assert!(matches!(run(content), Err(ExtractorError::ParseDegraded(_))));
    }
}
