use std::sync::Arc;

use super::{error::ExtractorError, utils::resolve_url};
use crate::config::ResolverConfig;
use crate::media::{MediaExtension, SourceStrategy, StreamCandidate, StreamCategory, StreamDescriptor};

pub const ALTERNATE_PLAYER_LABEL: &str = "Alternate Player";

/// Turns surviving candidates into player-ready descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    config: Arc<ResolverConfig>,
}

impl DescriptorBuilder {
    pub fn new(config: Arc<ResolverConfig>) -> Self {
        Self { config }
    }

    /// Builds the descriptor for `candidate`, found on `origin_page_url`.
    ///
    /// Relative and protocol-relative URLs are resolved against the origin
    /// page, or against the service base URL when the origin is not absolute.
    pub fn build(
        &self,
        candidate: &StreamCandidate,
        origin_page_url: &str,
        category: StreamCategory,
    ) -> Result<StreamDescriptor, ExtractorError> {
        let base = if origin_page_url.starts_with("http") {
            origin_page_url.to_string()
        } else {
            format!("{}/", self.config.base_url())
        };
        let url = resolve_url(&candidate.url, &base)
            .ok_or_else(|| ExtractorError::InvalidUrl(candidate.url.clone()))?;

        Ok(
            StreamDescriptor::builder(url, server_label(candidate.source_strategy, category, &candidate.url))
                .quality_opt(candidate.raw_quality_hint.clone())
                .referer(origin_page_url)
                .user_agent(self.config.user_agent.as_str())
                .build(),
        )
    }
}

/// Human readable origin tag for a descriptor.
pub fn server_label(strategy: SourceStrategy, category: StreamCategory, url: &str) -> String {
    let extension = MediaExtension::from_url(url);
    match (strategy, category) {
        (SourceStrategy::AlternatePlayer, _) | (_, StreamCategory::NavigationLink) => {
            ALTERNATE_PLAYER_LABEL.to_string()
        }
        (SourceStrategy::Base64Payload, _) => "Base64 Decoded".to_string(),
        (SourceStrategy::PlayerSetup, StreamCategory::SegmentedPlaylist) => "Player HLS".to_string(),
        (SourceStrategy::PlayerSetup, _) => {
            format!("Player {}", extension.map(|e| e.label()).unwrap_or("Stream"))
        }
        (SourceStrategy::Markup, StreamCategory::SegmentedPlaylist) => "Direct HLS".to_string(),
        (_, StreamCategory::SegmentedPlaylist) => "HLS Stream".to_string(),
        (_, _) => format!("Direct {}", extension.map(|e| e.label()).unwrap_or("Stream")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::stream_descriptor::UNKNOWN_QUALITY;

    fn builder() -> DescriptorBuilder {
        DescriptorBuilder::new(Arc::new(ResolverConfig::builder().user_agent("TestAgent/1.0").build()))
    }

    #[test]
    fn attaches_replay_headers() {
        let candidate = StreamCandidate::new("https://cdn.example/a.mp4", SourceStrategy::DirectScan)
            .with_quality(Some("HD"));
        let page = "https://www.animesaturn.cx/watch?file=abc";
        let descriptor = builder()
            .build(&candidate, page, StreamCategory::DirectFile)
            .unwrap();

        assert_eq!(descriptor.url, "https://cdn.example/a.mp4");
        assert_eq!(descriptor.server_label, "Direct MP4");
        assert_eq!(descriptor.quality, "HD");
        assert_eq!(descriptor.referer(), Some(page));
        assert_eq!(descriptor.user_agent(), Some("TestAgent/1.0"));
    }

    #[test]
    fn resolves_relative_urls() {
        let page = "https://www.animesaturn.cx/watch?file=abc";
        let b = builder();

        let protocol_relative = StreamCandidate::new("//cdn.example/b.m3u8", SourceStrategy::ScriptVariable);
        let descriptor = b
            .build(&protocol_relative, page, StreamCategory::SegmentedPlaylist)
            .unwrap();
        assert_eq!(descriptor.url, "https://cdn.example/b.m3u8");
        assert_eq!(descriptor.server_label, "HLS Stream");
        assert_eq!(descriptor.quality, UNKNOWN_QUALITY);

        let root_relative = StreamCandidate::new("/hls/c.m3u8", SourceStrategy::Markup);
        let descriptor = b
            .build(&root_relative, page, StreamCategory::SegmentedPlaylist)
            .unwrap();
        assert_eq!(descriptor.url, "https://www.animesaturn.cx/hls/c.m3u8");
        assert_eq!(descriptor.server_label, "Direct HLS");
    }

    #[test]
    fn rejects_non_http_urls() {
        let candidate = StreamCandidate::new("javascript:void(0)", SourceStrategy::DirectScan);
        assert!(matches!(
            builder().build(&candidate, "https://site.example/", StreamCategory::Unknown),
            Err(ExtractorError::InvalidUrl(_))
        ));
    }

    #[test]
    fn labels_follow_origin() {
        assert_eq!(
            server_label(SourceStrategy::Base64Payload, StreamCategory::SegmentedPlaylist, "x.m3u8"),
            "Base64 Decoded"
        );
        assert_eq!(
            server_label(SourceStrategy::DirectScan, StreamCategory::DirectFile, "x.webm"),
            "Direct WEBM"
        );
        assert_eq!(
            server_label(SourceStrategy::PlayerSetup, StreamCategory::DirectFile, "x.mp4"),
            "Player MP4"
        );
        assert_eq!(
            server_label(SourceStrategy::AlternatePlayer, StreamCategory::NavigationLink, "/watch?s=alt"),
            ALTERNATE_PLAYER_LABEL
        );
    }
}
