//! Static IPTV channel list and its resolution into streams.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::extractor::{
    ExtractorError,
    platforms::vavoo::{PLAYER_USER_AGENT, VavooClient},
    utils::authority_of,
};
use crate::media::{StreamDescriptor, stream_descriptor::UNKNOWN_QUALITY};
use crate::proxy::{MediaFlowProxy, m3u_proxy_url};

pub const CHANNEL_ID_PREFIX: &str = "tv:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub static_url: Option<String>,
    #[serde(default)]
    pub static_url2: Option<String>,
    #[serde(default)]
    pub vavoo_names: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Channel {
    fn static_urls(&self) -> impl Iterator<Item = &str> {
        [self.static_url.as_deref(), self.static_url2.as_deref()]
            .into_iter()
            .flatten()
            .filter(|u| !u.trim().is_empty())
    }
}

/// Optional collaborators used while resolving a channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelSources<'a> {
    pub mediaflow: Option<&'a MediaFlowProxy>,
    /// Base URL of a playlist-rewriting proxy for Vavoo links.
    pub tv_proxy: Option<&'a str>,
    pub vavoo: Option<&'a VavooClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelCatalog {
    channels: Vec<Channel>,
}

/// `tv:rai1` and `rai1` name the same channel.
pub fn channel_id(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix(CHANNEL_ID_PREFIX).unwrap_or(raw)
}

fn origin_referer(url: &str) -> String {
    let scheme = if url.starts_with("http://") { "http" } else { "https" };
    authority_of(url)
        .map(|a| format!("{scheme}://{a}/"))
        .unwrap_or_default()
}

impl ChannelCatalog {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ExtractorError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ExtractorError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let catalog = Self::from_json_str(&content)?;
        debug!(path = %path.display(), channels = catalog.channels.len(), "Loaded channel list");
        Ok(catalog)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn find(&self, id: &str) -> Option<&Channel> {
        let id = channel_id(id);
        self.channels.iter().find(|c| c.id == id)
    }

    /// Streams for a channel: its static URLs, their proxied variants and the
    /// first Vavoo name that resolves. An unknown channel has no streams.
    pub async fn resolve(&self, id: &str, sources: ChannelSources<'_>) -> Vec<StreamDescriptor> {
        let Some(channel) = self.find(id) else {
            warn!(id = %id, "Unknown channel");
            return Vec::new();
        };

        let mut streams = Vec::new();
        for url in channel.static_urls() {
            streams.push(
                StreamDescriptor::builder(url, format!("{} (Direct)", channel.name))
                    .quality(UNKNOWN_QUALITY)
                    .referer(origin_referer(url))
                    .user_agent(crate::extractor::DEFAULT_UA)
                    .build(),
            );
            if let Some(proxy) = sources.mediaflow {
                match proxy.channel_url(url) {
                    Ok(link) => streams.push(
                        StreamDescriptor::builder(link, format!("{} (MFP)", channel.name)).build(),
                    ),
                    Err(e) => debug!(url = %url, error = %e, "Cannot proxy channel url"),
                }
            }
        }

        if let Some(vavoo) = sources.vavoo {
            for name in &channel.vavoo_names {
                match self.resolve_vavoo(vavoo, name, sources.tv_proxy).await {
                    Ok(Some(descriptor)) => {
                        streams.push(descriptor);
                        break;
                    }
                    Ok(None) => debug!(name = %name, "Vavoo name not found"),
                    Err(e) => warn!(name = %name, error = %e, "Vavoo lookup failed"),
                }
            }
        }

        info!(id = %channel.id, count = streams.len(), "Resolved channel");
        streams
    }

    async fn resolve_vavoo(
        &self,
        vavoo: &VavooClient,
        name: &str,
        tv_proxy: Option<&str>,
    ) -> Result<Option<StreamDescriptor>, ExtractorError> {
        // behind a proxy the original link is handed over unresolved
        if let Some(proxy) = tv_proxy {
            return Ok(vavoo.search_channel(name).await?.map(|link| {
                StreamDescriptor::builder(m3u_proxy_url(proxy, &link), format!("Vavoo {name}"))
                    .user_agent(PLAYER_USER_AGENT)
                    .build()
            }));
        }
        vavoo.resolve_channel(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNELS: &str = r#"[
        {"id": "rai1", "name": "Rai 1", "logo": "https://logo.example/rai1.png",
         "staticUrl": "https://live.example/rai1/manifest.mpd?key_id=k1&key=k2",
         "vavooNames": ["RAI 1"], "category": "rai"},
        {"id": "news", "name": "News 24", "vavooNames": []}
    ]"#;

    #[test]
    fn finds_with_or_without_prefix() {
        let catalog = ChannelCatalog::from_json_str(CHANNELS).unwrap();
        assert_eq!(catalog.find("tv:rai1").map(|c| c.name.as_str()), Some("Rai 1"));
        assert_eq!(catalog.find("rai1").map(|c| c.name.as_str()), Some("Rai 1"));
        assert!(catalog.find("tv:missing").is_none());
    }

    #[tokio::test]
    async fn resolves_static_and_proxied_urls() {
        let catalog = ChannelCatalog::from_json_str(CHANNELS).unwrap();
        let proxy = MediaFlowProxy::new("https://mfp.example", "pw");
        let streams = catalog
            .resolve(
                "tv:rai1",
                ChannelSources {
                    mediaflow: Some(&proxy),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(streams.len(), 2);
        assert_eq!(streams[0].url, "https://live.example/rai1/manifest.mpd?key_id=k1&key=k2");
        assert_eq!(streams[0].server_label, "Rai 1 (Direct)");
        assert_eq!(streams[0].referer(), Some("https://live.example/"));
        assert!(streams[1].url.starts_with("https://mfp.example/proxy/mpd/manifest.m3u8?"));
        assert!(streams[1].url.ends_with("&key_id=k1&key=k2"));
    }

    #[tokio::test]
    async fn channel_without_sources_is_empty() {
        let catalog = ChannelCatalog::from_json_str(CHANNELS).unwrap();
        assert!(catalog.resolve("news", ChannelSources::default()).await.is_empty());
        assert!(catalog.resolve("nope", ChannelSources::default()).await.is_empty());
    }

    #[tokio::test]
    async fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tv_channels.json");
        std::fs::write(&path, CHANNELS).unwrap();
        assert_eq!(ChannelCatalog::load(&path).await.unwrap().channels().len(), 2);
        assert!(ChannelCatalog::load(dir.path().join("missing.json")).await.is_err());
    }
}
