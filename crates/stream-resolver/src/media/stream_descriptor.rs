use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Quality reported when no label was found during extraction.
pub const UNKNOWN_QUALITY: &str = "unknown";

pub const REFERER: &str = "Referer";
pub const USER_AGENT: &str = "User-Agent";

/// A finalized, player-ready stream.
///
/// Serializes to the stable shape consumed by players and addon runtimes:
/// `{"url", "server", "quality", "headers": {"Referer", "User-Agent"}}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    // Absolute url of the media resource
    pub url: String,
    // Origin tag, e.g. "Direct MP4", "Alt: HLS Stream"
    #[serde(rename = "server")]
    pub server_label: String,
    pub quality: String,
    // Headers the player must replay, always Referer and User-Agent
    pub headers: BTreeMap<String, String>,
}

impl StreamDescriptor {
    pub fn builder(
        url: impl Into<String>,
        server_label: impl Into<String>,
    ) -> StreamDescriptorBuilder {
        StreamDescriptorBuilder::new(url, server_label)
    }

    pub fn referer(&self) -> Option<&str> {
        self.headers.get(REFERER).map(String::as_str)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers.get(USER_AGENT).map(String::as_str)
    }

    /// Returns a copy labelled as coming from an alternate-player page.
    ///
    /// Labels that already carry the prefix are left untouched.
    pub fn into_alternate(mut self) -> Self {
        if !self.server_label.starts_with("Alt: ") {
            self.server_label = format!("Alt: {}", self.server_label);
        }
        self
    }

    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl fmt::Display for StreamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.server_label, self.quality, self.url)
    }
}

#[derive(Debug, Clone)]
pub struct StreamDescriptorBuilder {
    url: String,
    server_label: String,
    quality: Option<String>,
    headers: BTreeMap<String, String>,
}

impl StreamDescriptorBuilder {
    pub fn new(url: impl Into<String>, server_label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            server_label: server_label.into(),
            quality: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }

    pub fn quality_opt(mut self, quality: Option<String>) -> Self {
        self.quality = quality;
        self
    }

    pub fn referer(self, referer: impl Into<String>) -> Self {
        self.header(REFERER, referer)
    }

    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        self.header(USER_AGENT, user_agent)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> StreamDescriptor {
        StreamDescriptor {
            url: self.url,
            server_label: self.server_label,
            quality: self
                .quality
                .unwrap_or_else(|| UNKNOWN_QUALITY.to_string()),
            headers: self.headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_player_shape() {
        let descriptor = StreamDescriptor::builder("https://cdn.example/a.mp4", "Direct MP4")
            .quality("HD")
            .referer("https://site.example/watch?file=a")
            .user_agent("UA")
            .build();

        assert_eq!(
            descriptor.to_value().unwrap(),
            json!({
                "url": "https://cdn.example/a.mp4",
                "server": "Direct MP4",
                "quality": "HD",
                "headers": {
                    "Referer": "https://site.example/watch?file=a",
                    "User-Agent": "UA"
                }
            })
        );
    }

    #[test]
    fn quality_defaults_to_unknown() {
        let descriptor = StreamDescriptor::builder("https://cdn.example/a.m3u8", "HLS Stream").build();
        assert_eq!(descriptor.quality, UNKNOWN_QUALITY);
    }

    #[test]
    fn alternate_prefix_is_applied_once() {
        let descriptor = StreamDescriptor::builder("https://cdn.example/a.m3u8", "HLS Stream")
            .build()
            .into_alternate()
            .into_alternate();
        assert_eq!(descriptor.server_label, "Alt: HLS Stream");
    }
}
