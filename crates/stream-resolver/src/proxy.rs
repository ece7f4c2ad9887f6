//! Links that route a stream through a MediaFlow proxy instance.

use url::Url;

use crate::extractor::{ExtractorError, utils::file_name_of};
use crate::media::StreamDescriptor;

/// Forwarded unchanged so the proxy can decrypt DASH content.
const KEY_PARAMS: [&str; 2] = ["key_id", "key"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFlowProxy {
    base_url: String,
    password: String,
}

impl MediaFlowProxy {
    pub fn new(base_url: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            base_url: base_url.as_ref().trim().trim_end_matches('/').to_string(),
            password: password.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Proxy link replaying the descriptor's headers as `h_*` parameters.
    pub fn stream_url(&self, descriptor: &StreamDescriptor) -> String {
        let file_name = file_name_of(&descriptor.url).unwrap_or_default();
        let mut link = format!(
            "{}/proxy/stream/{}?d={}&api_password={}",
            self.base_url,
            urlencoding::encode(&file_name),
            urlencoding::encode(&descriptor.url),
            urlencoding::encode(&self.password),
        );
        if let Some(ua) = descriptor.user_agent() {
            link.push_str(&format!("&h_user-agent={}", urlencoding::encode(ua)));
        }
        if let Some(referer) = descriptor.referer() {
            link.push_str(&format!("&h_referer={}", urlencoding::encode(referer)));
        }
        link
    }

    /// Same stream behind the proxy; players no longer need the headers.
    pub fn proxied(&self, descriptor: &StreamDescriptor) -> StreamDescriptor {
        StreamDescriptor::builder(self.stream_url(descriptor), format!("MFP: {}", descriptor.server_label))
            .quality(descriptor.quality.clone())
            .build()
    }

    /// Proxy link for a live channel URL.
    ///
    /// DASH manifests go through the MPD endpoint; `key_id`/`key` query
    /// parameters are lifted off the source URL and sent separately, any
    /// other parameter stays on the source.
    pub fn channel_url(&self, static_url: &str) -> Result<String, ExtractorError> {
        let parsed = Url::parse(static_url)?;
        let kept: Vec<&str> = parsed
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|pair| {
                let key = pair.split('=').next().unwrap_or_default();
                !pair.is_empty() && !KEY_PARAMS.contains(&key)
            })
            .collect();
        let mut source = parsed.clone();
        source.set_query((!kept.is_empty()).then(|| kept.join("&")).as_deref());
        source.set_fragment(None);

        let endpoint = if parsed.path().contains(".mpd") {
            "proxy/mpd/manifest.m3u8"
        } else {
            "proxy/stream/"
        };
        let mut link = format!(
            "{}/{endpoint}?api_password={}&d={}",
            self.base_url,
            urlencoding::encode(&self.password),
            urlencoding::encode(source.as_str()),
        );
        for key in KEY_PARAMS {
            if let Some((_, value)) = parsed.query_pairs().find(|(k, _)| k == key) {
                link.push_str(&format!("&{key}={}", urlencoding::encode(&value)));
            }
        }
        Ok(link)
    }
}

/// Playlist-rewriting proxy link used for Vavoo channels.
pub fn m3u_proxy_url(proxy_base: &str, link: &str) -> String {
    format!(
        "{}/proxy/m3u?url={}",
        proxy_base.trim().trim_end_matches('/'),
        urlencoding::encode(link)
    )
}
