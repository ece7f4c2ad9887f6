use reqwest::{Client, header};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{
    CatalogItem, CatalogRequest, CatalogResponse, LegacyPingResponse, PingResponse, ResolveRequest,
    ResolvedLink,
};
use crate::config::{ResolverConfig, VAVOO};
use crate::extractor::error::ExtractorError;
use crate::media::StreamDescriptor;

const PING_URL: &str = "https://www.vavoo.tv/api/app/ping";
const LEGACY_PING_URL: &str = "https://www.vavoo.tv/api/box/ping2";
const SIGNATURE_HEADER: &str = "mediahubmx-signature";
const API_USER_AGENT: &str = "MediaHubMX/2";
const CLIENT_VERSION: &str = "3.0.2";
const APP_VERSION: &str = "3.1.20";
const LANGUAGE: &str = "de";
const REGION: &str = "AT";

/// User agent players must send when fetching a resolved channel.
pub const PLAYER_USER_AGENT: &str = "VAVOO/2.6";

/// Secrets exchanged for a signature; neither is embedded in the binary.
#[derive(Debug, Clone, Default)]
pub struct VavooCredentials {
    /// Token sent with the app fingerprint to the ping endpoint.
    pub token: Option<String>,
    /// Device vector for the legacy `ping2` method.
    pub vec: Option<String>,
}

/// Lower-cases and strips the quality/variant suffixes the catalog appends
/// (`"Rai 1 .c"`, `"RAI 1 (1)"`).
pub fn normalize_channel_name(name: &str) -> String {
    let mut name = name.trim().to_lowercase();
    if let Some(idx) = name.find(" .") {
        name.truncate(idx);
    }
    if let Some(idx) = name.find(" (") {
        name.truncate(idx);
    }
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Picks the catalog item for `name`: an exact normalized match, otherwise
/// the first item whose name contains it.
pub fn pick_channel<'a>(items: &'a [CatalogItem], name: &str) -> Option<&'a CatalogItem> {
    let wanted = normalize_channel_name(name);
    if wanted.is_empty() {
        return None;
    }
    items
        .iter()
        .find(|item| normalize_channel_name(&item.name) == wanted)
        .or_else(|| {
            items
                .iter()
                .find(|item| normalize_channel_name(&item.name).contains(&wanted))
        })
}

/// Client for the signed MediaHubMX catalog and resolve calls.
///
/// A signature is requested per call; the remote service decides its lifetime.
#[derive(Debug, Clone)]
pub struct VavooClient {
    client: Client,
    config: Arc<ResolverConfig>,
    credentials: VavooCredentials,
}

impl VavooClient {
    pub fn new(client: Client, config: Arc<ResolverConfig>, credentials: VavooCredentials) -> Self {
        Self {
            client,
            config,
            credentials,
        }
    }

    fn api_url(&self, endpoint: &str) -> String {
        let authority = self.config.domains.authority(VAVOO).unwrap_or("vavoo.to");
        format!("https://{authority}/{endpoint}")
    }

    fn ping_payload(&self, token: &str) -> serde_json::Value {
        let now = chrono::Utc::now().timestamp_millis();
        json!({
            "token": token,
            "reason": "app-blur",
            "locale": LANGUAGE,
            "theme": "dark",
            "metadata": {
                "device": {
                    "type": "Handset",
                    "brand": "google",
                    "model": "Nexus",
                    "name": "21081111RG",
                    "uniqueId": "d10e5d99ab665233"
                },
                "os": {
                    "name": "android",
                    "version": "7.1.2",
                    "abis": ["arm64-v8a", "armeabi-v7a", "armeabi"],
                    "host": "android"
                },
                "app": {
                    "platform": "android",
                    "version": APP_VERSION,
                    "buildId": "289515000",
                    "engine": "hbc85",
                    "signatures": ["6e8a975e3cbf07d5de823a760d4c2547f86c1403105020adee5de67ac510999e"],
                    "installer": "app.revanced.manager.flutter"
                },
                "version": {"package": "tv.vavoo.app", "binary": APP_VERSION, "js": APP_VERSION}
            },
            "appFocusTime": 0,
            "playerActive": false,
            "playDuration": 0,
            "devMode": false,
            "hasAddon": true,
            "castConnected": false,
            "package": "tv.vavoo.app",
            "version": APP_VERSION,
            "process": "app",
            "firstAppStart": now,
            "lastAppStart": now,
            "ipLocation": "",
            "adblockEnabled": true,
            "proxy": {
                "supported": ["ss", "openvpn"],
                "engine": "ss",
                "ssVersion": 1,
                "enabled": true,
                "autoServer": true,
                "id": "pl-waw"
            },
            "iap": {"supported": false}
        })
    }

    async fn ping(&self, token: &str) -> Result<String, ExtractorError> {
        let response: PingResponse = self
            .client
            .post(PING_URL)
            .header(header::USER_AGENT, "okhttp/4.11.0")
            .header(header::ACCEPT, "application/json")
            .json(&self.ping_payload(token))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response
            .addon_sig
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ExtractorError::auth("ping returned no addonSig"))
    }

    async fn legacy_ping(&self, vec: &str) -> Result<String, ExtractorError> {
        let response: LegacyPingResponse = self
            .client
            .post(LEGACY_PING_URL)
            .form(&[("vec", vec)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response
            .response
            .and_then(|r| r.signed)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ExtractorError::auth("ping2 returned no signature"))
    }

    /// Obtains a signature, falling back once to the legacy method.
    pub async fn signature(&self) -> Result<String, ExtractorError> {
        if let Some(token) = self.credentials.token.as_deref() {
            match self.ping(token).await {
                Ok(sig) => return Ok(sig),
                Err(e) => warn!(error = %e, "Signature ping failed, trying legacy method"),
            }
        }
        if let Some(vec) = self.credentials.vec.as_deref() {
            return self.legacy_ping(vec).await.map_err(|e| match e {
                ExtractorError::AuthFailure(_) => e,
                other => ExtractorError::auth(other.to_string()),
            });
        }
        Err(ExtractorError::auth("no signing credentials configured"))
    }

    fn signed(&self, url: String, signature: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header(header::USER_AGENT, API_USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .header(SIGNATURE_HEADER, signature)
    }

    /// Looks `name` up in the live catalog and returns its unresolved link.
    pub async fn search_channel(&self, name: &str) -> Result<Option<String>, ExtractorError> {
        let signature = self.signature().await?;
        let request = CatalogRequest {
            language: LANGUAGE,
            region: REGION,
            catalog_id: "iptv",
            id: "iptv",
            adult: false,
            search: name,
            sort: "name",
            filter: json!({}),
            cursor: 0,
            client_version: CLIENT_VERSION,
        };
        let response: CatalogResponse = self
            .signed(self.api_url("mediahubmx-catalog.json"), &signature)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let link = pick_channel(&response.items, name).map(|item| item.url.clone());
        debug!(name = %name, items = response.items.len(), found = link.is_some(), "Catalog search");
        Ok(link)
    }

    /// Exchanges a catalog link for a playable stream URL.
    pub async fn resolve_link(&self, link: &str) -> Result<Option<String>, ExtractorError> {
        let signature = self.signature().await?;
        let request = ResolveRequest {
            language: LANGUAGE,
            region: REGION,
            url: link,
            client_version: CLIENT_VERSION,
        };
        let resolved: Vec<ResolvedLink> = self
            .signed(self.api_url("mediahubmx-resolve.json"), &signature)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resolved.into_iter().find_map(|r| r.url).filter(|u| !u.is_empty()))
    }

    /// Search and resolve in one go, as a descriptor ready for players.
    pub async fn resolve_channel(&self, name: &str) -> Result<Option<StreamDescriptor>, ExtractorError> {
        let Some(link) = self.search_channel(name).await? else {
            return Ok(None);
        };
        let Some(url) = self.resolve_link(&link).await? else {
            return Ok(None);
        };
        info!(name = %name, "Resolved channel");
        Ok(Some(
            StreamDescriptor::builder(url, format!("Vavoo {name}"))
                .referer(self.api_url(""))
                .user_agent(PLAYER_USER_AGENT)
                .build(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, url: &str) -> CatalogItem {
        CatalogItem {
            name: name.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn normalizes_catalog_names() {
        assert_eq!(normalize_channel_name("  RAI 1 .c"), "rai 1");
        assert_eq!(normalize_channel_name("Rai  1 (1)"), "rai 1");
        assert_eq!(normalize_channel_name("Sky Sport 24"), "sky sport 24");
    }

    #[test]
    fn picks_exact_match_first() {
        let items = vec![
            item("RAI 1 HD", "https://vavoo.to/a"),
            item("RAI 1 .c", "https://vavoo.to/b"),
        ];
        assert_eq!(pick_channel(&items, "Rai 1").map(|i| i.url.as_str()), Some("https://vavoo.to/b"));
        assert_eq!(pick_channel(&items, "rai 1 hd").map(|i| i.url.as_str()), Some("https://vavoo.to/a"));
        assert_eq!(pick_channel(&items, "Canale 5"), None);
        assert_eq!(pick_channel(&items, "  "), None);
    }

    #[test]
    fn ping_payload_carries_token() {
        let client = VavooClient::new(
            Client::new(),
            Arc::new(ResolverConfig::default()),
            VavooCredentials::default(),
        );
        let payload = client.ping_payload("tok");
        assert_eq!(payload["token"], "tok");
        assert_eq!(payload["metadata"]["version"]["package"], "tv.vavoo.app");
        assert_eq!(client.api_url("mediahubmx-resolve.json"), "https://vavoo.to/mediahubmx-resolve.json");
    }

    #[tokio::test]
    async fn missing_credentials_is_auth_failure() {
        let client = VavooClient::new(
            Client::new(),
            Arc::new(ResolverConfig::default()),
            VavooCredentials::default(),
        );
        assert!(matches!(client.signature().await, Err(ExtractorError::AuthFailure(_))));
    }
}
