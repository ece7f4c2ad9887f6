//! Process-wide configuration values.
//!
//! Both types are built once at startup and then only read. They are passed
//! explicitly (usually behind an `Arc`) to the fetcher, the resolver and the
//! descriptor builder.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::{path::Path, time::Duration};
use tracing::{debug, warn};

use crate::extractor::default::{DEFAULT_TIMEOUT, DEFAULT_UA};
use crate::extractor::utils::authority_of;

pub const ANIMESATURN: &str = "animesaturn";
pub const VAVOO: &str = "vavoo";

/// Authority used when nothing else is known about a service.
pub const DEFAULT_AUTHORITY: &str = "www.animesaturn.cx";

const DEFAULT_DOMAINS: &[(&str, &str)] = &[(ANIMESATURN, DEFAULT_AUTHORITY), (VAVOO, "vavoo.to")];

#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorityEntry {
    Single(String),
    Many(Vec<String>),
}

/// Maps a logical service name to its network authorities.
///
/// The first authority of a service is the primary one, any further entries
/// are mirrors serving the same content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    services: FxHashMap<String, Vec<String>>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        let services = DEFAULT_DOMAINS
            .iter()
            .map(|(service, authority)| (service.to_string(), vec![authority.to_string()]))
            .collect();
        Self { services }
    }
}

impl DomainConfig {
    /// Parses a JSON object of `service -> authority | [authority, mirror...]`.
    ///
    /// Services missing from the document keep their built-in authority.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let entries: FxHashMap<String, AuthorityEntry> = serde_json::from_str(json)?;
        let mut config = Self::default();

        for (service, entry) in entries {
            let authorities: Vec<String> = match entry {
                AuthorityEntry::Single(authority) => vec![authority],
                AuthorityEntry::Many(authorities) => authorities,
            }
            .iter()
            .filter_map(|a| normalize_authority(a))
            .collect();

            if authorities.is_empty() {
                debug!(service = %service, "Ignoring service without authorities");
                continue;
            }
            config.services.insert(service.to_lowercase(), authorities);
        }

        Ok(config)
    }

    /// Loads the configuration file, degrading to the defaults on any problem.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Domain config unavailable, using defaults");
                return Self::default();
            }
        };

        match Self::from_json_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed domain config, using defaults");
                Self::default()
            }
        }
    }

    pub fn with_service<S, I>(mut self, service: &str, authorities: I) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S>,
    {
        let authorities: Vec<String> = authorities
            .into_iter()
            .filter_map(|a| normalize_authority(a.as_ref()))
            .collect();
        if !authorities.is_empty() {
            self.services.insert(service.to_lowercase(), authorities);
        }
        self
    }

    /// Primary authority of a service.
    pub fn authority(&self, service: &str) -> Option<&str> {
        self.services
            .get(&service.to_lowercase())
            .and_then(|a| a.first())
            .map(String::as_str)
    }

    pub fn authorities(&self, service: &str) -> &[String] {
        self.services
            .get(&service.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Name of the service whose authorities include the one of `url`.
    pub fn service_for(&self, url: &str) -> Option<&str> {
        let authority = authority_of(url)?;
        self.services
            .iter()
            .find(|(_, authorities)| authorities.iter().any(|a| *a == authority))
            .map(|(service, _)| service.as_str())
    }

    /// Every other authority of the service `url` belongs to, primary first.
    pub fn mirrors_for(&self, url: &str) -> Vec<&str> {
        let Some(authority) = authority_of(url) else {
            return Vec::new();
        };
        let Some(service) = self.service_for(url) else {
            return Vec::new();
        };
        self.authorities(service)
            .iter()
            .filter(|a| **a != authority)
            .map(String::as_str)
            .collect()
    }
}

fn normalize_authority(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Immutable settings shared by every resolution call.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Fixed client identity sent on every request and replayed by players.
    pub user_agent: String,
    pub timeout: Duration,
    /// Logical service whose authority anchors relative URLs.
    pub service: String,
    /// Also probe `<watch>?file=<id>&s=alt` when the page itself does not link it.
    pub follow_synthesized_alternate: bool,
    pub domains: DomainConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_UA.to_string(),
            timeout: DEFAULT_TIMEOUT,
            service: ANIMESATURN.to_string(),
            follow_synthesized_alternate: true,
            domains: DomainConfig::default(),
        }
    }
}

impl ResolverConfig {
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::default()
    }

    pub fn authority(&self) -> &str {
        self.domains
            .authority(&self.service)
            .unwrap_or(DEFAULT_AUTHORITY)
    }

    /// `https://<authority>` of the configured service.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.authority())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.config.service = service.into();
        self
    }

    pub fn follow_synthesized_alternate(mut self, follow: bool) -> Self {
        self.config.follow_synthesized_alternate = follow;
        self
    }

    pub fn domains(mut self, domains: DomainConfig) -> Self {
        self.config.domains = domains;
        self
    }

    pub fn build(self) -> ResolverConfig {
        self.config
    }
}
