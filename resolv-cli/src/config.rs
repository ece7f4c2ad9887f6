use crate::error::{CliError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use stream_resolver::{
    DomainConfig, MediaFlowProxy, ResolverConfig, VavooCredentials, extractor::DEFAULT_UA,
};
use tracing::debug;

const CONFIG_DIR: &str = "resolv";
const CONFIG_FILE: &str = "config.toml";

fn default_timeout_secs() -> u64 {
    20
}

fn default_follow_alternate() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// JSON file mapping service names to authorities and mirrors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains_file: Option<PathBuf>,
    /// JSON list of IPTV channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels_file: Option<PathBuf>,
    #[serde(default = "default_follow_alternate")]
    pub follow_alternate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediaflow_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediaflow_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv_proxy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vavoo_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vavoo_vec: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
            domains_file: None,
            channels_file: None,
            follow_alternate: default_follow_alternate(),
            mediaflow_url: None,
            mediaflow_password: None,
            tv_proxy_url: None,
            vavoo_token: None,
            vavoo_vec: None,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
            .ok_or_else(|| CliError::config("no user configuration directory"))
    }

    fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path(),
        }
    }

    /// Loads the configuration; a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = Self::resolve_path(path)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn reset(path: Option<&Path>) -> Result<()> {
        Self::default().save(path)
    }

    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builds the immutable resolver settings, loading the domain file if any.
    pub fn resolver_config(&self, timeout_override: Option<u64>) -> ResolverConfig {
        let domains = match &self.domains_file {
            Some(path) => DomainConfig::load(path),
            None => DomainConfig::default(),
        };

        ResolverConfig::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_UA))
            .timeout(Duration::from_secs(
                timeout_override.unwrap_or(self.timeout_secs),
            ))
            .follow_synthesized_alternate(self.follow_alternate)
            .domains(domains)
            .build()
    }

    pub fn mediaflow(&self) -> Option<MediaFlowProxy> {
        let url = self.mediaflow_url.as_deref()?;
        Some(MediaFlowProxy::new(
            url,
            self.mediaflow_password.clone().unwrap_or_default(),
        ))
    }

    /// Credentials for the signed channel API, when any are configured.
    pub fn vavoo_credentials(&self) -> Option<VavooCredentials> {
        if self.vavoo_token.is_none() && self.vavoo_vec.is_none() {
            return None;
        }
        Some(VavooCredentials {
            token: self.vavoo_token.clone(),
            vec: self.vavoo_vec.clone(),
        })
    }
}
