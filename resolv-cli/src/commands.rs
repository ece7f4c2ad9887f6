use crate::{
    cli::OutputFormat,
    config::AppConfig,
    error::{CliError, Result},
    output::{OutputManager, write_output},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::Path, sync::Arc, time::Duration};
use stream_resolver::{
    AnimeSaturn, ChannelCatalog, ChannelSources, ResolverConfig, StreamCategory, StreamDescriptor,
    StreamResolver, VavooClient, download,
    extractor::{classify, default_client, retain_reachable},
};
use tracing::{debug, info};
use url::Url;

/// Rejects anything that is not an absolute http(s) URL.
fn validate_url(raw: &str) -> Result<()> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| CliError::invalid_input(format!("{raw}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CliError::invalid_input(format!("{raw}: not an http(s) url")));
    }
    Ok(())
}

pub struct CommandExecutor {
    config: AppConfig,
    resolver_config: Arc<ResolverConfig>,
    output: OutputManager,
    format: OutputFormat,
}

impl CommandExecutor {
    pub fn new(config: AppConfig, timeout_override: Option<u64>, format: OutputFormat) -> Self {
        let resolver_config = Arc::new(config.resolver_config(timeout_override));
        Self {
            config,
            resolver_config,
            output: OutputManager::new(matches!(format, OutputFormat::Pretty)),
            format,
        }
    }

    fn site(&self) -> Result<AnimeSaturn> {
        Ok(AnimeSaturn::new(self.resolver_config.clone())?)
    }

    /// Spinner on stderr for human-facing output modes only.
    fn spinner(&self, message: &'static str) -> Option<ProgressBar> {
        if self.format.is_json() {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&[
                    "▹▹▹▹▹",
                    "▸▹▹▹▹",
                    "▹▸▹▹▹",
                    "▹▹▸▹▹",
                    "▹▹▹▸▹",
                    "▹▹▹▹▸",
                    "▪▪▪▪▪",
                ]),
        );
        pb.set_message(message);
        Some(pb)
    }

    pub async fn search(&self, query: &str, mal_id: Option<&str>) -> Result<()> {
        let pb = self.spinner("Searching catalog...");
        let results = self.site()?.search(query, mal_id).await?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        write_output(&self.output.format_listing("Results", &results, &self.format)?)
    }

    pub async fn episodes(&self, anime_url: &str) -> Result<()> {
        validate_url(anime_url)?;
        let pb = self.spinner("Fetching episode list...");
        let episodes = self.site()?.episodes(anime_url).await?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        write_output(&self.output.format_listing("Episodes", &episodes, &self.format)?)
    }

    pub async fn stream(&self, episode_url: &str) -> Result<()> {
        validate_url(episode_url)?;
        let pb = self.spinner("Looking for a direct stream...");
        let site = self.site()?;
        let stream = match site.watch_url(episode_url).await? {
            Some(watch_url) => site.first_stream(&watch_url).await?,
            None => None,
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        write_output(&self.output.format_stream(stream.as_ref(), &self.format)?)
    }

    pub async fn all_streams(
        &self,
        episode_url: &str,
        probe: bool,
        server_filter: Option<&str>,
    ) -> Result<()> {
        validate_url(episode_url)?;
        let pb = self.spinner("Resolving streams...");
        let site = self.site()?;
        let streams = site.all_streams(episode_url).await?;
        let streams = self.finish(site.client(), streams, probe, server_filter).await?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        write_output(&self.output.format_streams(&streams, &self.format)?)
    }

    pub async fn resolve(&self, url: &str, probe: bool, server_filter: Option<&str>) -> Result<()> {
        validate_url(url)?;
        let pb = self.spinner("Resolving streams...");
        let resolver = StreamResolver::from_config(self.resolver_config.clone())?;
        let streams = resolver.resolve(url).await;
        let streams = self
            .finish(resolver.fetcher().client(), streams, probe, server_filter)
            .await?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        write_output(&self.output.format_streams(&streams, &self.format)?)
    }

    async fn finish(
        &self,
        client: &reqwest::Client,
        streams: Vec<StreamDescriptor>,
        probe: bool,
        server_filter: Option<&str>,
    ) -> Result<Vec<StreamDescriptor>> {
        let streams = filter_by_server(streams, server_filter)?;
        if !probe {
            return Ok(streams);
        }
        let before = streams.len();
        let streams = retain_reachable(client, streams).await;
        debug!(before, after = streams.len(), "Probed streams");
        Ok(streams)
    }

    pub async fn channel(&self, id: &str) -> Result<()> {
        let path = self
            .config
            .channels_file
            .as_deref()
            .ok_or_else(|| CliError::config("channels_file is not set"))?;
        let catalog = ChannelCatalog::load(path).await?;
        if catalog.find(id).is_none() {
            return Err(CliError::not_found(format!("channel {id}")));
        }

        let mediaflow = self.config.mediaflow();
        let vavoo = match self.config.vavoo_credentials() {
            Some(credentials) => Some(VavooClient::new(
                default_client(&self.resolver_config)?,
                self.resolver_config.clone(),
                credentials,
            )),
            None => None,
        };
        let sources = ChannelSources {
            mediaflow: mediaflow.as_ref(),
            tv_proxy: self.config.tv_proxy_url.as_deref(),
            vavoo: vavoo.as_ref(),
        };

        let pb = self.spinner("Resolving channel...");
        let streams = catalog.resolve(id, sources).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        write_output(&self.output.format_streams(&streams, &self.format)?)
    }

    pub async fn download(&self, episode_url: &str, output_path: Option<&Path>) -> Result<()> {
        validate_url(episode_url)?;
        let site = self.site()?;
        let streams = site.all_streams(episode_url).await?;
        let stream = streams
            .into_iter()
            .find(|s| classify(&s.url) == StreamCategory::DirectFile)
            .ok_or_else(|| CliError::not_found(format!("direct stream for {episode_url}")))?;

        let path = download::target_path(&stream, output_path);
        info!(url = %stream.url, path = %path.display(), "Downloading");

        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        let bytes = download::download(site.client(), &stream, &path, |written, total| {
            if let Some(total) = total {
                pb.set_length(total);
            }
            pb.set_position(written);
        })
        .await?;
        pb.finish_and_clear();

        let summary = serde_json::json!({
            "status": "ok",
            "url": stream.url,
            "path": path.display().to_string(),
            "bytes": bytes,
        });
        let rendered = match self.format {
            OutputFormat::JsonCompact => serde_json::to_string(&summary)?,
            _ => serde_json::to_string_pretty(&summary)?,
        };
        write_output(&format!("{rendered}\n"))
    }

    #[cfg(feature = "interactive")]
    pub async fn interactive(&self) -> Result<()> {
        use inquire::{Select, Text};

        let site = self.site()?;
        let query = Text::new("Anime title:").prompt()?;
        let results = site.search(&query, None).await?;
        if results.is_empty() {
            return Err(CliError::not_found(format!("anime matching {query:?}")));
        }

        let titles: Vec<String> = results.iter().map(|r| r.title.clone()).collect();
        let choice = Select::new("Select an anime:", titles).raw_prompt()?;
        let anime = &results[choice.index];

        let episodes = site.episodes(&anime.url).await?;
        if episodes.is_empty() {
            return Err(CliError::not_found(format!("episodes for {}", anime.title)));
        }
        let titles: Vec<String> = episodes.iter().map(|e| e.title.clone()).collect();
        let choice = Select::new("Select an episode:", titles).raw_prompt()?;
        let episode = &episodes[choice.index];

        let pb = self.spinner("Resolving streams...");
        let streams = site.all_streams(&episode.url).await?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        write_output(&self.output.format_streams(&streams, &self.format)?)
    }
}

#[cfg(feature = "regex-filters")]
fn filter_by_server(
    streams: Vec<StreamDescriptor>,
    pattern: Option<&str>,
) -> Result<Vec<StreamDescriptor>> {
    let Some(pattern) = pattern else {
        return Ok(streams);
    };
    let re = regex::Regex::new(pattern)?;
    Ok(streams
        .into_iter()
        .filter(|s| re.is_match(&s.server_label))
        .collect())
}

#[cfg(not(feature = "regex-filters"))]
fn filter_by_server(
    streams: Vec<StreamDescriptor>,
    pattern: Option<&str>,
) -> Result<Vec<StreamDescriptor>> {
    if pattern.is_some() {
        return Err(CliError::invalid_input(
            "server filters need the regex-filters feature",
        ));
    }
    Ok(streams)
}
