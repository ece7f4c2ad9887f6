use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "resolv",
    author,
    version,
    about = "Resolve playable streams from anime watch pages and IPTV channels",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "RESOLV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Request timeout in seconds, overrides the configuration file
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the anime catalog
    Search {
        #[arg(long)]
        query: String,

        /// MyAnimeList id of the title, used for diagnostics only
        #[arg(long)]
        mal_id: Option<String>,
    },

    /// List the episodes of an anime page
    #[command(name = "get_episodes", alias = "episodes")]
    GetEpisodes {
        #[arg(long)]
        anime_url: String,
    },

    /// Quick lookup of the first direct stream of an episode
    #[command(name = "get_stream", alias = "stream")]
    GetStream {
        #[arg(long)]
        episode_url: String,
    },

    /// Every stream of an episode, ranked and deduplicated
    #[command(name = "get_all_streams", alias = "streams")]
    GetAllStreams {
        #[arg(long)]
        episode_url: String,

        /// Drop streams that do not answer a HEAD or ranged GET
        #[arg(long)]
        probe: bool,

        /// Only keep streams whose server label matches this regex
        #[cfg(feature = "regex-filters")]
        #[arg(long)]
        server_filter: Option<String>,
    },

    /// Run the resolver directly on a watch page
    Resolve {
        #[arg(long)]
        url: String,

        #[arg(long)]
        probe: bool,

        #[cfg(feature = "regex-filters")]
        #[arg(long)]
        server_filter: Option<String>,
    },

    /// Resolve an IPTV channel (`tv:<id>` or `<id>`) from the channel list
    Channel {
        #[arg(long)]
        id: String,
    },

    /// Download the best direct stream of an episode
    Download {
        #[arg(long)]
        episode_url: String,

        /// Target file or directory
        #[arg(long = "output-path", short = 'O')]
        output_path: Option<PathBuf>,
    },

    /// Search, pick an anime and an episode, then print its streams
    #[cfg(feature = "interactive")]
    Interactive,

    /// Show or reset the configuration
    Config {
        #[arg(long)]
        show: bool,

        #[arg(long, conflicts_with = "show")]
        reset: bool,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented JSON
    #[default]
    Json,
    /// Single-line JSON
    JsonCompact,
    /// Human readable, coloured when supported
    Pretty,
    /// Table layout
    Table,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::JsonCompact)
    }
}
