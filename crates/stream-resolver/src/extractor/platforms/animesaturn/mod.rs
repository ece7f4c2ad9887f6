mod builder;
mod models;

pub use builder::{AnimeSaturn, parse_episodes, parse_search_results, parse_watch_url};
pub use models::{AnimeEntry, Episode};
