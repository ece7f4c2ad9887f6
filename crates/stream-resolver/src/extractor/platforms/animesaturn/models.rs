use serde::{Deserialize, Serialize};

/// One row of the live search endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct SearchItem {
    pub name: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimeEntry {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    pub url: String,
}
