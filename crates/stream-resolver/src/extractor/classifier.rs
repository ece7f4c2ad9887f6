//! URL-shape classification and per-page deduplication of candidates.

use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

use super::strategies::SERVER_PARAM;
use super::utils::query_param;
use crate::media::{MediaExtension, StreamCandidate, StreamCategory};

static WATCH_PAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:/watch\?(?:.*&)?file=|/play/|/video/|/embed/)").unwrap());

/// A brace-opened object with a bare, single- or double-quoted `file` key.
static SERIALIZED_OBJECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)^\{.*\bfile["']?\s*:"#).unwrap());

/// Assigns a category to a discovered URL.
///
/// Depends on nothing but the string itself; rules are tried in order and
/// the first match wins.
pub fn classify(url: &str) -> StreamCategory {
    let url = url.trim();

    if query_param(url, SERVER_PARAM).is_some() {
        return StreamCategory::NavigationLink;
    }
    // serialized script data that was never unwrapped
    if SERIALIZED_OBJECT_REGEX.is_match(url) {
        return StreamCategory::NavigationLink;
    }
    match MediaExtension::from_url(url) {
        Some(MediaExtension::Mp4 | MediaExtension::Webm) => return StreamCategory::DirectFile,
        _ => {}
    }
    if url.to_ascii_lowercase().contains(MediaExtension::M3u8.as_str()) {
        return StreamCategory::SegmentedPlaylist;
    }
    if WATCH_PAGE_REGEX.is_match(url) {
        return StreamCategory::NavigationLink;
    }
    StreamCategory::Unknown
}

/// Candidates of one page, unique by exact URL and in discovery order.
///
/// A duplicate never moves the first occurrence, but a quality hint it
/// carries fills in a missing one.
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<StreamCandidate>,
    index: FxHashMap<String, usize>,
}

impl CandidateSet {
    /// Returns `true` if the URL was not present yet.
    pub fn insert(&mut self, candidate: StreamCandidate) -> bool {
        if let Some(&pos) = self.index.get(&candidate.url) {
            let existing = &mut self.candidates[pos];
            if existing.raw_quality_hint.is_none() {
                existing.raw_quality_hint = candidate.raw_quality_hint;
            }
            return false;
        }
        self.index.insert(candidate.url.clone(), self.candidates.len());
        self.candidates.push(candidate);
        true
    }

    pub fn into_vec(self) -> Vec<StreamCandidate> {
        self.candidates
    }
}

impl FromIterator<StreamCandidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = StreamCandidate>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl Extend<StreamCandidate> for CandidateSet {
    fn extend<I: IntoIterator<Item = StreamCandidate>>(&mut self, iter: I) {
        for candidate in iter {
            self.insert(candidate);
        }
    }
}
