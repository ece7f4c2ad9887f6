use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::{Extraction, ExtractionStrategy, PageContext};
use crate::extractor::{classifier::CandidateSet, error::ExtractorError, utils::unescape_script_text};
use crate::media::{MediaExtension, SourceStrategy, StreamCandidate};

// call sites that receive the player configuration object as first argument
static SETUP_CALL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:jwplayer\s*\([^)]*\)\s*\.setup|new\s+Playerjs|new\s+Clappr\.Player|videojs\s*\([^,)]*,)\s*\(?\s*\{",
    )
    .unwrap()
});

static SOURCE_ENTRY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

static FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\b(?:file|src|source)["']?\s*:\s*["']([^"']+)["']"#).unwrap()
});

static LABEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\b(?:label|quality|res)["']?\s*:\s*["']?([^"',}\s]+)"#).unwrap()
});

/// Returns the `{ ... }` object starting at byte `open`, honouring nesting and
/// quoted strings.
fn balanced_object(text: &str, open: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate().skip(open) {
        if let Some(q) = quote {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                _ if b == q => quote = None,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[open..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn push_source(out: &mut Vec<StreamCandidate>, url: &str, label: Option<&str>) {
    let url = unescape_script_text(url.trim()).into_owned();
    if MediaExtension::from_url(&url).is_some() {
        out.push(StreamCandidate::new(url, SourceStrategy::PlayerSetup).with_quality(label));
    }
}

fn label_of(entry: &serde_json::Map<String, Value>) -> Option<String> {
    ["label", "quality", "res"].iter().find_map(|k| match entry.get(*k) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Reads a setup object that happens to be strict JSON.
fn sources_from_json(config: &Value, out: &mut Vec<StreamCandidate>) {
    let Some(config) = config.as_object() else {
        return;
    };
    for key in ["file", "src", "source"] {
        if let Some(Value::String(url)) = config.get(key) {
            push_source(out, url, label_of(config).as_deref());
        }
    }
    let entries = config
        .get("sources")
        .or_else(|| config.get("playlist"))
        .and_then(Value::as_array);
    for entry in entries.into_iter().flatten() {
        match entry {
            Value::String(url) => push_source(out, url, None),
            Value::Object(_) => sources_from_json(entry, out),
            _ => {}
        }
    }
}

/// Reads a setup object written as a script literal (unquoted keys, single quotes).
fn sources_from_literal(config: &str, out: &mut Vec<StreamCandidate>) {
    let mut covered = Vec::new();
    for entry in SOURCE_ENTRY_REGEX.find_iter(config) {
        let text = entry.as_str();
        if let Some(file) = FILE_REGEX.captures(text).and_then(|c| c.get(1)) {
            let label = LABEL_REGEX
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str());
            push_source(out, file.as_str(), label);
            covered.push(entry.range());
        }
    }

    // a single top level `file:` outside any nested entry
    for caps in FILE_REGEX.captures_iter(config) {
        let Some(file) = caps.get(1) else { continue };
        if covered.iter().any(|r| r.contains(&file.start())) {
            continue;
        }
        push_source(out, file.as_str(), None);
    }
}

/// Reads the source list handed to embedded third-party players
/// (JW Player, Playerjs, Clappr, video.js).
pub struct PlayerSetupBlocks;

impl ExtractionStrategy for PlayerSetupBlocks {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::PlayerSetup
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Extraction, ExtractorError> {
        let mut candidates = Vec::new();
        let mut blocks = 0usize;

        for call in SETUP_CALL_REGEX.find_iter(page.content) {
            let open = call.end() - 1;
            let Some(config) = balanced_object(page.content, open) else {
                continue;
            };
            blocks += 1;

            match serde_json::from_str::<Value>(config) {
                Ok(json) => sources_from_json(&json, &mut candidates),
                Err(_) => sources_from_literal(config, &mut candidates),
            }
        }

        if blocks > 0 && candidates.is_empty() {
            return Err(ExtractorError::parse_degraded(format!(
                "{blocks} player setup block(s) without playable sources"
            )));
        }

        let candidates = candidates.into_iter().collect::<CandidateSet>().into_vec();
        Ok(Extraction::from_candidates(candidates))
    }
}
