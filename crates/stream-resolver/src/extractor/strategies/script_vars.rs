use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

use super::{Extraction, ExtractionStrategy, PageContext};
use crate::extractor::{classifier::CandidateSet, error::ExtractorError, utils::unescape_script_text};
use crate::media::{MediaExtension, SourceStrategy, StreamCandidate};

// `file: "..."`, `'src': '...'`, `"url":"..."`; the value may contain escaped quotes
static KEY_VALUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?\b(file|source|src|url)["']?\s*:\s*(?:"((?:\\.|[^"\\])*)"|'((?:\\.|[^'\\])*)')"#)
        .unwrap()
});

static PLAYER_DATA_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"player_data\s*=\s*([^;]+)").unwrap());

const URL_KEYS: [&str; 4] = ["file", "source", "src", "url"];
const QUALITY_KEYS: [&str; 4] = ["label", "quality", "res", "size"];

/// A script value that is itself a media URL.
///
/// Accepts absolute, protocol-relative and root-relative forms.
fn is_media_url(value: &str) -> bool {
    let value = value.trim();
    let shaped = value.starts_with("http://")
        || value.starts_with("https://")
        || value.starts_with("//")
        || value.starts_with('/');
    shaped && !value.contains(char::is_whitespace) && MediaExtension::from_url(value).is_some()
}

/// Decodes the escapes of a quoted script string.
fn decode_string_literal(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\""))
        .unwrap_or_else(|_| unescape_script_text(raw).replace("\\'", "'"))
}

fn quality_of(object: &serde_json::Map<String, Value>) -> Option<String> {
    QUALITY_KEYS.iter().find_map(|key| match object.get(*key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Walks a JSON document and collects every media URL it carries.
fn collect_json(value: &Value, quality: Option<&str>, out: &mut Vec<StreamCandidate>) {
    match value {
        Value::String(s) if is_media_url(s) => {
            out.push(StreamCandidate::new(s.trim(), SourceStrategy::ScriptVariable).with_quality(quality));
        }
        Value::String(s) => {
            // values like `file: "{\"file\":\"...\"}"` nest one more document
            let trimmed = s.trim_start();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                if let Ok(inner) = serde_json::from_str::<Value>(trimmed) {
                    collect_json(&inner, quality, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json(item, quality, out);
            }
        }
        Value::Object(object) => {
            let quality = quality_of(object);
            for (key, value) in object {
                if URL_KEYS.contains(&key.as_str()) || value.is_object() || value.is_array() {
                    collect_json(value, quality.as_deref(), out);
                }
            }
        }
        _ => {}
    }
}

fn mine_key_values(text: &str, out: &mut Vec<StreamCandidate>) {
    for caps in KEY_VALUE_REGEX.captures_iter(text) {
        let Some(raw) = caps.get(2).or_else(|| caps.get(3)) else {
            continue;
        };
        let value = decode_string_literal(raw.as_str());
        let trimmed = value.trim();

        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            match serde_json::from_str::<Value>(trimmed) {
                Ok(document) => collect_json(&document, None, out),
                // not JSON, but it may still be a script object literal
                Err(_) => mine_key_values(trimmed, out),
            }
        } else if is_media_url(trimmed) {
            out.push(StreamCandidate::new(trimmed, SourceStrategy::ScriptVariable));
        }
    }
}

/// Mines `file:`/`source:`/`src:`/`url:` assignments and `player_data` objects
/// from inline scripts.
pub struct ScriptVariableMining;

impl ExtractionStrategy for ScriptVariableMining {
    fn kind(&self) -> SourceStrategy {
        SourceStrategy::ScriptVariable
    }

    fn extract(&self, page: &PageContext<'_>) -> Result<Extraction, ExtractorError> {
        let mut candidates = Vec::new();
        mine_key_values(page.content, &mut candidates);

        for caps in PLAYER_DATA_REGEX.captures_iter(page.content) {
            let Some(raw) = caps.get(1) else { continue };
            match serde_json::from_str::<Value>(raw.as_str().trim()) {
                Ok(document) => collect_json(&document, None, &mut candidates),
                Err(e) => {
                    debug!(error = %e, "player_data is not JSON, falling back to key patterns");
                    mine_key_values(raw.as_str(), &mut candidates);
                }
            }
        }

        // the same url is usually matched both as a key and inside player_data
        let candidates = candidates.into_iter().collect::<CandidateSet>().into_vec();
        Ok(Extraction::from_candidates(candidates))
    }
}
