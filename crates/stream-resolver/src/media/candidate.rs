use serde::{Deserialize, Serialize};

/// Identifies the heuristic that produced a candidate.
///
/// The declaration order is the order strategies run in.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceStrategy {
    DirectScan,
    Markup,
    ScriptVariable,
    PlayerSetup,
    Base64Payload,
    AlternatePlayer,
}

impl SourceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStrategy::DirectScan => "direct-scan",
            SourceStrategy::Markup => "markup",
            SourceStrategy::ScriptVariable => "script-variable",
            SourceStrategy::PlayerSetup => "player-setup",
            SourceStrategy::Base64Payload => "base64-payload",
            SourceStrategy::AlternatePlayer => "alternate-player",
        }
    }
}

/// A not-yet-finalized discovery made by one extraction strategy.
///
/// `url` may still be relative or protocol-relative at this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCandidate {
    pub url: String,
    pub source_strategy: SourceStrategy,
    pub raw_quality_hint: Option<String>,
}

impl StreamCandidate {
    pub fn new(url: impl Into<String>, source_strategy: SourceStrategy) -> Self {
        Self {
            url: url.into(),
            source_strategy,
            raw_quality_hint: None,
        }
    }

    /// Attaches a quality label; blank labels are ignored.
    pub fn with_quality(mut self, quality: Option<&str>) -> Self {
        self.raw_quality_hint = quality
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(ToOwned::to_owned);
        self
    }
}
