//! Tunables for controllers and input gates.

use nanogen_models::Feature;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quiet period an edit must survive before it is considered.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Proofreading waits for more than this many characters.
pub const MIN_PROOFREAD_CHARS: usize = 5;

/// Auto-rewrite waits for more than this many words.
pub const MIN_REWRITE_WORDS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Give up on a status check after this long. Unbounded when absent.
    pub status_timeout_ms: Option<u64>,
}

impl ControllerConfig {
    pub fn status_timeout(&self) -> Option<Duration> {
        self.status_timeout_ms.map(Duration::from_millis)
    }
}

/// Minimum content a debounced value needs before it triggers a submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "min", rename_all = "snake_case")]
pub enum ContentFilter {
    #[default]
    NonBlank,
    /// More than `n` characters after trimming.
    MinChars(usize),
    /// More than `n` whitespace-separated words.
    MinWords(usize),
}

impl ContentFilter {
    pub fn admits(&self, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return false;
        }
        match *self {
            Self::NonBlank => true,
            Self::MinChars(n) => trimmed.chars().count() > n,
            Self::MinWords(n) => trimmed.split_whitespace().count() > n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub debounce_ms: u64,
    pub filter: ContentFilter,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            filter: ContentFilter::NonBlank,
        }
    }
}

impl GateConfig {
    /// Gate settings used by the typing-driven features.
    pub fn for_feature(feature: Feature) -> Self {
        let filter = match feature {
            Feature::Proofreading => ContentFilter::MinChars(MIN_PROOFREAD_CHARS),
            Feature::Rewrite => ContentFilter::MinWords(MIN_REWRITE_WORDS),
            Feature::Summarization | Feature::ImageDescription => ContentFilter::NonBlank,
        };
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_chars() {
        let filter = ContentFilter::MinChars(5);
        assert!(!filter.admits("typo"));
        assert!(!filter.admits("  hello  "));
        assert!(filter.admits("hello!"));
    }

    #[test]
    fn test_min_words() {
        let filter = ContentFilter::MinWords(3);
        assert!(!filter.admits("fix this now"));
        assert!(filter.admits("fix this issue now"));
    }

    #[test]
    fn test_blank_never_admitted() {
        for filter in [
            ContentFilter::NonBlank,
            ContentFilter::MinChars(0),
            ContentFilter::MinWords(0),
        ] {
            assert!(!filter.admits(" \t\n"));
        }
    }

    #[test]
    fn test_feature_defaults() {
        assert_eq!(
            GateConfig::for_feature(Feature::Proofreading).filter,
            ContentFilter::MinChars(MIN_PROOFREAD_CHARS)
        );
        assert_eq!(
            GateConfig::for_feature(Feature::Rewrite).filter,
            ContentFilter::MinWords(MIN_REWRITE_WORDS)
        );
        assert_eq!(GateConfig::default().debounce(), DEFAULT_DEBOUNCE);
    }

    #[test]
    fn test_gate_config_from_json() {
        let config: GateConfig =
            serde_json::from_str(r#"{"debounce_ms": 250, "filter": {"kind": "min_words", "min": 2}}"#)
                .unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.filter, ContentFilter::MinWords(2));

        let config: ControllerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.status_timeout(), None);
    }
}
