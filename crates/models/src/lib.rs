mod progress;
mod rewrite;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use progress::{bytes_to_mb, DownloadProgress, BYTES_PER_MB};
pub use rewrite::RewriteStyle;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("unknown feature: {0}")]
    UnknownFeature(String),
    #[error("unknown rewrite style: {0}")]
    UnknownRewriteStyle(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Installation state of an on-device feature model, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    /// The device cannot run this feature at all.
    Unavailable,
    /// The model can be fetched; nothing is on disk yet.
    Downloadable,
    /// Another client already owns an in-flight download.
    Downloading,
    /// The model is installed and ready for inference.
    Available,
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unavailable => "unavailable",
            Self::Downloadable => "downloadable",
            Self::Downloading => "downloading",
            Self::Available => "available",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Summarization,
    Proofreading,
    Rewrite,
    ImageDescription,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Self::Summarization,
        Self::Proofreading,
        Self::Rewrite,
        Self::ImageDescription,
    ];

    pub fn route(&self) -> &'static str {
        match self {
            Self::Summarization => "summarization",
            Self::Proofreading => "proofreading",
            Self::Rewrite => "rewrite",
            Self::ImageDescription => "image_description",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Summarization => "Summarization",
            Self::Proofreading => "Proofreading",
            Self::Rewrite => "Rewrite",
            Self::ImageDescription => "Image Description",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            Self::Summarization => "Summarize articles or chats",
            Self::Proofreading => "Fix typos in short messages",
            Self::Rewrite => "Change tone or style of messages",
            Self::ImageDescription => "Generate alt text for an image",
        }
    }

    /// Imperative used on the action button ("Summarize").
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Summarization => "Summarize",
            Self::Proofreading => "Proofread",
            Self::Rewrite => "Rewrite",
            Self::ImageDescription => "Describe",
        }
    }

    /// Progressive form shown while inference runs ("Summarizing").
    pub fn progressive(&self) -> &'static str {
        match self {
            Self::Summarization => "Summarizing",
            Self::Proofreading => "Proofreading",
            Self::Rewrite => "Rewriting",
            Self::ImageDescription => "Describing",
        }
    }

    /// Whether the feature is fed by typing rather than an explicit action.
    pub fn is_auto_triggered(&self) -> bool {
        matches!(self, Self::Proofreading | Self::Rewrite)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

impl FromStr for Feature {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.route() == s)
            .ok_or_else(|| ModelError::UnknownFeature(s.to_string()))
    }
}
