use nanogen_models::{DownloadProgress, Feature};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    CheckingStatus,
    Downloading,
    Inferring,
    Completed,
    Failed,
}

impl Phase {
    /// True while a session is doing work on behalf of the user.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::CheckingStatus | Self::Downloading | Self::Inferring)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::CheckingStatus => "checking_status",
            Self::Downloading => "downloading",
            Self::Inferring => "inferring",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Snapshot published to observers of a controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub phase: Phase,
    pub output: String,
    pub progress: DownloadProgress,
    pub error: Option<String>,
}

impl ControllerState {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh state for a session that is about to query the service.
    pub fn checking() -> Self {
        Self {
            phase: Phase::CheckingStatus,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Failed,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Text for the feature's action button.
    pub fn action_label(&self, feature: Feature) -> String {
        if self.phase == Phase::Downloading || self.progress.is_in_flight() {
            return "Downloading...".to_string();
        }
        if self.phase.is_busy() {
            return format!("{}...", feature.progressive());
        }
        feature.verb().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_labels() {
        let mut state = ControllerState::idle();
        assert_eq!(state.action_label(Feature::Summarization), "Summarize");

        state.phase = Phase::CheckingStatus;
        assert_eq!(state.action_label(Feature::Summarization), "Summarizing...");

        state.phase = Phase::Downloading;
        state.progress.start(100);
        state.progress.advance(10);
        assert_eq!(state.action_label(Feature::ImageDescription), "Downloading...");

        state.phase = Phase::Inferring;
        state.progress.advance(100);
        assert_eq!(state.action_label(Feature::Rewrite), "Rewriting...");

        state.phase = Phase::Completed;
        assert_eq!(state.action_label(Feature::Proofreading), "Proofread");
    }

    #[test]
    fn test_failed_state() {
        let state = ControllerState::failed("Input is empty.");
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some("Input is empty."));
        assert!(state.output.is_empty());
        assert!(state.phase.is_terminal());
    }
}
