use anyhow::Context;
use nanogen_session::{ControllerConfig, GateConfig};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub controller: ControllerConfig,
    /// Overrides the per-feature gate settings when present.
    pub gate: Option<GateConfig>,
    /// Delay between simulated keystrokes.
    pub keystroke_ms: u64,
    pub article: String,
    pub draft: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            gate: None,
            keystroke_ms: 40,
            article: "On-device models keep user text on the phone. They trade raw \
                      quality for latency and privacy, and they must be downloaded \
                      once before first use."
                .to_string(),
            draft: "the teem nids to urgntly fx dis isu bfor d big product lanch.".to_string(),
        }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}
