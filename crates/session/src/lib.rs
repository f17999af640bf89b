//! Session control for on-device generative features.
//!
//! A `FeatureController` checks whether a feature model is installed, drives
//! its download, streams inference output and discards work that a newer
//! submission has superseded. An `InputGate` turns a stream of raw edits into
//! debounced submissions for the typing-driven features.
//!
//! # Example
//!
//! ```ignore
//! use nanogen_models::{Feature, FeatureStatus};
//! use nanogen_service::ScriptedService;
//! use nanogen_session::FeatureController;
//!
//! let service = ScriptedService::new(FeatureStatus::Available).with_tokens(["Hi", "!"]);
//! let controller = FeatureController::new(Feature::Summarization, service);
//! controller.submit("A long article...".to_string());
//! let mut state = controller.subscribe();
//! state.wait_for(|s| s.phase.is_terminal()).await?;
//! ```

mod config;
mod controller;
mod error;
mod gate;
mod session;
mod state;

pub use config::{
    ContentFilter, ControllerConfig, GateConfig, DEFAULT_DEBOUNCE, MIN_PROOFREAD_CHARS,
    MIN_REWRITE_WORDS,
};
pub use controller::FeatureController;
pub use error::{Result, SessionError};
pub use gate::{admit, Admission, GateHandler, InputGate};
pub use state::{ControllerState, Phase};
