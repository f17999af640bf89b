//! Capability contract for on-device generative features.
//!
//! This crate provides:
//! - The `FeatureService` trait a host inference library is adapted to
//! - Request types for text, rewrite and image features
//! - A cancelable push channel (`Sink` / `Subscription`) replacing host callbacks
//! - `ScriptedService`, a deterministic in-memory service for tests and demos

mod request;
mod scripted;
mod service;
mod subscription;

pub use request::{FeatureRequest, ImageInput, RewriteRequest};
pub use scripted::ScriptedService;
pub use service::{DownloadEvent, FeatureService, InferenceEvent};
pub use subscription::{subscription, Sink, Subscription};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("service closed")]
    Closed,
    #[error("status check failed: {0}")]
    StatusCheck(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
