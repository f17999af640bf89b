use crate::{FeatureRequest, Result, Subscription};
use async_trait::async_trait;
use nanogen_models::FeatureStatus;

/// Event emitted while a feature model downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// Download began; carries the announced size in bytes.
    Started(i64),
    /// Cumulative bytes downloaded so far.
    Progress(i64),
    Failed(String),
    Completed,
}

/// Event emitted while inference streams output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceEvent {
    Token(String),
    /// Explicit end of stream.
    Done,
    Failed(String),
}

impl InferenceEvent {
    pub fn token(text: impl Into<String>) -> Self {
        Self::Token(text.into())
    }
}

/// One on-device generative capability.
///
/// Implementations adapt a host inference library. The controller depends on
/// this trait only, so the host can be swapped for `ScriptedService` in tests.
#[async_trait]
pub trait FeatureService: Send + Sync + 'static {
    type Request: FeatureRequest;

    /// Report whether the feature model is installed.
    async fn check_status(&self) -> Result<FeatureStatus>;

    /// Start fetching the feature model.
    ///
    /// Events are delivered in order: `Started`, any number of `Progress`,
    /// then exactly one of `Failed` or `Completed`.
    fn download(&self) -> Subscription<DownloadEvent>;

    /// Run inference, streaming zero or more tokens followed by `Done`.
    fn infer(&self, request: Self::Request) -> Subscription<InferenceEvent>;

    /// Release the underlying host handle.
    ///
    /// Called once when the owning controller is torn down.
    fn close(&self) {}
}

#[async_trait]
impl<T: FeatureService> FeatureService for std::sync::Arc<T> {
    type Request = T::Request;

    async fn check_status(&self) -> Result<FeatureStatus> {
        self.as_ref().check_status().await
    }

    fn download(&self) -> Subscription<DownloadEvent> {
        self.as_ref().download()
    }

    fn infer(&self, request: Self::Request) -> Subscription<InferenceEvent> {
        self.as_ref().infer(request)
    }

    fn close(&self) {
        self.as_ref().close()
    }
}
