//! Feature session controller.
//!
//! Drives one feature through status check, optional model download and
//! streaming inference. Each `submit()` opens a new session and supersedes the
//! previous one; observers only ever see state published by the live session.

use crate::config::ControllerConfig;
use crate::error::{Result, SessionError};
use crate::session::{Session, StateCell};
use crate::state::{ControllerState, Phase};
use nanogen_models::{Feature, FeatureStatus};
use nanogen_service::{DownloadEvent, FeatureRequest, FeatureService, InferenceEvent};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// How a session task ended.
#[derive(Debug)]
enum Outcome {
    Completed,
    Failed(SessionError),
    /// A newer session or `cancel()` took over; nothing may be published.
    Superseded,
}

impl From<SessionError> for Outcome {
    fn from(e: SessionError) -> Self {
        Outcome::Failed(e)
    }
}

pub struct FeatureController<S: FeatureService> {
    feature: Feature,
    service: Arc<S>,
    config: ControllerConfig,
    cell: Arc<StateCell>,
    runtime: Handle,
}

impl<S: FeatureService> FeatureController<S> {
    pub fn new(feature: Feature, service: S) -> Self {
        Self::with_config(feature, service, ControllerConfig::default())
    }

    /// Sessions run on the Tokio runtime current at construction.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn with_config(feature: Feature, service: S, config: ControllerConfig) -> Self {
        Self {
            feature,
            service: Arc::new(service),
            config,
            cell: Arc::new(StateCell::new()),
            runtime: Handle::current(),
        }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Observe published state. Late subscribers see the latest value first.
    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.cell.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        self.cell.snapshot()
    }

    /// Epoch of the most recent session, 0 before the first submit.
    pub fn epoch(&self) -> u64 {
        self.cell.epoch()
    }

    /// Start a new session for `input`, superseding any live one.
    ///
    /// May be called from any thread.
    pub fn submit(&self, input: S::Request) {
        if input.is_empty() {
            let (epoch, _) = self
                .cell
                .begin(ControllerState::failed(SessionError::EmptyInput.to_string()));
            self.cell.finish(epoch);
            tracing::debug!(feature = %self.feature, epoch, "rejected empty input");
            return;
        }

        let (epoch, token) = self.cell.begin(ControllerState::checking());
        tracing::debug!(feature = %self.feature, epoch, "session started");

        let session = Session::new(epoch, input, token, Arc::clone(&self.cell));
        let service = Arc::clone(&self.service);
        let config = self.config.clone();
        let feature = self.feature;

        self.runtime.spawn(async move {
            run_session(feature, service, config, session).await;
        });
    }

    /// Stop the live session. Published state is left as it is.
    ///
    /// Returns false when no session was running.
    pub fn cancel(&self) -> bool {
        match self.cell.cancel() {
            Some(epoch) => {
                tracing::debug!(feature = %self.feature, epoch, "session cancelled");
                true
            }
            None => false,
        }
    }

    /// Dismiss the current result and return to idle.
    pub fn clear(&self) {
        self.cell.reset(ControllerState::idle());
    }
}

impl<S: FeatureService> Drop for FeatureController<S> {
    fn drop(&mut self) {
        self.cell.cancel();
        self.service.close();
        tracing::debug!(feature = %self.feature, "controller torn down");
    }
}

async fn run_session<S: FeatureService>(
    feature: Feature,
    service: Arc<S>,
    config: ControllerConfig,
    mut session: Session<S::Request>,
) {
    let epoch = session.epoch();
    let outcome = drive(service.as_ref(), &config, &mut session).await;

    match outcome {
        Outcome::Completed => {
            if session.publish(|state| state.phase = Phase::Completed) {
                tracing::info!(
                    feature = %feature,
                    epoch,
                    output_len = session.output().len(),
                    "session completed"
                );
            }
        }
        Outcome::Failed(e) => {
            let message = e.to_string();
            if session.publish(|state| {
                state.phase = Phase::Failed;
                state.error = Some(message);
            }) {
                tracing::warn!(feature = %feature, epoch, error = %e, "session failed");
            }
        }
        Outcome::Superseded => {
            tracing::debug!(feature = %feature, epoch, "stale session dropped");
            return;
        }
    }
    session.finish();
}

async fn drive<S: FeatureService>(
    service: &S,
    config: &ControllerConfig,
    session: &mut Session<S::Request>,
) -> Outcome {
    let status = tokio::select! {
        biased;
        _ = session.cancelled() => return Outcome::Superseded,
        status = check_status(service, config) => status,
    };
    let status = match status {
        Ok(status) => status,
        Err(e) => return e.into(),
    };
    tracing::debug!(epoch = session.epoch(), %status, "feature status");

    match status {
        FeatureStatus::Unavailable => SessionError::FeatureUnavailable.into(),
        FeatureStatus::Downloading => SessionError::FeatureBusy.into(),
        FeatureStatus::Downloadable => match download(service, session).await {
            Outcome::Completed => infer(service, session).await,
            other => other,
        },
        FeatureStatus::Available => infer(service, session).await,
    }
}

async fn check_status<S: FeatureService>(
    service: &S,
    config: &ControllerConfig,
) -> Result<FeatureStatus> {
    let Some(limit) = config.status_timeout() else {
        return Ok(service.check_status().await?);
    };
    match tokio::time::timeout(limit, service.check_status()).await {
        Ok(status) => Ok(status?),
        Err(_) => Err(SessionError::UnexpectedError(format!(
            "status check timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

async fn download<S: FeatureService>(service: &S, session: &mut Session<S::Request>) -> Outcome {
    if !session.publish(|state| state.phase = Phase::Downloading) {
        return Outcome::Superseded;
    }

    let mut events = service.download();
    loop {
        let next = tokio::select! {
            biased;
            _ = session.cancelled() => None,
            event = events.next() => Some(event),
        };
        let Some(event) = next else {
            events.unsubscribe();
            return Outcome::Superseded;
        };

        let applied = match event {
            Some(DownloadEvent::Started(expected)) => {
                tracing::info!(epoch = session.epoch(), expected_bytes = expected, "download started");
                session.publish(|state| state.progress.start(expected))
            }
            Some(DownloadEvent::Progress(downloaded)) => {
                session.publish(|state| state.progress.advance(downloaded))
            }
            Some(DownloadEvent::Failed(reason)) => {
                return SessionError::DownloadFailed(reason).into();
            }
            Some(DownloadEvent::Completed) => {
                tracing::info!(epoch = session.epoch(), "download completed");
                return Outcome::Completed;
            }
            None => {
                return SessionError::DownloadFailed("download stream closed".to_string()).into();
            }
        };

        if !applied {
            events.unsubscribe();
            return Outcome::Superseded;
        }
    }
}

async fn infer<S: FeatureService>(service: &S, session: &mut Session<S::Request>) -> Outcome {
    let Some(request) = session.take_input() else {
        return SessionError::UnexpectedError("session input already consumed".to_string()).into();
    };
    if !session.publish(|state| state.phase = Phase::Inferring) {
        return Outcome::Superseded;
    }

    let mut tokens = service.infer(request);
    loop {
        let next = tokio::select! {
            biased;
            _ = session.cancelled() => None,
            event = tokens.next() => Some(event),
        };
        let Some(event) = next else {
            tokens.unsubscribe();
            return Outcome::Superseded;
        };

        match event {
            Some(InferenceEvent::Token(token)) => {
                if !session.append(&token) {
                    tokens.unsubscribe();
                    return Outcome::Superseded;
                }
            }
            // A stream that closes without `Done` has still ended.
            Some(InferenceEvent::Done) | None => return Outcome::Completed,
            Some(InferenceEvent::Failed(reason)) => {
                return SessionError::UnexpectedError(reason).into();
            }
        }
    }
}
