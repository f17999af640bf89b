//! Debounced input gate for typing-driven features.
//!
//! Raw edits are pushed into a channel drained by one background task. That
//! task owns the pending value, the debounce deadline and the last accepted
//! value, so none of them needs a lock. Every edit moves the deadline; only a
//! value that stays quiet for the whole window is examined.

use crate::config::GateConfig;
use crate::controller::FeatureController;
use nanogen_service::FeatureService;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Verdict for a debounced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// Same as the last accepted value.
    Duplicate,
    /// Blank or below the content minimum.
    TooShort,
}

/// Decide whether a quiescent value should trigger a submission.
pub fn admit(config: &GateConfig, value: &str, last_accepted: Option<&str>) -> Admission {
    if last_accepted == Some(value) {
        return Admission::Duplicate;
    }
    if !config.filter.admits(value) {
        return Admission::TooShort;
    }
    Admission::Accepted
}

/// Receives what the gate lets through.
pub trait GateHandler: Send + 'static {
    /// A debounced value passed every filter.
    fn accept(&mut self, value: String);

    /// A raw edit departed from the last accepted value.
    ///
    /// Returns true when work started for the last accepted value was
    /// abandoned. The gate then forgets that value, so typing it again is
    /// accepted again.
    fn edited(&mut self, _value: &str) -> bool {
        false
    }
}

struct Forward<F>(F);

impl<F> GateHandler for Forward<F>
where
    F: FnMut(String) + Send + 'static,
{
    fn accept(&mut self, value: String) {
        (self.0)(value)
    }
}

/// Submits accepted values and supersedes the running session on edits.
struct Submit<S: FeatureService, M> {
    controller: Arc<FeatureController<S>>,
    to_request: M,
}

impl<S, M> GateHandler for Submit<S, M>
where
    S: FeatureService,
    M: Fn(String) -> S::Request + Send + 'static,
{
    fn accept(&mut self, value: String) {
        self.controller.submit((self.to_request)(value));
    }

    fn edited(&mut self, _value: &str) -> bool {
        self.controller.cancel()
    }
}

pub struct InputGate {
    edits: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl InputGate {
    /// Start a gate that calls `on_accept` for every accepted value.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(config: GateConfig, on_accept: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        Self::with_handler(config, Forward(on_accept))
    }

    /// Start a gate that submits accepted values to `controller`.
    ///
    /// An edit that departs from the submitted value cancels the session
    /// still working on it.
    pub fn attach<S, M>(controller: Arc<FeatureController<S>>, config: GateConfig, to_request: M) -> Self
    where
        S: FeatureService,
        M: Fn(String) -> S::Request + Send + 'static,
    {
        Self::with_handler(
            config,
            Submit {
                controller,
                to_request,
            },
        )
    }

    /// Start a gate driving a custom handler.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_handler<H: GateHandler>(config: GateConfig, handler: H) -> Self {
        let (edits, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_gate(rx, config, handler));
        Self { edits, task }
    }

    /// Record a raw edit. Returns false once the gate has stopped.
    pub fn push(&self, value: impl Into<String>) -> bool {
        self.edits.send(value.into()).is_ok()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for InputGate {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_gate<H: GateHandler>(
    mut edits: mpsc::UnboundedReceiver<String>,
    config: GateConfig,
    mut handler: H,
) {
    let window = config.debounce();
    let mut last_accepted: Option<String> = None;
    let mut pending: Option<String> = None;
    let timer = sleep_until(Instant::now() + window);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            edit = edits.recv() => {
                let Some(value) = edit else {
                    break;
                };
                if last_accepted.is_some()
                    && last_accepted.as_deref() != Some(value.as_str())
                    && handler.edited(&value)
                {
                    tracing::debug!(len = value.len(), "edit superseded running work");
                    last_accepted = None;
                }
                pending = Some(value);
                timer.as_mut().reset(Instant::now() + window);
            }
            () = &mut timer, if pending.is_some() => {
                let Some(value) = pending.take() else {
                    continue;
                };
                match admit(&config, &value, last_accepted.as_deref()) {
                    Admission::Accepted => {
                        tracing::debug!(len = value.len(), "input accepted");
                        last_accepted = Some(value.clone());
                        handler.accept(value);
                    }
                    verdict => {
                        tracing::trace!(?verdict, "input suppressed");
                    }
                }
            }
        }
    }

    tracing::debug!("input gate stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentFilter;

    #[test]
    fn test_admit_rejects_duplicates_before_length() {
        let config = GateConfig {
            filter: ContentFilter::MinChars(5),
            ..GateConfig::default()
        };
        assert_eq!(admit(&config, "typo", None), Admission::TooShort);
        assert_eq!(admit(&config, "hello there", None), Admission::Accepted);
        assert_eq!(
            admit(&config, "hello there", Some("hello there")),
            Admission::Duplicate
        );
        assert_eq!(admit(&config, "hello there!", Some("hello there")), Admission::Accepted);
    }

    #[test]
    fn test_admit_word_minimum() {
        let config = GateConfig {
            filter: ContentFilter::MinWords(3),
            ..GateConfig::default()
        };
        assert_eq!(admit(&config, "one two three", None), Admission::TooShort);
        assert_eq!(admit(&config, "one two three four", None), Admission::Accepted);
    }
}
