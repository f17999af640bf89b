//! Deterministic in-memory feature service.
//!
//! Plays back pre-recorded status answers, download events and inference
//! events, records every call, and keeps the sinks it hands out so a test can
//! push late events after a session has been superseded.

use crate::{
    subscription, DownloadEvent, FeatureRequest, FeatureService, InferenceEvent, Result,
    ServiceError, Sink, Subscription,
};
use async_trait::async_trait;
use nanogen_models::FeatureStatus;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

struct Script<R> {
    statuses: VecDeque<Result<FeatureStatus>>,
    fallback_status: Result<FeatureStatus>,
    download: Option<Vec<DownloadEvent>>,
    inference: Option<Vec<InferenceEvent>>,
    download_sinks: Vec<Sink<DownloadEvent>>,
    inference_sinks: Vec<Sink<InferenceEvent>>,
    requests: Vec<R>,
}

pub struct ScriptedService<R> {
    script: Mutex<Script<R>>,
    status_delay: Option<Duration>,
    status_calls: AtomicUsize,
    download_calls: AtomicUsize,
    infer_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl<R> ScriptedService<R> {
    /// Service that always reports `status` and streams nothing until scripted.
    pub fn new(status: FeatureStatus) -> Self {
        Self {
            script: Mutex::new(Script {
                statuses: VecDeque::new(),
                fallback_status: Ok(status),
                download: None,
                inference: None,
                download_sinks: Vec::new(),
                inference_sinks: Vec::new(),
                requests: Vec::new(),
            }),
            status_delay: None,
            status_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            infer_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Answer the next status checks in order before falling back.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = FeatureStatus>) -> Self {
        self.lock()
            .statuses
            .extend(statuses.into_iter().map(Ok));
        self
    }

    /// Make every status check fail with `message`.
    pub fn with_status_error(self, message: impl Into<String>) -> Self {
        self.lock().fallback_status = Err(ServiceError::StatusCheck(message.into()));
        self
    }

    pub fn with_status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = Some(delay);
        self
    }

    /// Events replayed on every `download()` call.
    pub fn with_download(self, events: impl IntoIterator<Item = DownloadEvent>) -> Self {
        self.lock().download = Some(events.into_iter().collect());
        self
    }

    /// Events replayed on every `infer()` call.
    pub fn with_inference(self, events: impl IntoIterator<Item = InferenceEvent>) -> Self {
        self.lock().inference = Some(events.into_iter().collect());
        self
    }

    /// Stream `tokens` and then `Done` on every `infer()` call.
    pub fn with_tokens<I, S>(self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let events = tokens
            .into_iter()
            .map(InferenceEvent::token)
            .chain(std::iter::once(InferenceEvent::Done));
        self.with_inference(events)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn infer_calls(&self) -> usize {
        self.infer_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Sink handed out by the `index`-th `download()` call.
    pub fn download_sink(&self, index: usize) -> Option<Sink<DownloadEvent>> {
        self.lock().download_sinks.get(index).cloned()
    }

    /// Sink handed out by the `index`-th `infer()` call.
    pub fn inference_sink(&self, index: usize) -> Option<Sink<InferenceEvent>> {
        self.lock().inference_sinks.get(index).cloned()
    }

    /// Drop retained sinks so open streams observe end-of-stream.
    pub fn release_sinks(&self) {
        let mut script = self.lock();
        script.download_sinks.clear();
        script.inference_sinks.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Script<R>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Clone> ScriptedService<R> {
    /// Requests passed to `infer()`, in call order.
    pub fn requests(&self) -> Vec<R> {
        self.lock().requests.clone()
    }
}

#[async_trait]
impl<R> FeatureService for ScriptedService<R>
where
    R: FeatureRequest + Clone,
{
    type Request = R;

    async fn check_status(&self) -> Result<FeatureStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        if self.close_calls.load(Ordering::SeqCst) > 0 {
            return Err(ServiceError::Closed);
        }

        let mut script = self.lock();
        let status = match script.statuses.pop_front() {
            Some(status) => status,
            None => script.fallback_status.clone(),
        };
        tracing::debug!(?status, "scripted status check");
        status
    }

    fn download(&self) -> Subscription<DownloadEvent> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let (sink, sub) = subscription();

        let mut guard = self.lock();
        let script = &mut *guard;
        if let Some(events) = &script.download {
            for event in events {
                sink.send(event.clone());
            }
            // A completed download leaves the model installed.
            if events.last() == Some(&DownloadEvent::Completed) {
                script.fallback_status = Ok(FeatureStatus::Available);
            }
        }
        script.download_sinks.push(sink);
        sub
    }

    fn infer(&self, request: R) -> Subscription<InferenceEvent> {
        self.infer_calls.fetch_add(1, Ordering::SeqCst);
        let (sink, sub) = subscription();

        let mut script = self.lock();
        script.requests.push(request);
        if let Some(events) = &script.inference {
            for event in events {
                sink.send(event.clone());
            }
        }
        script.inference_sinks.push(sink);
        sub
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.release_sinks();
        tracing::debug!("scripted service closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_statuses_are_answered_in_order() {
        let service: ScriptedService<String> = ScriptedService::new(FeatureStatus::Available)
            .with_statuses([FeatureStatus::Downloadable, FeatureStatus::Downloading]);

        assert_eq!(service.check_status().await, Ok(FeatureStatus::Downloadable));
        assert_eq!(service.check_status().await, Ok(FeatureStatus::Downloading));
        assert_eq!(service.check_status().await, Ok(FeatureStatus::Available));
        assert_eq!(service.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_status_error() {
        let service: ScriptedService<String> =
            ScriptedService::new(FeatureStatus::Available).with_status_error("binder died");

        assert_eq!(
            service.check_status().await,
            Err(ServiceError::StatusCheck("binder died".to_string()))
        );
    }

    #[tokio::test]
    async fn test_completed_download_installs_model() {
        let service: ScriptedService<String> = ScriptedService::new(FeatureStatus::Downloadable)
            .with_download([DownloadEvent::Started(10), DownloadEvent::Completed]);

        let mut sub = service.download();
        assert_eq!(sub.next().await, Some(DownloadEvent::Started(10)));
        assert_eq!(sub.next().await, Some(DownloadEvent::Completed));
        assert_eq!(service.check_status().await, Ok(FeatureStatus::Available));
    }

    #[tokio::test]
    async fn test_infer_records_request_and_streams_tokens() {
        let service = ScriptedService::new(FeatureStatus::Available).with_tokens(["a", "b"]);

        let mut sub = service.infer("hello".to_string());
        assert_eq!(sub.next().await, Some(InferenceEvent::token("a")));
        assert_eq!(sub.next().await, Some(InferenceEvent::token("b")));
        assert_eq!(sub.next().await, Some(InferenceEvent::Done));
        assert_eq!(service.requests(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_retained_sink_delivers_late_events() {
        let service: ScriptedService<String> = ScriptedService::new(FeatureStatus::Available);
        let mut sub = service.infer("x".to_string());

        let sink = service.inference_sink(0).unwrap();
        assert!(sink.send(InferenceEvent::token("late")));
        assert_eq!(sub.next().await, Some(InferenceEvent::token("late")));

        service.release_sinks();
        drop(sink);
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_close_is_counted() {
        let service: ScriptedService<String> = ScriptedService::new(FeatureStatus::Available);
        service.close();
        assert_eq!(service.close_calls(), 1);
        assert_eq!(service.check_status().await, Err(ServiceError::Closed));
    }
}
