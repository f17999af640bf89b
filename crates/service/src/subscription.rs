//! Push channel between a feature service and its controller.
//!
//! The host library reports download progress and inference tokens through
//! callbacks. Each call to `download()` or `infer()` instead hands the host a
//! `Sink` and the caller a `Subscription`. Dropping interest is a single
//! `unsubscribe()` call: the sink starts rejecting events, and a host that
//! checks `Sink::is_closed()` can stop early.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Create a connected sink/subscription pair.
///
/// The channel is unbounded because host callbacks are synchronous and a
/// dropped token would corrupt the accumulated output.
pub fn subscription<T>() -> (Sink<T>, Subscription<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let token = CancellationToken::new();
    (
        Sink {
            tx,
            token: token.clone(),
        },
        Subscription { rx, token },
    )
}

/// Producer half, owned by the service.
#[derive(Debug)]
pub struct Sink<T> {
    tx: mpsc::UnboundedSender<T>,
    token: CancellationToken,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T> Sink<T> {
    /// Deliver an event.
    ///
    /// Returns false once the subscriber has unsubscribed or gone away.
    pub fn send(&self, event: T) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }
}

/// Consumer half, owned by the controller session.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
    token: CancellationToken,
}

impl<T> Subscription<T> {
    /// Next event, or `None` once every sink is gone or after `unsubscribe()`.
    pub async fn next(&mut self) -> Option<T> {
        if self.token.is_cancelled() {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop receiving. Idempotent.
    pub fn unsubscribe(&mut self) {
        self.token.cancel();
        self.rx.close();
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (sink, mut sub) = subscription();
        assert!(sink.send(1));
        assert!(sink.send(2));
        drop(sink);

        assert_eq!(sub.next().await, Some(1));
        assert_eq!(sub.next().await, Some(2));
        assert_eq!(sub.next().await, None);
    }

    #[tokio::test]
    async fn test_unsubscribe_rejects_further_events() {
        let (sink, mut sub) = subscription::<&str>();
        sub.unsubscribe();

        assert!(!sink.send("late"));
        assert!(sink.is_closed());
        assert!(!sub.is_active());
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn test_drop_closes_sink() {
        let (sink, sub) = subscription::<u32>();
        assert!(!sink.is_closed());
        drop(sub);
        assert!(sink.is_closed());
        assert!(!sink.send(7));
    }

    #[tokio::test]
    async fn test_stream_adapter() {
        let (sink, sub) = subscription();
        for n in 0..3 {
            sink.send(n);
        }
        drop(sink);
        let collected: Vec<i32> = sub.collect().await;
        assert_eq!(collected, vec![0, 1, 2]);
    }
}
