//! Annotation sinks for state change events.

use async_trait::async_trait;
use poolwatch_types::StateChangeEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

/// Errors from delivering an event to a sink.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// The consumer side has gone away.
    #[error("annotation sink closed")]
    Closed,

    /// The consumer is not keeping up.
    #[error("annotation sink full, event dropped")]
    Full,

    /// Delivery failed for another reason.
    #[error("annotation delivery failed: {0}")]
    Delivery(String),
}

/// Durable destination for state change events, consumed asynchronously.
///
/// Callers log failures and carry on; a sink error never affects collection.
#[async_trait]
pub trait AnnotationSink: Send + Sync + std::fmt::Debug {
    async fn record(&self, event: StateChangeEvent) -> Result<(), AnnotationError>;
}

/// Sends events through a bounded channel.
///
/// Delivery is best effort: a full channel drops the event instead of
/// blocking.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<StateChangeEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that consumes it.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<StateChangeEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AnnotationSink for ChannelSink {
    async fn record(&self, event: StateChangeEvent) -> Result<(), AnnotationError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AnnotationError::Full,
            mpsc::error::TrySendError::Closed(_) => AnnotationError::Closed,
        })
    }
}

/// Writes each event to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl AnnotationSink for LogSink {
    async fn record(&self, event: StateChangeEvent) -> Result<(), AnnotationError> {
        info!(
            category = %event.category,
            timestamp_ms = event.timestamp_ms,
            "state change: {}",
            event.describe()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ts: u64) -> StateChangeEvent {
        StateChangeEvent {
            timestamp_ms: ts,
            field_name: "filterOn".to_string(),
            previous_value: false,
            new_value: true,
            category: "pump".to_string(),
        }
    }

    #[tokio::test]
    async fn channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelSink::channel(4);
        sink.record(event(1)).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.timestamp_ms, 1);
    }

    #[tokio::test]
    async fn channel_sink_drops_when_full() {
        let (sink, _rx) = ChannelSink::channel(1);
        sink.record(event(1)).await.unwrap();

        let err = sink.record(event(2)).await.unwrap_err();
        assert!(matches!(err, AnnotationError::Full));
    }

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);

        let err = sink.record(event(1)).await.unwrap_err();
        assert!(matches!(err, AnnotationError::Closed));
    }

    #[tokio::test]
    async fn log_sink_accepts_everything() {
        assert!(LogSink.record(event(1)).await.is_ok());
    }
}
