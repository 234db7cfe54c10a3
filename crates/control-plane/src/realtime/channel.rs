// Live channel adapter
//
// One channel per connected client. The registry only sees the `LiveChannel`
// trait; `SseChannel` is the server-sent-events implementation backed by a
// bounded queue that the HTTP response body drains.
//
// Lifecycle: Opening -> Open (body first polled, headers flushed) -> Closed.
// Whoever performs the transition to Closed is responsible for removing the
// channel from the registry, so removal happens exactly once.

use axum::response::sse::Event as SseEvent;
use crowdpulse_core::ShortCode;
use futures::Stream;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use super::registry::ConnectionRegistry;

/// SSE event name of the greeting sent when a channel opens
pub const CONNECTED_EVENT: &str = "connected";

const STATE_OPENING: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Channel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Opening,
    Open,
    Closed,
}

impl ChannelState {
    fn from_u8(v: u8) -> Self {
        match v {
            STATE_OPENING => ChannelState::Opening,
            STATE_OPEN => ChannelState::Open,
            _ => ChannelState::Closed,
        }
    }
}

/// Write failure on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// Channel closed or client gone
    #[error("channel closed")]
    Closed,
    /// Client fell too far behind
    #[error("channel queue full")]
    Full,
}

/// A message ready to be written to channels. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMessage {
    pub event: Arc<str>,
    pub data: Arc<str>,
}

impl LiveMessage {
    pub fn new(event: impl Into<Arc<str>>, data: impl Into<Arc<str>>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    fn to_sse(&self) -> SseEvent {
        SseEvent::default().event(&*self.event).data(&*self.data)
    }
}

/// Transport-agnostic view of one open client connection
pub trait LiveChannel: Send + Sync {
    fn id(&self) -> Uuid;

    fn state(&self) -> ChannelState;

    /// Write one message. Never blocks; a closed channel returns `Closed`.
    fn send(&self, message: &LiveMessage) -> Result<(), SendError>;

    /// Move to `Closed`. Returns true only for the call that made the transition.
    fn close(&self) -> bool;
}

/// Server-sent-events channel
pub struct SseChannel {
    id: Uuid,
    short_code: ShortCode,
    state: AtomicU8,
    tx: Mutex<Option<mpsc::Sender<LiveMessage>>>,
}

impl SseChannel {
    /// Create a channel and the receiving half its response body reads from
    pub fn new(short_code: ShortCode, capacity: usize) -> (Arc<Self>, mpsc::Receiver<LiveMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Arc::new(Self {
            id: Uuid::now_v7(),
            short_code,
            state: AtomicU8::new(STATE_OPENING),
            tx: Mutex::new(Some(tx)),
        });
        (channel, rx)
    }

    pub fn short_code(&self) -> &ShortCode {
        &self.short_code
    }

    /// Opening -> Open. Returns true if this call made the transition.
    fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(
                STATE_OPENING,
                STATE_OPEN,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl LiveChannel for SseChannel {
    fn id(&self) -> Uuid {
        self.id
    }

    fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn send(&self, message: &LiveMessage) -> Result<(), SendError> {
        if self.state() == ChannelState::Closed {
            return Err(SendError::Closed);
        }
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(SendError::Closed);
        };
        tx.try_send(message.clone()).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }

    fn close(&self) -> bool {
        let previous = self.state.swap(STATE_CLOSED, Ordering::AcqRel);
        // Dropping the sender ends the response body once queued messages drain
        self.tx.lock().take();
        previous != STATE_CLOSED
    }
}

/// Response body of an SSE connection.
///
/// Emits a `connected` greeting, then every message queued on the channel.
/// Dropping the stream (client disconnect) closes the channel and removes it
/// from the registry.
pub struct ChannelStream {
    channel: Arc<SseChannel>,
    messages: ReceiverStream<LiveMessage>,
    registry: Arc<ConnectionRegistry>,
    greeting: Option<SseEvent>,
}

impl ChannelStream {
    pub(crate) fn new(
        channel: Arc<SseChannel>,
        rx: mpsc::Receiver<LiveMessage>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        let greeting = serde_json::json!({
            "status": "connected",
            "short_code": channel.short_code(),
            "channel_id": channel.id(),
        });
        Self {
            greeting: Some(
                SseEvent::default()
                    .event(CONNECTED_EVENT)
                    .data(greeting.to_string()),
            ),
            channel,
            messages: ReceiverStream::new(rx),
            registry,
        }
    }

    pub fn channel(&self) -> &Arc<SseChannel> {
        &self.channel
    }
}

impl Stream for ChannelStream {
    type Item = Result<SseEvent, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.channel.mark_open() {
            tracing::debug!(
                short_code = %this.channel.short_code(),
                channel_id = %this.channel.id(),
                "Live channel open"
            );
        }

        if let Some(greeting) = this.greeting.take() {
            return Poll::Ready(Some(Ok(greeting)));
        }

        Pin::new(&mut this.messages)
            .poll_next(cx)
            .map(|message| message.map(|m| Ok(m.to_sse())))
    }
}

impl Drop for ChannelStream {
    fn drop(&mut self) {
        if self.channel.close() {
            self.registry
                .unregister(self.channel.short_code(), self.channel.id());
            tracing::debug!(
                short_code = %self.channel.short_code(),
                channel_id = %self.channel.id(),
                "Live channel closed by client"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn code() -> ShortCode {
        ShortCode::parse("AB12CD").unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let (channel, _rx) = SseChannel::new(code(), 4);
        assert_eq!(channel.state(), ChannelState::Opening);
        assert!(channel.mark_open());
        assert!(!channel.mark_open());
        assert_eq!(channel.state(), ChannelState::Open);
        assert!(channel.close());
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(!channel.close());
    }

    #[test]
    fn test_send_after_close_is_rejected() {
        let (channel, mut rx) = SseChannel::new(code(), 4);
        channel.send(&LiveMessage::new("a", "1")).unwrap();
        channel.close();
        assert_eq!(
            channel.send(&LiveMessage::new("b", "2")),
            Err(SendError::Closed)
        );
        // Queued message is still delivered, then the queue ends
        assert_eq!(rx.try_recv().unwrap().event.as_ref(), "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_send_to_dropped_receiver_fails() {
        let (channel, rx) = SseChannel::new(code(), 4);
        drop(rx);
        assert_eq!(
            channel.send(&LiveMessage::new("a", "1")),
            Err(SendError::Closed)
        );
    }

    #[test]
    fn test_full_queue_reports_full() {
        let (channel, _rx) = SseChannel::new(code(), 1);
        channel.send(&LiveMessage::new("a", "1")).unwrap();
        assert_eq!(
            channel.send(&LiveMessage::new("b", "2")),
            Err(SendError::Full)
        );
    }

    #[tokio::test]
    async fn test_stream_opens_and_unregisters_on_drop() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut stream = registry.open_sse(code(), 8);
        let channel = stream.channel().clone();
        assert_eq!(registry.count(&code()), 1);
        assert_eq!(channel.state(), ChannelState::Opening);

        // Greeting comes first and flips the channel to Open
        assert!(stream.next().await.is_some());
        assert_eq!(channel.state(), ChannelState::Open);

        drop(stream);
        assert_eq!(channel.state(), ChannelState::Closed);
        assert_eq!(registry.count(&code()), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_when_closed_server_side() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut stream = registry.open_sse(code(), 8);
        assert!(stream.next().await.is_some());

        registry.broadcast(&code(), &LiveMessage::new("event.updated", "{}"));
        assert_eq!(registry.close_all(&code()), 1);

        // The queued message drains before the stream ends
        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }
}
