// Connection registry
//
// Process-local map from an event's short code to its open live channels.
// One instance is created at start-up and shared through `Arc`.
//
// The whole fan-out of a broadcast runs under the map lock. Channel writes
// never block (bounded `try_send`), and holding the lock gives every channel
// of an event the same message order.

use crowdpulse_core::{Notification, ShortCode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::channel::{ChannelStream, LiveChannel, LiveMessage, SseChannel};

type ChannelSet = HashMap<Uuid, Arc<dyn LiveChannel>>;

#[derive(Default)]
pub struct ConnectionRegistry {
    channels: Mutex<HashMap<ShortCode, ChannelSet>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel under `short_code`. It receives every later broadcast.
    pub fn register(&self, short_code: &ShortCode, channel: Arc<dyn LiveChannel>) {
        let id = channel.id();
        let count = {
            let mut map = self.channels.lock();
            let set = map.entry(short_code.clone()).or_default();
            set.insert(id, channel);
            set.len()
        };
        tracing::debug!(short_code = %short_code, channel_id = %id, count, "Live channel registered");
    }

    /// Remove a channel. Safe to call more than once; returns whether it was present.
    pub fn unregister(&self, short_code: &ShortCode, channel_id: Uuid) -> bool {
        let mut map = self.channels.lock();
        let Some(set) = map.get_mut(short_code) else {
            return false;
        };
        let removed = set.remove(&channel_id).is_some();
        if set.is_empty() {
            map.remove(short_code);
        }
        removed
    }

    /// Write `message` to every channel registered under `short_code`.
    ///
    /// Channels that reject the write are closed and evicted; the rest still
    /// receive the message. Returns the number of channels that accepted it.
    pub fn broadcast(&self, short_code: &ShortCode, message: &LiveMessage) -> usize {
        let mut map = self.channels.lock();
        let Some(set) = map.get_mut(short_code) else {
            return 0;
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, channel) in set.iter() {
            match channel.send(message) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        short_code = %short_code,
                        channel_id = %id,
                        error = %e,
                        "Evicting live channel after failed write"
                    );
                    failed.push(*id);
                }
            }
        }

        for id in failed {
            if let Some(channel) = set.remove(&id) {
                channel.close();
            }
        }
        if set.is_empty() {
            map.remove(short_code);
        }

        delivered
    }

    /// Serialize a notification and broadcast it.
    pub fn publish(&self, short_code: &ShortCode, notification: &Notification) -> usize {
        let data = match serde_json::to_string(notification) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(short_code = %short_code, error = %e, "Failed to serialize notification");
                return 0;
            }
        };
        let message = LiveMessage::new(notification.event_type(), data);
        let delivered = self.broadcast(short_code, &message);
        tracing::debug!(
            short_code = %short_code,
            event_type = notification.event_type(),
            delivered,
            "Published live notification"
        );
        delivered
    }

    /// Number of channels currently registered under `short_code`.
    pub fn count(&self, short_code: &ShortCode) -> usize {
        self.channels
            .lock()
            .get(short_code)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    /// Number of channels across all events.
    pub fn total_connections(&self) -> usize {
        self.channels.lock().values().map(|set| set.len()).sum()
    }

    /// Close and remove every channel of an event. Returns how many were closed.
    pub fn close_all(&self, short_code: &ShortCode) -> usize {
        let removed = self.channels.lock().remove(short_code);
        let Some(set) = removed else {
            return 0;
        };
        let closed = set.len();
        for channel in set.into_values() {
            channel.close();
        }
        tracing::info!(short_code = %short_code, closed, "Closed all live channels");
        closed
    }

    /// Open an SSE channel for `short_code` and register it.
    /// The returned stream unregisters the channel when dropped.
    pub fn open_sse(self: &Arc<Self>, short_code: ShortCode, capacity: usize) -> ChannelStream {
        let (channel, rx) = SseChannel::new(short_code.clone(), capacity);
        self.register(&short_code, channel.clone());
        ChannelStream::new(channel, rx, self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::channel::{ChannelState, SendError};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Records every message; optionally fails every write.
    struct RecordingChannel {
        id: Uuid,
        fail: bool,
        closed: AtomicBool,
        close_calls: AtomicUsize,
        received: parking_lot::Mutex<Vec<LiveMessage>>,
    }

    impl RecordingChannel {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                id: Uuid::now_v7(),
                fail,
                closed: AtomicBool::new(false),
                close_calls: AtomicUsize::new(0),
                received: parking_lot::Mutex::new(Vec::new()),
            })
        }

        fn received(&self) -> Vec<String> {
            self.received
                .lock()
                .iter()
                .map(|m| m.data.to_string())
                .collect()
        }
    }

    impl LiveChannel for RecordingChannel {
        fn id(&self) -> Uuid {
            self.id
        }

        fn state(&self) -> ChannelState {
            if self.closed.load(Ordering::SeqCst) {
                ChannelState::Closed
            } else {
                ChannelState::Open
            }
        }

        fn send(&self, message: &LiveMessage) -> Result<(), SendError> {
            if self.fail || self.closed.load(Ordering::SeqCst) {
                return Err(SendError::Closed);
            }
            self.received.lock().push(message.clone());
            Ok(())
        }

        fn close(&self) -> bool {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            !self.closed.swap(true, Ordering::SeqCst)
        }
    }

    fn code(s: &str) -> ShortCode {
        ShortCode::parse(s).unwrap()
    }

    fn msg(data: &str) -> LiveMessage {
        LiveMessage::new("test", data)
    }

    #[test]
    fn test_register_then_broadcast_reaches_channel() {
        let registry = ConnectionRegistry::new();
        let c = RecordingChannel::new(false);
        registry.register(&code("AB12CD"), c.clone());

        assert!(registry.count(&code("AB12CD")) >= 1);
        assert_eq!(registry.broadcast(&code("AB12CD"), &msg("hello")), 1);
        assert_eq!(c.received(), vec!["hello"]);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let c = RecordingChannel::new(false);
        registry.register(&code("AB12CD"), c.clone());

        assert!(registry.unregister(&code("AB12CD"), c.id));
        assert!(!registry.unregister(&code("AB12CD"), c.id));
        assert_eq!(registry.count(&code("AB12CD")), 0);

        assert_eq!(registry.broadcast(&code("AB12CD"), &msg("after")), 0);
        assert!(c.received().is_empty());
    }

    #[test]
    fn test_failed_channel_evicted_without_blocking_others() {
        let registry = ConnectionRegistry::new();
        let good1 = RecordingChannel::new(false);
        let bad = RecordingChannel::new(true);
        let good2 = RecordingChannel::new(false);
        registry.register(&code("AB12CD"), good1.clone());
        registry.register(&code("AB12CD"), bad.clone());
        registry.register(&code("AB12CD"), good2.clone());

        assert_eq!(registry.broadcast(&code("AB12CD"), &msg("m1")), 2);
        assert_eq!(registry.count(&code("AB12CD")), 2);
        assert_eq!(good1.received(), vec!["m1"]);
        assert_eq!(good2.received(), vec!["m1"]);
        assert_eq!(bad.close_calls.load(Ordering::SeqCst), 1);

        // Evicted channel is not tried again
        assert_eq!(registry.broadcast(&code("AB12CD"), &msg("m2")), 2);
        assert_eq!(bad.close_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_broadcast_is_scoped_to_short_code() {
        let registry = ConnectionRegistry::new();
        let a = RecordingChannel::new(false);
        let b = RecordingChannel::new(false);
        registry.register(&code("AAAAAA"), a.clone());
        registry.register(&code("BBBBBB"), b.clone());

        registry.broadcast(&code("AAAAAA"), &msg("for-a"));
        assert_eq!(a.received(), vec!["for-a"]);
        assert!(b.received().is_empty());
        assert_eq!(registry.total_connections(), 2);
    }

    #[test]
    fn test_two_clients_one_disconnects() {
        let registry = ConnectionRegistry::new();
        let first = RecordingChannel::new(false);
        let second = RecordingChannel::new(false);
        registry.register(&code("AB12CD"), first.clone());
        registry.register(&code("AB12CD"), second.clone());
        assert_eq!(registry.count(&code("AB12CD")), 2);

        registry.unregister(&code("AB12CD"), first.id);
        assert_eq!(registry.count(&code("AB12CD")), 1);

        assert_eq!(registry.broadcast(&code("AB12CD"), &msg("later")), 1);
        assert!(first.received().is_empty());
        assert_eq!(second.received(), vec!["later"]);
    }

    #[test]
    fn test_messages_arrive_in_broadcast_order() {
        let registry = ConnectionRegistry::new();
        let a = RecordingChannel::new(false);
        let b = RecordingChannel::new(false);
        registry.register(&code("AB12CD"), a.clone());
        registry.register(&code("AB12CD"), b.clone());

        for i in 0..5 {
            registry.broadcast(&code("AB12CD"), &msg(&i.to_string()));
        }
        let expected: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        assert_eq!(a.received(), expected);
        assert_eq!(b.received(), expected);
    }

    #[test]
    fn test_publish_serializes_notification() {
        let registry = ConnectionRegistry::new();
        let c = RecordingChannel::new(false);
        registry.register(&code("AB12CD"), c.clone());

        let event_id = Uuid::now_v7();
        let delivered = registry.publish(
            &code("AB12CD"),
            &Notification::EventUpdated { event_id },
        );
        assert_eq!(delivered, 1);

        let received = c.received.lock();
        assert_eq!(received[0].event.as_ref(), "event.updated");
        let json: serde_json::Value = serde_json::from_str(&received[0].data).unwrap();
        assert_eq!(json["event_id"], event_id.to_string());
    }

    #[test]
    fn test_close_all_closes_and_removes() {
        let registry = ConnectionRegistry::new();
        let a = RecordingChannel::new(false);
        let b = RecordingChannel::new(false);
        registry.register(&code("AB12CD"), a.clone());
        registry.register(&code("AB12CD"), b.clone());

        assert_eq!(registry.close_all(&code("AB12CD")), 2);
        assert_eq!(registry.count(&code("AB12CD")), 0);
        assert_eq!(a.state(), ChannelState::Closed);
        assert_eq!(registry.close_all(&code("AB12CD")), 0);
    }

    #[test]
    fn test_concurrent_register_and_broadcast() {
        let registry = Arc::new(ConnectionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let c = RecordingChannel::new(false);
                        registry.register(&code("AB12CD"), c.clone());
                        registry.broadcast(&code("AB12CD"), &msg("x"));
                        registry.unregister(&code("AB12CD"), c.id);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.count(&code("AB12CD")), 0);
    }
}
