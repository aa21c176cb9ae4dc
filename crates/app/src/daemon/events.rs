//! Live events pushed to connected clients
//!
//! Handlers publish onto a broadcast channel and every `/api/v0/events`
//! subscriber gets its own receiver. A slow subscriber that falls behind
//! skips what it missed rather than holding the others back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 256;

/// What happened to a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Added,
    Removed,
    /// Entry dropped because its backing path disappeared
    Pruned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    /// First event on every stream, identifies the subscriber
    #[serde(rename = "registry")]
    Registry { id: String },
    #[serde(rename = "files.changed")]
    FilesChanged { name: String, action: ChangeAction },
    #[serde(rename = "server.statusChange")]
    StatusChange { status: ServerStatus },
}

impl ServerEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::Registry { .. } => "registry",
            ServerEvent::FilesChanged { .. } => "files.changed",
            ServerEvent::StatusChange { .. } => "server.statusChange",
        }
    }

    pub fn files_changed(name: impl Into<String>, action: ChangeAction) -> Self {
        ServerEvent::FilesChanged {
            name: name.into(),
            action,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Events {
    tx: broadcast::Sender<ServerEvent>,
    closed: Arc<watch::Sender<bool>>,
}

impl Default for Events {
    fn default() -> Self {
        Self::new(EVENT_CAPACITY)
    }
}

impl Events {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        let (closed, _) = watch::channel(false);
        Self {
            tx,
            closed: Arc::new(closed),
        }
    }

    /// Publish to every current subscriber. Having none is not an error.
    pub fn publish(&self, event: ServerEvent) {
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(receivers, "event published"),
            Err(broadcast::error::SendError(event)) => {
                tracing::trace!(event = event.event_type(), "no subscribers")
            }
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            closed: self.closed.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Announce shutdown and end every open subscription.
    pub fn close(&self) {
        self.publish(ServerEvent::StatusChange {
            status: ServerStatus::Stop,
        });
        self.closed.send_replace(true);
    }
}

/// One subscriber's view of the event stream.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<ServerEvent>,
    closed: watch::Receiver<bool>,
}

impl Subscription {
    /// Next event, or `None` once the stream has been closed.
    ///
    /// Events already queued when the stream closes are still delivered.
    pub async fn next(&mut self) -> Option<ServerEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::TryRecvError::Closed) => return None,
                Err(broadcast::error::TryRecvError::Empty) => {}
            }
            if *self.closed.borrow() {
                return None;
            }

            tokio::select! {
                result = self.rx.recv() => match result {
                    Ok(event) => return Some(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                },
                changed = self.closed.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = ServerEvent::files_changed("notes", ChangeAction::Removed);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "files.changed");
        assert_eq!(json["data"]["name"], "notes");
        assert_eq!(json["data"]["action"], "removed");
        assert_eq!(event.event_type(), "files.changed");
    }

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let events = Events::default();
        events.publish(ServerEvent::StatusChange {
            status: ServerStatus::Start,
        });

        let mut sub = events.subscribe();
        events.publish(ServerEvent::files_changed("a", ChangeAction::Added));

        let received = sub.next().await.unwrap();
        assert_eq!(
            received,
            ServerEvent::files_changed("a", ChangeAction::Added)
        );
    }

    #[tokio::test]
    async fn test_close_delivers_stop_then_ends() {
        let events = Events::default();
        let mut sub = events.subscribe();
        events.close();

        assert_eq!(
            sub.next().await,
            Some(ServerEvent::StatusChange {
                status: ServerStatus::Stop
            })
        );
        assert_eq!(sub.next().await, None);
    }
}
