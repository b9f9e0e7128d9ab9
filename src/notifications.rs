//! Notification broadcasting for list-changed events
//!
//! Section handlers publish here after they change a live registry; the
//! serving layer subscribes and forwards the events to connected clients.

use std::fmt;
use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::diff::DiffSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The live registry of a section changed.
    ListChanged { section: String },
    /// A reconcile applied at least one change.
    ConfigReloaded { path: PathBuf, summary: DiffSummary },
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeEvent::ListChanged { section } => write!(f, "{section}/list_changed"),
            ChangeEvent::ConfigReloaded { path, summary } => {
                write!(f, "reloaded {} ({summary})", path.display())
            }
        }
    }
}

/// Fan-out of change events to every subscriber
#[derive(Clone)]
pub struct NotificationBroadcaster {
    sender: broadcast::Sender<ChangeEvent>,
}

impl NotificationBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all subscribers
    pub fn send(&self, event: ChangeEvent) {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "{event} to {count} subscribers");
            }
            Err(_) => {
                // No receivers, this is fine
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event}");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

impl fmt::Debug for NotificationBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBroadcaster")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

/// Forward received events to `forward` until the channel closes.
pub async fn listen<F>(mut receiver: broadcast::Receiver<ChangeEvent>, mut forward: F)
where
    F: FnMut(ChangeEvent),
{
    crate::debug_event!("notify", "listening");

    loop {
        match receiver.recv().await {
            Ok(event) => forward(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("[notify] lagged by {n} messages");
            }
            Err(broadcast::error::RecvError::Closed) => {
                crate::debug_event!("notify", "channel closed");
                break;
            }
        }
    }
}
