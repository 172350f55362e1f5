//! Typed notification channel consumed by display collaborators.
//!
//! Fire and forget: a receiver sees only events published after it
//! subscribed, and publishing with nobody listening is not an error.

use tokio::sync::broadcast;

use crate::AlertEvent;

/// Notifications produced by the refresh core.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Watch list membership or prices changed; re-read with `list()`.
    WatchListChanged,
    /// A price crossed a user-set threshold.
    AlertTriggered(AlertEvent),
}

/// Cloneable broadcast publisher for [`WatchEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WatchEvent>,
}

impl EventBus {
    /// `capacity` bounds how far a slow receiver may lag before it starts
    /// missing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.sender.subscribe()
    }

    /// Returns how many receivers were handed the event.
    pub fn publish(&self, event: WatchEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
