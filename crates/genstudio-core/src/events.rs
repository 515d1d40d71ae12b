//! Notification bus for credential events
//!
//! The bus is injected into the requester instead of living in a process-wide
//! static, so each application (and each test) owns its own channel.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const BUFFER_CAPACITY: usize = 64;

/// Events broadcast by the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationEvent {
    /// The remote service rejected the user's personal token
    PersonalTokenFailed,
}

impl NotificationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::PersonalTokenFailed => "personalTokenFailed",
        }
    }
}

pub trait NotificationBus: Send + Sync {
    fn publish(&self, event: NotificationEvent);
}

/// Broadcast channel backed bus with any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastNotificationBus {
    sender: broadcast::Sender<NotificationEvent>,
}

impl BroadcastNotificationBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(BUFFER_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus for BroadcastNotificationBus {
    fn publish(&self, event: NotificationEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}
