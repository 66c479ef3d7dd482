//! Initial-notification cache
//!
//! Holds the cold-start notification between the moment the native layer
//! classifies the launch and the moment the application asks for it.
//! At most one event is held, and it is handed out at most once per process.

use entrig_core::NotificationEvent;

/// Result of [`InitialNotificationCache::store`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    /// An unread event is already pending; the first one observed is kept
    DroppedPending,
    /// The cold-start event was already handed out in this process
    DroppedConsumed,
}

#[derive(Debug, Default)]
pub struct InitialNotificationCache {
    pending: Option<NotificationEvent>,
    consumed: bool,
}

impl InitialNotificationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, event: NotificationEvent) -> StoreOutcome {
        if self.consumed {
            return StoreOutcome::DroppedConsumed;
        }
        if self.pending.is_some() {
            return StoreOutcome::DroppedPending;
        }
        self.pending = Some(event);
        StoreOutcome::Stored
    }

    /// Hand out the pending event, once. `None` means the caller should fall
    /// back to the collaborator's own initial-notification accessor.
    pub fn consume(&mut self) -> Option<NotificationEvent> {
        let event = self.pending.take()?;
        self.consumed = true;
        Some(event)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}
