//! Event broadcasting for pool lifecycle observability.
//!
//! Provides [`PoolEvent`] variants emitted as entries move through the pool
//! and an [`EventBus`] backed by `tokio::sync::broadcast`.
//!
//! The [`PoolEvent::Destroyed`] variant is the disposed-notification: any
//! owner holding a cached reference to a pooled entry subscribes and clears
//! that reference when the entry's type shows up. It fires exactly once per
//! entry — the manager owns the boxed entry at destruction time, so a second
//! emission for the same entry is unrepresentable.

use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// PoolEvent
// ---------------------------------------------------------------------------

/// Events emitted during pool lifecycle operations.
///
/// All variants carry the concrete type name of the entry involved.
/// Subscribers receive cloned copies via [`EventBus::subscribe`].
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// An entry was returned to its bucket.
    Added {
        /// Concrete type name of the entry.
        type_name: &'static str,
    },
    /// An entry was retrieved from its bucket and recycled for reuse.
    Reused {
        /// Concrete type name of the entry.
        type_name: &'static str,
    },
    /// An entry was permanently destroyed and is no longer usable.
    Destroyed {
        /// Concrete type name of the entry.
        type_name: &'static str,
        /// Why the entry was destroyed.
        reason: DestroyReason,
    },
}

// ---------------------------------------------------------------------------
// DestroyReason
// ---------------------------------------------------------------------------

/// Reason an entry was permanently removed from the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyReason {
    /// The entry's bucket exceeded the configured cap and the entry was
    /// evicted during a resize pass.
    Evicted,
    /// The whole pool was cleared.
    Cleared,
    /// Pooling was disabled.
    Disabled,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast-based event bus for pool lifecycle events.
///
/// Uses `tokio::sync::broadcast` under the hood. Emission is fire-and-forget:
/// if no subscribers are listening or the channel is full, events are silently
/// dropped (no backpressure on the emitter).
pub struct EventBus {
    sender: broadcast::Sender<PoolEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer size.
    ///
    /// The buffer size determines how many events can be queued before
    /// slow subscribers start lagging (and losing events).
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    ///
    /// This is non-blocking. If there are no subscribers the event is
    /// silently dropped.
    pub fn emit(&self, event: PoolEvent) {
        // Ignore the error — it just means there are no active receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to events.
    ///
    /// Returns a receiver that will get all events emitted after this call.
    /// If the subscriber falls behind by more than `buffer_size` events, it
    /// will receive a `Lagged` error and skip to the latest.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.sender.receiver_count())
            .finish()
    }
}
