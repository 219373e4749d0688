//! # Event Bus System
//!
//! Provides an event-driven architecture for the media playback core using
//! `tokio::sync::broadcast`. Player modules publish typed events through one
//! bus; hosts subscribe without coupling to the modules that emit them.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies per domain (playback
//!   transport, queue structure, volume)
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers listen independently
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, PlayerEvent, PlaybackEvent, PlaybackStatus};
//!
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(PlayerEvent::Playback(PlaybackEvent::StatusChanged {
//!     status: PlaybackStatus::Playing,
//! }))
//! .ok();
//! ```
//!
//! ## Error Handling
//!
//! The bus uses `tokio::sync::broadcast`, which produces two error kinds:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n`
//!   events. Non-fatal; the subscriber keeps receiving new events.
//! - **`RecvError::Closed`**: All senders dropped. Treat as shutdown.
//!
//! Keep event payloads lightweight: every subscriber receives a clone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Balances memory usage with the ability to absorb progress-event bursts.
/// Subscribers that can't keep up receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Player Status
// ============================================================================

/// Normalized playback status exposed to callers.
///
/// Exactly one value is current at any time. Transitions happen only through
/// the playback state machine, which settles transient native reports before
/// publishing, so observers never see flicker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing playing; position reset.
    Stopped,
    /// The current item is being opened/prepared.
    Loading,
    /// Playback stalled while the engine fetches data.
    Buffering,
    /// Actively playing.
    Playing,
    /// Suspended with position retained.
    Paused,
    /// The engine reported an unrecoverable item failure.
    Failed,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackStatus::Stopped => "stopped",
            PlaybackStatus::Loading => "loading",
            PlaybackStatus::Buffering => "buffering",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
///
/// This is the main event type published and received through the event bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    /// Playback transport events
    Playback(PlaybackEvent),
    /// Queue structure events
    Queue(QueueEvent),
    /// Volume/mute events
    Volume(VolumeEvent),
}

impl PlayerEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlayerEvent::Playback(e) => e.description(),
            PlayerEvent::Queue(e) => e.description(),
            PlayerEvent::Volume(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::Playback(PlaybackEvent::MediaFailed { .. }) => EventSeverity::Error,
            PlayerEvent::Playback(PlaybackEvent::StatusChanged { .. }) => EventSeverity::Info,
            PlayerEvent::Playback(PlaybackEvent::MediaFinished { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to the playback transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The settled playback status changed. Deduplicated: re-entering the
    /// current status emits nothing.
    StatusChanged {
        /// The new status.
        status: PlaybackStatus,
    },
    /// Progress tick while playing, at the active polling cadence only.
    PlayingChanged {
        /// Completed fraction in `[0, 1]`; 0 when the duration is unknown.
        fraction: f64,
        /// Current position.
        position: Duration,
        /// Item duration; zero when indefinite or unknown.
        duration: Duration,
    },
    /// Buffered-range update for the current item.
    BufferingChanged {
        /// Buffered fraction in `[0, 1]`; 0 when the duration is unknown.
        fraction: f64,
        /// Contiguously buffered duration.
        buffered: Duration,
    },
    /// The current item played to its natural end.
    MediaFinished {
        /// Identity of the item that finished.
        item_id: Uuid,
    },
    /// Playback of an item failed.
    MediaFailed {
        /// Human-readable error message.
        message: String,
        /// Underlying cause, when one was reported.
        cause: Option<String>,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::StatusChanged { .. } => "Playback status changed",
            PlaybackEvent::PlayingChanged { .. } => "Playback progress",
            PlaybackEvent::BufferingChanged { .. } => "Buffering progress",
            PlaybackEvent::MediaFinished { .. } => "Item finished playing",
            PlaybackEvent::MediaFailed { .. } => "Playback failed",
        }
    }
}

// ============================================================================
// Queue Events
// ============================================================================

/// Structural change notifications for the playback queue.
///
/// Every queue mutation emits exactly one event; batched operations
/// (`add_range`, `clear`) emit one event for the whole batch, never one per
/// element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// One or more items were appended.
    ItemsAdded {
        /// Identities of the appended items, in order.
        ids: Vec<Uuid>,
    },
    /// An item was removed.
    ItemRemoved {
        /// Identity of the removed item.
        id: Uuid,
        /// Insertion-order index it occupied.
        index: usize,
    },
    /// An item moved between insertion-order slots.
    ItemMoved { from: usize, to: usize },
    /// An item's metadata was enriched in place.
    ItemUpdated { id: Uuid },
    /// The queue was cleared or wholesale replaced.
    Reset,
    /// Shuffle was toggled; traversal order changed, storage order did not.
    ShuffleChanged { shuffled: bool },
    /// The current pointer moved.
    CurrentChanged {
        /// Traversal position of the new current item, if any.
        index: Option<usize>,
        /// Identity of the new current item, if any.
        id: Option<Uuid>,
    },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::ItemsAdded { .. } => "Items added to queue",
            QueueEvent::ItemRemoved { .. } => "Item removed from queue",
            QueueEvent::ItemMoved { .. } => "Item moved within queue",
            QueueEvent::ItemUpdated { .. } => "Item metadata updated",
            QueueEvent::Reset => "Queue reset",
            QueueEvent::ShuffleChanged { .. } => "Shuffle toggled",
            QueueEvent::CurrentChanged { .. } => "Current item changed",
        }
    }
}

// ============================================================================
// Volume Events
// ============================================================================

/// Volume and mute change notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum VolumeEvent {
    /// Volume level or mute state changed.
    Changed {
        /// Level in `0..=max_volume`.
        level: u32,
        /// Whether output is muted.
        muted: bool,
    },
}

impl VolumeEvent {
    fn description(&self) -> &str {
        match self {
            VolumeEvent::Changed { .. } => "Volume changed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to player events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// `capacity` is the maximum number of events buffered per subscriber;
    /// a subscriber that falls further behind receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none. Emitting into an empty bus is not a fault condition
    /// for the player; callers generally `.ok()` the result.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that observes all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with filtering.
///
/// Provides a more ergonomic API for consuming a single event category
/// without matching on the full hierarchy at every call site.
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter; only matching events are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events, `RecvError::Closed` when all senders have been dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
