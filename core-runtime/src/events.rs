//! # Event Bus System
//!
//! Broadcasts what the panel core did, using `tokio::sync::broadcast`, so the
//! host can observe selection changes and refresh results without polling.
//!
//! ## Overview
//!
//! - **Event Types**: [`SelectionEvent`] for the selection state machine,
//!   [`AggregationEvent`] for the refresh pipeline, wrapped in [`CoreEvent`]
//! - **EventBus**: broadcast channel owned by the service
//! - **EventStream**: receiver wrapper with predicate filtering
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AggregationEvent, CoreEvent, EventBus, EventStream};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut refreshes = EventStream::new(bus.subscribe())
//!     .filter(|event| matches!(event, CoreEvent::Aggregation(_)));
//!
//! bus.emit(CoreEvent::Aggregation(AggregationEvent::RefreshSuperseded {
//!     sequence: 3,
//!     published_sequence: 4,
//! }))
//! .ok();
//!
//! let event = refreshes.recv().await.unwrap();
//! assert_eq!(event.description(), "Stale refresh discarded");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `emit` fails only when nobody is subscribed; the service ignores that case.
//! Slow subscribers receive `RecvError::Lagged(n)` and can keep reading.

use bridge_traits::library::TrackRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Selection state machine events
    Selection(SelectionEvent),
    /// Refresh pipeline events
    Aggregation(AggregationEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Selection(e) => e.description(),
            CoreEvent::Aggregation(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Selection(SelectionEvent::InvalidTransition { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Aggregation(AggregationEvent::QueryFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Aggregation(AggregationEvent::SnapshotPublished { .. }) => {
                EventSeverity::Info
            }
            CoreEvent::Selection(SelectionEvent::ModeChanged { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Selection Events
// ============================================================================

/// Changes to the selection state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SelectionEvent {
    /// Mode switched between `playing` and `selected`.
    ModeChanged { previous: String, mode: String },
    /// A track was pinned as the user selection.
    TrackSelected { track: TrackRef },
    /// The host reported a new playing track (`None` when stopped).
    PlayingTrackChanged { track: Option<TrackRef> },
    /// Disc shown in the disc track view changed.
    DiscSelected { disc_number: u32 },
    /// A transition was rejected without changing state.
    InvalidTransition { requested: String, reason: String },
}

impl SelectionEvent {
    pub fn description(&self) -> &str {
        match self {
            SelectionEvent::ModeChanged { .. } => "Selection mode changed",
            SelectionEvent::TrackSelected { .. } => "Track selected",
            SelectionEvent::PlayingTrackChanged { .. } => "Playing track changed",
            SelectionEvent::DiscSelected { .. } => "Disc selected",
            SelectionEvent::InvalidTransition { .. } => "Invalid selection transition",
        }
    }
}

// ============================================================================
// Aggregation Events
// ============================================================================

/// Outcomes of the refresh pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AggregationEvent {
    /// A refresh replaced the visible snapshot.
    SnapshotPublished {
        sequence: u64,
        has_track: bool,
        album_tracks: usize,
        artist_albums: usize,
        discs: usize,
    },
    /// A refresh finished after a newer one had been published.
    RefreshSuperseded { sequence: u64, published_sequence: u64 },
    /// A library query failed; its collection was left empty.
    QueryFailed {
        sequence: u64,
        step: String,
        message: String,
    },
}

impl AggregationEvent {
    pub fn description(&self) -> &str {
        match self {
            AggregationEvent::SnapshotPublished { .. } => "Snapshot published",
            AggregationEvent::RefreshSuperseded { .. } => "Stale refresh discarded",
            AggregationEvent::QueryFailed { .. } => "Library query failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast channel for [`CoreEvent`]s.
///
/// Cloning the bus clones the sender; every clone publishes to the same
/// subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls more than `capacity` events behind receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a receiver for all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

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

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` that skips events failing a predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events for which `predicate` returns true.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next matching event.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Receives the next matching event without waiting.
    ///
    /// Returns `None` if no matching event is currently buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
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

    /// Drain every buffered matching event.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(result) = self.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        events
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
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
