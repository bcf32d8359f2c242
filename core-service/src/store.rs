//! Published snapshot holder.
//!
//! Refreshes draw a sequence number when they start and publish when they
//! finish. A snapshot is only swapped in when its sequence is newer than the
//! one on display, so an older refresh that completes late is dropped.

use core_library::AggregationSnapshot;
use core_library::models::DEFAULT_DISC_NUMBER;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Result of [`SnapshotStore::publish`].
#[derive(Debug, Clone)]
pub enum Publication {
    Published(Arc<AggregationSnapshot>),
    /// A newer snapshot was already visible.
    Superseded { published_sequence: u64 },
}

impl Publication {
    pub fn is_published(&self) -> bool {
        matches!(self, Publication::Published(_))
    }
}

#[derive(Debug)]
struct StoreState {
    snapshot: Arc<AggregationSnapshot>,
    /// Disc shown by the disc track view; survives refreshes.
    selected_disc: u32,
}

#[derive(Debug)]
pub struct SnapshotStore {
    next_sequence: AtomicU64,
    state: RwLock<StoreState>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            next_sequence: AtomicU64::new(0),
            state: RwLock::new(StoreState {
                snapshot: Arc::new(AggregationSnapshot::empty(0)),
                selected_disc: DEFAULT_DISC_NUMBER,
            }),
        }
    }

    /// Draw the sequence number for a refresh that is about to start.
    /// Numbers start at 1 and strictly increase.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Snapshot currently on display.
    pub fn current(&self) -> Arc<AggregationSnapshot> {
        Arc::clone(&self.state.read().snapshot)
    }

    pub fn selected_disc(&self) -> u32 {
        self.state.read().selected_disc
    }

    /// Swap in `snapshot` unless a newer one is already visible.
    ///
    /// The stored disc selection is carried onto the published snapshot.
    pub fn publish(&self, snapshot: AggregationSnapshot) -> Publication {
        let mut state = self.state.write();
        let published_sequence = state.snapshot.sequence();

        if snapshot.sequence() <= published_sequence {
            debug!(
                sequence = snapshot.sequence(),
                published_sequence, "Dropping stale snapshot"
            );
            return Publication::Superseded { published_sequence };
        }

        let snapshot = Arc::new(snapshot.with_selected_disc(state.selected_disc));
        state.snapshot = Arc::clone(&snapshot);
        Publication::Published(snapshot)
    }

    /// Change the disc shown by the disc track view.
    ///
    /// The visible snapshot is replaced by one with the same sequence and
    /// collections.
    pub fn set_selected_disc(&self, disc_number: u32) -> Arc<AggregationSnapshot> {
        let mut state = self.state.write();
        state.selected_disc = disc_number;
        let snapshot = Arc::new(state.snapshot.with_selected_disc(disc_number));
        state.snapshot = Arc::clone(&snapshot);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let store = SnapshotStore::new();
        let snapshot = store.current();
        assert_eq!(snapshot.sequence(), 0);
        assert!(!snapshot.has_track());
        assert_eq!(store.selected_disc(), 1);
    }

    #[test]
    fn test_sequences_increase() {
        let store = SnapshotStore::new();
        assert_eq!(store.next_sequence(), 1);
        assert_eq!(store.next_sequence(), 2);
        assert_eq!(store.next_sequence(), 3);
    }

    #[test]
    fn test_publish_newer_snapshot() {
        let store = SnapshotStore::new();
        let seq = store.next_sequence();

        let publication = store.publish(AggregationSnapshot::empty(seq));
        assert!(publication.is_published());
        assert_eq!(store.current().sequence(), seq);
    }

    #[test]
    fn test_stale_snapshot_is_dropped() {
        let store = SnapshotStore::new();
        let first = store.next_sequence();
        let second = store.next_sequence();

        assert!(store.publish(AggregationSnapshot::empty(second)).is_published());

        match store.publish(AggregationSnapshot::empty(first)) {
            Publication::Superseded { published_sequence } => {
                assert_eq!(published_sequence, second)
            }
            Publication::Published(_) => panic!("stale snapshot was published"),
        }
        assert_eq!(store.current().sequence(), second);
    }

    #[test]
    fn test_same_sequence_is_not_republished() {
        let store = SnapshotStore::new();
        let seq = store.next_sequence();
        assert!(store.publish(AggregationSnapshot::empty(seq)).is_published());
        assert!(!store.publish(AggregationSnapshot::empty(seq)).is_published());
    }

    #[test]
    fn test_disc_selection_survives_publish() {
        let store = SnapshotStore::new();
        let updated = store.set_selected_disc(2);
        assert_eq!(updated.selected_disc_number(), 2);
        assert_eq!(updated.sequence(), 0);

        let seq = store.next_sequence();
        match store.publish(AggregationSnapshot::empty(seq)) {
            Publication::Published(snapshot) => assert_eq!(snapshot.selected_disc_number(), 2),
            Publication::Superseded { .. } => panic!("fresh snapshot was dropped"),
        }
        assert_eq!(store.current().selected_disc_number(), 2);
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = SnapshotStore::new();
        let before = store.current();

        let seq = store.next_sequence();
        store.publish(AggregationSnapshot::empty(seq));

        assert_eq!(before.sequence(), 0);
        assert_eq!(store.current().sequence(), seq);
    }
}
