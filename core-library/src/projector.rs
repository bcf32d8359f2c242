//! Panel views over one snapshot.
//!
//! A [`ViewProjector`] pins a single [`AggregationSnapshot`], so every view
//! read through it belongs to the same refresh even if a newer one is
//! published in the meantime. All reads are synchronous and never fail.

use crate::models::{AlbumTrackEntry, ArtistAlbumEntry, CurrentTrackInfo, DiscGroup};
use crate::snapshot::AggregationSnapshot;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ViewProjector {
    snapshot: Arc<AggregationSnapshot>,
}

impl Default for ViewProjector {
    fn default() -> Self {
        Self::new(Arc::new(AggregationSnapshot::default()))
    }
}

impl ViewProjector {
    pub fn new(snapshot: Arc<AggregationSnapshot>) -> Self {
        Self { snapshot }
    }

    /// Track detail view; `None` when no track resolved.
    pub fn track_info(&self) -> Option<&CurrentTrackInfo> {
        self.snapshot.current_track_info()
    }

    /// Album tracks on the selected disc.
    pub fn disc_tracks(&self) -> Vec<&AlbumTrackEntry> {
        let disc = self.snapshot.selected_disc_number();
        self.snapshot
            .album_tracks()
            .iter()
            .filter(|entry| entry.disc_number == disc)
            .collect()
    }

    pub fn disc_list(&self) -> &[DiscGroup] {
        self.snapshot.disc_list()
    }

    pub fn artist_albums(&self) -> &[ArtistAlbumEntry] {
        self.snapshot.artist_albums()
    }

    /// Full album listing across discs.
    pub fn album_tracks(&self) -> &[AlbumTrackEntry] {
        self.snapshot.album_tracks()
    }

    pub fn selected_disc_number(&self) -> u32 {
        self.snapshot.selected_disc_number()
    }

    pub fn sequence(&self) -> u64 {
        self.snapshot.sequence()
    }

    /// Lowest-numbered track of `disc_number`, if that disc exists.
    pub fn first_track_of_disc(&self, disc_number: u32) -> Option<&AlbumTrackEntry> {
        self.snapshot
            .disc_list()
            .iter()
            .find(|group| group.disc_number == disc_number)
            .and_then(DiscGroup::first_track)
    }

    pub fn snapshot(&self) -> &Arc<AggregationSnapshot> {
        &self.snapshot
    }
}
