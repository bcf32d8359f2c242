//! Aggregation snapshot
//!
//! One coherent, immutable result of a refresh. Collections sit behind `Arc`
//! so projections and disc changes share them without copying.

use crate::models::{
    AlbumTrackEntry, ArtistAlbumEntry, CurrentTrackInfo, DiscGroup, DEFAULT_DISC_NUMBER,
};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSnapshot {
    sequence: u64,
    current_track_info: Option<CurrentTrackInfo>,
    album_tracks: Arc<Vec<AlbumTrackEntry>>,
    artist_albums: Arc<Vec<ArtistAlbumEntry>>,
    disc_list: Arc<Vec<DiscGroup>>,
    selected_disc_number: u32,
}

impl Default for AggregationSnapshot {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl AggregationSnapshot {
    /// Snapshot with no current track and empty collections.
    pub fn empty(sequence: u64) -> Self {
        Self {
            sequence,
            current_track_info: None,
            album_tracks: Arc::new(Vec::new()),
            artist_albums: Arc::new(Vec::new()),
            disc_list: Arc::new(Vec::new()),
            selected_disc_number: DEFAULT_DISC_NUMBER,
        }
    }

    pub fn new(
        sequence: u64,
        current_track_info: Option<CurrentTrackInfo>,
        album_tracks: Vec<AlbumTrackEntry>,
        artist_albums: Vec<ArtistAlbumEntry>,
        disc_list: Vec<DiscGroup>,
    ) -> Self {
        Self {
            sequence,
            current_track_info,
            album_tracks: Arc::new(album_tracks),
            artist_albums: Arc::new(artist_albums),
            disc_list: Arc::new(disc_list),
            selected_disc_number: DEFAULT_DISC_NUMBER,
        }
    }

    /// Same collections with a different disc selected.
    pub fn with_selected_disc(&self, disc_number: u32) -> Self {
        Self {
            selected_disc_number: disc_number,
            ..self.clone()
        }
    }

    /// Refresh sequence number that produced this snapshot; 0 before any.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn current_track_info(&self) -> Option<&CurrentTrackInfo> {
        self.current_track_info.as_ref()
    }

    /// Album tracks sorted by (disc, track).
    pub fn album_tracks(&self) -> &[AlbumTrackEntry] {
        &self.album_tracks
    }

    /// Deduplicated albums sorted by (year, name).
    pub fn artist_albums(&self) -> &[ArtistAlbumEntry] {
        &self.artist_albums
    }

    pub fn disc_list(&self) -> &[DiscGroup] {
        &self.disc_list
    }

    pub fn selected_disc_number(&self) -> u32 {
        self.selected_disc_number
    }

    pub fn has_track(&self) -> bool {
        self.current_track_info.is_some()
    }
}
