//! Aggregator
//!
//! Builds an [`AggregationSnapshot`] for one track from exactly two library
//! queries: every track of its album, and every track of its artist. The disc
//! list is derived from the album query without touching the library again.
//!
//! A failing query never aborts a refresh. The affected collection is left
//! empty, the failure is logged and reported in the [`RefreshOutcome`], and
//! the rest of the pipeline runs to completion.

use crate::error::Result;
use crate::metadata::MetadataReader;
use crate::models::{
    AlbumTrackEntry, ArtistAlbumEntry, CurrentTrackInfo, DiscGroup, TrackInfo,
};
use crate::query::FilterExpression;
use crate::snapshot::AggregationSnapshot;
use bridge_traits::library::{LibraryQuery, TrackRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Pipeline step that can fail independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStep {
    AlbumTracks,
    ArtistAlbums,
}

impl fmt::Display for RefreshStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshStep::AlbumTracks => f.write_str("album_tracks"),
            RefreshStep::ArtistAlbums => f.write_str("artist_albums"),
        }
    }
}

/// A step that degraded to an empty collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: RefreshStep,
    pub message: String,
}

/// Result of one refresh.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub snapshot: AggregationSnapshot,
    pub failures: Vec<StepFailure>,
}

impl RefreshOutcome {
    /// Whether a current track resolved.
    pub fn has_track(&self) -> bool {
        self.snapshot.has_track()
    }
}

pub struct Aggregator {
    library: Arc<dyn LibraryQuery>,
    reader: Arc<MetadataReader>,
    prefer_album_artist: bool,
}

impl Aggregator {
    pub fn new(library: Arc<dyn LibraryQuery>, reader: Arc<MetadataReader>) -> Self {
        Self {
            library,
            reader,
            prefer_album_artist: false,
        }
    }

    /// Scope queries by album artist instead of track artist.
    pub fn with_album_artist_preference(mut self, prefer: bool) -> Self {
        self.prefer_album_artist = prefer;
        self
    }

    pub fn prefers_album_artist(&self) -> bool {
        self.prefer_album_artist
    }

    pub fn reader(&self) -> &Arc<MetadataReader> {
        &self.reader
    }

    /// Run the full pipeline for `track`.
    ///
    /// With no track the result is the empty snapshot and no query is issued.
    /// Both canonical queries run concurrently; the snapshot is only
    /// assembled once both have settled.
    #[instrument(skip(self, track))]
    pub async fn refresh(&self, sequence: u64, track: Option<TrackRef>) -> RefreshOutcome {
        let Some(track) = track else {
            debug!("No current track, clearing collections");
            return RefreshOutcome {
                snapshot: AggregationSnapshot::empty(sequence),
                failures: Vec::new(),
            };
        };

        let current = self.analyze_track(&track);
        let (album_result, artist_result) = futures::join!(
            self.load_album_tracks(&current),
            self.load_artist_albums(&current)
        );

        let mut failures = Vec::new();
        let album_tracks = settle(RefreshStep::AlbumTracks, album_result, &mut failures);
        let artist_albums = settle(RefreshStep::ArtistAlbums, artist_result, &mut failures);
        let disc_list = Self::derive_disc_list(&album_tracks);

        debug!(
            album_tracks = album_tracks.len(),
            artist_albums = artist_albums.len(),
            discs = disc_list.len(),
            failures = failures.len(),
            "Refresh computed"
        );

        RefreshOutcome {
            snapshot: AggregationSnapshot::new(
                sequence,
                Some(current),
                album_tracks,
                artist_albums,
                disc_list,
            ),
            failures,
        }
    }

    /// Read `track` and pick the artist credit used by both queries.
    pub fn analyze_track(&self, track: &TrackRef) -> CurrentTrackInfo {
        let info = self.reader.get_info(Some(track));
        CurrentTrackInfo::from_info(track.clone(), &info, self.prefer_album_artist)
    }

    /// Every track of the current album, sorted by (disc, track).
    pub async fn load_album_tracks(
        &self,
        current: &CurrentTrackInfo,
    ) -> Result<Vec<AlbumTrackEntry>> {
        let filter = FilterExpression::album_scope(
            &current.artist,
            &current.album,
            current.uses_album_artist,
        );
        let tracks = self.query(&filter).await?;

        let mut entries: Vec<AlbumTrackEntry> = tracks
            .into_iter()
            .map(|track| {
                let info = self.reader.get_info(Some(&track));
                AlbumTrackEntry::from_info(track, &info)
            })
            .collect();
        entries.sort_by_key(|entry| (entry.disc_number, entry.track_number));
        Ok(entries)
    }

    /// The current artist's albums, one entry per album name, sorted by
    /// year (missing years last) then name.
    pub async fn load_artist_albums(
        &self,
        current: &CurrentTrackInfo,
    ) -> Result<Vec<ArtistAlbumEntry>> {
        let filter = FilterExpression::artist_scope(&current.artist, current.uses_album_artist);
        let tracks = self.query(&filter).await?;

        let mut seen = HashSet::new();
        let mut albums = Vec::new();
        for track in tracks {
            let info = self.reader.get_info(Some(&track));
            if !ArtistAlbumEntry::is_listable(&info.album) || !seen.insert(info.album.clone()) {
                continue;
            }
            albums.push(self.album_entry(track, info));
        }

        albums.sort_by(|a, b| {
            let year_a = a.parsed_year().unwrap_or(i64::MAX);
            let year_b = b.parsed_year().unwrap_or(i64::MAX);
            year_a.cmp(&year_b).then_with(|| a.album.cmp(&b.album))
        });
        Ok(albums)
    }

    /// Group album tracks by disc, each disc sorted by track number.
    pub fn derive_disc_list(album_tracks: &[AlbumTrackEntry]) -> Vec<DiscGroup> {
        let mut discs: BTreeMap<u32, Vec<AlbumTrackEntry>> = BTreeMap::new();
        for entry in album_tracks {
            discs.entry(entry.disc_number).or_default().push(entry.clone());
        }

        discs
            .into_iter()
            .map(|(disc_number, mut tracks)| {
                tracks.sort_by_key(|entry| entry.track_number);
                DiscGroup {
                    disc_number,
                    tracks,
                }
            })
            .collect()
    }

    /// Resolve the first track of an album with a dedicated query.
    ///
    /// "First" is the lowest `disc * 1000 + track`; ties keep library order.
    /// Returns `Ok(None)` when the album has no tracks.
    #[instrument(skip(self, album), fields(album = %album.album))]
    pub async fn find_first_track_of_album(
        &self,
        album: &ArtistAlbumEntry,
    ) -> Result<Option<TrackRef>> {
        let filter =
            FilterExpression::album_scope(&album.artist, &album.album, album.uses_album_artist);
        let tracks = self.query(&filter).await?;

        Ok(tracks
            .into_iter()
            .map(|track| {
                let info = self.reader.get_info(Some(&track));
                let position =
                    u64::from(info.disc_number) * 1000 + u64::from(info.track_number);
                (position, track)
            })
            .min_by_key(|(position, _)| *position)
            .map(|(_, track)| track))
    }

    fn album_entry(&self, track: TrackRef, info: TrackInfo) -> ArtistAlbumEntry {
        ArtistAlbumEntry {
            artist: info.display_artist(self.prefer_album_artist).to_string(),
            uses_album_artist: info.credits_album_artist(self.prefer_album_artist),
            album: info.album,
            year: info.date,
            sample_track: track,
        }
    }

    async fn query(&self, filter: &FilterExpression) -> Result<Vec<TrackRef>> {
        let expression = filter.to_string();
        debug!(filter = %expression, "Querying library");
        Ok(self.library.query_tracks(&expression).await?)
    }
}

fn settle<T>(step: RefreshStep, result: Result<Vec<T>>, failures: &mut Vec<StepFailure>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(step = %step, error = %e, "Refresh step failed, using empty collection");
            failures.push(StepFailure {
                step,
                message: e.to_string(),
            });
            Vec::new()
        }
    }
}
