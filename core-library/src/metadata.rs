//! Metadata reader
//!
//! Turns a [`TrackRef`] into a normalized [`TrackInfo`] by evaluating a fixed
//! set of title-format fields through the host [`MetadataSource`]. Reads never
//! fail: a field that cannot be evaluated takes its documented default, and a
//! track the host no longer knows yields the all-default struct.

use crate::models::{
    parse_disc_number, parse_rating, parse_track_number, TrackInfo, DEFAULT_DURATION,
    UNKNOWN_ALBUM, UNKNOWN_ARTIST, UNTITLED,
};
use bridge_traits::{error::BridgeError, library::TrackRef, metadata::MetadataSource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fields read for every track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Artist,
    AlbumArtist,
    Title,
    Album,
    Date,
    TrackNumber,
    DiscNumber,
    TotalTracks,
    Length,
    PlaybackTime,
    Rating,
    Genre,
}

impl MetadataField {
    pub const ALL: [MetadataField; 12] = [
        MetadataField::Artist,
        MetadataField::AlbumArtist,
        MetadataField::Title,
        MetadataField::Album,
        MetadataField::Date,
        MetadataField::TrackNumber,
        MetadataField::DiscNumber,
        MetadataField::TotalTracks,
        MetadataField::Length,
        MetadataField::PlaybackTime,
        MetadataField::Rating,
        MetadataField::Genre,
    ];

    /// Title-format reference understood by the host.
    pub fn pattern(self) -> &'static str {
        match self {
            MetadataField::Artist => "%artist%",
            MetadataField::AlbumArtist => "%albumartist%",
            MetadataField::Title => "%title%",
            MetadataField::Album => "%album%",
            MetadataField::Date => "%date%",
            MetadataField::TrackNumber => "%tracknumber%",
            MetadataField::DiscNumber => "%discnumber%",
            MetadataField::TotalTracks => "%totaltracks%",
            MetadataField::Length => "%length%",
            MetadataField::PlaybackTime => "%playback_time%",
            MetadataField::Rating => "%rating%",
            MetadataField::Genre => "%genre%",
        }
    }

    /// Text substituted when the field is empty or cannot be evaluated.
    pub fn default_value(self) -> &'static str {
        match self {
            MetadataField::Artist | MetadataField::AlbumArtist => UNKNOWN_ARTIST,
            MetadataField::Title => UNTITLED,
            MetadataField::Album => UNKNOWN_ALBUM,
            MetadataField::DiscNumber => "1",
            MetadataField::Length | MetadataField::PlaybackTime => DEFAULT_DURATION,
            _ => "",
        }
    }
}

/// Normalizing reader over the host metadata capability.
pub struct MetadataReader {
    source: Arc<dyn MetadataSource>,
    initialized: AtomicBool,
}

impl MetadataReader {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            initialized: AtomicBool::new(false),
        }
    }

    /// Prepare the host field evaluators.
    ///
    /// Idempotent. Returns whether the reader is ready; a failed preparation
    /// is logged and retried on the next call.
    pub fn init(&self) -> bool {
        if self.initialized.load(Ordering::Acquire) {
            return true;
        }

        let patterns: Vec<&str> = MetadataField::ALL.iter().map(|f| f.pattern()).collect();
        match self.source.prepare(&patterns) {
            Ok(()) => {
                self.initialized.store(true, Ordering::Release);
                debug!(fields = patterns.len(), "Metadata evaluators prepared");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to prepare metadata evaluators");
                false
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Read the normalized info of `track`.
    ///
    /// `None`, an uninitializable host, or a track the host reports as gone
    /// all produce [`TrackInfo::default`].
    pub fn get_info(&self, track: Option<&TrackRef>) -> TrackInfo {
        let Some(track) = track else {
            return TrackInfo::default();
        };
        if !self.init() {
            return TrackInfo::default();
        }

        match self.read_all(track) {
            Ok(info) => info,
            Err(e) => {
                debug!(track = %track, error = %e, "Track unavailable, using defaults");
                TrackInfo::default()
            }
        }
    }

    /// Current playback position as formatted by the host.
    pub fn playback_time(&self) -> String {
        if !self.init() {
            return DEFAULT_DURATION.to_string();
        }
        let field = MetadataField::PlaybackTime;
        match self.source.eval_global(field.pattern()) {
            Ok(value) if !value.is_empty() => value,
            Ok(_) => field.default_value().to_string(),
            Err(e) => {
                debug!(error = %e, "Playback time unavailable");
                field.default_value().to_string()
            }
        }
    }

    fn read_all(&self, track: &TrackRef) -> Result<TrackInfo, BridgeError> {
        let text = |field: MetadataField| self.field(field, track);

        Ok(TrackInfo {
            artist: text(MetadataField::Artist)?,
            album_artist: text(MetadataField::AlbumArtist)?,
            title: text(MetadataField::Title)?,
            album: text(MetadataField::Album)?,
            date: text(MetadataField::Date)?,
            track_number: parse_track_number(&text(MetadataField::TrackNumber)?),
            disc_number: parse_disc_number(&text(MetadataField::DiscNumber)?),
            total_tracks: text(MetadataField::TotalTracks)?,
            duration: text(MetadataField::Length)?,
            rating: parse_rating(&text(MetadataField::Rating)?),
            genre: text(MetadataField::Genre)?,
            path: track.path().to_string(),
        })
    }

    /// Evaluate one field, substituting its default for an empty value or a
    /// field-level failure. Only a vanished track aborts the whole read.
    fn field(&self, field: MetadataField, track: &TrackRef) -> Result<String, BridgeError> {
        match self.source.eval_field(field.pattern(), track) {
            Ok(value) if value.is_empty() => Ok(field.default_value().to_string()),
            Ok(value) => Ok(value),
            Err(e @ BridgeError::NotAvailable(_)) => Err(e),
            Err(e) => {
                debug!(field = field.pattern(), error = %e, "Field evaluation failed");
                Ok(field.default_value().to_string())
            }
        }
    }
}
