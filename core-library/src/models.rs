//! Domain models for the panel data core
//!
//! Plain data carried between the metadata reader, the aggregator and the
//! rendering layer. None of these types talk to the host.

use bridge_traits::library::TrackRef;
use serde::{Deserialize, Serialize};

// =============================================================================
// Defaults
// =============================================================================

/// Artist shown when the artist or album-artist tag is missing.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Title shown when the title tag is missing.
pub const UNTITLED: &str = "Untitled";
/// Album shown when the album tag is missing.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";
/// Placeholder some hosts render for an unset field.
pub const PLACEHOLDER_ALBUM: &str = "?";
/// Duration and playback time shown when unknown.
pub const DEFAULT_DURATION: &str = "0:00";
/// Disc assumed when the disc number tag is missing or unusable.
pub const DEFAULT_DISC_NUMBER: u32 = 1;

// =============================================================================
// Domain Models
// =============================================================================

/// Normalized metadata snapshot of one track.
///
/// Produced by [`MetadataReader`](crate::metadata::MetadataReader); every
/// field carries a usable value even when the underlying tag is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub artist: String,
    pub album_artist: String,
    pub title: String,
    pub album: String,
    /// Raw date tag, e.g. `1969` or `1969-09-26`
    pub date: String,
    /// Position on the disc, 0 when absent
    pub track_number: u32,
    /// Disc number, 1 when absent
    pub disc_number: u32,
    pub total_tracks: String,
    /// Formatted length, e.g. `4:19`
    pub duration: String,
    /// Rating, 0.0 when absent
    pub rating: f32,
    pub genre: String,
    pub path: String,
}

impl Default for TrackInfo {
    fn default() -> Self {
        Self {
            artist: UNKNOWN_ARTIST.to_string(),
            album_artist: UNKNOWN_ARTIST.to_string(),
            title: UNTITLED.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            date: String::new(),
            track_number: 0,
            disc_number: DEFAULT_DISC_NUMBER,
            total_tracks: String::new(),
            duration: DEFAULT_DURATION.to_string(),
            rating: 0.0,
            genre: String::new(),
            path: String::new(),
        }
    }
}

impl TrackInfo {
    /// Release year parsed from the date tag.
    pub fn year(&self) -> Option<i64> {
        parse_year(&self.date)
    }

    /// Artist credited for grouping purposes.
    ///
    /// With `prefer_album_artist` set, the album artist wins unless it is
    /// empty or the unknown-artist default, in which case the track artist is
    /// used.
    pub fn display_artist(&self, prefer_album_artist: bool) -> &str {
        if self.credits_album_artist(prefer_album_artist) {
            &self.album_artist
        } else {
            &self.artist
        }
    }

    /// Whether [`display_artist`](Self::display_artist) picks the album
    /// artist, and so whether queries must scope on `%albumartist%`.
    pub fn credits_album_artist(&self, prefer_album_artist: bool) -> bool {
        prefer_album_artist && !self.album_artist.is_empty() && self.album_artist != UNKNOWN_ARTIST
    }
}

/// Analysis of the track the panels are currently centred on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTrackInfo {
    pub track: TrackRef,
    /// Artist credit used for both canonical queries
    pub artist: String,
    /// `artist` is the album artist rather than the track artist
    #[serde(default)]
    pub uses_album_artist: bool,
    pub album: String,
    pub title: String,
    pub year: String,
    pub track_number: u32,
    pub disc_number: u32,
    pub rating: f32,
    pub duration: String,
    pub genre: String,
    pub path: String,
}

impl CurrentTrackInfo {
    pub fn from_info(track: TrackRef, info: &TrackInfo, prefer_album_artist: bool) -> Self {
        Self {
            artist: info.display_artist(prefer_album_artist).to_string(),
            uses_album_artist: info.credits_album_artist(prefer_album_artist),
            album: info.album.clone(),
            title: info.title.clone(),
            year: info.date.clone(),
            track_number: info.track_number,
            disc_number: info.disc_number,
            rating: info.rating,
            duration: info.duration.clone(),
            genre: info.genre.clone(),
            path: info.path.clone(),
            track,
        }
    }
}

/// One track of the current album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumTrackEntry {
    pub track: TrackRef,
    pub title: String,
    pub track_number: u32,
    pub disc_number: u32,
    pub rating: f32,
    pub duration: String,
    pub path: String,
}

impl AlbumTrackEntry {
    pub fn from_info(track: TrackRef, info: &TrackInfo) -> Self {
        Self {
            track,
            title: info.title.clone(),
            track_number: info.track_number,
            disc_number: info.disc_number,
            rating: info.rating,
            duration: info.duration.clone(),
            path: info.path.clone(),
        }
    }
}

/// One album in the current artist's discography.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistAlbumEntry {
    pub album: String,
    pub artist: String,
    /// `artist` is the album artist rather than the track artist
    #[serde(default)]
    pub uses_album_artist: bool,
    /// Raw date tag of the first track seen for this album
    pub year: String,
    /// First track the artist query returned for this album
    pub sample_track: TrackRef,
}

impl ArtistAlbumEntry {
    /// Year used for ordering; `None` sorts after every real year.
    pub fn parsed_year(&self) -> Option<i64> {
        parse_year(&self.year)
    }

    /// Whether an album name identifies a real album rather than a
    /// missing-tag placeholder.
    pub fn is_listable(album: &str) -> bool {
        !album.is_empty() && album != UNKNOWN_ALBUM && album != PLACEHOLDER_ALBUM
    }
}

/// Tracks of one disc, ordered by track number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscGroup {
    pub disc_number: u32,
    pub tracks: Vec<AlbumTrackEntry>,
}

impl DiscGroup {
    /// Track with the lowest track number on this disc.
    pub fn first_track(&self) -> Option<&AlbumTrackEntry> {
        self.tracks.iter().min_by_key(|entry| entry.track_number)
    }
}

/// Readout for the "now playing" area, refreshed on every playback change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlayingInfo {
    pub info: TrackInfo,
    pub playback_time: String,
}

impl Default for NowPlayingInfo {
    fn default() -> Self {
        Self {
            info: TrackInfo::default(),
            playback_time: DEFAULT_DURATION.to_string(),
        }
    }
}

// =============================================================================
// Tag parsing
// =============================================================================

/// Parse the leading integer of a tag value.
///
/// Tags such as `3/12` or `1969-09-26` carry extra text after the number;
/// only the leading digits (with an optional sign) are read.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse the leading decimal number of a tag value, e.g. a rating.
pub fn parse_leading_float(value: &str) -> Option<f32> {
    let trimmed = value.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (index, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if index == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = index + c.len_utf8();
    }

    if !seen_digit {
        return None;
    }
    trimmed[..end].parse::<f32>().ok()
}

/// Track number tag to integer; absent or unusable values become 0.
pub fn parse_track_number(value: &str) -> u32 {
    parse_leading_int(value)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

/// Disc number tag to integer; absent, zero or unusable values become 1.
pub fn parse_disc_number(value: &str) -> u32 {
    parse_leading_int(value)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_DISC_NUMBER)
}

/// Rating tag to float; absent or unusable values become 0.0.
pub fn parse_rating(value: &str) -> f32 {
    parse_leading_float(value).unwrap_or(0.0)
}

/// Year from a date tag; zero or unusable values count as missing.
pub fn parse_year(value: &str) -> Option<i64> {
    parse_leading_int(value).filter(|year| *year > 0)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_info_defaults() {
        let info = TrackInfo::default();
        assert_eq!(info.artist, "Unknown Artist");
        assert_eq!(info.album_artist, "Unknown Artist");
        assert_eq!(info.title, "Untitled");
        assert_eq!(info.album, "Unknown Album");
        assert_eq!(info.disc_number, 1);
        assert_eq!(info.track_number, 0);
        assert_eq!(info.duration, "0:00");
        assert_eq!(info.rating, 0.0);
        assert!(info.date.is_empty());
        assert!(info.genre.is_empty());
        assert!(info.path.is_empty());
    }

    #[test]
    fn test_display_artist_prefers_album_artist() {
        let info = TrackInfo {
            artist: "Paul McCartney".to_string(),
            album_artist: "The Beatles".to_string(),
            ..TrackInfo::default()
        };
        assert_eq!(info.display_artist(true), "The Beatles");
        assert!(info.credits_album_artist(true));
        assert_eq!(info.display_artist(false), "Paul McCartney");
        assert!(!info.credits_album_artist(false));
    }

    #[test]
    fn test_display_artist_falls_back_when_album_artist_missing() {
        let empty = TrackInfo {
            artist: "Nico".to_string(),
            album_artist: String::new(),
            ..TrackInfo::default()
        };
        assert_eq!(empty.display_artist(true), "Nico");
        assert!(!empty.credits_album_artist(true));

        let defaulted = TrackInfo {
            artist: "Nico".to_string(),
            ..TrackInfo::default()
        };
        assert_eq!(defaulted.display_artist(true), "Nico");
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("5"), Some(5));
        assert_eq!(parse_leading_int(" 3/12"), Some(3));
        assert_eq!(parse_leading_int("1969-09-26"), Some(1969));
        assert_eq!(parse_leading_int("-2"), Some(-2));
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("?"), None);
        assert_eq!(parse_leading_int("A1"), None);
    }

    #[test]
    fn test_parse_numbers_apply_defaults() {
        assert_eq!(parse_track_number(""), 0);
        assert_eq!(parse_track_number("07"), 7);
        assert_eq!(parse_track_number("-1"), 0);
        assert_eq!(parse_disc_number(""), 1);
        assert_eq!(parse_disc_number("0"), 1);
        assert_eq!(parse_disc_number("2/2"), 2);
        assert_eq!(parse_rating(""), 0.0);
        assert_eq!(parse_rating("4"), 4.0);
        assert_eq!(parse_rating("3.5 stars"), 3.5);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("1965"), Some(1965));
        assert_eq!(parse_year("1969-09-26"), Some(1969));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("0"), None);
        assert_eq!(parse_year("unknown"), None);
    }

    #[test]
    fn test_album_listability() {
        assert!(ArtistAlbumEntry::is_listable("Abbey Road"));
        assert!(!ArtistAlbumEntry::is_listable(""));
        assert!(!ArtistAlbumEntry::is_listable("Unknown Album"));
        assert!(!ArtistAlbumEntry::is_listable("?"));
    }

    #[test]
    fn test_disc_group_first_track() {
        let entry = |n: u32| AlbumTrackEntry {
            track: TrackRef::new(format!("/music/{n}.flac")),
            title: format!("Track {n}"),
            track_number: n,
            disc_number: 2,
            rating: 0.0,
            duration: DEFAULT_DURATION.to_string(),
            path: format!("/music/{n}.flac"),
        };
        let group = DiscGroup {
            disc_number: 2,
            tracks: vec![entry(4), entry(2), entry(9)],
        };
        assert_eq!(group.first_track().map(|t| t.track_number), Some(2));

        let empty = DiscGroup {
            disc_number: 3,
            tracks: Vec::new(),
        };
        assert!(empty.first_track().is_none());
    }

    #[test]
    fn test_track_info_serialization() {
        let info = TrackInfo {
            title: "Come Together".to_string(),
            track_number: 1,
            ..TrackInfo::default()
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: TrackInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
