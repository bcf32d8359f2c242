//! In-memory host fixtures.
//!
//! Enabled with the `test-support` feature. [`InMemoryLibrary`] answers
//! filter expressions by parsing them with [`FilterExpression::parse`] and
//! comparing tags exactly, which is how the host library behaves for the
//! expressions this crate produces.

use crate::query::FilterExpression;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::host::ViewHost;
use bridge_traits::library::{LibraryQuery, TrackRef};
use bridge_traits::metadata::MetadataSource;
use bridge_traits::playback::NowPlayingProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::Mutex;

/// One library track and its tags, keyed by title-format reference.
#[derive(Debug, Clone)]
pub struct TrackFixture {
    track: TrackRef,
    tags: HashMap<String, String>,
}

impl TrackFixture {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            track: TrackRef::new(path),
            tags: HashMap::new(),
        }
    }

    pub fn subsong(mut self, subsong: u32) -> Self {
        self.track = TrackRef::with_subsong(self.track.path(), subsong);
        self
    }

    pub fn tag(mut self, field: &str, value: impl Into<String>) -> Self {
        self.tags.insert(field.to_string(), value.into());
        self
    }

    pub fn artist(self, value: impl Into<String>) -> Self {
        self.tag("%artist%", value)
    }

    pub fn album_artist(self, value: impl Into<String>) -> Self {
        self.tag("%albumartist%", value)
    }

    pub fn album(self, value: impl Into<String>) -> Self {
        self.tag("%album%", value)
    }

    pub fn title(self, value: impl Into<String>) -> Self {
        self.tag("%title%", value)
    }

    pub fn date(self, value: impl Into<String>) -> Self {
        self.tag("%date%", value)
    }

    pub fn disc(self, value: impl Into<String>) -> Self {
        self.tag("%discnumber%", value)
    }

    pub fn track_no(self, value: impl Into<String>) -> Self {
        self.tag("%tracknumber%", value)
    }

    pub fn track_ref(&self) -> TrackRef {
        self.track.clone()
    }

    fn value(&self, field: &str) -> String {
        self.tags.get(field).cloned().unwrap_or_default()
    }
}

/// Library and metadata host backed by a vector of fixtures.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    tracks: Mutex<Vec<TrackFixture>>,
    queries: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
    playback_time: Mutex<String>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: impl IntoIterator<Item = TrackFixture>) -> Self {
        let library = Self::new();
        for track in tracks {
            library.add(track);
        }
        library
    }

    /// Add a track and return its handle.
    pub fn add(&self, track: TrackFixture) -> TrackRef {
        let handle = track.track_ref();
        self.tracks.lock().push(track);
        handle
    }

    /// Forget a track; later metadata reads for it report `NotAvailable`.
    pub fn remove(&self, track: &TrackRef) {
        self.tracks.lock().retain(|fixture| &fixture.track != track);
    }

    /// Make every query whose text contains `pattern` fail.
    pub fn fail_queries_containing(&self, pattern: impl Into<String>) {
        self.failing.lock().push(pattern.into());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().clear();
    }

    pub fn set_playback_time(&self, value: impl Into<String>) {
        *self.playback_time.lock() = value.into();
    }

    /// Every filter expression received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().len()
    }

    pub fn clear_queries(&self) {
        self.queries.lock().clear();
    }

    /// Look up a handle by path (first sub-song).
    pub fn track(&self, path: &str) -> Option<TrackRef> {
        self.tracks.lock()
            .iter()
            .find(|fixture| fixture.track.path() == path)
            .map(TrackFixture::track_ref)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl LibraryQuery for InMemoryLibrary {
    async fn query_tracks(&self, filter: &str) -> Result<Vec<TrackRef>> {
        self.queries.lock().push(filter.to_string());

        if self.failing.lock()
            .iter()
            .any(|pattern| filter.contains(pattern.as_str()))
        {
            return Err(BridgeError::Query(format!("injected failure for {filter}")));
        }

        let expression =
            FilterExpression::parse(filter).map_err(|e| BridgeError::Query(e.to_string()))?;

        Ok(self.tracks.lock()
            .iter()
            .filter(|fixture| expression.matches(|field| Some(fixture.value(field))))
            .map(TrackFixture::track_ref)
            .collect())
    }
}

impl MetadataSource for InMemoryLibrary {
    fn eval_field(&self, field: &str, track: &TrackRef) -> Result<String> {
        self.tracks.lock()
            .iter()
            .find(|fixture| &fixture.track == track)
            .map(|fixture| fixture.value(field))
            .ok_or_else(|| BridgeError::NotAvailable(format!("unknown track {track}")))
    }

    fn eval_global(&self, field: &str) -> Result<String> {
        match field {
            "%playback_time%" => Ok(self.playback_time.lock().clone()),
            _ => Ok(String::new()),
        }
    }
}

/// Now-playing host whose answer is set by the test.
#[derive(Debug, Default)]
pub struct StaticNowPlaying {
    track: Mutex<Option<TrackRef>>,
    calls: AtomicUsize,
}

impl StaticNowPlaying {
    pub fn new(track: Option<TrackRef>) -> Self {
        Self {
            track: Mutex::new(track),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, track: Option<TrackRef>) {
        *self.track.lock() = track;
    }

    /// Number of times the host was asked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl NowPlayingProvider for StaticNowPlaying {
    async fn now_playing(&self) -> Result<Option<TrackRef>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.track.lock().clone())
    }
}

/// View host that counts repaint requests.
#[derive(Debug, Default)]
pub struct RecordingViewHost {
    repaints: AtomicUsize,
}

impl RecordingViewHost {
    pub fn repaints(&self) -> usize {
        self.repaints.load(Ordering::SeqCst)
    }
}

impl ViewHost for RecordingViewHost {
    fn request_repaint(&self) {
        self.repaints.fetch_add(1, Ordering::SeqCst);
    }
}
