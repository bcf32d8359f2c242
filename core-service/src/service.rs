//! Panel service.
//!
//! Owns the selection state, the refresh pipeline and the published
//! snapshot. Every refresh resolves the current track, rebuilds the
//! collections, and publishes them as one [`AggregationSnapshot`]. Views are
//! read from whatever snapshot is published at the time of the call, so a
//! paint never observes a half-finished refresh.

use crate::error::{CoreError, Result};
use crate::selector::{Resolution, SelectionMode, TrackSelector, Transition};
use crate::store::{Publication, SnapshotStore};
use bridge_traits::{NowPlayingProvider, TrackRef, ViewHost};
use core_library::models::DEFAULT_DISC_NUMBER;
use core_library::{
    AggregationSnapshot, AlbumTrackEntry, Aggregator, ArtistAlbumEntry, CurrentTrackInfo,
    DiscGroup, MetadataReader, NowPlayingInfo, RefreshOutcome, ViewProjector,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{
    AggregationEvent, CoreEvent, EventBus, EventStream, SelectionEvent,
};
use core_runtime::logging::strip_path;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What a refresh did.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub sequence: u64,
    /// Track the refresh was built for.
    pub track: Option<TrackRef>,
    /// Whether the result became the visible snapshot.
    pub published: bool,
}

impl RefreshReport {
    /// True when a track resolved and its data is now on display.
    pub fn has_data(&self) -> bool {
        self.published && self.track.is_some()
    }
}

pub struct PanelService {
    selector: Mutex<TrackSelector>,
    reader: Arc<MetadataReader>,
    aggregator: Aggregator,
    now_playing: Arc<dyn NowPlayingProvider>,
    view_host: Option<Arc<dyn ViewHost>>,
    store: SnapshotStore,
    now_playing_info: RwLock<NowPlayingInfo>,
    events: EventBus,
}

impl PanelService {
    /// Wire the service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let reader = Arc::new(MetadataReader::new(config.metadata));
        let aggregator = Aggregator::new(config.library, Arc::clone(&reader))
            .with_album_artist_preference(config.options.prefer_album_artist);

        Ok(Self {
            selector: Mutex::new(TrackSelector::new()),
            reader,
            aggregator,
            now_playing: config.now_playing,
            view_host: config.view_host,
            store: SnapshotStore::new(),
            now_playing_info: RwLock::new(NowPlayingInfo::default()),
            events: EventBus::new(config.options.event_buffer_size),
        })
    }

    pub fn reader(&self) -> &Arc<MetadataReader> {
        &self.reader
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn current_mode(&self) -> SelectionMode {
        self.selector().mode()
    }

    /// Resolve the track the panels are centred on.
    ///
    /// Uses the selected track in selected mode, otherwise the cached playing
    /// track, otherwise asks the host. Host failures read as no track.
    pub async fn current_track(&self) -> Option<TrackRef> {
        let resolution = self.selector().resolve();
        match resolution {
            Resolution::Track(track) => Some(track),
            Resolution::AskNowPlaying => match self.now_playing.now_playing().await {
                Ok(track) => track,
                Err(e) => {
                    warn!(error = %e, "Now-playing lookup failed");
                    None
                }
            },
        }
    }

    /// Switch the selection mode and refresh.
    ///
    /// Returns whether the refresh left a track on display. Selected mode is
    /// rejected until a track has been selected.
    pub async fn set_mode(&self, mode: SelectionMode) -> Result<bool> {
        let transition = self.selector().set_mode(mode);
        self.apply_transition(mode.as_str(), mode, transition)?;
        Ok(self.refresh().await.has_data())
    }

    /// Same as [`set_mode`](Self::set_mode) for a mode named by the host.
    pub async fn set_mode_named(&self, name: &str) -> Result<bool> {
        let mode = name
            .parse::<SelectionMode>()
            .map_err(|_| self.reject(name, "unknown selection mode"))?;
        self.set_mode(mode).await
    }

    /// Pin `track` as the selection and refresh. `None` is a no-op.
    pub async fn select_track(&self, track: Option<TrackRef>) -> bool {
        let selected = track.clone();
        let transition = self.selector().select_track(track);

        let Some(track) = selected else {
            debug!("Ignoring empty track selection");
            return false;
        };

        info!(file = %strip_path(track.path()), "Track selected");
        self.emit(CoreEvent::Selection(SelectionEvent::TrackSelected { track }));
        if let Transition::Refresh { previous } = transition {
            self.mode_changed(previous, SelectionMode::Selected);
        }

        self.refresh().await.has_data()
    }

    /// Return to following the player, refresh, and repaint.
    ///
    /// Returns the track now on display.
    pub async fn snap_to_playing(&self) -> Option<TrackRef> {
        let transition = self.selector().snap_to_playing();
        if let Transition::Refresh { previous } = transition {
            self.mode_changed(previous, SelectionMode::Playing);
        }

        let report = self.refresh().await;
        if !report.published {
            self.request_repaint();
        }
        report.track
    }

    /// Record the host's new playing track and update the now-playing readout.
    ///
    /// Refreshes only in playing mode. The view is repainted either way, since
    /// the readout changed. Returns whether a refresh ran.
    pub(crate) async fn playing_track_changed(&self, track: Option<TrackRef>) -> bool {
        self.update_now_playing(track.as_ref());

        match &track {
            Some(t) => debug!(file = %strip_path(t.path()), "Playing track changed"),
            None => debug!("Playback stopped"),
        }
        self.emit(CoreEvent::Selection(SelectionEvent::PlayingTrackChanged {
            track: track.clone(),
        }));

        let transition = self.selector().on_track_change(track);
        if !transition.needs_refresh() {
            self.request_repaint();
            return false;
        }

        // A published snapshot repaints on its own
        if !self.refresh().await.published {
            self.request_repaint();
        }
        true
    }

    /// Show `disc_number` in the disc track view and repaint.
    pub(crate) fn select_disc(&self, disc_number: u32) -> Arc<AggregationSnapshot> {
        let snapshot = self.store.set_selected_disc(disc_number);
        debug!(disc_number, "Disc selected");
        self.emit(CoreEvent::Selection(SelectionEvent::DiscSelected { disc_number }));
        self.request_repaint();
        snapshot
    }

    /// Return the disc track view to the first disc without repainting.
    ///
    /// Used when a refresh is about to follow and will repaint anyway.
    pub(crate) fn reset_disc(&self) {
        self.store.set_selected_disc(DEFAULT_DISC_NUMBER);
        debug!(disc_number = DEFAULT_DISC_NUMBER, "Disc selection reset");
        self.emit(CoreEvent::Selection(SelectionEvent::DiscSelected {
            disc_number: DEFAULT_DISC_NUMBER,
        }));
    }

    // ------------------------------------------------------------------
    // Refresh
    // ------------------------------------------------------------------

    /// Rebuild every collection for the current track and publish it.
    ///
    /// Returns `false` when there is no current track or a newer refresh
    /// already published.
    pub async fn refresh_all_data(&self) -> bool {
        self.refresh().await.has_data()
    }

    #[instrument(skip(self))]
    async fn refresh(&self) -> RefreshReport {
        // Drawn before any I/O so sequence order is request order
        let sequence = self.store.next_sequence();
        let track = self.current_track().await;

        let RefreshOutcome { snapshot, failures } =
            self.aggregator.refresh(sequence, track.clone()).await;

        for failure in failures {
            self.emit(CoreEvent::Aggregation(AggregationEvent::QueryFailed {
                sequence,
                step: failure.step.to_string(),
                message: failure.message,
            }));
        }

        let published = match self.store.publish(snapshot) {
            Publication::Published(snapshot) => {
                info!(
                    sequence,
                    has_track = snapshot.has_track(),
                    album_tracks = snapshot.album_tracks().len(),
                    artist_albums = snapshot.artist_albums().len(),
                    "Snapshot published"
                );
                self.emit(CoreEvent::Aggregation(AggregationEvent::SnapshotPublished {
                    sequence,
                    has_track: snapshot.has_track(),
                    album_tracks: snapshot.album_tracks().len(),
                    artist_albums: snapshot.artist_albums().len(),
                    discs: snapshot.disc_list().len(),
                }));
                self.request_repaint();
                true
            }
            Publication::Superseded { published_sequence } => {
                debug!(sequence, published_sequence, "Refresh superseded");
                self.emit(CoreEvent::Aggregation(AggregationEvent::RefreshSuperseded {
                    sequence,
                    published_sequence,
                }));
                false
            }
        };

        RefreshReport {
            sequence,
            track,
            published,
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Projector over the snapshot visible right now.
    pub fn projector(&self) -> ViewProjector {
        ViewProjector::new(self.store.current())
    }

    pub fn current_track_info(&self) -> Option<CurrentTrackInfo> {
        self.projector().track_info().cloned()
    }

    pub fn selected_disc_number(&self) -> u32 {
        self.store.selected_disc()
    }

    pub fn get_track_info(&self) -> Option<CurrentTrackInfo> {
        self.current_track_info()
    }

    /// Tracks of the selected disc, in album order.
    pub fn get_disc_tracks(&self) -> Vec<AlbumTrackEntry> {
        self.projector().disc_tracks().into_iter().cloned().collect()
    }

    pub fn get_disc_list(&self) -> Vec<DiscGroup> {
        self.projector().disc_list().to_vec()
    }

    pub fn get_artist_albums(&self) -> Vec<ArtistAlbumEntry> {
        self.projector().artist_albums().to_vec()
    }

    pub fn now_playing_info(&self) -> NowPlayingInfo {
        self.now_playing_info.read().clone()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn selector(&self) -> MutexGuard<'_, TrackSelector> {
        self.selector.lock()
    }

    fn apply_transition(
        &self,
        requested: &str,
        mode: SelectionMode,
        transition: Transition,
    ) -> Result<()> {
        match transition {
            Transition::Refresh { previous } => {
                self.mode_changed(previous, mode);
                Ok(())
            }
            Transition::Quiet => Ok(()),
            Transition::Rejected { reason } => Err(self.reject(requested, reason)),
        }
    }

    fn reject(&self, requested: &str, reason: &str) -> CoreError {
        warn!(requested, reason, "Selection transition rejected");
        self.emit(CoreEvent::Selection(SelectionEvent::InvalidTransition {
            requested: requested.to_string(),
            reason: reason.to_string(),
        }));
        CoreError::InvalidTransition {
            requested: requested.to_string(),
            reason: reason.to_string(),
        }
    }

    fn mode_changed(&self, previous: SelectionMode, mode: SelectionMode) {
        if previous == mode {
            return;
        }
        info!(%previous, %mode, "Selection mode changed");
        self.emit(CoreEvent::Selection(SelectionEvent::ModeChanged {
            previous: previous.to_string(),
            mode: mode.to_string(),
        }));
    }

    fn update_now_playing(&self, track: Option<&TrackRef>) {
        let info = match track {
            Some(track) => NowPlayingInfo {
                info: self.reader.get_info(Some(track)),
                playback_time: self.reader.playback_time(),
            },
            None => NowPlayingInfo::default(),
        };

        *self.now_playing_info.write() = info;
    }

    fn request_repaint(&self) {
        if let Some(host) = &self.view_host {
            host.request_repaint();
        }
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is not an error
        self.events.emit(event).ok();
    }
}

impl std::fmt::Debug for PanelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelService")
            .field("mode", &self.current_mode())
            .field("sequence", &self.store.current().sequence())
            .field("events", &self.events)
            .finish()
    }
}
