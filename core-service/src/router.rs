//! Host event routing.
//!
//! Translates the three things a host can tell the panels (playback moved,
//! an album was clicked, a disc was clicked) into selection changes.

use crate::service::PanelService;
use bridge_traits::TrackRef;
use core_library::{ArtistAlbumEntry, ViewProjector};
use core_runtime::logging::strip_path;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct EventRouter {
    service: Arc<PanelService>,
}

impl EventRouter {
    pub fn new(service: Arc<PanelService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<PanelService> {
        &self.service
    }

    /// The host player moved to `track`, or stopped when `None`.
    ///
    /// The now-playing readout is always updated. The panels only follow in
    /// playing mode. Returns whether a refresh ran.
    pub async fn on_track_change(&self, track: Option<TrackRef>) -> bool {
        self.service.playing_track_changed(track).await
    }

    /// An album in the discography view was clicked.
    ///
    /// Selects the album's first track (lowest disc, then track number),
    /// falling back to the album's sample track if the lookup fails or finds
    /// nothing. The disc view is reset to disc 1 before the new album is
    /// published, and the publish does the only repaint.
    #[instrument(skip(self, album), fields(album = %album.album))]
    pub async fn on_album_selected(&self, album: &ArtistAlbumEntry) -> bool {
        let first = match self
            .service
            .aggregator()
            .find_first_track_of_album(album)
            .await
        {
            Ok(Some(track)) => track,
            Ok(None) => {
                debug!("Album query returned no tracks, using sample track");
                album.sample_track.clone()
            }
            Err(e) => {
                warn!(error = %e, "First-track lookup failed, using sample track");
                album.sample_track.clone()
            }
        };

        debug!(file = %strip_path(first.path()), "Selecting first track of album");
        self.service.reset_disc();
        self.service.select_track(Some(first)).await
    }

    /// A disc in the disc list was clicked.
    ///
    /// Shows that disc and selects its lowest-numbered track. Returns `false`
    /// when the disc has no tracks in the visible snapshot; the disc
    /// selection still applies.
    #[instrument(skip(self))]
    pub async fn on_disc_selected(&self, disc_number: u32) -> bool {
        let projector = ViewProjector::new(self.service.select_disc(disc_number));
        let first = projector
            .first_track_of_disc(disc_number)
            .map(|entry| entry.track.clone());

        match first {
            Some(track) => {
                self.service.select_track(Some(track)).await;
                true
            }
            None => {
                debug!("Disc has no tracks");
                false
            }
        }
    }
}
