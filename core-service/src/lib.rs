//! Core service façade.
//!
//! This crate wires the host capabilities collected in
//! [`CoreConfig`](core_runtime::config::CoreConfig) into the panel core:
//!
//! - [`PanelService`] owns the selection state, runs refreshes, and serves
//!   the views from the published snapshot.
//! - [`EventRouter`] turns host notifications (track change, album or disc
//!   click) into selection changes.
//! - [`CoreService`] bundles both and handles startup.
//!
//! ```ignore
//! let config = CoreConfig::builder()
//!     .library(library)
//!     .metadata(metadata)
//!     .now_playing(player)
//!     .view_host(window)
//!     .build()?;
//!
//! let core = CoreService::new(config)?;
//! core.start().await?;
//!
//! // On the host's playback callback:
//! core.router().on_track_change(Some(track)).await;
//!
//! // On paint:
//! let disc_tracks = core.panel().get_disc_tracks();
//! ```

pub mod error;
pub mod router;
pub mod selector;
pub mod service;
pub mod store;

pub use error::{CoreError, Result};
pub use router::EventRouter;
pub use selector::{SelectionMode, TrackSelector, Transition};
pub use service::{PanelService, RefreshReport};
pub use store::{Publication, SnapshotStore};

use core_runtime::config::{CoreConfig, PanelOptions};
use core_runtime::events::EventStream;
use std::sync::Arc;
use tracing::{info, warn};

/// Primary façade exposed to host applications.
#[derive(Debug, Clone)]
pub struct CoreService {
    panel: Arc<PanelService>,
    router: EventRouter,
    options: PanelOptions,
}

impl CoreService {
    /// Create the service from a validated configuration.
    pub fn new(config: CoreConfig) -> Result<Self> {
        let options = config.options;
        let panel = Arc::new(PanelService::new(config)?);
        let router = EventRouter::new(Arc::clone(&panel));

        Ok(Self {
            panel,
            router,
            options,
        })
    }

    /// Prepare metadata evaluation and, unless disabled, load the panels for
    /// the playing track.
    ///
    /// Returns whether the initial refresh left a track on display.
    ///
    /// # Errors
    ///
    /// [`CoreError::InitializationFailed`] if the metadata source could not
    /// be prepared. The service stays usable; preparation is retried on the
    /// next metadata read.
    pub async fn start(&self) -> Result<bool> {
        if !self.panel.reader().init() {
            warn!("Metadata source not ready at startup");
            return Err(CoreError::InitializationFailed(
                "metadata source could not be prepared".to_string(),
            ));
        }

        if !self.options.refresh_on_start {
            info!("Panel core started without initial refresh");
            return Ok(false);
        }

        let has_track = self.panel.set_mode(SelectionMode::Playing).await?;
        info!(has_track, "Panel core started");
        Ok(has_track)
    }

    pub fn panel(&self) -> &Arc<PanelService> {
        &self.panel
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    pub fn subscribe(&self) -> EventStream {
        self.panel.subscribe()
    }
}
