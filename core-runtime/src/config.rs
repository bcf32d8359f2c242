//! # Core Configuration Module
//!
//! Collects the host capabilities and options the panel core is built from.
//!
//! ## Overview
//!
//! The configuration uses a builder pattern to construct a `CoreConfig`. It
//! fails fast: every capability the core cannot work without must be injected
//! before `build()` succeeds, so a misconfigured host is caught at startup
//! rather than on the first track change.
//!
//! ## Required Capabilities
//!
//! - `LibraryQuery` - Evaluates filter expressions against the host library
//! - `MetadataSource` - Evaluates title-format fields against a track
//! - `NowPlayingProvider` - Reports the track loaded in the player
//!
//! ## Optional Capabilities
//!
//! - `ViewHost` - Receives repaint requests after data changes
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, PanelOptions};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .library(Arc::new(HostLibrary::new(handle)))
//!     .metadata(Arc::new(HostTitleFormat::new(handle)))
//!     .now_playing(Arc::new(HostPlayback::new(handle)))
//!     .view_host(Arc::new(PanelWindow::new(handle)))
//!     .prefer_album_artist(true)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing the library capability
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required capabilities");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{LibraryQuery, MetadataSource, NowPlayingProvider, ViewHost};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Upper bound for the event channel buffer.
pub const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Behavioural options of the panel core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelOptions {
    /// Scope album and artist queries by `%albumartist%` instead of
    /// `%artist%`. Tracks without an album artist fall back to the artist.
    pub prefer_album_artist: bool,

    /// Capacity of the event bus channel.
    pub event_buffer_size: usize,

    /// Switch to playing mode, and so refresh, when the service starts.
    pub refresh_on_start: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            prefer_album_artist: false,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            refresh_on_start: true,
        }
    }
}

impl PanelOptions {
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

/// Core configuration for the panel core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Host library query engine (required)
    pub library: Arc<dyn LibraryQuery>,

    /// Host metadata evaluator (required)
    pub metadata: Arc<dyn MetadataSource>,

    /// Host playback state (required)
    pub now_playing: Arc<dyn NowPlayingProvider>,

    /// Rendering layer to notify after data changes (optional)
    pub view_host: Option<Arc<dyn ViewHost>>,

    pub options: PanelOptions,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("library", &"LibraryQuery { ... }")
            .field("metadata", &"MetadataSource { ... }")
            .field("now_playing", &"NowPlayingProvider { ... }")
            .field(
                "view_host",
                &self.view_host.as_ref().map(|_| "ViewHost { ... }"),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates option ranges.
    pub fn validate(&self) -> Result<()> {
        self.options.validate()
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    library: Option<Arc<dyn LibraryQuery>>,
    metadata: Option<Arc<dyn MetadataSource>>,
    now_playing: Option<Arc<dyn NowPlayingProvider>>,
    view_host: Option<Arc<dyn ViewHost>>,
    options: PanelOptions,
}

impl CoreConfigBuilder {
    /// Sets the library query capability.
    pub fn library(mut self, library: Arc<dyn LibraryQuery>) -> Self {
        self.library = Some(library);
        self
    }

    /// Sets the metadata evaluation capability.
    pub fn metadata(mut self, metadata: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the now-playing capability.
    pub fn now_playing(mut self, now_playing: Arc<dyn NowPlayingProvider>) -> Self {
        self.now_playing = Some(now_playing);
        self
    }

    /// Sets the rendering host to notify after data changes.
    pub fn view_host(mut self, host: Arc<dyn ViewHost>) -> Self {
        self.view_host = Some(host);
        self
    }

    pub fn prefer_album_artist(mut self, prefer: bool) -> Self {
        self.options.prefer_album_artist = prefer;
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.options.event_buffer_size = size;
        self
    }

    pub fn refresh_on_start(mut self, refresh: bool) -> Self {
        self.options.refresh_on_start = refresh;
        self
    }

    /// Replaces all options at once.
    pub fn options(mut self, options: PanelOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] naming the first missing required capability
    /// - [`Error::Config`] if an option is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let library = self.library.ok_or_else(|| {
            capability_missing(
                "LibraryQuery",
                "LibraryQuery implementation is required to load album and artist tracks. \
                 Inject the host library with .library().",
            )
        })?;

        let metadata = self.metadata.ok_or_else(|| {
            capability_missing(
                "MetadataSource",
                "MetadataSource implementation is required to read track tags. \
                 Inject the host title-format evaluator with .metadata().",
            )
        })?;

        let now_playing = self.now_playing.ok_or_else(|| {
            capability_missing(
                "NowPlayingProvider",
                "NowPlayingProvider implementation is required to resolve the playing track. \
                 Inject the host playback state with .now_playing().",
            )
        })?;

        let config = CoreConfig {
            library,
            metadata,
            now_playing,
            view_host: self.view_host,
            options: self.options,
        };

        config.validate()?;

        Ok(config)
    }
}
