//! # Host Bridge Traits
//!
//! Capability traits that the media-player host must implement for the panel
//! data core.
//!
//! ## Overview
//!
//! The core aggregates "what is the current track" into the data behind the
//! track, disc and discography panels. Everything it needs from the player is
//! expressed as a trait here, injected at construction time, so the core
//! never inspects the host at runtime.
//!
//! ## Traits
//!
//! ### Library
//! - [`LibraryQuery`](library::LibraryQuery) - Evaluate a filter expression, return matching tracks
//! - [`MetadataSource`](metadata::MetadataSource) - Evaluate title-format fields against a track
//! - [`NowPlayingProvider`](playback::NowPlayingProvider) - Report the track loaded in the player
//!
//! ### Presentation
//! - [`ViewHost`](host::ViewHost) - Receive repaint requests after data changes
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). The core never
//! surfaces these to the rendering layer: failed reads degrade to default
//! metadata and failed queries to empty collections.
//!
//! ## Thread Safety
//!
//! Native builds require `Send + Sync` implementations (see
//! [`PlatformSendSync`](platform::PlatformSendSync)) so a single core instance
//! can be shared across async tasks.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::library::{LibraryQuery, TrackRef};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct PlayerLibrary { /* host handle */ }
//!
//! #[async_trait]
//! impl LibraryQuery for PlayerLibrary {
//!     async fn query_tracks(&self, filter: &str) -> Result<Vec<TrackRef>> {
//!         // Forward to the player's query engine
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod host;
pub mod library;
pub mod log;
pub mod metadata;
pub mod platform;
pub mod playback;

pub use error::BridgeError;

// Re-export commonly used types
pub use host::ViewHost;
pub use library::{LibraryQuery, TrackRef};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use metadata::MetadataSource;
pub use playback::NowPlayingProvider;
