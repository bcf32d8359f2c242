//! Panel core for a media player's track, album and discography panels.
//!
//! Hosts depend on this crate alone. It re-exports the service façade, the
//! configuration builder and the capability traits the host implements.

pub use bridge_traits::{
    BridgeError, LibraryQuery, LoggerSink, MetadataSource, NowPlayingProvider, TrackRef, ViewHost,
};
pub use core_library::{
    AlbumTrackEntry, ArtistAlbumEntry, CurrentTrackInfo, DiscGroup, NowPlayingInfo,
    ViewProjector,
};
pub use core_runtime::config::{CoreConfig, CoreConfigBuilder, PanelOptions};
pub use core_runtime::events::{CoreEvent, EventStream};
pub use core_runtime::logging::{init_logging, LoggingConfig};
pub use core_service::{CoreError, CoreService, EventRouter, PanelService, SelectionMode};
