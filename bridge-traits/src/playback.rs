//! Playback state bridge.
//!
//! The core does not drive playback. It only needs to know which track the
//! host player is currently playing so that it can fall back to it when no
//! track change notification has been received yet.

use crate::{error::Result, library::TrackRef, platform::PlatformSendSync};

/// "Now playing" capability.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NowPlayingProvider: PlatformSendSync {
    /// Track currently loaded in the host player, or `None` when stopped.
    async fn now_playing(&self) -> Result<Option<TrackRef>>;
}
