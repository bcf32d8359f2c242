//! Metadata evaluation bridge.
//!
//! Tag values are read through the host's title-format engine. The core names
//! fields with title-format references (`%artist%`, `%discnumber%`, ...) and
//! receives the evaluated text.

use crate::{error::Result, library::TrackRef, platform::PlatformSendSync};

/// Metadata evaluation capability.
///
/// Evaluation is synchronous: hosts keep tag data in memory and answer in
/// microseconds, and the core evaluates a dozen fields for every track a
/// query returns.
pub trait MetadataSource: PlatformSendSync {
    /// Prepare evaluators for the given field references.
    ///
    /// Called once before the first evaluation. Hosts that compile title
    /// formats can do so here; the default does nothing. An error leaves the
    /// core uninitialized and it will call `prepare` again on the next read.
    fn prepare(&self, _fields: &[&str]) -> Result<()> {
        Ok(())
    }

    /// Evaluate `field` (e.g. `%album%`) against `track`.
    ///
    /// A field with no value evaluates to an empty string. Implementations
    /// should return [`BridgeError::NotAvailable`](crate::error::BridgeError::NotAvailable)
    /// when the track itself is no longer known to the host.
    fn eval_field(&self, field: &str, track: &TrackRef) -> Result<String>;

    /// Evaluate a field that does not depend on a track, such as
    /// `%playback_time%`, against the current playback context.
    fn eval_global(&self, field: &str) -> Result<String>;
}
