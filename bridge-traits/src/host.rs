//! Rendering host bridge.

use crate::platform::PlatformSendSync;

/// Capability implemented by the rendering layer.
///
/// The core calls [`request_repaint`](ViewHost::request_repaint) whenever the
/// data behind the panels changed. Implementations should only schedule a
/// repaint; reading the new views happens on the host's own paint pass.
pub trait ViewHost: PlatformSendSync {
    /// Ask the host to repaint the panels.
    fn request_repaint(&self);
}
