//! Library query bridge.
//!
//! The host owns the media library. The core never enumerates it directly; it
//! asks the host for the tracks matching a filter expression and receives
//! opaque [`TrackRef`] handles back. Handles are later passed to the
//! [`MetadataSource`](crate::metadata::MetadataSource) to read tag values.

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to one track in the host library.
///
/// Identity is the file location plus the sub-song index (cue sheets and
/// multi-track containers expose several tracks behind one path). The core
/// compares and clones handles but never interprets the location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRef {
    path: String,
    subsong: u32,
}

impl TrackRef {
    /// Create a handle for the first (or only) track stored at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            subsong: 0,
        }
    }

    /// Create a handle for a specific sub-song stored at `path`.
    pub fn with_subsong(path: impl Into<String>, subsong: u32) -> Self {
        Self {
            path: path.into(),
            subsong,
        }
    }

    /// Stable location string of the track.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sub-song index within the location.
    pub fn subsong(&self) -> u32 {
        self.subsong
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subsong == 0 {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}#{}", self.path, self.subsong)
        }
    }
}

/// Library query capability.
///
/// Filter expressions use the small boolean language of the host library:
/// `FIELD IS "value"` clauses joined with `AND`, where `FIELD` is a title
/// format reference such as `%artist%`. Quoting and escaping are produced by
/// the core; implementations only need to evaluate them.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::library::{LibraryQuery, TrackRef};
///
/// async fn count_album(library: &dyn LibraryQuery) -> usize {
///     library
///         .query_tracks(r#"%artist% IS "Beatles" AND %album% IS "Abbey Road""#)
///         .await
///         .map(|tracks| tracks.len())
///         .unwrap_or(0)
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait LibraryQuery: PlatformSendSync {
    /// Return every library track matching `filter`, in library order.
    ///
    /// An empty result is not an error. Implementations should return
    /// [`BridgeError::Query`](crate::error::BridgeError::Query) when the
    /// expression cannot be evaluated.
    async fn query_tracks(&self, filter: &str) -> Result<Vec<TrackRef>>;
}
