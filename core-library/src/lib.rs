//! # Panel Data Library
//!
//! Reads track metadata and aggregates the library data behind the track,
//! disc and discography panels.
//!
//! ## Overview
//!
//! This module provides:
//! - [`MetadataReader`](metadata::MetadataReader) - normalized tag reads with safe defaults
//! - [`FilterExpression`](query::FilterExpression) - building and parsing host filter expressions
//! - [`Aggregator`](aggregator::Aggregator) - the two-query refresh pipeline
//! - [`AggregationSnapshot`](snapshot::AggregationSnapshot) - the immutable result of one refresh
//! - [`ViewProjector`](projector::ViewProjector) - the four panel views over a snapshot
//!
//! Selection state and publication of snapshots live in `core-service`.

pub mod aggregator;
pub mod error;
pub mod metadata;
pub mod models;
pub mod projector;
pub mod query;
pub mod snapshot;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use aggregator::{Aggregator, RefreshOutcome, RefreshStep, StepFailure};
pub use error::{LibraryError, Result};
pub use metadata::{MetadataField, MetadataReader};
pub use models::{
    AlbumTrackEntry, ArtistAlbumEntry, CurrentTrackInfo, DiscGroup, NowPlayingInfo, TrackInfo,
};
pub use projector::ViewProjector;
pub use query::FilterExpression;
pub use snapshot::AggregationSnapshot;
