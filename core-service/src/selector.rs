//! Track selection state machine.
//!
//! The panels follow either the track the player is playing or a track the
//! user pinned. [`TrackSelector`] holds that choice and both track handles;
//! it never performs I/O. Callers act on the [`Transition`] it returns.

use crate::error::CoreError;
use bridge_traits::library::TrackRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which track the panels follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Follow the track the player reports.
    #[default]
    Playing,
    /// Follow the track the user selected.
    Selected,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Playing => "playing",
            SelectionMode::Selected => "selected",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "playing" => Ok(SelectionMode::Playing),
            "selected" => Ok(SelectionMode::Selected),
            _ => Err(CoreError::InvalidTransition {
                requested: s.to_string(),
                reason: "unknown selection mode".to_string(),
            }),
        }
    }
}

/// Effect of a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// State changed (or was re-asserted); the snapshot must be rebuilt.
    Refresh { previous: SelectionMode },
    /// State changed but the visible data did not.
    Quiet,
    /// Nothing changed.
    Rejected { reason: &'static str },
}

impl Transition {
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Transition::Refresh { .. })
    }
}

/// How the current track resolves without I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Track(TrackRef),
    /// No cached handle; ask the host what is playing.
    AskNowPlaying,
}

/// Selection state: mode plus the playing and selected track handles.
///
/// Invariant: in [`SelectionMode::Selected`] a selected track is present.
#[derive(Debug, Clone, Default)]
pub struct TrackSelector {
    mode: SelectionMode,
    playing: Option<TrackRef>,
    selected: Option<TrackRef>,
}

impl TrackSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn playing_track(&self) -> Option<&TrackRef> {
        self.playing.as_ref()
    }

    pub fn selected_track(&self) -> Option<&TrackRef> {
        self.selected.as_ref()
    }

    /// Switch mode. Always refreshes on success, even when the mode is
    /// unchanged.
    pub fn set_mode(&mut self, mode: SelectionMode) -> Transition {
        if mode == SelectionMode::Selected && self.selected.is_none() {
            return Transition::Rejected {
                reason: "no track has been selected",
            };
        }

        let previous = self.mode;
        self.mode = mode;
        Transition::Refresh { previous }
    }

    /// Pin `track` and switch to selected mode. `None` is rejected.
    pub fn select_track(&mut self, track: Option<TrackRef>) -> Transition {
        let Some(track) = track else {
            return Transition::Rejected {
                reason: "no track given",
            };
        };

        let previous = self.mode;
        self.selected = Some(track);
        self.mode = SelectionMode::Selected;
        Transition::Refresh { previous }
    }

    /// Return to following the player.
    pub fn snap_to_playing(&mut self) -> Transition {
        let previous = self.mode;
        self.mode = SelectionMode::Playing;
        Transition::Refresh { previous }
    }

    /// Record the player's new track.
    ///
    /// Only refreshes in playing mode; a pinned selection stays on screen
    /// until the user snaps back.
    pub fn on_track_change(&mut self, track: Option<TrackRef>) -> Transition {
        self.playing = track;
        match self.mode {
            SelectionMode::Playing => Transition::Refresh {
                previous: SelectionMode::Playing,
            },
            SelectionMode::Selected => Transition::Quiet,
        }
    }

    /// Resolve the current track from cached handles.
    pub fn resolve(&self) -> Resolution {
        let pinned = match self.mode {
            SelectionMode::Selected => self.selected.as_ref(),
            SelectionMode::Playing => None,
        };

        match pinned.or(self.playing.as_ref()) {
            Some(track) => Resolution::Track(track.clone()),
            None => Resolution::AskNowPlaying,
        }
    }
}
