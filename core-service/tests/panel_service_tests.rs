//! Integration tests for the panel service
//!
//! These tests drive the service the way a host does, through the event
//! router and the selection entry points, and verify:
//! - Mode transitions and the track each mode resolves to
//! - Disc and album selection from the views
//! - Stale refresh rejection when refreshes overlap
//! - Repaint requests, events and the now-playing readout

use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{LibraryQuery, MetadataSource, NowPlayingProvider, TrackRef};
use core_library::testing::{InMemoryLibrary, RecordingViewHost, StaticNowPlaying, TrackFixture};
use core_runtime::config::{CoreConfig, CoreConfigBuilder};
use core_runtime::events::{AggregationEvent, CoreEvent, SelectionEvent};
use core_service::{CoreError, CoreService, SelectionMode};
use mockall::mock;
use std::sync::Arc;
use tokio::sync::Notify;

const ABBEY_1: &str = "/music/beatles/abbey/01.flac";
const ABBEY_2: &str = "/music/beatles/abbey/02.flac";
const WHITE_1_1: &str = "/music/beatles/white/1-01.flac";
const WHITE_1_2: &str = "/music/beatles/white/1-02.flac";
const WHITE_2_1: &str = "/music/beatles/white/2-01.flac";
const WHITE_2_3: &str = "/music/beatles/white/2-03.flac";
const HELP_1: &str = "/music/beatles/help/01.flac";

fn beatles_library() -> Arc<InMemoryLibrary> {
    let tracks = vec![
        // Listed out of order so the sample track differs from the first track
        TrackFixture::new(ABBEY_2)
            .artist("Beatles")
            .album("Abbey Road")
            .title("Something")
            .date("1969")
            .disc("1")
            .track_no("2"),
        TrackFixture::new(ABBEY_1)
            .artist("Beatles")
            .album("Abbey Road")
            .title("Come Together")
            .date("1969-09-26")
            .disc("1")
            .track_no("1"),
        TrackFixture::new(WHITE_2_3)
            .artist("Beatles")
            .album("The White Album")
            .title("Helter Skelter")
            .date("1968")
            .disc("2")
            .track_no("3"),
        TrackFixture::new(WHITE_1_2)
            .artist("Beatles")
            .album("The White Album")
            .title("Dear Prudence")
            .date("1968")
            .disc("1")
            .track_no("2"),
        TrackFixture::new(WHITE_2_1)
            .artist("Beatles")
            .album("The White Album")
            .title("Birthday")
            .date("1968")
            .disc("2")
            .track_no("1"),
        TrackFixture::new(WHITE_1_1)
            .artist("Beatles")
            .album("The White Album")
            .title("Back in the U.S.S.R.")
            .date("1968")
            .disc("1")
            .track_no("1"),
        TrackFixture::new(HELP_1)
            .artist("Beatles")
            .album("Help!")
            .title("Help!")
            .date("1965"),
    ];
    Arc::new(InMemoryLibrary::with_tracks(tracks))
}

struct Harness {
    library: Arc<InMemoryLibrary>,
    player: Arc<StaticNowPlaying>,
    host: Arc<RecordingViewHost>,
    core: CoreService,
}

impl Harness {
    fn track(&self, path: &str) -> TrackRef {
        self.library.track(path).unwrap()
    }
}

fn builder(
    library: &Arc<InMemoryLibrary>,
    player: &Arc<StaticNowPlaying>,
    host: &Arc<RecordingViewHost>,
) -> CoreConfigBuilder {
    CoreConfig::builder()
        .library(library.clone())
        .metadata(library.clone())
        .now_playing(player.clone())
        .view_host(host.clone())
}

fn harness_with(configure: impl FnOnce(CoreConfigBuilder) -> CoreConfigBuilder) -> Harness {
    let library = beatles_library();
    let player = Arc::new(StaticNowPlaying::new(None));
    let host = Arc::new(RecordingViewHost::default());
    let config = configure(builder(&library, &player, &host)).build().unwrap();

    Harness {
        library,
        player,
        host,
        core: CoreService::new(config).unwrap(),
    }
}

fn harness() -> Harness {
    harness_with(|builder| builder)
}

fn titles(entries: &[core_library::AlbumTrackEntry]) -> Vec<&str> {
    entries.iter().map(|entry| entry.title.as_str()).collect()
}

// ----------------------------------------------------------------------------
// Track resolution
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_no_resolvable_track_clears_everything() {
    let h = harness();
    let panel = h.core.panel();

    assert!(!panel.refresh_all_data().await);
    assert_eq!(h.player.calls(), 1);
    assert!(panel.get_track_info().is_none());
    assert!(panel.get_disc_tracks().is_empty());
    assert!(panel.get_disc_list().is_empty());
    assert!(panel.get_artist_albums().is_empty());
    assert_eq!(h.library.query_count(), 0);
}

#[tokio::test]
async fn test_views_before_any_refresh() {
    let h = harness();
    let panel = h.core.panel();

    assert_eq!(panel.current_mode(), SelectionMode::Playing);
    assert_eq!(panel.selected_disc_number(), 1);
    assert!(panel.current_track_info().is_none());
    assert!(panel.get_disc_tracks().is_empty());
    assert_eq!(panel.projector().sequence(), 0);
}

#[tokio::test]
async fn test_falls_back_to_now_playing_host() {
    let h = harness();
    h.player.set(Some(h.track(ABBEY_1)));

    assert!(h.core.panel().refresh_all_data().await);
    let info = h.core.panel().get_track_info().unwrap();
    assert_eq!(info.title, "Come Together");
    assert_eq!(info.artist, "Beatles");
    assert_eq!(info.year, "1969-09-26");
}

mock! {
    Player {}

    #[async_trait::async_trait]
    impl NowPlayingProvider for Player {
        async fn now_playing(&self) -> BridgeResult<Option<TrackRef>>;
    }
}

#[tokio::test]
async fn test_now_playing_failure_reads_as_no_track() {
    let library = beatles_library();
    let mut player = MockPlayer::new();
    player
        .expect_now_playing()
        .times(1)
        .returning(|| Err(BridgeError::NotAvailable("player not running".to_string())));

    let config = CoreConfig::builder()
        .library(library.clone())
        .metadata(library.clone())
        .now_playing(Arc::new(player))
        .build()
        .unwrap();
    let core = CoreService::new(config).unwrap();

    assert!(core.panel().current_track().await.is_none());
}

// ----------------------------------------------------------------------------
// Playing mode
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_playing_mode_follows_track_changes() {
    let h = harness();
    let router = h.core.router();

    assert!(router.on_track_change(Some(h.track(WHITE_1_2))).await);

    let panel = h.core.panel();
    assert_eq!(panel.get_track_info().unwrap().title, "Dear Prudence");
    assert_eq!(
        titles(&panel.projector().album_tracks().to_vec()),
        vec!["Back in the U.S.S.R.", "Dear Prudence", "Birthday", "Helter Skelter"]
    );
    assert_eq!(
        titles(&panel.get_disc_tracks()),
        vec!["Back in the U.S.S.R.", "Dear Prudence"]
    );

    let discs = panel.get_disc_list();
    assert_eq!(discs.len(), 2);
    assert_eq!(discs[1].disc_number, 2);
    let grouped: usize = discs.iter().map(|group| group.tracks.len()).sum();
    assert_eq!(grouped, panel.projector().album_tracks().len());

    let albums: Vec<_> = panel
        .get_artist_albums()
        .into_iter()
        .map(|entry| entry.album)
        .collect();
    assert_eq!(albums, vec!["Help!", "The White Album", "Abbey Road"]);

    assert!(router.on_track_change(Some(h.track(HELP_1))).await);
    assert_eq!(panel.get_track_info().unwrap().title, "Help!");
}

#[tokio::test]
async fn test_refresh_issues_two_queries() {
    let h = harness();
    h.core.router().on_track_change(Some(h.track(ABBEY_1))).await;

    let mut queries = h.library.queries();
    queries.sort();
    assert_eq!(
        queries,
        vec![
            r#"%artist% IS "Beatles""#.to_string(),
            r#"%artist% IS "Beatles" AND %album% IS "Abbey Road""#.to_string(),
        ]
    );
}

#[tokio::test]
async fn test_disc_list_is_stable_between_refreshes() {
    let h = harness();
    h.core.router().on_track_change(Some(h.track(WHITE_1_1))).await;

    let panel = h.core.panel();
    assert_eq!(panel.get_disc_list(), panel.get_disc_list());
    assert_eq!(panel.get_artist_albums(), panel.get_artist_albums());
}

#[tokio::test]
async fn test_now_playing_readout() {
    let h = harness();
    h.library.set_playback_time("1:23");

    h.core.router().on_track_change(Some(h.track(ABBEY_2))).await;
    let readout = h.core.panel().now_playing_info();
    assert_eq!(readout.info.title, "Something");
    assert_eq!(readout.playback_time, "1:23");

    h.core.router().on_track_change(None).await;
    let readout = h.core.panel().now_playing_info();
    assert_eq!(readout.info.title, "Untitled");
    assert_eq!(readout.playback_time, "0:00");
}

// ----------------------------------------------------------------------------
// Selection
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_select_track_pins_selection() {
    let h = harness();
    let panel = h.core.panel();
    h.core.router().on_track_change(Some(h.track(HELP_1))).await;

    assert!(panel.select_track(Some(h.track(ABBEY_2))).await);
    assert_eq!(panel.current_mode(), SelectionMode::Selected);
    assert_eq!(panel.current_track().await, Some(h.track(ABBEY_2)));

    // Selected mode keeps the pinned track on screen
    assert!(!h.core.router().on_track_change(Some(h.track(WHITE_1_1))).await);
    assert_eq!(panel.get_track_info().unwrap().title, "Something");
    assert_eq!(
        panel.now_playing_info().info.title,
        "Back in the U.S.S.R."
    );

    let resolved = panel.snap_to_playing().await;
    assert_eq!(resolved, Some(h.track(WHITE_1_1)));
    assert_eq!(panel.current_mode(), SelectionMode::Playing);
    assert_eq!(panel.get_track_info().unwrap().title, "Back in the U.S.S.R.");
}

#[tokio::test]
async fn test_select_none_changes_nothing() {
    let h = harness();
    let panel = h.core.panel();
    panel.select_track(Some(h.track(ABBEY_1))).await;
    panel.snap_to_playing().await;
    let queries = h.library.query_count();

    assert!(!panel.select_track(None).await);
    assert_eq!(panel.current_mode(), SelectionMode::Playing);
    assert_eq!(h.library.query_count(), queries);

    // The earlier selection is still there to switch back to
    assert!(panel.set_mode(SelectionMode::Selected).await.is_ok());
    assert_eq!(panel.current_track().await, Some(h.track(ABBEY_1)));
}

#[tokio::test]
async fn test_selected_mode_requires_a_selection() {
    let h = harness();
    let panel = h.core.panel();
    let mut events = h.core.subscribe();

    let result = panel.set_mode(SelectionMode::Selected).await;
    assert!(matches!(result, Err(CoreError::InvalidTransition { .. })));
    assert_eq!(panel.current_mode(), SelectionMode::Playing);
    assert_eq!(h.library.query_count(), 0);

    assert!(matches!(
        events.drain().as_slice(),
        [CoreEvent::Selection(SelectionEvent::InvalidTransition { .. })]
    ));
}

#[tokio::test]
async fn test_mode_by_name() {
    let h = harness();
    let panel = h.core.panel();
    panel.select_track(Some(h.track(ABBEY_1))).await;

    for invalid in ["", "paused", "play ing"] {
        let result = panel.set_mode_named(invalid).await;
        match result {
            Err(CoreError::InvalidTransition { requested, .. }) => assert_eq!(requested, invalid),
            other => panic!("expected InvalidTransition, got {:?}", other),
        }
        assert_eq!(panel.current_mode(), SelectionMode::Selected);
    }

    assert!(panel.set_mode_named("Playing").await.is_ok());
    assert_eq!(panel.current_mode(), SelectionMode::Playing);
    assert!(panel.set_mode_named(" SELECTED ").await.is_ok());
    assert_eq!(panel.current_mode(), SelectionMode::Selected);
}

// ----------------------------------------------------------------------------
// Disc and album selection
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_disc_selection_selects_first_track_of_disc() {
    let h = harness();
    let panel = h.core.panel();
    h.core.router().on_track_change(Some(h.track(WHITE_1_2))).await;

    assert!(h.core.router().on_disc_selected(2).await);

    assert_eq!(panel.current_mode(), SelectionMode::Selected);
    assert_eq!(panel.selected_disc_number(), 2);
    assert_eq!(panel.current_track().await, Some(h.track(WHITE_2_1)));
    assert_eq!(
        titles(&panel.get_disc_tracks()),
        vec!["Birthday", "Helter Skelter"]
    );
    assert_eq!(panel.get_track_info().unwrap().title, "Birthday");
}

#[tokio::test]
async fn test_selecting_missing_disc() {
    let h = harness();
    let panel = h.core.panel();
    h.core.router().on_track_change(Some(h.track(ABBEY_1))).await;

    assert!(!h.core.router().on_disc_selected(4).await);
    assert_eq!(panel.selected_disc_number(), 4);
    assert_eq!(panel.current_mode(), SelectionMode::Playing);
    assert!(panel.get_disc_tracks().is_empty());
}

#[tokio::test]
async fn test_album_selection_jumps_to_first_track() {
    let h = harness();
    let panel = h.core.panel();
    h.core.router().on_track_change(Some(h.track(WHITE_1_1))).await;
    h.core.router().on_disc_selected(2).await;

    let abbey = panel
        .get_artist_albums()
        .into_iter()
        .find(|entry| entry.album == "Abbey Road")
        .unwrap();
    assert_eq!(abbey.sample_track, h.track(ABBEY_2));

    h.library.clear_queries();
    assert!(h.core.router().on_album_selected(&abbey).await);

    // One lookup plus the two refresh queries
    assert_eq!(h.library.query_count(), 3);
    assert_eq!(panel.current_track().await, Some(h.track(ABBEY_1)));
    assert_eq!(panel.selected_disc_number(), 1);
    assert_eq!(
        titles(&panel.get_disc_tracks()),
        vec!["Come Together", "Something"]
    );
}

#[tokio::test]
async fn test_album_selection_falls_back_to_sample_track() {
    let h = harness();
    let panel = h.core.panel();
    h.core.router().on_track_change(Some(h.track(HELP_1))).await;

    let abbey = panel
        .get_artist_albums()
        .into_iter()
        .find(|entry| entry.album == "Abbey Road")
        .unwrap();

    h.library.fail_queries_containing("Abbey Road");
    let mut events = h.core.subscribe();
    h.core.router().on_album_selected(&abbey).await;

    assert_eq!(panel.current_track().await, Some(abbey.sample_track.clone()));
    assert_eq!(panel.get_track_info().unwrap().album, "Abbey Road");
    assert!(panel.projector().album_tracks().is_empty());
    assert_eq!(panel.get_artist_albums().len(), 3);

    let failures: Vec<_> = events
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Aggregation(AggregationEvent::QueryFailed { step, .. }) => Some(step),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec!["album_tracks".to_string()]);
}

// ----------------------------------------------------------------------------
// Concurrency
// ----------------------------------------------------------------------------

/// Holds queries mentioning `gated` until the gate opens.
struct GatedLibrary {
    inner: Arc<InMemoryLibrary>,
    gate: Arc<Notify>,
    gated: String,
}

#[async_trait::async_trait]
impl LibraryQuery for GatedLibrary {
    async fn query_tracks(&self, filter: &str) -> BridgeResult<Vec<TrackRef>> {
        if filter.contains(self.gated.as_str()) {
            self.gate.notified().await;
        }
        self.inner.query_tracks(filter).await
    }
}

#[tokio::test]
async fn test_late_refresh_does_not_overwrite_newer_one() {
    let library = beatles_library();
    let gate = Arc::new(Notify::new());
    let gated = Arc::new(GatedLibrary {
        inner: library.clone(),
        gate: gate.clone(),
        gated: "The White Album".to_string(),
    });

    let config = CoreConfig::builder()
        .library(gated)
        .metadata(library.clone())
        .now_playing(Arc::new(StaticNowPlaying::new(None)))
        .build()
        .unwrap();
    let core = CoreService::new(config).unwrap();
    let panel = core.panel();
    let mut events = core.subscribe();

    let white = library.track(WHITE_1_1).unwrap();
    let help = library.track(HELP_1).unwrap();

    let slow = panel.select_track(Some(white));
    let fast = async {
        let shown = panel.select_track(Some(help)).await;
        gate.notify_one();
        shown
    };
    let (slow_shown, fast_shown) = tokio::join!(slow, fast);

    assert!(!slow_shown);
    assert!(fast_shown);
    assert_eq!(panel.get_track_info().unwrap().title, "Help!");
    assert_eq!(panel.projector().sequence(), 2);

    let superseded: Vec<_> = events
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Aggregation(AggregationEvent::RefreshSuperseded {
                sequence,
                published_sequence,
            }) => Some((sequence, published_sequence)),
            _ => None,
        })
        .collect();
    assert_eq!(superseded, vec![(1, 2)]);
}

#[tokio::test]
async fn test_projector_keeps_its_snapshot() {
    let h = harness();
    h.core.router().on_track_change(Some(h.track(ABBEY_1))).await;

    let before = h.core.panel().projector();
    h.core.router().on_track_change(Some(h.track(HELP_1))).await;

    assert_eq!(before.track_info().unwrap().title, "Come Together");
    assert_eq!(before.album_tracks().len(), 2);
    assert_eq!(h.core.panel().get_track_info().unwrap().title, "Help!");
    assert!(h.core.panel().projector().sequence() > before.sequence());
}

// ----------------------------------------------------------------------------
// Host notifications
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_repaint_requests() {
    let h = harness();
    let router = h.core.router();

    router.on_track_change(Some(h.track(WHITE_1_1))).await;
    assert_eq!(h.host.repaints(), 1);

    // Disc change repaints, then the selection refresh publishes
    router.on_disc_selected(2).await;
    assert_eq!(h.host.repaints(), 3);

    h.core.panel().snap_to_playing().await;
    assert_eq!(h.host.repaints(), 4);

    // Selected mode: no refresh, but the readout changed
    h.core.panel().select_track(Some(h.track(HELP_1))).await;
    let before = h.host.repaints();
    let before_queries = h.library.query_count();
    assert!(!router.on_track_change(Some(h.track(ABBEY_2))).await);
    assert_eq!(h.host.repaints(), before + 1);
    assert_eq!(h.library.query_count(), before_queries);
    assert_eq!(h.core.panel().now_playing_info().info.title, "Something");
}

#[tokio::test]
async fn test_album_selection_repaints_once() {
    let h = harness();
    let panel = h.core.panel();
    h.core.router().on_track_change(Some(h.track(WHITE_1_1))).await;
    h.core.router().on_disc_selected(2).await;

    let abbey = panel
        .get_artist_albums()
        .into_iter()
        .find(|entry| entry.album == "Abbey Road")
        .unwrap();

    let mut events = h.core.subscribe();
    let before = h.host.repaints();
    assert!(h.core.router().on_album_selected(&abbey).await);

    assert_eq!(h.host.repaints(), before + 1);
    assert_eq!(panel.selected_disc_number(), 1);
    assert!(events
        .drain()
        .contains(&CoreEvent::Selection(SelectionEvent::DiscSelected {
            disc_number: 1
        })));
}

#[tokio::test]
async fn test_selection_events() {
    let h = harness();
    let mut events = h.core.subscribe();
    let track = h.track(ABBEY_1);

    h.core.panel().select_track(Some(track.clone())).await;

    let received = events.drain();
    assert_eq!(received.len(), 3);
    assert_eq!(
        received[0],
        CoreEvent::Selection(SelectionEvent::TrackSelected {
            track: track.clone()
        })
    );
    assert_eq!(
        received[1],
        CoreEvent::Selection(SelectionEvent::ModeChanged {
            previous: "playing".to_string(),
            mode: "selected".to_string(),
        })
    );
    assert!(matches!(
        received[2],
        CoreEvent::Aggregation(AggregationEvent::SnapshotPublished {
            sequence: 1,
            has_track: true,
            album_tracks: 2,
            artist_albums: 3,
            discs: 1,
        })
    ));

    let json = serde_json::to_value(&received[1]).unwrap();
    assert_eq!(json["type"], "Selection");
    assert_eq!(json["payload"]["event"], "ModeChanged");
    assert_eq!(json["payload"]["mode"], "selected");
}

// ----------------------------------------------------------------------------
// Startup
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_start_loads_playing_track() {
    let h = harness();
    h.player.set(Some(h.track(ABBEY_1)));

    assert!(h.core.start().await.unwrap());
    assert!(h.core.panel().reader().is_initialized());
    assert_eq!(h.core.panel().get_track_info().unwrap().title, "Come Together");
}

#[tokio::test]
async fn test_start_without_refresh() {
    let h = harness_with(|builder| builder.refresh_on_start(false));
    h.player.set(Some(h.track(ABBEY_1)));

    assert!(!h.core.start().await.unwrap());
    assert!(h.core.panel().reader().is_initialized());
    assert_eq!(h.library.query_count(), 0);
    assert_eq!(h.player.calls(), 0);
}

struct UnpreparedMetadata;

impl MetadataSource for UnpreparedMetadata {
    fn prepare(&self, _fields: &[&str]) -> BridgeResult<()> {
        Err(BridgeError::NotAvailable("title formatting not loaded".to_string()))
    }

    fn eval_field(&self, _field: &str, _track: &TrackRef) -> BridgeResult<String> {
        Err(BridgeError::NotAvailable("title formatting not loaded".to_string()))
    }

    fn eval_global(&self, _field: &str) -> BridgeResult<String> {
        Err(BridgeError::NotAvailable("title formatting not loaded".to_string()))
    }
}

#[tokio::test]
async fn test_start_reports_unprepared_metadata() {
    let library = beatles_library();
    let config = CoreConfig::builder()
        .library(library.clone())
        .metadata(Arc::new(UnpreparedMetadata))
        .now_playing(Arc::new(StaticNowPlaying::new(None)))
        .build()
        .unwrap();
    let core = CoreService::new(config).unwrap();

    assert!(matches!(
        core.start().await,
        Err(CoreError::InitializationFailed(_))
    ));
    assert!(!core.panel().reader().is_initialized());
}

#[test]
fn test_new_rejects_invalid_options() {
    let library = beatles_library();
    let mut config = CoreConfig::builder()
        .library(library.clone())
        .metadata(library)
        .now_playing(Arc::new(StaticNowPlaying::new(None)))
        .build()
        .unwrap();
    config.options.event_buffer_size = 0;

    assert!(matches!(
        CoreService::new(config),
        Err(CoreError::Runtime(_))
    ));
}
