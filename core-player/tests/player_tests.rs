//! End-to-end player scenarios against the simulated engine.
//!
//! These tests exercise the full stack: queue mutations, native staging,
//! signal normalization, progress polling, and failure recovery, with
//! `bridge-sim` standing in for the platform engine.

use bridge_sim::{SimEngine, SimResolver};
use core_player::{MediaItem, MediaPlayer, PlaybackStatus};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{PlaybackEvent, PlayerEvent, QueueEvent, Receiver, VolumeEvent};
use std::sync::Arc;
use std::time::Duration;

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

async fn make_player(engine: Arc<SimEngine>) -> MediaPlayer {
    let config = PlayerConfig::builder()
        .engine(engine)
        .resolver(Arc::new(SimResolver::new()))
        .progress_interval(Duration::from_millis(20))
        .seek_timeout(Duration::from_millis(200))
        .build()
        .expect("valid config");
    MediaPlayer::new(config).await
}

fn three_tracks() -> Vec<MediaItem> {
    vec![
        MediaItem::remote("https://example.com/a.mp3"),
        MediaItem::remote("https://example.com/b.mp3"),
        MediaItem::remote("https://example.com/c.mp3"),
    ]
}

async fn next_event(rx: &mut Receiver<PlayerEvent>) -> PlayerEvent {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream closed")
}

/// Consume events until the expected status is observed, returning every
/// status seen on the way (including the expected one).
async fn wait_for_status(
    rx: &mut Receiver<PlayerEvent>,
    expected: PlaybackStatus,
) -> Vec<PlaybackStatus> {
    let mut seen = Vec::new();
    loop {
        if let PlayerEvent::Playback(PlaybackEvent::StatusChanged { status }) =
            next_event(rx).await
        {
            seen.push(status);
            if status == expected {
                return seen;
            }
        }
    }
}

// ----------------------------------------------------------------------
// Scenario A: play from the middle of the queue
// ----------------------------------------------------------------------

#[tokio::test]
async fn play_mid_queue_rebuilds_from_target_and_reports_progress() {
    let engine = Arc::new(SimEngine::with_default_duration(Duration::from_secs(60)));
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[1]).await;

    let statuses = wait_for_status(&mut rx, PlaybackStatus::Playing).await;
    assert_eq!(
        statuses,
        vec![
            PlaybackStatus::Loading,
            PlaybackStatus::Buffering,
            PlaybackStatus::Playing
        ]
    );

    // the native queue holds the target through the end of the logical queue
    assert_eq!(
        engine.staged_locators(),
        vec![
            "https://example.com/b.mp3".to_string(),
            "https://example.com/c.mp3".to_string()
        ]
    );

    // progress events arrive with increasing positions; each round advances
    // simulated time, waits for a fresh sample, and keeps the newest one
    let mut positions = Vec::new();
    for _ in 0..4 {
        engine.tick(Duration::from_millis(500));
        tokio::time::sleep(Duration::from_millis(60)).await;
        let mut latest = None;
        while let Ok(event) = rx.try_recv() {
            if let PlayerEvent::Playback(PlaybackEvent::PlayingChanged {
                position, fraction, ..
            }) = event
            {
                assert!((0.0..=1.0).contains(&fraction));
                latest = Some(position);
            }
        }
        if let Some(position) = latest {
            positions.push(position);
        }
    }
    assert!(positions.len() >= 2);
    assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    assert!(positions.last().unwrap() > positions.first().unwrap());
}

// ----------------------------------------------------------------------
// Scenario B: resume in place without re-resolving
// ----------------------------------------------------------------------

#[tokio::test]
async fn resume_after_pause_reuses_handles() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    let resolved_after_play = engine.live_items();
    let rebuilds_after_play = engine
        .call_log()
        .iter()
        .filter(|c| c.starts_with("replace_queue"))
        .count();

    player.pause().await;
    wait_for_status(&mut rx, PlaybackStatus::Paused).await;

    player.play().await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    // no new native items, no rebuild: a plain resume
    assert_eq!(engine.live_items(), resolved_after_play);
    let rebuilds_after_resume = engine
        .call_log()
        .iter()
        .filter(|c| c.starts_with("replace_queue"))
        .count();
    assert_eq!(rebuilds_after_resume, rebuilds_after_play);
}

#[tokio::test]
async fn play_item_while_paused_on_same_item_resumes() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;
    player.pause().await;
    wait_for_status(&mut rx, PlaybackStatus::Paused).await;

    let rebuilds_before = engine
        .call_log()
        .iter()
        .filter(|c| c.starts_with("replace_queue"))
        .count();

    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    let rebuilds_after = engine
        .call_log()
        .iter()
        .filter(|c| c.starts_with("replace_queue"))
        .count();
    assert_eq!(rebuilds_after, rebuilds_before);
}

// ----------------------------------------------------------------------
// Scenario C: failure recovery
// ----------------------------------------------------------------------

#[tokio::test]
async fn native_failure_emits_once_and_player_stays_usable() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    engine.fail_current("decode error");
    let statuses = wait_for_status(&mut rx, PlaybackStatus::Stopped).await;
    assert!(statuses.contains(&PlaybackStatus::Failed));

    // drain and count MediaFailed: exactly one
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut failures = 0;
    while let Ok(event) = rx.try_recv() {
        if let PlayerEvent::Playback(PlaybackEvent::MediaFailed { .. }) = event {
            failures += 1;
        }
    }
    assert_eq!(failures, 1);
    assert_eq!(player.status().await, PlaybackStatus::Stopped);

    // a new play succeeds after the failure
    player.play_item(&tracks[2]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;
    assert_eq!(
        engine.staged_locators(),
        vec!["https://example.com/c.mp3".to_string()]
    );
}

#[tokio::test]
async fn resolution_failure_reports_media_failed() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let bad = MediaItem::remote("ftp://example.com/a.mp3");
    player.add(bad.clone()).await;
    player.play_item(&bad).await;

    loop {
        match next_event(&mut rx).await {
            PlayerEvent::Playback(PlaybackEvent::MediaFailed { message, .. }) => {
                assert!(message.contains("ftp://example.com/a.mp3"));
                break;
            }
            _ => {}
        }
    }
    // the status was never left indeterminate and no native item leaked
    assert_eq!(player.status().await, PlaybackStatus::Stopped);
    assert_eq!(engine.live_items(), 0);
}

#[tokio::test]
async fn play_with_nothing_staged_settles_failed() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine).await;
    let mut rx = player.events();

    player.play().await;
    wait_for_status(&mut rx, PlaybackStatus::Failed).await;
}

// ----------------------------------------------------------------------
// Scenario D: seek pauses, resumes on completion, fails open on timeout
// ----------------------------------------------------------------------

#[tokio::test]
async fn seek_while_playing_pauses_then_resumes() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    let calls_before = engine.call_log().len();
    player.seek(Duration::from_secs(30)).await;

    let tail: Vec<String> = engine.call_log()[calls_before..].to_vec();
    assert_eq!(tail, vec!["pause", "seek 30000ms", "play"]);
    assert_eq!(player.position().await, Duration::from_secs(30));
    assert_eq!(player.status().await, PlaybackStatus::Playing);
}

#[tokio::test]
async fn seek_timeout_fails_open_and_resumes() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    engine.hang_seeks(true);
    let started = std::time::Instant::now();
    player.seek(Duration::from_secs(40)).await;
    // bounded by the configured 200ms timeout, not hanging forever
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(player.status().await, PlaybackStatus::Playing);
}

#[tokio::test]
async fn seek_while_paused_does_not_resume() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;
    player.pause().await;
    wait_for_status(&mut rx, PlaybackStatus::Paused).await;

    player.seek(Duration::from_secs(10)).await;
    assert_eq!(player.status().await, PlaybackStatus::Paused);
    assert_eq!(player.position().await, Duration::from_secs(10));
}

// ----------------------------------------------------------------------
// Scenario E: structural notifications and rebuild serialization
// ----------------------------------------------------------------------

#[tokio::test]
async fn individual_adds_emit_individual_notifications() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine).await;
    let mut rx = player.events();

    for track in three_tracks() {
        player.add(track).await;
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut adds = 0;
    while let Ok(event) = rx.try_recv() {
        if let PlayerEvent::Queue(QueueEvent::ItemsAdded { .. }) = event {
            adds += 1;
        }
    }
    assert_eq!(adds, 3);
}

#[tokio::test]
async fn add_range_emits_one_notification() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine).await;
    let mut rx = player.events();

    player.add_range(three_tracks()).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut adds = 0;
    while let Ok(event) = rx.try_recv() {
        if let PlayerEvent::Queue(QueueEvent::ItemsAdded { ids }) = event {
            assert_eq!(ids.len(), 3);
            adds += 1;
        }
    }
    assert_eq!(adds, 1);
}

#[tokio::test]
async fn concurrent_add_and_play_serialize_consistently() {
    let engine = Arc::new(SimEngine::new());
    let player = Arc::new(make_player(engine.clone()).await);
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;

    let extra = MediaItem::remote("https://example.com/d.mp3");
    let p1 = player.clone();
    let target = tracks[1].clone();
    let play = tokio::spawn(async move { p1.play_item(&target).await });
    let p2 = player.clone();
    let extra2 = extra.clone();
    let add = tokio::spawn(async move { p2.add(extra2).await });

    play.await.unwrap();
    add.await.unwrap();
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    // whichever side won the lock, the staged queue ends up [b, c, d]
    assert_eq!(
        engine.staged_locators(),
        vec![
            "https://example.com/b.mp3".to_string(),
            "https://example.com/c.mp3".to_string(),
            "https://example.com/d.mp3".to_string()
        ]
    );
}

// ----------------------------------------------------------------------
// Natural end and traversal
// ----------------------------------------------------------------------

#[tokio::test]
async fn natural_end_advances_then_settles_stopped() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = vec![
        MediaItem::remote("https://example.com/a.mp3"),
        MediaItem::remote("https://example.com/b.mp3"),
    ];
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    engine.complete_current();
    loop {
        match next_event(&mut rx).await {
            PlayerEvent::Playback(PlaybackEvent::MediaFinished { item_id }) => {
                assert_eq!(item_id, *tracks[0].id().as_uuid());
                break;
            }
            _ => continue,
        }
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(player.current().await.unwrap().id(), tracks[1].id());
    assert_eq!(player.status().await, PlaybackStatus::Playing);

    engine.complete_current();
    wait_for_status(&mut rx, PlaybackStatus::Stopped).await;
    assert!(player.current().await.is_none());
}

#[tokio::test]
async fn play_next_uses_cheap_advance() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    player.play_next().await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    assert!(engine.call_log().contains(&"advance".to_string()));
    assert_eq!(player.current().await.unwrap().id(), tracks[1].id());
    // exactly one rebuild: the initial play
    let rebuilds = engine
        .call_log()
        .iter()
        .filter(|c| c.starts_with("replace_queue"))
        .count();
    assert_eq!(rebuilds, 1);
}

#[tokio::test]
async fn play_previous_rebuilds() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[1]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    player.play_previous().await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    assert_eq!(player.current().await.unwrap().id(), tracks[0].id());
    // backwards jumps cannot advance; the native queue was rebuilt from a
    assert_eq!(
        engine.staged_locators(),
        vec![
            "https://example.com/a.mp3".to_string(),
            "https://example.com/b.mp3".to_string(),
            "https://example.com/c.mp3".to_string()
        ]
    );
}

// ----------------------------------------------------------------------
// Volume and lifecycle
// ----------------------------------------------------------------------

#[tokio::test]
async fn play_queue_replaces_content_and_starts_at_index() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    player.add_range(three_tracks()).await;

    let fresh = vec![
        MediaItem::remote("https://example.com/x.mp3"),
        MediaItem::remote("https://example.com/y.mp3"),
    ];
    player.play_queue(fresh.clone(), 1).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;

    let stored: Vec<_> = player.queue_items().await.iter().map(|i| i.id()).collect();
    assert_eq!(stored, fresh.iter().map(|i| i.id()).collect::<Vec<_>>());
    assert_eq!(
        engine.staged_locators(),
        vec!["https://example.com/y.mp3".to_string()]
    );
    assert_eq!(player.current().await.unwrap().id(), fresh[1].id());
}

#[tokio::test]
async fn removing_the_playing_item_stops_and_releases_it() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;
    assert_eq!(engine.live_items(), 3);

    player.remove_at(0).await;

    assert_eq!(player.status().await, PlaybackStatus::Stopped);
    assert_eq!(engine.live_items(), 2);
    assert!(player.current().await.is_none());
    assert_eq!(player.queue_items().await.len(), 2);
}

#[tokio::test]
async fn volume_changes_flow_through_player_events() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine).await;
    let mut rx = player.events();

    player.volume().set_volume(30).await.unwrap();
    player.volume().set_muted(true).await.unwrap();

    let mut changes = Vec::new();
    for _ in 0..2 {
        if let PlayerEvent::Volume(VolumeEvent::Changed { level, muted }) =
            next_event(&mut rx).await
        {
            changes.push((level, muted));
        }
    }
    assert_eq!(changes, vec![(30, false), (30, true)]);
}

#[tokio::test]
async fn clearing_releases_every_native_handle() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine.clone()).await;
    let mut rx = player.events();

    let tracks = three_tracks();
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[0]).await;
    wait_for_status(&mut rx, PlaybackStatus::Playing).await;
    assert_eq!(engine.live_items(), 3);

    player.clear().await;
    assert_eq!(engine.live_items(), 0);
    assert!(player.queue_items().await.is_empty());
    assert_eq!(player.status().await, PlaybackStatus::Stopped);
}

#[tokio::test]
async fn shuffle_round_trip_preserves_storage_order() {
    let engine = Arc::new(SimEngine::new());
    let player = make_player(engine).await;

    let tracks = three_tracks();
    let ids: Vec<_> = tracks.iter().map(|t| t.id()).collect();
    player.add_range(tracks).await;

    player.set_shuffled(true).await;
    assert!(player.is_shuffled().await);
    player.set_shuffled(false).await;

    let stored: Vec<_> = player.queue_items().await.iter().map(|i| i.id()).collect();
    assert_eq!(stored, ids);
}
