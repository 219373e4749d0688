//! # Media Player Usage Example
//!
//! Demonstrates the full player flow against the simulated engine: queueing
//! items, starting playback mid-queue, observing normalized events, seeking,
//! and letting items run to their natural end.
//!
//! Run with: `cargo run --example player_demo --package core-player`

use bridge_sim::{SimEngine, SimResolver};
use core_player::{MediaItem, MediaMetadata, MediaPlayer};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{PlaybackEvent, PlayerEvent};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_directives("core_player=debug,info"),
    )
    .expect("logging init");

    let engine = Arc::new(SimEngine::with_default_duration(Duration::from_secs(3)));
    let config = PlayerConfig::builder()
        .engine(engine.clone())
        .resolver(Arc::new(SimResolver::new()))
        .progress_interval(Duration::from_millis(250))
        .build()
        .expect("config");

    let player = MediaPlayer::new(config).await;
    let mut events = player.events();

    // Print every player event as it arrives
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                PlayerEvent::Playback(PlaybackEvent::PlayingChanged {
                    fraction,
                    position,
                    ..
                }) => {
                    println!("  progress {:5.1}% at {position:?}", fraction * 100.0);
                }
                other => println!("event: {other:?}"),
            }
        }
    });

    let tracks = vec![
        MediaItem::remote("https://media.example.com/first.mp3")
            .with_metadata(MediaMetadata::new().with_title("First")),
        MediaItem::remote("https://media.example.com/second.mp3")
            .with_metadata(MediaMetadata::new().with_title("Second")),
        MediaItem::remote("https://media.example.com/third.mp3")
            .with_metadata(MediaMetadata::new().with_title("Third")),
    ];

    println!("== queueing {} tracks, starting from the second ==", tracks.len());
    player.add_range(tracks.clone()).await;
    player.play_item(&tracks[1]).await;

    // Simulated time: advance playback and complete each staged item
    for _ in 0..2 {
        for _ in 0..6 {
            engine.tick(Duration::from_millis(500));
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        engine.complete_current();
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("== seeking back within the last played position ==");
    player.play_item(&tracks[0]).await;
    player.seek(Duration::from_secs(1)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    player.stop().await;
    println!("final status: {}", player.status().await);

    printer.abort();
}
