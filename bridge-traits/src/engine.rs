//! Native engine bridge trait and supporting playback types.
//!
//! These abstractions let the core player drive platform media engines
//! (AVQueuePlayer-style queue players on Apple platforms, the media playback
//! list APIs on Windows, ExoPlayer on Android) through one async API surface.
//! Host applications provide a concrete implementation per platform; the core
//! orchestration code is written once against [`NativeEngine`].
//!
//! Platform callback mechanisms (key-path observation, event handlers) are
//! deliberately not part of the contract. Implementations translate whatever
//! their platform offers into the typed [`EngineSignal`] stream, which the
//! core consumes from a single serialization point.

use crate::error::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Unique identifier for a native player item managed by an engine binding.
///
/// The id is opaque to the core: it only guarantees identity, never ordering
/// or any relationship to the underlying platform handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeItemId(Uuid);

impl NativeItemId {
    /// Generate a new item identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NativeItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NativeItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved, directly playable source handed to the engine.
///
/// Produced by a [`SourceResolver`](crate::resolver::SourceResolver); the
/// engine never performs URL or path resolution itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayableLocator {
    /// Remote HTTP(S) resource, with request headers to attach at load time.
    Url {
        url: String,
        headers: HashMap<String, String>,
    },
    /// Local file accessible to the host runtime.
    File { path: PathBuf },
}

impl PlayableLocator {
    /// Returns `true` if the locator points at remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, PlayableLocator::Url { .. })
    }

    /// Human-readable description used in log and error messages.
    pub fn describe(&self) -> String {
        match self {
            PlayableLocator::Url { url, .. } => url.clone(),
            PlayableLocator::File { path } => path.display().to_string(),
        }
    }
}

/// Coarse transport state as reported by the native engine.
///
/// This is the raw platform vocabulary, before normalization. The core's
/// state machine maps it into the settled status it exposes to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No item loaded or the engine has not started opening one.
    Idle,
    /// The engine is opening/preparing the current item.
    Opening,
    /// The engine stalled waiting for data.
    Buffering,
    /// The engine reports active playback. Note that some platforms report
    /// this with an effective rate of zero; consumers must cross-check the
    /// accompanying rate and position.
    Playing,
    /// Playback is suspended with position retained.
    Paused,
}

/// Typed notification emitted by an engine binding.
///
/// Signals replace platform observer fan-out: implementations translate
/// key-path callbacks, event handlers, or poll loops into this vocabulary and
/// publish them on the broadcast channel returned by
/// [`NativeEngine::signals`]. Signals may arrive from any thread; consumers
/// are responsible for serializing their handling.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineSignal {
    /// The transport state changed. Carries the effective playback rate and
    /// position observed at the time of the change so consumers can detect
    /// platform quirks (e.g., "playing" with no motion).
    StateChanged {
        state: EngineState,
        rate: f32,
        position: Duration,
    },
    /// The playback rate changed without an accompanying state change.
    RateChanged { rate: f32 },
    /// Buffered-range information for the current item changed.
    BufferingProgress { fraction: f64, buffered: Duration },
    /// The current item played to its natural end.
    ItemEnded { item: NativeItemId },
    /// The engine failed to load or continue playing an item.
    ItemFailed { item: NativeItemId, message: String },
}

/// Async contract for a platform media engine with an internal item queue.
///
/// Implementations own the platform player instance and its staged item list.
/// The staged queue is ordered; `advance` moves to the immediate successor
/// and `replace_queue` rebuilds the staged list wholesale, which is the
/// fallback whenever a cheap mutation is not possible.
///
/// All methods are expected to be fast; none of them should block on media
/// I/O beyond what the platform API itself requires. `seek` is the exception:
/// its future resolves only when the platform reports seek completion, so
/// callers can bound it with a timeout.
#[async_trait::async_trait]
pub trait NativeEngine: Send + Sync {
    /// Subscribe to the engine's signal stream. Every subscriber observes the
    /// same signals; past signals are not replayed.
    fn signals(&self) -> broadcast::Receiver<EngineSignal>;

    /// Create a native item for a resolved locator. Headers carried by the
    /// locator must be attached now; they cannot be changed afterwards.
    async fn create_item(&self, locator: PlayableLocator) -> Result<NativeItemId>;

    /// Release a native item and its platform resources. Releasing an id that
    /// was already released is an error; releasing the currently staged item
    /// also removes it from the queue.
    async fn release_item(&self, item: NativeItemId) -> Result<()>;

    /// Append an item to the end of the staged queue.
    async fn enqueue(&self, item: NativeItemId) -> Result<()>;

    /// Discard the staged queue and restage the given items in order. The
    /// first item becomes current. An empty list clears the queue.
    async fn replace_queue(&self, items: Vec<NativeItemId>) -> Result<()>;

    /// Advance to the immediate successor of the current item.
    async fn advance(&self) -> Result<()>;

    /// The currently staged item, if any.
    async fn current_item(&self) -> Result<Option<NativeItemId>>;

    /// Begin or resume playback of the current item.
    async fn play(&self) -> Result<()>;

    /// Suspend playback, retaining position.
    async fn pause(&self) -> Result<()>;

    /// Seek the current item to an absolute position. Resolves when the
    /// platform reports seek completion.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Current playback position of the staged item.
    async fn position(&self) -> Result<Duration>;

    /// Duration of the staged item. `None` when the platform reports an
    /// indefinite or not-yet-known duration.
    async fn duration(&self) -> Result<Option<Duration>>;

    /// Contiguously buffered duration of the staged item.
    async fn buffered(&self) -> Result<Duration>;

    /// Effective playback rate (0.0 when not progressing).
    async fn rate(&self) -> Result<f32>;

    /// Request a playback rate change.
    async fn set_rate(&self, rate: f32) -> Result<()>;

    /// Engine volume, normalized to `0.0..=1.0`.
    async fn volume(&self) -> Result<f32>;

    /// Set engine volume, normalized to `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Whether engine output is muted.
    async fn muted(&self) -> Result<bool>;

    /// Mute or unmute engine output without touching the volume level.
    async fn set_muted(&self, muted: bool) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_is_unique() {
        let a = NativeItemId::new();
        let b = NativeItemId::new();
        assert_ne!(a, b);
        assert_eq!(a, NativeItemId::from_uuid(*a.as_uuid()));
    }

    #[test]
    fn locator_classification() {
        let remote = PlayableLocator::Url {
            url: "https://example.com/track.mp3".to_string(),
            headers: HashMap::new(),
        };
        assert!(remote.is_remote());
        assert_eq!(remote.describe(), "https://example.com/track.mp3");

        let local = PlayableLocator::File {
            path: PathBuf::from("/music/track.flac"),
        };
        assert!(!local.is_remote());
    }
}
