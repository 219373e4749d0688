//! # Media Player Facade
//!
//! One logical player multiplexing a native platform engine behind a single
//! API: queue management, transport control, volume, and normalized
//! status/progress events.
//!
//! ## Serialization Model
//!
//! A single `tokio::sync::Mutex` guards the session (queue, native item
//! mapping, state machine, current item). Every public transport call, the
//! engine-signal reactor, and queue mutations funnel through it, so native
//! callbacks arriving on arbitrary threads can never interleave with an
//! in-flight rebuild. Admission order for competing calls is lock order.
//!
//! ## Advance vs. Rebuild
//!
//! Playing a specific item prefers the cheapest native mutation available:
//! when the requested item is the immediate successor already staged in the
//! engine, the engine advances one step. Every other jump (backwards,
//! non-contiguous, or to an unstaged item) discards the staged queue and
//! rebuilds it from the requested item through the end of the logical
//! traversal order.
//!
//! ## Failure Policy
//!
//! `play`, `pause`, `stop`, and `seek` never return errors. Resolution and
//! engine failures are converted into a single `MediaFailed` event followed
//! by a forced `Stopped` status, leaving the player ready to accept the next
//! `play`.

use crate::error::{PlayerError, Result};
use crate::mapper::NativeItemMapper;
use crate::queue::{MediaItem, MediaQueue};
use crate::state::{Effect, PlaybackStateMachine, PlaybackStatus, PollCadence, ProgressSample};
use crate::volume::VolumeManager;
use bridge_traits::engine::{EngineSignal, NativeItemId};
use bridge_traits::{MetadataService, NativeEngine};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{EventBus, PlaybackEvent, PlayerEvent, Receiver, RecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Mutable per-player state, guarded by the session lock.
struct Session {
    queue: MediaQueue,
    mapper: NativeItemMapper,
    machine: PlaybackStateMachine,
    /// The logical item playback is currently attached to. May reference an
    /// item outside the queue when a standalone item was requested.
    current: Option<MediaItem>,
    /// Mirror of the engine's staged item order, used to decide between a
    /// cheap advance and a full rebuild.
    native_order: Vec<NativeItemId>,
}

struct PlayerInner {
    engine: Arc<dyn NativeEngine>,
    bus: EventBus,
    metadata_service: Option<Arc<dyn MetadataService>>,
    seek_timeout: Duration,
    progress_interval: Duration,
    session: Mutex<Session>,
    cadence: watch::Sender<PollCadence>,
}

/// The player facade. One instance per logical player; not clonable — the
/// instance is the single owner of its engine session. Dropping it cancels
/// the background reactor and poller tasks.
pub struct MediaPlayer {
    inner: Arc<PlayerInner>,
    volume: Arc<VolumeManager>,
    cancel: CancellationToken,
}

impl MediaPlayer {
    /// Construct a player from a validated configuration and spawn its
    /// background tasks. Must be called within a tokio runtime.
    pub async fn new(config: PlayerConfig) -> Self {
        let bus = EventBus::new(config.event_buffer);

        let volume = Arc::new(VolumeManager::new(
            config.engine.clone(),
            bus.clone(),
            config.max_volume,
        ));
        volume.sync_from_engine().await;

        let (cadence, cadence_rx) = watch::channel(PollCadence::Suspended);

        let inner = Arc::new(PlayerInner {
            engine: config.engine.clone(),
            bus: bus.clone(),
            metadata_service: config.metadata_service.clone(),
            seek_timeout: config.seek_timeout,
            progress_interval: config.progress_interval,
            session: Mutex::new(Session {
                queue: MediaQueue::new(bus, config.allow_duplicates),
                mapper: NativeItemMapper::new(config.engine.clone(), config.resolver.clone()),
                machine: PlaybackStateMachine::new(),
                current: None,
                native_order: Vec::new(),
            }),
            cadence,
        });

        let cancel = CancellationToken::new();

        let signals = config.engine.signals();
        tokio::spawn(run_reactor(inner.clone(), signals, cancel.clone()));
        tokio::spawn(run_poller(inner.clone(), cadence_rx, cancel.clone()));

        info!("media player initialized");
        Self {
            inner,
            volume,
            cancel,
        }
    }

    /// Subscribe to the player's event stream.
    pub fn events(&self) -> Receiver<PlayerEvent> {
        self.inner.bus.subscribe()
    }

    /// The volume manager for this instance.
    pub fn volume(&self) -> Arc<VolumeManager> {
        self.volume.clone()
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Start or resume playback of the current item.
    ///
    /// With nothing staged at all, settles to `Failed` (there is nothing to
    /// play). Failures are reported through `MediaFailed`, never returned.
    pub async fn play(&self) {
        let mut session = self.inner.session.lock().await;
        play_impl(&self.inner, &mut session, None).await;
    }

    /// Play a specific item.
    ///
    /// Resumes in place when the item is the current one and status is
    /// Paused; advances one native step when it is the staged successor;
    /// otherwise rebuilds the native queue from the item onward. An item not
    /// present in the logical queue plays standalone.
    pub async fn play_item(&self, item: &MediaItem) {
        let mut session = self.inner.session.lock().await;
        play_impl(&self.inner, &mut session, Some(item.clone())).await;
    }

    /// Replace the queue with `items` and start playback at `start_index`
    /// (storage order).
    pub async fn play_queue(&self, items: Vec<MediaItem>, start_index: usize) {
        let mut session = self.inner.session.lock().await;

        session.queue.clear();
        session.mapper.release_all().await;
        session.native_order.clear();
        session.current = None;
        session.queue.add_range(items);

        match session.queue.get(start_index).cloned() {
            Some(target) => play_impl(&self.inner, &mut session, Some(target)).await,
            None => {
                let effects = session.machine.force(PlaybackStatus::Failed);
                apply_effects(&self.inner, &session, effects);
            }
        }
    }

    /// Toggle between playing and paused/stopped.
    pub async fn play_pause(&self) {
        let status = {
            let session = self.inner.session.lock().await;
            session.machine.status()
        };
        match status {
            PlaybackStatus::Paused | PlaybackStatus::Stopped => self.play().await,
            _ => self.pause().await,
        }
    }

    /// Pause playback, retaining position. No-op when nothing is staged.
    pub async fn pause(&self) {
        let mut session = self.inner.session.lock().await;
        pause_impl(&self.inner, &mut session).await;
    }

    /// Stop playback and reset the position to the start of the item.
    pub async fn stop(&self) {
        let mut session = self.inner.session.lock().await;

        if !has_staged_item(&self.inner).await {
            return;
        }

        if let Err(e) = self.inner.engine.pause().await {
            publish_failure(
                &self.inner,
                &mut session,
                "Unable to stop playback".to_string(),
                Some(e.to_string()),
            );
            return;
        }
        bounded_seek(&self.inner, Duration::ZERO).await;

        let effects = session.machine.force(PlaybackStatus::Stopped);
        apply_effects(&self.inner, &session, effects);
    }

    /// Seek to an absolute position in the current item.
    ///
    /// Playback is paused first so the engine sees a consistent transport
    /// state, then the seek is issued. If the status was Playing, playback
    /// resumes once the engine reports completion — or once the configured
    /// timeout elapses, whichever comes first (fail open).
    pub async fn seek(&self, position: Duration) {
        let mut session = self.inner.session.lock().await;

        if !has_staged_item(&self.inner).await {
            return;
        }

        let was_playing = session.machine.status() == PlaybackStatus::Playing;

        if let Err(e) = self.inner.engine.pause().await {
            publish_failure(
                &self.inner,
                &mut session,
                "Unable to pause for seek".to_string(),
                Some(e.to_string()),
            );
            return;
        }
        let effects = session.machine.force(PlaybackStatus::Paused);
        apply_effects(&self.inner, &session, effects);

        match tokio::time::timeout(self.inner.seek_timeout, self.inner.engine.seek(position)).await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                publish_failure(
                    &self.inner,
                    &mut session,
                    "Seek failed".to_string(),
                    Some(e.to_string()),
                );
                return;
            }
            Err(_) => {
                // fail open: treat the seek as completed
                warn!(timeout = ?self.inner.seek_timeout, "seek completion timed out");
            }
        }

        if was_playing {
            match self.inner.engine.play().await {
                Ok(()) => {
                    let effects = session.machine.force(PlaybackStatus::Playing);
                    apply_effects(&self.inner, &session, effects);
                }
                Err(e) => publish_failure(
                    &self.inner,
                    &mut session,
                    "Unable to resume after seek".to_string(),
                    Some(e.to_string()),
                ),
            }
        }
    }

    /// Play the next item in traversal order. No-op at the end of the queue.
    pub async fn play_next(&self) {
        let mut session = self.inner.session.lock().await;
        let Some(target) = session.queue.peek_next().cloned() else {
            debug!("play_next with no successor");
            return;
        };
        play_impl(&self.inner, &mut session, Some(target)).await;
    }

    /// Play the previous item in traversal order. No-op at the start.
    pub async fn play_previous(&self) {
        let mut session = self.inner.session.lock().await;
        let Some(target) = session.queue.peek_previous().cloned() else {
            debug!("play_previous with no predecessor");
            return;
        };
        play_impl(&self.inner, &mut session, Some(target)).await;
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    /// Append an item to the queue. When a playback session is active, the
    /// item is also resolved and staged at the end of the native queue.
    pub async fn add(&self, item: MediaItem) {
        let mut session = self.inner.session.lock().await;
        let before = session.queue.len();
        session.queue.add(item.clone());
        if session.queue.len() > before {
            stage_appended(&self.inner, &mut session, &[item]).await;
        }
    }

    /// Append several items with a single structural notification.
    pub async fn add_range(&self, items: Vec<MediaItem>) {
        let mut session = self.inner.session.lock().await;
        let before = session.queue.len();
        session.queue.add_range(items.clone());
        if session.queue.len() > before {
            stage_appended(&self.inner, &mut session, &items).await;
        }
    }

    /// Remove the item at storage index `index`. Out-of-range indices are a
    /// silent no-op. Removing the item currently attached to the engine
    /// stops playback.
    pub async fn remove_at(&self, index: usize) {
        let mut session = self.inner.session.lock().await;
        let Some(id) = session.queue.get(index).map(|i| i.id()) else {
            return;
        };

        let removing_current = session.current.as_ref().map(|c| c.id()) == Some(id);
        session.queue.remove_at(index);

        if let Some(handle) = session.mapper.get(id) {
            session.native_order.retain(|h| *h != handle);
        }
        session.mapper.release(id).await;

        if removing_current {
            session.current = None;
            let effects = session.machine.force(PlaybackStatus::Stopped);
            apply_effects(&self.inner, &session, effects);
        }
    }

    /// Move an item between storage slots.
    ///
    /// # Errors
    ///
    /// [`PlayerError::InvalidQueueOperation`] for an out-of-range index —
    /// the one queue mutation that reports synchronously.
    pub async fn move_item(&self, from: usize, to: usize) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        session.queue.move_item(from, to)
        // the staged native tail may now be stale; the next explicit play
        // target rebuilds it
    }

    /// Clear the queue, release every native handle, and stop playback.
    pub async fn clear(&self) {
        let mut session = self.inner.session.lock().await;
        session.queue.clear();
        session.mapper.release_all().await;
        session.native_order.clear();
        session.current = None;
        if let Err(e) = self.inner.engine.replace_queue(Vec::new()).await {
            warn!(error = %e, "failed to clear native queue");
        }
        let effects = session.machine.force(PlaybackStatus::Stopped);
        apply_effects(&self.inner, &session, effects);
    }

    /// Toggle shuffle on the logical queue. Storage order is preserved; the
    /// staged native tail is rebuilt on the next explicit play target.
    pub async fn set_shuffled(&self, shuffled: bool) {
        let mut session = self.inner.session.lock().await;
        session.queue.set_shuffled(shuffled);
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// The settled playback status.
    pub async fn status(&self) -> PlaybackStatus {
        self.inner.session.lock().await.machine.status()
    }

    /// The item playback is currently attached to.
    pub async fn current(&self) -> Option<MediaItem> {
        self.inner.session.lock().await.current.clone()
    }

    /// Snapshot of the queue in storage order.
    pub async fn queue_items(&self) -> Vec<MediaItem> {
        self.inner.session.lock().await.queue.items().to_vec()
    }

    /// Whether a `play_next` would have a target.
    pub async fn has_next(&self) -> bool {
        self.inner.session.lock().await.queue.has_next()
    }

    /// Whether a `play_previous` would have a target.
    pub async fn has_previous(&self) -> bool {
        self.inner.session.lock().await.queue.has_previous()
    }

    /// Whether queue traversal is shuffled.
    pub async fn is_shuffled(&self) -> bool {
        self.inner.session.lock().await.queue.is_shuffled()
    }

    /// Current playback position; zero when nothing is staged.
    pub async fn position(&self) -> Duration {
        self.inner.engine.position().await.unwrap_or(Duration::ZERO)
    }

    /// Duration of the current item; zero when indefinite or unknown.
    pub async fn duration(&self) -> Duration {
        self.inner
            .engine
            .duration()
            .await
            .ok()
            .flatten()
            .unwrap_or(Duration::ZERO)
    }

    /// Contiguously buffered duration of the current item.
    pub async fn buffered(&self) -> Duration {
        self.inner.engine.buffered().await.unwrap_or(Duration::ZERO)
    }

    /// Effective playback rate; zero when nothing is progressing.
    pub async fn rate(&self) -> f32 {
        self.inner.engine.rate().await.unwrap_or(0.0)
    }

    /// Request a playback rate change.
    ///
    /// # Errors
    ///
    /// [`PlayerError::EngineFailure`] when the engine rejects the rate.
    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        self.inner
            .engine
            .set_rate(rate)
            .await
            .map_err(|e| PlayerError::EngineFailure(e.to_string()))
    }
}

impl Drop for MediaPlayer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for MediaPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPlayer").finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------
// Orchestration internals
// ----------------------------------------------------------------------

async fn has_staged_item(inner: &PlayerInner) -> bool {
    matches!(inner.engine.current_item().await, Ok(Some(_)))
}

/// Execute the effects produced by a state decision: publish events and
/// retune the poller.
fn apply_effects(inner: &PlayerInner, session: &Session, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::Status(status) => {
                debug!(%status, "status changed");
                inner
                    .bus
                    .emit(PlayerEvent::Playback(PlaybackEvent::StatusChanged { status }))
                    .ok();
            }
            Effect::Poll(cadence) => {
                inner.cadence.send_replace(cadence);
            }
            Effect::EmitBuffering { fraction, buffered } => {
                inner
                    .bus
                    .emit(PlayerEvent::Playback(PlaybackEvent::BufferingChanged {
                        fraction,
                        buffered,
                    }))
                    .ok();
            }
            Effect::EmitFinished { item } => {
                let item_id = session
                    .mapper
                    .media_for(item)
                    .or_else(|| session.current.as_ref().map(|c| c.id()))
                    .map(|id| *id.as_uuid())
                    .unwrap_or_else(Uuid::nil);
                inner
                    .bus
                    .emit(PlayerEvent::Playback(PlaybackEvent::MediaFinished { item_id }))
                    .ok();
            }
            Effect::EmitFailed { message } => {
                inner
                    .bus
                    .emit(PlayerEvent::Playback(PlaybackEvent::MediaFailed {
                        message,
                        cause: None,
                    }))
                    .ok();
            }
        }
    }
}

/// Report a recovered failure: one `MediaFailed`, then a forced `Stopped`.
fn publish_failure(
    inner: &PlayerInner,
    session: &mut Session,
    message: String,
    cause: Option<String>,
) {
    warn!(message, ?cause, "playback failure");
    inner
        .bus
        .emit(PlayerEvent::Playback(PlaybackEvent::MediaFailed {
            message,
            cause,
        }))
        .ok();
    let effects = session.machine.force(PlaybackStatus::Stopped);
    apply_effects(inner, session, effects);
}

fn engine_failure(e: bridge_traits::BridgeError) -> PlayerError {
    PlayerError::EngineFailure(e.to_string())
}

/// The play decision ladder.
async fn play_impl(inner: &Arc<PlayerInner>, session: &mut Session, target: Option<MediaItem>) {
    let staged = inner.engine.current_item().await.unwrap_or(None);

    if target.is_none() && staged.is_none() && session.current.is_none() {
        // nothing to play
        let effects = session.machine.force(PlaybackStatus::Failed);
        apply_effects(inner, session, effects);
        return;
    }

    let same_item = matches!(
        (&target, &session.current),
        (Some(t), Some(c)) if t.id() == c.id()
    );
    if target.is_none() || (same_item && session.machine.status() == PlaybackStatus::Paused) {
        // resume in place: no rebuild, no re-resolve
        match inner.engine.play().await {
            Ok(()) => {
                let effects = session.machine.force(PlaybackStatus::Playing);
                apply_effects(inner, session, effects);
            }
            Err(e) => publish_failure(
                inner,
                session,
                "Unable to resume playback".to_string(),
                Some(e.to_string()),
            ),
        }
        return;
    }

    let Some(target) = target else {
        return;
    };
    if let Err(e) = start_item(inner, session, &target).await {
        // a handle created for an unqueued target must not leak
        if !session.queue.contains(target.id()) {
            session.mapper.release(target.id()).await;
        }
        publish_failure(
            inner,
            session,
            format!("Unable to start playback of {}", target.source().describe()),
            Some(e.to_string()),
        );
    }
}

/// Reconfigure the engine for a new target and start it.
async fn start_item(
    inner: &Arc<PlayerInner>,
    session: &mut Session,
    target: &MediaItem,
) -> Result<()> {
    let handle = session.mapper.resolve(target).await?;

    let staged = inner.engine.current_item().await.map_err(engine_failure)?;
    let staged_index = staged.and_then(|s| session.native_order.iter().position(|h| *h == s));
    let target_index = session.native_order.iter().position(|h| *h == handle);

    match (staged_index, target_index) {
        (Some(current), Some(next)) if next == current + 1 => {
            // the requested item is the staged successor: cheap advance
            debug!(item = %target.id(), "advancing to staged successor");
            inner.engine.advance().await.map_err(engine_failure)?;
            session.native_order.remove(current);
            session.queue.set_current(target.id());
        }
        _ => {
            if session.queue.contains(target.id()) {
                // rebuild from the target through the end of traversal order
                session.queue.set_current(target.id());
                let tail = session.queue.traversal_from_current();
                debug!(item = %target.id(), staged = tail.len(), "rebuilding native queue");

                let mut handles = Vec::with_capacity(tail.len());
                for item in &tail {
                    match session.mapper.resolve(item).await {
                        Ok(h) => handles.push(h),
                        Err(e) if item.id() == target.id() => return Err(e),
                        Err(e) => {
                            warn!(item = %item.id(), error = %e, "skipping unresolvable item")
                        }
                    }
                }
                session.native_order = handles.clone();
                inner
                    .engine
                    .replace_queue(handles)
                    .await
                    .map_err(engine_failure)?;
            } else {
                // target outside the logical queue plays standalone
                debug!(item = %target.id(), "staging standalone item");
                session.mapper.release_all_except(target.id()).await;
                session.native_order = vec![handle];
                inner
                    .engine
                    .replace_queue(vec![handle])
                    .await
                    .map_err(engine_failure)?;
            }
        }
    }

    session.current = Some(target.clone());
    let effects = session.machine.force(PlaybackStatus::Loading);
    apply_effects(inner, session, effects);

    inner.engine.play().await.map_err(engine_failure)?;
    spawn_enrichment(inner, target);
    Ok(())
}

async fn pause_impl(inner: &PlayerInner, session: &mut Session) {
    if !has_staged_item(inner).await {
        return;
    }
    match inner.engine.pause().await {
        Ok(()) => {
            let effects = session.machine.force(PlaybackStatus::Paused);
            apply_effects(inner, session, effects);
        }
        Err(e) => publish_failure(
            inner,
            session,
            "Unable to pause playback".to_string(),
            Some(e.to_string()),
        ),
    }
}

/// Issue a seek bounded by the configured timeout, failing open on expiry.
async fn bounded_seek(inner: &PlayerInner, position: Duration) {
    match tokio::time::timeout(inner.seek_timeout, inner.engine.seek(position)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "seek failed"),
        Err(_) => warn!(timeout = ?inner.seek_timeout, "seek completion timed out"),
    }
}

/// Resolve and stage items appended while a playback session is active.
async fn stage_appended(inner: &Arc<PlayerInner>, session: &mut Session, items: &[MediaItem]) {
    if session.current.is_none() {
        return;
    }
    for item in items {
        if !session.queue.contains(item.id()) {
            continue;
        }
        match session.mapper.resolve(item).await {
            Ok(handle) => match inner.engine.enqueue(handle).await {
                Ok(()) => session.native_order.push(handle),
                Err(e) => warn!(item = %item.id(), error = %e, "unable to stage appended item"),
            },
            Err(e) => warn!(item = %item.id(), error = %e, "unable to resolve appended item"),
        }
    }
}

fn spawn_enrichment(inner: &Arc<PlayerInner>, item: &MediaItem) {
    let Some(service) = inner.metadata_service.clone() else {
        return;
    };
    let inner = inner.clone();
    let id = item.id();
    let source = item.source().clone();
    tokio::spawn(async move {
        match service.lookup(&source).await {
            Ok(metadata) => {
                let mut session = inner.session.lock().await;
                session.queue.enrich_metadata(id, metadata);
            }
            Err(e) => debug!(item = %id, error = %e, "metadata lookup failed"),
        }
    });
}

// ----------------------------------------------------------------------
// Background tasks
// ----------------------------------------------------------------------

/// Drain engine signals through the session lock, one at a time.
async fn run_reactor(
    inner: Arc<PlayerInner>,
    mut signals: tokio::sync::broadcast::Receiver<EngineSignal>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            signal = signals.recv() => match signal {
                Ok(signal) => handle_signal(&inner, signal).await,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "engine signal stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    debug!("signal reactor exited");
}

async fn handle_signal(inner: &Arc<PlayerInner>, signal: EngineSignal) {
    let mut session = inner.session.lock().await;
    let effects = session.machine.apply(&signal);
    apply_effects(inner, &session, effects);

    match signal {
        EngineSignal::ItemEnded { item } => {
            finish_and_advance(inner, &mut session, item);
        }
        EngineSignal::ItemFailed { .. } => {
            // settle back to Stopped so the player stays usable
            let effects = session.machine.force(PlaybackStatus::Stopped);
            apply_effects(inner, &session, effects);
        }
        _ => {}
    }
}

/// After a natural end, reconcile the logical pointer with the engine's own
/// advancement, or settle to Stopped when nothing follows.
fn finish_and_advance(inner: &Arc<PlayerInner>, session: &mut Session, ended: NativeItemId) {
    if let Some(pos) = session.native_order.iter().position(|h| *h == ended) {
        session.native_order.remove(pos);
    }

    let ended_media = session.mapper.media_for(ended);
    let queue_current = session.queue.current().map(|i| i.id());
    let can_advance = ended_media.is_some()
        && ended_media == queue_current
        && session.queue.has_next()
        && !session.native_order.is_empty();

    if can_advance {
        if let Some(next_item) = session.queue.next() {
            debug!(item = %next_item.id(), "advanced after natural end");
            session.current = Some(next_item);
            return;
        }
    }

    session.current = None;
    let effects = session.machine.force(PlaybackStatus::Stopped);
    apply_effects(inner, session, effects);
}

/// Emit progress samples at the cadence the state machine requests.
///
/// `Fast` ticks at the configured interval; `Suspended` and `Stopped` emit
/// nothing and simply wait for the next cadence change. A tick that races a
/// cadence change re-checks the cadence before publishing, so a stop always
/// suppresses the pending tick.
async fn run_poller(
    inner: Arc<PlayerInner>,
    mut cadence_rx: watch::Receiver<PollCadence>,
    cancel: CancellationToken,
) {
    loop {
        let cadence = *cadence_rx.borrow_and_update();
        match cadence {
            PollCadence::Fast => {
                let mut ticker = tokio::time::interval(inner.progress_interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        changed = cadence_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                            break;
                        }
                        _ = ticker.tick() => {
                            if *cadence_rx.borrow() != PollCadence::Fast {
                                break;
                            }
                            emit_progress(&inner).await;
                        }
                    }
                }
            }
            PollCadence::Suspended | PollCadence::Stopped => {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = cadence_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}

async fn emit_progress(inner: &PlayerInner) {
    let position = match inner.engine.position().await {
        Ok(position) => position,
        Err(e) => {
            debug!(error = %e, "skipping progress tick");
            return;
        }
    };
    let duration = inner.engine.duration().await.ok().flatten();
    let buffered = inner.engine.buffered().await.unwrap_or(Duration::ZERO);

    let sample = ProgressSample {
        position,
        duration,
        buffered,
    };

    inner
        .bus
        .emit(PlayerEvent::Playback(PlaybackEvent::PlayingChanged {
            fraction: sample.fraction(),
            position: sample.position,
            duration: sample.duration_or_zero(),
        }))
        .ok();
}
