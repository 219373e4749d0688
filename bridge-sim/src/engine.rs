//! Deterministic in-memory media engine.
//!
//! `SimEngine` models a queue-capable platform player: a staged item list
//! with a current head, transport state, position, rate, and volume. Signals
//! are emitted synchronously from the calls that would trigger them on a
//! real platform; time and item completion are driven explicitly by test
//! code so orderings stay reproducible.

use bridge_traits::engine::{
    EngineSignal, EngineState, NativeEngine, NativeItemId, PlayableLocator,
};
use bridge_traits::error::{BridgeError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

const SIGNAL_BUFFER: usize = 64;

struct SimItem {
    locator: PlayableLocator,
    duration: Duration,
}

struct SimState {
    items: HashMap<NativeItemId, SimItem>,
    staged: Vec<NativeItemId>,
    state: EngineState,
    rate: f32,
    position: Duration,
    volume: f32,
    muted: bool,
    hang_seeks: bool,
    default_duration: Duration,
    released: Vec<NativeItemId>,
    calls: Vec<String>,
}

/// In-memory [`NativeEngine`] implementation.
pub struct SimEngine {
    signals: broadcast::Sender<EngineSignal>,
    state: Mutex<SimState>,
}

impl SimEngine {
    /// Create an engine whose items default to a three-minute duration.
    pub fn new() -> Self {
        Self::with_default_duration(Duration::from_secs(180))
    }

    /// Create an engine with a specific default item duration.
    pub fn with_default_duration(default_duration: Duration) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_BUFFER);
        Self {
            signals,
            state: Mutex::new(SimState {
                items: HashMap::new(),
                staged: Vec::new(),
                state: EngineState::Idle,
                rate: 0.0,
                position: Duration::ZERO,
                volume: 1.0,
                muted: false,
                hang_seeks: false,
                default_duration,
                released: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    fn emit(&self, signal: EngineSignal) {
        self.signals.send(signal).ok();
    }

    fn emit_state(&self, state: EngineState, rate: f32, position: Duration) {
        self.emit(EngineSignal::StateChanged {
            state,
            rate,
            position,
        });
    }

    // ------------------------------------------------------------------
    // Test drivers
    // ------------------------------------------------------------------

    /// Advance simulated playback time. Position is clamped to the current
    /// item's duration; completion is not automatic, use
    /// [`complete_current`](Self::complete_current).
    pub fn tick(&self, delta: Duration) {
        let mut state = self.state.lock();
        if state.state != EngineState::Playing {
            return;
        }
        let limit = state
            .staged
            .first()
            .and_then(|id| state.items.get(id))
            .map(|item| item.duration)
            .unwrap_or(Duration::ZERO);
        state.position = (state.position + delta).min(limit);
    }

    /// Report the current item as played to its natural end, popping it from
    /// the staged queue and continuing with the successor when one exists —
    /// the auto-advance behavior of platform queue players.
    pub fn complete_current(&self) {
        let mut state = self.state.lock();
        let Some(ended) = state.staged.first().copied() else {
            return;
        };
        state.staged.remove(0);
        state.position = Duration::ZERO;

        let has_next = !state.staged.is_empty();
        if !has_next {
            state.state = EngineState::Idle;
            state.rate = 0.0;
        }
        drop(state);

        self.emit(EngineSignal::ItemEnded { item: ended });
        if has_next {
            self.emit_state(EngineState::Playing, 1.0, Duration::ZERO);
        } else {
            self.emit_state(EngineState::Idle, 0.0, Duration::ZERO);
        }
    }

    /// Report a failure of the current item.
    pub fn fail_current(&self, message: &str) {
        let mut state = self.state.lock();
        let Some(item) = state.staged.first().copied() else {
            return;
        };
        state.state = EngineState::Idle;
        state.rate = 0.0;
        drop(state);

        self.emit(EngineSignal::ItemFailed {
            item,
            message: message.to_string(),
        });
    }

    /// Publish a buffered-range update.
    pub fn report_buffering(&self, fraction: f64, buffered: Duration) {
        self.emit(EngineSignal::BufferingProgress { fraction, buffered });
    }

    /// Make subsequent `seek` calls hang until the timeout on the caller's
    /// side expires.
    pub fn hang_seeks(&self, hang: bool) {
        self.state.lock().hang_seeks = hang;
    }

    /// Snapshot of the staged item order.
    pub fn staged(&self) -> Vec<NativeItemId> {
        self.state.lock().staged.clone()
    }

    /// Locator descriptions of the staged items, in order.
    pub fn staged_locators(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .staged
            .iter()
            .filter_map(|id| state.items.get(id))
            .map(|item| item.locator.describe())
            .collect()
    }

    /// Items released so far, in release order.
    pub fn released(&self) -> Vec<NativeItemId> {
        self.state.lock().released.clone()
    }

    /// Transport calls observed so far, in order.
    pub fn call_log(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Number of items created and not yet released.
    pub fn live_items(&self) -> usize {
        self.state.lock().items.len()
    }
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NativeEngine for SimEngine {
    fn signals(&self) -> broadcast::Receiver<EngineSignal> {
        self.signals.subscribe()
    }

    async fn create_item(&self, locator: PlayableLocator) -> Result<NativeItemId> {
        let mut state = self.state.lock();
        let id = NativeItemId::new();
        let duration = state.default_duration;
        debug!(item = %id, locator = %locator.describe(), "created sim item");
        state.items.insert(id, SimItem { locator, duration });
        Ok(id)
    }

    async fn release_item(&self, item: NativeItemId) -> Result<()> {
        let mut state = self.state.lock();
        if state.items.remove(&item).is_none() {
            return Err(BridgeError::UnknownItem(item.to_string()));
        }
        state.staged.retain(|id| *id != item);
        state.released.push(item);
        Ok(())
    }

    async fn enqueue(&self, item: NativeItemId) -> Result<()> {
        let mut state = self.state.lock();
        if !state.items.contains_key(&item) {
            return Err(BridgeError::UnknownItem(item.to_string()));
        }
        state.calls.push("enqueue".to_string());
        state.staged.push(item);
        Ok(())
    }

    async fn replace_queue(&self, items: Vec<NativeItemId>) -> Result<()> {
        let mut state = self.state.lock();
        for item in &items {
            if !state.items.contains_key(item) {
                return Err(BridgeError::UnknownItem(item.to_string()));
            }
        }
        state.calls.push(format!("replace_queue {}", items.len()));
        state.staged = items;
        state.position = Duration::ZERO;
        Ok(())
    }

    async fn advance(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.staged.is_empty() {
            return Err(BridgeError::OperationFailed("nothing staged".to_string()));
        }
        state.calls.push("advance".to_string());
        state.staged.remove(0);
        state.position = Duration::ZERO;
        let playing = state.state == EngineState::Playing && !state.staged.is_empty();
        drop(state);

        if playing {
            self.emit_state(EngineState::Playing, 1.0, Duration::ZERO);
        }
        Ok(())
    }

    async fn current_item(&self) -> Result<Option<NativeItemId>> {
        Ok(self.state.lock().staged.first().copied())
    }

    async fn play(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.staged.is_empty() {
            return Err(BridgeError::OperationFailed("nothing staged".to_string()));
        }
        state.calls.push("play".to_string());

        let resuming = state.state == EngineState::Paused;
        let position = state.position;
        state.state = EngineState::Playing;
        state.rate = 1.0;
        drop(state);

        if resuming {
            self.emit_state(EngineState::Playing, 1.0, position);
        } else {
            // a cold start walks the platform's usual ramp-up
            self.emit_state(EngineState::Opening, 0.0, position);
            self.emit_state(EngineState::Buffering, 0.0, position);
            self.emit_state(EngineState::Playing, 1.0, position);
        }
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push("pause".to_string());
        let position = state.position;
        state.state = EngineState::Paused;
        state.rate = 0.0;
        drop(state);

        self.emit_state(EngineState::Paused, 0.0, position);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<()> {
        let (hang, limit) = {
            let mut state = self.state.lock();
            state.calls.push(format!("seek {}ms", position.as_millis()));
            let limit = state
                .staged
                .first()
                .and_then(|id| state.items.get(id))
                .map(|item| item.duration)
                .unwrap_or(Duration::ZERO);
            (state.hang_seeks, limit)
        };

        if hang {
            // completion callback never fires
            std::future::pending::<()>().await;
        }

        self.state.lock().position = position.min(limit);
        Ok(())
    }

    async fn position(&self) -> Result<Duration> {
        Ok(self.state.lock().position)
    }

    async fn duration(&self) -> Result<Option<Duration>> {
        let state = self.state.lock();
        Ok(state
            .staged
            .first()
            .and_then(|id| state.items.get(id))
            .map(|item| item.duration))
    }

    async fn buffered(&self) -> Result<Duration> {
        let state = self.state.lock();
        let duration = state
            .staged
            .first()
            .and_then(|id| state.items.get(id))
            .map(|item| item.duration)
            .unwrap_or(Duration::ZERO);
        Ok(duration)
    }

    async fn rate(&self) -> Result<f32> {
        Ok(self.state.lock().rate)
    }

    async fn set_rate(&self, rate: f32) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.rate = rate;
            if rate == 0.0 && state.state == EngineState::Playing {
                state.state = EngineState::Paused;
            }
        }
        self.emit(EngineSignal::RateChanged { rate });
        Ok(())
    }

    async fn volume(&self) -> Result<f32> {
        Ok(self.state.lock().volume)
    }

    async fn set_volume(&self, volume: f32) -> Result<()> {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
        Ok(())
    }

    async fn muted(&self) -> Result<bool> {
        Ok(self.state.lock().muted)
    }

    async fn set_muted(&self, muted: bool) -> Result<()> {
        self.state.lock().muted = muted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_locator(url: &str) -> PlayableLocator {
        PlayableLocator::Url {
            url: url.to_string(),
            headers: HashMap::new(),
        }
    }

    async fn staged_engine(n: usize) -> (SimEngine, Vec<NativeItemId>) {
        let engine = SimEngine::with_default_duration(Duration::from_secs(60));
        let mut ids = Vec::new();
        for i in 0..n {
            let id = engine
                .create_item(url_locator(&format!("https://example.com/{i}")))
                .await
                .unwrap();
            ids.push(id);
        }
        engine.replace_queue(ids.clone()).await.unwrap();
        (engine, ids)
    }

    #[tokio::test]
    async fn cold_start_emits_ramp_up_sequence() {
        let (engine, _) = staged_engine(1).await;
        let mut signals = engine.signals();

        engine.play().await.unwrap();

        let mut states = Vec::new();
        while let Ok(signal) = signals.try_recv() {
            if let EngineSignal::StateChanged { state, .. } = signal {
                states.push(state);
            }
        }
        assert_eq!(
            states,
            vec![
                EngineState::Opening,
                EngineState::Buffering,
                EngineState::Playing
            ]
        );
    }

    #[tokio::test]
    async fn resume_skips_ramp_up() {
        let (engine, _) = staged_engine(1).await;
        engine.play().await.unwrap();
        engine.pause().await.unwrap();

        let mut signals = engine.signals();
        engine.play().await.unwrap();

        let mut states = Vec::new();
        while let Ok(signal) = signals.try_recv() {
            if let EngineSignal::StateChanged { state, .. } = signal {
                states.push(state);
            }
        }
        assert_eq!(states, vec![EngineState::Playing]);
    }

    #[tokio::test]
    async fn completion_auto_advances_to_successor() {
        let (engine, ids) = staged_engine(2).await;
        engine.play().await.unwrap();
        let mut signals = engine.signals();

        engine.complete_current();

        assert_eq!(engine.staged(), vec![ids[1]]);
        match signals.try_recv().unwrap() {
            EngineSignal::ItemEnded { item } => assert_eq!(item, ids[0]),
            other => panic!("unexpected signal {other:?}"),
        }
    }

    #[tokio::test]
    async fn completion_of_last_item_goes_idle() {
        let (engine, ids) = staged_engine(1).await;
        engine.play().await.unwrap();
        engine.complete_current();

        assert!(engine.staged().is_empty());
        assert_eq!(engine.current_item().await.unwrap(), None);
        // the item itself is still alive until released
        assert_eq!(engine.live_items(), 1);
        let _ = ids;
    }

    #[tokio::test]
    async fn release_removes_from_staged_queue() {
        let (engine, ids) = staged_engine(3).await;
        engine.release_item(ids[1]).await.unwrap();
        assert_eq!(engine.staged(), vec![ids[0], ids[2]]);
        assert_eq!(engine.released(), vec![ids[1]]);

        let err = engine.release_item(ids[1]).await.unwrap_err();
        assert!(matches!(err, BridgeError::UnknownItem(_)));
    }

    #[tokio::test]
    async fn tick_clamps_to_duration() {
        let (engine, _) = staged_engine(1).await;
        engine.play().await.unwrap();
        engine.tick(Duration::from_secs(45));
        assert_eq!(engine.position().await.unwrap(), Duration::from_secs(45));
        engine.tick(Duration::from_secs(1000));
        assert_eq!(engine.position().await.unwrap(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn seek_records_call_and_sets_position() {
        let (engine, _) = staged_engine(1).await;
        engine.play().await.unwrap();
        engine.seek(Duration::from_secs(30)).await.unwrap();
        assert_eq!(engine.position().await.unwrap(), Duration::from_secs(30));
        assert!(engine
            .call_log()
            .iter()
            .any(|call| call == "seek 30000ms"));
    }

    #[tokio::test]
    async fn play_with_nothing_staged_fails() {
        let engine = SimEngine::new();
        assert!(engine.play().await.is_err());
    }
}
