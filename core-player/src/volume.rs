//! # Volume Manager
//!
//! Owns the player-facing volume and mute state, mirrors it to and from the
//! native engine, and publishes change events.
//!
//! Levels are integers in `0..=max_volume` (default 100); the engine side is
//! normalized `0.0..=1.0`. Out-of-range sets are clamped, never rejected.
//! Mute is independent of level: muting does not zero the stored level, and
//! unmuting restores audible output at the current level.

use crate::error::{PlayerError, Result};
use bridge_traits::NativeEngine;
use core_runtime::events::{EventBus, PlayerEvent, VolumeEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

struct VolumeState {
    level: u32,
    muted: bool,
}

/// Per-player volume/mute state mirrored to the native engine.
pub struct VolumeManager {
    engine: Arc<dyn NativeEngine>,
    bus: EventBus,
    max_volume: u32,
    state: RwLock<VolumeState>,
}

impl VolumeManager {
    /// Create a manager starting at full volume, unmuted.
    pub fn new(engine: Arc<dyn NativeEngine>, bus: EventBus, max_volume: u32) -> Self {
        Self {
            engine,
            bus,
            max_volume,
            state: RwLock::new(VolumeState {
                level: max_volume,
                muted: false,
            }),
        }
    }

    /// Adopt the engine's current volume and mute state without emitting
    /// events. Called once when a player instance is constructed.
    pub async fn sync_from_engine(&self) {
        let level = match self.engine.volume().await {
            Ok(normalized) => {
                (f64::from(normalized).clamp(0.0, 1.0) * f64::from(self.max_volume)).round() as u32
            }
            Err(e) => {
                warn!(error = %e, "failed to read engine volume");
                return;
            }
        };
        let muted = match self.engine.muted().await {
            Ok(muted) => muted,
            Err(e) => {
                warn!(error = %e, "failed to read engine mute state");
                return;
            }
        };

        let mut state = self.state.write();
        state.level = level;
        state.muted = muted;
    }

    /// Current level in `0..=max_volume`.
    pub fn volume(&self) -> u32 {
        self.state.read().level
    }

    /// Whether output is muted.
    pub fn muted(&self) -> bool {
        self.state.read().muted
    }

    /// The configured maximum level.
    pub fn max_volume(&self) -> u32 {
        self.max_volume
    }

    /// Set the level, clamping into `0..=max_volume`, mirror it to the
    /// engine, and publish the change.
    pub async fn set_volume(&self, level: u32) -> Result<()> {
        let level = level.min(self.max_volume);
        let normalized = level as f32 / self.max_volume as f32;

        self.engine
            .set_volume(normalized)
            .await
            .map_err(|e| PlayerError::EngineFailure(e.to_string()))?;

        let muted = {
            let mut state = self.state.write();
            state.level = level;
            state.muted
        };

        debug!(level, "volume changed");
        self.bus
            .emit(PlayerEvent::Volume(VolumeEvent::Changed { level, muted }))
            .ok();
        Ok(())
    }

    /// Mute or unmute, mirror it to the engine, and publish the change with
    /// the current level.
    pub async fn set_muted(&self, muted: bool) -> Result<()> {
        self.engine
            .set_muted(muted)
            .await
            .map_err(|e| PlayerError::EngineFailure(e.to_string()))?;

        let level = {
            let mut state = self.state.write();
            state.muted = muted;
            state.level
        };

        debug!(muted, "mute changed");
        self.bus
            .emit(PlayerEvent::Volume(VolumeEvent::Changed { level, muted }))
            .ok();
        Ok(())
    }
}

impl std::fmt::Debug for VolumeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("VolumeManager")
            .field("level", &state.level)
            .field("muted", &state.muted)
            .field("max_volume", &self.max_volume)
            .finish()
    }
}
