//! # Playback State Machine
//!
//! Normalizes heterogeneous native engine signals into the settled
//! [`PlaybackStatus`] vocabulary and decides the progress-polling cadence.
//!
//! ## Transition Table
//!
//! ```text
//! Stopped -> Loading -> Buffering -> Playing <-> Paused
//! any     -> Failed
//! Playing -> Stopped   (natural end or explicit stop)
//! Failed  -> Stopped   (reset)
//! ```
//!
//! The machine is deliberately pure: [`PlaybackStateMachine::apply`] consumes
//! one signal and returns the list of [`Effect`]s the orchestrator must
//! execute (publish a status, retune the poller, emit an event). Keeping the
//! decision separate from execution makes every native-signal ordering
//! testable without an engine.
//!
//! ## Native Quirk Guards
//!
//! - "playing" with an effective rate of zero **and** zero position is
//!   reported by some platforms before any motion; it settles to `Stopped`.
//! - A rate drop to zero while `Playing` means the transport was changed
//!   out-of-band; it settles to `Paused`.
//! - A native "paused" while `Buffering` is ignored; `Paused` is reachable
//!   only through `Playing`.

use bridge_traits::engine::{EngineSignal, EngineState, NativeItemId};
use std::time::Duration;

pub use core_runtime::events::PlaybackStatus;

/// Polling cadence requested from the progress poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCadence {
    /// Fast tick at the configured progress interval (only while Playing).
    Fast,
    /// No ticks; the poller waits for the next cadence change.
    Suspended,
    /// No ticks and any already-pending tick is suppressed. Used on failure.
    Stopped,
}

/// A snapshot of playback progress derived from engine queries.
///
/// Derived, never stored: the poller builds one per tick and discards it
/// after publishing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    /// Current position.
    pub position: Duration,
    /// Item duration; `None` when indefinite or unknown.
    pub duration: Option<Duration>,
    /// Contiguously buffered duration.
    pub buffered: Duration,
}

impl ProgressSample {
    /// Completed fraction in `[0, 1]`.
    ///
    /// A zero, indefinite, or unknown duration, or any non-finite
    /// intermediate, yields exactly 0 rather than propagating the anomaly.
    pub fn fraction(&self) -> f64 {
        match self.duration {
            Some(duration) if duration > Duration::ZERO => {
                sanitize_fraction(self.position.as_secs_f64() / duration.as_secs_f64())
            }
            _ => 0.0,
        }
    }

    /// Duration reported to listeners: the real one, or zero when unknown.
    pub fn duration_or_zero(&self) -> Duration {
        self.duration.unwrap_or(Duration::ZERO)
    }
}

/// Clamp a computed fraction into `[0, 1]`, mapping NaN/∞ to 0.
pub fn sanitize_fraction(fraction: f64) -> f64 {
    if !fraction.is_finite() || fraction < 0.0 {
        0.0
    } else {
        fraction.min(1.0)
    }
}

/// An action the orchestrator must take after a state decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Publish a settled status change.
    Status(PlaybackStatus),
    /// Retune the progress poller.
    Poll(PollCadence),
    /// Publish a buffering-progress event.
    EmitBuffering { fraction: f64, buffered: Duration },
    /// Publish that an item played to its natural end. Does not itself carry
    /// a status transition; the orchestrator decides whether to advance.
    EmitFinished { item: NativeItemId },
    /// Publish a playback failure.
    EmitFailed { message: String },
}

/// The settled-status state machine.
#[derive(Debug)]
pub struct PlaybackStateMachine {
    status: PlaybackStatus,
}

impl PlaybackStateMachine {
    /// A fresh machine starts Stopped.
    pub fn new() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
        }
    }

    /// The current settled status.
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// Cadence implied by a settled status.
    pub fn cadence_for(status: PlaybackStatus) -> PollCadence {
        match status {
            PlaybackStatus::Playing => PollCadence::Fast,
            PlaybackStatus::Failed => PollCadence::Stopped,
            _ => PollCadence::Suspended,
        }
    }

    /// Force a status from the orchestrator side (play started, explicit
    /// stop, failure recovery). Deduplicated: forcing the current status
    /// returns no effects and publishes nothing.
    pub fn force(&mut self, status: PlaybackStatus) -> Vec<Effect> {
        self.transition(status)
    }

    fn transition(&mut self, status: PlaybackStatus) -> Vec<Effect> {
        if self.status == status {
            return Vec::new();
        }
        self.status = status;
        vec![Effect::Status(status), Effect::Poll(Self::cadence_for(status))]
    }

    /// Consume one native signal and return the effects to execute.
    pub fn apply(&mut self, signal: &EngineSignal) -> Vec<Effect> {
        match signal {
            EngineSignal::StateChanged {
                state,
                rate,
                position,
            } => self.apply_state(*state, *rate, *position),

            EngineSignal::RateChanged { rate } => {
                if *rate == 0.0 && self.status == PlaybackStatus::Playing {
                    // the transport changed out-of-band
                    self.transition(PlaybackStatus::Paused)
                } else {
                    Vec::new()
                }
            }

            EngineSignal::BufferingProgress { fraction, buffered } => {
                vec![Effect::EmitBuffering {
                    fraction: sanitize_fraction(*fraction),
                    buffered: *buffered,
                }]
            }

            EngineSignal::ItemEnded { item } => {
                vec![Effect::EmitFinished { item: *item }]
            }

            EngineSignal::ItemFailed { item: _, message } => {
                let mut effects = vec![Effect::EmitFailed {
                    message: message.clone(),
                }];
                effects.extend(self.transition(PlaybackStatus::Failed));
                effects
            }
        }
    }

    fn apply_state(&mut self, state: EngineState, rate: f32, position: Duration) -> Vec<Effect> {
        match state {
            EngineState::Idle => vec![Effect::Poll(PollCadence::Suspended)],
            EngineState::Opening => self.transition(PlaybackStatus::Loading),
            EngineState::Buffering => self.transition(PlaybackStatus::Buffering),
            EngineState::Playing => {
                if rate == 0.0 && position.is_zero() {
                    // "playing" with no motion: native quirk, nothing started
                    self.transition(PlaybackStatus::Stopped)
                } else {
                    self.transition(PlaybackStatus::Playing)
                }
            }
            EngineState::Paused => {
                if self.status == PlaybackStatus::Buffering {
                    // Paused is only reachable through Playing
                    Vec::new()
                } else {
                    self.transition(PlaybackStatus::Paused)
                }
            }
        }
    }
}

impl Default for PlaybackStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
