//! # Player Error Types
//!
//! Error taxonomy for queue, mapping, and transport operations.
//!
//! Transport entry points (`play`, `pause`, `stop`, `seek`) never surface
//! these errors to callers directly; failures are recovered at the
//! orchestrator boundary into a `MediaFailed` event plus a forced `Stopped`
//! status. The types below flow between the internal components and are
//! returned only from operations documented to report synchronously (queue
//! `move_item`, rate/volume passthroughs, snapshot queries).

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during player operations.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// A source could not be resolved into a playable locator
    /// (bad URL, unsupported scheme, unknown library id).
    #[error("Failed to resolve source: {0}")]
    ResolutionFailed(String),

    /// The platform engine reported a failure for an item or operation.
    #[error("Native engine failure: {0}")]
    EngineFailure(String),

    /// A queue mutation was given an out-of-range index.
    #[error("Invalid queue operation: {0}")]
    InvalidQueueOperation(String),

    /// The native seek-completion callback did not arrive in time.
    /// Treated as completed (fail open); never surfaced as a `MediaFailed`.
    #[error("Seek did not complete within {0:?}")]
    SeekTimeout(std::time::Duration),

    /// Bridge-level error from a host implementation.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerError {
    /// Returns `true` if this error originated in source resolution.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            PlayerError::ResolutionFailed(_) | PlayerError::Bridge(BridgeError::UnresolvableSource(_))
        )
    }

    /// Returns `true` if this error is transient and the operation can be
    /// retried without reconfiguration.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlayerError::EngineFailure(_) | PlayerError::SeekTimeout(_)
        )
    }
}

/// Result type for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
