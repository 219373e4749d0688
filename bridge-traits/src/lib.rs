//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the core player and
//! platform-specific media engines. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, iOS, Android, web).
//!
//! ## Traits
//!
//! ### Playback
//! - [`NativeEngine`](engine::NativeEngine) - Queue-capable platform media
//!   engine: staged item list, transport control, seek with completion,
//!   volume/mute, and a typed [`EngineSignal`](engine::EngineSignal) stream
//!   replacing platform observer fan-out.
//!
//! ### Resolution & Metadata
//! - [`SourceResolver`](resolver::SourceResolver) - Turns logical sources
//!   plus request headers into engine-playable locators.
//! - [`MetadataService`](resolver::MetadataService) - Optional display
//!   metadata lookup; never required for playback to start.
//!
//! ## Signal Delivery
//!
//! Engines publish [`EngineSignal`](engine::EngineSignal)s on a
//! `tokio::sync::broadcast` channel. Signals may originate on any platform
//! notification thread; the core funnels them through a single serialization
//! point before mutating shared state. Implementations must never call back
//! into the core synchronously.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for
//! consistent error handling. Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., item ids, source descriptions)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks. Implementations must ensure thread safety.

pub mod engine;
pub mod error;
pub mod resolver;

pub use error::BridgeError;

// Re-export commonly used types
pub use engine::{EngineSignal, EngineState, NativeEngine, NativeItemId, PlayableLocator};
pub use resolver::{MediaMetadata, MediaSource, MetadataService, SourceResolver};
