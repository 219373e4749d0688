//! # Media Player Core
//!
//! Platform-agnostic playback queue and state-reconciliation engine.
//!
//! ## Overview
//!
//! This crate provides the logical player that multiplexes native platform
//! media engines behind one API:
//! - Ordered playback queue with non-destructive shuffle
//! - Identity-keyed mapping of logical items onto native engine items
//! - Normalization of native transport signals into one settled status
//!   state machine
//! - Progress polling gated by status, volume mirroring, and a typed event
//!   stream
//!
//! The platform itself is reached through the `bridge-traits` contracts;
//! decoding and rendering stay entirely inside the native engine.

pub mod error;
pub mod mapper;
pub mod player;
pub mod queue;
pub mod state;
pub mod volume;

pub use error::{PlayerError, Result};
pub use mapper::NativeItemMapper;
pub use player::MediaPlayer;
pub use queue::{MediaItem, MediaItemId, MediaKind, MediaQueue};
pub use state::{PlaybackStateMachine, PlaybackStatus, PollCadence, ProgressSample};
pub use volume::VolumeManager;

// Bridge-level types that appear in this crate's public API surface.
pub use bridge_traits::{MediaMetadata, MediaSource};
