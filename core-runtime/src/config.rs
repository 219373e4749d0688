//! # Player Configuration Module
//!
//! Provides configuration management for the media playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `PlayerConfig` instance that holds all injected bridges and tunables the
//! player needs. It enforces fail-fast validation so a missing capability is
//! reported at construction time with an actionable message, not at first
//! use.
//!
//! ## Required Dependencies
//!
//! - `NativeEngine` - the platform media engine binding
//! - `SourceResolver` - turns logical sources into playable locators
//!
//! ## Optional Dependencies
//!
//! - `MetadataService` - best-effort metadata enrichment
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::PlayerConfig;
//! use std::sync::Arc;
//!
//! let config = PlayerConfig::builder()
//!     .engine(Arc::new(MyEngine::new()))
//!     .resolver(Arc::new(MyResolver))
//!     .max_volume(100)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{MetadataService, NativeEngine, SourceResolver};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum volume level.
pub const DEFAULT_MAX_VOLUME: u32 = 100;

/// Default progress polling interval while playing (~20 samples/second).
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(50);

/// Default bound on waiting for native seek completion. On expiry the seek
/// is treated as completed (fail open) rather than blocking the transport.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for one player instance.
///
/// Holds the injected platform bridges plus tunables. Use
/// [`PlayerConfigBuilder`] to construct instances; `build()` validates
/// everything up front.
#[derive(Clone)]
pub struct PlayerConfig {
    /// Platform media engine binding (required).
    pub engine: Arc<dyn NativeEngine>,

    /// Source resolution service (required).
    pub resolver: Arc<dyn SourceResolver>,

    /// Optional metadata enrichment service.
    pub metadata_service: Option<Arc<dyn MetadataService>>,

    /// Maximum volume level; levels are expressed in `0..=max_volume`.
    pub max_volume: u32,

    /// Progress polling interval while status is Playing.
    pub progress_interval: Duration,

    /// Bound on waiting for native seek completion.
    pub seek_timeout: Duration,

    /// Event bus buffer size per subscriber.
    pub event_buffer: usize,

    /// Whether the queue accepts the same item identity more than once.
    pub allow_duplicates: bool,
}

impl std::fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("engine", &"NativeEngine { ... }")
            .field("resolver", &"SourceResolver { ... }")
            .field(
                "metadata_service",
                &self
                    .metadata_service
                    .as_ref()
                    .map(|_| "MetadataService { ... }"),
            )
            .field("max_volume", &self.max_volume)
            .field("progress_interval", &self.progress_interval)
            .field("seek_timeout", &self.seek_timeout)
            .field("event_buffer", &self.event_buffer)
            .field("allow_duplicates", &self.allow_duplicates)
            .finish()
    }
}

impl PlayerConfig {
    /// Creates a new builder for constructing a `PlayerConfig`.
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Maximum volume is non-zero
    /// - The progress interval is within a usable range
    /// - The seek timeout is within a usable range
    /// - The event buffer can hold at least a handful of events
    pub fn validate(&self) -> Result<()> {
        if self.max_volume == 0 {
            return Err(Error::Config(
                "Maximum volume must be greater than 0".to_string(),
            ));
        }

        if self.progress_interval < Duration::from_millis(10)
            || self.progress_interval > Duration::from_secs(1)
        {
            return Err(Error::Config(
                "Progress interval must be between 10ms and 1s".to_string(),
            ));
        }

        if self.seek_timeout < Duration::from_millis(100)
            || self.seek_timeout > Duration::from_secs(60)
        {
            return Err(Error::Config(
                "Seek timeout must be between 100ms and 60s".to_string(),
            ));
        }

        if self.event_buffer < 8 {
            return Err(Error::Config(
                "Event buffer must hold at least 8 events".to_string(),
            ));
        }

        Ok(())
    }
}

fn engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NativeEngine".to_string(),
        message: "No media engine binding provided. \
                 Inject the platform adapter for your target \
                 (AVQueuePlayer-backed on Apple platforms, playback-list-backed on Windows), \
                 or use bridge-sim for tests."
            .to_string(),
    }
}

fn resolver_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "SourceResolver".to_string(),
        message: "No source resolver provided. \
                 Inject an implementation that maps item sources and request headers \
                 onto playable locators."
            .to_string(),
    }
}

/// Builder for [`PlayerConfig`].
#[derive(Default)]
pub struct PlayerConfigBuilder {
    engine: Option<Arc<dyn NativeEngine>>,
    resolver: Option<Arc<dyn SourceResolver>>,
    metadata_service: Option<Arc<dyn MetadataService>>,
    max_volume: Option<u32>,
    progress_interval: Option<Duration>,
    seek_timeout: Option<Duration>,
    event_buffer: Option<usize>,
    allow_duplicates: bool,
}

impl PlayerConfigBuilder {
    /// Sets the platform engine binding (required).
    pub fn engine(mut self, engine: Arc<dyn NativeEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the source resolver (required).
    pub fn resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the optional metadata service.
    pub fn metadata_service(mut self, service: Arc<dyn MetadataService>) -> Self {
        self.metadata_service = Some(service);
        self
    }

    /// Sets the maximum volume level (default 100).
    pub fn max_volume(mut self, max_volume: u32) -> Self {
        self.max_volume = Some(max_volume);
        self
    }

    /// Sets the progress polling interval while playing (default 50ms).
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// Sets the seek completion timeout (default 5s).
    pub fn seek_timeout(mut self, timeout: Duration) -> Self {
        self.seek_timeout = Some(timeout);
        self
    }

    /// Sets the event bus buffer size (default 100).
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = Some(capacity);
        self
    }

    /// Permits queuing the same item identity more than once (default off).
    pub fn allow_duplicates(mut self, allow: bool) -> Self {
        self.allow_duplicates = allow;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when a required bridge was not
    /// provided, or [`Error::Config`] when a tunable is out of range.
    pub fn build(self) -> Result<PlayerConfig> {
        let engine = self.engine.ok_or_else(engine_missing_error)?;
        let resolver = self.resolver.ok_or_else(resolver_missing_error)?;

        let config = PlayerConfig {
            engine,
            resolver,
            metadata_service: self.metadata_service,
            max_volume: self.max_volume.unwrap_or(DEFAULT_MAX_VOLUME),
            progress_interval: self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL),
            seek_timeout: self.seek_timeout.unwrap_or(DEFAULT_SEEK_TIMEOUT),
            event_buffer: self
                .event_buffer
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            allow_duplicates: self.allow_duplicates,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::engine::{EngineSignal, NativeItemId, PlayableLocator};
    use bridge_traits::{MediaSource, NativeEngine, SourceResolver};
    use std::collections::HashMap;
    use tokio::sync::broadcast;

    struct NullEngine {
        signals: broadcast::Sender<EngineSignal>,
    }

    impl NullEngine {
        fn new() -> Self {
            let (signals, _) = broadcast::channel(8);
            Self { signals }
        }
    }

    #[async_trait::async_trait]
    impl NativeEngine for NullEngine {
        fn signals(&self) -> broadcast::Receiver<EngineSignal> {
            self.signals.subscribe()
        }

        async fn create_item(
            &self,
            _locator: PlayableLocator,
        ) -> bridge_traits::error::Result<NativeItemId> {
            Ok(NativeItemId::new())
        }

        async fn release_item(&self, _item: NativeItemId) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn enqueue(&self, _item: NativeItemId) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn replace_queue(
            &self,
            _items: Vec<NativeItemId>,
        ) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn advance(&self) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn current_item(&self) -> bridge_traits::error::Result<Option<NativeItemId>> {
            Ok(None)
        }

        async fn play(&self) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn pause(&self) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn seek(&self, _position: Duration) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn position(&self) -> bridge_traits::error::Result<Duration> {
            Ok(Duration::ZERO)
        }

        async fn duration(&self) -> bridge_traits::error::Result<Option<Duration>> {
            Ok(None)
        }

        async fn buffered(&self) -> bridge_traits::error::Result<Duration> {
            Ok(Duration::ZERO)
        }

        async fn rate(&self) -> bridge_traits::error::Result<f32> {
            Ok(0.0)
        }

        async fn set_rate(&self, _rate: f32) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn volume(&self) -> bridge_traits::error::Result<f32> {
            Ok(1.0)
        }

        async fn set_volume(&self, _volume: f32) -> bridge_traits::error::Result<()> {
            Ok(())
        }

        async fn muted(&self) -> bridge_traits::error::Result<bool> {
            Ok(false)
        }

        async fn set_muted(&self, _muted: bool) -> bridge_traits::error::Result<()> {
            Ok(())
        }
    }

    struct NullResolver;

    #[async_trait::async_trait]
    impl SourceResolver for NullResolver {
        async fn resolve(
            &self,
            source: &MediaSource,
            headers: &HashMap<String, String>,
        ) -> bridge_traits::error::Result<PlayableLocator> {
            let _ = source;
            Ok(PlayableLocator::Url {
                url: "https://example.com".to_string(),
                headers: headers.clone(),
            })
        }
    }

    #[test]
    fn build_requires_engine() {
        let err = PlayerConfig::builder()
            .resolver(Arc::new(NullResolver))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityMissing { ref capability, .. } if capability == "NativeEngine"));
    }

    #[test]
    fn build_requires_resolver() {
        let err = PlayerConfig::builder()
            .engine(Arc::new(NullEngine::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::CapabilityMissing { ref capability, .. } if capability == "SourceResolver"));
    }

    #[test]
    fn build_applies_defaults() {
        let config = PlayerConfig::builder()
            .engine(Arc::new(NullEngine::new()))
            .resolver(Arc::new(NullResolver))
            .build()
            .unwrap();

        assert_eq!(config.max_volume, DEFAULT_MAX_VOLUME);
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(config.seek_timeout, DEFAULT_SEEK_TIMEOUT);
        assert!(!config.allow_duplicates);
    }

    #[test]
    fn build_rejects_out_of_range_tunables() {
        let err = PlayerConfig::builder()
            .engine(Arc::new(NullEngine::new()))
            .resolver(Arc::new(NullResolver))
            .progress_interval(Duration::from_secs(10))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = PlayerConfig::builder()
            .engine(Arc::new(NullEngine::new()))
            .resolver(Arc::new(NullResolver))
            .max_volume(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
