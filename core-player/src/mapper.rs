//! # Native Item Mapper
//!
//! Maps logical media items onto native engine items, memoized by item
//! identity.
//!
//! Resolution is resolve-once: the first `resolve` for an identity runs the
//! source resolver (attaching the item's request headers) and creates the
//! native handle; every later call returns the cached handle without
//! reconstructing anything. Handles live until their item leaves the queue,
//! at which point `release` drops the cache entry and the engine resources
//! symmetrically.
//!
//! Identity, not the source locator, is the uniqueness key: duplicate
//! locators under distinct ids get distinct handles.

use crate::error::{PlayerError, Result};
use crate::queue::{MediaItem, MediaItemId};
use bridge_traits::engine::NativeItemId;
use bridge_traits::{BridgeError, NativeEngine, SourceResolver};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identity-keyed cache of native items.
pub struct NativeItemMapper {
    engine: Arc<dyn NativeEngine>,
    resolver: Arc<dyn SourceResolver>,
    handles: HashMap<MediaItemId, NativeItemId>,
}

impl NativeItemMapper {
    /// Create an empty mapper over the given bridges.
    pub fn new(engine: Arc<dyn NativeEngine>, resolver: Arc<dyn SourceResolver>) -> Self {
        Self {
            engine,
            resolver,
            handles: HashMap::new(),
        }
    }

    /// Resolve an item into a native handle, reusing the cached handle when
    /// the identity was resolved before.
    ///
    /// # Errors
    ///
    /// [`PlayerError::ResolutionFailed`] when the source resolver rejects the
    /// source, [`PlayerError::EngineFailure`] when the engine cannot create
    /// an item for the resolved locator.
    pub async fn resolve(&mut self, item: &MediaItem) -> Result<NativeItemId> {
        if let Some(handle) = self.handles.get(&item.id()) {
            return Ok(*handle);
        }

        let locator = self
            .resolver
            .resolve(item.source(), item.headers())
            .await
            .map_err(|e| match e {
                BridgeError::UnresolvableSource(msg) => PlayerError::ResolutionFailed(msg),
                other => PlayerError::ResolutionFailed(other.to_string()),
            })?;

        let handle = self
            .engine
            .create_item(locator)
            .await
            .map_err(|e| PlayerError::EngineFailure(e.to_string()))?;

        debug!(item = %item.id(), native = %handle, "resolved native item");
        self.handles.insert(item.id(), handle);
        Ok(handle)
    }

    /// Release the native handle for an identity. Safe to call for an item
    /// that was never resolved.
    pub async fn release(&mut self, id: MediaItemId) {
        if let Some(handle) = self.handles.remove(&id) {
            if let Err(e) = self.engine.release_item(handle).await {
                warn!(item = %id, error = %e, "failed to release native item");
            }
        }
    }

    /// Release every cached handle.
    pub async fn release_all(&mut self) {
        let ids: Vec<MediaItemId> = self.handles.keys().copied().collect();
        for id in ids {
            self.release(id).await;
        }
    }

    /// Release every cached handle except the one for `keep`.
    pub async fn release_all_except(&mut self, keep: MediaItemId) {
        let ids: Vec<MediaItemId> = self
            .handles
            .keys()
            .copied()
            .filter(|id| *id != keep)
            .collect();
        for id in ids {
            self.release(id).await;
        }
    }

    /// Whether a handle is cached for the identity.
    pub fn contains(&self, id: MediaItemId) -> bool {
        self.handles.contains_key(&id)
    }

    /// The cached handle for an identity, if any.
    pub fn get(&self, id: MediaItemId) -> Option<NativeItemId> {
        self.handles.get(&id).copied()
    }

    /// Reverse lookup: the logical identity a native handle belongs to.
    pub fn media_for(&self, handle: NativeItemId) -> Option<MediaItemId> {
        self.handles
            .iter()
            .find_map(|(id, h)| (*h == handle).then_some(*id))
    }

    /// Number of cached handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl std::fmt::Debug for NativeItemMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeItemMapper")
            .field("cached", &self.handles.len())
            .finish()
    }
}
