//! # Media Items & Playback Queue
//!
//! The logical, insertion-ordered list of media items the player works
//! through, with a non-destructive shuffle and a current pointer.
//!
//! ## Ordering Model
//!
//! Two orders coexist:
//!
//! - **Storage order**: the insertion-ordered item list. Indices in the
//!   public API (`remove_at`, `move_item`) refer to this order.
//! - **Traversal order**: the sequence `next()`/`previous()` walk. Equal to
//!   storage order until shuffle is enabled; shuffling replaces only the
//!   traversal permutation and never reorders storage, so disabling shuffle
//!   restores the original traversal exactly.
//!
//! ## Notifications
//!
//! Every mutation emits exactly one structural [`QueueEvent`] on the player
//! bus; batched operations (`add_range`, `clear`) emit one event for the
//! whole batch. Movements of the current pointer additionally emit
//! `CurrentChanged`.

use bridge_traits::{MediaMetadata, MediaSource};
use core_runtime::events::{EventBus, PlayerEvent, QueueEvent};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

/// Stable identity of a queued media item.
///
/// Identity, not the source locator, is the uniqueness key: two queue slots
/// referencing the same URL under different ids are distinct items and map to
/// distinct native handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItemId(Uuid);

impl MediaItemId {
    /// Generate a new random item identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identity from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MediaItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MediaItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of media an item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaKind {
    #[default]
    Audio,
    Video,
}

/// One playable entry in the queue.
///
/// Immutable once queued, except for metadata enrichment through
/// [`MediaQueue::enrich_metadata`]. Request headers are fixed at creation and
/// attached to the native handle when the item is first resolved; changing
/// them later has no effect (resolve-once semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    id: MediaItemId,
    source: MediaSource,
    headers: HashMap<String, String>,
    metadata: MediaMetadata,
    kind: MediaKind,
}

impl MediaItem {
    /// Create an item for a remote URL.
    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            id: MediaItemId::new(),
            source: MediaSource::Remote { url: url.into() },
            headers: HashMap::new(),
            metadata: MediaMetadata::default(),
            kind: MediaKind::Audio,
        }
    }

    /// Create an item for a local file.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            id: MediaItemId::new(),
            source: MediaSource::Local { path: path.into() },
            headers: HashMap::new(),
            metadata: MediaMetadata::default(),
            kind: MediaKind::Audio,
        }
    }

    /// Attach request headers to send when loading the source.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Attach display metadata.
    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set the media kind (default audio).
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    /// The item's stable identity.
    pub fn id(&self) -> MediaItemId {
        self.id
    }

    /// The item's logical source.
    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    /// Request headers for remote loading.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Display metadata.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Media kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Returns `true` when the item is available without network access.
    pub fn is_local(&self) -> bool {
        self.source.is_local()
    }
}

/// Insertion-ordered playback queue with a decoupled traversal order.
pub struct MediaQueue {
    items: Vec<MediaItem>,
    order: Vec<MediaItemId>,
    current: Option<usize>,
    shuffled: bool,
    allow_duplicates: bool,
    bus: EventBus,
}

impl MediaQueue {
    /// Create an empty queue publishing events on `bus`.
    pub fn new(bus: EventBus, allow_duplicates: bool) -> Self {
        Self {
            items: Vec::new(),
            order: Vec::new(),
            current: None,
            shuffled: false,
            allow_duplicates,
            bus,
        }
    }

    fn emit(&self, event: QueueEvent) {
        self.bus.emit(PlayerEvent::Queue(event)).ok();
    }

    fn emit_current_changed(&self) {
        self.emit(QueueEvent::CurrentChanged {
            index: self.current,
            id: self.current.map(|i| *self.order[i].as_uuid()),
        });
    }

    /// Append one item. Silently ignores a duplicate identity unless
    /// duplicates were explicitly permitted at construction.
    pub fn add(&mut self, item: MediaItem) {
        let added = self.push_item(item);
        if let Some(id) = added {
            self.emit(QueueEvent::ItemsAdded {
                ids: vec![*id.as_uuid()],
            });
            self.ensure_current();
        }
    }

    /// Append several items, emitting a single notification for the batch.
    pub fn add_range(&mut self, items: impl IntoIterator<Item = MediaItem>) {
        let mut added = Vec::new();
        for item in items {
            if let Some(id) = self.push_item(item) {
                added.push(*id.as_uuid());
            }
        }
        if !added.is_empty() {
            self.emit(QueueEvent::ItemsAdded { ids: added });
            self.ensure_current();
        }
    }

    fn push_item(&mut self, item: MediaItem) -> Option<MediaItemId> {
        if !self.allow_duplicates && self.contains(item.id()) {
            debug!(item = %item.id(), "ignoring duplicate queue add");
            return None;
        }
        let id = item.id();
        self.items.push(item);
        self.order.push(id);
        Some(id)
    }

    // The pointer becomes valid as soon as the queue is non-empty.
    fn ensure_current(&mut self) {
        if self.current.is_none() && !self.order.is_empty() {
            self.current = Some(0);
            self.emit_current_changed();
        }
    }

    /// Remove the item at storage index `index`. Out-of-range indices are a
    /// silent no-op.
    pub fn remove_at(&mut self, index: usize) {
        if index >= self.items.len() {
            debug!(index, len = self.items.len(), "ignoring out-of-range remove");
            return;
        }

        let removed = self.items.remove(index);
        let id = removed.id();

        let traversal_pos = self.order.iter().position(|o| *o == id);
        if let Some(pos) = traversal_pos {
            self.order.remove(pos);
            let current_changed = match self.current {
                Some(cur) if pos < cur => {
                    self.current = Some(cur - 1);
                    false
                }
                Some(cur) if pos == cur => {
                    if self.order.is_empty() {
                        self.current = None;
                    } else {
                        self.current = Some(cur.min(self.order.len() - 1));
                    }
                    true
                }
                _ => false,
            };

            self.emit(QueueEvent::ItemRemoved {
                id: *id.as_uuid(),
                index,
            });
            if current_changed {
                self.emit_current_changed();
            }
        }
    }

    /// Move an item between storage slots.
    ///
    /// # Errors
    ///
    /// Unlike the other mutations, an out-of-range `from` or `to` is reported
    /// synchronously as [`PlayerError::InvalidQueueOperation`].
    pub fn move_item(&mut self, from: usize, to: usize) -> crate::error::Result<()> {
        if from >= self.items.len() || to >= self.items.len() {
            return Err(crate::error::PlayerError::InvalidQueueOperation(format!(
                "move {from} -> {to} outside queue of length {}",
                self.items.len()
            )));
        }
        if from == to {
            return Ok(());
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);

        if !self.shuffled {
            let current_id = self.current.map(|i| self.order[i]);
            self.order = self.items.iter().map(|i| i.id()).collect();
            self.current = current_id.and_then(|id| self.order.iter().position(|o| *o == id));
        }

        self.emit(QueueEvent::ItemMoved { from, to });
        Ok(())
    }

    /// Remove everything and reset the pointer. Emits a single `Reset`.
    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.order.clear();
        self.current = None;
        self.emit(QueueEvent::Reset);
    }

    /// Toggle shuffle. Enabling produces a fresh traversal permutation with
    /// the current item first; disabling restores insertion traversal with
    /// the pointer following the current item. Storage order is never
    /// touched.
    pub fn set_shuffled(&mut self, shuffled: bool) {
        if self.shuffled == shuffled {
            return;
        }
        self.shuffled = shuffled;

        let current_id = self.current.map(|i| self.order[i]);

        if shuffled {
            self.order.shuffle(&mut rand::thread_rng());
            if let Some(id) = current_id {
                if let Some(pos) = self.order.iter().position(|o| *o == id) {
                    self.order.swap(0, pos);
                }
                self.current = Some(0);
            }
        } else {
            self.order = self.items.iter().map(|i| i.id()).collect();
            self.current = current_id.and_then(|id| self.order.iter().position(|o| *o == id));
        }

        self.emit(QueueEvent::ShuffleChanged { shuffled });
    }

    /// Whether traversal is currently shuffled.
    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// The current item, if the queue is non-empty.
    pub fn current(&self) -> Option<&MediaItem> {
        self.current.and_then(|i| self.item_by_id(self.order[i]))
    }

    /// Traversal position of the current item.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Whether a call to `next()` would yield an item. Pure function of the
    /// pointer and length; never blocks.
    pub fn has_next(&self) -> bool {
        match self.current {
            Some(i) => i + 1 < self.order.len(),
            None => false,
        }
    }

    /// Whether a call to `previous()` would yield an item.
    pub fn has_previous(&self) -> bool {
        matches!(self.current, Some(i) if i > 0)
    }

    /// Advance the pointer and return the new current item.
    pub fn next(&mut self) -> Option<MediaItem> {
        let current = self.current?;
        if current + 1 >= self.order.len() {
            return None;
        }
        self.current = Some(current + 1);
        self.emit_current_changed();
        self.current().cloned()
    }

    /// Step the pointer back and return the new current item.
    pub fn previous(&mut self) -> Option<MediaItem> {
        let current = self.current?;
        if current == 0 {
            return None;
        }
        self.current = Some(current - 1);
        self.emit_current_changed();
        self.current().cloned()
    }

    /// The item after the current one in traversal order, without moving the
    /// pointer.
    pub fn peek_next(&self) -> Option<&MediaItem> {
        match self.current {
            Some(i) if i + 1 < self.order.len() => self.item_by_id(self.order[i + 1]),
            _ => None,
        }
    }

    /// The item before the current one in traversal order, without moving
    /// the pointer.
    pub fn peek_previous(&self) -> Option<&MediaItem> {
        match self.current {
            Some(i) if i > 0 => self.item_by_id(self.order[i - 1]),
            _ => None,
        }
    }

    /// Point the pointer at a specific queued item. Returns `false` when the
    /// id is not queued.
    pub fn set_current(&mut self, id: MediaItemId) -> bool {
        match self.order.iter().position(|o| *o == id) {
            Some(pos) => {
                if self.current != Some(pos) {
                    self.current = Some(pos);
                    self.emit_current_changed();
                }
                true
            }
            None => false,
        }
    }

    /// Items from the current one through the end of traversal order.
    pub fn traversal_from_current(&self) -> Vec<MediaItem> {
        match self.current {
            Some(i) => self.order[i..]
                .iter()
                .filter_map(|id| self.item_by_id(*id))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    /// Merge looked-up metadata into a queued item, filling only unset
    /// fields. Emits `ItemUpdated` when the item exists.
    pub fn enrich_metadata(&mut self, id: MediaItemId, metadata: MediaMetadata) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id() == id) {
            item.metadata.merge_missing(metadata);
            self.emit(QueueEvent::ItemUpdated { id: *id.as_uuid() });
        }
    }

    fn item_by_id(&self, id: MediaItemId) -> Option<&MediaItem> {
        self.items.iter().find(|i| i.id() == id)
    }

    /// Item at storage index `index`.
    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    /// Look up a queued item by identity.
    pub fn find(&self, id: MediaItemId) -> Option<&MediaItem> {
        self.item_by_id(id)
    }

    /// Whether the identity is queued.
    pub fn contains(&self, id: MediaItemId) -> bool {
        self.items.iter().any(|i| i.id() == id)
    }

    /// All items in storage (insertion) order.
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Item identities in traversal order.
    pub fn traversal_ids(&self) -> &[MediaItemId] {
        &self.order
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl std::fmt::Debug for MediaQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaQueue")
            .field("len", &self.items.len())
            .field("current", &self.current)
            .field("shuffled", &self.shuffled)
            .finish()
    }
}
