//! Source resolution and metadata lookup contracts.
//!
//! The core never opens URLs or touches the filesystem itself. A host
//! [`SourceResolver`] turns a logical [`MediaSource`] plus per-item request
//! headers into a [`PlayableLocator`] the engine can load, and an optional
//! [`MetadataService`] enriches item metadata after playback has started.
//! Metadata lookup is best-effort; playback never waits for it.

use crate::engine::PlayableLocator;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Logical location of a media item before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSource {
    /// Remote HTTP(S) resource.
    Remote { url: String },
    /// File available on the local filesystem.
    Local { path: PathBuf },
}

impl MediaSource {
    /// Returns `true` if the source requires network access.
    pub fn is_remote(&self) -> bool {
        matches!(self, MediaSource::Remote { .. })
    }

    /// Returns `true` if the media is available locally.
    pub fn is_local(&self) -> bool {
        matches!(self, MediaSource::Local { .. })
    }

    /// Human-readable description used in log and error messages.
    pub fn describe(&self) -> String {
        match self {
            MediaSource::Remote { url } => url.clone(),
            MediaSource::Local { path } => path.display().to_string(),
        }
    }
}

/// Display metadata attached to a media item.
///
/// Hosts may surface these fields in platform media sessions or notification
/// center entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Display title for the item.
    pub title: Option<String>,
    /// Display artist string.
    pub artist: Option<String>,
    /// Album or collection name.
    pub album: Option<String>,
    /// Artwork location (URL or local path).
    pub art_uri: Option<String>,
    /// Track number within the album, when known.
    pub track_number: Option<u32>,
    /// Arbitrary extra fields (e.g., genre, year).
    pub extra: HashMap<String, String>,
}

impl MediaMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Attach an artist.
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Attach an album name.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Attach an artwork location.
    pub fn with_art_uri(mut self, uri: impl Into<String>) -> Self {
        self.art_uri = Some(uri.into());
        self
    }

    /// Attach a track number.
    pub fn with_track_number(mut self, number: u32) -> Self {
        self.track_number = Some(number);
        self
    }

    /// Fill any unset fields from `other`, leaving set fields untouched.
    /// Used when enriching already-queued items without clobbering
    /// caller-supplied metadata.
    pub fn merge_missing(&mut self, other: MediaMetadata) {
        if self.title.is_none() {
            self.title = other.title;
        }
        if self.artist.is_none() {
            self.artist = other.artist;
        }
        if self.album.is_none() {
            self.album = other.album;
        }
        if self.art_uri.is_none() {
            self.art_uri = other.art_uri;
        }
        if self.track_number.is_none() {
            self.track_number = other.track_number;
        }
        for (key, value) in other.extra {
            self.extra.entry(key).or_insert(value);
        }
    }
}

/// Resolves a logical media source into an engine-playable locator.
///
/// Resolution happens at most once per queued item; the result is memoized by
/// the core. Implementations may rewrite URLs, sign requests, or map library
/// identifiers onto storage paths. Failures are reported as
/// [`BridgeError::UnresolvableSource`](crate::error::BridgeError::UnresolvableSource).
#[async_trait::async_trait]
pub trait SourceResolver: Send + Sync {
    /// Produce a playable locator for `source`, attaching `headers` to remote
    /// requests.
    async fn resolve(
        &self,
        source: &MediaSource,
        headers: &HashMap<String, String>,
    ) -> Result<PlayableLocator>;
}

/// Optional metadata lookup for queued items.
///
/// Never required for playback to start; the core invokes it after a play has
/// been issued and merges the result into the queued item.
#[async_trait::async_trait]
pub trait MetadataService: Send + Sync {
    /// Look up display metadata for a source.
    async fn lookup(&self, source: &MediaSource) -> Result<MediaMetadata>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_classification() {
        let remote = MediaSource::Remote {
            url: "https://example.com/a.mp3".to_string(),
        };
        assert!(remote.is_remote());
        assert!(!remote.is_local());

        let local = MediaSource::Local {
            path: PathBuf::from("/music/a.mp3"),
        };
        assert!(local.is_local());
    }

    #[test]
    fn metadata_merge_keeps_existing_fields() {
        let mut base = MediaMetadata::new().with_title("Known Title");
        let looked_up = MediaMetadata::new()
            .with_title("Other Title")
            .with_artist("Artist")
            .with_track_number(7);

        base.merge_missing(looked_up);

        assert_eq!(base.title.as_deref(), Some("Known Title"));
        assert_eq!(base.artist.as_deref(), Some("Artist"));
        assert_eq!(base.track_number, Some(7));
    }

    #[test]
    fn metadata_merge_extra_does_not_overwrite() {
        let mut base = MediaMetadata::new();
        base.extra.insert("genre".to_string(), "jazz".to_string());

        let mut other = MediaMetadata::new();
        other.extra.insert("genre".to_string(), "rock".to_string());
        other.extra.insert("year".to_string(), "1999".to_string());

        base.merge_missing(other);

        assert_eq!(base.extra.get("genre").map(String::as_str), Some("jazz"));
        assert_eq!(base.extra.get("year").map(String::as_str), Some("1999"));
    }
}
