//! Direct source resolution for tests and demos.

use bridge_traits::engine::PlayableLocator;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::resolver::{MediaSource, SourceResolver};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Resolver that maps sources straight onto locators.
///
/// Remote URLs must use an `http`, `https`, or `file` scheme; anything else
/// is rejected as unresolvable, mirroring what a real resolution service
/// does with unsupported schemes. A blanket failure can be scripted with
/// [`fail_with`](Self::fail_with) to exercise error paths.
pub struct SimResolver {
    fail_message: Mutex<Option<String>>,
}

impl SimResolver {
    /// Create a resolver that accepts all well-formed sources.
    pub fn new() -> Self {
        Self {
            fail_message: Mutex::new(None),
        }
    }

    /// Make every subsequent resolution fail with `message`. Pass `None` to
    /// restore normal behavior.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.fail_message.lock() = message.map(str::to_string);
    }
}

impl Default for SimResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SourceResolver for SimResolver {
    async fn resolve(
        &self,
        source: &MediaSource,
        headers: &HashMap<String, String>,
    ) -> Result<PlayableLocator> {
        if let Some(message) = self.fail_message.lock().clone() {
            return Err(BridgeError::UnresolvableSource(message));
        }

        match source {
            MediaSource::Remote { url } => {
                let supported = ["http://", "https://", "file://"]
                    .iter()
                    .any(|scheme| url.starts_with(scheme));
                if !supported {
                    return Err(BridgeError::UnresolvableSource(format!(
                        "unsupported scheme: {url}"
                    )));
                }
                Ok(PlayableLocator::Url {
                    url: url.clone(),
                    headers: headers.clone(),
                })
            }
            MediaSource::Local { path } => Ok(PlayableLocator::File { path: path.clone() }),
        }
    }
}
