//! Per-feed cursor storage.
//!
//! The store is a flat key-value map from feed URL to cursor (the link of the
//! newest relayed item).  Its key set is also the list of tracked feeds.  An
//! empty cursor means the feed has never been polled.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StoreError;

#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Every tracked feed URL.
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// The feed's cursor, or `None` if the feed is unknown.
    async fn get(&self, feed_url: &str) -> Result<Option<String>, StoreError>;

    async fn put(&self, feed_url: &str, cursor: &str) -> Result<(), StoreError>;
}

/// Start tracking every URL in `feed_urls` that the store does not know yet.
///
/// Known feeds keep their cursor.  Returns how many feeds were added.
pub async fn register_feeds(
    store: &dyn CursorStore,
    feed_urls: &[String],
) -> Result<usize, StoreError> {
    let mut added = 0;
    for url in feed_urls {
        if store.get(url).await?.is_none() {
            store.put(url, "").await?;
            info!(feed = %url, "tracking new feed");
            added += 1;
        }
    }
    Ok(added)
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Store backed by a JSON object on disk.
///
/// The whole map is rewritten on every `put` (write to a sibling temp file,
/// then rename) so a crash never leaves a half-written file behind.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Load the store at `path`.  A missing file is an empty store; the file
    /// and its parent directory are created on the first `put`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries: BTreeMap<String, String> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), feeds = entries.len(), "opened cursor store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CursorStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    async fn get(&self, feed_url: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().await.get(feed_url).cloned())
    }

    async fn put(&self, feed_url: &str, cursor: &str) -> Result<(), StoreError> {
        // Hold the lock across the write so concurrent puts hit the disk in
        // the same order they hit the map.
        let mut entries = self.entries.lock().await;
        entries.insert(feed_url.to_string(), cursor.to_string());
        self.persist(&entries).await
    }
}
