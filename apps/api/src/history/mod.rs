// History: past analyses kept as one JSON array under a single storage key.
// Best-effort by contract: reads degrade to an empty list, write failures are logged and dropped.

pub mod handlers;
pub mod session;
pub mod store;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::models::analysis::HistoryItem;
use store::KeyValueStore;

/// Storage key of the history slot.
pub const DEFAULT_STORAGE_KEY: &str = "ux-research-history";

#[derive(Clone)]
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    /// Serializes read-modify-write cycles on the single slot.
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Persisted list in stored order. Missing, corrupt or unreachable data yields an empty list.
    pub async fn load(&self) -> Vec<HistoryItem> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("History read failed, using empty list: {e}");
                return Vec::new();
            }
        };
        decode_history(&raw)
    }

    /// Writes the full list. Failures are swallowed.
    pub async fn save(&self, items: &[HistoryItem]) {
        let raw = match serde_json::to_string(items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("History serialization failed: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &raw).await {
            warn!("History write failed, change not persisted: {e}");
        }
    }

    /// Prepends a new item and persists the list.
    pub async fn record(&self, item: HistoryItem) {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await;
        items.insert(0, item);
        self.save(&items).await;
    }

    /// Removes exactly the item with `id`. Returns it if it existed.
    pub async fn remove(&self, id: &str) -> Option<HistoryItem> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.load().await;
        let index = items.iter().position(|item| item.id == id)?;
        let removed = items.remove(index);
        self.save(&items).await;
        Some(removed)
    }

    pub async fn get(&self, id: &str) -> Option<HistoryItem> {
        self.load().await.into_iter().find(|item| item.id == id)
    }

    /// Items ordered newest-first for display.
    pub async fn list(&self) -> Vec<HistoryItem> {
        newest_first(self.load().await)
    }
}

fn decode_history(raw: &str) -> Vec<HistoryItem> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        // Entries decode independently; unreadable ones are skipped.
        Ok(serde_json::Value::Array(entries)) => entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping unreadable history entry {index}: {e}");
                    None
                }
            })
            .collect(),
        Ok(_) => {
            warn!("History slot is not an array, using empty list");
            Vec::new()
        }
        Err(e) => {
            warn!("History slot is not valid JSON, using empty list: {e}");
            Vec::new()
        }
    }
}

/// Stable sort by creation time, newest first.
pub fn newest_first(mut items: Vec<HistoryItem>) -> Vec<HistoryItem> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}
