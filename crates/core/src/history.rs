//! Bounded record of the latest completed result per source reference.

use std::sync::Mutex;

use indexmap::IndexMap;
use serde::Serialize;

use crate::options::GenerationOptions;
use crate::render::GenerationResult;
use crate::types::SourceRef;

/// Default number of results kept before the oldest write is evicted.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// The options a result was rendered with, plus the result itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub options: GenerationOptions,
    pub result: GenerationResult,
}

/// Latest completed result per [`SourceRef`].
///
/// Entries are kept in write order. Recording a key again moves it to the
/// back; once `capacity` is exceeded the front (least recently written)
/// entry is dropped. Lookups do not change the order.
#[derive(Debug)]
pub struct History {
    entries: Mutex<IndexMap<SourceRef, HistoryEntry>>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Store `entry` under `key`, replacing any previous entry.
    pub fn record(&self, key: SourceRef, entry: HistoryEntry) {
        let mut entries = self.lock();
        entries.shift_remove(&key);
        entries.insert(key, entry);
        while entries.len() > self.capacity {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                tracing::debug!(source_ref = %evicted, "Evicted history entry");
            }
        }
    }

    /// A copy of the entry stored under `key`.
    pub fn get(&self, key: &SourceRef) -> Option<HistoryEntry> {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<SourceRef, HistoryEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
