//! In-memory sink implementation

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::sink::DatabaseSink;
use crate::error::Result;
use crate::types::TrackRecord;

#[derive(Debug, Default)]
struct SourceEntry {
    staged: HashMap<u32, TrackRecord>,
    committed: HashMap<u32, TrackRecord>,
}

/// Track store that keeps everything in process memory.
///
/// Staged and committed records are held separately, so a reader only ever
/// sees listings that decoded to completion.
#[derive(Debug, Default)]
pub struct MemorySink {
    sources: Mutex<HashMap<String, SourceEntry>>,
}

impl MemorySink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed tracks for a source, in no particular order
    #[must_use]
    pub fn tracks(&self, source_uri: &str) -> Vec<TrackRecord> {
        let sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources
            .get(source_uri)
            .map(|entry| entry.committed.values().cloned().collect())
            .unwrap_or_default()
    }

    /// One committed track by item id
    #[must_use]
    pub fn track(&self, source_uri: &str, item_id: u32) -> Option<TrackRecord> {
        let sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources
            .get(source_uri)
            .and_then(|entry| entry.committed.get(&item_id).cloned())
    }

    /// Number of committed tracks for a source
    #[must_use]
    pub fn committed_len(&self, source_uri: &str) -> usize {
        let sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources
            .get(source_uri)
            .map_or(0, |entry| entry.committed.len())
    }

    /// Number of staged, not yet committed tracks for a source
    #[must_use]
    pub fn staged_len(&self, source_uri: &str) -> usize {
        let sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources
            .get(source_uri)
            .map_or(0, |entry| entry.staged.len())
    }
}

#[async_trait]
impl DatabaseSink for MemorySink {
    async fn register_source(&self, source_uri: &str) -> Result<()> {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources.entry(source_uri.to_string()).or_default();
        Ok(())
    }

    async fn insert_or_update_track(&self, source_uri: &str, track: TrackRecord) -> Result<()> {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        let entry = sources.entry(source_uri.to_string()).or_default();
        entry.staged.insert(track.item_id, track);
        Ok(())
    }

    async fn commit(&self, source_uri: &str) -> Result<()> {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = sources.get_mut(source_uri) {
            entry.committed.extend(entry.staged.drain());
        }
        Ok(())
    }

    async fn rollback(&self, source_uri: &str) -> Result<()> {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = sources.get_mut(source_uri) {
            entry.staged.clear();
        }
        Ok(())
    }

    async fn delete_all_for_source(&self, source_uri: &str) -> Result<()> {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources.remove(source_uri);
        Ok(())
    }
}
