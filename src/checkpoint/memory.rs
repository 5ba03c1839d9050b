//! In-memory checkpoint store.
//!
//! Used by tests and by callers that want resume-within-process semantics
//! without touching the filesystem.

use super::{CheckpointStore, Stage};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Checkpoint store keeping records in a process-local map.
pub struct MemoryCheckpointStore {
    records: RwLock<HashMap<(String, Stage), Vec<u8>>>,
}

impl MemoryCheckpointStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, key: &str, stage: Stage, bytes: &[u8]) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.insert((key.to_string(), stage), bytes.to_vec());
        Ok(())
    }

    async fn load(&self, key: &str, stage: Stage) -> Result<Option<Vec<u8>>> {
        let records = self.records.read().unwrap();
        Ok(records.get(&(key.to_string(), stage)).cloned())
    }

    async fn remove_all(&self, key: &str) -> Result<usize> {
        let mut records = self.records.write().unwrap();
        let before = records.len();
        records.retain(|(k, _), _| k != key);
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_overwrite() {
        let store = MemoryCheckpointStore::new();

        store.save("linux_qa_2", Stage::Outline, b"v1").await.unwrap();
        store.save("linux_qa_2", Stage::Outline, b"v2").await.unwrap();

        let loaded = store.load("linux_qa_2", Stage::Outline).await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"v2".as_slice()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_all_clears_one_key() {
        let store = MemoryCheckpointStore::new();

        store.save("linux_qa_2", Stage::Research, b"a").await.unwrap();
        store.save("linux_qa_2", Stage::Outline, b"b").await.unwrap();
        store.save("rust_qa_2", Stage::Research, b"c").await.unwrap();

        assert_eq!(store.remove_all("linux_qa_2").await.unwrap(), 2);
        assert_eq!(store.len(), 1);
    }
}
