//! File-backed checkpoint store.
//!
//! One JSON file per (key, stage) under the checkpoint directory. Writes go
//! to a temporary sibling first and are renamed into place, so a concurrent
//! reader never sees a half-written record.

use super::{CheckpointStore, Stage};
use crate::error::{PratError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Checkpoint store persisting records as JSON files.
pub struct FsCheckpointStore {
    dir: PathBuf,
}

impl FsCheckpointStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created lazily on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, key: &str, stage: Stage) -> PathBuf {
        self.dir.join(format!("{}_{}.json", key, stage.as_str()))
    }
}

#[async_trait]
impl CheckpointStore for FsCheckpointStore {
    async fn save(&self, key: &str, stage: Stage, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.record_path(key, stage);
        let tmp = path.with_extension("json.tmp");

        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            // Leave no temp file behind if the swap failed.
            let _ = std::fs::remove_file(&tmp);
            PratError::Checkpoint(format!(
                "failed to replace record {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "Checkpoint record written");
        Ok(())
    }

    async fn load(&self, key: &str, stage: Stage) -> Result<Option<Vec<u8>>> {
        let path = self.record_path(key, stage);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(&path)?))
    }

    async fn remove_all(&self, key: &str) -> Result<usize> {
        // Exact per-stage paths only; a prefix scan could cross into another
        // key that happens to start with this one.
        let mut removed = 0;

        for stage in Stage::ALL {
            match std::fs::remove_file(self.record_path(key, stage)) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        store
            .save("linux_qa_2", Stage::Outline, b"{\"sections\":[]}")
            .await
            .unwrap();

        let loaded = store.load("linux_qa_2", Stage::Outline).await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"{\"sections\":[]}".as_slice()));
    }

    #[tokio::test]
    async fn test_load_missing_record_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        let loaded = store.load("linux_qa_2", Stage::Research).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_prior_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        store
            .save("linux_qa_2", Stage::Script, b"first")
            .await
            .unwrap();
        store
            .save("linux_qa_2", Stage::Script, b"second")
            .await
            .unwrap();

        let loaded = store.load("linux_qa_2", Stage::Script).await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"second".as_slice()));
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        store
            .save("linux_qa_2", Stage::Research, b"snippets")
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_remove_all_only_touches_matching_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        store
            .save("linux_qa_2", Stage::Research, b"a")
            .await
            .unwrap();
        store
            .save("linux_qa_2", Stage::Outline, b"b")
            .await
            .unwrap();
        store.save("rust_qa_2", Stage::Research, b"c").await.unwrap();

        let removed = store.remove_all("linux_qa_2").await.unwrap();
        assert_eq!(removed, 2);

        assert!(store
            .load("linux_qa_2", Stage::Research)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .load("rust_qa_2", Stage::Research)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_remove_all_spares_longer_key_sharing_a_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path());

        store.save("linux_qa_2", Stage::Research, b"a").await.unwrap();
        store
            .save("linux_qa_2_kernel_internals_qa_2", Stage::Research, b"b")
            .await
            .unwrap();

        let removed = store.remove_all("linux_qa_2").await.unwrap();
        assert_eq!(removed, 1);

        assert!(store
            .load("linux_qa_2_kernel_internals_qa_2", Stage::Research)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_remove_all_on_missing_dir_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsCheckpointStore::new(dir.path().join("never_created"));

        assert_eq!(store.remove_all("linux_qa_2").await.unwrap(), 0);
    }
}
