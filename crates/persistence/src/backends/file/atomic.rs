//! Crash-safe JSON file operations.
//!
//! Every write lands in a uniquely named temporary sibling first and is then
//! moved into place, so readers see either the old document or the new one,
//! never a torn write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;

use crate::error::StorageResult;

const JSON_EXTENSION: &str = "json";

/// A temporary file that is deleted on drop unless persisted.
struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    /// Writes `bytes` to a fresh temporary sibling of `target` and syncs it.
    async fn write(target: &Path, bytes: &[u8]) -> StorageResult<Self> {
        let parent = target.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent).await?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = parent.join(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ));

        let guard = Self { path, armed: true };
        let mut file = tokio::fs::File::create(&guard.path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(guard)
    }

    /// Moves the temporary file over `target`.
    async fn rename_to(mut self, target: &Path) -> StorageResult<()> {
        tokio::fs::rename(&self.path, target).await?;
        self.armed = false;
        Ok(())
    }

    /// Links the temporary file at `target` only if `target` does not exist.
    ///
    /// Returns `false` when `target` already exists.
    async fn link_new(self, target: &Path) -> StorageResult<bool> {
        match tokio::fs::hard_link(&self.path, target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
        // the temporary name is removed on drop either way
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Serializes `value` and atomically replaces `path` with it.
pub(crate) async fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    TempFile::write(path, &bytes).await?.rename_to(path).await
}

/// Serializes `value` to `path` only if no file exists there yet.
///
/// Returns `false` (and writes nothing) when `path` already exists.
pub(crate) async fn create_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<bool> {
    let bytes = serde_json::to_vec_pretty(value)?;
    TempFile::write(path, &bytes).await?.link_new(path).await
}

/// Reads one JSON document. A missing file reads as `None`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Reads every `*.json` document in `dir`, skipping temporary files.
///
/// A missing directory reads as empty. Order is unspecified.
pub(crate) async fn read_json_dir<T: DeserializeOwned>(dir: &Path) -> StorageResult<Vec<T>> {
    let mut out = Vec::new();
    for path in json_files(dir).await? {
        // a concurrent delete between listing and reading is not an error
        if let Some(value) = read_json(&path).await? {
            out.push(value);
        }
    }
    Ok(out)
}

/// Counts the `*.json` documents in `dir`.
pub(crate) async fn count_json(dir: &Path) -> StorageResult<u64> {
    Ok(json_files(dir).await?.len() as u64)
}

/// Deletes `path`. Returns `false` if it did not exist.
pub(crate) async fn remove_json(path: &Path) -> StorageResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

async fn json_files(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        let is_json = path.extension().is_some_and(|ext| ext == JSON_EXTENSION);
        if is_json && !hidden {
            files.push(path);
        }
    }
    Ok(files)
}
