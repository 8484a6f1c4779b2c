//! Directory-backed cache store.

use super::backend::{CacheEntry, CacheStore};
use super::key::CacheKey;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

const ENTRY_EXT: &str = "json";

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: CacheKey,
    entry: CacheEntry,
}

/// One JSON file per entry, named by the SHA-256 of the key.
///
/// Entries survive restarts. Each write goes through its own temp file and a
/// rename, so a reader never sees a half-written entry and concurrent writers
/// of one key do not trip over each other; the last rename wins.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_str().as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        self.dir.join(format!("{}.{}", hash, ENTRY_EXT))
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut rd = fs::read_dir(&self.dir).await?;
        while let Some(dent) = rd.next_entry().await? {
            let path = dent.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXT) {
                files.push(path);
            }
        }
        Ok(files)
    }

    async fn read_stored(path: &Path) -> Result<Option<StoredEntry>> {
        match fs::read(path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(Self::read_stored(&self.path_for(key))
            .await?
            .filter(|stored| &stored.key == key)
            .map(|stored| stored.entry))
    }

    async fn save(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let raw = serde_json::to_vec(&StoredEntry {
            key: key.clone(),
            entry: entry.clone(),
        })?;
        let written = match fs::write(&tmp, raw).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self) -> Result<Vec<CacheKey>> {
        let mut keys = Vec::new();
        for path in self.entry_files().await? {
            match Self::read_stored(&path).await {
                Ok(Some(stored)) => keys.push(stored.key),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable cache file"),
            }
        }
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        for path in self.entry_files().await? {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn estimate_size(&self) -> Result<u64> {
        let mut total = 0;
        for path in self.entry_files().await? {
            if let Ok(meta) = fs::metadata(&path).await {
                total += meta.len();
            }
        }
        Ok(total)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
