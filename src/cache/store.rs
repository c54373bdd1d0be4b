//! Durable key to JSON document store.
//!
//! Timestamps are `chrono` values serialized as RFC 3339 and read back as
//! the same type, so a cached tree compares equal to a freshly fetched one.

use super::paths::BuildPaths;
use crate::constants::{ALL_ENTRIES_CACHE, BLOCK_ID_PAGE_ID_MAP_CACHE, DATABASE_CACHE};
use crate::error::{AppError, Result};
use crate::types::PageId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

/// Logical name of one cached document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKey<'a> {
    AllEntries,
    Database,
    BlockIndex,
    PageBlocks(&'a PageId),
    PageReferences(&'a PageId),
    Backlinks(&'a PageId),
}

#[derive(Debug, Clone)]
pub struct BuildCacheStore {
    paths: BuildPaths,
}

impl BuildCacheStore {
    pub fn new(paths: BuildPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &BuildPaths {
        &self.paths
    }

    pub fn path_for(&self, key: CacheKey<'_>) -> PathBuf {
        match key {
            CacheKey::AllEntries => self.paths.buildcache().join(ALL_ENTRIES_CACHE),
            CacheKey::Database => self.paths.buildcache().join(DATABASE_CACHE),
            CacheKey::BlockIndex => self.paths.buildcache().join(BLOCK_ID_PAGE_ID_MAP_CACHE),
            CacheKey::PageBlocks(page) => self.paths.page_blocks(page),
            CacheKey::PageReferences(page) => self.paths.page_references(page),
            CacheKey::Backlinks(page) => self.paths.backlinks(page),
        }
    }

    /// Writes `value` under `key`, replacing any previous document.
    pub async fn save<T: Serialize + ?Sized>(&self, key: CacheKey<'_>, value: &T) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(value).map_err(|source| AppError::JsonEncode {
            path: path.display().to_string(),
            source,
        })?;
        tokio::fs::write(&path, json).await?;
        log::debug!("Saved {}", path.display());
        Ok(())
    }

    /// `Ok(None)` when nothing is stored under `key`. A document that no
    /// longer parses is logged and treated the same way.
    pub async fn load<T: DeserializeOwned>(&self, key: CacheKey<'_>) -> Result<Option<T>> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Cache miss {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                log::debug!("Cache hit {}", path.display());
                Ok(Some(value))
            }
            Err(e) => {
                log::warn!("Discarding corrupt cache file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub async fn exists(&self, key: CacheKey<'_>) -> bool {
        tokio::fs::try_exists(self.path_for(key))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn store() -> (tempfile::TempDir, BuildCacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BuildCacheStore::new(BuildPaths::new(dir.path()));
        (dir, store)
    }

    #[tokio::test]
    async fn timestamps_come_back_as_timestamps() {
        let (_dir, store) = store();
        let stamp = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 15).unwrap()
            + chrono::Duration::milliseconds(250);
        store.save(CacheKey::Database, &vec![stamp]).await.unwrap();

        let loaded: Option<Vec<chrono::DateTime<Utc>>> =
            store.load(CacheKey::Database).await.unwrap();
        assert_eq!(loaded, Some(vec![stamp]));
    }

    #[tokio::test]
    async fn missing_is_distinct_from_empty() {
        let (_dir, store) = store();
        let missing: Option<Vec<u32>> = store.load(CacheKey::AllEntries).await.unwrap();
        assert_eq!(missing, None);

        store.save(CacheKey::AllEntries, &Vec::<u32>::new()).await.unwrap();
        let empty: Option<Vec<u32>> = store.load(CacheKey::AllEntries).await.unwrap();
        assert_eq!(empty, Some(vec![]));
    }

    #[tokio::test]
    async fn corrupt_documents_read_as_misses() {
        let (_dir, store) = store();
        let page = PageId::from_raw("0123456789abcdef0123456789abcdef");
        let path = store.path_for(CacheKey::PageBlocks(&page));
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let loaded: Option<Vec<u32>> = store.load(CacheKey::PageBlocks(&page)).await.unwrap();
        assert_eq!(loaded, None);
        assert!(store.exists(CacheKey::PageBlocks(&page)).await);
    }
}
