//! On-disk layout of the build folders.
//!
//! `buildcache/` lives for one build and is removed at the end. `tmp/`
//! survives between builds and holds everything the staleness checks rely
//! on.

use crate::constants::*;
use crate::error::Result;
use crate::types::PageId;
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPaths {
    root: PathBuf,
}

impl BuildPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn buildcache(&self) -> PathBuf {
        self.root.join(BUILDCACHE_DIR)
    }

    pub fn tmp(&self) -> PathBuf {
        self.root.join(TMP_DIR)
    }

    pub fn blocks_json(&self) -> PathBuf {
        self.tmp().join(BLOCKS_JSON_DIR)
    }

    pub fn references_in_page(&self) -> PathBuf {
        self.blocks_json().join(REFERENCES_IN_PAGE_DIR)
    }

    pub fn references_to_page(&self) -> PathBuf {
        self.blocks_json().join(REFERENCES_TO_PAGE_DIR)
    }

    pub fn rss_cache(&self) -> PathBuf {
        self.tmp().join(RSS_CACHE_DIR)
    }

    pub fn blocks_html_cache(&self) -> PathBuf {
        self.tmp().join(BLOCKS_HTML_CACHE_DIR)
    }

    pub fn references_html_cache(&self) -> PathBuf {
        self.blocks_html_cache().join(REFERENCES_HTML_CACHE_DIR)
    }

    pub fn public_notion(&self) -> PathBuf {
        self.root.join(PUBLIC_NOTION_DIR)
    }

    pub fn build_start_timestamp(&self) -> PathBuf {
        self.tmp().join(BUILD_START_TIMESTAMP_FILE)
    }

    pub fn page_blocks(&self, page: &PageId) -> PathBuf {
        self.blocks_json().join(format!("{}.json", page))
    }

    pub fn page_references(&self, page: &PageId) -> PathBuf {
        self.references_in_page().join(format!("{}.json", page))
    }

    pub fn backlinks(&self, page: &PageId) -> PathBuf {
        self.references_to_page().join(format!("{}.json", page))
    }

    pub fn post_body_html(&self, slug: &str) -> PathBuf {
        self.blocks_html_cache().join(format!("{}.html", slug))
    }

    pub fn static_references_html(&self, slug: &str) -> PathBuf {
        self.references_html_cache().join(format!("{}-static.html", slug))
    }

    pub fn feed_item_html(&self, slug: &str) -> PathBuf {
        self.rss_cache().join(format!("{}.html", slug))
    }

    /// Creates every folder the build writes into.
    pub async fn ensure_all(&self) -> Result<()> {
        for dir in [
            self.buildcache(),
            self.references_in_page(),
            self.references_to_page(),
            self.rss_cache(),
            self.references_html_cache(),
            self.public_notion(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// Removes the per-build cache. A missing folder is not an error.
    pub async fn clear_buildcache(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(self.buildcache()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Start time of the previous build, if one was recorded. An unreadable
    /// timestamp counts as no previous build.
    pub async fn read_last_build_time(&self) -> Result<Option<DateTime<Utc>>> {
        let raw = match tokio::fs::read_to_string(self.build_start_timestamp()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let parsed = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());
        if parsed.is_none() {
            log::warn!("Ignoring malformed build timestamp {:?}", raw.trim());
        }
        Ok(parsed)
    }

    pub async fn record_build_start(&self, started: DateTime<Utc>) -> Result<()> {
        tokio::fs::create_dir_all(self.tmp()).await?;
        tokio::fs::write(
            self.build_start_timestamp(),
            started.timestamp_millis().to_string(),
        )
        .await?;
        Ok(())
    }
}
