// src/assets.rs
//! Local copies of Notion-hosted files.
//!
//! Hosted files sit behind signed URLs that expire, so every file-bearing
//! block is mirrored under `public/notion/<dir>/<file>` where the site can
//! serve it.

use crate::constants::ASSET_DOWNLOAD_TIMEOUT;
use crate::context::BuildContext;
use crate::error::{AppError, Result};
use crate::model::{walk_blocks, Block, FileSource, HostedFile};
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use std::path::{Path, PathBuf};
use url::Url;

/// Somewhere downloaded files are kept.
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    /// Where `url` is stored, or `None` when it names no file.
    fn stored_path(&self, url: &Url) -> Option<PathBuf>;

    /// Fetches `url` into the store and returns its local path.
    async fn download(&self, url: &Url) -> Result<PathBuf>;

    fn is_image_type(&self, path: &str) -> bool {
        crate::normalize::is_optimizable_image(path)
    }
}

/// `<root>/<second-to-last segment>/<decoded last segment>`, or `None`
/// when either part could step outside `root`.
pub fn asset_path(root: &Path, url: &Url) -> Option<PathBuf> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    let (file, rest) = segments.split_last()?;
    let file = urlencoding::decode(file).ok()?;
    let dir = rest.last().copied().unwrap_or_default();
    if file.is_empty() {
        return None;
    }
    if !is_plain_name(&file) || !is_plain_name(dir) {
        log::warn!("Refusing to store {} outside the asset folder", url);
        return None;
    }
    Some(root.join(dir).join(file.as_ref()))
}

fn is_plain_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && !name.contains("..")
}

/// Downloads over HTTP with a fixed per-request timeout.
#[derive(Clone)]
pub struct HttpAssetStore {
    client: Client,
    root: PathBuf,
}

impl HttpAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder().timeout(ASSET_DOWNLOAD_TIMEOUT).build()?;
        Ok(Self {
            client,
            root: root.into(),
        })
    }
}

#[async_trait::async_trait]
impl AssetStore for HttpAssetStore {
    fn stored_path(&self, url: &Url) -> Option<PathBuf> {
        asset_path(&self.root, url)
    }

    async fn download(&self, url: &Url) -> Result<PathBuf> {
        let path = self.stored_path(url).ok_or_else(|| AppError::AssetDownload {
            url: url.to_string(),
            reason: "no file name in URL".to_string(),
        })?;

        log::debug!("Downloading {}", url);
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(AppError::AssetDownload {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        let bytes = response.bytes().await?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }
}

fn hosted_file(block: &Block) -> Option<&HostedFile> {
    match block.media()?.source.as_ref()? {
        FileSource::Hosted(file) => Some(file),
        FileSource::External { .. } => None,
    }
}

/// Brings the local copy of every hosted file in `blocks` up to date.
///
/// A file is downloaded when its block changed since the last build or no
/// local copy exists. Expired signed URLs are renewed by fetching the block
/// again first. Downloads run concurrently; failures are logged and
/// skipped. Returns the paths written.
pub async fn sync_file_blocks(
    ctx: &BuildContext,
    store: &dyn AssetStore,
    blocks: &[Block],
) -> Vec<PathBuf> {
    let mut file_blocks = Vec::new();
    walk_blocks(blocks, &mut |block| {
        if hosted_file(block).is_some() {
            file_blocks.push(block);
        }
    });

    let downloads = file_blocks
        .into_iter()
        .map(|block| sync_file_block(ctx, store, block));
    let written: Vec<PathBuf> = join_all(downloads).await.into_iter().flatten().collect();

    if !written.is_empty() {
        let images = written
            .iter()
            .filter(|p| store.is_image_type(&p.to_string_lossy()))
            .count();
        log::info!("Downloaded {} files ({} images)", written.len(), images);
    }
    written
}

async fn sync_file_block(
    ctx: &BuildContext,
    store: &dyn AssetStore,
    block: &Block,
) -> Option<PathBuf> {
    let file = hosted_file(block)?;
    let url = match Url::parse(&file.url) {
        Ok(url) => url,
        Err(e) => {
            log::warn!("Skipping file of block {}: {}", block.id, e);
            return None;
        }
    };

    let local = store.stored_path(&url)?;
    let local_exists = tokio::fs::try_exists(&local).await.unwrap_or(false);
    if !ctx.staleness().is_stale(block.last_edited_time) && local_exists {
        return None;
    }

    let url = if file.expiry_time.is_some_and(|expiry| expiry < Utc::now()) {
        log::debug!("Signed URL of block {} expired, fetching it again", block.id);
        let renewed = ctx.refresh_block(&block.id).await?;
        let renewed_url = hosted_file(&renewed)?.url.clone();
        match Url::parse(&renewed_url) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Skipping file of block {}: {}", block.id, e);
                return None;
            }
        }
    } else {
        url
    };

    match store.download(&url).await {
        Ok(path) => Some(path),
        Err(e) => {
            log::warn!("Download for block {} failed: {}", block.id, e);
            None
        }
    }
}
