//! Which page owns a block.
//!
//! Loaded lazily from the build cache on first use, extended every time a
//! page tree is fetched or read, and written back after every extension.

use super::store::{BuildCacheStore, CacheKey};
use crate::error::Result;
use crate::model::{walk_blocks, Block};
use crate::types::{BlockId, PageId};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

pub type BlockPageMap = BTreeMap<BlockId, PageId>;

pub struct BlockIndex {
    store: BuildCacheStore,
    map: Mutex<Option<BlockPageMap>>,
}

impl BlockIndex {
    pub fn new(store: BuildCacheStore) -> Self {
        Self {
            store,
            map: Mutex::new(None),
        }
    }

    async fn load(&self, slot: &mut Option<BlockPageMap>) -> Result<()> {
        if slot.is_none() {
            let persisted = self.store.load(CacheKey::BlockIndex).await?;
            *slot = Some(persisted.unwrap_or_default());
        }
        Ok(())
    }

    /// Records every block of `blocks`, at any depth, as owned by `page`
    /// and persists the map.
    pub async fn register_tree(&self, page: &PageId, blocks: &[Block]) -> Result<()> {
        let mut guard = self.map.lock().await;
        self.load(&mut guard).await?;
        let map = guard.get_or_insert_with(BlockPageMap::new);

        walk_blocks(blocks, &mut |block| {
            map.insert(block.id.clone(), page.clone());
        });

        self.store.save(CacheKey::BlockIndex, &*map).await
    }

    pub async fn page_of(&self, block: &BlockId) -> Result<Option<PageId>> {
        let mut guard = self.map.lock().await;
        self.load(&mut guard).await?;
        Ok(guard.as_ref().and_then(|map| map.get(block).cloned()))
    }

    /// Copy of the current map.
    pub async fn snapshot(&self) -> Result<BlockPageMap> {
        let mut guard = self.map.lock().await;
        self.load(&mut guard).await?;
        Ok(guard.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BuildPaths;
    use crate::model::{BlockKind, TextBlock};
    use chrono::Utc;

    fn paragraph(id: &str, children: Vec<Block>) -> Block {
        Block {
            id: BlockId::from_raw(id),
            has_children: !children.is_empty(),
            last_edited_time: Utc::now(),
            kind: BlockKind::Paragraph(TextBlock {
                children,
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn nested_blocks_are_registered_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = BuildCacheStore::new(BuildPaths::new(dir.path()));
        let page = PageId::from_raw("0123456789abcdef0123456789abcdef");
        let nested = "fedcba98-7654-3210-fedc-ba9876543210";

        let index = BlockIndex::new(store.clone());
        index
            .register_tree(&page, &[paragraph("aaaa", vec![paragraph(nested, vec![])])])
            .await
            .unwrap();

        // Lookups accept either hyphenation.
        let found = index
            .page_of(&BlockId::from_raw("fedcba9876543210fedcba9876543210"))
            .await
            .unwrap();
        assert_eq!(found, Some(page.clone()));

        let reloaded = BlockIndex::new(store);
        assert_eq!(
            reloaded.page_of(&BlockId::from_raw(nested)).await.unwrap(),
            Some(page)
        );
        assert_eq!(reloaded.snapshot().await.unwrap().len(), 2);
    }
}
