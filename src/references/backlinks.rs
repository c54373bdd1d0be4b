//! "Pages that link here", inverted from every page's outgoing links.

use super::extract::ReferencesInPage;
use crate::cache::{BuildCacheStore, CacheKey};
use crate::error::Result;
use crate::model::Block;
use crate::types::PageId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One block of `entry_id` that links to the indexed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backlink {
    pub entry_id: PageId,
    pub block: Block,
}

/// Target page to the blocks that link to it, in the order sources were
/// given. Every source page has an entry, possibly empty.
pub type BacklinkIndex = IndexMap<PageId, Vec<Backlink>>;

/// Inverts per-page references. Links to pages outside `pages` are dropped.
pub fn invert_references(pages: &[(PageId, Vec<ReferencesInPage>)]) -> BacklinkIndex {
    let mut index: BacklinkIndex = pages
        .iter()
        .map(|(entry_id, _)| (entry_id.clone(), Vec::new()))
        .collect();

    for (entry_id, references) in pages {
        for reference in references {
            for target in reference.linked_pages() {
                if let Some(backlinks) = index.get_mut(target) {
                    backlinks.push(Backlink {
                        entry_id: entry_id.clone(),
                        block: reference.block.clone(),
                    });
                }
            }
        }
    }
    index
}

/// Writes one document per target page, replacing last build's.
pub async fn write_backlinks(store: &BuildCacheStore, index: &BacklinkIndex) -> Result<()> {
    for (target, backlinks) in index {
        store.save(CacheKey::Backlinks(target), backlinks).await?;
    }
    log::info!("Wrote backlinks for {} pages", index.len());
    Ok(())
}

/// Backlinks of `page` from the last write; empty when none were written.
pub async fn load_backlinks(store: &BuildCacheStore, page: &PageId) -> Result<Vec<Backlink>> {
    Ok(store
        .load(CacheKey::Backlinks(page))
        .await?
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BuildPaths;
    use crate::model::{BlockKind, LinkToPage};
    use crate::references::extract_references_in_page;
    use crate::types::BlockId;

    fn id(c: char) -> PageId {
        PageId::from_raw(&c.to_string().repeat(32))
    }

    fn link_block(target: PageId) -> Block {
        Block {
            id: BlockId::from_raw("link"),
            has_children: false,
            last_edited_time: chrono::Utc::now(),
            kind: BlockKind::LinkToPage(LinkToPage { page_id: target }),
        }
    }

    #[test]
    fn links_to_unknown_pages_are_dropped() {
        let a = id('a');
        let refs = extract_references_in_page(&a, &[link_block(id('f'))]);
        let index = invert_references(&[(a.clone(), refs)]);
        assert_eq!(index.len(), 1);
        assert!(index[&a].is_empty());
    }

    #[tokio::test]
    async fn removing_a_link_empties_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let store = BuildCacheStore::new(BuildPaths::new(dir.path()));
        let (a, b) = (id('a'), id('b'));

        let refs = extract_references_in_page(&a, &[link_block(b.clone())]);
        let index = invert_references(&[(a.clone(), refs), (b.clone(), vec![])]);
        write_backlinks(&store, &index).await.unwrap();

        let backlinks = load_backlinks(&store, &b).await.unwrap();
        assert_eq!(backlinks.len(), 1);
        assert_eq!(backlinks[0].entry_id, a);

        let index = invert_references(&[(a.clone(), vec![]), (b.clone(), vec![])]);
        write_backlinks(&store, &index).await.unwrap();
        assert!(load_backlinks(&store, &b).await.unwrap().is_empty());
    }
}
