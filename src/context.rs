// src/context.rs
//! The per-build cache context.
//!
//! One [`BuildContext`] is created per build and handed to every step that
//! reads content. It owns the upstream client, the durable caches and the
//! in-process memos, so two contexts never share state.

use crate::api::{
    fetch_all_pages, BlockLookup, BlockTreeFetcher, EntryQuery, NotionRepository,
};
use crate::cache::{BlockIndex, BuildCacheStore, BuildPaths, CacheKey, Staleness};
use crate::error::Result;
use crate::error_recovery::{retry_with_backoff, RetryPolicy};
use crate::links::{block_anchor, LinkBuilder};
use crate::model::{find_block, Block, Database, Entry, PageContent, Tag};
use crate::normalize::{normalize_block, normalize_database, normalize_entries, NormalizeOptions};
use crate::references::{
    extract_references_in_page, invert_references, linked_page_ids, write_backlinks,
    BacklinkIndex, ReferencesInPage,
};
use crate::types::{BlockId, DatabaseId, InternalReference, PageId};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

/// A tag and how many posts carry it.
#[derive(Debug, Clone, PartialEq)]
pub struct TagCount {
    pub tag: Tag,
    pub count: usize,
}

pub struct BuildContext {
    client: Arc<dyn NotionRepository>,
    database_id: DatabaseId,
    store: BuildCacheStore,
    block_index: BlockIndex,
    staleness: Staleness,
    options: NormalizeOptions,
    links: LinkBuilder,
    policy: RetryPolicy,
    entries: OnceCell<Vec<Entry>>,
    database: OnceCell<Database>,
    trees: Mutex<HashMap<PageId, Arc<Vec<Block>>>>,
    contents: Mutex<HashMap<PageId, PageContent>>,
    retrieved: Mutex<HashMap<BlockId, Block>>,
}

impl BuildContext {
    pub fn new(
        client: Arc<dyn NotionRepository>,
        database_id: DatabaseId,
        paths: BuildPaths,
        staleness: Staleness,
    ) -> Self {
        let store = BuildCacheStore::new(paths);
        Self {
            client,
            database_id,
            block_index: BlockIndex::new(store.clone()),
            store,
            staleness,
            options: NormalizeOptions::default(),
            links: LinkBuilder::new(
                "/",
                crate::constants::MENU_PAGES_COLLECTION,
                crate::constants::HOME_PAGE_SLUG,
            ),
            policy: RetryPolicy::default(),
            entries: OnceCell::new(),
            database: OnceCell::new(),
            trees: Mutex::new(HashMap::new()),
            contents: Mutex::new(HashMap::new()),
            retrieved: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_links(mut self, links: LinkBuilder) -> Self {
        self.links = links;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &BuildCacheStore {
        &self.store
    }

    pub fn paths(&self) -> &BuildPaths {
        self.store.paths()
    }

    pub fn staleness(&self) -> &Staleness {
        &self.staleness
    }

    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    pub fn block_index(&self) -> &BlockIndex {
        &self.block_index
    }

    /// Every published entry, posts and menu pages, newest first.
    pub async fn all_entries(&self) -> Result<&[Entry]> {
        let entries = self
            .entries
            .get_or_try_init(|| async {
                if let Some(cached) = self.store.load(CacheKey::AllEntries).await? {
                    return Ok(cached);
                }
                log::info!("Querying entries of database {}", self.database_id);
                let query = EntryQuery::published(Utc::now());
                let raw = fetch_all_pages(&self.policy, |cursor| {
                    let query = &query;
                    async move {
                        self.client
                            .query_entries(&self.database_id, query, cursor.as_deref())
                            .await
                    }
                })
                .await?;
                let entries = normalize_entries(&raw);
                self.store.save(CacheKey::AllEntries, &entries).await?;
                Ok::<_, crate::error::AppError>(entries)
            })
            .await?;
        Ok(entries)
    }

    /// Entries outside the menu collection.
    pub async fn posts(&self) -> Result<Vec<&Entry>> {
        let menu = self.links.menu_collection();
        Ok(self
            .all_entries()
            .await?
            .iter()
            .filter(|e| !e.is_menu_page(menu))
            .collect())
    }

    /// Entries of the menu collection.
    pub async fn pages(&self) -> Result<Vec<&Entry>> {
        let menu = self.links.menu_collection();
        Ok(self
            .all_entries()
            .await?
            .iter()
            .filter(|e| e.is_menu_page(menu))
            .collect())
    }

    pub async fn entry_by_slug(&self, slug: &str) -> Result<Option<&Entry>> {
        Ok(self.all_entries().await?.iter().find(|e| e.slug == slug))
    }

    pub async fn entry_by_page_id(&self, page: &PageId) -> Result<Option<&Entry>> {
        Ok(self.all_entries().await?.iter().find(|e| &e.page_id == page))
    }

    pub async fn database(&self) -> Result<&Database> {
        self.database
            .get_or_try_init(|| async {
                if let Some(cached) = self.store.load(CacheKey::Database).await? {
                    return Ok(cached);
                }
                let raw = retry_with_backoff(&self.policy, || {
                    self.client.retrieve_database(&self.database_id)
                })
                .await?;
                let database = normalize_database(&raw);
                self.store.save(CacheKey::Database, &database).await?;
                Ok::<_, crate::error::AppError>(database)
            })
            .await
    }

    /// Unique tags across posts, by name.
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = Vec::new();
        for post in self.posts().await? {
            for tag in &post.tags {
                if !tags.iter().any(|t| t.name == tag.name) {
                    tags.push(tag.clone());
                }
            }
        }
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    /// Post count per tag, with descriptions from the database schema.
    pub async fn tags_with_counts(&self) -> Result<Vec<TagCount>> {
        let descriptions: HashMap<String, Option<String>> = self
            .database()
            .await?
            .tag_options()
            .into_iter()
            .map(|t| (t.name, t.description))
            .collect();

        let mut counts: Vec<TagCount> = Vec::new();
        for post in self.posts().await? {
            for tag in &post.tags {
                match counts.iter_mut().find(|c| c.tag.name == tag.name) {
                    Some(existing) => existing.count += 1,
                    None => counts.push(TagCount {
                        tag: Tag {
                            description: descriptions.get(&tag.name).cloned().flatten(),
                            ..tag.clone()
                        },
                        count: 1,
                    }),
                }
            }
        }
        counts.sort_by(|a, b| a.tag.name.cmp(&b.tag.name));
        Ok(counts)
    }

    /// Collection names from the database schema, the menu collection
    /// excluded.
    pub async fn collections(&self) -> Result<Vec<String>> {
        let database = self.database().await?;
        let options = database
            .properties_raw
            .get("Collection")
            .and_then(|p| p.get("select"))
            .and_then(|s| s.get("options"))
            .and_then(|o| o.as_array());

        Ok(options
            .into_iter()
            .flatten()
            .filter_map(|o| o.get("name").and_then(|n| n.as_str()))
            .filter(|name| *name != self.links.menu_collection())
            .map(String::from)
            .collect())
    }

    /// The entry's block tree and the links in it.
    ///
    /// Fresh entries are served from the blocks cache when present; stale
    /// or uncached ones are fetched in full and both caches rewritten.
    /// Either way every block is registered in the block index. Later calls
    /// for the same page are answered from memory.
    pub async fn page_content(&self, entry: &Entry) -> Result<PageContent> {
        let page = &entry.page_id;
        let memo = self.contents.lock().get(page).cloned();
        if let Some(content) = memo {
            return Ok(content);
        }

        let cached = if self.staleness.is_entry_stale(entry) {
            None
        } else {
            self.store.load::<Vec<Block>>(CacheKey::PageBlocks(page)).await?
        };

        let (blocks, references) = match cached {
            Some(blocks) => {
                log::debug!("Hit block cache for {}", entry.slug);
                let references = match self.store.load(CacheKey::PageReferences(page)).await? {
                    Some(references) => references,
                    None => {
                        let references = extract_references_in_page(page, &blocks);
                        self.store
                            .save(CacheKey::PageReferences(page), &references)
                            .await?;
                        references
                    }
                };
                (blocks, references)
            }
            None => {
                log::info!("Fetching blocks of {}", entry.slug);
                let fetcher = BlockTreeFetcher::new(
                    self.client.as_ref(),
                    self,
                    self.policy,
                    self.options,
                );
                let blocks = fetcher.fetch_tree(&page.cast()).await?;
                self.store.save(CacheKey::PageBlocks(page), &blocks).await?;
                let references = extract_references_in_page(page, &blocks);
                self.store
                    .save(CacheKey::PageReferences(page), &references)
                    .await?;
                (blocks, references)
            }
        };

        self.block_index.register_tree(page, &blocks).await?;
        self.trees
            .lock()
            .insert(page.clone(), Arc::new(blocks.clone()));

        let content = PageContent { blocks, references };
        self.contents.lock().insert(page.clone(), content.clone());
        Ok(content)
    }

    /// The references cached for `page` by its last content fetch.
    pub async fn references_in_page(&self, page: &PageId) -> Result<Vec<ReferencesInPage>> {
        Ok(self
            .store
            .load(CacheKey::PageReferences(page))
            .await?
            .unwrap_or_default())
    }

    /// Entries linked from `entry`'s cached references.
    pub async fn linked_entries(&self, entry: &Entry) -> Result<Vec<&Entry>> {
        let linked = linked_page_ids(&self.references_in_page(&entry.page_id).await?);
        Ok(self
            .all_entries()
            .await?
            .iter()
            .filter(|e| linked.contains(&e.page_id))
            .collect())
    }

    /// Inverts the given per-page references and rewrites every backlink
    /// document.
    pub async fn rebuild_backlinks(
        &self,
        pages: &[(PageId, Vec<ReferencesInPage>)],
    ) -> Result<BacklinkIndex> {
        let index = invert_references(pages);
        write_backlinks(&self.store, &index).await?;
        Ok(index)
    }

    /// A single block: owning page's tree first, then blocks already
    /// retrieved during this build, the API last.
    pub async fn block(&self, id: &BlockId) -> Option<Block> {
        match self.block_from_cache(id).await {
            Ok(Some(block)) => return Some(block),
            Ok(None) => {}
            Err(e) => log::warn!("Block cache lookup for {} failed: {}", id, e),
        }
        let retrieved = self.retrieved.lock().get(id).cloned();
        if retrieved.is_some() {
            return retrieved;
        }

        self.refresh_block(id).await
    }

    /// A single block straight from the API, bypassing every cache. The
    /// answer is remembered for later [`block`](Self::block) calls.
    pub async fn refresh_block(&self, id: &BlockId) -> Option<Block> {
        log::debug!("Retrieving block {} from the API", id);
        match retry_with_backoff(&self.policy, || self.client.retrieve_block(id)).await {
            Ok(raw) => {
                let block = normalize_block(&raw, &self.options);
                self.retrieved.lock().insert(id.clone(), block.clone());
                Some(block)
            }
            Err(e) => {
                log::error!("Error retrieving block {}: {}", id, e);
                None
            }
        }
    }

    async fn block_from_cache(&self, id: &BlockId) -> Result<Option<Block>> {
        let Some(page) = self.block_index.page_of(id).await? else {
            return Ok(None);
        };

        let memo = self.trees.lock().get(&page).cloned();
        let tree = match memo {
            Some(tree) => tree,
            None => match self.store.load::<Vec<Block>>(CacheKey::PageBlocks(&page)).await? {
                Some(blocks) => {
                    let tree = Arc::new(blocks);
                    self.trees.lock().insert(page, tree.clone());
                    tree
                }
                None => return Ok(None),
            },
        };
        Ok(find_block(&tree, id).cloned())
    }

    /// Site link for an internal reference, or `None` when the target page
    /// is not a published entry. Links into `current` are fragment-only.
    pub async fn resolve_internal_link(
        &self,
        reference: &InternalReference,
        current: Option<&PageId>,
    ) -> Result<Option<String>> {
        let Some(target) = self.entry_by_page_id(&reference.page_id).await? else {
            return Ok(None);
        };

        let block = match &reference.block_id {
            Some(block_id) => self.block(block_id).await,
            None => None,
        };

        Ok(Some(match block {
            Some(block) if current == Some(&target.page_id) => format!("#{}", block_anchor(&block)),
            Some(block) => self.links.block_link(target, &block),
            None => self.links.entry_link(target),
        }))
    }
}

#[async_trait::async_trait]
impl BlockLookup for BuildContext {
    async fn lookup_block(&self, id: &BlockId) -> Option<Block> {
        self.block(id).await
    }
}
