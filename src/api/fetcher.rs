// src/api/fetcher.rs
//! Recursive block-tree fetch.
//!
//! Walks a page's content depth-first, one paginated listing per container,
//! and attaches each container's children to the field its
//! [`ChildField`] names. Synced copies are resolved through a
//! [`BlockLookup`] and get the original's children instead of their own.

use super::pagination::fetch_all_pages;
use super::responses::RawBlock;
use super::types::FetchContext;
use super::NotionRepository;
use crate::error::{AppError, Result};
use crate::error_recovery::RetryPolicy;
use crate::model::{Block, BlockKind, ChildField, Column};
use crate::normalize::{normalize_block, normalize_column, normalize_table_row, NormalizeOptions};
use crate::types::BlockId;
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;

/// Resolves a single block by id, from whatever cache is available before
/// falling back to the API. `None` means the block could not be found.
#[async_trait::async_trait]
pub trait BlockLookup: Send + Sync {
    async fn lookup_block(&self, id: &BlockId) -> Option<Block>;
}

/// Fetches and normalizes whole block trees.
pub struct BlockTreeFetcher<'a> {
    client: &'a dyn NotionRepository,
    lookup: &'a dyn BlockLookup,
    policy: RetryPolicy,
    options: NormalizeOptions,
}

impl<'a> BlockTreeFetcher<'a> {
    pub fn new(
        client: &'a dyn NotionRepository,
        lookup: &'a dyn BlockLookup,
        policy: RetryPolicy,
        options: NormalizeOptions,
    ) -> Self {
        Self {
            client,
            lookup,
            policy,
            options,
        }
    }

    /// Every block under `root` (a page or block id), children populated.
    pub async fn fetch_tree(&self, root: &BlockId) -> Result<Vec<Block>> {
        log::debug!("Fetching block tree of {}", root);
        self.fetch_children(root.clone(), FetchContext::new().descend(root))
            .await
    }

    fn fetch_children(&self, parent: BlockId, ctx: FetchContext) -> BoxFuture<'_, Result<Vec<Block>>> {
        async move {
            let raw = self.list_children(&parent).await?;
            let mut blocks = Vec::with_capacity(raw.len());
            for raw_block in &raw {
                let mut block = normalize_block(raw_block, &self.options);
                self.expand(&mut block, &ctx).await?;
                blocks.push(block);
            }
            Ok(blocks)
        }
        .boxed()
    }

    async fn list_children(&self, parent: &BlockId) -> Result<Vec<RawBlock>> {
        fetch_all_pages(&self.policy, |cursor| {
            let parent = parent.clone();
            async move { self.client.block_children(&parent, cursor.as_deref()).await }
        })
        .await
    }

    async fn expand(&self, block: &mut Block, ctx: &FetchContext) -> Result<()> {
        let Some(field) = block.expansion() else {
            return Ok(());
        };

        match field {
            ChildField::Rows => {
                let rows = self
                    .list_children(&block.id)
                    .await?
                    .iter()
                    .map(normalize_table_row)
                    .collect();
                if let Some(slot) = block.rows_mut() {
                    *slot = rows;
                }
            }
            ChildField::Columns => {
                let columns = self.fetch_columns(&block.id, &ctx.descend(&block.id)).await?;
                if let Some(slot) = block.columns_mut() {
                    *slot = columns;
                }
            }
            ChildField::Children => {
                let children = match synced_origin(block) {
                    Some(origin) => self.synced_children(&block.id, &origin, ctx).await?,
                    None => {
                        self.fetch_children(block.id.clone(), ctx.descend(&block.id))
                            .await?
                    }
                };
                if let Some(slot) = block.children_mut() {
                    *slot = children;
                }
            }
        }
        Ok(())
    }

    /// Columns are fetched concurrently; the result keeps listing order.
    async fn fetch_columns(&self, list: &BlockId, ctx: &FetchContext) -> Result<Vec<Column>> {
        let raw = self.list_children(list).await?;
        try_join_all(raw.iter().map(|raw_column| {
            let mut column = normalize_column(raw_column);
            let ctx = ctx.descend(&column.id);
            async move {
                column.children = self.fetch_children(column.id.clone(), ctx).await?;
                Ok::<_, AppError>(column)
            }
        }))
        .await
    }

    /// Children of the block a synced copy mirrors. Unresolvable or cyclic
    /// origins yield no children.
    async fn synced_children(
        &self,
        copy: &BlockId,
        origin: &BlockId,
        ctx: &FetchContext,
    ) -> Result<Vec<Block>> {
        if origin == copy || ctx.is_ancestor(origin) {
            log::warn!(
                "Synced block {} mirrors {}, which encloses it; leaving it empty",
                copy,
                origin
            );
            return Ok(Vec::new());
        }

        match self.lookup.lookup_block(origin).await {
            Some(original) => {
                let ctx = ctx.descend(copy).descend(&original.id);
                self.fetch_children(original.id, ctx).await
            }
            None => {
                log::warn!(
                    "Could not retrieve original {} of synced block {}",
                    origin,
                    copy
                );
                Ok(Vec::new())
            }
        }
    }
}

fn synced_origin(block: &Block) -> Option<BlockId> {
    match &block.kind {
        BlockKind::SyncedBlock(synced) => synced.synced_from.clone(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::responses::{PaginatedResponse, RawDatabase, RawPage};
    use crate::api::EntryQuery;
    use crate::types::DatabaseId;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Serves canned children per parent id and records every listing.
    #[derive(Default)]
    struct Tree {
        children: HashMap<String, Vec<serde_json::Value>>,
        listed: Mutex<Vec<String>>,
    }

    impl Tree {
        fn with(mut self, parent: &str, children: Vec<serde_json::Value>) -> Self {
            self.children.insert(parent.to_string(), children);
            self
        }
    }

    #[async_trait::async_trait]
    impl NotionRepository for Tree {
        async fn query_entries(
            &self,
            _: &DatabaseId,
            _: &EntryQuery,
            _: Option<&str>,
        ) -> Result<PaginatedResponse<RawPage>> {
            Ok(PaginatedResponse::last(Vec::new()))
        }

        async fn block_children(
            &self,
            block: &BlockId,
            _: Option<&str>,
        ) -> Result<PaginatedResponse<RawBlock>> {
            self.listed.lock().push(block.as_str().to_string());
            let raw = self.children.get(block.as_str()).cloned().unwrap_or_default();
            let results = raw
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap())
                .collect();
            Ok(PaginatedResponse::last(results))
        }

        async fn retrieve_block(&self, block: &BlockId) -> Result<RawBlock> {
            Err(AppError::from_status(404, format!("no block {}", block)))
        }

        async fn retrieve_database(&self, _: &DatabaseId) -> Result<RawDatabase> {
            Err(AppError::from_status(404, "no database"))
        }
    }

    /// Resolves ids to a bare synced original.
    struct Originals(Vec<&'static str>);

    #[async_trait::async_trait]
    impl BlockLookup for Originals {
        async fn lookup_block(&self, id: &BlockId) -> Option<Block> {
            self.0.iter().find(|known| **known == id.as_str()).map(|known| Block {
                id: BlockId::from_raw(known),
                has_children: true,
                last_edited_time: chrono::Utc::now(),
                kind: BlockKind::SyncedBlock(Default::default()),
            })
        }
    }

    fn node(id: &str, kind: &str, has_children: bool) -> serde_json::Value {
        let payload = match kind {
            "synced_block" => serde_json::json!({"synced_from": null}),
            "table" => serde_json::json!({"table_width": 1}),
            "table_row" => serde_json::json!({"cells": [[]]}),
            "column_list" | "column" => serde_json::json!({}),
            _ => serde_json::json!({"rich_text": []}),
        };
        let mut value = serde_json::json!({
            "id": id,
            "type": kind,
            "has_children": has_children,
            "last_edited_time": "2024-01-01T00:00:00.000Z",
        });
        value[kind] = payload;
        value
    }

    fn synced_copy(id: &str, origin: &str) -> serde_json::Value {
        let mut value = node(id, "synced_block", true);
        value["synced_block"] = serde_json::json!({"synced_from": {"block_id": origin}});
        value
    }

    async fn fetch(tree: &Tree, lookup: &dyn BlockLookup) -> Vec<Block> {
        BlockTreeFetcher::new(tree, lookup, RetryPolicy::immediate(), NormalizeOptions::default())
            .fetch_tree(&BlockId::from_raw("page"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn leaves_without_children_are_not_listed() {
        let tree = Tree::default().with(
            "page",
            vec![node("p1", "paragraph", false), node("p2", "paragraph", true)],
        )
        .with("p2", vec![node("p3", "paragraph", false)]);

        let blocks = fetch(&tree, &Originals(vec![])).await;

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].children()[0].id.as_str(), "p3");
        assert_eq!(*tree.listed.lock(), vec!["page", "p2"]);
    }

    #[tokio::test]
    async fn toggles_tables_and_columns_always_expand() {
        let tree = Tree::default()
            .with(
                "page",
                vec![
                    node("tog", "toggle", false),
                    node("tab", "table", false),
                    node("cols", "column_list", false),
                ],
            )
            .with("tog", vec![node("inside", "paragraph", false)])
            .with("tab", vec![node("row1", "table_row", false), node("row2", "table_row", false)])
            .with("cols", vec![node("c1", "column", true), node("c2", "column", true)])
            .with("c1", vec![node("left", "paragraph", false)])
            .with("c2", vec![node("right", "paragraph", false)]);

        let blocks = fetch(&tree, &Originals(vec![])).await;

        assert_eq!(blocks[0].children().len(), 1);
        assert_eq!(blocks[1].rows().len(), 2);
        let columns = blocks[2].columns();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].children[0].id.as_str(), "left");
        assert_eq!(columns[1].children[0].id.as_str(), "right");
    }

    #[tokio::test]
    async fn synced_copies_take_the_originals_children() {
        let tree = Tree::default()
            .with("page", vec![synced_copy("copy", "orig")])
            .with("orig", vec![node("shared", "paragraph", false)]);

        let blocks = fetch(&tree, &Originals(vec!["orig"])).await;

        assert_eq!(blocks[0].children()[0].id.as_str(), "shared");
        assert!(!tree.listed.lock().contains(&"copy".to_string()));
    }

    #[tokio::test]
    async fn unresolvable_origin_yields_empty_children() {
        let tree = Tree::default().with("page", vec![synced_copy("copy", "gone")]);
        let blocks = fetch(&tree, &Originals(vec![])).await;
        assert!(blocks[0].children().is_empty());
    }

    #[tokio::test]
    async fn synced_cycles_are_cut() {
        // orig contains a copy of itself.
        let tree = Tree::default()
            .with("page", vec![synced_copy("copy", "orig")])
            .with("orig", vec![synced_copy("inner", "orig")]);

        let blocks = fetch(&tree, &Originals(vec!["orig"])).await;

        let inner = &blocks[0].children()[0];
        assert_eq!(inner.id.as_str(), "inner");
        assert!(inner.children().is_empty());
    }
}
