// tests/common/mod.rs
//! In-memory Notion workspace shared by the integration tests.
#![allow(dead_code)]

use notion2site::api::responses::{PaginatedResponse, RawBlock, RawDatabase, RawPage};
use notion2site::api::{EntryQuery, NotionRepository};
use notion2site::cache::{BuildPaths, Staleness};
use notion2site::error::AppError;
use notion2site::types::{BlockId, DatabaseId};
use notion2site::{BuildContext, RetryPolicy};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const DATABASE: &str = "dddddddd-dddd-dddd-dddd-dddddddddddd";
pub const EDITED: &str = "2024-03-01T00:00:00.000Z";

/// Canned responses per id, with per-method call counts and optional
/// failures by HTTP status.
#[derive(Default)]
pub struct MockNotion {
    pages: Vec<Value>,
    children: HashMap<String, Vec<Value>>,
    blocks: HashMap<String, Value>,
    failures: HashMap<String, u16>,
    pub children_calls: Mutex<Vec<String>>,
    pub retrieve_calls: Mutex<Vec<String>>,
    pub query_calls: Mutex<usize>,
}

fn key(id: &str) -> String {
    BlockId::from_raw(id).as_str().to_string()
}

impl MockNotion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: Value) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_children(mut self, parent: &str, children: Vec<Value>) -> Self {
        self.children.insert(key(parent), children);
        self
    }

    /// Makes `id` answerable by a single-block retrieval.
    pub fn with_block(mut self, block: Value) -> Self {
        let id = block["id"].as_str().unwrap_or_default().to_string();
        self.blocks.insert(key(&id), block);
        self
    }

    /// Every request naming `id` fails with `status`.
    pub fn failing(mut self, id: &str, status: u16) -> Self {
        self.failures.insert(key(id), status);
        self
    }

    pub fn children_calls_for(&self, id: &str) -> usize {
        let id = key(id);
        self.children_calls.lock().iter().filter(|c| **c == id).count()
    }

    pub fn total_children_calls(&self) -> usize {
        self.children_calls.lock().len()
    }

    fn check(&self, id: &str) -> Result<(), AppError> {
        match self.failures.get(id) {
            Some(status) => Err(AppError::from_status(*status, format!("injected for {}", id))),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl NotionRepository for MockNotion {
    async fn query_entries(
        &self,
        _: &DatabaseId,
        _: &EntryQuery,
        _: Option<&str>,
    ) -> Result<PaginatedResponse<RawPage>, AppError> {
        *self.query_calls.lock() += 1;
        let results = self
            .pages
            .iter()
            .map(|p| serde_json::from_value(p.clone()).unwrap())
            .collect();
        Ok(PaginatedResponse::last(results))
    }

    async fn block_children(
        &self,
        block: &BlockId,
        _: Option<&str>,
    ) -> Result<PaginatedResponse<RawBlock>, AppError> {
        self.children_calls.lock().push(block.as_str().to_string());
        self.check(block.as_str())?;
        let results = self
            .children
            .get(block.as_str())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        Ok(PaginatedResponse::last(results))
    }

    async fn retrieve_block(&self, block: &BlockId) -> Result<RawBlock, AppError> {
        self.retrieve_calls.lock().push(block.as_str().to_string());
        self.check(block.as_str())?;
        match self.blocks.get(block.as_str()) {
            Some(raw) => Ok(serde_json::from_value(raw.clone()).unwrap()),
            None => Err(AppError::from_status(404, format!("no block {}", block))),
        }
    }

    async fn retrieve_database(&self, database: &DatabaseId) -> Result<RawDatabase, AppError> {
        Ok(serde_json::from_value(json!({
            "id": database.as_str(),
            "title": [text_span("Site")],
            "description": [text_span("Notes and pages")],
            "last_edited_time": EDITED,
            "properties": {
                "Collection": {"type": "select", "select": {"options": [
                    {"name": "main"}, {"name": "posts"}, {"name": "notes"}
                ]}},
                "Tags": {"type": "multi_select", "multi_select": {"options": [
                    {"id": "t1", "name": "rust", "color": "orange", "description": "Systems posts"},
                    {"id": "t2", "name": "web", "color": "blue"}
                ]}}
            }
        }))
        .unwrap())
    }
}

pub fn text_span(content: &str) -> Value {
    json!({"type": "text", "plain_text": content, "text": {"content": content}})
}

pub fn link_span(content: &str, href: &str) -> Value {
    json!({
        "type": "text",
        "plain_text": content,
        "href": href,
        "text": {"content": content, "link": {"url": href}}
    })
}

pub fn paragraph(id: &str, spans: Vec<Value>) -> Value {
    json!({
        "id": id,
        "type": "paragraph",
        "has_children": false,
        "last_edited_time": EDITED,
        "paragraph": {"rich_text": spans}
    })
}

pub fn heading(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": "heading_1",
        "has_children": false,
        "last_edited_time": EDITED,
        "heading_1": {"rich_text": [text_span(title)], "is_toggleable": false}
    })
}

pub fn toggle(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": "toggle",
        "has_children": true,
        "last_edited_time": EDITED,
        "toggle": {"rich_text": [text_span(title)]}
    })
}

pub fn synced_copy(id: &str, original: &str) -> Value {
    json!({
        "id": id,
        "type": "synced_block",
        "has_children": true,
        "last_edited_time": EDITED,
        "synced_block": {"synced_from": {"type": "block_id", "block_id": original}}
    })
}

pub fn synced_original(id: &str) -> Value {
    json!({
        "id": id,
        "type": "synced_block",
        "has_children": true,
        "last_edited_time": EDITED,
        "synced_block": {"synced_from": null}
    })
}

pub fn link_to_page(id: &str, page: &str) -> Value {
    json!({
        "id": id,
        "type": "link_to_page",
        "has_children": false,
        "last_edited_time": EDITED,
        "link_to_page": {"type": "page_id", "page_id": page}
    })
}

pub fn hosted_image(id: &str, url: &str, expiry: &str, edited: &str) -> Value {
    json!({
        "id": id,
        "type": "image",
        "has_children": false,
        "last_edited_time": edited,
        "image": {
            "caption": [],
            "type": "file",
            "file": {"url": url, "expiry_time": expiry}
        }
    })
}

/// A database row with the columns the site reads.
pub fn entry_page(id: &str, title: &str, slug: &str, collection: &str, edited: &str) -> Value {
    json!({
        "id": id,
        "last_edited_time": edited,
        "properties": {
            "Page": {"type": "title", "title": [text_span(title)]},
            "Slug": {"type": "formula", "formula": {"type": "string", "string": slug}},
            "Collection": {"type": "select", "select": {"name": collection}},
            "Publish Date": {"type": "formula", "formula": {"type": "date", "date": {"start": "2024-02-01"}}},
            "Tags": {"type": "multi_select", "multi_select": []}
        }
    })
}

/// `page` with its `Tags` column set to `names`.
pub fn tagged(mut page: Value, names: &[&str]) -> Value {
    page["properties"]["Tags"]["multi_select"] = names
        .iter()
        .map(|name| json!({"name": name, "color": "default"}))
        .collect();
    page
}

/// A context over `mock` that never waits between retries.
pub fn context(mock: Arc<MockNotion>, root: &std::path::Path, staleness: Staleness) -> BuildContext {
    BuildContext::new(
        mock,
        DatabaseId::parse(DATABASE).unwrap(),
        BuildPaths::new(root),
        staleness,
    )
    .with_retry_policy(RetryPolicy::immediate())
}
