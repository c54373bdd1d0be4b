// src/api/types.rs
//! Request descriptors and fetch-time context for the Notion API module.

use crate::types::BlockId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Filter and sort for the entries query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryQuery {
    pub filter: serde_json::Value,
    pub sorts: serde_json::Value,
}

impl EntryQuery {
    /// Published entries with a slug whose publish date is not in the
    /// future, newest first.
    pub fn published(now: DateTime<Utc>) -> Self {
        Self {
            filter: serde_json::json!({
                "and": [
                    { "property": "Published", "checkbox": { "equals": true } },
                    {
                        "property": "Publish Date",
                        "formula": {
                            "date": {
                                "on_or_before": now.to_rfc3339_opts(SecondsFormat::Millis, true)
                            }
                        }
                    },
                    {
                        "property": "Slug",
                        "formula": { "string": { "is_not_empty": true } }
                    }
                ]
            }),
            sorts: serde_json::json!([
                { "property": "Publish Date", "direction": "descending" }
            ]),
        }
    }

    /// Request body for one page of results.
    pub fn body(&self, cursor: Option<&str>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "filter": self.filter,
            "sorts": self.sorts,
            "page_size": crate::constants::NOTION_API_PAGE_SIZE,
        });
        if let Some(cursor) = cursor {
            body["start_cursor"] = serde_json::json!(cursor);
        }
        body
    }
}

/// Immutable context for one branch of the recursive block fetch.
///
/// Tracks the blocks on the path from the page root, so a synced block
/// that cites itself or one of its ancestors is detected instead of
/// recursing forever. Persistent set, so cloning per level is cheap.
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    ancestors: im::HashSet<BlockId>,
}

impl FetchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new context with `id` on the path.
    pub fn descend(&self, id: &BlockId) -> Self {
        let mut ancestors = self.ancestors.clone();
        ancestors.insert(id.clone());
        Self { ancestors }
    }

    pub fn is_ancestor(&self, id: &BlockId) -> bool {
        self.ancestors.contains(id)
    }
}
