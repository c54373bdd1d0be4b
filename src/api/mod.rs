// src/api/mod.rs
//! Notion API interaction: the ability to read a content database.
//!
//! Business logic depends on the [`NotionRepository`] capability, never on
//! HTTP details. Every method returns one raw page of results; pagination
//! and retries are layered on top in [`pagination`].

pub mod client;
pub mod fetcher;
pub mod pagination;
pub mod parser;
pub mod responses;
pub mod types;

use crate::error::AppError;
use crate::types::{BlockId, DatabaseId};
use responses::{PaginatedResponse, RawBlock, RawDatabase, RawPage};

pub use client::NotionHttpClient;
pub use fetcher::{BlockLookup, BlockTreeFetcher};
pub use pagination::fetch_all_pages;
pub use types::{EntryQuery, FetchContext};

/// The ability to read content from a Notion workspace.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    /// One page of database rows matching `query`.
    async fn query_entries(
        &self,
        database: &DatabaseId,
        query: &EntryQuery,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<RawPage>, AppError>;

    /// One page of a block's direct children.
    async fn block_children(
        &self,
        block: &BlockId,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<RawBlock>, AppError>;

    async fn retrieve_block(&self, block: &BlockId) -> Result<RawBlock, AppError>;

    async fn retrieve_database(&self, database: &DatabaseId) -> Result<RawDatabase, AppError>;
}
