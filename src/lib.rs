// src/lib.rs
//! notion2site library: incremental Notion content builds for a static site.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`
//! - **Configuration**: `BuildConfig`, `BuildPaths`
//! - **Domain model**: `Entry`, `Database`, `Block`, `BlockKind`, `RichText`
//! - **Upstream**: `NotionRepository`, `NotionHttpClient`, `BlockTreeFetcher`
//! - **Caching**: `BuildContext`, `BuildCacheStore`, `Staleness`
//! - **Links**: `ReferencesInPage`, backlinks, `LinkBuilder`
//! - **Rendered output**: block-HTML cache, feed rendering and enhancement

pub mod api;
pub mod assets;
pub mod cache;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod error_recovery;
pub mod html;
pub mod links;
pub mod model;
pub mod normalize;
pub mod references;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode, Result};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::cache::BuildPaths;
pub use crate::config::{BuildConfig, CommandLineInput};

// --- Domain Model ---
pub use crate::model::{Block, BlockKind, Database, Entry, PageContent, Tag};

// --- Domain Types ---
pub use crate::types::{
    ApiKey, BlockId, Color, DatabaseId, InternalReference, Mention, PageId, ReferenceKind,
    RichText,
};

// --- Upstream ---
pub use crate::api::{BlockLookup, BlockTreeFetcher, NotionHttpClient, NotionRepository};
pub use crate::error_recovery::{retry_with_backoff, RetryPolicy};

// --- Caching ---
pub use crate::cache::{BuildCacheStore, Staleness};
pub use crate::context::BuildContext;

// --- Links ---
pub use crate::links::LinkBuilder;
pub use crate::references::{Backlink, ReferencesInPage};

// --- Assets ---
pub use crate::assets::{AssetStore, HttpAssetStore};
