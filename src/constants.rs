// src/constants.rs
//! Domain constants that define the operational boundaries of the build.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! them top to bottom tells you how the build talks to Notion, where it
//! keeps its caches and which entries are special.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results (the API
/// maximum).
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// Extra attempts after a failed upstream request.
pub const REQUEST_RETRIES: u32 = 2;

/// Wait before the first retry of a failed upstream request.
pub const REQUEST_RETRY_MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Backoff multiplier between retries (1s, 2s, ...).
pub const REQUEST_RETRY_FACTOR: u32 = 2;

/// Fixed abort timeout for a single asset download.
pub const ASSET_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Site structure
// ---------------------------------------------------------------------------

/// Collection whose entries are menu pages rather than posts.
pub const MENU_PAGES_COLLECTION: &str = "main";

/// Slug of the menu page served at the site root.
pub const HOME_PAGE_SLUG: &str = "home";

// ---------------------------------------------------------------------------
// Build cache layout (relative to the project root)
// ---------------------------------------------------------------------------

/// Per-build cache, removed when a build completes.
pub const BUILDCACHE_DIR: &str = "buildcache";

/// Cross-build cache root.
pub const TMP_DIR: &str = "tmp";

pub const BLOCKS_JSON_DIR: &str = "blocks-json-cache";
pub const REFERENCES_IN_PAGE_DIR: &str = "references-in-page";
pub const REFERENCES_TO_PAGE_DIR: &str = "references-to-page";
pub const RSS_CACHE_DIR: &str = "rss-cache";
pub const BLOCKS_HTML_CACHE_DIR: &str = "blocks-html-cache";
pub const REFERENCES_HTML_CACHE_DIR: &str = "references";
pub const PUBLIC_NOTION_DIR: &str = "public/notion";

/// Records when the previous build started, in milliseconds since the epoch.
pub const BUILD_START_TIMESTAMP_FILE: &str = "build_start_timestamp.txt";

pub const ALL_ENTRIES_CACHE: &str = "allEntries.json";
pub const BLOCK_ID_PAGE_ID_MAP_CACHE: &str = "blockIdPostIdMap.json";
pub const DATABASE_CACHE: &str = "database.json";

// ---------------------------------------------------------------------------
// Syndication
// ---------------------------------------------------------------------------

/// Characters of sanitized text used when an item has no description.
pub const FEED_DESCRIPTION_LENGTH: usize = 150;

/// Stylesheet served next to the feed.
pub const FEED_STYLESHEET: &str = "rss-styles.xsl";

/// Extensions converted to webp when image optimisation is enabled.
pub const OPTIMIZABLE_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "avif"];
