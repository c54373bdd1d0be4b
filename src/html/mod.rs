//! Passes over the rendered site: block-HTML caching and the feed.

mod block_cache;
pub mod dom;
mod feed;
mod sanitize;

pub use block_cache::{cache_block_html, extract_containers, RenderedContainers};
pub use feed::{build_channel, enhance_feed, render_feed, with_stylesheet, FeedSettings};
pub use sanitize::{disclaimer, strip_disclaimer, text_excerpt, FeedSanitizer};

use crate::links::LinkBuilder;
use crate::model::Entry;
use std::path::{Path, PathBuf};

/// Outcome counts of one post-processing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Where the site generator writes `entry`'s page under `dist`.
pub fn rendered_page_path(dist: &Path, entry: &Entry, links: &LinkBuilder) -> PathBuf {
    if links.is_home(entry) {
        dist.join("index.html")
    } else if entry.is_menu_page(links.menu_collection()) {
        dist.join(&entry.slug).join("index.html")
    } else {
        post_page_path(dist, &entry.slug)
    }
}

pub(crate) fn post_page_path(dist: &Path, slug: &str) -> PathBuf {
    dist.join("posts").join(slug).join("index.html")
}
