//! The RSS feed: rendered from the posts, then enhanced in place with the
//! sanitized body of every post.

use super::dom::{self, Element};
use super::sanitize::{text_excerpt, FeedSanitizer};
use super::{post_page_path, PassReport};
use crate::cache::{BuildPaths, Staleness};
use crate::constants::{FEED_DESCRIPTION_LENGTH, FEED_STYLESHEET};
use crate::context::BuildContext;
use crate::error::{AppError, Result};
use crate::links::LinkBuilder;
use crate::model::{Database, Entry};
use chrono::{DateTime, Utc};
use rss::extension::dublincore::DublinCoreExtensionBuilder;
use rss::validation::Validate;
use rss::{CategoryBuilder, Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const FEED_FILE: &str = "rss.xml";

const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

/// Site-level values the feed needs beyond the content database.
#[derive(Debug, Clone, Default)]
pub struct FeedSettings {
    /// Absolute site origin, e.g. `https://example.com`.
    pub site_url: String,
    pub author: Option<String>,
}

impl FeedSettings {
    fn absolute(&self, link: &str) -> String {
        format!("{}{}", self.site_url.trim_end_matches('/'), link)
    }
}

fn post_item(post: &Entry, links: &LinkBuilder, settings: &FeedSettings) -> Item {
    let link = settings.absolute(&links.entry_link(post));
    let categories = post
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.name.clone()).build())
        .collect::<Vec<_>>();
    let dublin_core = DublinCoreExtensionBuilder::default()
        .dates(vec![post.last_updated_time.to_rfc3339()])
        .creators(settings.author.iter().cloned().collect::<Vec<_>>())
        .build();

    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(GuidBuilder::default().permalink(true).value(link).build()))
        .description(Some(post.excerpt.clone()))
        .pub_date(post.publish_date.map(|d| d.to_rfc2822()))
        .categories(categories)
        .dublin_core_ext(Some(dublin_core))
        .build()
}

/// One item per post, newest first, each stamped with the post's last edit
/// so later enhancement runs can tell which bodies changed.
pub fn build_channel(
    database: &Database,
    posts: &[&Entry],
    links: &LinkBuilder,
    settings: &FeedSettings,
    built_at: DateTime<Utc>,
) -> Result<Channel> {
    let namespaces = BTreeMap::from([
        ("content".to_string(), CONTENT_NAMESPACE.to_string()),
        (
            "dc".to_string(),
            rss::extension::dublincore::NAMESPACE.to_string(),
        ),
    ]);

    let channel = ChannelBuilder::default()
        .title(database.title.clone())
        .link(settings.site_url.clone())
        .description(database.description.clone())
        .last_build_date(Some(built_at.to_rfc2822()))
        .generator(Some(env!("CARGO_PKG_NAME").to_string()))
        .namespaces(namespaces)
        .items(
            posts
                .iter()
                .map(|post| post_item(post, links, settings))
                .collect::<Vec<_>>(),
        )
        .build();

    channel
        .validate()
        .map_err(|e| AppError::Feed(format!("validation failed: {}", e)))?;
    Ok(channel)
}

/// Writes `dist/rss.xml` for the current posts.
pub async fn render_feed(
    ctx: &BuildContext,
    dist: &Path,
    settings: &FeedSettings,
) -> Result<PathBuf> {
    let database = ctx.database().await?;
    let posts = ctx.posts().await?;
    let channel = build_channel(database, &posts, ctx.links(), settings, Utc::now())?;

    let path = dist.join(FEED_FILE);
    tokio::fs::create_dir_all(dist).await?;
    tokio::fs::write(&path, with_stylesheet(&channel.to_string(), ctx.links().base_path()))
        .await?;
    log::info!("Wrote feed with {} items to {}", posts.len(), path.display());
    Ok(path)
}

/// Replaces any XML declaration of `xml` with the feed's declaration and
/// stylesheet instruction.
pub fn with_stylesheet(xml: &str, base_path: &str) -> String {
    let mut body = xml.trim_start();
    if body.starts_with("<?xml ") {
        if let Some(end) = body.find("?>") {
            body = body[end + 2..].trim_start();
        }
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<?xml-stylesheet href=\"{}/{}\" type=\"text/xsl\"?>\n{}",
        base_path.trim_end_matches('/'),
        FEED_STYLESHEET,
        body
    )
}

/// The `last edited` stamp `build_channel` put on the item.
fn last_updated(item: &Item) -> Option<DateTime<Utc>> {
    let stamp = item.dublin_core_ext()?.dates().first()?;
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// The decoded last path segment of an item link.
fn slug_of(link: &str) -> Option<String> {
    let segment = link.split('/').filter(|s| !s.is_empty()).last()?;
    urlencoding::decode(segment).ok().map(|s| s.into_owned())
}

/// Adds each post's sanitized body to the feed at `dist/rss.xml` and fills
/// empty descriptions from it.
///
/// Bodies come from the feed cache unless the item changed since the last
/// build. Items that fail are logged and left without content.
pub async fn enhance_feed(
    paths: &BuildPaths,
    dist: &Path,
    staleness: &Staleness,
    base_path: &str,
) -> Result<PassReport> {
    let feed_path = dist.join(FEED_FILE);
    let raw = tokio::fs::read(&feed_path).await?;
    let mut channel = Channel::read_from(&raw[..])?;
    let sanitizer = FeedSanitizer::new(channel.link());

    let mut report = PassReport::default();
    for item in channel.items_mut() {
        let label = item.link().unwrap_or_default().to_string();
        match enhance_item(item, &sanitizer, paths, dist, staleness).await {
            Ok(true) => report.updated += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                log::error!("Error processing feed item {}: {}", label, e);
                report.failed += 1;
            }
        }
    }

    tokio::fs::write(&feed_path, with_stylesheet(&channel.to_string(), base_path)).await?;
    log::info!(
        "Feed content: {} sanitized, {} from cache, {} failed",
        report.updated,
        report.skipped,
        report.failed
    );
    Ok(report)
}

async fn enhance_item(
    item: &mut Item,
    sanitizer: &FeedSanitizer,
    paths: &BuildPaths,
    dist: &Path,
    staleness: &Staleness,
) -> Result<bool> {
    let Some(link) = item.link().map(String::from) else {
        return Ok(false);
    };
    let Some(slug) = slug_of(&link) else {
        return Ok(false);
    };
    let Some(updated) = last_updated(item) else {
        log::debug!("Feed item {} has no update stamp", link);
        return Ok(false);
    };

    let cache_path = paths.feed_item_html(&slug);
    let cached = if staleness.is_stale(updated) {
        None
    } else {
        match tokio::fs::read_to_string(&cache_path).await {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        }
    };

    let sanitized = cached.is_none();
    let content = match cached {
        Some(content) => content,
        None => {
            let page = post_page_path(dist, &slug);
            let html = tokio::fs::read_to_string(&page).await?;
            let nodes = dom::parse_html(&html)?;
            let Some(main) = dom::find_first(&nodes, &|e: &Element| e.is("main")) else {
                log::warn!("No <main> in {}", page.display());
                return Ok(false);
            };
            let fragment = sanitizer.feed_fragment(&main.inner_html(), &link)?;
            if let Some(parent) = cache_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&cache_path, &fragment).await?;
            fragment
        }
    };

    if item.description().map_or(true, |d| d.trim().is_empty()) {
        item.set_description(Some(text_excerpt(&content, FEED_DESCRIPTION_LENGTH)?));
    }
    item.set_content(Some(content));
    Ok(sanitized)
}
