//! Caches the rendered post body and static references of every entry,
//! so later builds can re-render a page around unchanged content.

use super::dom::{self, Element};
use super::{rendered_page_path, PassReport};
use crate::context::BuildContext;
use crate::error::Result;
use crate::model::Entry;
use std::path::Path;

const POST_BODY_CLASS: &str = "post-body";
const STATIC_REFERENCES_CLASS: &str = "static-references";

/// Inner HTML of the cacheable containers of one rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedContainers {
    pub post_body: Option<String>,
    pub static_references: Option<String>,
}

pub fn extract_containers(html: &str) -> Result<RenderedContainers> {
    let nodes = dom::parse_html(html)?;
    let inner_of = |class: &str| {
        dom::find_first(&nodes, &|e: &Element| e.is("div") && e.has_class(class))
            .map(Element::inner_html)
    };
    Ok(RenderedContainers {
        post_body: inner_of(POST_BODY_CLASS),
        static_references: inner_of(STATIC_REFERENCES_CLASS),
    })
}

/// Runs the block-HTML pass over every entry rendered under `dist`.
///
/// The post body is rewritten when the entry changed; the static
/// references also when an entry it links to changed. A failing entry is
/// logged and does not stop the others.
pub async fn cache_block_html(ctx: &BuildContext, dist: &Path) -> Result<PassReport> {
    let mut report = PassReport::default();
    for entry in ctx.all_entries().await? {
        match cache_entry(ctx, dist, entry).await {
            Ok(true) => report.updated += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                log::error!("Error caching block HTML of {}: {}", entry.slug, e);
                report.failed += 1;
            }
        }
    }
    log::info!(
        "Block HTML cache: {} updated, {} unchanged, {} failed",
        report.updated,
        report.skipped,
        report.failed
    );
    Ok(report)
}

async fn cache_entry(ctx: &BuildContext, dist: &Path, entry: &Entry) -> Result<bool> {
    let paths = ctx.paths();
    let staleness = ctx.staleness();
    let body_path = paths.post_body_html(&entry.slug);
    let references_path = paths.static_references_html(&entry.slug);

    let linked = ctx.linked_entries(entry).await?;
    let body_due = staleness.is_entry_stale(entry) || !exists(&body_path).await;
    let references_due =
        staleness.is_stale_with_links(entry, linked) || !exists(&references_path).await;
    if !body_due && !references_due {
        return Ok(false);
    }

    let page = rendered_page_path(dist, entry, ctx.links());
    let html = tokio::fs::read_to_string(&page).await?;
    let containers = extract_containers(&html)?;

    if body_due {
        write_container(&body_path, containers.post_body, POST_BODY_CLASS, &page).await?;
    }
    if references_due {
        write_container(
            &references_path,
            containers.static_references,
            STATIC_REFERENCES_CLASS,
            &page,
        )
        .await?;
    }
    Ok(true)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// A missing container leaves the previous cache file in place.
async fn write_container(
    target: &Path,
    inner: Option<String>,
    class: &str,
    page: &Path,
) -> Result<()> {
    let Some(inner) = inner else {
        log::warn!("No div.{} in {}", class, page.display());
        return Ok(());
    };
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(target, inner).await?;
    log::debug!("Cached {}", target.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_both_containers() {
        let html = r#"<html><body><main><div class="post-body mx-auto"><p>Body</p></div>
            <div class="static-references"><a href="/posts/b/">B</a></div></main></body></html>"#;
        let found = extract_containers(html).unwrap();
        assert_eq!(found.post_body.as_deref(), Some("<p>Body</p>"));
        assert_eq!(
            found.static_references.as_deref(),
            Some(r#"<a href="/posts/b/">B</a>"#)
        );
    }

    #[test]
    fn missing_containers_are_none() {
        let found = extract_containers("<html><body><p>nothing</p></body></html>").unwrap();
        assert_eq!(found, RenderedContainers::default());
    }
}
