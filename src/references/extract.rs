//! Links found in one page, block by block.

use crate::model::{Block, BlockKind};
use crate::types::{Mention, PageId, RichText};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The outgoing links of one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencesInPage {
    pub block: Block,
    /// Spans pointing at another page of the workspace.
    pub other_pages: Vec<RichText>,
    /// Spans pointing outside the workspace.
    pub external_hrefs: Vec<RichText>,
    /// Spans pointing back into the page being scanned.
    pub same_page: Vec<RichText>,
    pub direct_media_link: Option<String>,
    pub direct_nonmedia_link: Option<String>,
    pub link_to_page_id: Option<PageId>,
}

impl ReferencesInPage {
    /// Pages this block links to, through spans or a link-to-page block.
    pub fn linked_pages(&self) -> impl Iterator<Item = &PageId> {
        self.other_pages
            .iter()
            .filter_map(RichText::referenced_page)
            .chain(self.link_to_page_id.iter())
    }
}

/// Where a reference-bearing span points. Each span has at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanTarget {
    OtherPage,
    SamePage,
    External,
}

pub fn classify_span(page: &PageId, span: &RichText) -> Option<SpanTarget> {
    if let Some(target) = span.referenced_page() {
        return Some(if target == page {
            SpanTarget::SamePage
        } else {
            SpanTarget::OtherPage
        });
    }
    match span.mention() {
        Some(Mention::LinkMention(_)) => Some(SpanTarget::External),
        Some(_) => None,
        None if span.href.is_some() => Some(SpanTarget::External),
        None => None,
    }
}

/// One record per block of `blocks`, in reading order with parents before
/// their children.
pub fn extract_references_in_page(page: &PageId, blocks: &[Block]) -> Vec<ReferencesInPage> {
    let mut out = Vec::new();
    crate::model::walk_blocks(blocks, &mut |block| out.push(references_in_block(page, block)));
    out
}

fn references_in_block(page: &PageId, block: &Block) -> ReferencesInPage {
    let mut other_pages = Vec::new();
    let mut external_hrefs = Vec::new();
    let mut same_page = Vec::new();

    for span in block.rich_texts() {
        match classify_span(page, span) {
            Some(SpanTarget::OtherPage) => other_pages.push(span.clone()),
            Some(SpanTarget::SamePage) => same_page.push(span.clone()),
            Some(SpanTarget::External) => external_hrefs.push(span.clone()),
            None => {}
        }
    }

    let direct_nonmedia_link = match &block.kind {
        BlockKind::Embed(u) | BlockKind::LinkPreview(u) | BlockKind::Bookmark(u)
            if !u.url.is_empty() =>
        {
            Some(u.url.clone())
        }
        _ => None,
    };

    let link_to_page_id = match &block.kind {
        BlockKind::LinkToPage(link) if &link.page_id != page => Some(link.page_id.clone()),
        _ => None,
    };

    ReferencesInPage {
        block: block.clone(),
        other_pages,
        external_hrefs,
        same_page,
        direct_media_link: block
            .media()
            .and_then(|m| m.preferred_url())
            .map(String::from),
        direct_nonmedia_link,
        link_to_page_id,
    }
}

/// Every page linked from any of `references`.
pub fn linked_page_ids(references: &[ReferencesInPage]) -> BTreeSet<PageId> {
    references
        .iter()
        .flat_map(|r| r.linked_pages().cloned())
        .collect()
}
