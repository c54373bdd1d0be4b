//! Cross-page links: what each page links to, and what links to it.

mod backlinks;
mod extract;

pub use backlinks::{invert_references, load_backlinks, write_backlinks, Backlink, BacklinkIndex};
pub use extract::{
    classify_span, extract_references_in_page, linked_page_ids, ReferencesInPage, SpanTarget,
};
