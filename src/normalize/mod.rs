//! Raw API payloads to the normalized content model.
//!
//! Every function here is pure: one raw node in, one normalized value out.
//! Recursion into children is the fetcher's job.

mod block;
mod entry;
mod rich_text;

pub use block::{normalize_block, normalize_column, normalize_file, normalize_icon, normalize_table_row};
pub use entry::{is_valid_page, normalize_database, normalize_entries, normalize_entry, sort_by_publish_date};
pub use rich_text::{normalize_rich_text, normalize_rich_texts, parse_internal_href};

/// Switches that change how payloads are normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Point hosted images at their `.webp` variant.
    pub optimize_images: bool,
}

/// Whether the file name in `url` has an extension the image optimizer
/// converts.
pub fn is_optimizable_image(url: &str) -> bool {
    extension_of(url)
        .map(|ext| {
            crate::constants::OPTIMIZABLE_IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// `url` with the extension of its last path segment replaced by `.webp`.
pub fn webp_variant(url: &str) -> String {
    let (path, query) = match url.find('?') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        Some(dot) => format!("{}.webp{}", &path[..file_start + dot], query),
        None => url.to_string(),
    }
}

fn extension_of(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    Some(ext)
}
