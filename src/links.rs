//! Site URLs for entries, headings and navigation.

use crate::model::{Block, BlockKind, Entry};
use crate::types::RichTextContent;

/// Builds links relative to the site's base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    base_path: String,
    menu_collection: String,
    home_slug: String,
}

impl LinkBuilder {
    pub fn new(
        base_path: impl Into<String>,
        menu_collection: impl Into<String>,
        home_slug: impl Into<String>,
    ) -> Self {
        Self {
            base_path: base_path.into(),
            menu_collection: menu_collection.into(),
            home_slug: home_slug.into(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// `nav` under the base path.
    pub fn nav_link(&self, nav: &str) -> String {
        if nav.is_empty() {
            return ensure_trailing_slash(posix_join(&[&self.base_path]));
        }
        posix_join(&[&self.base_path, nav])
    }

    /// `/posts/<slug>/` for posts, `/<slug>/` for menu pages and `/` for
    /// the home page. Always ends with a slash.
    pub fn post_link(&self, slug: &str, is_menu_page: bool) -> String {
        let path = if !is_menu_page {
            posix_join(&[&self.base_path, "posts", slug])
        } else if slug == self.home_slug {
            posix_join(&[&self.base_path, "/"])
        } else {
            posix_join(&[&self.base_path, slug])
        };
        ensure_trailing_slash(path)
    }

    pub fn entry_link(&self, entry: &Entry) -> String {
        self.post_link(&entry.slug, entry.is_menu_page(&self.menu_collection))
    }

    /// `entry_link` plus a fragment pointing at `block`.
    pub fn block_link(&self, entry: &Entry, block: &Block) -> String {
        format!("{}#{}", self.entry_link(entry), block_anchor(block))
    }

    pub fn is_home(&self, entry: &Entry) -> bool {
        entry.is_menu_page(&self.menu_collection) && entry.slug == self.home_slug
    }

    pub fn menu_collection(&self) -> &str {
        &self.menu_collection
    }
}

/// Anchor of a block on its page: the slugified text for headings, the id
/// for everything else.
pub fn block_anchor(block: &Block) -> String {
    match &block.kind {
        BlockKind::Heading1(h) | BlockKind::Heading2(h) | BlockKind::Heading3(h) => {
            let text: Vec<&str> = h
                .rich_texts
                .iter()
                .filter_map(|rt| match &rt.content {
                    RichTextContent::Text { content, .. } => Some(content.as_str()),
                    _ => None,
                })
                .collect();
            slugify(text.join(" ").trim())
        }
        _ => block.id.to_string(),
    }
}

/// Lowercase, alphanumerics kept, every other run collapsed to one `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push('_');
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn posix_join(parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");

    let mut out = String::with_capacity(joined.len());
    for c in joined.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    if out.is_empty() {
        ".".to_string()
    } else {
        out
    }
}

fn ensure_trailing_slash(path: String) -> String {
    if path.ends_with('/') {
        path
    } else {
        format!("{}/", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Heading;
    use crate::types::{BlockId, RichText};
    use pretty_assertions::assert_eq;

    fn links() -> LinkBuilder {
        LinkBuilder::new("/", "main", "home")
    }

    #[test]
    fn home_menu_page_is_the_site_root() {
        assert_eq!(links().post_link("home", true), "/");
        assert_eq!(links().post_link("about", true), "/about/");
        assert_eq!(links().post_link("home", false), "/posts/home/");
    }

    #[test]
    fn base_path_prefixes_everything() {
        let links = LinkBuilder::new("/blog", "main", "home");
        assert_eq!(links.post_link("hello", false), "/blog/posts/hello/");
        assert_eq!(links.post_link("home", true), "/blog/");
        assert_eq!(links.nav_link(""), "/blog/");
        assert_eq!(links.nav_link("/collections/rust"), "/blog/collections/rust");
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("Rust & Async -- part 2"), "rust-async-part-2");
        assert_eq!(slugify("snake_case"), "snake_case");
        assert_eq!(slugify("Ünïcödé"), "ünïcödé");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn headings_anchor_on_their_text() {
        let heading = Block {
            id: BlockId::from_raw("h"),
            has_children: false,
            last_edited_time: chrono::Utc::now(),
            kind: BlockKind::Heading2(Heading {
                rich_texts: vec![RichText::plain("Getting "), RichText::plain("Started")],
                ..Default::default()
            }),
        };
        assert_eq!(block_anchor(&heading), "getting-started");
    }
}
