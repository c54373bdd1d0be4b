//! Database rows and database metadata.

use super::block::{normalize_file, normalize_icon};
use crate::api::responses::{RawDatabase, RawPage, RawProperty, RawRichText};
use crate::links::slugify;
use crate::model::{parse_notion_date, Database, Entry, Tag};
use crate::types::{Color, PageId};

/// A row is usable only if its title is non-empty.
pub fn is_valid_page(raw: &RawPage) -> bool {
    raw.properties
        .page
        .as_ref()
        .and_then(|p| p.title.as_ref())
        .map(|title| !title.is_empty())
        .unwrap_or(false)
}

pub fn normalize_entry(raw: &RawPage) -> Entry {
    let props = &raw.properties;

    Entry {
        page_id: PageId::from_raw(&raw.id),
        title: props
            .page
            .as_ref()
            .and_then(|p| p.title.as_deref())
            .map(plain_text)
            .unwrap_or_default(),
        slug: formula_string(props.slug.as_ref())
            .map(slugify)
            .unwrap_or_default(),
        collection: props
            .collection
            .as_ref()
            .and_then(|p| p.select.as_ref())
            .map(|s| s.name.clone())
            .unwrap_or_default(),
        last_updated_time: raw.last_edited_time,
        publish_date: formula_date(props.publish_date.as_ref()),
        last_updated_date: formula_date(props.last_updated_date.as_ref()),
        tags: props
            .tags
            .as_ref()
            .and_then(|p| p.multi_select.as_ref())
            .map(|options| {
                options
                    .iter()
                    .map(|option| Tag {
                        id: option.id.clone(),
                        name: option.name.clone(),
                        color: Color::from_api(option.color.as_deref()),
                        description: None,
                    })
                    .collect()
            })
            .unwrap_or_default(),
        rank: props.rank.as_ref().and_then(|p| p.number),
        excerpt: props
            .excerpt
            .as_ref()
            .and_then(|p| p.rich_text.as_deref())
            .map(plain_text)
            .unwrap_or_default(),
        featured_image: props
            .featured_image
            .as_ref()
            .and_then(|p| p.files.as_ref())
            .and_then(|files| files.first())
            .and_then(|first| normalize_file(&first.file, false)),
        icon: raw.icon.as_ref().and_then(normalize_icon),
        cover: raw.cover.as_ref().and_then(|c| normalize_file(c, false)),
        pinned: props
            .pinned
            .as_ref()
            .and_then(|p| p.checkbox)
            .unwrap_or(false),
        bluesky_post_link: props
            .bluesky_post_link
            .as_ref()
            .and_then(|p| p.url.clone())
            .filter(|url| !url.is_empty()),
    }
}

/// Valid rows with a usable slug, newest first.
pub fn normalize_entries(raw: &[RawPage]) -> Vec<Entry> {
    let mut entries: Vec<Entry> = raw
        .iter()
        .filter(|page| is_valid_page(page))
        .map(normalize_entry)
        .filter(|entry| {
            if entry.slug.is_empty() {
                log::debug!("Dropping '{}': slug is empty", entry.title);
                return false;
            }
            true
        })
        .collect();
    sort_by_publish_date(&mut entries);
    entries
}

/// Descending by publish date; undated entries go last, in input order.
pub fn sort_by_publish_date(entries: &mut [Entry]) {
    entries.sort_by(|a, b| match (&a.publish_date, &b.publish_date) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

pub fn normalize_database(raw: &RawDatabase) -> Database {
    Database {
        title: plain_text(&raw.title),
        description: plain_text(&raw.description),
        icon: raw.icon.as_ref().and_then(normalize_icon),
        cover: raw.cover.as_ref().and_then(|c| normalize_file(c, false)),
        last_updated_time: raw.last_edited_time,
        properties_raw: raw.properties.clone(),
    }
}

fn plain_text(rich_texts: &[RawRichText]) -> String {
    rich_texts.iter().map(|rt| rt.plain_text.as_str()).collect()
}

fn formula_string(property: Option<&RawProperty>) -> Option<&str> {
    property?.formula.as_ref()?.string.as_deref()
}

fn formula_date(property: Option<&RawProperty>) -> Option<chrono::DateTime<chrono::Utc>> {
    let start = property?.formula.as_ref()?.date.as_ref()?.start.as_deref()?;
    parse_notion_date(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn page(id: &str, title: &str, slug: &str, date: Option<&str>) -> RawPage {
        let title_spans = if title.is_empty() {
            serde_json::json!([])
        } else {
            serde_json::json!([{"type": "text", "plain_text": title, "text": {"content": title}}])
        };
        let publish_date = date.map(|d| serde_json::json!({ "start": d }));
        serde_json::from_value(serde_json::json!({
            "id": id,
            "last_edited_time": "2024-03-01T00:00:00.000Z",
            "properties": {
                "Page": {"type": "title", "title": title_spans},
                "Slug": {"type": "formula", "formula": {"type": "string", "string": slug}},
                "Collection": {"type": "select", "select": {"name": "posts"}},
                "Publish Date": {"type": "formula", "formula": {"type": "date", "date": publish_date}},
                "Tags": {"type": "multi_select", "multi_select": [{"id": "t1", "name": "rust", "color": "orange"}]},
                "Rank": {"type": "number", "number": 3.0},
                "Pinned": {"type": "checkbox", "checkbox": true}
            }
        }))
        .unwrap()
    }

    #[test]
    fn reads_the_site_columns() {
        let entry = normalize_entry(&page(
            "0123456789abcdef0123456789abcdef",
            "Hello",
            "Hello World",
            Some("2024-02-01"),
        ));

        assert_eq!(entry.page_id.as_str(), "01234567-89ab-cdef-0123-456789abcdef");
        assert_eq!(entry.title, "Hello");
        assert_eq!(entry.slug, "hello-world");
        assert_eq!(entry.collection, "posts");
        assert_eq!(
            entry.publish_date,
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(entry.tags[0].color, Color::Orange);
        assert_eq!(entry.rank, Some(3.0));
        assert!(entry.pinned);
        assert_eq!(entry.bluesky_post_link, None);
    }

    #[test]
    fn drops_untitled_and_slugless_rows_and_sorts() {
        let raw = vec![
            page("a", "Old", "old", Some("2023-01-01")),
            page("b", "", "untitled", Some("2024-01-01")),
            page("c", "No slug", "", Some("2024-01-01")),
            page("d", "Undated", "undated", None),
            page("e", "New", "new", Some("2024-06-01")),
        ];

        let slugs: Vec<String> = normalize_entries(&raw).into_iter().map(|e| e.slug).collect();
        assert_eq!(slugs, vec!["new", "old", "undated"]);
    }
}
