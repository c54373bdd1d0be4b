use super::blocks::{FileSource, Icon};
use crate::types::{Color, PageId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A post or menu page from the content database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub page_id: PageId,
    pub title: String,
    pub slug: String,
    pub collection: String,
    /// Page-level last edit; the input to the staleness oracle.
    pub last_updated_time: DateTime<Utc>,
    pub publish_date: Option<DateTime<Utc>>,
    pub last_updated_date: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
    pub rank: Option<f64>,
    pub excerpt: String,
    pub featured_image: Option<FileSource>,
    pub icon: Option<Icon>,
    pub cover: Option<FileSource>,
    pub pinned: bool,
    pub bluesky_post_link: Option<String>,
}

impl Entry {
    /// Whether this entry belongs to the given menu collection.
    pub fn is_menu_page(&self, menu_collection: &str) -> bool {
        self.collection == menu_collection
    }
}

/// A colored label attached to entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<String>,
    pub name: String,
    pub color: Color,
    /// Only filled on the database schema's option list.
    pub description: Option<String>,
}

/// Content database metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub title: String,
    pub description: String,
    pub icon: Option<Icon>,
    pub cover: Option<FileSource>,
    pub last_updated_time: DateTime<Utc>,
    /// Property schema exactly as returned upstream.
    pub properties_raw: serde_json::Map<String, serde_json::Value>,
}

impl Database {
    /// The options declared on the `Tags` multi-select property.
    pub fn tag_options(&self) -> Vec<Tag> {
        let options = self
            .properties_raw
            .get("Tags")
            .and_then(|p| p.get("multi_select"))
            .and_then(|m| m.get("options"))
            .and_then(|o| o.as_array());

        options
            .map(|options| {
                options
                    .iter()
                    .filter_map(|option| {
                        let name = option.get("name")?.as_str()?.to_string();
                        Some(Tag {
                            id: option.get("id").and_then(|v| v.as_str()).map(String::from),
                            name,
                            color: Color::from_api(option.get("color").and_then(|v| v.as_str())),
                            description: option
                                .get("description")
                                .and_then(|v| v.as_str())
                                .map(String::from),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Parses the `start` of a Notion date value, which is either a calendar
/// date (`2024-05-01`) or a full RFC 3339 timestamp.
pub fn parse_notion_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_dates_and_timestamps() {
        assert_eq!(
            parse_notion_date("2024-05-01"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_notion_date("2024-05-01T10:30:00.000+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(parse_notion_date(""), None);
        assert_eq!(parse_notion_date("yesterday"), None);
    }

    #[test]
    fn reads_tag_options_from_schema() {
        let properties = serde_json::json!({
            "Tags": {
                "multi_select": {
                    "options": [
                        {"id": "a", "name": "rust", "color": "orange", "description": "Systems"},
                        {"id": "b", "name": "web", "color": "nope"}
                    ]
                }
            }
        });
        let db = Database {
            title: "Blog".into(),
            description: String::new(),
            icon: None,
            cover: None,
            last_updated_time: Utc::now(),
            properties_raw: properties.as_object().unwrap().clone(),
        };

        let tags = db.tag_options();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].color, Color::Orange);
        assert_eq!(tags[0].description.as_deref(), Some("Systems"));
        assert_eq!(tags[1].color, Color::Default);
    }
}
