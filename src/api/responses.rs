// src/api/responses.rs
//! Raw API payloads, deserialized exactly as Notion sends them.
//!
//! Only the fields the site build reads are declared; everything else is
//! ignored by serde. Optional payload sections are `Option` so a block of a
//! known type with a missing payload still deserializes and normalizes to
//! an unsupported block.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic paginated response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// A single, final page.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            object: "list".to_string(),
            results,
            next_cursor: None,
            has_more: false,
        }
    }
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawApiError {
    #[serde(default)]
    pub status: u16,
    pub code: String,
    pub message: String,
}

// --- Rich text ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRichText {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub plain_text: String,
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: RawAnnotations,
    pub text: Option<RawText>,
    pub equation: Option<RawEquation>,
    pub mention: Option<RawMention>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAnnotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawText {
    pub content: String,
    pub link: Option<RawLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLink {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEquation {
    pub expression: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMention {
    #[serde(rename = "type")]
    pub kind: String,
    pub page: Option<RawObjectRef>,
    pub date: Option<RawDate>,
    pub link_mention: Option<RawLinkMention>,
    pub link_preview: Option<RawLink>,
    pub custom_emoji: Option<RawCustomEmoji>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObjectRef {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDate {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLinkMention {
    #[serde(default)]
    pub href: String,
    pub title: Option<String>,
    pub icon_url: Option<String>,
    pub description: Option<String>,
    pub link_author: Option<String>,
    pub thumbnail_url: Option<String>,
    pub height: Option<u32>,
    pub iframe_url: Option<String>,
    pub link_provider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCustomEmoji {
    pub name: String,
    pub url: String,
}

// --- Files and icons ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFile {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub external: Option<RawExternal>,
    pub file: Option<RawHostedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExternal {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHostedFile {
    pub url: String,
    pub expiry_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIcon {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub emoji: Option<String>,
    pub external: Option<RawExternal>,
    pub file: Option<RawHostedFile>,
    pub custom_emoji: Option<RawCustomEmoji>,
}

// --- Blocks ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub has_children: bool,
    pub last_edited_time: DateTime<Utc>,
    pub paragraph: Option<RawTextPayload>,
    pub heading_1: Option<RawTextPayload>,
    pub heading_2: Option<RawTextPayload>,
    pub heading_3: Option<RawTextPayload>,
    pub bulleted_list_item: Option<RawTextPayload>,
    pub numbered_list_item: Option<RawTextPayload>,
    pub to_do: Option<RawTextPayload>,
    pub quote: Option<RawTextPayload>,
    pub toggle: Option<RawTextPayload>,
    pub callout: Option<RawTextPayload>,
    pub code: Option<RawCodePayload>,
    pub equation: Option<RawEquation>,
    pub image: Option<RawFilePayload>,
    pub video: Option<RawFilePayload>,
    pub audio: Option<RawFilePayload>,
    pub file: Option<RawFilePayload>,
    pub embed: Option<RawUrlPayload>,
    pub bookmark: Option<RawUrlPayload>,
    pub link_preview: Option<RawUrlPayload>,
    pub synced_block: Option<RawSyncedPayload>,
    pub table: Option<RawTablePayload>,
    pub table_row: Option<RawTableRowPayload>,
    pub column_list: Option<serde_json::Value>,
    pub table_of_contents: Option<RawColorPayload>,
    pub link_to_page: Option<RawLinkToPagePayload>,
}

/// Shared shape of every text-bearing block payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTextPayload {
    #[serde(default)]
    pub rich_text: Vec<RawRichText>,
    pub color: Option<String>,
    #[serde(default)]
    pub is_toggleable: bool,
    pub checked: Option<bool>,
    pub icon: Option<RawIcon>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCodePayload {
    #[serde(default)]
    pub rich_text: Vec<RawRichText>,
    #[serde(default)]
    pub caption: Vec<RawRichText>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFilePayload {
    #[serde(default)]
    pub caption: Vec<RawRichText>,
    #[serde(flatten)]
    pub file: RawFile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUrlPayload {
    #[serde(default)]
    pub caption: Vec<RawRichText>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSyncedPayload {
    pub synced_from: Option<RawSyncedFrom>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSyncedFrom {
    pub block_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTablePayload {
    #[serde(default)]
    pub table_width: u32,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTableRowPayload {
    #[serde(default)]
    pub cells: Vec<Vec<RawRichText>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawColorPayload {
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLinkToPagePayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub page_id: Option<String>,
}

// --- Pages and databases ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    pub id: String,
    pub last_edited_time: DateTime<Utc>,
    pub icon: Option<RawIcon>,
    pub cover: Option<RawFile>,
    #[serde(default)]
    pub properties: RawEntryProperties,
}

/// The database columns the site reads, by their Notion names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntryProperties {
    #[serde(rename = "Page")]
    pub page: Option<RawProperty>,
    #[serde(rename = "Collection")]
    pub collection: Option<RawProperty>,
    #[serde(rename = "Slug")]
    pub slug: Option<RawProperty>,
    #[serde(rename = "Publish Date")]
    pub publish_date: Option<RawProperty>,
    #[serde(rename = "Tags")]
    pub tags: Option<RawProperty>,
    #[serde(rename = "Excerpt")]
    pub excerpt: Option<RawProperty>,
    #[serde(rename = "FeaturedImage")]
    pub featured_image: Option<RawProperty>,
    #[serde(rename = "Rank")]
    pub rank: Option<RawProperty>,
    #[serde(rename = "Last Updated Date")]
    pub last_updated_date: Option<RawProperty>,
    #[serde(rename = "Pinned")]
    pub pinned: Option<RawProperty>,
    #[serde(rename = "Bluesky Post Link")]
    pub bluesky_post_link: Option<RawProperty>,
}

/// Any property value; only the section matching its type is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProperty {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: Option<Vec<RawRichText>>,
    pub rich_text: Option<Vec<RawRichText>>,
    pub select: Option<RawSelectOption>,
    pub multi_select: Option<Vec<RawSelectOption>>,
    pub formula: Option<RawFormula>,
    pub number: Option<f64>,
    pub checkbox: Option<bool>,
    pub url: Option<String>,
    pub files: Option<Vec<RawNamedFile>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSelectOption {
    pub id: Option<String>,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFormula {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub string: Option<String>,
    pub date: Option<RawDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNamedFile {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub file: RawFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDatabase {
    pub id: String,
    #[serde(default)]
    pub title: Vec<RawRichText>,
    #[serde(default)]
    pub description: Vec<RawRichText>,
    pub icon: Option<RawIcon>,
    pub cover: Option<RawFile>,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}
