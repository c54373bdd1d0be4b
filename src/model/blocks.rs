use super::block::Block;
use crate::types::{BlockId, Color, PageId, RichText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paragraphs, list items, quotes and toggles: text plus nested blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    pub rich_texts: Vec<RichText>,
    pub color: Color,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Heading {
    pub rich_texts: Vec<RichText>,
    pub color: Color,
    pub is_toggleable: bool,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToDo {
    pub rich_texts: Vec<RichText>,
    pub color: Color,
    pub checked: bool,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Callout {
    pub rich_texts: Vec<RichText>,
    pub color: Color,
    pub icon: Option<Icon>,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Code {
    pub rich_texts: Vec<RichText>,
    pub caption: Vec<RichText>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Equation {
    pub expression: String,
}

/// Image, video, audio and file blocks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaBlock {
    pub caption: Vec<RichText>,
    /// `None` when the upstream payload named neither an external nor a
    /// hosted file.
    pub source: Option<FileSource>,
}

impl MediaBlock {
    /// The URL a reader should load: the optimized variant of a hosted file
    /// when there is one, the raw URL otherwise.
    pub fn preferred_url(&self) -> Option<&str> {
        self.source.as_ref().map(FileSource::preferred_url)
    }
}

/// Where a file lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FileSource {
    External { url: String },
    Hosted(HostedFile),
}

impl FileSource {
    pub fn url(&self) -> &str {
        match self {
            FileSource::External { url } => url,
            FileSource::Hosted(file) => &file.url,
        }
    }

    pub fn preferred_url(&self) -> &str {
        match self {
            FileSource::External { url } => url,
            FileSource::Hosted(file) => file.optimized_url.as_deref().unwrap_or(&file.url),
        }
    }
}

/// A Notion-hosted file behind a signed, expiring URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedFile {
    pub url: String,
    pub optimized_url: Option<String>,
    pub expiry_time: Option<DateTime<Utc>>,
}

/// Page, database and callout icons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Icon {
    Emoji(String),
    External { url: String },
    Hosted(HostedFile),
    CustomEmoji { name: String, url: String },
}

/// A block mirroring another block's children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Synced {
    /// The original block this one mirrors; `None` for an original.
    pub synced_from: Option<BlockId>,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub table_width: u32,
    pub has_column_header: bool,
    pub has_row_header: bool,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: BlockId,
    pub has_children: bool,
    pub cells: Vec<Vec<RichText>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnList {
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: BlockId,
    pub has_children: bool,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableOfContents {
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkToPage {
    pub page_id: PageId,
}

/// Embeds, bookmarks and link previews.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UrlBlock {
    pub caption: Vec<RichText>,
    pub url: String,
}
