//! One raw block node to one normalized [`Block`].
//!
//! Never fails. A type this build does not model, or a known type whose
//! payload section is missing, becomes [`BlockKind::Unsupported`] with the
//! common fields intact.

use super::rich_text::normalize_rich_texts;
use super::{is_optimizable_image, webp_variant, NormalizeOptions};
use crate::api::responses::{
    RawBlock, RawFile, RawFilePayload, RawIcon, RawTextPayload, RawUrlPayload,
};
use crate::model::{
    Block, BlockKind, Callout, Code, Column, ColumnList, Equation, FileSource, Heading, HostedFile,
    Icon, LinkToPage, MediaBlock, Synced, Table, TableOfContents, TableRow, TextBlock, ToDo,
    UrlBlock,
};
use crate::types::{BlockId, Color, PageId};

pub fn normalize_block(raw: &RawBlock, options: &NormalizeOptions) -> Block {
    Block {
        id: BlockId::from_raw(&raw.id),
        has_children: raw.has_children,
        last_edited_time: raw.last_edited_time,
        kind: normalize_kind(raw, options).unwrap_or_else(|| BlockKind::Unsupported {
            block_type: raw.kind.clone(),
        }),
    }
}

fn normalize_kind(raw: &RawBlock, options: &NormalizeOptions) -> Option<BlockKind> {
    let kind = match raw.kind.as_str() {
        "paragraph" => BlockKind::Paragraph(text_block(raw.paragraph.as_ref()?)),
        "heading_1" => BlockKind::Heading1(heading(raw.heading_1.as_ref()?)),
        "heading_2" => BlockKind::Heading2(heading(raw.heading_2.as_ref()?)),
        "heading_3" => BlockKind::Heading3(heading(raw.heading_3.as_ref()?)),
        "bulleted_list_item" => {
            BlockKind::BulletedListItem(text_block(raw.bulleted_list_item.as_ref()?))
        }
        "numbered_list_item" => {
            BlockKind::NumberedListItem(text_block(raw.numbered_list_item.as_ref()?))
        }
        "quote" => BlockKind::Quote(text_block(raw.quote.as_ref()?)),
        "toggle" => BlockKind::Toggle(text_block(raw.toggle.as_ref()?)),
        "to_do" => {
            let payload = raw.to_do.as_ref()?;
            BlockKind::ToDo(ToDo {
                rich_texts: normalize_rich_texts(&payload.rich_text),
                color: Color::from_api(payload.color.as_deref()),
                checked: payload.checked.unwrap_or(false),
                children: Vec::new(),
            })
        }
        "callout" => {
            let payload = raw.callout.as_ref()?;
            BlockKind::Callout(Callout {
                rich_texts: normalize_rich_texts(&payload.rich_text),
                color: Color::from_api(payload.color.as_deref()),
                icon: payload.icon.as_ref().and_then(normalize_icon),
                children: Vec::new(),
            })
        }
        "code" => {
            let payload = raw.code.as_ref()?;
            BlockKind::Code(Code {
                rich_texts: normalize_rich_texts(&payload.rich_text),
                caption: normalize_rich_texts(&payload.caption),
                language: payload.language.clone(),
            })
        }
        "equation" => BlockKind::Equation(Equation {
            expression: raw.equation.as_ref()?.expression.clone(),
        }),
        "image" => BlockKind::Image(media(raw.image.as_ref()?, options.optimize_images)),
        "video" => BlockKind::Video(media(raw.video.as_ref()?, false)),
        "audio" => BlockKind::Audio(media(raw.audio.as_ref()?, false)),
        "file" => BlockKind::File(media(raw.file.as_ref()?, false)),
        "embed" => BlockKind::Embed(url_block(raw.embed.as_ref()?)),
        "bookmark" => BlockKind::Bookmark(url_block(raw.bookmark.as_ref()?)),
        "link_preview" => BlockKind::LinkPreview(url_block(raw.link_preview.as_ref()?)),
        "synced_block" => {
            let payload = raw.synced_block.as_ref()?;
            BlockKind::SyncedBlock(Synced {
                synced_from: payload
                    .synced_from
                    .as_ref()
                    .and_then(|from| from.block_id.as_deref())
                    .map(BlockId::from_raw),
                children: Vec::new(),
            })
        }
        "table" => {
            let payload = raw.table.as_ref()?;
            BlockKind::Table(Table {
                table_width: payload.table_width,
                has_column_header: payload.has_column_header,
                has_row_header: payload.has_row_header,
                rows: Vec::new(),
            })
        }
        "column_list" => BlockKind::ColumnList(ColumnList::default()),
        "table_of_contents" => BlockKind::TableOfContents(TableOfContents {
            color: Color::from_api(raw.table_of_contents.as_ref()?.color.as_deref()),
        }),
        "link_to_page" => {
            let payload = raw.link_to_page.as_ref()?;
            // Only page targets are rendered; database targets carry no page id.
            BlockKind::LinkToPage(LinkToPage {
                page_id: PageId::from_raw(payload.page_id.as_deref()?),
            })
        }
        _ => return None,
    };
    Some(kind)
}

fn text_block(payload: &RawTextPayload) -> TextBlock {
    TextBlock {
        rich_texts: normalize_rich_texts(&payload.rich_text),
        color: Color::from_api(payload.color.as_deref()),
        children: Vec::new(),
    }
}

fn heading(payload: &RawTextPayload) -> Heading {
    Heading {
        rich_texts: normalize_rich_texts(&payload.rich_text),
        color: Color::from_api(payload.color.as_deref()),
        is_toggleable: payload.is_toggleable,
        children: Vec::new(),
    }
}

fn media(payload: &RawFilePayload, optimize: bool) -> MediaBlock {
    MediaBlock {
        caption: normalize_rich_texts(&payload.caption),
        source: normalize_file(&payload.file, optimize),
    }
}

fn url_block(payload: &RawUrlPayload) -> UrlBlock {
    UrlBlock {
        caption: normalize_rich_texts(&payload.caption),
        url: payload.url.clone(),
    }
}

/// Picks the section named by the file's `type`. With `optimize`, hosted
/// files of a convertible image type point at their `.webp` copy; otherwise
/// the optimized URL equals the raw one.
pub fn normalize_file(raw: &RawFile, optimize: bool) -> Option<FileSource> {
    match raw.kind.as_str() {
        "external" => raw.external.as_ref().map(|external| FileSource::External {
            url: external.url.clone(),
        }),
        "file" => raw.file.as_ref().map(|file| {
            let optimized_url = if optimize && is_optimizable_image(&file.url) {
                webp_variant(&file.url)
            } else {
                file.url.clone()
            };
            FileSource::Hosted(HostedFile {
                url: file.url.clone(),
                optimized_url: Some(optimized_url),
                expiry_time: file.expiry_time,
            })
        }),
        _ => None,
    }
}

pub fn normalize_icon(raw: &RawIcon) -> Option<Icon> {
    match raw.kind.as_str() {
        "emoji" => raw.emoji.clone().map(Icon::Emoji),
        "external" => raw.external.as_ref().map(|external| Icon::External {
            url: external.url.clone(),
        }),
        "file" => raw.file.as_ref().map(|file| {
            Icon::Hosted(HostedFile {
                url: file.url.clone(),
                optimized_url: None,
                expiry_time: file.expiry_time,
            })
        }),
        "custom_emoji" => raw.custom_emoji.as_ref().map(|emoji| Icon::CustomEmoji {
            name: emoji.name.clone(),
            url: emoji.url.clone(),
        }),
        _ => None,
    }
}

/// A child of a table. Non-row children yield a row with no cells.
pub fn normalize_table_row(raw: &RawBlock) -> TableRow {
    TableRow {
        id: BlockId::from_raw(&raw.id),
        has_children: raw.has_children,
        cells: raw
            .table_row
            .as_ref()
            .map(|row| row.cells.iter().map(|cell| normalize_rich_texts(cell)).collect())
            .unwrap_or_default(),
    }
}

/// A child of a column list, before its own children are fetched.
pub fn normalize_column(raw: &RawBlock) -> Column {
    Column {
        id: BlockId::from_raw(&raw.id),
        has_children: raw.has_children,
        children: Vec::new(),
    }
}
