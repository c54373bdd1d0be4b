use super::blocks::*;
use crate::types::{BlockId, RichText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expands to a match over every variant whose payload owns a `children`
/// list, falling through to `$otherwise` for the rest.
macro_rules! match_child_bearing {
    ($kind:expr, $b:ident => $result:expr, _ => $otherwise:expr) => {
        match $kind {
            BlockKind::Paragraph($b)
            | BlockKind::BulletedListItem($b)
            | BlockKind::NumberedListItem($b)
            | BlockKind::Quote($b)
            | BlockKind::Toggle($b) => $result,
            BlockKind::Heading1($b) | BlockKind::Heading2($b) | BlockKind::Heading3($b) => $result,
            BlockKind::ToDo($b) => $result,
            BlockKind::Callout($b) => $result,
            BlockKind::SyncedBlock($b) => $result,
            _ => $otherwise,
        }
    };
}

/// One node of a page's content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub has_children: bool,
    pub last_edited_time: DateTime<Utc>,
    pub kind: BlockKind,
}

/// Block payload, tagged by upstream type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph(TextBlock),
    Heading1(Heading),
    Heading2(Heading),
    Heading3(Heading),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    ToDo(ToDo),
    Quote(TextBlock),
    Toggle(TextBlock),
    Callout(Callout),
    Code(Code),
    Equation(Equation),
    Image(MediaBlock),
    Video(MediaBlock),
    Audio(MediaBlock),
    File(MediaBlock),
    Embed(UrlBlock),
    Bookmark(UrlBlock),
    LinkPreview(UrlBlock),
    SyncedBlock(Synced),
    Table(Table),
    ColumnList(ColumnList),
    TableOfContents(TableOfContents),
    LinkToPage(LinkToPage),
    /// Unknown type, or a known type whose payload was missing.
    Unsupported { block_type: String },
}

/// Which field of a container receives its fetched children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildField {
    Children,
    Rows,
    Columns,
}

/// How one container type gets its children.
#[derive(Debug, Clone, Copy)]
pub struct ContainerRule {
    pub block_type: &'static str,
    pub field: ChildField,
    /// Fetch even when the upstream `has_children` flag is false.
    pub always_expand: bool,
}

/// Every container type, keyed by upstream type tag.
pub const CONTAINER_RULES: &[ContainerRule] = &[
    ContainerRule { block_type: "paragraph", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "heading_1", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "heading_2", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "heading_3", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "bulleted_list_item", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "numbered_list_item", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "to_do", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "quote", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "callout", field: ChildField::Children, always_expand: false },
    ContainerRule { block_type: "toggle", field: ChildField::Children, always_expand: true },
    ContainerRule { block_type: "synced_block", field: ChildField::Children, always_expand: true },
    ContainerRule { block_type: "table", field: ChildField::Rows, always_expand: true },
    ContainerRule { block_type: "column_list", field: ChildField::Columns, always_expand: true },
];

impl Block {
    /// Upstream type tag.
    pub fn block_type(&self) -> &str {
        match &self.kind {
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::Heading1(_) => "heading_1",
            BlockKind::Heading2(_) => "heading_2",
            BlockKind::Heading3(_) => "heading_3",
            BlockKind::BulletedListItem(_) => "bulleted_list_item",
            BlockKind::NumberedListItem(_) => "numbered_list_item",
            BlockKind::ToDo(_) => "to_do",
            BlockKind::Quote(_) => "quote",
            BlockKind::Toggle(_) => "toggle",
            BlockKind::Callout(_) => "callout",
            BlockKind::Code(_) => "code",
            BlockKind::Equation(_) => "equation",
            BlockKind::Image(_) => "image",
            BlockKind::Video(_) => "video",
            BlockKind::Audio(_) => "audio",
            BlockKind::File(_) => "file",
            BlockKind::Embed(_) => "embed",
            BlockKind::Bookmark(_) => "bookmark",
            BlockKind::LinkPreview(_) => "link_preview",
            BlockKind::SyncedBlock(_) => "synced_block",
            BlockKind::Table(_) => "table",
            BlockKind::ColumnList(_) => "column_list",
            BlockKind::TableOfContents(_) => "table_of_contents",
            BlockKind::LinkToPage(_) => "link_to_page",
            BlockKind::Unsupported { block_type } => block_type,
        }
    }

    /// The container rule for this block, if its type nests content and
    /// its payload can hold it.
    pub fn container_rule(&self) -> Option<&'static ContainerRule> {
        if matches!(self.kind, BlockKind::Unsupported { .. }) {
            return None;
        }
        let block_type = self.block_type();
        CONTAINER_RULES.iter().find(|rule| rule.block_type == block_type)
    }

    /// The field to populate on a full fetch, or `None` if this block has
    /// nothing to expand.
    pub fn expansion(&self) -> Option<ChildField> {
        self.container_rule()
            .filter(|rule| rule.always_expand || self.has_children)
            .map(|rule| rule.field)
    }

    /// Directly nested blocks held in a `children` field.
    pub fn children(&self) -> &[Block] {
        match_child_bearing!(&self.kind, b => &b.children, _ => &[])
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Block>> {
        match_child_bearing!(&mut self.kind, b => Some(&mut b.children), _ => None)
    }

    pub fn rows(&self) -> &[TableRow] {
        match &self.kind {
            BlockKind::Table(table) => &table.rows,
            _ => &[],
        }
    }

    pub fn rows_mut(&mut self) -> Option<&mut Vec<TableRow>> {
        match &mut self.kind {
            BlockKind::Table(table) => Some(&mut table.rows),
            _ => None,
        }
    }

    pub fn columns(&self) -> &[Column] {
        match &self.kind {
            BlockKind::ColumnList(list) => &list.columns,
            _ => &[],
        }
    }

    pub fn columns_mut(&mut self) -> Option<&mut Vec<Column>> {
        match &mut self.kind {
            BlockKind::ColumnList(list) => Some(&mut list.columns),
            _ => None,
        }
    }

    /// Every nested block one level down, columns flattened in order.
    pub fn nested(&self) -> impl Iterator<Item = &Block> {
        self.children()
            .iter()
            .chain(self.columns().iter().flat_map(|c| c.children.iter()))
    }

    /// The block's own inline text, or its caption for media and link
    /// blocks. Table cells are returned row by row.
    pub fn rich_texts(&self) -> Vec<&RichText> {
        match &self.kind {
            BlockKind::Paragraph(b)
            | BlockKind::BulletedListItem(b)
            | BlockKind::NumberedListItem(b)
            | BlockKind::Quote(b)
            | BlockKind::Toggle(b) => b.rich_texts.iter().collect(),
            BlockKind::Heading1(h) | BlockKind::Heading2(h) | BlockKind::Heading3(h) => {
                h.rich_texts.iter().collect()
            }
            BlockKind::ToDo(t) => t.rich_texts.iter().collect(),
            BlockKind::Callout(c) => c.rich_texts.iter().collect(),
            BlockKind::Code(c) => c.rich_texts.iter().collect(),
            BlockKind::Image(m) | BlockKind::Video(m) | BlockKind::Audio(m) | BlockKind::File(m) => {
                m.caption.iter().collect()
            }
            BlockKind::Embed(u) | BlockKind::Bookmark(u) | BlockKind::LinkPreview(u) => {
                u.caption.iter().collect()
            }
            BlockKind::Table(t) => t.rows.iter().flat_map(|r| r.cells.iter().flatten()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn media(&self) -> Option<&MediaBlock> {
        match &self.kind {
            BlockKind::Image(m) | BlockKind::Video(m) | BlockKind::Audio(m) | BlockKind::File(m) => {
                Some(m)
            }
            _ => None,
        }
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            BlockKind::Heading1(_) => Some(1),
            BlockKind::Heading2(_) => Some(2),
            BlockKind::Heading3(_) => Some(3),
            _ => None,
        }
    }

    /// Concatenated plain text of the block's own spans.
    pub fn plain_text(&self) -> String {
        self.rich_texts().iter().map(|rt| rt.plain_text.as_str()).collect()
    }
}

/// Visits `blocks` and all their descendants in reading order, parents
/// before children.
pub fn walk_blocks<'a, F>(blocks: &'a [Block], visit: &mut F)
where
    F: FnMut(&'a Block),
{
    for block in blocks {
        visit(block);
        for child in block.nested() {
            walk_blocks(std::slice::from_ref(child), visit);
        }
    }
}

/// Finds a block anywhere in a tree.
pub fn find_block<'a>(blocks: &'a [Block], id: &BlockId) -> Option<&'a Block> {
    let mut found = None;
    walk_blocks(blocks, &mut |block| {
        if found.is_none() && &block.id == id {
            found = Some(block);
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, has_children: bool, kind: BlockKind) -> Block {
        Block {
            id: BlockId::from_raw(id),
            has_children,
            last_edited_time: DateTime::<Utc>::default(),
            kind,
        }
    }

    #[test]
    fn toggles_expand_regardless_of_flag() {
        let toggle = block("t", false, BlockKind::Toggle(TextBlock::default()));
        assert_eq!(toggle.expansion(), Some(ChildField::Children));

        let para = block("p", false, BlockKind::Paragraph(TextBlock::default()));
        assert_eq!(para.expansion(), None);

        let para = block("p", true, BlockKind::Paragraph(TextBlock::default()));
        assert_eq!(para.expansion(), Some(ChildField::Children));
    }

    #[test]
    fn tables_and_columns_use_their_own_fields() {
        let table = block("t", true, BlockKind::Table(Table::default()));
        assert_eq!(table.expansion(), Some(ChildField::Rows));
        let columns = block("c", true, BlockKind::ColumnList(ColumnList::default()));
        assert_eq!(columns.expansion(), Some(ChildField::Columns));
    }

    #[test]
    fn unsupported_blocks_never_expand() {
        let b = block(
            "u",
            true,
            BlockKind::Unsupported {
                block_type: "paragraph".into(),
            },
        );
        assert_eq!(b.expansion(), None);
        assert!(b.children().is_empty());
    }

    #[test]
    fn walk_is_pre_order_through_columns() {
        let leaf = block("leaf", false, BlockKind::Paragraph(TextBlock::default()));
        let mut toggle = block("toggle", true, BlockKind::Toggle(TextBlock::default()));
        toggle.children_mut().unwrap().push(leaf);
        let columns = block(
            "cols",
            true,
            BlockKind::ColumnList(ColumnList {
                columns: vec![Column {
                    id: BlockId::from_raw("col"),
                    has_children: true,
                    children: vec![toggle],
                }],
            }),
        );
        let tail = block("tail", false, BlockKind::Paragraph(TextBlock::default()));
        let tree = vec![columns, tail];

        let mut order = Vec::new();
        walk_blocks(&tree, &mut |b| order.push(b.id.as_str().to_string()));
        assert_eq!(order, vec!["cols", "toggle", "leaf", "tail"]);
        assert!(find_block(&tree, &BlockId::from_raw("leaf")).is_some());
    }
}
