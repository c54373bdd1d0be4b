use super::{BlockId, Color, PageId};
use serde::{Deserialize, Serialize};

/// One annotated inline span of a block's text.
///
/// Spans carry no identity of their own; they are addressed by their
/// position in the owning block's text list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    pub content: RichTextContent,
    pub annotations: Annotations,
    pub plain_text: String,
    pub href: Option<String>,
    /// Set when `href` points at another page (or block) of the same
    /// workspace.
    pub internal_href: Option<InternalReference>,
}

impl RichText {
    /// A bare text span without formatting or links.
    pub fn plain(text: &str) -> Self {
        Self {
            content: RichTextContent::Text {
                content: text.to_string(),
                link: None,
            },
            annotations: Annotations::default(),
            plain_text: text.to_string(),
            href: None,
            internal_href: None,
        }
    }

    /// The page this span refers to, through an internal href first and a
    /// page mention second.
    pub fn referenced_page(&self) -> Option<&PageId> {
        self.internal_href
            .as_ref()
            .map(|r| &r.page_id)
            .or_else(|| match &self.content {
                RichTextContent::Mention(Mention::Page { page_id }) => Some(page_id),
                _ => None,
            })
    }

    pub fn mention(&self) -> Option<&Mention> {
        match &self.content {
            RichTextContent::Mention(m) => Some(m),
            _ => None,
        }
    }
}

/// Payload selected by the raw node's declared kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RichTextContent {
    Text { content: String, link: Option<Link> },
    Equation { expression: String },
    Mention(Mention),
    /// A kind this build does not model; only `plain_text` is meaningful.
    Unknown { kind: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

/// An `/<page>` or `/<page>#<block>` href decoded into typed ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalReference {
    pub page_id: PageId,
    pub block_id: Option<BlockId>,
    pub kind: ReferenceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Page,
    Block,
}

/// Closed set of inline mentions the site renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mention {
    Page { page_id: PageId },
    Date { display: String },
    LinkMention(LinkMention),
    LinkPreview { url: String },
    CustomEmoji { name: String, url: String },
    /// Any other upstream mention type (user, database, template, ...).
    Other { mention_type: String },
}

/// Unfurled metadata for a pasted link.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinkMention {
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
