//! Raw inline nodes to annotated spans. Pure and infallible.

use crate::api::responses::{RawAnnotations, RawMention, RawRichText};
use crate::model::parse_notion_date;
use crate::types::{
    Annotations, BlockId, Color, InternalReference, Link, LinkMention, Mention, PageId,
    ReferenceKind, RichText, RichTextContent,
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `/<32 hex>` optionally followed by `#<block id>`.
    static ref INTERNAL_HREF: Regex =
        Regex::new(r"^/([0-9a-fA-F]{32})(?:#([^#]+))?$").expect("static regex");
}

pub fn normalize_rich_texts(raw: &[RawRichText]) -> Vec<RichText> {
    raw.iter().map(normalize_rich_text).collect()
}

pub fn normalize_rich_text(raw: &RawRichText) -> RichText {
    let content = match raw.kind.as_str() {
        "text" => match &raw.text {
            Some(text) => RichTextContent::Text {
                content: text.content.clone(),
                link: text.link.as_ref().map(|l| Link { url: l.url.clone() }),
            },
            None => unknown(&raw.kind),
        },
        "equation" => match &raw.equation {
            Some(eq) => RichTextContent::Equation {
                expression: eq.expression.clone(),
            },
            None => unknown(&raw.kind),
        },
        "mention" => match &raw.mention {
            Some(mention) => RichTextContent::Mention(normalize_mention(mention)),
            None => unknown(&raw.kind),
        },
        other => unknown(other),
    };

    RichText {
        content,
        annotations: normalize_annotations(&raw.annotations),
        plain_text: raw.plain_text.clone(),
        href: raw.href.clone(),
        internal_href: raw.href.as_deref().and_then(parse_internal_href),
    }
}

fn unknown(kind: &str) -> RichTextContent {
    RichTextContent::Unknown {
        kind: kind.to_string(),
    }
}

fn normalize_annotations(raw: &RawAnnotations) -> Annotations {
    Annotations {
        bold: raw.bold,
        italic: raw.italic,
        strikethrough: raw.strikethrough,
        underline: raw.underline,
        code: raw.code,
        color: Color::from_api(raw.color.as_deref()),
    }
}

/// Decodes a workspace-relative href into page (and block) ids. Any other
/// shape is an external link and yields `None`.
pub fn parse_internal_href(href: &str) -> Option<InternalReference> {
    let captures = INTERNAL_HREF.captures(href)?;
    let page_id = PageId::from_raw(captures.get(1)?.as_str());
    let block_id = captures.get(2).map(|m| BlockId::from_raw(m.as_str()));
    let kind = if block_id.is_some() {
        ReferenceKind::Block
    } else {
        ReferenceKind::Page
    };
    Some(InternalReference {
        page_id,
        block_id,
        kind,
    })
}

fn normalize_mention(raw: &RawMention) -> Mention {
    match raw.kind.as_str() {
        "page" => match &raw.page {
            Some(page) => Mention::Page {
                page_id: PageId::from_raw(&page.id),
            },
            None => other(&raw.kind),
        },
        "date" => {
            let display = match raw.date.as_ref().and_then(|d| d.start.as_deref()) {
                Some(start) => {
                    let end = raw.date.as_ref().and_then(|d| d.end.as_deref());
                    match end {
                        Some(end) => format!("{} to {}", format_date(start), format_date(end)),
                        None => format_date(start),
                    }
                }
                None => "Invalid Date".to_string(),
            };
            Mention::Date { display }
        }
        "link_mention" => match &raw.link_mention {
            Some(link) => Mention::LinkMention(LinkMention {
                href: link.href.clone(),
                title: link.title.clone(),
                icon_url: link.icon_url.clone(),
                description: link.description.clone(),
                link_author: link.link_author.clone(),
                thumbnail_url: link.thumbnail_url.clone(),
                height: link.height,
                iframe_url: link.iframe_url.clone(),
                link_provider: link.link_provider.clone(),
            }),
            None => other(&raw.kind),
        },
        "link_preview" => match &raw.link_preview {
            Some(preview) => Mention::LinkPreview {
                url: preview.url.clone(),
            },
            None => other(&raw.kind),
        },
        "custom_emoji" => match &raw.custom_emoji {
            Some(emoji) => Mention::CustomEmoji {
                name: emoji.name.clone(),
                url: emoji.url.clone(),
            },
            None => other(&raw.kind),
        },
        kind => other(kind),
    }
}

fn other(kind: &str) -> Mention {
    Mention::Other {
        mention_type: kind.to_string(),
    }
}

/// `May 1, 2024`, with the time appended for timestamps.
fn format_date(raw: &str) -> String {
    match parse_notion_date(raw) {
        Some(ts) if raw.contains('T') => ts.format("%B %-d, %Y %H:%M").to_string(),
        Some(ts) => ts.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(value: serde_json::Value) -> RawRichText {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn page_href_becomes_internal_reference() {
        let rt = normalize_rich_text(&raw(serde_json::json!({
            "type": "text",
            "plain_text": "see",
            "href": "/0123456789abcdef0123456789abcdef",
            "text": {"content": "see", "link": {"url": "/0123456789abcdef0123456789abcdef"}},
            "annotations": {"bold": true, "color": "red"}
        })));

        let internal = rt.internal_href.unwrap();
        assert_eq!(internal.page_id.as_str(), "01234567-89ab-cdef-0123-456789abcdef");
        assert_eq!(internal.kind, ReferenceKind::Page);
        assert_eq!(internal.block_id, None);
        assert!(rt.annotations.bold);
        assert_eq!(rt.annotations.color, Color::Red);
    }

    #[test]
    fn block_fragment_is_kept() {
        let internal =
            parse_internal_href("/0123456789abcdef0123456789abcdef#fedcba9876543210fedcba9876543210")
                .unwrap();
        assert_eq!(internal.kind, ReferenceKind::Block);
        assert_eq!(
            internal.block_id.unwrap().as_str(),
            "fedcba98-7654-3210-fedc-ba9876543210"
        );
    }

    #[test]
    fn other_hrefs_stay_external() {
        assert!(parse_internal_href("https://example.com/0123456789abcdef0123456789abcdef").is_none());
        assert!(parse_internal_href("/posts/hello").is_none());
        assert!(parse_internal_href("/0123").is_none());
    }

    #[test]
    fn mentions_dispatch_on_type() {
        let page = normalize_rich_text(&raw(serde_json::json!({
            "type": "mention",
            "plain_text": "Other",
            "mention": {"type": "page", "page": {"id": "0123456789abcdef0123456789abcdef"}}
        })));
        assert_eq!(
            page.referenced_page().unwrap().as_str(),
            "01234567-89ab-cdef-0123-456789abcdef"
        );

        let date = normalize_rich_text(&raw(serde_json::json!({
            "type": "mention",
            "plain_text": "2024-05-01",
            "mention": {"type": "date", "date": {"start": "2024-05-01", "end": null}}
        })));
        assert_eq!(
            date.mention(),
            Some(&Mention::Date {
                display: "May 1, 2024".into()
            })
        );

        let user = normalize_rich_text(&raw(serde_json::json!({
            "type": "mention",
            "plain_text": "@someone",
            "mention": {"type": "user", "user": {"id": "u"}}
        })));
        assert_eq!(
            user.mention(),
            Some(&Mention::Other {
                mention_type: "user".into()
            })
        );
    }

    #[test]
    fn unknown_kinds_keep_plain_text() {
        let rt = normalize_rich_text(&raw(serde_json::json!({
            "type": "template_mention",
            "plain_text": "x"
        })));
        assert_eq!(rt.plain_text, "x");
        assert!(matches!(rt.content, RichTextContent::Unknown { .. }));
    }
}
