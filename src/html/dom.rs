//! A minimal owned DOM for rendered HTML, read with quick-xml.
//!
//! Tolerant of the HTML quirks a generated site actually contains: void
//! elements without a closing tag, valueless attributes, raw-text
//! `<script>`/`<style>` bodies and stray end tags. Text is kept exactly as
//! written, entities included, so a parse/serialize round trip does not
//! change unrelated markup.

use crate::error::{AppError, Result};
use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, still escaped.
    Text(String),
    Comment(String),
    /// Markup passed through untouched (doctype, CDATA, script bodies).
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Written as `<name/>` in the source.
    pub self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    fn from_start(start: &BytesStart<'_>, self_closing: bool) -> Self {
        let attrs = start
            .html_attributes()
            .with_checks(false)
            .flatten()
            .map(|attr| {
                (
                    String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                    String::from_utf8_lossy(&attr.value).into_owned(),
                )
            })
            .collect();
        Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attrs,
            children: Vec::new(),
            self_closing,
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Whether `class` lists `class_name` as one of its tokens.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|token| token == class_name))
            .unwrap_or(false)
    }

    pub fn is_void(&self) -> bool {
        is_void(&self.name)
    }

    /// Concatenated text of all descendants, entities decoded.
    pub fn text_content(&self) -> String {
        text_content(&self.children)
    }

    pub fn inner_html(&self) -> String {
        to_html(&self.children)
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&value.replace('"', "&quot;"));
            out.push('"');
        }
        if self.children.is_empty() {
            if self.is_void() {
                out.push('>');
                return;
            }
            if self.self_closing {
                out.push_str("/>");
                return;
            }
        }
        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Node::Element(e) => e.write_to(out),
            Node::Text(text) | Node::Raw(text) => out.push_str(text),
            Node::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| name.eq_ignore_ascii_case(v))
}

fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.iter().any(|v| name.eq_ignore_ascii_case(v))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn malformed(reader: &Reader<&[u8]>, e: impl std::fmt::Display) -> AppError {
    AppError::MalformedHtml {
        context: format!("byte {}", reader.buffer_position()),
        message: e.to_string(),
    }
}

/// Appends `node` to the innermost open element, or to the top level.
fn attach(stack: &mut [Element], top: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

/// Parses a document or fragment into its top-level nodes.
pub fn parse_html(input: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);

    let mut top = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Start(start) => {
                let mut element = Element::from_start(&start, false);
                if element.is_void() {
                    attach(&mut stack, &mut top, Node::Element(element));
                } else if is_raw_text(&element.name) {
                    let body = reader
                        .read_text(start.name())
                        .map_err(|e| malformed(&reader, e))?;
                    if !body.is_empty() {
                        element.children.push(Node::Raw(body.into_owned()));
                    }
                    attach(&mut stack, &mut top, Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Event::Empty(start) => {
                let element = Element::from_start(&start, true);
                attach(&mut stack, &mut top, Node::Element(element));
            }
            Event::End(end) => {
                let name = lossy(end.name().as_ref());
                // Stray end tags (e.g. `</br>`) are dropped.
                if let Some(open) = stack.iter().rposition(|e| e.is(&name)) {
                    while stack.len() > open {
                        if let Some(closed) = stack.pop() {
                            attach(&mut stack, &mut top, Node::Element(closed));
                        }
                    }
                }
            }
            Event::Text(text) => attach(&mut stack, &mut top, Node::Text(lossy(&text))),
            Event::CData(data) => attach(
                &mut stack,
                &mut top,
                Node::Raw(format!("<![CDATA[{}]]>", lossy(&data))),
            ),
            Event::Comment(comment) => {
                attach(&mut stack, &mut top, Node::Comment(lossy(&comment)))
            }
            Event::Decl(decl) => {
                attach(&mut stack, &mut top, Node::Raw(format!("<?{}?>", lossy(&decl))))
            }
            Event::PI(pi) => attach(&mut stack, &mut top, Node::Raw(format!("<?{}?>", lossy(&pi)))),
            Event::DocType(doctype) => attach(
                &mut stack,
                &mut top,
                Node::Raw(format!("<!DOCTYPE {}>", lossy(&doctype).trim())),
            ),
            Event::Eof => break,
        }
    }

    // Close whatever the input left open.
    while let Some(open) = stack.pop() {
        attach(&mut stack, &mut top, Node::Element(open));
    }
    Ok(top)
}

pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.write_to(&mut out);
    }
    out
}

/// First element in document order matching `pred`.
pub fn find_first<'a, P>(nodes: &'a [Node], pred: &P) -> Option<&'a Element>
where
    P: Fn(&Element) -> bool,
{
    for node in nodes {
        if let Node::Element(element) = node {
            if pred(element) {
                return Some(element);
            }
            if let Some(found) = find_first(&element.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

/// Text of `nodes` and their descendants with entities decoded. Comments
/// and raw passthrough markup contribute nothing.
pub fn text_content(nodes: &[Node]) -> String {
    let mut out = String::new();
    collect_text(nodes, &mut out);
    out
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&decode_entities(text)),
            Node::Element(element) => collect_text(&element.children, out),
            Node::Comment(_) | Node::Raw(_) => {}
        }
    }
}

/// Decodes XML entities, `&nbsp;` and numeric references. Text with an
/// entity this does not know is returned as written.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    unescape_with(raw, |entity| {
        resolve_predefined_entity(entity).or(match entity {
            "nbsp" => Some("\u{a0}"),
            _ => None,
        })
    })
    .map(|text| text.into_owned())
    .unwrap_or_else(|_| raw.to_string())
}
