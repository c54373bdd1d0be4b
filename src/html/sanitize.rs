//! Allow-list sanitizer for syndicated post content.
//!
//! Feed readers get a reduced copy of each post: a closed set of tags and
//! attributes, links and images made absolute, site chrome dropped and the
//! "mentioned on" asides collapsed to plain link lists.

use super::dom::{self, Element, Node};
use crate::error::Result;

const ALLOWED_TAGS: &[&str] = &[
    // sections
    "address", "article", "aside", "footer", "header", "h1", "h2", "h3", "h4", "h5", "h6",
    "hgroup", "main", "nav", "section",
    // block text
    "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure", "hr", "li", "ol", "p", "pre",
    "ul",
    // inline text
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "kbd",
    "mark", "q", "rb", "rp", "rt", "rtc", "ruby", "s", "samp", "small", "span", "strong", "sub",
    "sup", "time", "u", "var", "wbr",
    // tables
    "caption", "col", "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
    // media
    "img",
];

/// Dropped together with everything inside them.
const NON_TEXT_TAGS: &[&str] = &["style", "script", "textarea", "option", "noscript", "template"];

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto", "tel"];

/// Removed when they end up with no attributes and no children.
const COLLAPSIBLE_TAGS: &[&str] = &["div", "section", "aside", "span", "p", "main"];

const INTERLINK_HEADINGS: &[&str] = &[
    "Pages That Mention This Page",
    "Other Pages Mentioned On This Page",
];

const DISCLAIMER_LEAD: &str =
    "<p><em>Note:</em> This RSS feed strips out SVGs and embeds. You might want to read the post on the webpage ";

fn allowed_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href", "title", "target"],
        "img" => &["src", "alt", "title"],
        "td" => &["align", "valign"],
        "th" => &["align", "valign", "colspan", "rowspan", "scope"],
        "pre" => &["data-language"],
        _ => &[],
    }
}

/// Relative URLs are always allowed; absolute ones need a known scheme.
fn has_allowed_scheme(url: &str) -> bool {
    let url = url.trim();
    let Some(colon) = url.find(':') else {
        return true;
    };
    if url[..colon].contains(['/', '?', '#']) {
        return true;
    }
    let scheme = url[..colon].to_ascii_lowercase();
    ALLOWED_SCHEMES.contains(&scheme.as_str())
}

/// Sanitizes rendered post HTML for a feed whose links resolve against
/// `base_url`.
#[derive(Debug, Clone)]
pub struct FeedSanitizer {
    base_url: String,
}

impl FeedSanitizer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Filters `html` down to the allow list and tidies what is left.
    ///
    /// Running this on its own output returns the output unchanged.
    pub fn sanitize(&self, html: &str) -> Result<String> {
        Ok(dom::to_html(&self.sanitize_nodes(dom::parse_html(html)?)))
    }

    pub fn sanitize_nodes(&self, nodes: Vec<Node>) -> Vec<Node> {
        let mut nodes = self.filter_nodes(nodes);
        collapse_interlinks(&mut nodes);
        remove_empty(&mut nodes, false);
        unwrap_article(nodes)
    }

    /// The cached feed fragment for one item: sanitized content behind the
    /// read-on-the-site disclaimer. Content that already carries the
    /// disclaimer keeps its single copy.
    pub fn feed_fragment(&self, html: &str, item_link: &str) -> Result<String> {
        let body = self.sanitize(strip_disclaimer(html))?;
        Ok(format!("{}{}", disclaimer(item_link), body))
    }

    fn filter_nodes(&self, nodes: Vec<Node>) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Text(text) => out.push(Node::Text(text)),
                Node::Element(element) => self.filter_element(element, &mut out),
                Node::Comment(_) | Node::Raw(_) => {}
            }
        }
        out
    }

    fn filter_element(&self, element: Element, out: &mut Vec<Node>) {
        let mut element = self.transform(element);
        if NON_TEXT_TAGS.contains(&element.name.as_str()) {
            return;
        }

        let children = self.filter_nodes(std::mem::take(&mut element.children));
        if is_excluded(&element, &children) {
            return;
        }

        if !ALLOWED_TAGS.contains(&element.name.as_str()) {
            out.extend(children);
            return;
        }

        let allowed = allowed_attributes(&element.name);
        element.attrs.retain(|(key, value)| {
            allowed.contains(&key.as_str())
                && (!matches!(key.as_str(), "href" | "src") || has_allowed_scheme(value))
        });
        element.children = children;
        element.self_closing = false;
        out.push(Node::Element(element));
    }

    fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Tag renames and URL rewrites, applied before filtering.
    fn transform(&self, mut element: Element) -> Element {
        element.name = element.name.to_ascii_lowercase();
        match element.name.as_str() {
            "details" | "summary" => element.name = "div".to_string(),
            "a" => {
                if let Some(href) = element.attr("href").filter(|h| h.starts_with('/')) {
                    let href = self.absolute(href);
                    element.set_attr("href", href);
                }
            }
            "img" => {
                if let Some(src) = element.attr("src").filter(|s| s.starts_with('/')) {
                    let src = self.absolute(src);
                    element.set_attr("src", src);
                }
            }
            "span" if element.attr("data-popover-target").is_some() => {
                if let Some(target) = element.attr("data-href").filter(|h| h.starts_with('/')) {
                    let href = self.absolute(target);
                    element.name = "a".to_string();
                    element.set_attr("href", href);
                }
            }
            _ => {}
        }
        element
    }
}

/// Elements dropped with their content: screen-reader and no-feed chrome,
/// same-page popovers, the table of contents label, page titles and empty
/// text wrappers.
fn is_excluded(element: &Element, children: &[Node]) -> bool {
    let class = element.attr("class").unwrap_or_default();
    if class.contains("no-rss") || class.contains("sr-only") {
        return true;
    }
    if element.attr("data-popover-target").is_some()
        && element
            .attr("data-href")
            .is_some_and(|href| href.starts_with('#'))
    {
        return true;
    }
    match element.name.as_str() {
        "h1" => true,
        "strong" => dom::text_content(children).trim().to_lowercase() == "table of contents",
        "span" | "p" => dom::text_content(children).trim().is_empty(),
        _ => false,
    }
}

/// Drops whitespace-only text and comments, then containers left with
/// nothing in them. Whitespace inside `<pre>` is content and stays.
fn remove_empty(nodes: &mut Vec<Node>, in_pre: bool) {
    nodes.retain_mut(|node| match node {
        Node::Text(text) => in_pre || !dom::decode_entities(text).trim().is_empty(),
        Node::Comment(_) => false,
        Node::Raw(_) => true,
        Node::Element(element) => {
            let child_in_pre = in_pre || element.is("pre");
            remove_empty(&mut element.children, child_in_pre);
            !(COLLAPSIBLE_TAGS.contains(&element.name.as_str())
                && element.attrs.is_empty()
                && element.children.is_empty())
        }
    });
}

fn is_interlink_heading(element: &Element) -> bool {
    element.is("span") && INTERLINK_HEADINGS.contains(&element.text_content().trim())
}

/// Whether a heading span sits in `nodes` without another `<div>` between.
fn holds_heading(nodes: &[Node]) -> bool {
    nodes.iter().any(|node| match node {
        Node::Element(e) if is_interlink_heading(e) => true,
        Node::Element(e) if !e.is("div") => holds_heading(&e.children),
        _ => false,
    })
}

fn first_link(nodes: &[Node]) -> Option<Element> {
    dom::find_first(nodes, &|e: &Element| e.is("a")).cloned()
}

/// In each `<aside>`, reduces every entry of a "mentioned on" section to
/// its first link and removes the rules between sections.
fn collapse_interlinks(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            if element.is("aside") {
                element
                    .children
                    .retain(|child| !matches!(child, Node::Element(e) if e.is("br") || e.is("hr")));
                collapse_sections(&mut element.children);
            }
            collapse_interlinks(&mut element.children);
        }
    }
}

fn collapse_sections(nodes: &mut [Node]) {
    for node in nodes.iter_mut() {
        let Node::Element(element) = node else {
            continue;
        };
        if element.is("div") && holds_heading(&element.children) {
            element.children.retain_mut(|child| match child {
                Node::Element(entry) if entry.is("div") => match first_link(&entry.children) {
                    Some(link) => {
                        entry.children = vec![Node::Element(link)];
                        true
                    }
                    None => false,
                },
                _ => true,
            });
        } else {
            collapse_sections(&mut element.children);
        }
    }
}

/// Lifts the content of a leading `<div><article>` wrapper to the top level.
fn unwrap_article(mut nodes: Vec<Node>) -> Vec<Node> {
    let wraps_article = matches!(
        nodes.first(),
        Some(Node::Element(div)) if div.is("div")
            && div.attrs.is_empty()
            && matches!(div.children.first(), Some(Node::Element(a)) if a.is("article"))
    );
    if !wraps_article {
        return nodes;
    }

    let Node::Element(mut wrapper) = nodes.remove(0) else {
        return nodes;
    };
    let mut lifted = Vec::new();
    if let Node::Element(article) = wrapper.children.remove(0) {
        lifted.extend(article.children);
    }
    lifted.extend(wrapper.children);
    lifted.extend(nodes);
    lifted
}

pub fn disclaimer(item_link: &str) -> String {
    format!(
        "{DISCLAIMER_LEAD}<a href=\"{}\" target=\"_blank\">here</a>.</p><hr>",
        item_link.replace('"', "&quot;")
    )
}

/// `html` without a leading disclaimer block.
pub fn strip_disclaimer(html: &str) -> &str {
    if !html.starts_with(DISCLAIMER_LEAD) {
        return html;
    }
    match html.find("</p><hr>") {
        Some(end) => &html[end + "</p><hr>".len()..],
        None => html,
    }
}

/// The first `max_chars` characters of the fragment's text, with `...`
/// appended when it was cut.
pub fn text_excerpt(html: &str, max_chars: usize) -> Result<String> {
    let nodes = dom::parse_html(strip_disclaimer(html))?;
    let text = dom::text_content(&nodes);
    let text = text.trim();
    let mut excerpt: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        excerpt.push_str("...");
    }
    Ok(excerpt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sanitizer() -> FeedSanitizer {
        FeedSanitizer::new("https://example.com/")
    }

    #[test]
    fn keeps_allowed_markup_and_strips_the_rest() {
        let html = r#"<p class="lead" style="x">Hi <a href="/posts/a/" onclick="y" title="t">there</a></p><svg><path d="M0"/></svg><script>alert(1)</script>"#;
        assert_eq!(
            sanitizer().sanitize(html).unwrap(),
            r#"<p>Hi <a href="https://example.com/posts/a/" title="t">there</a></p>"#
        );
    }

    #[test]
    fn disallowed_tags_keep_their_text() {
        let html = "<p><font>kept</font> text</p><noscript>gone</noscript>";
        assert_eq!(sanitizer().sanitize(html).unwrap(), "<p>kept text</p>");
    }

    #[test]
    fn exclusions() {
        let html = concat!(
            "<h1>Title</h1>",
            r#"<div class="no-rss"><p>hidden</p></div>"#,
            r#"<span class="sr-only">skip</span>"#,
            r##"<span data-popover-target="p1" data-href="#heading">same page</span>"##,
            "<strong>Table of Contents</strong>",
            "<p> </p><span></span>",
            "<h2>Kept</h2>",
        );
        assert_eq!(sanitizer().sanitize(html).unwrap(), "<h2>Kept</h2>");
    }

    #[test]
    fn transforms_structure_and_urls() {
        let html = concat!(
            "<details><summary>More</summary><p>Body</p></details>",
            r#"<span data-popover-target="p2" data-href="/posts/b/">other</span>"#,
            r#"<img src="/notion/x/a.webp" class="w" alt="a">"#,
            r#"<a href="javascript:alert(1)">bad</a>"#,
        );
        assert_eq!(
            sanitizer().sanitize(html).unwrap(),
            concat!(
                "<div><div>More</div><p>Body</p></div>",
                r#"<a href="https://example.com/posts/b/">other</a>"#,
                r#"<img src="https://example.com/notion/x/a.webp" alt="a">"#,
                "<a>bad</a>",
            )
        );
    }

    #[test]
    fn removes_empty_containers_and_comments() {
        let html = "<div>\n  <section> </section><!-- c --><div><span>x</span></div>\n</div>";
        assert_eq!(
            sanitizer().sanitize(html).unwrap(),
            "<div><div><span>x</span></div></div>"
        );
    }

    #[test]
    fn preformatted_whitespace_survives() {
        let html = "<pre data-language=\"rust\"><code>fn main() {}\n</code>\n</pre>";
        assert_eq!(sanitizer().sanitize(html).unwrap(), html);
    }

    #[test]
    fn collapses_interlinked_asides() {
        let html = concat!(
            "<aside><hr>",
            "<div><span>Pages That Mention This Page</span>",
            r#"<div><a href="/posts/a/">A</a><p>excerpt of A</p></div>"#,
            "<div><p>no link here</p></div>",
            "</div><br></aside>",
        );
        assert_eq!(
            sanitizer().sanitize(html).unwrap(),
            concat!(
                "<aside><div><span>Pages That Mention This Page</span>",
                r#"<div><a href="https://example.com/posts/a/">A</a></div>"#,
                "</div></aside>",
            )
        );
    }

    #[test]
    fn unwraps_the_article_wrapper() {
        let html = r#"<div><article class="post"><h2>Hi</h2><p>x</p></article><div></div></div>"#;
        assert_eq!(sanitizer().sanitize(html).unwrap(), "<h2>Hi</h2><p>x</p>");
    }

    #[test]
    fn fragment_is_stable_under_resanitizing() {
        let link = "https://example.com/posts/a/";
        let html = r#"<div><article><h1>T</h1><h2>Intro</h2><p>Some &amp; text <a href="/x">x</a></p></article></div>"#;

        let once = sanitizer().feed_fragment(html, link).unwrap();
        let twice = sanitizer().feed_fragment(&once, link).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.matches("This RSS feed strips out").count(), 1);
        assert!(once.starts_with(&disclaimer(link)));
        assert_eq!(sanitizer().sanitize(strip_disclaimer(&once)).unwrap(), strip_disclaimer(&once));
    }

    #[test]
    fn excerpts_skip_the_disclaimer() {
        let html = format!("{}<p>{}</p>", disclaimer("https://e.com/"), "a".repeat(200));
        let excerpt = text_excerpt(&html, 150).unwrap();
        assert_eq!(excerpt, format!("{}...", "a".repeat(150)));
        assert_eq!(text_excerpt("<p> short </p>", 150).unwrap(), "short");
    }
}
