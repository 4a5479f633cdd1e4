//! Document Renderer: picks the document path, runs the pipeline and
//! assembles the render tree.

use crate::ast::{Block, BlockKind};
use crate::diagnostic::{
    Diagnostic, W_FRONT_MATTER_UNCLOSED, W_IMAGE_UNDECODABLE, W_LINK_UNSAFE, W_TABLE_NO_SEPARATOR,
    W_TABLE_RAGGED,
};
use crate::error::Error;
use crate::front_matter::{FrontMatter, has_unclosed_front_matter, split_front_matter};
use crate::html::{decode_entities, escape_attr, is_safe_href};
use crate::inline::{InlineIssue, TAG_ATTR, transform_inline_report};
use crate::reconcile::{reconcile, reconcile_sanitized};
use crate::segment::segment_lines;
use crate::table::render_table;
use crate::tree::{RenderNode, RenderPart, RenderTable, RenderTree};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

static TAG_SYNTAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z][A-Za-z0-9-]*[\s>/]").expect("valid tag pattern"));
static STRUCTURAL_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<table\b|<p[\s>]|<h1[\s>]").expect("valid structural tag pattern"));
static TABLE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(table|tr|th|td)\b([^>]*)>").expect("valid table tag pattern")
});
static ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<a\b([^>]*)>([^<]*)</a\s*>").expect("valid anchor pattern")
});

const DROPPED_TABLE_ATTRS: &[&str] = &["style", "bgcolor", "class", "border"];

/// Options for one render call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Origin the document is served from; used to tell internal links
    /// from external ones when emitting.
    pub origin: Option<String>,
    /// Fold literal `\n` sequences into line breaks.
    pub fold_escaped_newlines: bool,
    /// Run the allow-list sanitizer over markup before reconciling it.
    pub sanitize: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            origin: None,
            fold_escaped_newlines: true,
            sanitize: true,
        }
    }
}

impl RenderOptions {
    pub fn origin_url(&self) -> Result<Option<Url>, Error> {
        self.origin
            .as_deref()
            .map(|origin| {
                Url::parse(origin).map_err(|source| Error::InvalidOrigin {
                    origin: origin.to_string(),
                    source,
                })
            })
            .transpose()
    }
}

/// Result of rendering one document.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub front_matter: Option<FrontMatter>,
    pub tree: RenderTree,
    pub diagnostics: Vec<Diagnostic>,
    pub mixed_html: bool,
}

pub fn render(content: &str) -> RenderedDocument {
    render_with_options(content, &RenderOptions::default())
}

pub fn render_with_options(content: &str, options: &RenderOptions) -> RenderedDocument {
    let mut diagnostics = Vec::new();
    if has_unclosed_front_matter(content) {
        diagnostics.push(Diagnostic::warning(
            1,
            W_FRONT_MATTER_UNCLOSED,
            "front matter is never closed; the whole input is treated as body",
        ));
    }
    let (front_matter, body) = split_front_matter(content);
    let mixed_html = is_mixed_html(content);

    let tree = if mixed_html {
        render_mixed_html(body, options)
    } else {
        render_markdown(body, options, &mut diagnostics)
    };

    debug!(
        mixed_html,
        nodes = tree.nodes.len(),
        diagnostics = diagnostics.len(),
        "rendered document"
    );
    for diagnostic in &diagnostics {
        warn!(
            line = diagnostic.line,
            code = diagnostic.code,
            "{}",
            diagnostic.message
        );
    }

    RenderedDocument {
        front_matter,
        tree,
        diagnostics,
        mixed_html,
    }
}

/// Tag syntax plus a `<table`, `<p>` or `<h1>` tag.
pub fn is_mixed_html(content: &str) -> bool {
    TAG_SYNTAX.is_match(content) && STRUCTURAL_TAG.is_match(content)
}

/// Converts `\r\n` and lone `\r` to `\n`, and literal `\n` sequences too
/// when `fold_escaped` is set.
pub fn normalize_line_endings(text: &str, fold_escaped: bool) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    if fold_escaped {
        text.replace("\\n", "\n")
    } else {
        text
    }
}

fn render_mixed_html(body: &str, options: &RenderOptions) -> RenderTree {
    let html = promote_anchors(&restyle_tables(body));
    let parts = reconcile_with(&html, options);
    if parts.is_empty() {
        return RenderTree::default();
    }
    RenderTree::new(vec![RenderNode::Fragment { parts }])
}

/// Gives table elements their structural class and drops presentational
/// attributes.
pub fn restyle_tables(html: &str) -> String {
    TABLE_TAG
        .replace_all(html, |caps: &Captures<'_>| {
            let tag = caps[1].to_ascii_lowercase();
            let mut out = format!("<{} class=\"folio-{}\"", tag, tag);
            for attr in TAG_ATTR.captures_iter(&caps[2]) {
                let name = attr[1].to_ascii_lowercase();
                if DROPPED_TABLE_ATTRS.contains(&name.as_str()) {
                    continue;
                }
                out.push(' ');
                out.push_str(&attr[0]);
            }
            out.push('>');
            out
        })
        .into_owned()
}

/// Rewrites `<a href>` elements with plain-text content into link markers.
pub fn promote_anchors(html: &str) -> String {
    ANCHOR
        .replace_all(html, |caps: &Captures<'_>| {
            let href = TAG_ATTR
                .captures_iter(&caps[1])
                .find(|attr| attr[1].eq_ignore_ascii_case("href"))
                .and_then(|attr| attr.get(2).or_else(|| attr.get(3)).or_else(|| attr.get(4)))
                .map(|m| decode_entities(m.as_str()));
            match href {
                Some(href) if is_safe_href(&href) => format!(
                    "<span class=\"folio-link\" data-href=\"{}\">{}</span>",
                    escape_attr(&href),
                    &caps[2]
                ),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn render_markdown(
    body: &str,
    options: &RenderOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> RenderTree {
    let text = normalize_line_endings(body, options.fold_escaped_newlines);
    let lines: Vec<&str> = text.lines().collect();
    let segmented = segment_lines(&lines);
    diagnostics.extend(segmented.diagnostics);
    debug!(
        lines = lines.len(),
        blocks = segmented.blocks.len(),
        "segmented markdown body"
    );

    let mut nodes = Vec::with_capacity(segmented.blocks.len());
    for block in segmented.blocks {
        nodes.push(render_block(block, options, diagnostics));
    }
    RenderTree::new(nodes)
}

fn render_block(
    block: Block,
    options: &RenderOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> RenderNode {
    let line = block.line;
    let mut inline = |text: &str| inline_parts(text, line, options, diagnostics);
    match block.kind {
        BlockKind::Heading { level, text } => RenderNode::Heading {
            level,
            content: inline(&text),
        },
        BlockKind::Paragraph { text } => RenderNode::Paragraph {
            content: inline(&text),
        },
        BlockKind::Quote { text } => RenderNode::Quote {
            content: inline(&text),
        },
        BlockKind::List { items } => RenderNode::List {
            items: items.iter().map(|item| inline(item)).collect(),
        },
        BlockKind::Code { language, body } => RenderNode::Code {
            language,
            code: body,
        },
        BlockKind::Table { raw_lines } => render_table_node(&raw_lines, line, options, diagnostics),
        BlockKind::Divider => RenderNode::Divider,
        BlockKind::Blank => RenderNode::Spacer,
    }
}

fn render_table_node(
    raw_lines: &[String],
    line: usize,
    options: &RenderOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> RenderNode {
    let lines: Vec<&str> = raw_lines.iter().map(String::as_str).collect();
    let model = render_table(&lines);
    if !model.has_separator {
        diagnostics.push(Diagnostic::warning(
            line,
            W_TABLE_NO_SEPARATOR,
            "table has no separator row; data starts after the header",
        ));
    }
    if !model.ragged_rows.is_empty() {
        diagnostics.push(Diagnostic::warning(
            line,
            W_TABLE_RAGGED,
            format!(
                "{} table row(s) differ from the header cell count and were padded",
                model.ragged_rows.len()
            ),
        ));
    }

    let headers = model
        .headers
        .iter()
        .map(|cell| inline_parts(cell, line, options, diagnostics))
        .collect();
    let rows = model
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| inline_parts(cell, line, options, diagnostics))
                .collect()
        })
        .collect();
    RenderNode::Table(RenderTable { headers, rows })
}

fn inline_parts(
    text: &str,
    line: usize,
    options: &RenderOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<RenderPart> {
    let (html, issues) = transform_inline_report(text);
    for issue in issues {
        diagnostics.push(match issue {
            InlineIssue::UnsafeLink(href) => Diagnostic::warning(
                line,
                W_LINK_UNSAFE,
                format!("link target `{}` uses a disallowed scheme", href),
            ),
            InlineIssue::UndecodableImage(src) => Diagnostic::warning(
                line,
                W_IMAGE_UNDECODABLE,
                format!("could not recover the original URL of `{}`", src),
            ),
        });
    }
    reconcile_with(&html, options)
}

fn reconcile_with(html: &str, options: &RenderOptions) -> Vec<RenderPart> {
    if options.sanitize {
        reconcile_sanitized(html)
    } else {
        reconcile(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::W_CODE_FENCE_UNCLOSED;

    fn codes(doc: &RenderedDocument) -> Vec<&'static str> {
        doc.diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn normalizes_every_line_ending() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\\nd", true), "a\nb\nc\nd");
        assert_eq!(normalize_line_endings("a\\nb", false), "a\\nb");
    }

    #[test]
    fn mixed_html_detection() {
        assert!(is_mixed_html("<p>hello</p>"));
        assert!(is_mixed_html("<table><tr><td>1</td></tr></table>"));
        assert!(!is_mixed_html("if x < y then"));
        assert!(!is_mixed_html("# Title\n<span>inline</span>"));
        assert!(!is_mixed_html("<p"));
    }

    #[test]
    fn front_matter_is_not_rendered() {
        let doc = render("---\ntitle: Test\n---\n# Hello\n");
        assert_eq!(
            doc.front_matter.as_ref().and_then(|fm| fm.get_str("title")),
            Some("Test")
        );
        assert_eq!(doc.tree.nodes.len(), 1);
    }

    #[test]
    fn unclosed_front_matter_keeps_everything() {
        let doc = render("---\ntitle: Test\n# Hello");
        assert!(doc.front_matter.is_none());
        assert_eq!(codes(&doc), vec![W_FRONT_MATTER_UNCLOSED]);
        assert!(matches!(doc.tree.nodes[0], RenderNode::Divider));
    }

    #[test]
    fn code_blocks_bypass_inline_processing() {
        let doc = render("```html\n<b>**x**</b> [a](b)\n```");
        assert_eq!(
            doc.tree.nodes,
            vec![RenderNode::Code {
                language: Some("html".to_string()),
                code: "<b>**x**</b> [a](b)".to_string(),
            }]
        );
    }

    #[test]
    fn unclosed_fence_is_reported() {
        let doc = render("```\nlet x = 1;");
        assert_eq!(codes(&doc), vec![W_CODE_FENCE_UNCLOSED]);
    }

    #[test]
    fn blank_lines_become_spacers() {
        let doc = render("a\n\n\nb");
        assert!(matches!(doc.tree.nodes[1], RenderNode::Spacer));
        assert_eq!(doc.tree.nodes.len(), 3);
    }

    #[test]
    fn ragged_table_warns_and_pads() {
        let doc = render("a | b | c\n--- | --- | ---\n1 | 2");
        assert_eq!(codes(&doc), vec![W_TABLE_RAGGED]);
        let RenderNode::Table(table) = &doc.tree.nodes[0] else {
            panic!("expected a table");
        };
        assert_eq!(table.rows[0].len(), 3);
        assert!(table.rows[0][2].is_empty());
    }

    #[test]
    fn unsafe_link_is_reported_with_its_line() {
        let doc = render("ok\n[x](javascript:alert(1))");
        assert_eq!(doc.diagnostics[0].code, W_LINK_UNSAFE);
        assert_eq!(doc.diagnostics[0].line, 2);
    }

    #[test]
    fn scripts_in_markdown_text_are_sanitized() {
        let doc = render("hi <script>alert(1)</script>");
        let RenderNode::Paragraph { content } = &doc.tree.nodes[0] else {
            panic!("expected a paragraph");
        };
        assert!(content.iter().all(|part| match part {
            RenderPart::Html { html } => !html.contains("script"),
            _ => true,
        }));
    }

    #[test]
    fn mixed_html_tables_are_restyled() {
        let out = restyle_tables("<table border=\"1\" style=\"x\"><tr bgcolor=\"#eee\"><td colspan=\"2\">a</td></tr></table>");
        assert_eq!(
            out,
            "<table class=\"folio-table\"><tr class=\"folio-tr\"><td class=\"folio-td\" colspan=\"2\">a</td></tr></table>"
        );
    }

    #[test]
    fn mixed_html_anchors_become_links() {
        let doc = render("<p>see <a href=\"https://github.com/x\">repo</a></p>");
        assert!(doc.mixed_html);
        let links: Vec<&RenderPart> = doc
            .tree
            .parts()
            .filter(|part| matches!(part, RenderPart::Link { .. }))
            .collect();
        assert_eq!(
            links,
            vec![&RenderPart::Link {
                href: "https://github.com/x".to_string(),
                text: "repo".to_string(),
            }]
        );
    }

    #[test]
    fn anchors_with_unsafe_href_stay_markup() {
        assert_eq!(
            promote_anchors("<a href=\"javascript:x()\">x</a>"),
            "<a href=\"javascript:x()\">x</a>"
        );
    }

    #[test]
    fn origin_must_parse() {
        let options = RenderOptions {
            origin: Some("not a url".to_string()),
            ..RenderOptions::default()
        };
        assert!(matches!(
            options.origin_url(),
            Err(Error::InvalidOrigin { .. })
        ));
    }
}
