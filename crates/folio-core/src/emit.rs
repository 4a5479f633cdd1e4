use crate::classify::{LinkClassifier, is_internal};
use crate::html::{escape_attr, escape_html};
use crate::tree::{RenderNode, RenderPart, RenderTable, RenderTree};
use url::Url;

/// Presentation inputs for [`emit_html`].
#[derive(Clone, Debug, Default)]
pub struct EmitOptions {
    /// Links resolving to this origin are emitted without a site tag.
    pub origin: Option<Url>,
    pub classifier: LinkClassifier,
}

impl EmitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(mut self, origin: Option<Url>) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_classifier(mut self, classifier: LinkClassifier) -> Self {
        self.classifier = classifier;
        self
    }
}

/// Turns the source lines of one code block into line HTML.
///
/// An implementation returns one already-escaped string per input line, or
/// `None` to fall back to plain escaped text.
pub trait CodeHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Option<Vec<String>>;
}

/// Escapes each line and adds no markup.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainCode;

impl CodeHighlighter for PlainCode {
    fn highlight_lines(&self, _language: Option<&str>, lines: &[&str]) -> Option<Vec<String>> {
        Some(lines.iter().map(|line| escape_html(line)).collect())
    }
}

/// Emits HTML for a render tree.
pub fn emit_html(tree: &RenderTree, options: &EmitOptions) -> String {
    emit_html_with(tree, options, &PlainCode)
}

/// Emits HTML for a render tree, formatting code blocks with `highlighter`.
pub fn emit_html_with(
    tree: &RenderTree,
    options: &EmitOptions,
    highlighter: &dyn CodeHighlighter,
) -> String {
    // Deterministic formatting: 2-space indentation and LF newlines.
    let mut emitter = Emitter {
        writer: HtmlWriter::new(),
        options,
        highlighter,
        next_image: 0,
    };
    for node in &tree.nodes {
        emitter.node(node);
    }
    emitter.writer.finish()
}

struct HtmlWriter {
    out: String,
    indent: usize,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(line);
        self.out.push('\n');
    }

    /// Writes preformatted text without indentation.
    fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        if !text.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn finish(mut self) -> String {
        if self.out.ends_with('\n') {
            self.out.pop();
        }
        self.out
    }
}

struct Emitter<'a> {
    writer: HtmlWriter,
    options: &'a EmitOptions,
    highlighter: &'a dyn CodeHighlighter,
    // Numbering matches `RenderTree::images`.
    next_image: usize,
}

impl Emitter<'_> {
    fn node(&mut self, node: &RenderNode) {
        match node {
            RenderNode::Heading { level, content } => {
                let inner = self.parts(content);
                self.writer
                    .line(&format!("<h{}>{}</h{}>", level, inner, level));
            }
            RenderNode::Paragraph { content } => {
                let inner = self.parts(content);
                self.writer.line(&format!("<p>{}</p>", inner));
            }
            RenderNode::Quote { content } => {
                let inner = self.parts(content);
                self.writer.line("<blockquote>");
                self.writer.indent += 1;
                self.writer.line(&format!("<p>{}</p>", inner));
                self.writer.indent -= 1;
                self.writer.line("</blockquote>");
            }
            RenderNode::List { items } => {
                self.writer.line("<ul>");
                self.writer.indent += 1;
                for item in items {
                    let inner = self.parts(item);
                    self.writer.line(&format!("<li>{}</li>", inner));
                }
                self.writer.indent -= 1;
                self.writer.line("</ul>");
            }
            RenderNode::Divider => self.writer.line("<hr />"),
            RenderNode::Spacer => self.writer.line("<div class=\"folio-spacer\"></div>"),
            RenderNode::Code { language, code } => {
                let figure = code_figure(language.as_deref(), code, self.highlighter);
                self.writer.raw(&figure);
            }
            RenderNode::Table(table) => self.table(table),
            RenderNode::Fragment { parts } => {
                let inner = self.parts(parts);
                self.writer.raw(&inner);
            }
        }
    }

    fn table(&mut self, table: &RenderTable) {
        self.writer.line("<table class=\"folio-table\">");
        self.writer.indent += 1;
        self.writer.line("<thead>");
        self.writer.indent += 1;
        let header = self.row(&table.headers, "th");
        self.writer.line(&header);
        self.writer.indent -= 1;
        self.writer.line("</thead>");
        if !table.rows.is_empty() {
            self.writer.line("<tbody>");
            self.writer.indent += 1;
            for row in &table.rows {
                let row = self.row(row, "td");
                self.writer.line(&row);
            }
            self.writer.indent -= 1;
            self.writer.line("</tbody>");
        }
        self.writer.indent -= 1;
        self.writer.line("</table>");
    }

    fn row(&mut self, cells: &[Vec<RenderPart>], tag: &str) -> String {
        let mut out = String::from("<tr class=\"folio-tr\">");
        for cell in cells {
            let inner = self.parts(cell);
            out.push_str(&format!(
                "<{} class=\"folio-{}\">{}</{}>",
                tag, tag, inner, tag
            ));
        }
        out.push_str("</tr>");
        out
    }

    fn parts(&mut self, parts: &[RenderPart]) -> String {
        let mut out = String::new();
        for part in parts {
            match part {
                RenderPart::Html { html } => out.push_str(html),
                RenderPart::Link { href, text } => out.push_str(&self.link(href, text)),
                RenderPart::Code { language, code } => {
                    out.push_str(&code_figure(language.as_deref(), code, self.highlighter));
                }
                RenderPart::Image { src, alt, style } => {
                    let index = self.next_image;
                    self.next_image += 1;
                    out.push_str(&format!(
                        "<img class=\"folio-zoomable\" src=\"{}\" alt=\"{}\" data-folio-zoom=\"{}\"",
                        escape_attr(src),
                        escape_attr(alt),
                        index
                    ));
                    if let Some(width) = &style.width {
                        out.push_str(&format!(" width=\"{}\"", escape_attr(width)));
                    }
                    if let Some(height) = &style.height {
                        out.push_str(&format!(" height=\"{}\"", escape_attr(height)));
                    }
                    let css = style.css();
                    if !css.is_empty() {
                        out.push_str(&format!(" style=\"{}\"", escape_attr(&css)));
                    }
                    out.push_str(" loading=\"lazy\" />");
                }
                RenderPart::UnavailableImage { alt, src, original } => {
                    let target = original.as_deref().unwrap_or(src);
                    out.push_str("<span class=\"folio-image-unavailable\">");
                    out.push_str("<span class=\"folio-image-unavailable-title\">Image unavailable</span>");
                    if !alt.is_empty() {
                        out.push_str(&format!(
                            "<span class=\"folio-image-unavailable-alt\">{}</span>",
                            escape_html(alt)
                        ));
                    }
                    out.push_str(&format!(
                        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">View original</a>",
                        escape_attr(target)
                    ));
                    out.push_str("</span>");
                }
            }
        }
        out
    }

    fn link(&self, href: &str, text: &str) -> String {
        if is_internal(href, self.options.origin.as_ref()) {
            return format!(
                "<a class=\"folio-link\" href=\"{}\">{}</a>",
                escape_attr(href),
                escape_html(text)
            );
        }
        let info = self.options.classifier.classify(href);
        format!(
            concat!(
                "<a class=\"folio-link folio-link--{}\" href=\"{}\" target=\"_blank\" ",
                "rel=\"noopener noreferrer\" data-domain=\"{}\" ",
                "style=\"--folio-link-fg: {}; --folio-link-bg: {};\">",
                "<span class=\"folio-link-icon\" aria-hidden=\"true\">{}</span>",
                "<span class=\"folio-link-text\">{}</span>",
                "<span class=\"folio-link-label\">{}</span></a>"
            ),
            info.category.as_str(),
            escape_attr(href),
            escape_attr(&info.domain),
            escape_attr(&info.color),
            escape_attr(&info.background),
            escape_html(&info.icon),
            escape_html(text),
            escape_html(&info.label)
        )
    }
}

/// A code figure with one `span.line` per source line. A trailing empty
/// line is not numbered.
fn code_figure(language: Option<&str>, code: &str, highlighter: &dyn CodeHighlighter) -> String {
    let lang_attr = language
        .map(|value| format!(" data-lang=\"{}\"", escape_attr(value)))
        .unwrap_or_default();
    let code_class = language
        .map(|value| format!("language-{}", escape_attr(value)))
        .unwrap_or_else(|| "language-".to_string());

    let mut out = format!(
        "<figure class=\"folio-codeblock\"{}><pre class=\"folio-pre\"><code class=\"{}\">",
        lang_attr, code_class
    );
    let lines: Vec<&str> = code.split('\n').collect();
    let lines = match lines.split_last() {
        Some((last, rest)) if last.is_empty() && !rest.is_empty() => rest,
        _ => &lines[..],
    };
    let rendered = highlighter
        .highlight_lines(language, lines)
        .filter(|rendered| rendered.len() == lines.len())
        .unwrap_or_else(|| lines.iter().map(|line| escape_html(line)).collect());
    for (idx, line) in rendered.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "<span class=\"line\" data-line=\"{}\">{}</span>",
            idx + 1,
            line
        ));
    }
    out.push_str("</code></pre></figure>");
    out
}
