//! Inline transformation: one line or table cell of raw text into typed
//! inline nodes, and from there into the intermediate HTML the reconciler
//! understands.
//!
//! Atomic nodes are cut out of the text first, in this order:
//!
//! 1. raw `<img>` tags
//! 2. Markdown images
//! 3. Markdown links
//! 4. code spans
//!
//! Emphasis then runs over the whole sequence, bold before italic, with
//! every atomic node counting as one opaque character. Delimiters can wrap
//! links and code spans, while `*` inside link text, hrefs or backticks is
//! never read as emphasis.

use crate::ast::{ImageStyle, Inline, InlineSeq};
use crate::html::{decode_entities, escape_attr, escape_html, is_safe_href};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

static RAW_IMG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid img tag pattern"));
pub(crate) static TAG_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([a-z][a-z0-9-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>/]+))"#)
        .expect("valid attribute pattern")
});
static MD_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("valid image pattern"));
static MD_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"));
static CODE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`([^`]+)`").expect("valid code span pattern"));

/// Something the transformer had to degrade while parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InlineIssue {
    /// A link whose scheme is not allowed; rendered as its text.
    UnsafeLink(String),
    /// A wrapped image URL that could not be reversed.
    UndecodableImage(String),
}

pub fn parse_inline(text: &str) -> InlineSeq {
    parse_inline_report(text).0
}

pub fn parse_inline_report(text: &str) -> (InlineSeq, Vec<InlineIssue>) {
    let mut issues = Vec::new();
    let nodes = vec![Inline::Text(text.to_string())];

    let nodes = map_text(nodes, &mut |text| {
        split_matches(text, &RAW_IMG, |caps| raw_img_node(&caps[0]))
    });
    let nodes = map_text(nodes, &mut |text| {
        split_matches(text, &MD_IMAGE, |caps| {
            markdown_image_node(&caps[1], &caps[2], &mut issues)
        })
    });
    let nodes = map_text(nodes, &mut |text| {
        split_matches(text, &MD_LINK, |caps| {
            link_node(&caps[1], &caps[2], &mut issues)
        })
    });
    let nodes = map_text(nodes, &mut |text| {
        split_matches(text, &CODE_SPAN, |caps| {
            Some(Inline::CodeSpan(caps[1].to_string()))
        })
    });

    let tokens = delimited_pass(tokens_of(nodes), 2, strong);
    let nodes = nodes_of(delimited_pass(tokens, 1, emph));
    (nodes, issues)
}

/// Transforms one text unit into intermediate HTML.
pub fn transform_inline(text: &str) -> String {
    render_inline_html(&parse_inline(text))
}

pub fn transform_inline_report(text: &str) -> (String, Vec<InlineIssue>) {
    let (nodes, issues) = parse_inline_report(text);
    (render_inline_html(&nodes), issues)
}

/// Applies `rewrite` to every text node.
fn map_text<F>(nodes: InlineSeq, rewrite: &mut F) -> InlineSeq
where
    F: FnMut(&str) -> InlineSeq,
{
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Inline::Text(text) => out.extend(rewrite(&text)),
            other => out.push(other),
        }
    }
    out
}

/// One unit of the emphasis scan: a character of text, or a node that
/// was already resolved and is matched as a single opaque character.
#[derive(Debug)]
enum Token {
    Char(char),
    Node(Inline),
}

impl Token {
    fn is_star(&self) -> bool {
        matches!(self, Token::Char('*'))
    }
}

fn tokens_of(nodes: InlineSeq) -> Vec<Token> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Inline::Text(text) => out.extend(text.chars().map(Token::Char)),
            other => out.push(Token::Node(other)),
        }
    }
    out
}

fn nodes_of(tokens: Vec<Token>) -> InlineSeq {
    let mut out = Vec::new();
    let mut text = String::new();
    for token in tokens {
        match token {
            Token::Char(ch) => text.push(ch),
            Token::Node(node) => {
                if !text.is_empty() {
                    out.push(Inline::Text(std::mem::take(&mut text)));
                }
                out.push(node);
            }
        }
    }
    if !text.is_empty() {
        out.push(Inline::Text(text));
    }
    out
}

fn strong(inner: Vec<Token>) -> Inline {
    Inline::Strong(nodes_of(delimited_pass(inner, 1, emph)))
}

fn emph(inner: Vec<Token>) -> Inline {
    Inline::Emph(nodes_of(inner))
}

/// Replaces every `width`-star delimited run with the node `wrap` builds.
/// Matches are leftmost and non-overlapping. Bold (`width == 2`) closes at
/// the first `**` after a non-empty body; italic closes at the next `*`
/// and needs a body without stars.
fn delimited_pass(mut tokens: Vec<Token>, width: usize, wrap: fn(Vec<Token>) -> Inline) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    loop {
        let found = (0..tokens.len()).find_map(|open| {
            let opens = open + width <= tokens.len()
                && tokens[open..open + width].iter().all(Token::is_star);
            if !opens {
                return None;
            }
            closing_delimiter(&tokens, open, width).map(|close| (open, close))
        });
        let Some((open, close)) = found else {
            out.extend(tokens);
            return out;
        };
        let rest = tokens.split_off(close + width);
        let inner: Vec<Token> = tokens.drain(open + width..close).collect();
        tokens.truncate(open);
        out.extend(tokens);
        out.push(Token::Node(wrap(inner)));
        tokens = rest;
    }
}

fn closing_delimiter(tokens: &[Token], open: usize, width: usize) -> Option<usize> {
    let body_start = open + width;
    if width == 2 {
        (body_start + 1..tokens.len().saturating_sub(1))
            .find(|&idx| tokens[idx].is_star() && tokens[idx + 1].is_star())
    } else {
        let close = (body_start..tokens.len()).find(|&idx| tokens[idx].is_star())?;
        (close > body_start).then_some(close)
    }
}

/// Splits `text` around the matches of `pattern`. A match the builder
/// declines is dropped.
fn split_matches<F>(text: &str, pattern: &Regex, mut build: F) -> InlineSeq
where
    F: FnMut(&Captures<'_>) -> Option<Inline>,
{
    let mut out = Vec::new();
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            out.push(Inline::Text(text[last..whole.start()].to_string()));
        }
        if let Some(node) = build(&caps) {
            out.push(node);
        }
        last = whole.end();
    }
    if last < text.len() {
        out.push(Inline::Text(text[last..].to_string()));
    }
    out
}

pub(crate) fn raw_img_node(tag: &str) -> Option<Inline> {
    let mut src = None;
    let mut alt = String::new();
    let mut style = None;
    let mut width = None;
    let mut height = None;
    for caps in TAG_ATTR.captures_iter(tag) {
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();
        match caps[1].to_ascii_lowercase().as_str() {
            "src" => src = Some(value),
            "alt" => alt = value,
            "style" => style = Some(value),
            "width" => width = Some(value),
            "height" => height = Some(value),
            _ => {}
        }
    }
    let src = src.filter(|src| !src.trim().is_empty() && is_safe_href(src))?;
    Some(Inline::Image {
        src,
        alt,
        style: ImageStyle::from_attrs(style, width, height),
    })
}

fn markdown_image_node(alt: &str, target: &str, issues: &mut Vec<InlineIssue>) -> Option<Inline> {
    let src = link_target(target);
    if src.is_empty() || !is_safe_href(src) {
        issues.push(InlineIssue::UnsafeLink(src.to_string()));
        return Some(Inline::Text(alt.to_string()));
    }
    if let Some(host) = WrappedHost::detect(src) {
        let original = host.decode(src);
        if original.is_none() {
            issues.push(InlineIssue::UndecodableImage(src.to_string()));
        }
        return Some(Inline::UnavailableImage {
            alt: alt.to_string(),
            src: src.to_string(),
            original,
        });
    }
    Some(Inline::Image {
        src: src.to_string(),
        alt: alt.to_string(),
        style: ImageStyle::responsive(),
    })
}

fn link_node(text: &str, target: &str, issues: &mut Vec<InlineIssue>) -> Option<Inline> {
    let href = link_target(target);
    if !is_safe_href(href) {
        issues.push(InlineIssue::UnsafeLink(href.to_string()));
        return Some(Inline::Text(text.to_string()));
    }
    Some(Inline::Link {
        href: href.to_string(),
        text: text.to_string(),
    })
}

/// The destination part of `(dest "title")`.
fn link_target(target: &str) -> &str {
    let target = target.trim();
    let target = target.split_whitespace().next().unwrap_or_default();
    target
        .strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(target)
}

/// Image hosts that proxy another URL and are known to break.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WrappedHost {
    /// GitHub's camo proxy: the last path segment is the hex-encoded URL.
    Camo,
    /// WordPress Photon: the path is `host/path` of the original.
    Photon,
}

impl WrappedHost {
    pub fn detect(src: &str) -> Option<Self> {
        let url = Url::parse(src).ok()?;
        match url.host_str()? {
            "camo.githubusercontent.com" => Some(Self::Camo),
            "i0.wp.com" | "i1.wp.com" | "i2.wp.com" => Some(Self::Photon),
            _ => None,
        }
    }

    /// Best-effort reversal of the wrapped URL.
    pub fn decode(self, src: &str) -> Option<String> {
        let url = Url::parse(src).ok()?;
        let decoded = match self {
            Self::Camo => {
                let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
                decode_hex(segment)?
            }
            Self::Photon => {
                let path = url.path().trim_start_matches('/');
                let host = path.split('/').next()?;
                if !host.contains('.') {
                    return None;
                }
                format!("https://{}", path)
            }
        };
        let valid = Url::parse(&decoded)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        valid.then_some(decoded)
    }
}

fn decode_hex(text: &str) -> Option<String> {
    if text.len() % 2 != 0 {
        return None;
    }
    let bytes = text
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(pair, 16).ok()
        })
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

/// Emits inline nodes as intermediate HTML. Text nodes pass through
/// unescaped so embedded HTML fragments survive to the sanitizer. Images
/// carry only the author's attributes; sizing is re-derived on reconcile.
pub fn render_inline_html(nodes: &[Inline]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Inline::Text(text) => out.push_str(text),
            Inline::Strong(children) => {
                out.push_str("<strong>");
                out.push_str(&render_inline_html(children));
                out.push_str("</strong>");
            }
            Inline::Emph(children) => {
                out.push_str("<em>");
                out.push_str(&render_inline_html(children));
                out.push_str("</em>");
            }
            Inline::CodeSpan(code) => {
                out.push_str("<code>");
                out.push_str(&escape_html(code));
                out.push_str("</code>");
            }
            Inline::Link { href, text } => {
                out.push_str(&format!(
                    "<span class=\"folio-link\" data-href=\"{}\">{}</span>",
                    escape_attr(href),
                    escape_html(text)
                ));
            }
            Inline::Image { src, alt, style } => {
                out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\"",
                    escape_attr(src),
                    escape_attr(alt)
                ));
                if let Some(width) = &style.width {
                    out.push_str(&format!(" width=\"{}\"", escape_attr(width)));
                }
                if let Some(height) = &style.height {
                    out.push_str(&format!(" height=\"{}\"", escape_attr(height)));
                }
                if let Some(declared) = &style.declared {
                    out.push_str(&format!(" style=\"{}\"", escape_attr(declared)));
                }
                out.push('>');
            }
            Inline::UnavailableImage { alt, src, original } => {
                out.push_str(&format!(
                    "<span class=\"folio-image-unavailable\" data-src=\"{}\" data-alt=\"{}\"",
                    escape_attr(src),
                    escape_attr(alt)
                ));
                if let Some(original) = original {
                    out.push_str(&format!(" data-original=\"{}\"", escape_attr(original)));
                }
                out.push_str("></span>");
            }
        }
    }
    out
}
