use crate::ast::Inline;
use crate::html::{decode_entities, escape_html, is_safe_href};
use crate::inline::{TAG_ATTR, raw_img_node};
use crate::tree::RenderPart;
use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};

/// Link markers, fenced code, images and unavailable-image cards, in one
/// alternation so the split keeps every delimiter.
static PROMOTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"(?P<link><span class="folio-link" data-href="(?P<href>[^"]*)">(?P<text>[^<]*)</span>)"#,
        r#"|(?P<code>(?is:<pre\b[^>]*>\s*<code\b(?P<code_attrs>[^>]*)>(?P<body>.*?)</code>\s*</pre>))"#,
        r#"|(?P<img>(?i:<img\b[^>]*>))"#,
        r#"|(?P<unavailable><span class="folio-image-unavailable"(?P<card_attrs>[^>]*)></span>)"#,
    ))
    .expect("valid promoted-unit pattern")
});
static LANGUAGE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:language|lang)-([A-Za-z0-9_+#.-]+)").expect("valid language class pattern")
});

/// Splits intermediate HTML into render parts.
///
/// Promoted units become typed parts; everything between them is kept as
/// literal markup. Empty chunks are dropped.
pub fn reconcile(html: &str) -> Vec<RenderPart> {
    let mut parts = Vec::new();
    let mut last = 0;
    for caps in PROMOTED.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_html(&mut parts, &html[last..whole.start()]);
        if let Some(part) = promote(&caps) {
            parts.push(part);
        }
        last = whole.end();
    }
    push_html(&mut parts, &html[last..]);
    parts
}

/// Sanitizes `html` with the allow-list, then reconciles it.
pub fn reconcile_sanitized(html: &str) -> Vec<RenderPart> {
    reconcile(&sanitize_html(html))
}

fn push_html(parts: &mut Vec<RenderPart>, chunk: &str) {
    if !chunk.is_empty() {
        parts.push(RenderPart::Html {
            html: chunk.to_string(),
        });
    }
}

fn promote(caps: &Captures<'_>) -> Option<RenderPart> {
    if caps.name("link").is_some() {
        let href = decode_entities(caps.name("href").map_or("", |m| m.as_str()));
        let text = decode_entities(caps.name("text").map_or("", |m| m.as_str()));
        if !is_safe_href(&href) {
            return Some(RenderPart::Html {
                html: escape_html(&text),
            });
        }
        return Some(RenderPart::Link { href, text });
    }

    if caps.name("code").is_some() {
        let attrs = caps.name("code_attrs").map_or("", |m| m.as_str());
        let body = caps.name("body").map_or("", |m| m.as_str());
        return Some(RenderPart::Code {
            language: code_language(attrs),
            code: decode_entities(body),
        });
    }

    if let Some(tag) = caps.name("img") {
        return match raw_img_node(tag.as_str())? {
            Inline::Image { src, alt, style } => Some(RenderPart::Image { src, alt, style }),
            _ => None,
        };
    }

    let attrs = caps.name("card_attrs").map_or("", |m| m.as_str());
    let attrs = tag_attrs(attrs);
    Some(RenderPart::UnavailableImage {
        alt: attrs.get("data-alt").cloned().unwrap_or_default(),
        src: attrs.get("data-src").cloned().unwrap_or_default(),
        original: attrs.get("data-original").cloned(),
    })
}

fn code_language(attrs: &str) -> Option<String> {
    let class = tag_attrs(attrs).remove("class")?;
    LANGUAGE_CLASS
        .captures(&class)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn tag_attrs(attrs: &str) -> HashMap<String, String> {
    TAG_ATTR
        .captures_iter(attrs)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (caps[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

/// Cleans `html` against the allow-list of tags and attributes the
/// pipeline emits or accepts from authors.
pub fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&'static str> = [
        "a",
        "abbr",
        "b",
        "blockquote",
        "br",
        "caption",
        "code",
        "dd",
        "del",
        "details",
        "div",
        "dl",
        "dt",
        "em",
        "figcaption",
        "figure",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "kbd",
        "li",
        "mark",
        "ol",
        "p",
        "pre",
        "s",
        "small",
        "span",
        "strong",
        "sub",
        "summary",
        "sup",
        "table",
        "tbody",
        "td",
        "tfoot",
        "th",
        "thead",
        "tr",
        "u",
        "ul",
    ]
    .iter()
    .copied()
    .collect();

    let mut generic_attributes: HashSet<&'static str> = HashSet::new();
    generic_attributes.insert("class");
    generic_attributes.insert("id");
    generic_attributes.insert("title");

    let mut tag_attributes = HashMap::new();
    tag_attributes.insert("a", ["href"].iter().copied().collect());
    tag_attributes.insert(
        "img",
        ["src", "alt", "width", "height", "style"]
            .iter()
            .copied()
            .collect(),
    );
    tag_attributes.insert("ol", ["start"].iter().copied().collect());
    tag_attributes.insert(
        "span",
        ["data-href", "data-src", "data-alt", "data-original"]
            .iter()
            .copied()
            .collect(),
    );
    tag_attributes.insert("td", ["colspan", "rowspan", "align"].iter().copied().collect());
    tag_attributes.insert("th", ["colspan", "rowspan", "align"].iter().copied().collect());

    Builder::new()
        .tags(tags)
        .generic_attributes(generic_attributes)
        .tag_attributes(tag_attributes)
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ImageStyle;

    #[test]
    fn splits_around_link_markers() {
        let html = "see <span class=\"folio-link\" data-href=\"https://a.dev/?x=1&amp;y=2\">docs</span> now";
        assert_eq!(
            reconcile(html),
            vec![
                RenderPart::Html {
                    html: "see ".to_string()
                },
                RenderPart::Link {
                    href: "https://a.dev/?x=1&y=2".to_string(),
                    text: "docs".to_string(),
                },
                RenderPart::Html {
                    html: " now".to_string()
                },
            ]
        );
    }

    #[test]
    fn fenced_code_is_decoded() {
        let html = "<pre><code class=\"language-rust\">let v: Vec&lt;u8&gt; = &amp;x;\n</code></pre>";
        assert_eq!(
            reconcile(html),
            vec![RenderPart::Code {
                language: Some("rust".to_string()),
                code: "let v: Vec<u8> = &x;\n".to_string(),
            }]
        );
    }

    #[test]
    fn code_without_language() {
        let parts = reconcile("<pre>\n<code>a &#39;b&#39;</code>\n</pre>");
        assert_eq!(
            parts,
            vec![RenderPart::Code {
                language: None,
                code: "a 'b'".to_string(),
            }]
        );
    }

    #[test]
    fn inline_code_stays_markup() {
        let parts = reconcile("a <code>b</code> c");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn images_become_parts() {
        let parts = reconcile("<p><img src=\"a.png\" alt=\"A\"></p>");
        assert_eq!(
            parts[1],
            RenderPart::Image {
                src: "a.png".to_string(),
                alt: "A".to_string(),
                style: ImageStyle::responsive(),
            }
        );
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn unavailable_card_round_trips() {
        let html = "<span class=\"folio-image-unavailable\" data-src=\"https://camo.githubusercontent.com/x/zz\" data-alt=\"shot\"></span>";
        assert_eq!(
            reconcile(html),
            vec![RenderPart::UnavailableImage {
                alt: "shot".to_string(),
                src: "https://camo.githubusercontent.com/x/zz".to_string(),
                original: None,
            }]
        );
    }

    #[test]
    fn forged_marker_with_script_href_is_neutralised() {
        let html = "<span class=\"folio-link\" data-href=\"javascript:alert(1)\">x</span>";
        assert_eq!(
            reconcile(html),
            vec![RenderPart::Html {
                html: "x".to_string()
            }]
        );
    }

    #[test]
    fn sanitizer_drops_scripts_and_handlers() {
        let clean = sanitize_html("<p onclick=\"x()\">hi<script>alert(1)</script></p>");
        assert!(!clean.contains("script"));
        assert!(!clean.contains("onclick"));
        assert!(clean.contains("hi"));
    }

    #[test]
    fn sanitizer_keeps_link_markers() {
        let marker = "<span class=\"folio-link\" data-href=\"https://github.com/x\">x</span>";
        let parts = reconcile_sanitized(marker);
        assert_eq!(
            parts,
            vec![RenderPart::Link {
                href: "https://github.com/x".to_string(),
                text: "x".to_string(),
            }]
        );
    }
}
