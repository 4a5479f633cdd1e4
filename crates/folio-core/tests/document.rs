use folio_core::{
    BlockKind, RenderNode, RenderOptions, RenderPart, W_LINK_UNSAFE, classify, emit_html,
    EmitOptions, render, render_with_options,
};

const POST: &str = "---\ntitle: Test\n---\n# Hello\nSome **bold** and [a link](https://github.com/x).\n";

#[test]
fn front_matter_post_end_to_end() {
    let doc = render(POST);
    assert!(!doc.mixed_html);
    assert!(doc.diagnostics.is_empty());
    assert_eq!(
        doc.front_matter.as_ref().and_then(|fm| fm.get_str("title")),
        Some("Test")
    );
    assert_eq!(doc.tree.nodes.len(), 2);

    let RenderNode::Heading { level, content } = &doc.tree.nodes[0] else {
        panic!("expected heading, got {:?}", doc.tree.nodes[0]);
    };
    assert_eq!(*level, 1);
    assert_eq!(
        content,
        &vec![RenderPart::Html {
            html: "Hello".to_string()
        }]
    );

    let RenderNode::Paragraph { content } = &doc.tree.nodes[1] else {
        panic!("expected paragraph, got {:?}", doc.tree.nodes[1]);
    };
    let links: Vec<(&str, &str)> = content
        .iter()
        .filter_map(|part| match part {
            RenderPart::Link { href, text } => Some((href.as_str(), text.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(links, vec![("https://github.com/x", "a link")]);
    assert_eq!(classify(links[0].0).label, "GitHub");
    assert!(content.iter().any(|part| matches!(
        part,
        RenderPart::Html { html } if html.contains("<strong>bold</strong>")
    )));
}

#[test]
fn segmenter_sees_the_stripped_body() {
    let body = folio_core::strip_front_matter(POST);
    let lines: Vec<&str> = body.lines().collect();
    let blocks = folio_core::segment(&lines);
    assert_eq!(
        blocks.iter().map(|b| b.kind.clone()).collect::<Vec<_>>(),
        vec![
            BlockKind::Heading {
                level: 1,
                text: "Hello".to_string()
            },
            BlockKind::Paragraph {
                text: "Some **bold** and [a link](https://github.com/x).".to_string()
            },
        ]
    );
}

#[test]
fn images_are_listed_for_the_viewer() {
    let doc = render("![a](/a.png)\n\n| x | y |\n|---|---|\n| ![b](/b.png) | z |");
    let images = doc.tree.images();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].src, "/a.png");
    assert_eq!(images[1].index, 1);
    assert_eq!(images[1].alt, "b");

    let html = emit_html(&doc.tree, &EmitOptions::default());
    assert!(html.contains("data-folio-zoom=\"1\""));
}

#[test]
fn unsanitized_rendering_keeps_author_markup() {
    let options = RenderOptions {
        sanitize: false,
        ..RenderOptions::default()
    };
    let doc = render_with_options("hi <u onclick=\"x()\">there</u>", &options);
    let RenderNode::Paragraph { content } = &doc.tree.nodes[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(
        content,
        &vec![RenderPart::Html {
            html: "hi <u onclick=\"x()\">there</u>".to_string()
        }]
    );
}

#[test]
fn render_tree_serializes_to_json() -> Result<(), serde_json::Error> {
    let doc = render("---\ntitle: Test\n---\n# Hi\n[x](javascript:void(0))\n");
    let value = serde_json::to_value(&doc)?;
    assert_eq!(value["frontMatter"]["entries"]["title"], "Test");
    assert_eq!(value["mixedHtml"], false);
    assert_eq!(value["tree"]["nodes"][0]["type"], "heading");
    assert_eq!(value["tree"]["nodes"][0]["level"], 1);
    assert_eq!(value["diagnostics"][0]["code"], W_LINK_UNSAFE);
    assert_eq!(value["diagnostics"][0]["severity"], "warning");
    Ok(())
}

#[test]
fn mixed_html_document_becomes_one_fragment() {
    let doc = render(
        "<h1>Post</h1>\n<table style=\"border:1px\"><tr><td>a</td></tr></table>\n<pre><code class=\"language-py\">print(1 &lt; 2)</code></pre>",
    );
    assert!(doc.mixed_html);
    assert_eq!(doc.tree.nodes.len(), 1);
    let RenderNode::Fragment { parts } = &doc.tree.nodes[0] else {
        panic!("expected fragment");
    };
    assert!(parts.iter().any(|part| matches!(
        part,
        RenderPart::Html { html } if html.contains("class=\"folio-table\"") && !html.contains("border")
    )));
    assert!(parts.contains(&RenderPart::Code {
        language: Some("py".to_string()),
        code: "print(1 < 2)".to_string(),
    }));
}

#[test]
fn bold_around_a_link_keeps_the_link_tagged() {
    let doc = render("**[a](https://github.com/x)** and *see `a*b` now*");
    let RenderNode::Paragraph { content } = &doc.tree.nodes[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(
        content[..3],
        [
            RenderPart::Html {
                html: "<strong>".to_string()
            },
            RenderPart::Link {
                href: "https://github.com/x".to_string(),
                text: "a".to_string()
            },
            RenderPart::Html {
                html: "</strong> and <em>see <code>a*b</code> now</em>".to_string()
            },
        ]
    );
}

#[test]
fn render_options_read_camel_case_with_defaults() -> Result<(), serde_json::Error> {
    let options: RenderOptions =
        serde_json::from_str(r#"{"origin":"https://me.dev","foldEscapedNewlines":false}"#)?;
    assert_eq!(options.origin.as_deref(), Some("https://me.dev"));
    assert!(!options.fold_escaped_newlines);
    assert!(options.sanitize);

    let empty: RenderOptions = serde_json::from_str("{}")?;
    assert_eq!(empty, RenderOptions::default());
    Ok(())
}
