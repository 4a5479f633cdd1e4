use crate::ast::ImageStyle;
use serde::Serialize;

/// One unit of rendered inline content handed to the UI layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderPart {
    /// A link the UI decorates through the link classifier.
    Link { href: String, text: String },
    /// A code block for the highlighter; `code` is already entity-decoded.
    Code {
        language: Option<String>,
        code: String,
    },
    /// A clickable, zoomable image.
    Image {
        src: String,
        alt: String,
        style: ImageStyle,
    },
    /// Card shown in place of an image from a host known to break.
    UnavailableImage {
        alt: String,
        src: String,
        original: Option<String>,
    },
    /// Markup produced by this pipeline (sanitized unless disabled).
    Html { html: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTable {
    pub headers: Vec<Vec<RenderPart>>,
    pub rows: Vec<Vec<Vec<RenderPart>>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderNode {
    Heading {
        level: u8,
        content: Vec<RenderPart>,
    },
    Paragraph {
        content: Vec<RenderPart>,
    },
    Quote {
        content: Vec<RenderPart>,
    },
    List {
        items: Vec<Vec<RenderPart>>,
    },
    Divider,
    Spacer,
    Code {
        language: Option<String>,
        code: String,
    },
    Table(RenderTable),
    /// Body of a mixed-HTML document.
    Fragment {
        parts: Vec<RenderPart>,
    },
}

/// An image the viewer can open, in document order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    pub index: usize,
    pub src: String,
    pub alt: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    pub fn new(nodes: Vec<RenderNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every part of the tree in document order.
    pub fn parts(&self) -> impl Iterator<Item = &RenderPart> {
        self.nodes.iter().flat_map(node_parts)
    }

    /// The zoomable images, numbered in document order.
    pub fn images(&self) -> Vec<ImageEntry> {
        self.parts()
            .filter_map(|part| match part {
                RenderPart::Image { src, alt, .. } => Some((src, alt)),
                _ => None,
            })
            .enumerate()
            .map(|(index, (src, alt))| ImageEntry {
                index,
                src: src.clone(),
                alt: alt.clone(),
            })
            .collect()
    }
}

fn node_parts(node: &RenderNode) -> Box<dyn Iterator<Item = &RenderPart> + '_> {
    match node {
        RenderNode::Heading { content, .. }
        | RenderNode::Paragraph { content }
        | RenderNode::Quote { content } => Box::new(content.iter()),
        RenderNode::Fragment { parts } => Box::new(parts.iter()),
        RenderNode::List { items } => Box::new(items.iter().flatten()),
        RenderNode::Table(table) => Box::new(
            table
                .headers
                .iter()
                .flatten()
                .chain(table.rows.iter().flatten().flatten()),
        ),
        RenderNode::Divider | RenderNode::Spacer | RenderNode::Code { .. } => {
            Box::new(std::iter::empty())
        }
    }
}
