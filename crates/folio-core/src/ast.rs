use serde::Serialize;

pub type InlineSeq = Vec<Inline>;

/// One segmented block. `line` is the 1-based body line the block starts on.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Block {
    pub line: usize,
    pub kind: BlockKind,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Quote {
        text: String,
    },
    List {
        items: Vec<String>,
    },
    Code {
        language: Option<String>,
        body: String,
    },
    Table {
        raw_lines: Vec<String>,
    },
    Divider,
    Blank,
}

impl BlockKind {
    /// Short lowercase name, used by block dumps and tests.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Heading { .. } => "heading",
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::Quote { .. } => "quote",
            BlockKind::List { .. } => "list",
            BlockKind::Code { .. } => "code",
            BlockKind::Table { .. } => "table",
            BlockKind::Divider => "divider",
            BlockKind::Blank => "blank",
        }
    }
}

/// Typed inline node produced by the Inline Transformer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Inline {
    Text(String),
    Strong(InlineSeq),
    Emph(InlineSeq),
    CodeSpan(String),
    Link {
        href: String,
        text: String,
    },
    Image {
        src: String,
        alt: String,
        style: ImageStyle,
    },
    UnavailableImage {
        alt: String,
        src: String,
        original: Option<String>,
    },
}

/// Structured presentation record for an image. Resolved to CSS only at
/// the emit boundary.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStyle {
    /// Style declared by the author, kept verbatim.
    pub declared: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    /// True when the author did not size the image; the default
    /// responsive sizing applies.
    pub responsive: bool,
}

const SIZING_PROPERTIES: &[&str] = &["width", "height", "max-width", "max-height"];
const RESPONSIVE_CSS: &str = "max-width:100%; height:auto;";

impl ImageStyle {
    pub fn responsive() -> Self {
        Self {
            responsive: true,
            ..Self::default()
        }
    }

    pub fn from_attrs(
        declared: Option<String>,
        width: Option<String>,
        height: Option<String>,
    ) -> Self {
        let declared = declared
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let sized_by_style = declared.as_deref().is_some_and(declares_sizing);
        let responsive = !sized_by_style && width.is_none() && height.is_none();
        Self {
            declared,
            width,
            height,
            responsive,
        }
    }

    /// The CSS declaration list: the author's style first, then the default
    /// sizing hint when nothing sized the image.
    pub fn css(&self) -> String {
        let mut out = String::new();
        if let Some(declared) = &self.declared {
            out.push_str(declared);
            if !declared.ends_with(';') {
                out.push(';');
            }
        }
        if self.responsive {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(RESPONSIVE_CSS);
        }
        out
    }
}

fn declares_sizing(style: &str) -> bool {
    style.split(';').any(|decl| {
        decl.split_once(':').is_some_and(|(property, _)| {
            let property = property.trim().to_ascii_lowercase();
            SIZING_PROPERTIES.contains(&property.as_str())
        })
    })
}

/// A pipe table after header / separator detection. Every row has exactly
/// `headers.len()` cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableModel {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub has_separator: bool,
    /// Indexes into `rows` whose source cell count differed from the header.
    pub ragged_rows: Vec<usize>,
}
