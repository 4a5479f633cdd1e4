mod ast;
mod classify;
mod diagnostic;
mod document;
mod emit;
mod error;
mod front_matter;
mod html;
mod inline;
mod reconcile;
mod segment;
mod source;
mod table;
mod tree;
mod viewer;

pub use ast::{Block, BlockKind, ImageStyle, Inline, InlineSeq, TableModel};
pub use classify::{
    LinkCategory, LinkClassifier, LinkInfo, SiteDescriptor, classify, is_internal, link_domain,
};
pub use diagnostic::{
    Diagnostic, DiagnosticSeverity, W_CODE_FENCE_UNCLOSED, W_FRONT_MATTER_UNCLOSED,
    W_IMAGE_UNDECODABLE, W_LINK_UNSAFE, W_TABLE_NO_SEPARATOR, W_TABLE_RAGGED,
};
pub use document::{
    RenderOptions, RenderedDocument, is_mixed_html, normalize_line_endings, promote_anchors,
    render, render_with_options, restyle_tables,
};
pub use emit::{CodeHighlighter, EmitOptions, PlainCode, emit_html, emit_html_with};
pub use error::{Error, SourceError};
pub use front_matter::{
    FrontMatter, FrontMatterValue, has_unclosed_front_matter, split_front_matter,
    strip_front_matter,
};
pub use html::{decode_entities, escape_html, is_safe_href};
pub use inline::{
    InlineIssue, WrappedHost, parse_inline, parse_inline_report, render_inline_html,
    transform_inline, transform_inline_report,
};
pub use reconcile::{reconcile, reconcile_sanitized, sanitize_html};
pub use segment::{
    LINE_RULES, LineKind, SegmentResult, Segmenter, classify_line, dump_blocks, segment,
    segment_lines,
};
pub use source::{CachedSource, ContentSource, DirectorySource, PostContent};
pub use table::{is_separator_row, render_table, split_cells};
pub use tree::{ImageEntry, RenderNode, RenderPart, RenderTable, RenderTree};
pub use viewer::{ImageViewer, MAX_SCALE, MIN_SCALE, ZoomState};
