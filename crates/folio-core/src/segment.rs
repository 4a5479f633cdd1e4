//! Line-oriented block segmentation.
//!
//! Every physical line is classified by [`classify_line`], which walks a
//! fixed rule list in priority order (fence, table row, list item,
//! heading, quote, divider, blank, text). The [`Segmenter`] then feeds the
//! classified lines through a small state machine that owns the multi-line
//! runs: fenced code, lists and tables.

use crate::ast::{Block, BlockKind};
use crate::diagnostic::{Diagnostic, W_CODE_FENCE_UNCLOSED};

const MAX_HEADING_LEVEL: u8 = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineKind<'a> {
    /// Opening or closing fence, carrying the trimmed info string.
    Fence(&'a str),
    TableRow,
    ListItem(&'a str),
    Heading(u8, &'a str),
    Quote(&'a str),
    Divider,
    Blank,
    Text(&'a str),
}

type LineRule = for<'a> fn(&'a str) -> Option<LineKind<'a>>;

/// Line rules in priority order. The first rule that matches wins.
pub const LINE_RULES: &[(&str, LineRule)] = &[
    ("fence", fence_rule),
    ("table", table_rule),
    ("list", list_rule),
    ("heading", heading_rule),
    ("quote", quote_rule),
    ("divider", divider_rule),
    ("blank", blank_rule),
];

pub fn classify_line(line: &str) -> LineKind<'_> {
    LINE_RULES
        .iter()
        .find_map(|(_, rule)| rule(line))
        .unwrap_or_else(|| LineKind::Text(line.trim()))
}

fn fence_rule(line: &str) -> Option<LineKind<'_>> {
    let info = line.trim_start().strip_prefix("```")?;
    Some(LineKind::Fence(info.trim_matches(|c: char| c == '`' || c.is_whitespace())))
}

fn table_rule(line: &str) -> Option<LineKind<'_>> {
    (line.matches('|').count() >= 2).then_some(LineKind::TableRow)
}

fn list_rule(line: &str) -> Option<LineKind<'_>> {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    let marker = chars.next()?;
    if !matches!(marker, '-' | '*' | '+') {
        return None;
    }
    let rest = chars.as_str();
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(LineKind::ListItem(rest.trim()))
}

fn heading_rule(line: &str) -> Option<LineKind<'_>> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('#') {
        return None;
    }
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    let level = hashes.min(MAX_HEADING_LEVEL as usize) as u8;
    Some(LineKind::Heading(level, trimmed[hashes..].trim()))
}

fn quote_rule(line: &str) -> Option<LineKind<'_>> {
    let rest = line.trim_start().strip_prefix('>')?;
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    Some(LineKind::Quote(rest.trim_end()))
}

fn divider_rule(line: &str) -> Option<LineKind<'_>> {
    let trimmed = line.trim();
    let first = trimmed.chars().next()?;
    if !matches!(first, '-' | '_' | '*') {
        return None;
    }
    let repeated = trimmed.chars().all(|c| c == first) && trimmed.len() >= 3;
    repeated.then_some(LineKind::Divider)
}

fn blank_rule(line: &str) -> Option<LineKind<'_>> {
    line.trim().is_empty().then_some(LineKind::Blank)
}

/// The run the segmenter is currently inside.
#[derive(Debug)]
enum RunMode {
    None,
    CodeFence {
        start: usize,
        language: Option<String>,
        body: Vec<String>,
    },
    List {
        start: usize,
        items: Vec<String>,
        pending_blank: Option<usize>,
    },
    Table {
        start: usize,
        lines: Vec<String>,
    },
}

pub struct SegmentResult {
    pub blocks: Vec<Block>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Segments normalized lines into blocks.
pub fn segment(lines: &[&str]) -> Vec<Block> {
    segment_lines(lines).blocks
}

pub fn segment_lines(lines: &[&str]) -> SegmentResult {
    let mut segmenter = Segmenter::new();
    for (idx, line) in lines.iter().enumerate() {
        segmenter.push(idx + 1, line);
    }
    segmenter.finish()
}

pub struct Segmenter {
    mode: RunMode,
    blocks: Vec<Block>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            mode: RunMode::None,
            blocks: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, line_no: usize, line: &str) {
        if let RunMode::CodeFence { body, .. } = &mut self.mode {
            if matches!(classify_line(line), LineKind::Fence(_)) {
                self.flush();
            } else {
                body.push(line.to_string());
            }
            return;
        }

        let kind = classify_line(line);
        match &mut self.mode {
            RunMode::Table { lines, .. } => {
                let continues = !matches!(kind, LineKind::Blank | LineKind::Fence(_))
                    && line.contains('|');
                if continues {
                    lines.push(line.trim().to_string());
                    return;
                }
                self.flush();
            }
            RunMode::List {
                items,
                pending_blank,
                ..
            } => match kind {
                LineKind::ListItem(text) => {
                    *pending_blank = None;
                    items.push(text.to_string());
                    return;
                }
                LineKind::Blank if pending_blank.is_none() => {
                    *pending_blank = Some(line_no);
                    return;
                }
                _ => self.flush(),
            },
            RunMode::CodeFence { .. } | RunMode::None => {}
        }

        self.start_line(line_no, line, kind);
    }

    fn start_line(&mut self, line_no: usize, line: &str, kind: LineKind<'_>) {
        match kind {
            LineKind::Fence(info) => {
                self.mode = RunMode::CodeFence {
                    start: line_no,
                    language: (!info.is_empty()).then(|| info.to_string()),
                    body: Vec::new(),
                };
            }
            LineKind::TableRow => {
                self.mode = RunMode::Table {
                    start: line_no,
                    lines: vec![line.trim().to_string()],
                };
            }
            LineKind::ListItem(text) => {
                self.mode = RunMode::List {
                    start: line_no,
                    items: vec![text.to_string()],
                    pending_blank: None,
                };
            }
            LineKind::Heading(level, text) => self.emit(
                line_no,
                BlockKind::Heading {
                    level,
                    text: text.to_string(),
                },
            ),
            LineKind::Quote(text) => self.emit(
                line_no,
                BlockKind::Quote {
                    text: text.to_string(),
                },
            ),
            LineKind::Divider => self.emit(line_no, BlockKind::Divider),
            LineKind::Blank => {
                if !matches!(self.blocks.last(), Some(Block { kind: BlockKind::Blank, .. })) {
                    self.emit(line_no, BlockKind::Blank);
                }
            }
            LineKind::Text(text) => self.emit(
                line_no,
                BlockKind::Paragraph {
                    text: text.to_string(),
                },
            ),
        }
    }

    fn emit(&mut self, line: usize, kind: BlockKind) {
        self.blocks.push(Block { line, kind });
    }

    /// Closes the current run, emitting its block.
    fn flush(&mut self) {
        match std::mem::replace(&mut self.mode, RunMode::None) {
            RunMode::None => {}
            RunMode::CodeFence {
                start,
                language,
                body,
            } => self.emit(
                start,
                BlockKind::Code {
                    language,
                    body: body.join("\n"),
                },
            ),
            RunMode::List {
                start,
                items,
                pending_blank,
            } => {
                self.emit(start, BlockKind::List { items });
                if let Some(line) = pending_blank {
                    self.emit(line, BlockKind::Blank);
                }
            }
            RunMode::Table { start, lines } => {
                self.emit(start, BlockKind::Table { raw_lines: lines });
            }
        }
    }

    pub fn finish(mut self) -> SegmentResult {
        if let RunMode::CodeFence { start, .. } = &self.mode {
            self.diagnostics.push(Diagnostic::warning(
                *start,
                W_CODE_FENCE_UNCLOSED,
                "code fence is never closed; the rest of the document is code",
            ));
        }
        self.flush();
        SegmentResult {
            blocks: self.blocks,
            diagnostics: self.diagnostics,
        }
    }
}

/// One line per block: `<line> <kind> <payload>`, payload strings in
/// Rust debug notation.
pub fn dump_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        let payload = match &block.kind {
            BlockKind::Heading { level, text } => format!(" {} {:?}", level, text),
            BlockKind::Paragraph { text } | BlockKind::Quote { text } => format!(" {:?}", text),
            BlockKind::List { items } => format!(" {:?}", items),
            BlockKind::Code { language, body } => {
                format!(" {} {:?}", language.as_deref().unwrap_or("-"), body)
            }
            BlockKind::Table { raw_lines } => format!(" {:?}", raw_lines),
            BlockKind::Divider | BlockKind::Blank => String::new(),
        };
        out.push_str(&format!("{} {}{}\n", block.line, block.kind.name(), payload));
    }
    out
}
