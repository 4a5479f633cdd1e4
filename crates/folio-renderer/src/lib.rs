use folio_core::{CodeHighlighter, EmitOptions, RenderedDocument, emit_html_with, escape_html};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme as SyntectTheme, ThemeSet};
use syntect::parsing::SyntaxSet;

const BASE_CSS: &str = include_str!("../assets/folio.css");
const BASE_JS: &str = include_str!("../assets/folio.js");

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_nonewlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

const LIGHT_PALETTE: &[(&str, &str)] = &[
    ("--folio-accent", "#2b6cb0"),
    ("--folio-bg", "#fbfbf8"),
    ("--folio-border", "#d8dee4"),
    ("--folio-code-bg", "#f4f6f8"),
    ("--folio-code-fg", "#1f2328"),
    ("--folio-fg", "#1f2328"),
    ("--folio-muted", "#5f6b76"),
    ("--folio-table-head-bg", "#f0f2f4"),
    ("--folio-table-hover-bg", "#f6f8fa"),
];

const DARK_PALETTE: &[(&str, &str)] = &[
    ("--folio-accent", "#63b3ed"),
    ("--folio-bg", "#0e1116"),
    ("--folio-border", "#2a313b"),
    ("--folio-code-bg", "#202634"),
    ("--folio-code-fg", "#f0f6fc"),
    ("--folio-fg", "#e6edf3"),
    ("--folio-muted", "#9aa4af"),
    ("--folio-table-head-bg", "#161b22"),
    ("--folio-table-hover-bg", "#1b212b"),
];

/// Palette selection. Parsing never depends on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
}

impl Theme {
    /// Syntect themes to try, best first.
    fn syntax_themes(self) -> [&'static str; 3] {
        match self {
            Theme::Dark => ["Monokai Extended Bright", "Monokai Extended", "base16-ocean.dark"],
            Theme::Light | Theme::Auto => {
                ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"]
            }
        }
    }
}

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(UnknownTheme(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTheme(pub String);

impl fmt::Display for UnknownTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown theme `{}` (expected auto, light or dark)", self.0)
    }
}

impl std::error::Error for UnknownTheme {}

/// Colors code lines with syntect. Unknown languages fall back to plain
/// text; a line syntect cannot handle makes the whole block plain.
pub struct SyntaxHighlighter {
    theme: &'static SyntectTheme,
}

impl SyntaxHighlighter {
    pub fn new(theme: Theme) -> Option<Self> {
        let theme = theme
            .syntax_themes()
            .iter()
            .find_map(|name| THEME_SET.themes.get(*name))
            .or_else(|| THEME_SET.themes.values().next())?;
        Some(Self { theme })
    }
}

impl CodeHighlighter for SyntaxHighlighter {
    fn highlight_lines(&self, language: Option<&str>, lines: &[&str]) -> Option<Vec<String>> {
        let syntax = language
            .and_then(|token| SYNTAX_SET.find_syntax_by_token(token))
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, self.theme);
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            let ranges = highlighter.highlight_line(line, &SYNTAX_SET).ok()?;
            let mut html = String::new();
            for (style, text) in ranges {
                if text.is_empty() {
                    continue;
                }
                let color = style.foreground;
                let _ = write!(
                    html,
                    "<span style=\"color:#{:02x}{:02x}{:02x};\">{}</span>",
                    color.r,
                    color.g,
                    color.b,
                    escape_html(text)
                );
            }
            out.push(html);
        }
        Some(out)
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    theme: Theme,
    custom_vars: BTreeMap<String, String>,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            custom_vars: BTreeMap::new(),
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Overrides one CSS variable after the palette.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_vars.insert(key.into(), value.into());
        self
    }

    pub fn stylesheet(&self) -> String {
        let mut out = String::new();
        match self.theme {
            Theme::Auto => {
                push_root(&mut out, "", LIGHT_PALETTE.iter().copied(), true);
                out.push_str("@media (prefers-color-scheme: dark) {\n");
                push_root(&mut out, "  ", DARK_PALETTE.iter().copied(), true);
                out.push_str("}\n");
            }
            Theme::Light => push_root(&mut out, "", LIGHT_PALETTE.iter().copied(), true),
            Theme::Dark => push_root(&mut out, "", DARK_PALETTE.iter().copied(), true),
        }
        if !self.custom_vars.is_empty() {
            let vars = self
                .custom_vars
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()));
            push_root(&mut out, "", vars, false);
        }
        out.push_str(BASE_CSS);
        out
    }

    /// The highlighted article body for a rendered document.
    pub fn render_fragment(&self, document: &RenderedDocument, options: &EmitOptions) -> String {
        let html = match SyntaxHighlighter::new(self.theme) {
            Some(highlighter) => emit_html_with(&document.tree, options, &highlighter),
            None => folio_core::emit_html(&document.tree, options),
        };
        let mut out = String::with_capacity(html.len() + 48);
        out.push_str("<article class=\"folio-article\">\n");
        out.push_str(&html);
        if !html.is_empty() && !html.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("</article>\n");
        out
    }

    /// A standalone page; the title comes from the `title` front matter key.
    pub fn render_page(
        &self,
        document: &RenderedDocument,
        options: &EmitOptions,
        with_inline_js: bool,
    ) -> String {
        let title = document
            .front_matter
            .as_ref()
            .and_then(|front| front.get_str("title"));
        self.embed_html(
            &self.render_fragment(document, options),
            title,
            true,
            with_inline_js,
        )
    }

    pub fn embed_html(
        &self,
        html: &str,
        title: Option<&str>,
        with_inline_css: bool,
        with_inline_js: bool,
    ) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        out.push_str("  <meta charset=\"utf-8\" />\n");
        out.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />\n");
        if let Some(title) = title {
            let _ = writeln!(out, "  <title>{}</title>", escape_html(title));
        }
        if with_inline_css {
            out.push_str("  <style>\n");
            out.push_str(&self.stylesheet());
            out.push_str("\n  </style>\n");
        }
        out.push_str("</head>\n<body>\n");
        out.push_str(html);
        if !html.ends_with('\n') {
            out.push('\n');
        }
        if with_inline_js {
            out.push_str("  <script>\n");
            out.push_str(BASE_JS);
            out.push_str("\n  </script>\n");
        }
        out.push_str("</body>\n</html>\n");
        out
    }

    /// Writes `folio.css` and `folio.js` for pages that link them.
    pub fn generate_files(&self, out_dir: &Path) -> io::Result<()> {
        fs::create_dir_all(out_dir)?;
        fs::write(out_dir.join("folio.css"), self.stylesheet())?;
        fs::write(out_dir.join("folio.js"), BASE_JS)?;
        Ok(())
    }
}

fn push_root<'a>(
    out: &mut String,
    indent: &str,
    vars: impl Iterator<Item = (&'a str, &'a str)>,
    color_scheme: bool,
) {
    let _ = writeln!(out, "{}:root {{", indent);
    if color_scheme {
        let _ = writeln!(out, "{}  color-scheme: light dark;", indent);
    }
    for (key, value) in vars {
        let _ = writeln!(out, "{}  {}: {};", indent, key, value);
    }
    let _ = writeln!(out, "{}}}", indent);
}
