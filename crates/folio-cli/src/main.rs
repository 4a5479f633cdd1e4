mod config;

use std::fs;
use std::io::{self, Read};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use folio_core::{
    CachedSource, ContentSource, Diagnostic, DiagnosticSeverity, DirectorySource, EmitOptions,
    LinkClassifier, RenderOptions, dump_blocks, normalize_line_endings, render_with_options,
    segment, split_front_matter,
};
use folio_renderer::{Renderer, Theme};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use config::Config;

const SOURCE_CACHE_CAPACITY: usize = 32;

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Render blog posts written in Markdown or mixed HTML")]
#[command(version)]
struct Cli {
    /// Post file to render. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Directory holding `<slug>.md` posts.
    #[arg(long, requires = "slug", conflicts_with = "input")]
    posts_dir: Option<PathBuf>,

    /// Post to load from `--posts-dir`.
    #[arg(long, requires = "posts_dir")]
    slug: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    /// Print the HTML fragment without the page wrapper.
    #[arg(long)]
    raw: bool,

    /// Inline the image viewer script into the page.
    #[arg(long)]
    js: bool,

    /// auto, light or dark.
    #[arg(long)]
    theme: Option<String>,

    /// Site origin; links on it render as plain internal links.
    #[arg(long)]
    origin: Option<String>,

    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    diagnostics: Option<DiagnosticsMode>,

    /// Keep author HTML as written instead of running the allow-list.
    #[arg(long)]
    no_sanitize: bool,

    /// Leave literal `\n` sequences in the text.
    #[arg(long)]
    no_fold_newlines: bool,

    /// Write the stylesheet and viewer script into this directory.
    #[arg(long)]
    emit_assets: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Html,
    Json,
    Blocks,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DiagnosticsMode {
    Json,
    Pretty,
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            process::exit(2);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let theme = match cli.theme.as_deref().or(config.theme.as_deref()) {
        Some(name) => name.parse::<Theme>()?,
        None => Theme::default(),
    };
    let render_options = RenderOptions {
        origin: cli.origin.clone().or_else(|| config.origin.clone()),
        fold_escaped_newlines: config.fold_escaped_newlines && !cli.no_fold_newlines,
        sanitize: config.sanitize && !cli.no_sanitize,
    };
    let origin = render_options
        .origin_url()
        .context("invalid --origin value")?;

    let renderer = Renderer::new(theme);
    if let Some(dir) = &cli.emit_assets {
        renderer
            .generate_files(dir)
            .with_context(|| format!("failed to write assets to {}", dir.display()))?;
        info!(dir = %dir.display(), "wrote stylesheet and viewer script");
    }

    let source = read_source(&cli)?;
    let document = render_with_options(&source, &render_options);

    if let Some(mode) = cli.diagnostics {
        emit_diagnostics(&document.diagnostics, mode)?;
    }

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Blocks => {
            let (_, body) = split_front_matter(&source);
            let text = normalize_line_endings(body, render_options.fold_escaped_newlines);
            let lines: Vec<&str> = text.lines().collect();
            print!("{}", dump_blocks(&segment(&lines)));
        }
        OutputFormat::Html => {
            let classifier = LinkClassifier::with_sites(config.sites.iter().cloned());
            let emit_options = EmitOptions::new()
                .with_origin(origin)
                .with_classifier(classifier);
            let standalone = config.standalone && !cli.raw;
            let html = if standalone {
                renderer.render_page(&document, &emit_options, cli.js)
            } else {
                renderer.render_fragment(&document, &emit_options)
            };
            print!("{}", html);
        }
    }

    let failed = document
        .diagnostics
        .iter()
        .any(|diag| diag.severity == DiagnosticSeverity::Error);
    Ok(if failed { 1 } else { 0 })
}

fn read_source(cli: &Cli) -> Result<String> {
    if let (Some(dir), Some(slug)) = (&cli.posts_dir, &cli.slug) {
        let source = CachedSource::new(
            DirectorySource::new(dir),
            NonZeroUsize::new(SOURCE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        );
        let post = source.fetch(slug)?;
        debug!(slug = %post.slug, size = post.size, "loaded post");
        return Ok(post.text);
    }
    if cli.slug.is_some() {
        bail!("--slug needs --posts-dir");
    }
    match &cli.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn emit_diagnostics(diagnostics: &[Diagnostic], mode: DiagnosticsMode) -> Result<()> {
    match mode {
        DiagnosticsMode::Json => {
            eprintln!("{}", serde_json::to_string_pretty(diagnostics)?);
        }
        DiagnosticsMode::Pretty => {
            for diagnostic in diagnostics {
                eprintln!("{}", diagnostic_to_pretty(diagnostic));
            }
        }
    }
    Ok(())
}

fn diagnostic_to_pretty(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    format!(
        "{}: {} {} {}",
        diagnostic.line, severity, diagnostic.code, diagnostic.message
    )
}
