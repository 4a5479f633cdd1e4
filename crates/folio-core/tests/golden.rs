use std::fs;
use std::path::{Path, PathBuf};
use folio_core::{
    Diagnostic, dump_blocks, normalize_line_endings, render, segment, split_front_matter,
};

#[test]
fn golden_fixtures() -> Result<(), Box<dyn std::error::Error>> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let fixtures_dir = root.join("tests/fixtures");
    let expect_dir = root.join("tests/expect");

    let mut fixtures = collect_fixtures(&fixtures_dir)?;
    fixtures.sort_by(|a, b| file_name(a).cmp(&file_name(b)));
    assert!(!fixtures.is_empty(), "no fixtures in {}", fixtures_dir.display());

    for fixture in fixtures {
        let name = file_stem(&fixture)?;
        let source = fs::read_to_string(&fixture)?;

        let (_, body) = split_front_matter(&source);
        let text = normalize_line_endings(body, true);
        let lines: Vec<&str> = text.lines().collect();
        let dump = dump_blocks(&segment(&lines));

        let blocks_path = expect_dir.join(format!("{}.blocks", name));
        let expected = fs::read_to_string(&blocks_path)?;
        assert_eq!(
            dump.trim_end(),
            expected.trim_end(),
            "block mismatch for fixture {}",
            name
        );

        let rendered = render(&source);
        let diag_path = expect_dir.join(format!("{}.diag", name));
        if diag_path.exists() {
            let expected = fs::read_to_string(&diag_path)?;
            assert_eq!(
                diagnostics_to_text(&rendered.diagnostics).trim_end(),
                expected.trim_end(),
                "diagnostics mismatch for fixture {}",
                name
            );
        } else if !rendered.diagnostics.is_empty() {
            panic!(
                "unexpected diagnostics for fixture {}:\n{}",
                name,
                diagnostics_to_text(&rendered.diagnostics)
            );
        }
    }

    Ok(())
}

fn collect_fixtures(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut fixtures = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("md") {
            fixtures.push(path);
        }
    }
    Ok(fixtures)
}

fn file_name(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
}

fn file_stem(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|value| value.to_string())
        .ok_or_else(|| "fixture name is not valid UTF-8".into())
}

fn diagnostics_to_text(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diag in diagnostics {
        out.push_str(&format!("{} {}\n", diag.line, diag.code));
    }
    out
}
