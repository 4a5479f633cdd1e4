use serde::Serialize;

pub const W_FRONT_MATTER_UNCLOSED: &str = "W_FRONT_MATTER_UNCLOSED";
pub const W_CODE_FENCE_UNCLOSED: &str = "W_CODE_FENCE_UNCLOSED";
pub const W_TABLE_RAGGED: &str = "W_TABLE_RAGGED";
pub const W_TABLE_NO_SEPARATOR: &str = "W_TABLE_NO_SEPARATOR";
pub const W_IMAGE_UNDECODABLE: &str = "W_IMAGE_UNDECODABLE";
pub const W_LINK_UNSAFE: &str = "W_LINK_UNSAFE";

/// A recoverable problem found while rendering. The document is still
/// rendered; diagnostics only describe where the output degraded.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 1-based line in the document body (after front matter), 0 when the
    /// problem is not tied to a line.
    pub line: usize,
    pub severity: DiagnosticSeverity,
    pub code: &'static str,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        line: usize,
        severity: DiagnosticSeverity,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            severity,
            code,
            message: message.into(),
        }
    }

    pub fn warning(line: usize, code: &'static str, message: impl Into<String>) -> Self {
        Self::new(line, DiagnosticSeverity::Warning, code, message)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}
