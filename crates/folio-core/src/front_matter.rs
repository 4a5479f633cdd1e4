use serde::Serialize;
use std::collections::BTreeMap;

const FENCE: &str = "---";

/// Metadata header of a post. Keys keep their source spelling.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FrontMatter {
    pub entries: BTreeMap<String, FrontMatterValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FrontMatterValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
}

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            FrontMatterValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            FrontMatterValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        match self.entries.get(key)? {
            FrontMatterValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Splits a leading `---` fenced header off `content`.
///
/// Returns `(None, content)` untouched when there is no header or when the
/// opening fence is never closed.
pub fn split_front_matter(content: &str) -> (Option<FrontMatter>, &str) {
    let Some(after_open) = strip_fence_line(content) else {
        return (None, content);
    };

    let mut offset = 0;
    let mut entries = BTreeMap::new();
    loop {
        let rest = &after_open[offset..];
        if rest.is_empty() {
            return (None, content);
        }
        let (line, consumed) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], idx + 1),
            None => (rest, rest.len()),
        };
        offset += consumed;
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim_end() == FENCE {
            let body = &after_open[offset..];
            return (Some(FrontMatter { entries }), body);
        }
        if let Some((key, value)) = parse_entry(line) {
            entries.insert(key, value);
        }
    }
}

/// The body of `content` without its front matter.
pub fn strip_front_matter(content: &str) -> &str {
    split_front_matter(content).1
}

/// True when `content` opens a front matter fence that never closes.
pub fn has_unclosed_front_matter(content: &str) -> bool {
    strip_fence_line(content).is_some() && split_front_matter(content).0.is_none()
}

fn strip_fence_line(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix(FENCE)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

fn parse_entry(line: &str) -> Option<(String, FrontMatterValue)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), parse_value(value.trim())))
}

fn parse_value(raw: &str) -> FrontMatterValue {
    if let Some(inner) = raw.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|item| unquote(item.trim()).to_string())
            .filter(|item| !item.is_empty())
            .collect();
        return FrontMatterValue::List(items);
    }
    match raw {
        "true" => return FrontMatterValue::Bool(true),
        "false" => return FrontMatterValue::Bool(false),
        _ => {}
    }
    FrontMatterValue::Text(unquote(raw).to_string())
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_header_and_body() {
        let source = "---\ntitle: \"Hello\"\ntags: [rust, 'web', ]\ndraft: false\n---\n# Body\n";
        let (front, body) = split_front_matter(source);
        let front = front.expect("front matter");
        assert_eq!(front.get_str("title"), Some("Hello"));
        assert_eq!(
            front.get_list("tags"),
            Some(&["rust".to_string(), "web".to_string()][..])
        );
        assert_eq!(front.get_bool("draft"), Some(false));
        assert_eq!(body, "# Body\n");
    }

    #[test]
    fn unclosed_header_leaves_document_alone() {
        let source = "---\ntitle: x\n# Body\n";
        let (front, body) = split_front_matter(source);
        assert!(front.is_none());
        assert_eq!(body, source);
        assert!(has_unclosed_front_matter(source));
    }

    #[test]
    fn crlf_fences_are_recognised() {
        let source = "---\r\ndate: 2024-01-02\r\n---\r\nbody";
        let (front, body) = split_front_matter(source);
        let front = front.expect("front matter");
        assert_eq!(front.get_str("date"), Some("2024-01-02"));
        assert_eq!(body, "body");
    }

    #[test]
    fn other_values_stay_raw_strings() {
        let (front, _) = split_front_matter("---\ncount: 12\nurl: https://a.b/c\n---\n");
        let front = front.expect("front matter");
        assert_eq!(front.get_str("count"), Some("12"));
        assert_eq!(front.get_str("url"), Some("https://a.b/c"));
    }

    #[test]
    fn document_without_header_is_untouched() {
        let source = "# Title\n---\nnot a header\n---\n";
        assert_eq!(strip_front_matter(source), source);
    }
}
