//! Link classification: maps a URL to the site descriptor used to decorate
//! tagged links.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkCategory {
    Code,
    Docs,
    Blog,
    Video,
    Social,
    Spec,
    Community,
    Package,
    Reference,
    External,
}

impl LinkCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Docs => "docs",
            Self::Blog => "blog",
            Self::Video => "video",
            Self::Social => "social",
            Self::Spec => "spec",
            Self::Community => "community",
            Self::Package => "package",
            Self::Reference => "reference",
            Self::External => "external",
        }
    }
}

/// One entry of the domain table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub domain: String,
    pub category: LinkCategory,
    pub label: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_background")]
    pub background: String,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

const DEFAULT_ICON: &str = "🔗";
const DEFAULT_COLOR: &str = "#6b7280";
const DEFAULT_BACKGROUND: &str = "#f3f4f6";
const DEFAULT_LABEL: &str = "external link";

/// Classification result for one URL.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LinkInfo {
    /// Host of the classified URL, lower-cased, without `www.`.
    pub domain: String,
    pub category: LinkCategory,
    pub label: String,
    pub icon: String,
    pub color: String,
    pub background: String,
}

impl LinkInfo {
    fn from_site(domain: String, site: &SiteDescriptor) -> Self {
        Self {
            domain,
            category: site.category,
            label: site.label.clone(),
            icon: site.icon.clone(),
            color: site.color.clone(),
            background: site.background.clone(),
        }
    }

    fn external(domain: String) -> Self {
        Self {
            domain,
            category: LinkCategory::External,
            label: DEFAULT_LABEL.to_string(),
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR.to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.category == LinkCategory::External
    }
}

// Order matters for fuzzy matching: the first entry sharing a label wins.
const BUILTIN_SITES: &[(&str, LinkCategory, &str, &str, &str, &str)] = &[
    ("github.com", LinkCategory::Code, "GitHub", "🐙", "#24292f", "#eaeef2"),
    ("gitlab.com", LinkCategory::Code, "GitLab", "🦊", "#e24329", "#fdeae6"),
    ("stackoverflow.com", LinkCategory::Community, "Stack Overflow", "💬", "#f48024", "#fdf0e4"),
    ("developer.mozilla.org", LinkCategory::Docs, "MDN", "📘", "#1b1b1b", "#e8f0fe"),
    ("python.org", LinkCategory::Docs, "Python", "🐍", "#306998", "#e9f1f8"),
    ("docs.rs", LinkCategory::Docs, "docs.rs", "📚", "#353535", "#f0f0f0"),
    ("crates.io", LinkCategory::Package, "crates.io", "📦", "#264323", "#eaf3e8"),
    ("rust-lang.org", LinkCategory::Docs, "Rust", "🦀", "#b7410e", "#fbeee7"),
    ("npmjs.com", LinkCategory::Package, "npm", "📦", "#cb3837", "#fbe9e9"),
    ("pypi.org", LinkCategory::Package, "PyPI", "📦", "#3775a9", "#e8f0f8"),
    ("medium.com", LinkCategory::Blog, "Medium", "✍️", "#000000", "#f2f2f2"),
    ("dev.to", LinkCategory::Blog, "DEV", "✍️", "#0a0a0a", "#f0f0f0"),
    ("youtube.com", LinkCategory::Video, "YouTube", "▶️", "#ff0000", "#ffe9e9"),
    ("youtu.be", LinkCategory::Video, "YouTube", "▶️", "#ff0000", "#ffe9e9"),
    ("vimeo.com", LinkCategory::Video, "Vimeo", "▶️", "#1ab7ea", "#e6f7fd"),
    ("twitter.com", LinkCategory::Social, "Twitter", "🐦", "#1d9bf0", "#e8f5fe"),
    ("x.com", LinkCategory::Social, "X", "✖️", "#0f1419", "#eff3f4"),
    ("linkedin.com", LinkCategory::Social, "LinkedIn", "💼", "#0a66c2", "#e7f0fa"),
    ("reddit.com", LinkCategory::Community, "Reddit", "👽", "#ff4500", "#ffece5"),
    ("news.ycombinator.com", LinkCategory::Community, "Hacker News", "🟧", "#ff6600", "#fff0e5"),
    ("w3.org", LinkCategory::Spec, "W3C", "📐", "#005a9c", "#e5eff7"),
    ("ietf.org", LinkCategory::Spec, "IETF", "📐", "#3a5f8f", "#e9eff6"),
    ("rfc-editor.org", LinkCategory::Spec, "RFC", "📐", "#3a5f8f", "#e9eff6"),
    ("wikipedia.org", LinkCategory::Reference, "Wikipedia", "📖", "#202122", "#f0f0f0"),
    ("arxiv.org", LinkCategory::Reference, "arXiv", "📄", "#b31b1b", "#f9e8e8"),
];

// Labels too common to identify a site on their own.
const GENERIC_LABELS: &[&str] = &["www", "m", "co", "com", "org", "net", "io"];

fn builtin_sites() -> Vec<SiteDescriptor> {
    BUILTIN_SITES
        .iter()
        .map(
            |(domain, category, label, icon, color, background)| SiteDescriptor {
                domain: domain.to_string(),
                category: *category,
                label: label.to_string(),
                icon: icon.to_string(),
                color: color.to_string(),
                background: background.to_string(),
            },
        )
        .collect()
}

/// Exact and fuzzy lookup over an ordered domain table.
#[derive(Clone, Debug)]
pub struct LinkClassifier {
    sites: Vec<SiteDescriptor>,
    exact: HashMap<String, usize>,
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::from_sites(builtin_sites())
    }
}

impl LinkClassifier {
    /// The built-in table followed by `extra`. A domain already in the
    /// table keeps its first descriptor for exact matches.
    pub fn with_sites(extra: impl IntoIterator<Item = SiteDescriptor>) -> Self {
        let mut sites = builtin_sites();
        sites.extend(extra);
        Self::from_sites(sites)
    }

    pub fn from_sites(sites: Vec<SiteDescriptor>) -> Self {
        let mut sites = sites;
        for site in &mut sites {
            site.domain = normalize_domain(&site.domain);
        }
        let mut exact = HashMap::new();
        for (idx, site) in sites.iter().enumerate() {
            exact.entry(site.domain.clone()).or_insert(idx);
        }
        Self { sites, exact }
    }

    pub fn sites(&self) -> &[SiteDescriptor] {
        &self.sites
    }

    pub fn classify(&self, url: &str) -> LinkInfo {
        let domain = link_domain(url);
        match self.lookup(&domain) {
            Some(site) => LinkInfo::from_site(domain, site),
            None => LinkInfo::external(domain),
        }
    }

    fn lookup(&self, domain: &str) -> Option<&SiteDescriptor> {
        if domain.is_empty() {
            return None;
        }
        if let Some(idx) = self.exact.get(domain) {
            return self.sites.get(*idx);
        }
        let wanted = significant_labels(domain);
        if wanted.is_empty() {
            return None;
        }
        self.sites.iter().find(|site| {
            significant_labels(&site.domain)
                .iter()
                .any(|label| wanted.contains(label))
        })
    }
}

/// The host of `url`, lower-cased with a leading `www.` removed; empty when
/// the URL does not parse.
pub fn link_domain(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|url| url.host_str().map(normalize_domain))
        .unwrap_or_default()
}

fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().to_ascii_lowercase();
    match domain.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => domain,
    }
}

/// Dot-separated labels without the top-level label and generic labels.
fn significant_labels(domain: &str) -> Vec<&str> {
    let mut labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() > 1 {
        labels.pop();
    }
    labels.retain(|label| !GENERIC_LABELS.contains(label));
    labels
}

static DEFAULT_CLASSIFIER: Lazy<LinkClassifier> = Lazy::new(LinkClassifier::default);

/// Classifies `url` against the built-in table.
pub fn classify(url: &str) -> LinkInfo {
    DEFAULT_CLASSIFIER.classify(url)
}

/// True when `url` resolves to the same origin as `origin`. Without an
/// origin, or when resolution fails, anything not starting with `http`
/// counts as internal.
pub fn is_internal(url: &str, origin: Option<&Url>) -> bool {
    let resolved = origin.and_then(|base| {
        base.join(url.trim())
            .ok()
            .map(|joined| joined.origin() == base.origin())
    });
    resolved.unwrap_or_else(|| !url.trim_start().starts_with("http"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        let info = classify("https://github.com/foo/bar");
        assert_eq!(info.label, "GitHub");
        assert_eq!(info.category, LinkCategory::Code);
        assert_eq!(info.domain, "github.com");
    }

    #[test]
    fn www_prefix_and_case_are_ignored() {
        let info = classify("https://WWW.YouTube.com/watch?v=1");
        assert_eq!(info.label, "YouTube");
        assert_eq!(info.domain, "youtube.com");
    }

    #[test]
    fn subdomain_matches_fuzzily() {
        assert_eq!(classify("https://gist.github.com/x").label, "GitHub");
        assert_eq!(classify("https://en.wikipedia.org/wiki/Rust").label, "Wikipedia");
    }

    #[test]
    fn earlier_entry_wins_a_fuzzy_tie() {
        assert_eq!(classify("https://docs.python.org/3/").label, "Python");
    }

    #[test]
    fn top_level_label_alone_never_matches() {
        let info = classify("https://totally-unknown-domain.example");
        assert!(info.is_default());
        assert_eq!(info.label, DEFAULT_LABEL);
        assert!(classify("https://something.com").is_default());
    }

    #[test]
    fn unparsable_url_is_default_with_empty_domain() {
        let info = classify("not a url");
        assert!(info.is_default());
        assert_eq!(info.domain, "");
    }

    #[test]
    fn extra_sites_are_appended() {
        let classifier = LinkClassifier::with_sites([SiteDescriptor {
            domain: "blog.example.net".to_string(),
            category: LinkCategory::Blog,
            label: "Example".to_string(),
            icon: default_icon(),
            color: default_color(),
            background: default_background(),
        }]);
        assert_eq!(classifier.classify("https://blog.example.net/p").label, "Example");
        assert_eq!(classifier.classify("https://github.com").label, "GitHub");
    }

    #[test]
    fn internal_detection() {
        let origin = Url::parse("https://me.dev/").ok();
        let origin = origin.as_ref();
        assert!(is_internal("/posts/a", origin));
        assert!(is_internal("https://me.dev/posts/a", origin));
        assert!(!is_internal("https://github.com", origin));
        assert!(is_internal("/posts/a", None));
        assert!(!is_internal("https://github.com", None));
    }
}
