//! Where post text comes from. Sources are plain values handed to callers;
//! nothing here is global.

use crate::error::SourceError;
use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::trace;

/// Raw text of one post plus its metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostContent {
    pub slug: String,
    pub text: String,
    /// Size of the text in bytes.
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

pub trait ContentSource {
    fn fetch(&self, slug: &str) -> Result<PostContent, SourceError>;
}

impl<S: ContentSource + ?Sized> ContentSource for &S {
    fn fetch(&self, slug: &str) -> Result<PostContent, SourceError> {
        (**self).fetch(slug)
    }
}

/// Reads `<root>/<slug>.md`.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
    base_url: Option<String>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: None,
        }
    }

    /// Posts get `<base_url>/<slug>` as their URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, slug: &str) -> Result<PathBuf, SourceError> {
        validate_slug(slug)?;
        Ok(self.root.join(format!("{}.md", slug)))
    }
}

impl ContentSource for DirectorySource {
    fn fetch(&self, slug: &str) -> Result<PostContent, SourceError> {
        let path = self.path_for(slug)?;
        let text = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound {
                slug: slug.to_string(),
            },
            _ => SourceError::Io {
                path: path.clone(),
                source,
            },
        })?;
        let modified = std::fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        let url = self
            .base_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), slug));
        Ok(PostContent {
            slug: slug.to_string(),
            size: text.len() as u64,
            text,
            modified,
            url,
        })
    }
}

fn validate_slug(slug: &str) -> Result<(), SourceError> {
    let valid = !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains(['/', '\\', '\0'])
        && !slug.contains("..");
    if valid {
        Ok(())
    } else {
        Err(SourceError::InvalidSlug(slug.to_string()))
    }
}

/// Bounded LRU cache in front of another source. Only successful fetches
/// are cached.
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<LruCache<String, PostContent>>,
}

impl<S: ContentSource> CachedSource<S> {
    pub fn new(inner: S, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn invalidate(&self, slug: &str) {
        self.lock().pop(slug);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, PostContent>> {
        // A poisoned cache still holds valid entries.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: ContentSource> ContentSource for CachedSource<S> {
    fn fetch(&self, slug: &str) -> Result<PostContent, SourceError> {
        if let Some(post) = self.lock().get(slug) {
            trace!(slug, "content cache hit");
            return Ok(post.clone());
        }
        let post = self.inner.fetch(slug)?;
        self.lock().put(slug.to_string(), post.clone());
        Ok(post)
    }
}
