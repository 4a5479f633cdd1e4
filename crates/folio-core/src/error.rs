use std::path::PathBuf;
use thiserror::Error;

/// Errors from the parts of the crate that touch configuration or storage.
/// Rendering itself never fails; content problems are diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid document origin `{origin}`: {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid post slug: {0:?}")]
    InvalidSlug(String),

    #[error("post not found: {slug}")]
    NotFound { slug: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
