//! Error types for bundling.

use std::path::PathBuf;

/// Errors raised while bundling a batch.
///
/// Any error aborts the whole batch; no bundle is written.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Import specifier that is neither external nor resolvable.
    #[error("{importer}: could not resolve \"{specifier}\" (entry {entry})")]
    Unresolved {
        entry: String,
        importer: String,
        specifier: String,
    },

    /// Module file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bundle could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Module with an unsupported file type.
    #[error("unsupported module type: {}", path.display())]
    Unsupported { path: PathBuf },

    /// JSON module or batch with invalid content.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
