//! CLI error types.

use docgen_bundler::BundleError;
use docgen_config::ConfigError;
use docgen_pipeline::{PipelineError, ReadError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Read(#[from] ReadError),

    #[error("{0}")]
    Bundle(#[from] BundleError),

    #[error("invalid example batch: {0}")]
    Batch(#[from] serde_json::Error),

    #[error("{0}")]
    Compile(String),
}
