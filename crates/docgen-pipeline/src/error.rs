//! Pipeline error type.

use std::path::PathBuf;

use docgen_renderer::RenderError;

use crate::reader::ReadError;
use crate::scheduler::ScheduleError;
use crate::template::TemplateError;

/// Fatal errors that abort a build.
///
/// Nothing is published when a build fails with one of these.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Two documents share an id.
    #[error("duplicate document id \"{0}\"")]
    DuplicateDocument(String),

    /// Two rendered documents map to the same output file.
    #[error("documents \"{first}\" and \"{second}\" both write \"{path}\"")]
    DuplicateOutput {
        path: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Rendering a document failed.
    #[error("failed to render \"{document}\": {source}")]
    Render {
        document: String,
        #[source]
        source: RenderError,
    },

    /// A processor handler failed.
    #[error("processor \"{name}\" failed: {message}")]
    Processor { name: String, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
