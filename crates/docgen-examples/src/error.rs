//! Example generation errors.

use std::path::PathBuf;

/// Error generating an example.
#[derive(Debug, thiserror::Error)]
pub enum ExampleError {
    /// Imported example not found in any configured folder.
    #[error("no such example \"{filename}\", searched in: {}", format_folders(.searched))]
    NoSuchExample {
        filename: String,
        searched: Vec<PathBuf>,
    },

    /// The body of an `import` block does not name a file.
    #[error("invalid example import: {0}")]
    InvalidImport(String),

    /// Reading an example file failed.
    #[error("failed to read example {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Component source cannot be turned into a runnable module.
    #[error("{filename}: {message}")]
    InvalidComponent { filename: String, message: String },
}

fn format_folders(folders: &[PathBuf]) -> String {
    folders
        .iter()
        .map(|folder| format!("\"{}\"", folder.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
