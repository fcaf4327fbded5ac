//! Render errors and the soft-error channel.

use crate::example::GenerateError;

/// Recoverable problem found while rendering content.
///
/// Soft errors are passed to a [`SoftErrorHandler`], which either returns
/// replacement text or hands the error back to abort the page.
#[derive(Debug, thiserror::Error)]
pub enum SoftError {
    /// Container name not in the known set.
    #[error("{document}: unknown container \"{name}\"")]
    UnknownContainer { name: String, document: String },

    /// Container `src` references a document that does not exist.
    #[error("{document}: container references unknown document \"{reference}\"")]
    UnknownDocument { reference: String, document: String },

    /// Inline tag target could not be resolved.
    #[error("{document}: unresolved reference \"{reference}\"")]
    UnresolvedReference { reference: String, document: String },

    /// Example generation failed for a code block.
    #[error("{document}: failed to generate example \"{filename}\": {source}")]
    Example {
        filename: String,
        document: String,
        #[source]
        source: GenerateError,
    },
}

impl SoftError {
    /// Id of the document the error was raised in.
    #[must_use]
    pub fn document(&self) -> &str {
        match self {
            Self::UnknownContainer { document, .. }
            | Self::UnknownDocument { document, .. }
            | Self::UnresolvedReference { document, .. }
            | Self::Example { document, .. } => document,
        }
    }
}

/// Callback deciding what to do with a soft error.
///
/// `Ok(text)` substitutes `text` in the output; `Err` aborts the render.
pub type SoftErrorHandler<'a> = Box<dyn FnMut(SoftError) -> Result<String, SoftError> + 'a>;

/// Fatal render error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A container pulled in a document that is already being rendered.
    #[error("circular inclusion: {}", chain.join(" -> "))]
    CircularInclusion { chain: Vec<String> },

    /// A soft error the handler refused to recover from.
    #[error(transparent)]
    Soft(#[from] SoftError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_inclusion_message() {
        let err = RenderError::CircularInclusion {
            chain: vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
        };
        assert_eq!(err.to_string(), "circular inclusion: a -> b -> a");
    }

    #[test]
    fn test_soft_error_document() {
        let err = SoftError::UnresolvedReference {
            reference: "missing".to_owned(),
            document: "guide".to_owned(),
        };
        assert_eq!(err.document(), "guide");
        assert_eq!(err.to_string(), "guide: unresolved reference \"missing\"");
    }
}
