//! `import` example blocks.
//!
//! An `import` block names an example file instead of containing the code:
//!
//! ```text
//! // Primary button with an icon
//! FButtonPrimary.vue
//! ```
//!
//! Leading `//` lines are kept as comments shown next to the example.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ExampleError;

/// Parsed body of an `import` block.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedImport {
    /// File to import, relative to an example folder.
    pub filename: String,
    /// File extension, used as the concrete language.
    pub extension: String,
    /// Directive comments preceding the filename.
    pub comments: Vec<String>,
}

/// Parse the body of an `import` block.
pub fn parse_import(source: &str) -> Result<ParsedImport, ExampleError> {
    let mut comments = Vec::new();
    let mut filename = None;

    for line in source.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if let Some(comment) = line.strip_prefix("//") {
            comments.push(comment.trim().to_owned());
        } else {
            filename = Some(line);
            break;
        }
    }

    let filename =
        filename.ok_or_else(|| ExampleError::InvalidImport("missing filename".to_owned()))?;
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| {
            ExampleError::InvalidImport(format!("\"{filename}\" has no file extension"))
        })?;

    Ok(ParsedImport {
        filename: filename.to_owned(),
        extension: extension.to_owned(),
        comments,
    })
}

/// Find an example file in the configured folders. First match wins.
pub fn resolve_import(folders: &[PathBuf], filename: &str) -> Result<PathBuf, ExampleError> {
    folders
        .iter()
        .map(|folder| folder.join(filename))
        .find(|candidate| candidate.is_file())
        .inspect(|found| debug!(path = %found.display(), "Resolved example import"))
        .ok_or_else(|| ExampleError::NoSuchExample {
            filename: filename.to_owned(),
            searched: folders.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_import_with_comments() {
        let parsed = parse_import("// Primary\n//   with icon \nFButton.vue\n").unwrap();
        assert_eq!(
            parsed,
            ParsedImport {
                filename: "FButton.vue".to_owned(),
                extension: "vue".to_owned(),
                comments: vec!["Primary".to_owned(), "with icon".to_owned()],
            }
        );
    }

    #[test]
    fn test_parse_import_nested_path() {
        let parsed = parse_import("\n  forms/Input.html  \n").unwrap();
        assert_eq!(parsed.filename, "forms/Input.html");
        assert_eq!(parsed.extension, "html");
        assert!(parsed.comments.is_empty());
    }

    #[test]
    fn test_parse_import_missing_filename() {
        let err = parse_import("// only a comment\n").unwrap_err();
        assert!(matches!(err, ExampleError::InvalidImport(_)));
    }

    #[test]
    fn test_parse_import_missing_extension() {
        let err = parse_import("Makefile").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid example import: \"Makefile\" has no file extension"
        );
    }

    #[test]
    fn test_resolve_import_first_match_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("A.vue"), "second").unwrap();
        std::fs::write(first.path().join("A.vue"), "first").unwrap();
        std::fs::write(second.path().join("B.vue"), "only second").unwrap();

        let folders = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            resolve_import(&folders, "A.vue").unwrap(),
            first.path().join("A.vue")
        );
        assert_eq!(
            resolve_import(&folders, "B.vue").unwrap(),
            second.path().join("B.vue")
        );
    }

    #[test]
    fn test_resolve_import_no_such_example() {
        let dir = tempfile::tempdir().unwrap();
        let folders = vec![dir.path().to_path_buf()];
        let err = resolve_import(&folders, "Missing.vue").unwrap_err();
        assert!(matches!(err, ExampleError::NoSuchExample { .. }));
        assert!(err.to_string().starts_with("no such example \"Missing.vue\""));
    }
}
