//! Per-render environment.

use std::collections::HashSet;

use crate::document::FileInfo;

/// Environment carried through one markdown render.
///
/// Holds the file info of the document being rendered and the set of
/// anchor ids handed out so far. A fresh environment is created for every
/// render call, so ids never leak between documents.
#[derive(Debug, Default)]
pub struct RenderEnv {
    /// Location of the document being rendered.
    pub file_info: FileInfo,
    ids: HashSet<String>,
}

impl RenderEnv {
    /// Create an environment for the given document.
    #[must_use]
    pub fn new(file_info: FileInfo) -> Self {
        Self {
            file_info,
            ids: HashSet::new(),
        }
    }

    /// Reserve a unique id derived from `base`.
    ///
    /// Returns `base` when unused, otherwise `base-1`, `base-2`, ...
    pub fn unique_id(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        if self.ids.insert(base.to_owned()) {
            return base.to_owned();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}-{n}");
            if self.ids.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Whether an anchor id has been handed out during this render.
    #[must_use]
    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Path of the rendered page relative to the output folder.
    #[must_use]
    pub fn output_path(&self) -> String {
        self.file_info.output_path().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_suffixes() {
        let mut env = RenderEnv::default();
        assert_eq!(env.unique_id("intro"), "intro");
        assert_eq!(env.unique_id("intro"), "intro-1");
        assert_eq!(env.unique_id("intro"), "intro-2");
        assert!(env.has_id("intro-1"));
    }

    #[test]
    fn test_unique_id_skips_taken_suffix() {
        let mut env = RenderEnv::default();
        env.unique_id("a-1");
        env.unique_id("a");
        assert_eq!(env.unique_id("a"), "a-2");
    }

    #[test]
    fn test_unique_id_empty_base() {
        let mut env = RenderEnv::default();
        assert_eq!(env.unique_id(""), "section");
    }
}
