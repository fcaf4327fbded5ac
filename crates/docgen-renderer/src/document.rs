//! Document records shared by the renderer and the pipeline.
//!
//! A [`Document`] is created once by a file reader and then owned by the
//! pipeline; processors mutate it in place but never duplicate its `id`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::util::join_paths;

/// Source and output location of a document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileInfo {
    /// Path of the source file on disk.
    pub full_path: PathBuf,
    /// Logical directory of the document in the site (e.g. `./guide`).
    pub path: String,
    /// File stem of the source file.
    pub name: String,
    /// Output filename, or `None` when the document is not rendered.
    pub output_name: Option<String>,
}

impl FileInfo {
    /// Path of the rendered file relative to the output folder.
    ///
    /// Returns `None` for documents without output.
    ///
    /// ```
    /// use docgen_renderer::FileInfo;
    ///
    /// let info = FileInfo {
    ///     path: "./guide".to_owned(),
    ///     output_name: Some("index.html".to_owned()),
    ///     ..FileInfo::default()
    /// };
    /// assert_eq!(info.output_path().as_deref(), Some("guide/index.html"));
    /// ```
    #[must_use]
    pub fn output_path(&self) -> Option<String> {
        let output_name = self.output_name.as_deref()?;
        Some(join_paths(&[&self.path, output_name]))
    }
}

/// Free-form document attributes (front matter).
///
/// Values are kept as strings; typed accessors parse on demand.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// Create an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set an attribute value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove an attribute.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Document title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    /// Sort order used by navigation.
    #[must_use]
    pub fn sort_order(&self) -> Option<i64> {
        self.get("sortorder").and_then(|value| value.trim().parse().ok())
    }

    /// Iterate over all attributes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One input file going through the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    /// Stable identifier, unique across the whole run.
    pub id: String,
    /// Short name used for cross references.
    pub name: String,
    /// Source and output location.
    pub file_info: FileInfo,
    /// Front matter attributes.
    pub attributes: Attributes,
    /// Raw or already-transformed content.
    pub body: String,
    /// Page template name.
    pub template: String,
}

impl Document {
    /// Whether this document produces an output file.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        self.file_info.output_name.is_some()
    }

    /// Title from attributes, falling back to the document name.
    #[must_use]
    pub fn title(&self) -> &str {
        self.attributes.title().unwrap_or(&self.name)
    }
}
