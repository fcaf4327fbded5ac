//! Example generation capability.
//!
//! The renderer hands every fenced code block with a language tag to an
//! [`ExampleGenerator`]. The generator decides how the block is presented
//! and whether it needs a compiled bundle; the renderer only places the
//! returned markup.

use std::collections::BTreeMap;
use std::error::Error;

/// Boxed error returned by example generators.
pub type GenerateError = Box<dyn Error + Send + Sync>;

/// One fenced code block to turn into an example.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleRequest<'a> {
    /// Block content.
    pub source: &'a str,
    /// Language tag from the fence (e.g. `vue`, `import`, `html`).
    pub language: &'a str,
    /// Logical filename of the example (used for slugs and diagnostics).
    pub filename: &'a str,
    /// Bare words following the language (e.g. `live`, `nomarkup`).
    pub tags: &'a [String],
    /// `key=value` attributes following the language.
    pub attrs: &'a BTreeMap<String, String>,
    /// Id of the document containing the block.
    pub parent: &'a str,
}

/// Request to bundle one generated example into a browser asset.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CompileTask {
    /// Virtual path the source is served under (e.g. `button-1a2b3c.js`).
    pub source_file: String,
    /// Output bundle name (e.g. `example-1a2b3c.js`).
    pub output_file: String,
    /// Generated module text.
    pub sourcecode: String,
    /// Id of the document the example came from.
    pub parent: String,
}

/// Result of generating one example.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleResult {
    /// Source shown to readers (after import resolution).
    pub source: String,
    /// Concrete language (never `import`).
    pub language: String,
    /// Directive comments stripped from an imported file.
    pub comments: Vec<String>,
    /// Tags from the fence.
    pub tags: Vec<String>,
    /// Rendered placeholder or static markup.
    pub markup: String,
    /// Output token of the compiled bundle, if the example runs code.
    pub output: Option<String>,
    /// Whether the example has behaviour in the browser.
    pub runtime: bool,
    /// Compile task for runtime examples needing a bundle.
    pub task: Option<CompileTask>,
}

impl ExampleResult {
    /// Static result: markup is the raw source and nothing is compiled.
    #[must_use]
    pub fn inert(source: &str, language: &str, tags: &[String], runtime: bool) -> Self {
        Self {
            source: source.to_owned(),
            language: language.to_owned(),
            comments: Vec::new(),
            tags: tags.to_vec(),
            markup: source.to_owned(),
            output: None,
            runtime,
            task: None,
        }
    }
}

/// Capability invoked synchronously for every fenced code block.
///
/// # Example
///
/// ```
/// use docgen_renderer::{ExampleGenerator, ExampleRequest, ExampleResult, GenerateError};
///
/// struct Inert;
///
/// impl ExampleGenerator for Inert {
///     fn generate(&mut self, request: &ExampleRequest<'_>) -> Result<ExampleResult, GenerateError> {
///         Ok(ExampleResult::inert(request.source, request.language, request.tags, false))
///     }
/// }
/// ```
pub trait ExampleGenerator {
    /// Generate the example for one block.
    fn generate(&mut self, request: &ExampleRequest<'_>) -> Result<ExampleResult, GenerateError>;
}

/// Split a fence info string into language, bare tags and attributes.
///
/// Quotes around attribute values are stripped; values cannot contain
/// whitespace.
pub(crate) fn parse_fence_info(info: &str) -> (String, Vec<String>, BTreeMap<String, String>) {
    let mut parts = info.split_whitespace();
    let language = parts.next().unwrap_or("").to_owned();

    let mut tags = Vec::new();
    let mut attrs = BTreeMap::new();
    for part in parts {
        if let Some((key, value)) = part.split_once('=') {
            let value = value.trim_matches('"').trim_matches('\'');
            attrs.insert(key.to_owned(), value.to_owned());
        } else {
            tags.push(part.to_owned());
        }
    }

    (language, tags, attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fence_info_language_only() {
        let (lang, tags, attrs) = parse_fence_info("vue");
        assert_eq!(lang, "vue");
        assert!(tags.is_empty());
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_parse_fence_info_tags_and_attrs() {
        let (lang, tags, attrs) = parse_fence_info("vue live nomarkup title='Button'");
        assert_eq!(lang, "vue");
        assert_eq!(tags, vec!["live", "nomarkup"]);
        assert_eq!(attrs.get("title").map(String::as_str), Some("Button"));
    }

    #[test]
    fn test_parse_fence_info_empty() {
        let (lang, tags, _) = parse_fence_info("");
        assert_eq!(lang, "");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_inert_result() {
        let result = ExampleResult::inert("print(1)", "python", &[], false);
        assert_eq!(result.markup, "print(1)");
        assert_eq!(result.output, None);
        assert!(result.task.is_none());
    }
}
