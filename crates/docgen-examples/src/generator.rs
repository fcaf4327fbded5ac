//! Default example generator.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use docgen_renderer::{
    CompileTask, ExampleGenerator, ExampleRequest, ExampleResult, GenerateError, slugify,
};
use tracing::debug;

use crate::error::ExampleError;
use crate::fingerprint::fingerprint;
use crate::import::{parse_import, resolve_import};
use crate::vue::{VueOptions, generate_vue, mount_markup};

/// Languages whose static markup runs in the browser as-is.
const RUNTIME_LANGUAGES: &[&str] = &["html"];

/// Generates examples and accumulates their compile tasks.
///
/// - `import` blocks are resolved against the example folders and
///   regenerated with the language of the imported file.
/// - `vue` blocks become self-mounting modules with a compile task.
/// - Everything else is static: `html` is marked runtime and shown live,
///   unknown languages render as inert code samples.
///
/// # Example
///
/// ```
/// use docgen_examples::DefaultExampleGenerator;
/// use docgen_renderer::{Document, FileInfo, MarkdownRenderer};
///
/// let doc = Document {
///     id: "button".to_owned(),
///     name: "button".to_owned(),
///     file_info: FileInfo::default(),
///     attributes: Default::default(),
///     body: "```vue\n<template><p>Hi</p></template>\n```".to_owned(),
///     template: "default".to_owned(),
/// };
/// let docs = [doc];
/// let mut generator = DefaultExampleGenerator::new(Vec::new());
/// MarkdownRenderer::new(&docs)
///     .with_example_generator(&mut generator)
///     .render(&docs[0])
///     .unwrap();
/// assert_eq!(generator.take_tasks().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DefaultExampleGenerator {
    folders: Vec<PathBuf>,
    setup_path: Option<PathBuf>,
    tasks: Vec<CompileTask>,
    /// Placeholders emitted so far, per (parent document, mount id).
    mounts: HashMap<(String, String), usize>,
}

impl DefaultExampleGenerator {
    /// Create a generator searching `folders` for imported examples.
    #[must_use]
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self {
            folders,
            setup_path: None,
            tasks: Vec::new(),
            mounts: HashMap::new(),
        }
    }

    /// Mount Vue examples through the `setup` export of this module.
    #[must_use]
    pub fn with_setup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.setup_path = Some(path.into());
        self
    }

    /// Take the compile tasks accumulated so far.
    pub fn take_tasks(&mut self) -> Vec<CompileTask> {
        std::mem::take(&mut self.tasks)
    }

    /// Generate one example without recording its compile task.
    pub fn generate_example(
        &self,
        request: &ExampleRequest<'_>,
    ) -> Result<ExampleResult, ExampleError> {
        match request.language {
            "import" => self.generate_import(request),
            "vue" => self.generate_vue(request),
            language => Ok(ExampleResult::inert(
                request.source,
                language,
                request.tags,
                RUNTIME_LANGUAGES.contains(&language),
            )),
        }
    }

    fn generate_import(&self, request: &ExampleRequest<'_>) -> Result<ExampleResult, ExampleError> {
        let parsed = parse_import(request.source)?;
        let path = resolve_import(&self.folders, &parsed.filename)?;
        let source = std::fs::read_to_string(&path).map_err(|source| ExampleError::Io {
            path: path.clone(),
            source,
        })?;
        let filename = path.to_string_lossy();

        let mut result = self.generate_example(&ExampleRequest {
            source: &source,
            language: &parsed.extension,
            filename: &filename,
            ..*request
        })?;
        result.comments = parsed.comments;
        Ok(result)
    }

    fn generate_vue(&self, request: &ExampleRequest<'_>) -> Result<ExampleResult, ExampleError> {
        let slug = example_slug(request.filename);
        let fingerprint = fingerprint(request.source);
        let generated = generate_vue(&VueOptions {
            filename: request.filename,
            slug: &slug,
            fingerprint: &fingerprint,
            code: request.source,
            setup_path: self.setup_path.as_deref(),
        })?;

        debug!(
            filename = request.filename,
            output = %generated.output,
            parent = request.parent,
            "Generated Vue example"
        );

        Ok(ExampleResult {
            source: request.source.to_owned(),
            language: request.language.to_owned(),
            comments: Vec::new(),
            tags: request.tags.to_vec(),
            markup: generated.markup,
            output: Some(generated.output.clone()),
            runtime: true,
            task: Some(CompileTask {
                source_file: format!("{slug}-{fingerprint}.js"),
                output_file: generated.output,
                sourcecode: generated.sourcecode,
                parent: request.parent.to_owned(),
            }),
        })
    }
}

impl ExampleGenerator for DefaultExampleGenerator {
    fn generate(&mut self, request: &ExampleRequest<'_>) -> Result<ExampleResult, GenerateError> {
        let mut result = self.generate_example(request)?;
        if let Some(task) = &result.task {
            let mount_id = task.output_file.trim_end_matches(".js");
            let seen = self
                .mounts
                .entry((task.parent.clone(), mount_id.to_owned()))
                .or_default();
            if *seen > 0 {
                result.markup = mount_markup(mount_id, *seen);
            }
            *seen += 1;
            self.tasks.push(task.clone());
        }
        Ok(result)
    }
}

/// Slug of an example filename: the slugified file stem.
fn example_slug(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    match slugify(&stem) {
        slug if slug.is_empty() => "example".to_owned(),
        slug => slug,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn request<'a>(
        source: &'a str,
        language: &'a str,
        attrs: &'a BTreeMap<String, String>,
    ) -> ExampleRequest<'a> {
        ExampleRequest {
            source,
            language,
            filename: "docs/button-0.vue",
            tags: &[],
            attrs,
            parent: "components/button",
        }
    }

    #[test]
    fn test_vue_example_produces_task() {
        let attrs = BTreeMap::new();
        let mut generator = DefaultExampleGenerator::new(Vec::new());
        let result = generator
            .generate(&request("<template>Hi</template>\n", "vue", &attrs))
            .unwrap();

        let fp = fingerprint("<template>Hi</template>");
        assert!(result.runtime);
        assert_eq!(result.output, Some(format!("example-{fp}.js")));
        let task = result.task.unwrap();
        assert_eq!(task.source_file, format!("button-0-{fp}.js"));
        assert_eq!(task.output_file, format!("example-{fp}.js"));
        assert_eq!(task.parent, "components/button");
        assert_eq!(generator.take_tasks().len(), 1);
        assert!(generator.take_tasks().is_empty());
    }

    #[test]
    fn test_repeated_vue_example_gets_unique_placeholders() {
        let attrs = BTreeMap::new();
        let mut generator = DefaultExampleGenerator::new(Vec::new());
        let source = "<template>Hi</template>\n";
        let fp = fingerprint(source);

        let first = generator.generate(&request(source, "vue", &attrs)).unwrap();
        let second = generator.generate(&request(source, "vue", &attrs)).unwrap();
        let other_page = generator
            .generate(&ExampleRequest {
                parent: "components/link",
                ..request(source, "vue", &attrs)
            })
            .unwrap();

        assert_eq!(
            first.markup,
            format!(r#"<div id="example-{fp}" data-example="example-{fp}"></div>"#)
        );
        assert_eq!(
            second.markup,
            format!(r#"<div id="example-{fp}-1" data-example="example-{fp}"></div>"#)
        );
        assert_eq!(other_page.markup, first.markup);
        assert_eq!(first.output, second.output);
        assert_eq!(generator.take_tasks().len(), 3);
    }

    #[test]
    fn test_html_is_static_runtime() {
        let attrs = BTreeMap::new();
        let mut generator = DefaultExampleGenerator::default();
        let result = generator
            .generate(&request("<p>Hi</p>", "html", &attrs))
            .unwrap();
        assert!(result.runtime);
        assert_eq!(result.markup, "<p>Hi</p>");
        assert_eq!(result.output, None);
        assert!(result.task.is_none());
        assert!(generator.take_tasks().is_empty());
    }

    #[test]
    fn test_unknown_language_is_inert() {
        let attrs = BTreeMap::new();
        let mut generator = DefaultExampleGenerator::default();
        let result = generator
            .generate(&request("print(1)", "python", &attrs))
            .unwrap();
        assert!(!result.runtime);
        assert_eq!(result.output, None);
        assert!(result.task.is_none());
    }

    #[test]
    fn test_import_resolves_concrete_language() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Alert.html"), "<div role=\"alert\"></div>").unwrap();

        let attrs = BTreeMap::new();
        let mut generator = DefaultExampleGenerator::new(vec![dir.path().to_path_buf()]);
        let result = generator
            .generate(&request("// An alert\nAlert.html", "import", &attrs))
            .unwrap();
        assert_eq!(result.language, "html");
        assert_eq!(result.source, "<div role=\"alert\"></div>");
        assert_eq!(result.comments, vec!["An alert"]);
        assert!(result.runtime);
    }

    #[test]
    fn test_import_vue_uses_file_slug() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("FCard.vue"), "<template>Card</template>").unwrap();

        let attrs = BTreeMap::new();
        let generator = DefaultExampleGenerator::new(vec![dir.path().to_path_buf()]);
        let result = generator
            .generate_example(&request("FCard.vue", "import", &attrs))
            .unwrap();
        assert!(result.task.unwrap().source_file.starts_with("fcard-"));
    }

    #[test]
    fn test_import_missing_example() {
        let attrs = BTreeMap::new();
        let generator = DefaultExampleGenerator::new(vec![PathBuf::from("/nonexistent")]);
        let err = generator
            .generate_example(&request("Missing.vue", "import", &attrs))
            .unwrap_err();
        assert!(matches!(err, ExampleError::NoSuchExample { .. }));
    }

    #[test]
    fn test_example_slug() {
        assert_eq!(example_slug("docs/components/FButton.vue"), "fbutton");
        assert_eq!(example_slug("guide-3.vue"), "guide-3");
        assert_eq!(example_slug(".vue"), "vue");
    }
}
