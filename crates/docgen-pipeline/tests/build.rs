//! End-to-end builds through reader, renderer, example generation and
//! the example compiler.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use docgen_bundler::{CompileStatus, CompilerBoundary};
use docgen_config::Config;
use docgen_examples::{ExampleBatch, fingerprint};
use docgen_pipeline::{Generator, PipelineError, SourceSet};
use pretty_assertions::assert_eq;

#[derive(Clone, Default)]
struct CapturingCompiler {
    batches: Rc<RefCell<Vec<ExampleBatch>>>,
}

impl CompilerBoundary for CapturingCompiler {
    fn compile(&self, batch: &ExampleBatch) -> CompileStatus {
        self.batches.borrow_mut().push(batch.clone());
        CompileStatus::Success {
            bundles: batch.tasks.len(),
        }
    }
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn project(files: &[(&str, &str)]) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default_with_base(dir.path());
    for (name, content) in files {
        write(&config.build_resolved.source_dir.join(name), content);
    }
    (dir, config)
}

#[test]
fn test_vue_example_end_to_end() {
    let (_dir, config) = project(&[(
        "index.md",
        "# Title\n\n```vue\n<template>Hi</template>\n```\n",
    )]);
    let sources = [SourceSet::markdown(&config.build_resolved.source_dir)];
    let output_dir = config.build_resolved.output_dir.clone();
    let compiler = CapturingCompiler::default();

    let report = Generator::new(config)
        .with_compiler(compiler.clone())
        .build(&sources)
        .unwrap();

    let fp = fingerprint("<template>Hi</template>");
    let html = std::fs::read_to_string(output_dir.join("index.html")).unwrap();
    assert!(html.contains("<h1 id=\"title\">Title</h1>"));
    assert!(html.contains(&format!(
        "<div id=\"example-{fp}\" data-example=\"example-{fp}\"></div>"
    )));
    assert!(html.contains(&format!("<script src=\"examples/example-{fp}.js\"></script>")));

    let batches = compiler.batches.borrow();
    assert_eq!(batches.len(), 1);
    let tasks = &batches[0].tasks;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].output_file, format!("example-{fp}.js"));
    assert_eq!(tasks[0].parent, "index");
    assert_eq!(batches[0].external, vec!["vue".to_owned()]);
    assert_eq!(report.compile, CompileStatus::Success { bundles: 1 });
}

#[test]
fn test_identical_examples_compile_once() {
    let example = "```vue\n<template><p>Same</p></template>\n```\n";
    let (_dir, config) = project(&[
        ("a.md", &format!("# A\n\n{example}")),
        ("b.md", &format!("# B\n\n{example}\n{example}")),
    ]);
    let sources = [SourceSet::markdown(&config.build_resolved.source_dir)];
    let output_dir = config.build_resolved.output_dir.clone();
    let compiler = CapturingCompiler::default();

    let report = Generator::new(config)
        .with_compiler(compiler.clone())
        .build(&sources)
        .unwrap();

    let batches = compiler.batches.borrow();
    assert_eq!(batches[0].tasks.len(), 1);
    assert_eq!(report.duplicate_tasks, 2);

    let fp = fingerprint("<template><p>Same</p></template>");
    let b = std::fs::read_to_string(output_dir.join("b/index.html")).unwrap();
    assert!(b.contains(&format!("id=\"example-{fp}\" data-example")));
    assert!(b.contains(&format!("id=\"example-{fp}-1\" data-example")));
    assert_eq!(b.matches("<script src=").count(), 1);
}

#[test]
fn test_in_process_compiler_writes_bundle() {
    let (dir, config) = project(&[("index.md", "```vue\n<template><b>Live</b></template>\n```\n")]);
    let sources = [SourceSet::markdown(&config.build_resolved.source_dir)];
    let output_dir = config.build_resolved.output_dir.clone();

    let report = Generator::new(config)
        .with_root(dir.path())
        .build(&sources)
        .unwrap();

    assert_eq!(report.compile, CompileStatus::Success { bundles: 1 });
    let fp = fingerprint("<template><b>Live</b></template>");
    let bundle =
        std::fs::read_to_string(output_dir.join(format!("examples/example-{fp}.js"))).unwrap();
    assert!(bundle.starts_with("(function () {"));
    assert!(bundle.contains("require(\"vue\")"));
    assert!(bundle.contains(&format!(r#"querySelectorAll("[data-example=\"example-{fp}\"]")"#)));
}

#[test]
fn test_failed_compile_still_publishes_pages() {
    let (dir, mut config) = project(&[("index.md", "```vue\n<template>x</template>\n```\n")]);
    config.examples_resolved.external.clear();
    let sources = [SourceSet::markdown(&config.build_resolved.source_dir)];
    let output_dir = config.build_resolved.output_dir.clone();

    let report = Generator::new(config)
        .with_root(dir.path())
        .build(&sources)
        .unwrap();

    assert!(report.compile.is_failed());
    assert!(output_dir.join("index.html").is_file());
    assert!(!output_dir.join("examples").exists());
}

#[test]
fn test_unknown_language_is_static() {
    let (_dir, config) = project(&[("index.md", "```python\nprint(1)\n```\n")]);
    let sources = [SourceSet::markdown(&config.build_resolved.source_dir)];
    let output_dir = config.build_resolved.output_dir.clone();
    let compiler = CapturingCompiler::default();

    Generator::new(config)
        .with_compiler(compiler.clone())
        .build(&sources)
        .unwrap();

    assert!(compiler.batches.borrow()[0].tasks.is_empty());
    let html = std::fs::read_to_string(output_dir.join("index.html")).unwrap();
    assert!(html.contains("print(1)"));
    assert!(!html.contains("<script src="));
}

#[test]
fn test_missing_import_example_is_fatal() {
    let (_dir, config) = project(&[("index.md", "```import\nMissing.vue\n```\n")]);
    let sources = [SourceSet::markdown(&config.build_resolved.source_dir)];

    let err = Generator::new(config)
        .with_compiler(CapturingCompiler::default())
        .build(&sources)
        .unwrap_err();

    assert!(matches!(err, PipelineError::Render { .. }));
    assert!(err.to_string().contains("Missing.vue"));
}

#[test]
fn test_circular_container_inclusion_fails() {
    let (_dir, config) = project(&[("index.md", "::: info src=index\n:::\n")]);
    let sources = [SourceSet::markdown(&config.build_resolved.source_dir)];

    let err = Generator::new(config)
        .with_compiler(CapturingCompiler::default())
        .build(&sources)
        .unwrap_err();

    assert!(err.to_string().contains("circular inclusion"));
}

#[test]
fn test_manifest_sorted_markdown_and_json() {
    let (dir, mut config) = project(&[("a.md", "a"), ("c.md", "c"), ("b.md", "b")]);
    let markdown = dir.path().join("docs/manifest.md");
    let json = dir.path().join("docs/manifest.json");
    config.manifest_resolved.markdown = Some(markdown.clone());
    config.manifest_resolved.json = Some(json.clone());
    let sources = [
        SourceSet::markdown(&config.build_resolved.source_dir).with_transform(|doc| {
            doc.file_info.path = String::new();
            doc.file_info.output_name = Some(format!("/{}", doc.name));
        }),
    ];

    let manifest = Generator::new(config).write_manifest(&sources).unwrap();

    assert_eq!(manifest.paths(), ["/a", "/b", "/c"]);
    assert_eq!(
        std::fs::read_to_string(json).unwrap(),
        "[\n  \"/a\",\n  \"/b\",\n  \"/c\"\n]"
    );
    let markdown = std::fs::read_to_string(markdown).unwrap();
    assert!(markdown.starts_with("## Documentation manifest\n"));
    assert!(markdown.contains("```\n/a\n/b\n/c\n```\n"));
}
