//! Manifest of generated pages.

use std::path::{Path, PathBuf};

use docgen_renderer::Document;
use tracing::info;

use crate::context::ProcessorContext;
use crate::error::PipelineError;
use crate::processor::{Processor, RENDER};

const MARKDOWN_HEADING: &str = "## Documentation manifest";
const MARKDOWN_NOTICE: &str =
    "> Do not edit this file. It is a automatically generated by `@forsakringskassan/docs-generator`.";

/// Sorted output paths of every document that produces a file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Manifest {
    paths: Vec<String>,
}

impl Manifest {
    /// Collect output paths, skipping documents without output.
    pub fn from_documents(docs: &[Document]) -> Self {
        let mut paths: Vec<String> = docs
            .iter()
            .filter_map(|doc| doc.file_info.output_path())
            .collect();
        paths.sort();
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Fenced listing under a fixed heading.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![MARKDOWN_HEADING, "", MARKDOWN_NOTICE, "", "```"];
        lines.extend(self.paths.iter().map(String::as_str));
        lines.extend(["```", ""]);
        lines.join("\n")
    }

    /// Array of paths, indented with two spaces.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.paths)
    }
}

/// Writes the manifest as Markdown and/or JSON once rendering is done.
#[derive(Clone, Debug, Default)]
pub struct ManifestProcessor {
    markdown: Option<PathBuf>,
    json: Option<PathBuf>,
}

impl ManifestProcessor {
    pub fn new(markdown: Option<PathBuf>, json: Option<PathBuf>) -> Self {
        Self { markdown, json }
    }

    /// Write `manifest` to the configured destinations.
    pub fn write(&self, manifest: &Manifest) -> Result<(), PipelineError> {
        if let Some(path) = &self.markdown {
            write_file(path, &manifest.to_markdown())?;
        }
        if let Some(path) = &self.json {
            write_file(path, &manifest.to_json()?)?;
        }
        info!(pages = manifest.paths().len(), "Wrote manifest");
        Ok(())
    }
}

impl Processor for ManifestProcessor {
    fn name(&self) -> &str {
        "manifestProcessor"
    }

    fn after(&self) -> Option<&str> {
        Some(RENDER)
    }

    fn handle(&self, ctx: &mut ProcessorContext) -> Result<(), PipelineError> {
        self.write(&ctx.manifest)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), PipelineError> {
    let io_error = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, content).map_err(io_error)
}
