//! Shared state handed to processors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use docgen_renderer::{Document, TocEntry};
use serde::Serialize;

use crate::manifest::Manifest;

/// Static files to copy into the output, keyed by destination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceRegistry {
    entries: BTreeMap<String, PathBuf>,
}

impl ResourceRegistry {
    /// Register `src` to be copied to `dst` (relative to the output folder).
    ///
    /// A later registration for the same destination replaces the earlier one.
    pub fn add(&mut self, dst: impl Into<String>, src: impl Into<PathBuf>) {
        self.entries.insert(dst.into(), src.into());
    }

    pub fn get(&self, dst: &str) -> Option<&Path> {
        self.entries.get(dst).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(dst, src)| (dst.as_str(), src.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generated file written into the output folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    /// Path relative to the output folder.
    pub path: String,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Markdown rendering result for one document.
#[derive(Clone, Debug, Serialize)]
pub struct RenderedDocument {
    pub id: String,
    /// Output path relative to the output folder.
    pub output_path: String,
    pub title: String,
    /// Page content, without the surrounding template.
    pub content: String,
    pub toc: Vec<TocEntry>,
    /// Example bundles the page loads, relative to the output folder.
    pub scripts: Vec<String>,
}

/// Everything a processor may read or change.
///
/// Only one processor holds the context at a time.
#[derive(Debug)]
pub struct ProcessorContext {
    pub docs: Vec<Document>,
    /// Sorted output paths; filled once rendering has finished.
    pub manifest: Manifest,
    pub resources: ResourceRegistry,
    pub assets: Vec<Asset>,
    /// Variables exposed to page templates as `vars`.
    pub template_vars: serde_json::Map<String, serde_json::Value>,
    /// Rendered pages in document order; empty before rendering.
    pub rendered: Vec<RenderedDocument>,
    /// Final destination of the site.
    pub output_dir: PathBuf,
    /// Directory the site is assembled in before publishing.
    pub staging_dir: PathBuf,
}

impl ProcessorContext {
    pub fn new(docs: Vec<Document>, output_dir: PathBuf, staging_dir: PathBuf) -> Self {
        Self {
            docs,
            manifest: Manifest::default(),
            resources: ResourceRegistry::default(),
            assets: Vec::new(),
            template_vars: serde_json::Map::new(),
            rendered: Vec::new(),
            output_dir,
            staging_dir,
        }
    }

    /// Find a document by id.
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.docs.iter().find(|doc| doc.id == id)
    }

    /// Add a generated file, replacing any earlier one at the same path.
    pub fn add_asset(&mut self, asset: Asset) {
        self.assets.retain(|existing| existing.path != asset.path);
        self.assets.push(asset);
    }
}
