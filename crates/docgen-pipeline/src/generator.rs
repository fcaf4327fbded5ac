//! Site generation orchestrator.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use docgen_bundler::{CompileStatus, CompilerBoundary, IifeBundler, InProcessCompiler};
use docgen_config::Config;
use docgen_examples::{BatchBuilder, DefaultExampleGenerator, ExampleBatch};
use docgen_renderer::{Document, MarkdownRenderer, SoftError, relative_path};
use serde_json::json;
use tracing::{info, warn};

use crate::context::{ProcessorContext, RenderedDocument};
use crate::error::PipelineError;
use crate::manifest::{Manifest, ManifestProcessor};
use crate::processor::Processor;
use crate::reader::SourceSet;
use crate::scheduler::{Scheduler, Stage};
use crate::template::{PageTemplates, TemplateLoader};

/// Folder, inside the output, that example bundles are written to.
pub const EXAMPLES_DIR: &str = "examples";

type SoftErrorCallback = Box<dyn Fn(SoftError) -> Result<String, SoftError>>;

/// Summary of a finished build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildReport {
    /// Pages written.
    pub pages: usize,
    /// Static resources copied.
    pub resources: usize,
    /// Generated files written by processors.
    pub assets: usize,
    /// Compile tasks dropped because an identical example was already queued.
    pub duplicate_tasks: usize,
    /// Outcome of compiling the example batch.
    pub compile: CompileStatus,
    /// Where the site was published.
    pub output_dir: PathBuf,
}

/// A page ready to be written.
struct PageOutput {
    path: String,
    html: String,
}

/// Builds a documentation site from source sets.
///
/// A build reads every document, runs the processors in their resolved
/// order around the render stage, writes the result into a staging
/// directory and compiles the collected examples. Only then is the staging
/// directory moved to the output directory; a fatal error removes it and
/// leaves the previous output in place.
pub struct Generator {
    config: Config,
    root: PathBuf,
    processors: Vec<Box<dyn Processor>>,
    compiler: Option<Box<dyn CompilerBoundary>>,
    soft_error_handler: Option<SoftErrorCallback>,
}

impl Generator {
    /// Create a generator. Manifest output is registered when configured.
    pub fn new(config: Config) -> Self {
        let root = config
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();

        let mut generator = Self {
            config,
            root,
            processors: Vec::new(),
            compiler: None,
            soft_error_handler: None,
        };
        let manifest = &generator.config.manifest_resolved;
        if manifest.is_enabled() {
            let processor = ManifestProcessor::new(manifest.markdown.clone(), manifest.json.clone());
            generator.processors.push(Box::new(processor));
        }
        generator
    }

    /// Directory example modules resolve local imports against.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Register a processor. Registration order breaks scheduling ties.
    #[must_use]
    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Compile examples with `compiler` instead of the in-process bundler.
    #[must_use]
    pub fn with_compiler(mut self, compiler: impl CompilerBoundary + 'static) -> Self {
        self.compiler = Some(Box::new(compiler));
        self
    }

    /// Recover from soft errors with `handler`; by default they are fatal.
    #[must_use]
    pub fn with_soft_error_handler(
        mut self,
        handler: impl Fn(SoftError) -> Result<String, SoftError> + 'static,
    ) -> Self {
        self.soft_error_handler = Some(Box::new(handler));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read documents from every source set, in order.
    ///
    /// Ids must be unique, and so must the output paths of rendered
    /// documents.
    pub fn read_documents(&self, sources: &[SourceSet]) -> Result<Vec<Document>, PipelineError> {
        let mut docs = Vec::new();
        let mut ids = HashSet::new();
        let mut outputs: HashMap<String, String> = HashMap::new();
        for source in sources {
            for doc in source.read()? {
                if !ids.insert(doc.id.clone()) {
                    return Err(PipelineError::DuplicateDocument(doc.id));
                }
                if let Some(path) = doc.file_info.output_path() {
                    if let Some(first) = outputs.get(&path) {
                        return Err(PipelineError::DuplicateOutput {
                            path,
                            first: first.clone(),
                            second: doc.id,
                        });
                    }
                    outputs.insert(path, doc.id.clone());
                }
                docs.push(doc);
            }
        }
        info!(count = docs.len(), "Read documents");
        Ok(docs)
    }

    /// Write the manifest for `sources` without building the site.
    pub fn write_manifest(&self, sources: &[SourceSet]) -> Result<Manifest, PipelineError> {
        let docs = self.read_documents(sources)?;
        let manifest = Manifest::from_documents(&docs);
        let config = &self.config.manifest_resolved;
        ManifestProcessor::new(config.markdown.clone(), config.json.clone()).write(&manifest)?;
        Ok(manifest)
    }

    /// Build and publish the site.
    pub fn build(&self, sources: &[SourceSet]) -> Result<BuildReport, PipelineError> {
        let docs = self.read_documents(sources)?;
        let schedule = Scheduler::resolve(&self.processors)?;

        let staging = self.config.build_resolved.staging_dir();
        reset_dir(&staging)?;

        let report = match self.run(docs, &schedule, &staging) {
            Ok(report) => report,
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_dir_all(&staging) {
                    warn!(error = %cleanup, path = %staging.display(), "Failed to remove staging directory");
                }
                return Err(e);
            }
        };

        publish(&staging, &report.output_dir)?;
        info!(
            pages = report.pages,
            output = %report.output_dir.display(),
            "Published site"
        );
        Ok(report)
    }

    fn run(
        &self,
        docs: Vec<Document>,
        schedule: &[Stage],
        staging: &Path,
    ) -> Result<BuildReport, PipelineError> {
        let build = &self.config.build_resolved;
        let examples = &self.config.examples_resolved;

        let mut ctx = ProcessorContext::new(docs, build.output_dir.clone(), staging.to_path_buf());
        let mut generator = DefaultExampleGenerator::new(examples.folders.clone());
        if let Some(setup_path) = &examples.setup_path {
            generator = generator.with_setup_path(setup_path);
        }
        let templates = PageTemplates::new(TemplateLoader::new(build.template_dirs.clone()));
        let mut batch = BatchBuilder::new();
        let mut pages = Vec::new();

        for stage in schedule {
            match *stage {
                Stage::Processor(index) => {
                    let processor = &self.processors[index];
                    info!(processor = processor.name(), "Running processor");
                    processor.handle(&mut ctx)?;
                }
                Stage::Render => {
                    pages = self.render_documents(&mut ctx, &mut generator, &templates)?;
                    for task in generator.take_tasks() {
                        batch.push(task);
                    }
                    ctx.manifest = Manifest::from_documents(&ctx.docs);
                }
            }
        }

        let written = write_output(&ctx, &pages, staging)?;
        let duplicate_tasks = batch.duplicates();
        let batch = batch.build(staging.join(EXAMPLES_DIR), examples.external.clone());
        let compile = self.compile(&batch);

        Ok(BuildReport {
            pages: written,
            resources: ctx.resources.len(),
            assets: ctx.assets.len(),
            duplicate_tasks,
            compile,
            output_dir: build.output_dir.clone(),
        })
    }

    fn render_documents(
        &self,
        ctx: &mut ProcessorContext,
        generator: &mut DefaultExampleGenerator,
        templates: &PageTemplates,
    ) -> Result<Vec<PageOutput>, PipelineError> {
        let ProcessorContext {
            docs,
            resources,
            template_vars,
            rendered,
            ..
        } = ctx;
        let docs: &[Document] = docs;
        let site = &self.config.site;
        let mut pages = Vec::new();

        for doc in docs {
            let Some(output_path) = doc.file_info.output_path() else {
                continue;
            };

            let mut renderer = MarkdownRenderer::new(docs).with_example_generator(&mut *generator);
            if let Some(handler) = &self.soft_error_handler {
                renderer = renderer.with_soft_error_handler(|e| handler(e));
            }
            let page = renderer.render(doc).map_err(|source| PipelineError::Render {
                document: doc.id.clone(),
                source,
            })?;

            for resource in &page.resources {
                resources.add(resource.dst.clone(), resource.src.clone());
            }

            let mut scripts: Vec<String> = Vec::new();
            for output in page.examples.iter().filter_map(|e| e.output.as_deref()) {
                let script = format!("{EXAMPLES_DIR}/{output}");
                if !scripts.contains(&script) {
                    scripts.push(script);
                }
            }

            let title = doc
                .attributes
                .title()
                .or(page.title.as_deref())
                .unwrap_or(&doc.name)
                .to_owned();
            let script_hrefs: Vec<String> = scripts
                .iter()
                .map(|script| relative_path(&output_path, script))
                .collect();

            let html = templates.render(
                &doc.template,
                json!({
                    "site": { "name": site.name, "lang": site.lang },
                    "doc": {
                        "id": doc.id,
                        "name": doc.name,
                        "title": title,
                        "attributes": doc.attributes,
                        "output_path": output_path,
                    },
                    "content": page.html,
                    "toc": page.toc,
                    "scripts": script_hrefs,
                    "vars": template_vars,
                    "root": relative_path(&output_path, ""),
                }),
            )?;
            info!(document = %doc.id, path = %output_path, "Rendered page");

            rendered.push(RenderedDocument {
                id: doc.id.clone(),
                output_path: output_path.clone(),
                title,
                content: page.html,
                toc: page.toc,
                scripts,
            });
            pages.push(PageOutput {
                path: output_path,
                html,
            });
        }

        Ok(pages)
    }

    fn compile(&self, batch: &ExampleBatch) -> CompileStatus {
        info!(tasks = batch.tasks.len(), "Compiling examples");
        if let Some(compiler) = &self.compiler {
            return compiler.compile(batch);
        }
        let bundler = IifeBundler::new(&self.root).with_icon_lib(&self.config.examples_resolved.icon_lib);
        InProcessCompiler::new(bundler).compile(batch)
    }
}

/// Write pages, resources and assets into `staging`. Returns the page count.
fn write_output(
    ctx: &ProcessorContext,
    pages: &[PageOutput],
    staging: &Path,
) -> Result<usize, PipelineError> {
    for page in pages {
        write_file(&staging.join(&page.path), page.html.as_bytes())?;
    }
    for (dst, src) in ctx.resources.iter() {
        let target = staging.join(dst);
        create_parent(&target)?;
        std::fs::copy(src, &target).map_err(|source| PipelineError::Io {
            path: src.to_path_buf(),
            source,
        })?;
    }
    for asset in &ctx.assets {
        write_file(&staging.join(&asset.path), &asset.contents)?;
    }
    Ok(pages.len())
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create_parent(path: &Path) -> Result<(), PipelineError> {
    match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent).map_err(io_error(parent)),
        None => Ok(()),
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    create_parent(path)?;
    std::fs::write(path, contents).map_err(io_error(path))
}

/// Remove `dir` if present and create it empty.
fn reset_dir(dir: &Path) -> Result<(), PipelineError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(io_error(dir))?;
    }
    std::fs::create_dir_all(dir).map_err(io_error(dir))
}

/// Replace `output` with the contents of `staging`.
fn publish(staging: &Path, output: &Path) -> Result<(), PipelineError> {
    if output.exists() {
        std::fs::remove_dir_all(output).map_err(io_error(output))?;
    }
    create_parent(output)?;
    if std::fs::rename(staging, output).is_ok() {
        return Ok(());
    }
    // Staging and output may live on different filesystems.
    copy_dir(staging, output)?;
    std::fs::remove_dir_all(staging).map_err(io_error(staging))
}

fn copy_dir(from: &Path, to: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(to).map_err(io_error(to))?;
    for entry in std::fs::read_dir(from).map_err(io_error(from))? {
        let path = entry.map_err(io_error(from))?.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        let target = to.join(name);
        if path.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            std::fs::copy(&path, &target).map_err(io_error(&path))?;
        }
    }
    Ok(())
}
