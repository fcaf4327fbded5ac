//! Page template resolution and rendering.
//!
//! Templates are looked up by name in the configured folders, then among
//! the built-in templates. Resolved templates are cached for the lifetime
//! of the loader. Pages render through `minijinja`; `{% extends %}` and
//! `{% include %}` go through the same lookup.

use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use docgen_renderer::escape_html;
use minijinja::{AutoEscape, Environment, ErrorKind};
use serde::Serialize;
use tracing::debug;

/// Folder name reported for built-in templates.
const BUILTIN_FOLDER: &str = "<builtin>";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("default.html", include_str!("../templates/default.html")),
    (
        "content-with-menu.html",
        include_str!("../templates/content-with-menu.html"),
    ),
];

/// Error resolving or rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error(
        "Failed to resolve template \"{name}\", searched in:\n\n{}\n\nMake sure the name is correct and the template file exists in one of the listed directories.",
        format_searched(.searched)
    )]
    NotFound { name: String, searched: Vec<PathBuf> },

    #[error("failed to read template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template \"{name}\": {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|folder| format!("  - \"{}\"", folder.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A template's source and where it was found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub content: String,
    pub path: PathBuf,
}

/// Finds templates by name and caches them.
#[derive(Debug, Default)]
pub struct TemplateLoader {
    folders: Vec<PathBuf>,
    cache: Mutex<HashMap<String, ResolvedTemplate>>,
}

impl TemplateLoader {
    /// Search `folders` in order, then the built-in templates.
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self {
            folders,
            cache: Mutex::default(),
        }
    }

    /// Resolve a template by name. Names without extension get `.html`.
    pub fn resolve(&self, name: &str) -> Result<ResolvedTemplate, TemplateError> {
        let file = template_file(name);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(&file) {
            return Ok(cached.clone());
        }

        let resolved = self.find(name, &file)?;
        debug!(name, path = %resolved.path.display(), "Resolved template");
        cache.insert(file, resolved.clone());
        Ok(resolved)
    }

    fn find(&self, name: &str, file: &str) -> Result<ResolvedTemplate, TemplateError> {
        if let Some(path) = self
            .folders
            .iter()
            .map(|folder| folder.join(file))
            .find(|path| path.is_file())
        {
            let content = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?;
            return Ok(ResolvedTemplate { content, path });
        }

        if let Some((_, content)) = BUILTIN_TEMPLATES.iter().find(|(builtin, _)| *builtin == file) {
            return Ok(ResolvedTemplate {
                content: (*content).to_owned(),
                path: Path::new(BUILTIN_FOLDER).join(file),
            });
        }

        let mut searched = self.folders.clone();
        searched.push(PathBuf::from(BUILTIN_FOLDER));
        Err(TemplateError::NotFound {
            name: name.to_owned(),
            searched,
        })
    }
}

fn template_file(name: &str) -> String {
    if Path::new(name).extension().is_some() {
        name.to_owned()
    } else {
        format!("{name}.html")
    }
}

/// Renders pages with templates from a [`TemplateLoader`].
pub struct PageTemplates {
    env: Environment<'static>,
    loader: Arc<TemplateLoader>,
}

impl PageTemplates {
    pub fn new(loader: TemplateLoader) -> Self {
        let loader = Arc::new(loader);
        let source = Arc::clone(&loader);
        let mut env = Environment::new();
        env.set_loader(move |name| match source.resolve(name) {
            Ok(template) => Ok(Some(template.content)),
            Err(TemplateError::NotFound { .. }) => Ok(None),
            Err(e) => Err(minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string())),
        });
        // Keep `/` readable in hrefs; the default HTML formatter escapes it.
        env.set_formatter(|out, state, value| {
            if matches!(state.auto_escape(), AutoEscape::Html)
                && !value.is_safe()
                && let Some(text) = value.as_str()
            {
                return out.write_str(&escape_html(text)).map_err(|_| {
                    minijinja::Error::new(ErrorKind::WriteFailure, "failed to write output")
                });
            }
            minijinja::escape_formatter(out, state, value)
        });
        Self { env, loader }
    }

    /// Render template `name` with `context`.
    pub fn render(&self, name: &str, context: impl Serialize) -> Result<String, TemplateError> {
        let file = template_file(name);
        self.loader.resolve(&file)?;
        let render_error = |source| TemplateError::Render {
            name: name.to_owned(),
            source,
        };
        let template = self.env.get_template(&file).map_err(render_error)?;
        template.render(context).map_err(render_error)
    }
}
