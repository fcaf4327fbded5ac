//! Reading source files into documents.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use docgen_config::BuildConfig;
use docgen_renderer::{Attributes, Document, FileInfo};
use glob::Pattern;
use serde_yaml::Value;
use tracing::debug;

/// Template used when front matter does not name one.
pub const DEFAULT_TEMPLATE: &str = "default";

const OUTPUT_NAME: &str = "index.html";

/// Error reading a source file.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front matter in {}: {source}", path.display())]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{} is not inside {}", path.display(), base.display())]
    OutsideBase { path: PathBuf, base: PathBuf },

    #[error("invalid glob pattern \"{pattern}\": {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Turns one file into documents.
pub trait FileReader {
    /// Read `path`, whose logical location is relative to `base`.
    fn read(&self, path: &Path, base: &Path) -> Result<Vec<Document>, ReadError>;
}

/// Markdown with optional YAML front matter between `---` lines.
///
/// - `id` is the path relative to the base without extension;
/// - every document gets its own folder with an `index.html`, except
///   `index.md` and `README.md` which render into their folder;
/// - `template` selects the page template, `render: false` suppresses
///   output;
/// - the title defaults to the first `# ` heading, then the file stem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrontMatterReader;

impl FileReader for FrontMatterReader {
    fn read(&self, path: &Path, base: &Path) -> Result<Vec<Document>, ReadError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = path
            .strip_prefix(base)
            .map_err(|_| ReadError::OutsideBase {
                path: path.to_path_buf(),
                base: base.to_path_buf(),
            })?;

        let (front_matter, body) = split_front_matter(&content);
        let values = parse_front_matter(front_matter.unwrap_or_default())
            .map_err(|source| ReadError::FrontMatter {
                path: path.to_path_buf(),
                source,
            })?;

        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = relative
            .parent()
            .map(slash_path)
            .unwrap_or_default();
        let id = if parent.is_empty() {
            stem.clone()
        } else {
            format!("{parent}/{stem}")
        };
        let folder = if stem == "index" || stem.eq_ignore_ascii_case("readme") {
            parent
        } else {
            id.clone()
        };

        let mut attributes = Attributes::new();
        let mut template = DEFAULT_TEMPLATE.to_owned();
        let mut render = true;
        for (key, value) in values {
            match (key.as_str(), value) {
                ("render", Value::Bool(flag)) => render = flag,
                ("template", Value::String(name)) => template = name,
                (_, Value::Null) => {}
                (name, value) => {
                    let text = scalar_to_string(value).map_err(|source| ReadError::FrontMatter {
                        path: path.to_path_buf(),
                        source,
                    })?;
                    attributes.set(name, text);
                }
            }
        }
        if attributes.title().is_none() {
            let title = first_heading(body).unwrap_or(&stem).to_owned();
            attributes.set("title", title);
        }

        let doc = Document {
            id,
            name: stem.clone(),
            file_info: FileInfo {
                full_path: path.to_path_buf(),
                path: if folder.is_empty() {
                    ".".to_owned()
                } else {
                    format!("./{folder}")
                },
                name: stem,
                output_name: render.then(|| OUTPUT_NAME.to_owned()),
            },
            attributes,
            body: body.to_owned(),
            template,
        };
        debug!(id = %doc.id, path = %path.display(), "Read document");
        Ok(vec![doc])
    }
}

/// Split leading `---` delimited front matter from the body.
fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let Some(rest) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return (None, content);
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, content)
}

fn parse_front_matter(yaml: &str) -> Result<BTreeMap<String, Value>, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml::from_str(yaml)
}

fn scalar_to_string(value: Value) -> Result<String, serde_yaml::Error> {
    Ok(match value {
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)?.trim_end().to_owned(),
    })
}

fn first_heading(body: &str) -> Option<&str> {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|title| !title.is_empty())
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

type Transform = Box<dyn Fn(&mut Document)>;

/// A folder of source files read with one reader.
///
/// Include and exclude patterns match the path relative to the base,
/// e.g. `**/*.md` or `src/**`.
pub struct SourceSet {
    base: PathBuf,
    extension: String,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    reader: Box<dyn FileReader>,
    transform: Option<Transform>,
}

impl fmt::Debug for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSet")
            .field("base", &self.base)
            .field("extension", &self.extension)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

impl SourceSet {
    /// Files with `extension` under `base`, read with `reader`.
    pub fn new(base: impl Into<PathBuf>, extension: &str, reader: impl FileReader + 'static) -> Self {
        Self {
            base: base.into(),
            extension: extension.to_owned(),
            include: Vec::new(),
            exclude: Vec::new(),
            reader: Box::new(reader),
            transform: None,
        }
    }

    /// Markdown files under `base` with front matter.
    pub fn markdown(base: impl Into<PathBuf>) -> Self {
        Self::new(base, "md", FrontMatterReader)
    }

    /// Markdown documents of a build configuration, with its include and
    /// exclude patterns applied.
    pub fn from_config(build: &BuildConfig) -> Result<Self, ReadError> {
        Self::markdown(&build.source_dir)
            .with_include(build.include.as_slice())?
            .with_exclude(build.exclude.as_slice())
    }

    /// Only read files matching at least one of `patterns`.
    pub fn with_include(mut self, patterns: &[impl AsRef<str>]) -> Result<Self, ReadError> {
        self.include.extend(compile_patterns(patterns)?);
        Ok(self)
    }

    /// Skip files matching any of `patterns`.
    pub fn with_exclude(mut self, patterns: &[impl AsRef<str>]) -> Result<Self, ReadError> {
        self.exclude.extend(compile_patterns(patterns)?);
        Ok(self)
    }

    /// Adjust every document after reading.
    #[must_use]
    pub fn with_transform(mut self, transform: impl Fn(&mut Document) + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Matching files, sorted, skipping hidden entries.
    pub fn files(&self) -> Result<Vec<PathBuf>, ReadError> {
        let mut files = Vec::new();
        walk_dir(&self.base, &self.extension, &mut files)?;
        files.retain(|file| self.is_selected(file));
        files.sort();
        Ok(files)
    }

    fn is_selected(&self, file: &Path) -> bool {
        let relative = slash_path(file.strip_prefix(&self.base).unwrap_or(file));
        let included =
            self.include.is_empty() || self.include.iter().any(|p| p.matches(&relative));
        included && !self.exclude.iter().any(|p| p.matches(&relative))
    }

    /// Read every matching file.
    pub fn read(&self) -> Result<Vec<Document>, ReadError> {
        let mut docs = Vec::new();
        for file in self.files()? {
            for mut doc in self.reader.read(&file, &self.base)? {
                if let Some(transform) = &self.transform {
                    transform(&mut doc);
                }
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

fn compile_patterns(patterns: &[impl AsRef<str>]) -> Result<Vec<Pattern>, ReadError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Pattern::new(pattern).map_err(|source| ReadError::Pattern {
                pattern: pattern.to_owned(),
                source,
            })
        })
        .collect()
}

fn walk_dir(current: &Path, extension: &str, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let io_error = |source| ReadError::Io {
        path: current.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(current).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            walk_dir(&path, extension, files)?;
        } else if path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    Ok(())
}
