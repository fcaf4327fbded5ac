//! Configuration management for the documentation generator.
//!
//! Parses `docgen.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.name`
//! - `examples.icon_lib`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override document source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override icon library injected into example bundles.
    pub icon_lib: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docgen.toml";

/// Environment variable consulted for the default icon library.
pub const ICON_LIB_ENV: &str = "DOCS_ICON_LIB";

/// Icon library used when neither config nor environment names one.
pub const DEFAULT_ICON_LIB: &str = "@fkui/icon-lib-default";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site metadata.
    pub site: SiteConfig,
    /// Build configuration (paths are relative strings from TOML).
    build: BuildConfigRaw,
    /// Live example configuration (paths are relative strings from TOML).
    examples: ExamplesConfigRaw,
    /// Manifest destinations (paths are relative strings from TOML).
    manifest: ManifestConfigRaw,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Resolved example configuration (set after loading).
    #[serde(skip)]
    pub examples_resolved: ExamplesConfig,
    /// Resolved manifest configuration (set after loading).
    #[serde(skip)]
    pub manifest_resolved: ManifestConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site metadata shared with every page template.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name shown in page titles.
    pub name: String,
    /// Document language (`<html lang>`).
    pub lang: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Documentation".to_owned(),
            lang: "en".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
    cache_dir: Option<String>,
    template_dirs: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// Resolved build configuration with absolute paths.
#[derive(Debug, Default, Clone)]
pub struct BuildConfig {
    /// Directory containing markdown documents.
    pub source_dir: PathBuf,
    /// Directory the finished site is published to.
    pub output_dir: PathBuf,
    /// Working directory for staged output.
    pub cache_dir: PathBuf,
    /// Folders searched for page templates, in order.
    pub template_dirs: Vec<PathBuf>,
    /// Glob patterns, relative to `source_dir`, a document must match.
    /// Empty means every markdown file.
    pub include: Vec<String>,
    /// Glob patterns, relative to `source_dir`, of documents to skip.
    pub exclude: Vec<String>,
}

impl BuildConfig {
    /// Staging directory used while building (`<cache_dir>/staging`).
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.cache_dir.join("staging")
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ExamplesConfigRaw {
    folders: Option<Vec<String>>,
    setup_path: Option<String>,
    external: Option<Vec<String>>,
    icon_lib: Option<String>,
}

/// Resolved live example configuration.
#[derive(Debug, Clone)]
pub struct ExamplesConfig {
    /// Folders searched for `import` examples, first match wins.
    pub folders: Vec<PathBuf>,
    /// Module used to mount generated examples.
    pub setup_path: Option<PathBuf>,
    /// Modules provided at runtime and excluded from bundles.
    pub external: Vec<String>,
    /// Icon library injected as `process.env.DOCS_ICON_LIB`.
    pub icon_lib: String,
}

impl Default for ExamplesConfig {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            setup_path: None,
            external: vec!["vue".to_owned()],
            icon_lib: default_icon_lib(),
        }
    }
}

fn default_icon_lib() -> String {
    std::env::var(ICON_LIB_ENV).unwrap_or_else(|_| DEFAULT_ICON_LIB.to_owned())
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ManifestConfigRaw {
    markdown: Option<String>,
    json: Option<String>,
}

/// Resolved manifest destinations. A manifest is written only when set.
#[derive(Debug, Default, Clone)]
pub struct ManifestConfig {
    /// Destination of the Markdown manifest.
    pub markdown: Option<PathBuf>,
    /// Destination of the JSON manifest.
    pub json: Option<PathBuf>,
}

impl ManifestConfig {
    /// Whether any manifest destination is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.markdown.is_some() || self.json.is_some()
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.name`").
        field: String,
        /// Error message (e.g., "${`SITE_NAME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docgen.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.build_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.build_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(icon_lib) = &settings.icon_lib {
            self.examples_resolved.icon_lib.clone_from(icon_lib);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    #[must_use]
    pub fn default_with_base(base: &Path) -> Self {
        let mut config = Self {
            site: SiteConfig::default(),
            build: BuildConfigRaw::default(),
            examples: ExamplesConfigRaw::default(),
            manifest: ManifestConfigRaw::default(),
            build_resolved: BuildConfig::default(),
            examples_resolved: ExamplesConfig::default(),
            manifest_resolved: ManifestConfig::default(),
            config_path: None,
        };
        config.resolve_paths(base);
        config
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path.parent().unwrap_or(Path::new(".")))
            .map(|config| Self {
                config_path: Some(path.to_path_buf()),
                ..config
            })
    }

    /// Parse configuration from TOML text, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, environment expansion or validation fails.
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;
        config.resolve_paths(base);
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.site.name, "site.name")?;
        require_non_empty(&self.site.lang, "site.lang")?;
        require_non_empty(&self.examples_resolved.icon_lib, "examples.icon_lib")?;

        if let Some(module) = self
            .examples_resolved
            .external
            .iter()
            .find(|module| module.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "examples.external contains an empty module name: {module:?}"
            )));
        }

        if self.build_resolved.output_dir == self.build_resolved.source_dir {
            return Err(ConfigError::Validation(
                "build.output_dir must differ from build.source_dir".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.name = expand::expand_env(&self.site.name, "site.name")?;

        if let Some(ref icon_lib) = self.examples.icon_lib {
            self.examples.icon_lib = Some(expand::expand_env(icon_lib, "examples.icon_lib")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));
        let resolve_all = |paths: &Option<Vec<String>>, default: &[&str]| -> Vec<PathBuf> {
            match paths {
                Some(paths) => paths.iter().map(|p| config_dir.join(p)).collect(),
                None => default.iter().map(|p| config_dir.join(p)).collect(),
            }
        };

        self.build_resolved = BuildConfig {
            source_dir: resolve(self.build.source_dir.as_deref(), "docs"),
            output_dir: resolve(self.build.output_dir.as_deref(), "public"),
            cache_dir: resolve(self.build.cache_dir.as_deref(), "temp/docs"),
            template_dirs: resolve_all(&self.build.template_dirs, &["docs/templates"]),
            include: self.build.include.clone().unwrap_or_default(),
            exclude: self.build.exclude.clone().unwrap_or_default(),
        };

        let defaults = ExamplesConfig::default();
        self.examples_resolved = ExamplesConfig {
            folders: resolve_all(&self.examples.folders, &["docs"]),
            setup_path: self
                .examples
                .setup_path
                .as_deref()
                .map(|p| config_dir.join(p)),
            external: self.examples.external.clone().unwrap_or(defaults.external),
            icon_lib: self.examples.icon_lib.clone().unwrap_or(defaults.icon_lib),
        };

        self.manifest_resolved = ManifestConfig {
            markdown: self.manifest.markdown.as_deref().map(|p| config_dir.join(p)),
            json: self.manifest.json.as_deref().map(|p| config_dir.join(p)),
        };
    }
}
