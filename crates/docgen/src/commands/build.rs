//! `docgen build` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use docgen_bundler::{CompileStatus, ProcessCompiler};
use docgen_config::{CliSettings, Config};
use docgen_pipeline::{Generator, SearchProcessor, SourceSet, VersionProcessor};
use docgen_renderer::{SoftError, escape_html};
use tracing::warn;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory for the generated site (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Icon library substituted for `process.env.DOCS_ICON_LIB` in examples.
    #[arg(long)]
    icon_lib: Option<String>,

    /// Site version shown by the page templates.
    #[arg(long)]
    site_version: Option<String>,

    /// Where templates place the site version.
    #[arg(long, default_value = "toolbar")]
    version_location: String,

    /// Report broken references and unknown containers as warnings.
    #[arg(long)]
    lenient: bool,

    /// Compile examples in a separate `docgen compile-examples` process.
    #[arg(long)]
    external_compiler: bool,

    /// Path to configuration file (default: auto-discover docgen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir.clone(),
            output_dir: self.output_dir.clone(),
            icon_lib: self.icon_lib.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.highlight(&format!("Building {}", config.site.name));
        output.info(&format!(
            "Source: {}",
            config.build_resolved.source_dir.display()
        ));
        output.info(&format!(
            "Output: {}",
            config.build_resolved.output_dir.display()
        ));

        let sources = [SourceSet::from_config(&config.build_resolved)?];
        let root = project_root(&config)?;
        let icon_lib = config.examples_resolved.icon_lib.clone();

        let mut generator = Generator::new(config)
            .with_root(&root)
            .with_processor(SearchProcessor);
        if let Some(version) = self.site_version {
            generator = generator.with_processor(VersionProcessor::new(version, self.version_location));
        }
        if self.lenient {
            generator = generator.with_soft_error_handler(recover_soft_error);
        }
        if self.external_compiler {
            let compiler = ProcessCompiler::new(std::env::current_exe()?)
                .arg("compile-examples")
                .arg("--root")
                .arg(root)
                .arg("--icon-lib")
                .arg(icon_lib);
            generator = generator.with_compiler(compiler);
        }

        let report = generator.build(&sources)?;

        if report.duplicate_tasks > 0 {
            output.info(&format!(
                "Skipped {} duplicate example(s)",
                report.duplicate_tasks
            ));
        }
        match report.compile {
            CompileStatus::Failed { message } => {
                output.warning(&format!(
                    "Site written to {} but examples failed to compile",
                    report.output_dir.display()
                ));
                Err(CliError::Compile(message))
            }
            CompileStatus::Success { .. } | CompileStatus::Skipped => {
                output.success(&format!(
                    "Built {} page(s) to {}",
                    report.pages,
                    report.output_dir.display()
                ));
                Ok(())
            }
        }
    }
}

/// Directory example imports resolve against: the config file's directory,
/// or the working directory without one.
fn project_root(config: &Config) -> Result<PathBuf, CliError> {
    match config.config_path.as_deref().and_then(Path::parent) {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Ok(std::env::current_dir()?),
    }
}

/// Log the error and render its message in place of the broken markup.
fn recover_soft_error(error: SoftError) -> Result<String, SoftError> {
    warn!(document = error.document(), "{error}");
    Ok(format!(
        "<span class=\"docs-error\">{}</span>",
        escape_html(&error.to_string())
    ))
}
