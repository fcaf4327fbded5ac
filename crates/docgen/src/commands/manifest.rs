//! `docgen manifest` command implementation.

use std::path::PathBuf;

use clap::Args;
use docgen_config::{CliSettings, Config};
use docgen_pipeline::{Generator, SourceSet};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the manifest command.
#[derive(Args)]
pub(crate) struct ManifestArgs {
    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover docgen.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ManifestArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if !config.manifest_resolved.is_enabled() {
            output.warning("No manifest output configured, set [manifest] markdown or json");
            return Ok(());
        }

        let sources = [SourceSet::from_config(&config.build_resolved)?];
        let manifest = Generator::new(config).write_manifest(&sources)?;

        output.success(&format!("Wrote manifest with {} page(s)", manifest.paths().len()));
        Ok(())
    }
}
