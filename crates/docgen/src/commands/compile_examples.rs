//! `docgen compile-examples` command implementation.
//!
//! Reads an example batch as JSON from stdin, bundles every task and writes
//! the bundles. Any failure leaves no bundle behind and exits non-zero.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use docgen_bundler::{IifeBundler, compile_batch};
use docgen_config::{DEFAULT_ICON_LIB, ICON_LIB_ENV};
use docgen_examples::ExampleBatch;
use tracing::info;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the compile-examples command.
#[derive(Args)]
pub(crate) struct CompileExamplesArgs {
    /// Directory local example imports resolve against (default: current directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Icon library substituted for `process.env.DOCS_ICON_LIB`.
    #[arg(long, env = ICON_LIB_ENV, default_value = DEFAULT_ICON_LIB)]
    icon_lib: String,
}

impl CompileExamplesArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let mut json = String::new();
        std::io::stdin().read_to_string(&mut json)?;
        let batch = ExampleBatch::from_json(&json)?;
        if batch.is_empty() {
            info!("No examples to compile");
            return Ok(());
        }

        let root = match self.root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        let bundler = IifeBundler::new(root).with_icon_lib(&self.icon_lib);
        let written = compile_batch(&bundler, &batch)?;

        output.success(&format!(
            "Compiled {} example(s) to {}",
            written.len(),
            batch.output_folder.display()
        ));
        Ok(())
    }
}
