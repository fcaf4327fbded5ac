//! docgen CLI - Documentation site generator.
//!
//! Provides commands for:
//! - `build`: Render the documentation site and compile its examples
//! - `compile-examples`: Compile an example batch read as JSON from stdin
//! - `manifest`: Write the page manifest without building

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, CompileExamplesArgs, ManifestArgs};
use output::Output;

/// docgen - Documentation site generator.
#[derive(Parser)]
#[command(name = "docgen", version, about)]
struct Cli {
    /// Enable info-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the documentation site.
    Build(BuildArgs),
    /// Compile an example batch read from stdin.
    CompileExamples(CompileExamplesArgs),
    /// Write the page manifest.
    Manifest(ManifestArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::CompileExamples(args) => args.execute(),
        Commands::Manifest(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
