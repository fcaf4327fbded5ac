//! Hand-off between the documentation build and the example compiler.
//!
//! The build only needs to know whether compiling succeeded. The compiler
//! runs either in the same process or as a child process reading the batch
//! as JSON on stdin; in both cases a failure is reported as a status and
//! never aborts the surrounding build.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use docgen_examples::ExampleBatch;
use tracing::{debug, error, info};

use crate::bundler::{Bundler, write_bundles};
use crate::error::BundleError;

/// Outcome of compiling a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileStatus {
    /// All bundles were written.
    Success { bundles: usize },
    /// Compilation failed; nothing is guaranteed to be written.
    Failed { message: String },
    /// The batch had no tasks.
    Skipped,
}

impl CompileStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Something that compiles an example batch.
pub trait CompilerBoundary {
    fn compile(&self, batch: &ExampleBatch) -> CompileStatus;
}

/// Bundle a batch and write every output.
///
/// Nothing is written unless all tasks bundle successfully.
pub fn compile_batch(bundler: &dyn Bundler, batch: &ExampleBatch) -> Result<Vec<PathBuf>, BundleError> {
    let outputs = bundler.bundle(batch)?;
    write_bundles(&outputs)?;
    Ok(outputs.into_iter().map(|output| output.path).collect())
}

/// Compiles in the current process.
pub struct InProcessCompiler {
    bundler: Box<dyn Bundler>,
}

impl InProcessCompiler {
    pub fn new(bundler: impl Bundler + 'static) -> Self {
        Self {
            bundler: Box::new(bundler),
        }
    }
}

impl CompilerBoundary for InProcessCompiler {
    fn compile(&self, batch: &ExampleBatch) -> CompileStatus {
        if batch.is_empty() {
            return CompileStatus::Skipped;
        }
        match compile_batch(self.bundler.as_ref(), batch) {
            Ok(paths) => {
                info!(count = paths.len(), "Compiled examples");
                CompileStatus::Success {
                    bundles: paths.len(),
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to compile examples");
                CompileStatus::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Compiles by running an external command.
///
/// The batch is written as JSON to the child's stdin; a zero exit status
/// means success. The child's stderr is passed through.
#[derive(Clone, Debug)]
pub struct ProcessCompiler {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ProcessCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn run(&self, json: &str) -> Result<(), String> {
        let program = self.program.display();
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| format!("failed to spawn {program}: {e}"))?;

        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(json.as_bytes())
        {
            drop(stdin);
            let _ = child.kill();
            let _ = child.wait();
            return Err(format!("failed to write batch to {program}: {e}"));
        }

        let status = child
            .wait()
            .map_err(|e| format!("failed to wait for {program}: {e}"))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{program} exited with {status}"))
        }
    }
}

impl CompilerBoundary for ProcessCompiler {
    fn compile(&self, batch: &ExampleBatch) -> CompileStatus {
        if batch.is_empty() {
            return CompileStatus::Skipped;
        }
        let json = match batch.to_json() {
            Ok(json) => json,
            Err(e) => {
                return CompileStatus::Failed {
                    message: e.to_string(),
                };
            }
        };
        debug!(program = %self.program.display(), bytes = json.len(), "Spawning example compiler");
        match self.run(&json) {
            Ok(()) => CompileStatus::Success {
                bundles: batch.tasks.len(),
            },
            Err(message) => {
                error!(%message, "Example compiler failed");
                CompileStatus::Failed { message }
            }
        }
    }
}
