//! Example compiler.
//!
//! Takes an [`ExampleBatch`](docgen_examples::ExampleBatch) and writes one
//! browser script per task:
//!
//! - task sources are served as virtual modules rooted at the working
//!   directory, so they can import local files relative to it;
//! - modules listed as external stay `require(...)` calls;
//! - [`ICON_LIB_DEFINE`] is substituted at compile time;
//! - output is a single self-invoking function per task.
//!
//! Tasks are bundled in parallel. A failure in any task fails the batch
//! and no bundle is written.
//!
//! [`CompilerBoundary`] is what the documentation build sees: it reports a
//! [`CompileStatus`] instead of an error so a broken example never aborts
//! the site.

mod boundary;
mod bundler;
mod error;
mod module;
mod resolve;

pub use boundary::{CompileStatus, CompilerBoundary, InProcessCompiler, ProcessCompiler, compile_batch};
pub use bundler::{BundleOutput, Bundler, ICON_LIB_DEFINE, IifeBundler, write_bundles};
pub use error::BundleError;
