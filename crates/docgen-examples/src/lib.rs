//! Example generation for documentation pages.
//!
//! [`DefaultExampleGenerator`] plugs into the markdown renderer and turns
//! fenced code blocks into examples:
//!
//! - `import` blocks load an example file from the configured folders;
//! - `vue` components become self-mounting modules plus a compile task,
//!   keyed by a [`fingerprint`] of the normalized source;
//! - other languages render statically.
//!
//! Compile tasks from all pages are collected with a [`BatchBuilder`],
//! which drops duplicate fingerprints, into one [`ExampleBatch`] for the
//! bundler.

mod batch;
mod error;
mod fingerprint;
mod generator;
mod import;
mod vue;

pub use batch::{BatchBuilder, ExampleBatch};
pub use docgen_renderer::CompileTask;
pub use error::ExampleError;
pub use fingerprint::{fingerprint, normalize_source};
pub use generator::DefaultExampleGenerator;
pub use import::{ParsedImport, parse_import, resolve_import};
pub use vue::{GeneratedCode, VueOptions, generate_vue, mount_markup};
