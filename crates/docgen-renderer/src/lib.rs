//! Markdown rendering engine for documentation pages.
//!
//! [`MarkdownRenderer`] renders one [`Document`] at a time against the full
//! document set. Rendering runs in stages:
//!
//! 1. containers (`::: name`) are expanded, pulling in other documents'
//!    bodies where requested and rejecting circular inclusion;
//! 2. the markdown is walked by an event machine that normalizes heading
//!    levels, registers image resources, wraps tables and hands every fenced
//!    code block to an [`ExampleGenerator`];
//! 3. inline tags such as `{@link target}` are resolved against the
//!    document index and the headings generated in step 2.
//!
//! Recoverable problems are reported as [`SoftError`]s through a caller
//! supplied handler, which may substitute replacement text.

mod container;
mod document;
mod env;
mod error;
mod example;
mod fence;
mod html;
mod inline_tags;
mod renderer;
mod state;
mod util;

pub use document::{Attributes, Document, FileInfo};
pub use env::RenderEnv;
pub use error::{RenderError, SoftError, SoftErrorHandler};
pub use example::{CompileTask, ExampleGenerator, ExampleRequest, ExampleResult, GenerateError};
pub use renderer::{MarkdownRenderer, RenderedPage, Resource};
pub use state::{TocEntry, escape_html, slugify};
pub use util::{join_paths, relative_path};
