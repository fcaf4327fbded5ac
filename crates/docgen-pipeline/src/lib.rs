//! Documentation site generation.
//!
//! A [`Generator`] reads documents from [`SourceSet`]s, runs registered
//! [`Processor`]s in the order resolved by the [`Scheduler`], renders every
//! document through the markdown renderer and a page template, and hands
//! the collected example compile tasks to the example compiler.
//!
//! Built-in processors:
//!
//! - [`ManifestProcessor`]: writes the list of generated pages;
//! - [`SearchProcessor`]: writes `search-data.json`;
//! - [`VersionProcessor`]: exposes the site version to templates.

mod context;
mod error;
mod generator;
mod manifest;
mod processor;
mod reader;
mod scheduler;
mod search;
mod template;
mod version;

pub use context::{Asset, ProcessorContext, RenderedDocument, ResourceRegistry};
pub use error::PipelineError;
pub use generator::{BuildReport, EXAMPLES_DIR, Generator};
pub use manifest::{Manifest, ManifestProcessor};
pub use processor::{Processor, RENDER};
pub use reader::{DEFAULT_TEMPLATE, FileReader, FrontMatterReader, ReadError, SourceSet};
pub use scheduler::{ScheduleError, Scheduler, Stage};
pub use search::{SEARCH_DATA, SearchProcessor};
pub use template::{PageTemplates, ResolvedTemplate, TemplateError, TemplateLoader};
pub use version::VersionProcessor;
