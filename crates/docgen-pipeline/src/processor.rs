//! Processor interface.

use crate::context::ProcessorContext;
use crate::error::PipelineError;

/// Name of the synthetic rendering stage usable in `before`/`after`.
pub const RENDER: &str = "render";

/// A named pipeline stage.
///
/// Processors declare their position relative to each other, or to the
/// [`RENDER`] stage, through [`before`](Self::before) and
/// [`after`](Self::after). Handlers run one at a time with exclusive access
/// to the [`ProcessorContext`].
pub trait Processor {
    /// Unique name referenced by other processors' constraints.
    fn name(&self) -> &str;

    /// Processor (or [`RENDER`]) this one must run before.
    fn before(&self) -> Option<&str> {
        None
    }

    /// Processor (or [`RENDER`]) this one must run after.
    fn after(&self) -> Option<&str> {
        None
    }

    fn handle(&self, ctx: &mut ProcessorContext) -> Result<(), PipelineError>;
}
