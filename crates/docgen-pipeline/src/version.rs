//! Site version exposed to templates.

use serde_json::json;
use tracing::debug;

use crate::context::ProcessorContext;
use crate::error::PipelineError;
use crate::processor::{Processor, RENDER};

/// Publishes the site version as the `version` template variable.
///
/// Templates read `vars.version.number` and decide where to show it from
/// `vars.version.location` (the built-in layout uses `"toolbar"`).
#[derive(Clone, Debug)]
pub struct VersionProcessor {
    version: String,
    location: String,
}

impl VersionProcessor {
    pub fn new(version: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            location: location.into(),
        }
    }
}

impl Processor for VersionProcessor {
    fn name(&self) -> &str {
        "versionProcessor"
    }

    fn before(&self) -> Option<&str> {
        Some(RENDER)
    }

    fn handle(&self, ctx: &mut ProcessorContext) -> Result<(), PipelineError> {
        debug!(version = %self.version, location = %self.location, "Exposing site version");
        ctx.template_vars.insert(
            "version".to_owned(),
            json!({ "number": self.version, "location": self.location }),
        );
        Ok(())
    }
}
