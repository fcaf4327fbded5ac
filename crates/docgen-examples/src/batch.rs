//! Compile batches.
//!
//! All compile tasks of a run are collected into one [`ExampleBatch`].
//! Tasks sharing an output file (and therefore a fingerprint) are collapsed
//! here; the compiler trusts the batch and never re-checks.

use std::collections::HashSet;
use std::path::PathBuf;

use docgen_renderer::CompileTask;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Complete set of compile tasks handed to the compiler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleBatch {
    /// Folder the bundles are written to.
    pub output_folder: PathBuf,
    /// Modules provided at runtime and left out of bundles.
    pub external: Vec<String>,
    /// Tasks, at most one per output file.
    pub tasks: Vec<CompileTask>,
}

impl ExampleBatch {
    /// Parse a batch from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the batch to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Collects compile tasks, keeping the first task per output file.
#[derive(Debug, Default)]
pub struct BatchBuilder {
    seen: HashSet<String>,
    tasks: Vec<CompileTask>,
    duplicates: usize,
}

impl BatchBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Returns `false` if an equivalent task was already added.
    pub fn push(&mut self, task: CompileTask) -> bool {
        if self.seen.insert(task.output_file.clone()) {
            self.tasks.push(task);
            true
        } else {
            self.duplicates += 1;
            false
        }
    }

    /// Number of tasks dropped as duplicates.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Finish the batch.
    #[must_use]
    pub fn build(self, output_folder: impl Into<PathBuf>, external: Vec<String>) -> ExampleBatch {
        debug!(
            tasks = self.tasks.len(),
            duplicates = self.duplicates,
            "Assembled example batch"
        );
        ExampleBatch {
            output_folder: output_folder.into(),
            external,
            tasks: self.tasks,
        }
    }
}

impl Extend<CompileTask> for BatchBuilder {
    fn extend<I: IntoIterator<Item = CompileTask>>(&mut self, iter: I) {
        for task in iter {
            self.push(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn task(source_file: &str, output_file: &str, parent: &str) -> CompileTask {
        CompileTask {
            source_file: source_file.to_owned(),
            output_file: output_file.to_owned(),
            sourcecode: "console.log(1);".to_owned(),
            parent: parent.to_owned(),
        }
    }

    #[test]
    fn test_builder_keeps_first_task_per_output() {
        let mut builder = BatchBuilder::new();
        assert!(builder.push(task("a-1.js", "example-1.js", "a")));
        assert!(builder.push(task("a-2.js", "example-2.js", "a")));
        assert!(!builder.push(task("b-1.js", "example-1.js", "b")));
        assert_eq!(builder.duplicates(), 1);

        let batch = builder.build("public/examples", vec!["vue".to_owned()]);
        let sources: Vec<_> = batch.tasks.iter().map(|t| t.source_file.as_str()).collect();
        assert_eq!(sources, vec!["a-1.js", "a-2.js"]);
    }

    #[test]
    fn test_batch_json_field_names() {
        let mut builder = BatchBuilder::new();
        builder.extend([task("a-1.js", "example-1.js", "a")]);
        let batch = builder.build("out", vec!["vue".to_owned()]);

        let json: serde_json::Value = serde_json::from_str(&batch.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "outputFolder": "out",
                "external": ["vue"],
                "tasks": [{
                    "sourceFile": "a-1.js",
                    "outputFile": "example-1.js",
                    "sourcecode": "console.log(1);",
                    "parent": "a",
                }],
            })
        );
        assert_eq!(ExampleBatch::from_json(&batch.to_json().unwrap()).unwrap(), batch);
    }
}
