//! Processor ordering.
//!
//! Constraints form a directed graph with one extra node for the render
//! stage. The order is a topological sort where, among stages that are
//! ready at the same time, the one registered first wins and the render
//! stage yields to every ready processor. Processors without a path to or
//! from the render stage therefore run before it.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::processor::{Processor, RENDER};

/// One step of a resolved schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Run the processor at this registration index.
    Processor(usize),
    /// Render all documents.
    Render,
}

/// Invalid processor configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Two processors share a name.
    #[error("duplicate processor name \"{0}\"")]
    DuplicateName(String),

    /// A constraint names a processor that is not registered.
    #[error("processor \"{processor}\" references unknown processor \"{reference}\"")]
    UnknownReference { processor: String, reference: String },

    /// Constraints cannot be satisfied.
    #[error("cyclic processor constraints between: {}", names.join(", "))]
    Cycle { names: Vec<String> },
}

/// Resolves processor constraints into an execution order.
pub struct Scheduler;

impl Scheduler {
    /// Order `processors` and the render stage.
    ///
    /// The result is deterministic for a given registration order.
    pub fn resolve(processors: &[Box<dyn Processor>]) -> Result<Vec<Stage>, ScheduleError> {
        let render = processors.len();
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(processors.len() + 1);
        for (i, processor) in processors.iter().enumerate() {
            let name = processor.name();
            if name == RENDER || index.insert(name, i).is_some() {
                return Err(ScheduleError::DuplicateName(name.to_owned()));
            }
        }
        index.insert(RENDER, render);

        let lookup = |processor: &dyn Processor, reference: &str| {
            index
                .get(reference)
                .copied()
                .ok_or_else(|| ScheduleError::UnknownReference {
                    processor: processor.name().to_owned(),
                    reference: reference.to_owned(),
                })
        };

        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); render + 1];
        let mut in_degree = vec![0usize; render + 1];
        for (i, processor) in processors.iter().enumerate() {
            if let Some(before) = processor.before() {
                let target = lookup(processor.as_ref(), before)?;
                successors[i].push(target);
                in_degree[target] += 1;
            }
            if let Some(after) = processor.after() {
                let source = lookup(processor.as_ref(), after)?;
                successors[source].push(i);
                in_degree[i] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..=render).filter(|&n| in_degree[n] == 0).collect();
        let mut order = Vec::with_capacity(render + 1);
        while let Some(node) = ready.pop_first() {
            order.push(if node == render {
                Stage::Render
            } else {
                Stage::Processor(node)
            });
            for &next in &successors[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() <= render {
            let names = processors
                .iter()
                .enumerate()
                .filter(|&(i, _)| in_degree[i] > 0)
                .map(|(_, p)| p.name().to_owned())
                .collect();
            return Err(ScheduleError::Cycle { names });
        }

        debug!(stages = order.len(), "Resolved processor schedule");
        Ok(order)
    }
}
