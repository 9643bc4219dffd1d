//! Object → link-target graph
//!
//! Splits parsed records into compile records (one object each) and link
//! records (executables, libraries and archives) and checks that every link
//! input has a producer somewhere in the transcript.

use super::root::ModuleRoot;
use crate::error::{ResolveError, Result};
use crate::transcript::CommandRecord;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

#[derive(Debug)]
pub struct BuildGraph {
    pub objects: Vec<CommandRecord>,
    pub link_targets: Vec<CommandRecord>,
    pub module_root: ModuleRoot,
}

impl BuildGraph {
    /// Partitions and validates `records`, inferring the module root unless
    /// `explicit_root` is given.
    pub fn resolve(records: Vec<CommandRecord>, explicit_root: Option<&str>) -> Result<Self> {
        let (objects, link_targets): (Vec<_>, Vec<_>) =
            records.into_iter().partition(CommandRecord::is_compile);
        debug!(
            objects = objects.len(),
            link_targets = link_targets.len(),
            "Partitioned invocation records"
        );

        let sources = objects.iter().flat_map(|o| o.sources.iter().map(String::as_str));
        let module_root = match explicit_root {
            Some(root) => ModuleRoot::explicit(root, sources)?,
            None => ModuleRoot::infer(sources)?,
        };
        info!("Common root is {}", module_root);

        let graph = Self {
            objects,
            link_targets,
            module_root,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Every link input must be the output of a compile record or of another
    /// link record (libraries linked against libraries).
    fn validate(&self) -> Result<()> {
        let outputs: HashSet<&str> = self
            .objects
            .iter()
            .chain(self.link_targets.iter())
            .map(|r| r.output.as_str())
            .collect();

        for target in &self.link_targets {
            if let Some(input) = target.sources.iter().find(|s| !outputs.contains(s.as_str())) {
                return Err(ResolveError::UnresolvedInput {
                    target: target.output.clone(),
                    input: input.clone(),
                });
            }
        }
        Ok(())
    }

    /// Compile records feeding `link`, in transcript order, as indices into
    /// [`Self::objects`]
    pub fn objects_for(&self, link: &CommandRecord) -> Vec<usize> {
        let inputs: HashSet<&str> = link.sources.iter().map(String::as_str).collect();
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| inputs.contains(o.output.as_str()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Every compile definition seen in the transcript
    pub fn definitions(&self) -> BTreeSet<String> {
        self.objects
            .iter()
            .chain(self.link_targets.iter())
            .flat_map(|r| r.defines.iter().cloned())
            .collect()
    }
}
