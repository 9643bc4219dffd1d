//! Directory tree of build nodes
//!
//! Nodes and targets both live in flat arenas owned by [`BuildTree`] and
//! refer to each other by index. A node knows its parent by id only; the
//! parent owns nothing. Nodes are also indexed by their normalized
//! root-relative path, which is how every lookup addresses them.

use crate::model::{PrunedSubtree, Target};
use crate::paths;
use crate::resolve::{ModuleMap, ModuleRoot};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

/// One directory of the output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildNode {
    pub module: Option<String>,
    /// Normalized root-relative path, `.` for the tree root
    pub path: String,
    pub parent: Option<NodeId>,
    pub subdirectories: BTreeMap<String, NodeId>,
    /// Targets placed at exactly this directory, in insertion order
    pub targets: Vec<TargetId>,
    pub include_paths: Option<Vec<String>>,
    /// Files generated by the refresh step for this directory
    pub generated_files: Vec<String>,
}

impl BuildNode {
    fn new(module: Option<String>, path: String, parent: Option<NodeId>) -> Self {
        Self {
            module,
            path,
            parent,
            subdirectories: BTreeMap::new(),
            targets: Vec::new(),
            include_paths: None,
            generated_files: Vec::new(),
        }
    }
}

/// A target moved away from where its sources placed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relocation {
    pub target: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug)]
pub struct BuildTree {
    root: ModuleRoot,
    nested_root_marker: String,
    nodes: Vec<BuildNode>,
    index: HashMap<String, NodeId>,
    targets: Vec<Target>,
    placement: Vec<Option<NodeId>>,
}

impl BuildTree {
    pub fn new(root: ModuleRoot, nested_root_marker: impl Into<String>) -> Self {
        let top = BuildNode::new(None, ".".to_string(), None);
        Self {
            root,
            nested_root_marker: nested_root_marker.into(),
            nodes: vec![top],
            index: HashMap::from([(".".to_string(), NodeId(0))]),
            targets: Vec::new(),
            placement: Vec::new(),
        }
    }

    pub fn module_root(&self) -> &ModuleRoot {
        &self.root
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &BuildNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut BuildNode {
        &mut self.nodes[id.0]
    }

    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.0]
    }

    pub fn target_mut(&mut self, id: TargetId) -> &mut Target {
        &mut self.targets[id.0]
    }

    /// Every target in insertion order, placed or not
    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &Target)> {
        self.targets.iter().enumerate().map(|(i, t)| (TargetId(i), t))
    }

    /// Node holding `id`, if it is currently in the tree
    pub fn placement(&self, id: TargetId) -> Option<NodeId> {
        self.placement[id.0]
    }

    /// Node at `path`, if it exists
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.index.get(&paths::normalize(path)).copied()
    }

    /// First target named `name`, in insertion order
    pub fn find_target(&self, name: &str) -> Option<TargetId> {
        self.targets
            .iter()
            .position(|t| t.name == name)
            .map(TargetId)
    }

    /// Node at `path`, creating it and any missing ancestors.
    ///
    /// New nodes inherit their parent's module. Below a node without a
    /// module, each segment starts a module of its own unless it is the
    /// nested-root marker, which leaves the module open for the next one.
    pub fn get_or_create(&mut self, path: &str) -> NodeId {
        let normalized = paths::normalize(path);
        if let Some(id) = self.index.get(&normalized) {
            return *id;
        }

        let mut current = self.root();
        for segment in paths::segments(&normalized) {
            if let Some(child) = self.nodes[current.0].subdirectories.get(segment) {
                current = *child;
                continue;
            }

            let parent = &self.nodes[current.0];
            let module = match &parent.module {
                Some(module) => Some(module.clone()),
                None if segment == self.nested_root_marker => None,
                None => Some(segment.to_string()),
            };
            let child_path = if parent.path == "." {
                segment.to_string()
            } else {
                format!("{}/{}", parent.path, segment)
            };

            let id = NodeId(self.nodes.len());
            self.nodes
                .push(BuildNode::new(module, child_path.clone(), Some(current)));
            self.nodes[current.0]
                .subdirectories
                .insert(segment.to_string(), id);
            self.index.insert(child_path, id);
            current = id;
        }
        current
    }

    /// Adds a target, placing it at its path if it has one
    pub fn insert(&mut self, target: Target) -> TargetId {
        let id = TargetId(self.targets.len());
        let path = target.path.clone();
        self.targets.push(target);
        self.placement.push(None);
        if let Some(path) = path {
            self.place(id, &path);
        }
        id
    }

    /// Appends `id` to the node at `path` and records the new path
    pub fn place(&mut self, id: TargetId, path: &str) {
        let node = self.get_or_create(path);
        self.nodes[node.0].targets.push(id);
        self.placement[id.0] = Some(node);
        self.targets[id.0].path = Some(self.nodes[node.0].path.clone());
    }

    /// Takes `id` out of the node holding it. Its path is left as it was.
    pub fn unplace(&mut self, id: TargetId) {
        if let Some(node) = self.placement[id.0].take() {
            self.nodes[node.0].targets.retain(|t| *t != id);
        }
    }

    /// Moves `id` to `path`, returning where it was
    pub fn relocate(&mut self, id: TargetId, path: &str) -> Option<String> {
        let previous = self.targets[id.0].path.clone();
        self.unplace(id);
        self.place(id, path);
        previous
    }

    /// Moves libraries named after a module to that module's directory.
    ///
    /// Some builds drop a module's main library into a subdirectory; its
    /// name is the hint that it belongs at the module root.
    pub fn fix_module_libraries(&mut self, modules: &ModuleMap) -> Vec<Relocation> {
        let mut relocations = Vec::new();
        for index in 0..self.targets.len() {
            let id = TargetId(index);
            let target = &self.targets[index];
            let (Some(current), Some(expected)) = (target.path.as_deref(), modules.path(&target.name))
            else {
                continue;
            };
            if paths::normalize(current) == paths::normalize(expected) {
                continue;
            }

            let relocation = Relocation {
                target: target.name.clone(),
                from: current.to_string(),
                to: expected.to_string(),
            };
            info!(
                "Moving module-named {} from {} to {}",
                relocation.target, relocation.from, relocation.to
            );
            let vacated = self.placement[index];
            self.relocate(id, &relocation.to);
            if let Some(node) = vacated {
                self.detach_if_empty(node);
            }
            relocations.push(relocation);
        }
        relocations
    }

    /// Drops an independently supplied dependency from the tree.
    ///
    /// The subtree under the root directory is detached and the artifact is
    /// taken out of whichever node holds it. Affected targets stay in the
    /// arena unplaced, so overrides can still put them back. Returns their
    /// names.
    pub fn prune(&mut self, pruned: &PrunedSubtree) -> Vec<String> {
        let mut removed = Vec::new();

        let root = self.root();
        if let Some(subtree) = self.nodes[root.0].subdirectories.remove(&pruned.directory) {
            for node in self.descendants(subtree) {
                self.index.remove(&self.nodes[node.0].path);
                for id in std::mem::take(&mut self.nodes[node.0].targets) {
                    self.placement[id.0] = None;
                    removed.push(self.targets[id.0].name.clone());
                }
            }
            debug!(directory = %pruned.directory, "Pruned subtree");
        }

        let artifacts: Vec<TargetId> = self
            .targets()
            .filter(|(id, t)| t.name == pruned.artifact && self.placement(*id).is_some())
            .map(|(id, _)| id)
            .collect();
        for id in artifacts {
            self.unplace(id);
            removed.push(self.targets[id.0].name.clone());
        }

        removed
    }

    /// Removes `id` and any ancestors left holding nothing at all
    fn detach_if_empty(&mut self, mut id: NodeId) {
        while let Some(parent) = self.nodes[id.0].parent {
            let node = &self.nodes[id.0];
            let empty = node.targets.is_empty()
                && node.subdirectories.is_empty()
                && node.include_paths.is_none()
                && node.generated_files.is_empty();
            if !empty {
                return;
            }

            let path = node.path.clone();
            self.nodes[parent.0]
                .subdirectories
                .remove(paths::basename(&path));
            self.index.remove(&path);
            id = parent;
        }
    }

    /// `id` and every node below it, parents before children
    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut next = 0;
        while next < out.len() {
            out.extend(self.nodes[out[next].0].subdirectories.values().copied());
            next += 1;
        }
        out
    }

    /// Every node reachable from the root, parents before children and
    /// siblings in name order
    pub fn collect(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].subdirectories.values().rev().copied());
        }
        out
    }
}
