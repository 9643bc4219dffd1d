//! End-to-end resolution: transcript in, build tree out
//!
//! The stages run strictly in order and the first fatal error ends the run:
//!
//! 1. read and parse the transcript (optionally through a [`ParseCache`])
//! 2. build the object → target graph and find the module root
//! 3. derive one [`Target`] per link record, with module ownership
//! 4. assemble the tree and move misplaced module libraries
//! 5. prune the independently supplied subtree
//! 6. merge the override document
//!
//! Recoverable findings are gathered in a [`ResolveReport`] and logged once
//! at the end.

use crate::error::Result;
use crate::fs::FileSystem;
use crate::model::{Conventions, Target};
use crate::resolve::{derive_module, source_directory, BuildGraph, ModuleMap};
use crate::transcript::{self, CacheKey, CommandRecord, ParseCache};
use crate::tree::{self, BuildTree, EmitMode, OverrideDocument, Relocation, RenderedDocument};
use anyhow::Context;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A condition worth telling the user about that does not stop the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// All sources are build-generated and no override placed the target
    GeneratedOnly { target: String },
    /// Compile records that no link record consumes
    UnusedObjects { count: usize },
    /// Several targets share a name; lookups see only the first
    DuplicateName { name: String, count: usize },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::GeneratedOnly { target } => write!(
                f,
                "Target {} has only generated sources and was not placed",
                target
            ),
            ResolveWarning::UnusedObjects { count } => write!(f, "{} objects unused", count),
            ResolveWarning::DuplicateName { name, count } => {
                write!(f, "Target name {} is used {} times", name, count)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// Outputs of compile records no link record consumes
    pub unused_objects: Vec<String>,
    /// Targets whose sources are all build-generated
    pub generated_only: Vec<String>,
    /// Generated-only targets still outside the tree after overrides
    pub unplaced: Vec<String>,
    pub duplicate_names: BTreeMap<String, usize>,
    pub relocations: Vec<Relocation>,
    pub pruned: Vec<String>,
    /// Declared dependencies that no target in the transcript produces
    pub external_dependencies: BTreeSet<String>,
    pub definitions: BTreeSet<String>,
}

impl ResolveReport {
    pub fn warnings(&self) -> Vec<ResolveWarning> {
        let mut warnings: Vec<ResolveWarning> = self
            .unplaced
            .iter()
            .map(|target| ResolveWarning::GeneratedOnly {
                target: target.clone(),
            })
            .collect();
        if !self.unused_objects.is_empty() {
            warnings.push(ResolveWarning::UnusedObjects {
                count: self.unused_objects.len(),
            });
        }
        warnings.extend(
            self.duplicate_names
                .iter()
                .map(|(name, count)| ResolveWarning::DuplicateName {
                    name: name.clone(),
                    count: *count,
                }),
        );
        warnings
    }

    pub fn log_summary(&self) {
        for warning in self.warnings() {
            warn!("{}", warning);
        }
        for name in &self.unused_objects {
            debug!(object = %name, "Unused object");
        }
        if !self.pruned.is_empty() {
            info!(count = self.pruned.len(), "Pruned independently built targets");
        }
        info!(
            "External dependencies: {}",
            self.external_dependencies
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        debug!(count = self.definitions.len(), "Compile definitions seen");
    }
}

/// Result of a successful run
#[derive(Debug)]
pub struct Resolution {
    pub tree: BuildTree,
    pub modules: ModuleMap,
    pub report: ResolveReport,
}

impl Resolution {
    pub fn render(
        &self,
        mode: EmitMode,
        filename: &str,
        conventions: &Conventions,
    ) -> Result<Vec<RenderedDocument>> {
        tree::render(&self.tree, mode, filename, conventions)
    }
}

pub struct Resolver<'a> {
    conventions: &'a Conventions,
    explicit_root: Option<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(conventions: &'a Conventions) -> Self {
        Self {
            conventions,
            explicit_root: None,
        }
    }

    /// Uses `root` instead of inferring the module root
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.explicit_root = Some(root.into());
        self
    }

    /// Reads and parses `path`, going through `cache` first
    pub fn read_records<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
        cache: &dyn ParseCache,
    ) -> anyhow::Result<Vec<CommandRecord>> {
        let key = CacheKey::for_transcript(fs, path)
            .with_context(|| format!("Failed to stat build log {}", path.display()))?;
        if let Some(records) = cache.get(&key) {
            info!(count = records.len(), "Using cached parse of {}", path.display());
            return Ok(records);
        }

        let start = Instant::now();
        let content = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read build log {}", path.display()))?;
        let records = transcript::parse(&content, self.conventions)?;
        info!(
            count = records.len(),
            "Parsed {} in {:.2?}",
            path.display(),
            start.elapsed()
        );

        cache.put(&key, &records);
        Ok(records)
    }

    /// Runs every stage after parsing
    pub fn resolve(
        &self,
        records: Vec<CommandRecord>,
        overrides: &OverrideDocument,
    ) -> Result<Resolution> {
        let graph = BuildGraph::resolve(records, self.explicit_root.as_deref())?;
        let mut report = ResolveReport {
            definitions: graph.definitions(),
            ..Default::default()
        };

        let (targets, modules) = self.build_targets(&graph, &mut report);
        info!(
            targets = targets.len(),
            modules = modules.derived_len(),
            "Resolved link targets"
        );

        let produced: BTreeSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        report.external_dependencies = targets
            .iter()
            .flat_map(|t| t.libraries.iter())
            .filter(|l| !produced.contains(l.as_str()))
            .cloned()
            .collect();

        let mut tree = BuildTree::new(
            graph.module_root.clone(),
            self.conventions.nested_root_marker.clone(),
        );
        for target in targets {
            tree.insert(target);
        }

        report.relocations = tree.fix_module_libraries(&modules);
        if let Some(pruned) = &self.conventions.pruned_subtree {
            report.pruned = tree.prune(pruned);
        }

        if overrides.is_empty() {
            debug!("No overrides to apply");
        } else {
            overrides.apply(&mut tree, &modules)?;
        }

        report.unplaced = report
            .generated_only
            .iter()
            .filter(|name| {
                tree.find_target(name)
                    .and_then(|id| tree.placement(id))
                    .is_none()
            })
            .cloned()
            .collect();

        Ok(Resolution {
            tree,
            modules,
            report,
        })
    }

    /// One target per link record, in transcript order
    fn build_targets(
        &self,
        graph: &BuildGraph,
        report: &mut ResolveReport,
    ) -> (Vec<Target>, ModuleMap) {
        let mut modules = ModuleMap::new(self.conventions);
        let mut used = vec![false; graph.objects.len()];
        let mut targets = Vec::with_capacity(graph.link_targets.len());

        for link in &graph.link_targets {
            let objects = graph.objects_for(link);
            let sources: Vec<String> = objects
                .iter()
                .flat_map(|i| graph.objects[*i].sources.iter().cloned())
                .collect();
            for i in objects {
                used[i] = true;
            }

            let (module, path) = match source_directory(sources.iter().map(String::as_str)) {
                Some(directory) => {
                    let relative = graph.module_root.relative(&directory);
                    let module = derive_module(&relative, self.conventions).map(|(module, path)| {
                        modules.record(&module, &path);
                        module
                    });
                    (module, Some(relative))
                }
                None => {
                    debug!(name = %link.output, "Target has only generated sources");
                    (None, None)
                }
            };

            let target = Target::from_output(&link.output, self.conventions)
                .with_sources(sources)
                .with_libraries(
                    link.libraries.iter().map(String::as_str),
                    link.frameworks.iter().map(String::as_str),
                    self.conventions,
                )
                .with_location(module, path);
            debug!(name = %target.name, module = ?target.module, "Resolved target");
            if target.path.is_none() {
                report.generated_only.push(target.name.clone());
            }
            targets.push(target);
        }

        report.unused_objects = graph
            .objects
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(o, _)| o.output.clone())
            .collect();

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for target in &targets {
            *counts.entry(target.name.clone()).or_default() += 1;
        }
        report.duplicate_names = counts.into_iter().filter(|(_, n)| *n > 1).collect();

        (targets, modules)
    }
}

/// Loads the override document at `path`.
///
/// A missing file is an error only when `required`; otherwise it means no
/// overrides.
pub fn load_overrides<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    required: bool,
) -> anyhow::Result<OverrideDocument> {
    if !fs.exists(path) {
        if required {
            anyhow::bail!("Override file {} does not exist", path.display());
        }
        debug!("No override file at {}", path.display());
        return Ok(OverrideDocument::default());
    }

    let content = fs
        .read_to_string(path)
        .with_context(|| format!("Failed to read override file {}", path.display()))?;
    let document = OverrideDocument::from_yaml(&content)
        .with_context(|| format!("Failed to load override file {}", path.display()))?;
    info!("Loaded overrides from {}", path.display());
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::transcript::{FileParseCache, NoopParseCache};

    const LOG: &str = "\
make[1]: Entering directory '/build'
g++ -o mod1/a.o -c -DNDEBUG /root/mod1/a.cc
g++ -o mod1/b.o -c /root/mod1/b.cc
g++ -o other/x.o -c /root/other/x.cc
g++ -o other/unused.o -c /root/other/unused.cc
g++ -o gen/g.o -c gen/g.cc
g++ -o lib/liba.so -shared mod1/a.o mod1/b.o -lm -lfoo
g++ -o other/tool other/x.o lib/liba.so -la
g++ -o gen_tool gen/g.o
";

    fn resolve(overrides: &str) -> Resolution {
        let conventions = Conventions::default();
        let records = transcript::parse(LOG, &conventions).unwrap();
        let overrides = OverrideDocument::from_yaml(overrides).unwrap();
        Resolver::new(&conventions).resolve(records, &overrides).unwrap()
    }

    #[test]
    fn test_resolve_targets() {
        let resolution = resolve("");
        let tree = &resolution.tree;
        assert_eq!(tree.module_root().as_str(), "/root/");

        let id = tree.find_target("a").unwrap();
        let a = tree.target(id);
        assert_eq!(a.prefix, "lib");
        assert_eq!(a.module.as_deref(), Some("mod1"));
        assert_eq!(a.path.as_deref(), Some("mod1"));
        assert_eq!(a.libraries.iter().collect::<Vec<_>>(), vec!["foo"]);
        assert_eq!(a.sources, vec!["/root/mod1/a.cc", "/root/mod1/b.cc"]);
        assert_eq!(tree.placement(id), tree.find("mod1"));
    }

    #[test]
    fn test_report() {
        let report = resolve("").report;
        assert_eq!(report.unused_objects, vec!["other/unused.o"]);
        assert_eq!(report.generated_only, vec!["gen_tool"]);
        assert_eq!(report.unplaced, vec!["gen_tool"]);
        assert_eq!(
            report.external_dependencies.iter().collect::<Vec<_>>(),
            vec!["foo"]
        );
        assert_eq!(report.definitions.iter().collect::<Vec<_>>(), vec!["NDEBUG"]);
        assert_eq!(
            report.warnings(),
            vec![
                ResolveWarning::GeneratedOnly {
                    target: "gen_tool".to_string()
                },
                ResolveWarning::UnusedObjects { count: 1 },
            ]
        );
    }

    #[test]
    fn test_generated_only_placed_by_override() {
        let resolution = resolve("forced_locations:\n  gen_tool: tools\n");
        assert!(resolution.report.unplaced.is_empty());
        let id = resolution.tree.find_target("gen_tool").unwrap();
        assert_eq!(resolution.tree.placement(id), resolution.tree.find("tools"));
        assert_eq!(
            resolution.report.warnings(),
            vec![ResolveWarning::UnusedObjects { count: 1 }]
        );
    }

    fn generated_only_warnings(overrides: &str) -> Vec<String> {
        let log = format!(
            "{}g++ -o gen/h.o -c gen/h.cc\ng++ -o gen_other gen/h.o\n",
            LOG
        );
        let conventions = Conventions::default();
        let records = transcript::parse(&log, &conventions).unwrap();
        let overrides = OverrideDocument::from_yaml(overrides).unwrap();
        let report = Resolver::new(&conventions)
            .resolve(records, &overrides)
            .unwrap()
            .report;
        assert_eq!(report.generated_only.len(), 2);

        let mut names: Vec<String> = report
            .warnings()
            .into_iter()
            .filter_map(|w| match w {
                ResolveWarning::GeneratedOnly { target } => Some(target),
                _ => None,
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_one_warning_per_unplaced_generated_target() {
        assert_eq!(generated_only_warnings(""), vec!["gen_other", "gen_tool"]);
        assert_eq!(
            generated_only_warnings("forced_locations:\n  gen_tool: tools\n"),
            vec!["gen_other"]
        );
        assert!(generated_only_warnings(
            "forced_locations:\n  gen_tool: tools\n  gen_other: tools\n"
        )
        .is_empty());
    }

    #[test]
    fn test_explicit_root() {
        let conventions = Conventions::default();
        let records = transcript::parse(LOG, &conventions).unwrap();
        let resolution = Resolver::new(&conventions)
            .with_root("/")
            .resolve(records, &OverrideDocument::default())
            .unwrap();
        let id = resolution.tree.find_target("a").unwrap();
        assert_eq!(resolution.tree.target(id).module.as_deref(), Some("root"));
    }

    #[test]
    fn test_duplicate_names_reported() {
        let conventions = Conventions::default();
        let log = "g++ -o a/x.o -c /r/a/x.cc\ng++ -o b/x.o -c /r/b/x.cc\n\
                   g++ -o a/tool a/x.o\ng++ -o b/tool b/x.o\n";
        let records = transcript::parse(log, &conventions).unwrap();
        let resolution = Resolver::new(&conventions)
            .resolve(records, &OverrideDocument::default())
            .unwrap();
        assert_eq!(resolution.report.duplicate_names.get("tool"), Some(&2));

        // Lookups see the first one
        let id = resolution.tree.find_target("tool").unwrap();
        assert_eq!(resolution.tree.target(id).path.as_deref(), Some("a"));
    }

    #[test]
    fn test_read_records_through_cache() {
        let fs = MockFileSystem::new();
        fs.add_file("/mock/build.log", LOG);
        let conventions = Conventions::default();
        let resolver = Resolver::new(&conventions);
        let cache = FileParseCache::new(&fs, "/mock/cache.json");

        let first = resolver
            .read_records(&fs, Path::new("/mock/build.log"), &cache)
            .unwrap();
        assert!(fs.exists(Path::new("/mock/cache.json")));
        let second = resolver
            .read_records(&fs, Path::new("/mock/build.log"), &cache)
            .unwrap();
        assert_eq!(first, second);

        let uncached = resolver
            .read_records(&fs, Path::new("/mock/build.log"), &NoopParseCache)
            .unwrap();
        assert_eq!(first, uncached);
    }

    #[test]
    fn test_read_records_missing_log() {
        let fs = MockFileSystem::new();
        let conventions = Conventions::default();
        let err = Resolver::new(&conventions)
            .read_records(&fs, Path::new("/mock/none.log"), &NoopParseCache)
            .unwrap_err();
        assert!(err.to_string().contains("none.log"));
    }

    #[test]
    fn test_load_overrides() {
        let fs = MockFileSystem::new();
        assert!(load_overrides(&fs, Path::new("/mock/autogen.yaml"), false)
            .unwrap()
            .is_empty());
        assert!(load_overrides(&fs, Path::new("/mock/autogen.yaml"), true).is_err());

        fs.add_file("/mock/autogen.yaml", "forced_locations:\n  a: b\n");
        let doc = load_overrides(&fs, Path::new("/mock/autogen.yaml"), true).unwrap();
        assert_eq!(doc.forced_locations["a"], "b");
    }
}
