//! Per-directory dependency documents
//!
//! This is the hand-off format to the project-file generator. Empty sections
//! are left out entirely.

use super::arena::{BuildTree, NodeId};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::model::{Conventions, TargetKind, TargetRecord};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Child directories, either by name or as complete documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subdirectories {
    Names(Vec<String>),
    Nested(BTreeMap<String, DirectoryDocument>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDocument {
    /// Set only where a new module starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project_include_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdirectories: Option<Subdirectories>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libtbx_refresh: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_libraries: Vec<TargetRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_libraries: Vec<TargetRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub python_extensions: Vec<TargetRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub programs: Vec<TargetRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TargetRecord>,
}

impl DirectoryDocument {
    fn section_mut(&mut self, kind: TargetKind) -> &mut Vec<TargetRecord> {
        match kind {
            TargetKind::StaticLibrary => &mut self.static_libraries,
            TargetKind::SharedLibrary => &mut self.shared_libraries,
            TargetKind::PythonExtension => &mut self.python_extensions,
            TargetKind::Program => &mut self.programs,
            TargetKind::Test => &mut self.tests,
        }
    }

    pub fn section(&self, kind: TargetKind) -> &[TargetRecord] {
        match kind {
            TargetKind::StaticLibrary => &self.static_libraries,
            TargetKind::SharedLibrary => &self.shared_libraries,
            TargetKind::PythonExtension => &self.python_extensions,
            TargetKind::Program => &self.programs,
            TargetKind::Test => &self.tests,
        }
    }

    /// Looks up a nested child document by root-relative path
    pub fn nested(&self, path: &str) -> Option<&DirectoryDocument> {
        crate::paths::segments(path)
            .into_iter()
            .try_fold(self, |doc, segment| match &doc.subdirectories {
                Some(Subdirectories::Nested(children)) => children.get(segment),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// One document per directory, each listing its children by name
    PerDirectory,
    /// One document with every child embedded
    Nested,
}

/// Builds the document for `node`
pub fn render_node(
    tree: &BuildTree,
    node: NodeId,
    mode: EmitMode,
    conventions: &Conventions,
) -> Result<DirectoryDocument> {
    let build_node = tree.node(node);
    let mut document = DirectoryDocument::default();

    if let Some(parent) = build_node.parent {
        if build_node.module != tree.node(parent).module {
            document.project = build_node.module.clone();
        }
    }
    document.project_include_path = build_node.include_paths.clone().unwrap_or_default();

    if !build_node.subdirectories.is_empty() {
        document.subdirectories = Some(match mode {
            EmitMode::PerDirectory => {
                Subdirectories::Names(build_node.subdirectories.keys().cloned().collect())
            }
            EmitMode::Nested => Subdirectories::Nested(
                build_node
                    .subdirectories
                    .iter()
                    .map(|(name, child)| -> Result<(String, DirectoryDocument)> {
                        Ok((name.clone(), render_node(tree, *child, mode, conventions)?))
                    })
                    .collect::<Result<_>>()?,
            ),
        });
    }

    document.libtbx_refresh = build_node.generated_files.clone();

    for id in &build_node.targets {
        let target = tree.target(*id);
        let kind = target.kind(conventions)?;
        document
            .section_mut(kind)
            .push(target.describe(tree.module_root()));
    }

    Ok(document)
}

/// A rendered document and where it goes, relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub path: PathBuf,
    pub document: DirectoryDocument,
}

/// Renders the whole tree without touching the file system.
///
/// Classification errors surface here, before anything is written.
pub fn render(
    tree: &BuildTree,
    mode: EmitMode,
    filename: &str,
    conventions: &Conventions,
) -> Result<Vec<RenderedDocument>> {
    match mode {
        EmitMode::Nested => Ok(vec![RenderedDocument {
            path: PathBuf::from(filename),
            document: render_node(tree, tree.root(), mode, conventions)?,
        }]),
        EmitMode::PerDirectory => tree
            .collect()
            .into_iter()
            .map(|node| -> Result<RenderedDocument> {
                Ok(RenderedDocument {
                    path: Path::new(&tree.node(node).path).join(filename),
                    document: render_node(tree, node, mode, conventions)?,
                })
            })
            .collect(),
    }
}

pub fn to_yaml(document: &DirectoryDocument) -> anyhow::Result<String> {
    serde_yaml::to_string(document).context("Failed to serialize dependency document")
}

/// Writes rendered documents below `target_dir`, creating directories as
/// needed. Everything is serialized before the first write.
pub fn write_documents<F: FileSystem + ?Sized>(
    fs: &F,
    target_dir: &Path,
    documents: &[RenderedDocument],
) -> anyhow::Result<()> {
    let serialized = documents
        .iter()
        .map(|d| -> anyhow::Result<(PathBuf, String)> {
            Ok((target_dir.join(normalize_relative(&d.path)), to_yaml(&d.document)?))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for (path, content) in &serialized {
        if let Some(parent) = path.parent() {
            fs.create_dir_all(parent)?;
        }
        fs.write(path, content)?;
        debug!(path = %path.display(), "Wrote dependency document");
    }

    info!(
        count = serialized.len(),
        "Wrote dependency documents to {}",
        target_dir.display()
    );
    Ok(())
}

/// Drops the `.` a root-level document path starts with
fn normalize_relative(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::model::Target;
    use crate::resolve::ModuleRoot;

    fn sample_tree() -> BuildTree {
        let conventions = Conventions::default();
        let root = ModuleRoot::explicit("/r", ["/r/mod1/a.cc"]).unwrap();
        let mut tree = BuildTree::new(root, "cctbx_project");
        let targets = [
            ("lib/libmod1.so", "mod1", &["foo"][..]),
            ("lib/libmod1_static.a", "mod1", &[][..]),
            ("lib/mod1_ext.so", "mod1/ext", &["boost_python"][..]),
            ("mod1_tool", "mod1", &[][..]),
            ("tst_mod1", "mod1/tests", &[][..]),
        ];
        for (output, path, libraries) in targets {
            tree.insert(
                Target::from_output(output, &conventions)
                    .with_sources(vec![format!("/r/{}/x.cc", path)])
                    .with_libraries(libraries.iter().copied(), std::iter::empty(), &conventions)
                    .with_location(Some("mod1".to_string()), Some(path.to_string())),
            );
        }
        tree
    }

    #[test]
    fn test_render_groups_by_kind() {
        let tree = sample_tree();
        let conventions = Conventions::default();
        let node = tree.find("mod1").unwrap();
        let doc = render_node(&tree, node, EmitMode::PerDirectory, &conventions).unwrap();

        assert_eq!(doc.project.as_deref(), Some("mod1"));
        assert_eq!(doc.shared_libraries.len(), 1);
        assert_eq!(doc.shared_libraries[0].name, "mod1");
        assert_eq!(doc.shared_libraries[0].sources, vec!["x.cc"]);
        assert_eq!(doc.static_libraries[0].name, "mod1_static");
        assert_eq!(doc.programs[0].name, "mod1_tool");
        assert!(doc.tests.is_empty());
        assert_eq!(
            doc.subdirectories,
            Some(Subdirectories::Names(vec!["ext".to_string(), "tests".to_string()]))
        );
    }

    #[test]
    fn test_project_only_at_module_boundary() {
        let tree = sample_tree();
        let conventions = Conventions::default();
        let root = render_node(&tree, tree.root(), EmitMode::PerDirectory, &conventions).unwrap();
        assert_eq!(root.project, None);

        let ext = render_node(&tree, tree.find("mod1/ext").unwrap(), EmitMode::PerDirectory, &conventions)
            .unwrap();
        assert_eq!(ext.project, None);
        assert_eq!(ext.python_extensions[0].name, "mod1_ext");
    }

    #[test]
    fn test_nested_mode() {
        let tree = sample_tree();
        let conventions = Conventions::default();
        let docs = render(&tree, EmitMode::Nested, "AutoBuildDeps.yaml", &conventions).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, PathBuf::from("AutoBuildDeps.yaml"));

        let tests = docs[0].document.nested("mod1/tests").unwrap();
        assert_eq!(tests.tests[0].name, "tst_mod1");
    }

    #[test]
    fn test_per_directory_paths() {
        let tree = sample_tree();
        let docs = render(&tree, EmitMode::PerDirectory, "deps.yaml", &Conventions::default()).unwrap();
        let paths: Vec<PathBuf> = docs.into_iter().map(|d| d.path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("./deps.yaml"),
                PathBuf::from("mod1/deps.yaml"),
                PathBuf::from("mod1/ext/deps.yaml"),
                PathBuf::from("mod1/tests/deps.yaml"),
            ]
        );
    }

    #[test]
    fn test_yaml_keys() {
        let tree = sample_tree();
        let node = tree.find("mod1/tests").unwrap();
        let doc = render_node(&tree, node, EmitMode::PerDirectory, &Conventions::default()).unwrap();
        let yaml = to_yaml(&doc).unwrap();
        assert_eq!(yaml, "tests:\n- name: tst_mod1\n  sources:\n  - x.cc\n");
    }

    #[test]
    fn test_write_documents() {
        let fs = MockFileSystem::new();
        let tree = sample_tree();
        let docs = render(&tree, EmitMode::PerDirectory, "deps.yaml", &Conventions::default()).unwrap();
        write_documents(&fs, Path::new("/out"), &docs).unwrap();

        let written = fs.read_to_string(Path::new("/out/mod1/ext/deps.yaml")).unwrap();
        let doc: DirectoryDocument = serde_yaml::from_str(&written).unwrap();
        assert_eq!(doc.python_extensions[0].dependencies, vec!["boost_python"]);
        assert!(fs.exists(Path::new("/out/deps.yaml")));
    }
}
