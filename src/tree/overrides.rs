//! Manual corrections merged into the assembled tree
//!
//! ```yaml
//! dependencies:
//!   dials_algorithms: [cctbx, scitbx_boost_python]
//! libtbx_refresh:
//!   dials: [dials_version.h]
//! forced_locations:
//!   mytool: newdir/sub
//! target_includes:
//!   annlib: annlib/include
//! ```
//!
//! Every name must resolve; an entry that matches nothing aborts the run.

use super::arena::BuildTree;
use crate::error::{ResolveError, Result};
use crate::resolve::ModuleMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

fn deserialize_null_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// A single value or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }

    fn to_vec(&self) -> Vec<String> {
        self.clone().into_vec()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideDocument {
    /// Target name → extra library names
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub dependencies: BTreeMap<String, OneOrMany>,
    /// Module name → generated files
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub libtbx_refresh: BTreeMap<String, OneOrMany>,
    /// Target name → root-relative directory
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub forced_locations: BTreeMap<String, String>,
    /// Target or module name → include paths
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub target_includes: BTreeMap<String, OneOrMany>,
}

impl OverrideDocument {
    /// Parses a YAML document; an empty or null document overrides nothing.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let document: Option<Self> = serde_yaml::from_str(content)?;
        Ok(document.unwrap_or_default())
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
            && self.libtbx_refresh.is_empty()
            && self.forced_locations.is_empty()
            && self.target_includes.is_empty()
    }

    /// Applies every section to `tree`, stopping at the first unknown name.
    ///
    /// Sections run in a fixed order: dependencies, generated files, forced
    /// locations, then include paths.
    pub fn apply(&self, tree: &mut BuildTree, modules: &ModuleMap) -> Result<()> {
        for (name, libraries) in &self.dependencies {
            let id = tree
                .find_target(name)
                .ok_or_else(|| ResolveError::UnknownOverrideTarget {
                    section: "dependencies",
                    name: name.clone(),
                })?;
            debug!(name = %name, "Adding manual dependencies");
            tree.target_mut(id).libraries.extend(libraries.to_vec());
        }

        for (module, files) in &self.libtbx_refresh {
            let path = modules
                .path(module)
                .ok_or_else(|| ResolveError::UnknownOverrideModule {
                    section: "libtbx_refresh",
                    name: module.clone(),
                })?;
            let node = tree.get_or_create(path);
            tree.node_mut(node).generated_files = files.to_vec();
        }

        for (name, path) in &self.forced_locations {
            let id = tree
                .find_target(name)
                .ok_or_else(|| ResolveError::UnknownOverrideTarget {
                    section: "forced_locations",
                    name: name.clone(),
                })?;
            info!("Override: Moving {} to {}", name, path);
            tree.relocate(id, path);
        }

        for (name, paths) in &self.target_includes {
            if let Some(id) = tree.find_target(name) {
                tree.target_mut(id).include_paths = Some(paths.to_vec());
            } else if let Some(path) = modules.path(name) {
                let node = tree.get_or_create(path);
                tree.node_mut(node).include_paths = Some(paths.to_vec());
            } else {
                return Err(ResolveError::UnknownIncludeTarget { name: name.clone() });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Conventions, Target};
    use crate::resolve::ModuleRoot;

    fn fixture() -> (BuildTree, ModuleMap) {
        let conventions = Conventions::default();
        let root = ModuleRoot::infer(["/r/dials/a.cc"]).unwrap();
        let mut tree = BuildTree::new(root, "cctbx_project");
        for (output, path) in [("libdials.so", "dials"), ("mytool", "dials/util")] {
            tree.insert(
                Target::from_output(output, &conventions)
                    .with_location(Some("dials".to_string()), Some(path.to_string())),
            );
        }
        let mut modules = ModuleMap::new(&conventions);
        modules.record("dials", "dials");
        (tree, modules)
    }

    #[test]
    fn test_empty_documents() {
        assert!(OverrideDocument::from_yaml("").unwrap().is_empty());
        assert!(OverrideDocument::from_yaml("~\n").unwrap().is_empty());
        assert!(OverrideDocument::from_yaml("dependencies:\n").unwrap().is_empty());
    }

    #[test]
    fn test_single_value_or_list() {
        let doc = OverrideDocument::from_yaml(
            "dependencies:\n  dials: cctbx\n  mytool: [a, b]\ntarget_includes:\n  dials: inc\n",
        )
        .unwrap();
        assert_eq!(doc.dependencies["dials"].to_vec(), vec!["cctbx"]);
        assert_eq!(doc.dependencies["mytool"].to_vec(), vec!["a", "b"]);
        assert_eq!(doc.target_includes["dials"].to_vec(), vec!["inc"]);
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            OverrideDocument::from_yaml("forced_locations: [1, 2]"),
            Err(ResolveError::OverrideDocument(_))
        ));
    }

    #[test]
    fn test_apply_dependencies() {
        let (mut tree, modules) = fixture();
        let doc = OverrideDocument::from_yaml("dependencies:\n  mytool: [dials, boost_python]\n").unwrap();
        doc.apply(&mut tree, &modules).unwrap();

        let id = tree.find_target("mytool").unwrap();
        let libraries: Vec<&String> = tree.target(id).libraries.iter().collect();
        assert_eq!(libraries, vec!["boost_python", "dials"]);
    }

    #[test]
    fn test_apply_forced_location() {
        let (mut tree, modules) = fixture();
        let doc = OverrideDocument::from_yaml("forced_locations:\n  mytool: newdir/sub\n").unwrap();
        doc.apply(&mut tree, &modules).unwrap();

        let id = tree.find_target("mytool").unwrap();
        let old = tree.find("dials/util").unwrap();
        let new = tree.find("newdir/sub").unwrap();
        assert!(!tree.node(old).targets.contains(&id));
        assert_eq!(tree.node(new).targets, vec![id]);
    }

    #[test]
    fn test_apply_refresh_and_includes() {
        let (mut tree, modules) = fixture();
        let doc = OverrideDocument::from_yaml(
            "libtbx_refresh:\n  dials: [gen.h]\ntarget_includes:\n  libdials: x\n  dials: [a, b]\n  annlib: include\n",
        );
        // `libdials` is neither a target name nor a module
        assert!(matches!(
            doc.unwrap().apply(&mut tree, &modules),
            Err(ResolveError::UnknownIncludeTarget { ref name }) if name == "libdials"
        ));

        let (mut tree, modules) = fixture();
        let doc = OverrideDocument::from_yaml(
            "libtbx_refresh:\n  dials: [gen.h]\ntarget_includes:\n  dials: [a, b]\n  annlib: include\n",
        )
        .unwrap();
        doc.apply(&mut tree, &modules).unwrap();

        // A target named after the module takes precedence over the module
        let dials = tree.find_target("dials").unwrap();
        assert_eq!(tree.target(dials).include_paths, Some(vec!["a".to_string(), "b".to_string()]));
        let node = tree.find("dials").unwrap();
        assert_eq!(tree.node(node).generated_files, vec!["gen.h"]);
        assert_eq!(tree.node(node).include_paths, None);

        let annlib = tree.find("annlib").unwrap();
        assert_eq!(tree.node(annlib).include_paths, Some(vec!["include".to_string()]));
    }

    #[test]
    fn test_unknown_names_are_fatal() {
        for (yaml, section) in [
            ("dependencies:\n  nothing: a\n", "dependencies"),
            ("forced_locations:\n  nothing: a\n", "forced_locations"),
        ] {
            let (mut tree, modules) = fixture();
            let err = OverrideDocument::from_yaml(yaml)
                .unwrap()
                .apply(&mut tree, &modules)
                .unwrap_err();
            assert!(matches!(
                err,
                ResolveError::UnknownOverrideTarget { section: s, .. } if s == section
            ));
        }

        let (mut tree, modules) = fixture();
        let err = OverrideDocument::from_yaml("libtbx_refresh:\n  nothing: [a]\n")
            .unwrap()
            .apply(&mut tree, &modules)
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownOverrideModule { .. }));
    }
}
