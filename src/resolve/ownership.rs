//! Source directory and module ownership of link targets

use crate::model::Conventions;
use crate::paths;
use std::collections::{BTreeMap, BTreeSet};

/// Single directory the absolute `sources` of one target live in.
///
/// Several contributing directories collapse to their deepest common
/// ancestor. Build-generated (relative) sources are ignored, so a target
/// with no absolute sources has no directory at all.
pub fn source_directory<'a, I>(sources: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut directories: Vec<String> = sources
        .into_iter()
        .filter(|s| paths::is_absolute(s))
        .map(paths::dirname)
        .collect();
    directories.sort();
    directories.dedup();

    match directories.len() {
        0 => None,
        1 => directories.pop(),
        _ => Some(paths::common_ancestor(directories.iter().map(String::as_str))),
    }
}

/// Owning module of a root-relative directory, with the module's canonical
/// path.
///
/// Under the nested-root marker the module is one segment deeper, so
/// `cctbx_project/scitbx/array` belongs to `scitbx` at `cctbx_project/scitbx`.
pub fn derive_module(relative: &str, conventions: &Conventions) -> Option<(String, String)> {
    let parts = paths::segments(relative);
    let first = *parts.first()?;
    if conventions.is_nested_root_marker(first) {
        let module = *parts.get(1)?;
        Some((module.to_string(), format!("{}/{}", first, module)))
    } else {
        Some((first.to_string(), first.to_string()))
    }
}

/// Known modules and their canonical root-relative paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleMap {
    paths: BTreeMap<String, String>,
    /// Modules recorded from the transcript, as opposed to seeded ones
    derived: BTreeSet<String>,
}

impl ModuleMap {
    /// Starts from the configured extra modules; they are only used if
    /// something refers to them.
    pub fn new(conventions: &Conventions) -> Self {
        Self {
            paths: conventions.extra_modules.clone(),
            derived: BTreeSet::new(),
        }
    }

    pub fn record(&mut self, module: &str, path: &str) {
        self.paths.insert(module.to_string(), path.to_string());
        self.derived.insert(module.to_string());
    }

    pub fn path(&self, module: &str) -> Option<&str> {
        self.paths.get(module).map(String::as_str)
    }

    pub fn contains(&self, module: &str) -> bool {
        self.paths.contains_key(module)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.paths.iter().map(|(m, p)| (m.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of modules found in the transcript, seeded extras excluded
    pub fn derived_len(&self) -> usize {
        self.derived.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_directory() {
        let dir = source_directory(["/r/mod1/a.cc", "/r/mod1/b.cc", "gen/c.cc"]);
        assert_eq!(dir.as_deref(), Some("/r/mod1"));
    }

    #[test]
    fn test_sibling_directories_collapse() {
        let dir = source_directory(["/r/mod1/x/a.cc", "/r/mod1/y/b.cc"]);
        assert_eq!(dir.as_deref(), Some("/r/mod1"));

        // Segment-wise, not character-wise
        let dir = source_directory(["/r/mod1/ab/a.cc", "/r/mod1/ac/b.cc"]);
        assert_eq!(dir.as_deref(), Some("/r/mod1"));
    }

    #[test]
    fn test_generated_only() {
        assert_eq!(source_directory(["gen/a.cc", "b.cc"]), None);
        assert_eq!(source_directory(std::iter::empty()), None);
    }

    #[test]
    fn test_derive_module() {
        let conventions = Conventions::default();
        assert_eq!(
            derive_module("dials/algorithms/spot", &conventions),
            Some(("dials".to_string(), "dials".to_string()))
        );
        assert_eq!(
            derive_module("cctbx_project/scitbx/array", &conventions),
            Some(("scitbx".to_string(), "cctbx_project/scitbx".to_string()))
        );
        assert_eq!(derive_module("cctbx_project", &conventions), None);
        assert_eq!(derive_module(".", &conventions), None);
    }

    #[test]
    fn test_module_map_includes_extras() {
        let mut map = ModuleMap::new(&Conventions::default());
        assert_eq!(map.path("annlib"), Some("annlib"));
        assert!(!map.contains("dials"));

        map.record("dials", "dials");
        assert_eq!(map.path("dials"), Some("dials"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_module_map_derived_len_skips_extras() {
        let mut map = ModuleMap::new(&Conventions::default());
        assert_eq!(map.len(), 2);
        assert_eq!(map.derived_len(), 0);

        map.record("dials", "dials");
        map.record("dials", "dials");
        assert_eq!(map.derived_len(), 1);

        // Found in the transcript as well as seeded
        map.record("annlib", "annlib");
        assert_eq!(map.derived_len(), 2);
        assert_eq!(map.len(), 3);
    }
}
