//! Build-tree naming conventions
//!
//! These rules decide module ownership, target naming and classification.
//! They mirror how the supported source trees are laid out, so the defaults
//! must be preserved exactly.

use std::collections::BTreeMap;

/// A vendored dependency that is built and supplied independently and must
/// not appear in the emitted tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunedSubtree {
    /// Top-level directory removed with everything below it
    pub directory: String,
    /// Target name removed wherever it is placed
    pub artifact: String,
}

#[derive(Debug, Clone)]
pub struct Conventions {
    /// Compiler front-end executable names
    pub compilers: Vec<String>,
    pub archiver: String,
    /// Direct linker executable name
    pub linker: String,
    /// Directory name of a bundled sub-project collection
    pub nested_root_marker: String,
    pub library_prefix: String,
    pub static_extension: String,
    pub shared_extensions: Vec<String>,
    /// Library whose presence marks a python extension module
    pub python_binding_library: String,
    /// System libraries dropped from dependency sets
    pub filtered_libraries: Vec<String>,
    /// Substrings marking an executable as a test
    pub test_markers: Vec<String>,
    pub pruned_subtree: Option<PrunedSubtree>,
    /// Modules known ahead of time, with their canonical paths
    pub extra_modules: BTreeMap<String, String>,
}

impl Default for Conventions {
    fn default() -> Self {
        Self {
            compilers: ["g++", "c++", "gcc", "cc"].map(String::from).to_vec(),
            archiver: "ar".to_string(),
            linker: "ld".to_string(),
            nested_root_marker: "cctbx_project".to_string(),
            library_prefix: "lib".to_string(),
            static_extension: ".a".to_string(),
            shared_extensions: vec![".so".to_string(), ".dylib".to_string()],
            python_binding_library: "boost_python".to_string(),
            filtered_libraries: vec!["m".to_string()],
            test_markers: vec!["tst".to_string(), "test".to_string()],
            pruned_subtree: Some(PrunedSubtree {
                directory: "boost".to_string(),
                artifact: "boost_python".to_string(),
            }),
            extra_modules: [("annlib", "annlib"), ("ccp4io", "ccp4io")]
                .into_iter()
                .map(|(name, path)| (name.to_string(), path.to_string()))
                .collect(),
        }
    }
}

impl Conventions {
    pub fn is_compiler(&self, command: &str) -> bool {
        self.compilers.iter().any(|c| c == command)
    }

    pub fn is_nested_root_marker(&self, segment: &str) -> bool {
        segment == self.nested_root_marker
    }

    /// Returns the library extension of `filename`, if it has one.
    pub fn library_extension<'a>(&'a self, filename: &str) -> Option<&'a str> {
        std::iter::once(&self.static_extension)
            .chain(self.shared_extensions.iter())
            .find(|ext| filename.len() > ext.len() && filename.ends_with(ext.as_str()))
            .map(String::as_str)
    }

    pub fn is_library_extension(&self, extension: &str) -> bool {
        extension == self.static_extension || self.shared_extensions.iter().any(|e| e == extension)
    }

    pub fn is_static_extension(&self, extension: &str) -> bool {
        extension == self.static_extension
    }

    /// Splits the platform library prefix off a library stem.
    ///
    /// `libfoo` becomes `("foo", "lib")`; a stem without the prefix is
    /// returned unchanged with an empty prefix.
    pub fn strip_library_prefix<'a>(&self, stem: &'a str) -> (&'a str, &'a str) {
        match stem.strip_prefix(self.library_prefix.as_str()) {
            Some(rest) if !rest.is_empty() => (rest, &stem[..self.library_prefix.len()]),
            _ => (stem, ""),
        }
    }

    pub fn is_test_name(&self, name: &str) -> bool {
        self.test_markers.iter().any(|marker| name.contains(marker.as_str()))
    }

    pub fn is_filtered_library(&self, library: &str) -> bool {
        self.filtered_libraries.iter().any(|l| l == library)
    }
}
