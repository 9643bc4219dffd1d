//! Link-produced targets and their classification

use super::conventions::Conventions;
use crate::error::{ResolveError, Result};
use crate::paths;
use crate::resolve::ModuleRoot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Output category of a target, one per document section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    StaticLibrary,
    SharedLibrary,
    PythonExtension,
    Program,
    Test,
}

impl TargetKind {
    /// Document key for targets of this kind
    pub fn section(&self) -> &'static str {
        match self {
            TargetKind::StaticLibrary => "static_libraries",
            TargetKind::SharedLibrary => "shared_libraries",
            TargetKind::PythonExtension => "python_extensions",
            TargetKind::Program => "programs",
            TargetKind::Test => "tests",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetKind::StaticLibrary => "static library",
            TargetKind::SharedLibrary => "shared library",
            TargetKind::PythonExtension => "python extension",
            TargetKind::Program => "program",
            TargetKind::Test => "test",
        };
        f.write_str(name)
    }
}

/// An executable, library or archive produced by a link record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Output basename without library prefix or extension
    pub name: String,
    /// Library prefix stripped from the name, empty if none
    pub prefix: String,
    /// Library extension, empty for executables
    pub extension: String,
    /// Directory the build wrote the output to, empty for the build root
    pub output_path: String,
    pub module: Option<String>,
    /// Root-relative source directory; `None` until placed
    pub path: Option<String>,
    pub sources: Vec<String>,
    pub libraries: BTreeSet<String>,
    pub include_paths: Option<Vec<String>>,
}

impl Target {
    /// Splits a link output path into name, prefix and extension.
    ///
    /// Only library outputs lose their extension and prefix; executables keep
    /// their basename as is.
    pub fn from_output(output: &str, conventions: &Conventions) -> Self {
        let output_path = paths::dirname(output);
        let filename = paths::basename(output);

        let (name, prefix, extension) = match conventions.library_extension(filename) {
            Some(extension) => {
                let stem = &filename[..filename.len() - extension.len()];
                let (name, prefix) = conventions.strip_library_prefix(stem);
                (name, prefix, extension)
            }
            None => (filename, "", ""),
        };

        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
            output_path,
            module: None,
            path: None,
            sources: Vec::new(),
            libraries: BTreeSet::new(),
            include_paths: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    /// Declared `-l` names minus filtered system libraries, plus frameworks
    pub fn with_libraries<'a, L, F>(
        mut self,
        libraries: L,
        frameworks: F,
        conventions: &Conventions,
    ) -> Self
    where
        L: IntoIterator<Item = &'a str>,
        F: IntoIterator<Item = &'a str>,
    {
        self.libraries = libraries
            .into_iter()
            .filter(|l| !conventions.is_filtered_library(l))
            .chain(frameworks)
            .map(str::to_string)
            .collect();
        self
    }

    pub fn with_location(mut self, module: Option<String>, path: Option<String>) -> Self {
        self.module = module;
        self.path = path;
        self
    }

    /// On-disk filename the build produced
    pub fn file_name(&self) -> String {
        format!("{}{}{}", self.prefix, self.name, self.extension)
    }

    pub fn is_library(&self, conventions: &Conventions) -> bool {
        conventions.is_library_extension(&self.extension)
    }

    pub fn is_static_library(&self, conventions: &Conventions) -> bool {
        conventions.is_static_extension(&self.extension)
    }

    /// Python extensions are unprefixed libraries linking the binding library
    pub fn is_python_extension(&self, conventions: &Conventions) -> bool {
        self.is_library(conventions)
            && self.prefix.is_empty()
            && self.libraries.contains(&conventions.python_binding_library)
    }

    /// Executables carry no extension at all
    pub fn is_executable(&self, conventions: &Conventions) -> bool {
        !self.is_library(conventions) && self.extension.is_empty()
    }

    pub fn is_test(&self, conventions: &Conventions) -> bool {
        self.is_executable(conventions) && conventions.is_test_name(&self.name)
    }

    pub fn kind(&self, conventions: &Conventions) -> Result<TargetKind> {
        if self.is_library(conventions) {
            if self.is_static_library(conventions) {
                Ok(TargetKind::StaticLibrary)
            } else if self.is_python_extension(conventions) {
                Ok(TargetKind::PythonExtension)
            } else {
                Ok(TargetKind::SharedLibrary)
            }
        } else if self.is_test(conventions) {
            Ok(TargetKind::Test)
        } else if self.is_executable(conventions) {
            Ok(TargetKind::Program)
        } else {
            Err(ResolveError::Unclassifiable {
                name: self.name.clone(),
                extension: self.extension.clone(),
            })
        }
    }

    /// Serializable form, with hard-coded sources relative to the target's
    /// own directory
    pub fn describe(&self, root: &ModuleRoot) -> TargetRecord {
        let directory = root.join(self.path.as_deref().unwrap_or("."));
        let (absolute, generated): (Vec<&String>, Vec<&String>) =
            self.sources.iter().partition(|s| paths::is_absolute(s));

        TargetRecord {
            name: self.name.clone(),
            sources: absolute
                .into_iter()
                .map(|s| paths::relative_to(s, &directory))
                .collect(),
            generated_sources: generated.into_iter().cloned().collect(),
            location: (!self.output_path.is_empty()).then(|| self.output_path.clone()),
            include_paths: self.include_paths.clone().unwrap_or_default(),
            dependencies: self.libraries.iter().cloned().collect(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path)?;
        }
        Ok(())
    }
}

/// One entry of a document's target list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated_sources: Vec<String>,
    /// Output subdirectory, when not the build root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}
