//! Module root inference

use crate::error::{ResolveError, Result};
use crate::paths;
use std::fmt;

/// Absolute directory every compiled source lives under, kept with a
/// trailing separator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRoot(String);

impl ModuleRoot {
    /// Longest common prefix of the directories of `sources`.
    ///
    /// The prefix is compared character by character; one that stops partway
    /// through a directory name is rejected rather than trimmed back.
    pub fn infer<'a, I>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let directories: Vec<String> = sources
            .into_iter()
            .filter(|s| paths::is_absolute(s))
            .map(|s| with_separator(&paths::dirname(s)))
            .collect();

        if directories.is_empty() {
            return Err(ResolveError::NoAbsoluteSources);
        }

        let prefix = paths::common_prefix(directories.iter().map(String::as_str));
        if !prefix.ends_with('/') {
            return Err(ResolveError::PartialRoot { prefix });
        }
        Ok(Self(prefix))
    }

    /// Uses `root` as given, checking that it contains every absolute source
    pub fn explicit<'a, I>(root: &str, sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if !paths::is_absolute(root) {
            return Err(ResolveError::PartialRoot {
                prefix: root.to_string(),
            });
        }
        let root = Self(with_separator(&paths::normalize(root)));

        for source in sources.into_iter().filter(|s| paths::is_absolute(s)) {
            if !paths::normalize(source).starts_with(&root.0) {
                return Err(ResolveError::RootMismatch {
                    root: root.0.clone(),
                    source_path: source.to_string(),
                });
            }
        }
        Ok(root)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root-relative form of an absolute directory, `.` for the root itself
    pub fn relative(&self, directory: &str) -> String {
        paths::relative_to(directory, &self.0)
    }

    /// Absolute form of a root-relative path
    pub fn join(&self, relative: &str) -> String {
        paths::join(&self.0, relative)
    }
}

impl fmt::Display for ModuleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn with_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
