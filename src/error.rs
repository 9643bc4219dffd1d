//! Error types for transcript resolution
//!
//! Every variant is fatal: the run stops at the first one and no output is
//! written. Recoverable conditions are reported through
//! [`crate::pipeline::ResolveWarning`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// An invocation line does not match its tool's option grammar
    #[error("Failed to parse {tool} invocation ({reason}): {line}")]
    Parse {
        tool: &'static str,
        reason: String,
        line: String,
    },

    /// Archiver called with something other than replace/create
    #[error("Unsupported archiver mode '{mode}' (only 'rc' is supported): {line}")]
    UnsupportedArchiveMode { mode: String, line: String },

    /// Invocation without an output path
    #[error("{tool} invocation has no output file: {line}")]
    MissingOutput { tool: &'static str, line: String },

    /// A link input that no recorded invocation produces
    #[error("No producer for input '{input}' of link target '{target}'")]
    UnresolvedInput { target: String, input: String },

    #[error("No absolute compiled sources found; cannot infer a module root")]
    NoAbsoluteSources,

    /// Common source prefix that splits a path component
    #[error("Common source prefix '{prefix}' does not end at a directory boundary")]
    PartialRoot { prefix: String },

    /// Explicit root that does not contain every compiled source
    #[error("Module root '{root}' is not an ancestor of source '{source_path}'")]
    RootMismatch { root: String, source_path: String },

    #[error("Cannot classify target '{name}' (extension '{extension}')")]
    Unclassifiable { name: String, extension: String },

    #[error("Override section '{section}' names unknown target '{name}'")]
    UnknownOverrideTarget { section: &'static str, name: String },

    #[error("Override section '{section}' names unknown module '{name}'")]
    UnknownOverrideModule { section: &'static str, name: String },

    #[error("Name for extra includes '{name}' is neither a target nor a module")]
    UnknownIncludeTarget { name: String },

    #[error("Invalid override document: {0}")]
    OverrideDocument(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ResolveError>;
