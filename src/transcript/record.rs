//! Structured invocation records
//!
//! The parser produces one typed invocation per tool. Each is then reshaped
//! into a [`CommandRecord`], the uniform shape consumed by the graph
//! resolver: archiver and direct-linker calls become link records with no
//! defines and `compile_only = false`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Compiler,
    Archiver,
    Linker,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Compiler => "compiler",
            ToolKind::Archiver => "archiver",
            ToolKind::Linker => "linker",
        }
    }
}

/// One parsed invocation, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub tool: ToolKind,
    pub output: String,
    pub sources: Vec<String>,
    pub include_dirs: Vec<String>,
    pub defines: Vec<String>,
    pub libraries: Vec<String>,
    pub library_dirs: Vec<String>,
    pub frameworks: Vec<String>,
    /// Compile and assemble only, no link step
    pub compile_only: bool,
    /// Warning, optimisation and codegen switches, kept verbatim
    pub flags: Vec<String>,
}

impl CommandRecord {
    pub fn is_compile(&self) -> bool {
        self.compile_only
    }

    pub fn is_link(&self) -> bool {
        !self.compile_only
    }
}

/// A compiler front-end call (`g++`, `gcc`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerInvocation {
    pub output: String,
    pub sources: Vec<String>,
    pub include_dirs: Vec<String>,
    pub defines: Vec<String>,
    pub libraries: Vec<String>,
    pub library_dirs: Vec<String>,
    pub frameworks: Vec<String>,
    pub compile_only: bool,
    pub flags: Vec<String>,
}

/// A direct `ld` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerInvocation {
    pub output: String,
    pub sources: Vec<String>,
    pub libraries: Vec<String>,
    pub frameworks: Vec<String>,
    pub flags: Vec<String>,
}

/// An `ar rc <archive> <members>...` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiverInvocation {
    pub archive: String,
    pub members: Vec<String>,
}

impl From<CompilerInvocation> for CommandRecord {
    fn from(inv: CompilerInvocation) -> Self {
        Self {
            tool: ToolKind::Compiler,
            output: inv.output,
            sources: inv.sources,
            include_dirs: inv.include_dirs,
            defines: inv.defines,
            libraries: inv.libraries,
            library_dirs: inv.library_dirs,
            frameworks: inv.frameworks,
            compile_only: inv.compile_only,
            flags: inv.flags,
        }
    }
}

impl From<LinkerInvocation> for CommandRecord {
    fn from(inv: LinkerInvocation) -> Self {
        Self {
            tool: ToolKind::Linker,
            output: inv.output,
            sources: inv.sources,
            include_dirs: Vec::new(),
            defines: Vec::new(),
            libraries: inv.libraries,
            library_dirs: Vec::new(),
            frameworks: inv.frameworks,
            compile_only: false,
            flags: inv.flags,
        }
    }
}

impl From<ArchiverInvocation> for CommandRecord {
    fn from(inv: ArchiverInvocation) -> Self {
        Self {
            tool: ToolKind::Archiver,
            output: inv.archive,
            sources: inv.members,
            include_dirs: Vec::new(),
            defines: Vec::new(),
            libraries: Vec::new(),
            library_dirs: Vec::new(),
            frameworks: Vec::new(),
            compile_only: false,
            flags: Vec::new(),
        }
    }
}
