//! Build tree assembly, override merging and document output

pub mod arena;
pub mod document;
pub mod overrides;

pub use arena::{BuildNode, BuildTree, NodeId, Relocation, TargetId};
pub use document::{
    render, render_node, to_yaml, write_documents, DirectoryDocument, EmitMode, RenderedDocument,
    Subdirectories,
};
pub use overrides::{OneOrMany, OverrideDocument};
