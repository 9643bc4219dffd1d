//! Graph reconstruction, module root and ownership inference

pub mod graph;
pub mod ownership;
pub mod root;

pub use graph::BuildGraph;
pub use ownership::{derive_module, source_directory, ModuleMap};
pub use root::ModuleRoot;
