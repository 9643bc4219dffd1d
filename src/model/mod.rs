pub mod conventions;
pub mod target;

pub use conventions::{Conventions, PrunedSubtree};
pub use target::{Target, TargetKind, TargetRecord};
