//! autodeps - build dependency reconstruction from compiler build logs
//!
//! This library rebuilds the structure of an already-built native code tree
//! from nothing more than the transcript of its compiler, archiver and linker
//! invocations, and emits one normalized dependency document per source
//! directory for a project-file generator to consume.
//!
//! # Core Concepts
//!
//! - **Transcript**: the captured build log, one invocation per line
//! - **Command records**: parsed invocations, either compiles (one object)
//!   or links (one executable, library or archive)
//! - **Module root**: the deepest directory containing every compiled source
//! - **Build tree**: one node per source directory, holding the targets
//!   built from it
//! - **Overrides**: manual corrections merged into the tree after assembly
//!
//! # Example Usage
//!
//! ```no_run
//! use autodeps::model::Conventions;
//! use autodeps::pipeline::Resolver;
//! use autodeps::tree::{EmitMode, OverrideDocument};
//!
//! # fn main() -> Result<(), autodeps::ResolveError> {
//! let conventions = Conventions::default();
//! let log = std::fs::read_to_string("build.log").unwrap_or_default();
//! let records = autodeps::transcript::parse(&log, &conventions)?;
//!
//! let resolution = Resolver::new(&conventions).resolve(records, &OverrideDocument::default())?;
//! resolution.report.log_summary();
//!
//! for rendered in resolution.render(EmitMode::PerDirectory, "AutoBuildDeps.yaml", &conventions)? {
//!     println!("{}", rendered.path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`transcript`]: classification, parsing and parse caching
//! - [`resolve`]: object → target graph, module root and ownership
//! - [`model`]: naming conventions and targets
//! - [`tree`]: tree assembly, overrides and document output
//! - [`pipeline`]: the stages wired together

pub mod cli;
pub mod config;
pub mod error;
pub mod fs;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod resolve;
pub mod transcript;
pub mod tree;
pub mod util;

pub use config::{AutodepsConfig, ConfigError};
pub use error::ResolveError;
pub use model::{Conventions, Target, TargetKind};
pub use pipeline::{Resolution, ResolveReport, ResolveWarning, Resolver};
pub use tree::{BuildTree, DirectoryDocument, EmitMode, OverrideDocument};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
