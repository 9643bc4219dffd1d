//! FileSystem trait definition

use anyhow::Result;
use std::path::Path;
use std::time::SystemTime;

/// Abstraction over the file operations the resolver needs
///
/// Transcripts, override documents and the parse cache are read through it,
/// and emitted dependency documents are written through it.
pub trait FileSystem: Send + Sync {
    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Last modification time of a file
    fn modified(&self, path: &Path) -> Result<SystemTime>;

    /// Create or truncate a file with the given contents
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Returns true if `path` exists and was modified after `reference`
    fn is_newer_than(&self, path: &Path, reference: &Path) -> bool {
        match (self.modified(path), self.modified(reference)) {
            (Ok(a), Ok(b)) => a > b,
            _ => false,
        }
    }
}
