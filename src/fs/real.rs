use super::FileSystem;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .context(format!("Failed to get modification time for {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).context(format!("Failed to write file {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).context(format!("Failed to create directory {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem::new();
        let path = temp.path().join("a/b/out.yaml");

        fs.create_dir_all(path.parent().unwrap()).unwrap();
        fs.write(&path, "name: foo\n").unwrap();

        assert!(fs.exists(&path));
        assert!(fs.is_file(&path));
        assert_eq!(fs.read_to_string(&path).unwrap(), "name: foo\n");
    }

    #[test]
    fn test_read_missing_file() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem::new();

        let err = fs.read_to_string(&temp.path().join("missing.log")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_is_newer_than() {
        let temp = TempDir::new().unwrap();
        let fs = RealFileSystem::new();
        let old = temp.path().join("build.log");
        let new = temp.path().join("cache.json");
        std::fs::write(&old, "g++ -c a.cc").unwrap();
        std::fs::write(&new, "{}").unwrap();

        filetime::set_file_mtime(&old, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        filetime::set_file_mtime(&new, FileTime::from_unix_time(2_000_000, 0)).unwrap();

        assert!(fs.is_newer_than(&new, &old));
        assert!(!fs.is_newer_than(&old, &new));
        assert!(!fs.is_newer_than(&temp.path().join("missing"), &old));
    }
}
