use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct MockEntry {
    pub content: Option<String>,
    pub modified: SystemTime,
}

/// In-memory file system with a logical clock
///
/// Every write advances the clock by one second, so a file written later is
/// always newer than one written earlier.
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, MockEntry>>,
    clock: RwLock<u64>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            clock: RwLock::new(0),
            root,
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let modified = self.tick();
        let mut files = self.files.write().unwrap();

        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent, modified);
        }

        files.insert(
            path,
            MockEntry {
                content: Some(content.to_string()),
                modified,
            },
        );
    }

    /// Marks a file as modified now, leaving its content untouched
    pub fn touch(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let modified = self.tick();
        if let Some(entry) = self.files.write().unwrap().get_mut(&path) {
            entry.modified = modified;
        }
    }

    /// Paths of every file (not directory), sorted
    pub fn files(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .files
            .read()
            .unwrap()
            .iter()
            .filter(|(_, e)| e.content.is_some())
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    fn tick(&self) -> SystemTime {
        let mut clock = self.clock.write().unwrap();
        *clock += 1;
        UNIX_EPOCH + Duration::from_secs(*clock)
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn ensure_parents(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, modified: SystemTime) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(MockEntry {
                content: None,
                modified,
            });
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files.read().unwrap().contains_key(&path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.content.is_some())
            .unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        let entry = files
            .get(&path)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))?;

        entry
            .content
            .clone()
            .ok_or_else(|| anyhow!("Not a file: {:?}", path))
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let path = self.normalize_path(path);
        self.files
            .read()
            .unwrap()
            .get(&path)
            .map(|e| e.modified)
            .ok_or_else(|| anyhow!("Path not found: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let path = self.normalize_path(path);
        let parent_exists = path
            .parent()
            .map(|p| self.files.read().unwrap().contains_key(p) || p == self.root)
            .unwrap_or(true);
        if !parent_exists {
            return Err(anyhow!("Parent directory missing for {:?}", path));
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = self.normalize_path(path);
        let modified = self.tick();
        Self::ensure_parents(&mut self.files.write().unwrap(), &path, modified);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("build.log", "g++ -c a.cc");

        assert!(fs.exists(Path::new("/mock/build.log")));
        assert!(fs.is_file(Path::new("/mock/build.log")));
        assert!(fs.exists(Path::new("/mock")));
        assert!(!fs.is_file(Path::new("/mock")));
    }

    #[test]
    fn test_read_to_string() {
        let fs = MockFileSystem::new();
        fs.add_file("build.log", "hello world");

        let content = fs.read_to_string(Path::new("/mock/build.log")).unwrap();
        assert_eq!(content, "hello world");
    }

    #[test]
    fn test_later_writes_are_newer() {
        let fs = MockFileSystem::new();
        fs.add_file("build.log", "a");
        fs.add_file("cache.json", "b");

        assert!(fs.is_newer_than(Path::new("cache.json"), Path::new("build.log")));

        fs.touch("build.log");
        assert!(!fs.is_newer_than(Path::new("cache.json"), Path::new("build.log")));
    }

    #[test]
    fn test_write_requires_parent() {
        let fs = MockFileSystem::new();
        assert!(fs.write(Path::new("/out/a/Deps.yaml"), "x").is_err());

        fs.create_dir_all(Path::new("/out/a")).unwrap();
        fs.write(Path::new("/out/a/Deps.yaml"), "x").unwrap();
        assert_eq!(fs.files(), vec![PathBuf::from("/out/a/Deps.yaml")]);
    }

    #[test]
    fn test_with_root() {
        let fs = MockFileSystem::with_root(PathBuf::from("/repo"));
        fs.add_file("logs/build.log", "ar rc libx.a x.o");

        assert!(fs.exists(Path::new("/repo/logs/build.log")));
        assert!(fs.exists(Path::new("/repo/logs")));
    }
}
