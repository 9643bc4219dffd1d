//! Parse-result caching
//!
//! Parsing a large transcript is the slow part of a run. A cache keyed by the
//! transcript path and modification time lets repeated runs against an
//! unchanged log skip it. Caching is purely an optimization: [`NoopParseCache`]
//! is always a valid choice.

use super::record::CommandRecord;
use crate::fs::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    pub transcript: PathBuf,
    pub modified: SystemTime,
}

impl CacheKey {
    pub fn for_transcript<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            transcript: path.to_path_buf(),
            modified: fs.modified(path)?,
        })
    }
}

pub trait ParseCache {
    fn get(&self, key: &CacheKey) -> Option<Vec<CommandRecord>>;

    fn put(&self, key: &CacheKey, records: &[CommandRecord]);
}

/// Never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopParseCache;

impl ParseCache for NoopParseCache {
    fn get(&self, _key: &CacheKey) -> Option<Vec<CommandRecord>> {
        None
    }

    fn put(&self, _key: &CacheKey, _records: &[CommandRecord]) {}
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: CacheKey,
    records: Vec<CommandRecord>,
}

/// JSON file holding the records of the last parsed transcript
///
/// An entry is reused only when its key matches and the cache file is newer
/// than the transcript. A stale entry is fully replaced on the next `put`.
pub struct FileParseCache<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    path: PathBuf,
}

impl<'a, F: FileSystem + ?Sized> FileParseCache<'a, F> {
    pub fn new(fs: &'a F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: FileSystem + ?Sized> ParseCache for FileParseCache<'_, F> {
    fn get(&self, key: &CacheKey) -> Option<Vec<CommandRecord>> {
        if !self.fs.is_newer_than(&self.path, &key.transcript) {
            debug!(cache = %self.path.display(), "Parse cache missing or stale");
            return None;
        }

        let content = self.fs.read_to_string(&self.path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Ignoring unreadable parse cache {:?}: {}", self.path, e);
                return None;
            }
        };

        if entry.key != *key {
            debug!(cache = %self.path.display(), "Parse cache belongs to another transcript");
            return None;
        }

        debug!(count = entry.records.len(), "Reusing cached parse results");
        Some(entry.records)
    }

    fn put(&self, key: &CacheKey, records: &[CommandRecord]) {
        let entry = CacheEntry {
            key: key.clone(),
            records: records.to_vec(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.fs.write(&self.path, &json));

        if let Err(e) = result {
            warn!("Failed to write parse cache {:?}: {}", self.path, e);
        }
    }
}
