//! Visited-clans checkpoint
//!
//! Durable record of clan tags that have already been fully processed. The
//! on-disk form is a JSON array of sorted canonical tags. Flushes are
//! write-to-temp-then-rename, so a crash mid-write leaves either the prior
//! complete file or the new complete file, never a mix.

use crate::tag;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while persisting the checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The set of clan tags already processed, with durable persistence
#[derive(Debug)]
pub struct VisitedClans {
    path: PathBuf,
    tags: BTreeSet<String>,
}

impl VisitedClans {
    /// Loads the checkpoint from `path`.
    ///
    /// A missing file yields an empty set. An unreadable or corrupt file is
    /// logged and also yields an empty set; the traversal re-derives its
    /// progress rather than refusing to start.
    pub fn load(path: &Path) -> Self {
        let tags = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Vec<String>>(&content) {
                Ok(list) => list.into_iter().map(|t| tag::canonical(&t)).collect(),
                Err(e) => {
                    tracing::warn!(
                        "Could not parse visited-clans checkpoint {}: {}, starting empty",
                        path.display(),
                        e
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => {
                tracing::warn!(
                    "Could not read visited-clans checkpoint {}: {}, starting empty",
                    path.display(),
                    e
                );
                BTreeSet::new()
            }
        };

        tracing::info!(
            "Loaded visited-clans checkpoint ({} entries)",
            tags.len()
        );

        Self {
            path: path.to_path_buf(),
            tags,
        }
    }

    /// Returns whether `clan_tag` has already been processed.
    pub fn contains(&self, clan_tag: &str) -> bool {
        self.tags.contains(&tag::canonical(clan_tag))
    }

    /// Records `clan_tag` as processed. Idempotent; returns true only when
    /// the tag was newly added.
    pub fn add(&mut self, clan_tag: &str) -> bool {
        self.tags.insert(tag::canonical(clan_tag))
    }

    /// Atomically persists the full set.
    pub fn flush(&self) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let sorted: Vec<&String> = self.tags.iter().collect();
        let payload = serde_json::to_string(&sorted)?;

        let tmp = tmp_sibling(&self.path);
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)?;

        tracing::info!("Visited-clans checkpoint updated ({} entries)", self.tags.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterates the set in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn checkpoint_path(dir: &TempDir) -> PathBuf {
        dir.path().join("checkpoints").join("visited_clans.json")
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let visited = VisitedClans::load(&checkpoint_path(&dir));
        assert!(visited.is_empty());
    }

    #[test]
    fn test_add_flush_reload() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);

        let mut visited = VisitedClans::load(&path);
        assert!(visited.add("#abc123"));
        assert!(visited.add("DEF456"));
        visited.flush().unwrap();

        let reloaded = VisitedClans::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("ABC123"));
        assert!(reloaded.contains("#def456"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut visited = VisitedClans::load(&checkpoint_path(&dir));

        assert!(visited.add("ABC123"));
        assert!(!visited.add("ABC123"));
        assert!(!visited.add("#abc123"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let visited = VisitedClans::load(&path);
        assert!(visited.is_empty());
    }

    #[test]
    fn test_flush_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);

        let mut visited = VisitedClans::load(&path);
        visited.add("ABC123");
        visited.flush().unwrap();

        assert!(path.exists());
        assert!(!tmp_sibling(&path).exists());
    }

    #[test]
    fn test_flush_writes_sorted_json_array() {
        let dir = TempDir::new().unwrap();
        let path = checkpoint_path(&dir);

        let mut visited = VisitedClans::load(&path);
        visited.add("ZZZ");
        visited.add("AAA");
        visited.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, vec!["AAA".to_string(), "ZZZ".to_string()]);
    }
}
