//! Last-run persistence, so a committed apply can be undone.
//!
//! One file per repository under the user's state directory, keyed by a
//! short hash of the repository path.

use crate::error::{Error, Result};
use crate::planner::{RenameOp, RenamePlan};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "repopath-sanitizer";

/// What a committed run changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    pub repo: String,
    /// Applied moves, in the order they were executed.
    pub mapping: Vec<RenameOp>,
    #[serde(default)]
    pub meta: RunMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub timestamp: String,
    pub planned: Vec<RenameOp>,
    pub warnings: Vec<String>,
}

impl LastRun {
    /// The plan that reverts this run.
    pub fn undo_plan(&self) -> RenamePlan {
        RenamePlan::from_operations(self.mapping.clone()).reversed()
    }
}

/// Reads and writes [`LastRun`] files.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform state directory, falling back to the local
    /// data directory where there is no state directory (macOS, Windows).
    pub fn user_default() -> Result<Self> {
        let base = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| Error::Other("no state directory available".to_string()))?;
        Ok(Self::at(base.join(APP_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, repo: &str) -> PathBuf {
        self.dir.join(format!("last_run_{}.json", repo_key(repo)))
    }

    pub fn save(&self, run: &LastRun) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&run.repo);
        std::fs::write(&path, serde_json::to_string_pretty(run)?)?;
        debug!("saved last run to {}", path.display());
        Ok(path)
    }

    /// Loads the last run for `repo`; [`Error::NoState`] if there is none.
    pub fn load(&self, repo: &str) -> Result<LastRun> {
        let path = self.path_for(repo);
        if !path.exists() {
            return Err(Error::NoState(path));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Removes the state for `repo`. Missing state is not an error.
    pub fn clear(&self, repo: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(repo)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn repo_key(repo: &str) -> String {
    let digest = Sha256::digest(repo.as_bytes());
    hex::encode(digest)[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run() -> LastRun {
        LastRun {
            repo: "/work/repo".to_string(),
            mapping: vec![
                RenameOp::new("a/b?", "a/b"),
                RenameOp::new("a:", "a -"),
            ],
            meta: RunMeta::default(),
        }
    }

    #[test]
    fn key_is_stable_and_short() {
        let key = repo_key("/work/repo");
        assert_eq!(key.len(), 12);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, repo_key("/work/repo"));
        assert_ne!(key, repo_key("/work/other"));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::at(dir.path().join("state"));
        let path = store.save(&run()).unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("last_run_")
        );
        assert_eq!(store.load("/work/repo").unwrap(), run());
    }

    #[test]
    fn missing_state_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::at(dir.path());
        assert!(matches!(store.load("/nowhere"), Err(Error::NoState(_))));
        store.clear("/nowhere").unwrap();
    }

    #[test]
    fn undo_plan_swaps_and_reverses() {
        let plan = run().undo_plan();
        assert_eq!(
            plan.operations,
            vec![RenameOp::new("a -", "a:"), RenameOp::new("a/b", "a/b?")]
        );
    }
}
