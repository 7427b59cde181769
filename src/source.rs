//! Where a scan gets its path universe from.
//!
//! [`PathSource`] is the narrow interface the scanner consumes. The git
//! implementation lives in [`crate::git`]; [`DirSource`] walks a plain
//! directory tree for working copies without version control.

use crate::error::Result;
use crate::model::ItemType;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the paths of one repository and classifies its entries.
pub trait PathSource {
    /// Repository root; item `abs_path`s are built from it.
    fn root(&self) -> &Path;

    /// Tracked files, repository-relative and `/`-separated.
    fn list_tracked(&self) -> Result<Vec<String>>;

    /// Ignored files. Sources without an ignore concept return nothing.
    fn list_ignored(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    /// Submodule paths, not recursed into.
    fn list_submodules(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn classify(&self, rel_path: &str) -> ItemType {
        classify_entry(&self.root().join(rel_path))
    }
}

/// Classifies by `lstat`. A missing entry counts as a file.
pub fn classify_entry(abs_path: &Path) -> ItemType {
    match std::fs::symlink_metadata(abs_path) {
        Ok(meta) if meta.file_type().is_symlink() => ItemType::Symlink,
        Ok(meta) if meta.is_dir() => ItemType::Folder,
        _ => ItemType::File,
    }
}

/// A plain directory tree. Every non-directory entry below the root counts
/// as tracked; a top-level `.git` is skipped.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathSource for DirSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_tracked(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && e.file_name() == ".git"));
        for entry in walker {
            let entry = entry.map_err(|e| match e.into_io_error() {
                Some(io) => io.into(),
                None => crate::Error::Other("filesystem loop while walking".to_string()),
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            files.push(to_rel_string(rel));
        }
        files.sort();
        Ok(files)
    }
}

/// Joins path components with `/`.
pub fn to_rel_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
