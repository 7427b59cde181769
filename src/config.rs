//! Scan configuration.
//!
//! Both values are passed explicitly into every scan and plan call; nothing
//! here is process-wide.

use crate::error::{Error, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Windows `MAX_PATH`.
pub const DEFAULT_MAX_PATH: usize = 260;

/// Rules that shape validation and fix synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Paths whose length reaches this value are flagged.
    pub max_path: usize,
    pub normalize_unicode_nfc: bool,
    pub collapse_spaces: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_path: DEFAULT_MAX_PATH,
            normalize_unicode_nfc: false,
            collapse_spaces: false,
        }
    }
}

/// What goes into the path universe of a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    pub include_ignored: bool,
    /// List submodule paths in the metadata. Submodules are never recursed into.
    pub list_submodules: bool,
    /// Glob patterns removed from the universe before ancestor expansion.
    pub exclude: Vec<String>,
}

impl ScanOptions {
    pub fn exclude_set(&self) -> Result<ExcludeSet> {
        ExcludeSet::new(&self.exclude)
    }
}

/// Compiled exclude globs.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// A path is excluded when a pattern matches the whole path or any one segment.
    pub fn is_excluded(&self, rel_path: &str) -> bool {
        self.patterns.iter().any(|p| {
            p.matches(rel_path) || rel_path.split('/').any(|segment| p.matches(segment))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
