//! repopath-sanitizer library for finding and fixing repository paths that
//! cannot be checked out on Windows.
//!
//! The core workflow has three phases:
//!
//! 1. **Scanning**: list the repository's paths, validate every file and
//!    ancestor directory against Windows path rules, and detect case and
//!    Unicode normalization collisions
//! 2. **Planning**: turn the selected fixes into an ordered, collision-free
//!    list of moves
//! 3. **Applying**: feed the moves to a [`executor::Mover`] (`git mv` or a
//!    plain filesystem rename), as a dry run or for real
//!
//! # Example
//!
//! ```no_run
//! use repopath_sanitizer::{GitSource, ScanConfig, ScanOptions, build_scan, plan_renames};
//! use std::path::Path;
//!
//! let source = GitSource::discover(Path::new(".")).unwrap();
//! let config = ScanConfig::default();
//! let scan = build_scan(&source, &config, &ScanOptions::default()).unwrap();
//!
//! for item in &scan.items {
//!     println!("{} -> {}", item.rel_path, item.proposed_fix);
//! }
//!
//! let plan = plan_renames(&scan.items, &config);
//! println!("{} move(s) planned", plan.len());
//! ```

pub mod collisions;
pub mod config;
pub mod error;
pub mod executor;
pub mod fixes;
pub mod git;
pub mod model;
pub mod planner;
pub mod progress;
pub mod report;
pub mod rules;
pub mod scanner;
pub mod source;
pub mod state;

// Re-export commonly used types at crate root
pub use config::{ScanConfig, ScanOptions};
pub use error::{Error, Result};
pub use executor::{ApplyMode, ApplyReport, FsMover, Mover, apply_plan};
pub use git::{GitMover, GitSource};
pub use model::{FixKey, FixOption, Issue, IssueCode, ItemStatus, ItemType, ScanItem};
pub use planner::{RenameOp, RenamePlan, plan_renames};
pub use progress::{CancelToken, ProgressReporter, SilentReporter};
pub use scanner::{ScanResult, build_scan};
pub use source::{DirSource, PathSource};
