//! Command-line interface definitions.
//!
//! Defines the argument parser and subcommands using clap's derive API.
//! Each subcommand is one stage of the workflow: reporting problem paths,
//! showing the rename plan, applying it, or undoing the last applied run.

use clap::{Args as ClapArgs, Parser, Subcommand};
use repopath_sanitizer::config::DEFAULT_MAX_PATH;
use repopath_sanitizer::{ScanConfig, ScanOptions};
use std::path::PathBuf;

/// Find and fix repository paths that cannot be checked out on Windows.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Print progress and diagnostics to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the repository and report problem paths with proposed fixes.
    Scan {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the ordered rename plan without touching the repository.
    Plan {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Preview the rename plan, then apply it.
    Apply {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Only preview; never move anything.
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Choose a fix strategy per item before planning.
        #[arg(short, long)]
        interactive: bool,

        /// Stash uncommitted changes (untracked files included) before
        /// renaming and restore them afterwards.
        #[arg(long)]
        stash: bool,

        /// Directory for the last-run record used by `undo`.
        #[arg(long)]
        state_dir: Option<PathBuf>,
    },

    /// Revert the renames of the last applied run.
    Undo {
        /// Repository path. Defaults to current directory.
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        /// Treat the repository as a plain directory tree (no git).
        #[arg(long)]
        no_git: bool,

        /// Directory holding the last-run record.
        #[arg(long)]
        state_dir: Option<PathBuf>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Options shared by every command that scans.
#[derive(Debug, Clone, ClapArgs)]
pub struct ScanArgs {
    /// Repository path. Defaults to current directory.
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// Treat the repository as a plain directory tree and move with
    /// filesystem renames instead of `git mv`.
    #[arg(long)]
    pub no_git: bool,

    /// Also scan files ignored by .gitignore.
    #[arg(long)]
    pub include_ignored: bool,

    /// List submodules in the scan metadata (they are never scanned).
    #[arg(long)]
    pub list_submodules: bool,

    /// Windows path length threshold; paths at or above it are flagged.
    #[arg(long, default_value_t = DEFAULT_MAX_PATH)]
    pub max_path: usize,

    /// Offer Unicode NFC normalization as a fix.
    #[arg(long)]
    pub nfc: bool,

    /// Collapse runs of spaces in fixed names.
    #[arg(long)]
    pub collapse_spaces: bool,

    /// Glob patterns for paths to leave out (e.g., "vendor", "*.lock").
    /// Matched against the whole path and against every segment.
    #[arg(short, long)]
    pub exclude: Vec<String>,
}

impl ScanArgs {
    pub fn config(&self) -> ScanConfig {
        ScanConfig {
            max_path: self.max_path,
            normalize_unicode_nfc: self.nfc,
            collapse_spaces: self.collapse_spaces,
        }
    }

    pub fn options(&self) -> ScanOptions {
        ScanOptions {
            include_ignored: self.include_ignored,
            list_submodules: self.list_submodules,
            exclude: self.exclude.clone(),
        }
    }
}

#[derive(Debug, Clone, ClapArgs)]
pub struct OutputArgs {
    /// Emit the JSON report on stdout instead of human-readable output.
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to this file.
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Write the plain-text summary to this file.
    #[arg(long)]
    pub text_out: Option<PathBuf>,
}

/// What `apply` does with uncommitted changes in a git working tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyTreeAction {
    Stash,
    Continue,
    Abort,
}

impl DirtyTreeAction {
    /// Prompt entries, in the order [`DirtyTreeAction::from_selection`] reads them.
    pub const CHOICES: [&'static str; 3] = [
        "Auto-stash (recommended)",
        "Continue without stashing",
        "Abort",
    ];

    /// Maps a prompt selection; dismissing the prompt aborts.
    pub fn from_selection(selection: Option<usize>) -> Self {
        match selection {
            Some(0) => DirtyTreeAction::Stash,
            Some(1) => DirtyTreeAction::Continue,
            _ => DirtyTreeAction::Abort,
        }
    }
}
