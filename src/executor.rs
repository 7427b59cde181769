//! Plan execution.
//!
//! Feeds a [`RenamePlan`] to a [`Mover`] strictly in order. A dry run asks
//! the mover to validate only and keeps going past failures; a commit stops
//! at the first failure, since later moves may depend on earlier ones.

use crate::error::{Error, Result};
use crate::model::{ItemStatus, ScanItem};
use crate::planner::{RenameOp, RenamePlan};
use crate::progress::{CancelToken, ProgressReporter, percent};
use crate::rules::casefold_key;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// The single side-effecting primitive a plan is executed through.
pub trait Mover {
    /// Moves `source` to `destination`, both repository-relative. With
    /// `dry_run` the move is only validated. Returns the tool's message.
    fn move_path(&mut self, source: &str, destination: &str, dry_run: bool) -> Result<String>;
}

/// Moves with `std::fs::rename`, for trees without version control.
#[derive(Debug, Clone)]
pub struct FsMover {
    root: PathBuf,
}

impl FsMover {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Mover for FsMover {
    fn move_path(&mut self, source: &str, destination: &str, dry_run: bool) -> Result<String> {
        let from = self.root.join(source);
        let to = self.root.join(destination);

        if std::fs::symlink_metadata(&from).is_err() {
            return Err(Error::Other(format!("source does not exist: {source}")));
        }
        // A case-only rename finds its own source on case-insensitive filesystems.
        let case_only = casefold_key(source) == casefold_key(destination);
        if !case_only && std::fs::symlink_metadata(&to).is_ok() {
            return Err(Error::Other(format!(
                "destination already exists: {destination}"
            )));
        }

        if to.parent().is_some_and(|parent| !parent.is_dir()) {
            return Err(Error::Other(format!(
                "destination directory does not exist: {destination}"
            )));
        }

        if dry_run {
            return Ok(format!("Would rename '{source}' to '{destination}'"));
        }

        std::fs::rename(&from, &to)?;
        Ok(format!("Renamed '{source}' to '{destination}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApplyMode {
    #[default]
    DryRun,
    Commit,
}

impl ApplyMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, ApplyMode::DryRun)
    }
}

/// The move that halted a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedOp {
    pub operation: RenameOp,
    pub message: String,
}

/// Outcome of running a plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    pub mode: ApplyMode,
    pub planned: Vec<RenameOp>,
    /// Moves that were committed, in order. Always empty for a dry run.
    pub applied: Vec<RenameOp>,
    pub warnings: Vec<String>,
    pub failed: Option<FailedOp>,
    pub cancelled: bool,
}

impl ApplyReport {
    /// Every planned move went through.
    pub fn is_complete(&self) -> bool {
        self.failed.is_none() && !self.cancelled
    }
}

/// Runs `plan` through `mover`.
///
/// Plan warnings are carried into the report. `cancel` is checked before
/// each move; everything before the cancellation point stays applied.
pub fn apply_plan(
    plan: &RenamePlan,
    mover: &mut dyn Mover,
    mode: ApplyMode,
    reporter: &dyn ProgressReporter,
    cancel: Option<&CancelToken>,
) -> ApplyReport {
    let mut report = ApplyReport {
        mode,
        planned: plan.operations.clone(),
        warnings: plan.warnings.clone(),
        ..ApplyReport::default()
    };
    let total = plan.operations.len();
    let verb = if mode.is_dry_run() {
        "Previewing"
    } else {
        "Renaming"
    };

    for (i, op) in plan.operations.iter().enumerate() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            warn!("apply cancelled after {} of {} moves", i, total);
            report.cancelled = true;
            break;
        }

        reporter.on_progress(
            percent(i, total),
            &format!("{verb}: {} -> {}", op.source, op.destination),
        );

        match mover.move_path(&op.source, &op.destination, mode.is_dry_run()) {
            Ok(message) => {
                reporter.on_operation(op, true, &message);
                if !mode.is_dry_run() {
                    report.applied.push(op.clone());
                }
            }
            Err(err) => {
                let message = err.to_string();
                reporter.on_operation(op, false, &message);
                report.warnings.push(format!(
                    "Move failed for {} -> {}: {message}",
                    op.source, op.destination
                ));
                if !mode.is_dry_run() {
                    warn!("stopping at failed move {} -> {}", op.source, op.destination);
                    report.failed = Some(FailedOp {
                        operation: op.clone(),
                        message,
                    });
                    break;
                }
            }
        }
    }

    reporter.on_progress(100, "Done.");
    info!(
        "{} {} of {} moves",
        if mode.is_dry_run() { "previewed" } else { "applied" },
        if mode.is_dry_run() { total } else { report.applied.len() },
        total
    );
    report
}

/// Updates item statuses after a commit.
///
/// An item is `Renamed` when it or one of its ancestors was moved, and
/// `Failed` when its own move halted the run.
pub fn mark_statuses(items: &mut [ScanItem], report: &ApplyReport) {
    for item in items.iter_mut() {
        if report
            .failed
            .as_ref()
            .is_some_and(|f| f.operation.source == item.rel_path)
        {
            item.status = ItemStatus::Failed;
        } else if report
            .applied
            .iter()
            .any(|op| is_same_or_ancestor(&op.source, &item.rel_path))
        {
            item.status = ItemStatus::Renamed;
        }
    }
}

fn is_same_or_ancestor(ancestor: &str, path: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemType;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// Records calls; fails any move whose source is in `fail`.
    #[derive(Default)]
    struct ScriptedMover {
        calls: Vec<(String, String, bool)>,
        fail: Vec<String>,
    }

    impl Mover for ScriptedMover {
        fn move_path(&mut self, source: &str, destination: &str, dry_run: bool) -> Result<String> {
            self.calls
                .push((source.to_string(), destination.to_string(), dry_run));
            if self.fail.iter().any(|f| f == source) {
                Err(Error::Git {
                    command: "mv".to_string(),
                    stderr: "destination exists".to_string(),
                })
            } else {
                Ok(String::new())
            }
        }
    }

    fn plan(ops: &[(&str, &str)]) -> RenamePlan {
        RenamePlan::from_operations(ops.iter().map(|(s, d)| RenameOp::new(*s, *d)).collect())
    }

    fn scan_item(rel: &str) -> ScanItem {
        ScanItem {
            item_type: ItemType::File,
            rel_path: rel.to_string(),
            abs_path: PathBuf::from(rel),
            issues: Vec::new(),
            proposed_fix: rel.to_string(),
            fix_options: Vec::new(),
            chosen_fix_key: None,
            status: ItemStatus::Pending,
            selected: true,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn dry_run_continues_past_failures() {
        let p = plan(&[("a", "b"), ("c", "d"), ("e", "f")]);
        let mut mover = ScriptedMover {
            fail: vec!["c".to_string()],
            ..ScriptedMover::default()
        };
        let report = apply_plan(&p, &mut mover, ApplyMode::DryRun, &crate::SilentReporter, None);
        assert_eq!(mover.calls.len(), 3);
        assert!(mover.calls.iter().all(|(_, _, dry)| *dry));
        assert!(report.applied.is_empty());
        assert!(report.failed.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("c -> d"));
    }

    #[test]
    fn commit_stops_at_first_failure() {
        let p = plan(&[("a", "b"), ("c", "d"), ("e", "f")]);
        let mut mover = ScriptedMover {
            fail: vec!["c".to_string()],
            ..ScriptedMover::default()
        };
        let report = apply_plan(&p, &mut mover, ApplyMode::Commit, &crate::SilentReporter, None);
        assert_eq!(mover.calls.len(), 2);
        assert_eq!(report.applied, vec![RenameOp::new("a", "b")]);
        let failed = report.failed.as_ref().unwrap();
        assert_eq!(failed.operation, RenameOp::new("c", "d"));
        assert!(failed.message.contains("destination exists"));
        assert!(!report.is_complete());
    }

    #[test]
    fn plan_warnings_are_carried() {
        let mut p = plan(&[("a", "b")]);
        p.warnings.push("Collision: adjusted".to_string());
        let report = apply_plan(
            &p,
            &mut ScriptedMover::default(),
            ApplyMode::Commit,
            &crate::SilentReporter,
            None,
        );
        assert_eq!(report.warnings, vec!["Collision: adjusted".to_string()]);
        assert!(report.is_complete());
    }

    #[test]
    fn cancellation_halts_before_next_move() {
        struct CancelAfterFirst(CancelToken);
        impl ProgressReporter for CancelAfterFirst {
            fn on_operation(&self, _op: &RenameOp, _ok: bool, _message: &str) {
                self.0.cancel();
            }
        }
        let token = CancelToken::new();
        let reporter = CancelAfterFirst(token.clone());
        let p = plan(&[("a", "b"), ("c", "d")]);
        let mut mover = ScriptedMover::default();
        let report = apply_plan(&p, &mut mover, ApplyMode::Commit, &reporter, Some(&token));
        assert_eq!(report.applied.len(), 1);
        assert!(report.cancelled);
    }

    #[test]
    fn progress_describes_each_move() {
        struct Messages(RefCell<Vec<String>>);
        impl ProgressReporter for Messages {
            fn on_progress(&self, _percent: u8, message: &str) {
                self.0.borrow_mut().push(message.to_string());
            }
        }
        let messages = Messages(RefCell::new(Vec::new()));
        apply_plan(
            &plan(&[("a", "b")]),
            &mut ScriptedMover::default(),
            ApplyMode::DryRun,
            &messages,
            None,
        );
        assert_eq!(
            messages.0.into_inner(),
            vec!["Previewing: a -> b".to_string(), "Done.".to_string()]
        );
    }

    #[test]
    fn statuses_follow_report() {
        let mut items = vec![scan_item("d:"), scan_item("d:/x"), scan_item("e?"), scan_item("f*")];
        let report = ApplyReport {
            mode: ApplyMode::Commit,
            applied: vec![RenameOp::new("d:", "d -")],
            failed: Some(FailedOp {
                operation: RenameOp::new("e?", "e"),
                message: "boom".to_string(),
            }),
            ..ApplyReport::default()
        };
        mark_statuses(&mut items, &report);
        let statuses: Vec<_> = items.iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Renamed,
                ItemStatus::Renamed,
                ItemStatus::Failed,
                ItemStatus::Pending,
            ]
        );
    }

    #[test]
    fn fs_mover_renames_within_a_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.txt"), "x").unwrap();
        let mut mover = FsMover::new(dir.path());

        let preview = mover.move_path("sub/a.txt", "sub/b.txt", true).unwrap();
        assert!(preview.starts_with("Would rename"));
        assert!(dir.path().join("sub/a.txt").exists());

        mover.move_path("sub/a.txt", "sub/b.txt", false).unwrap();
        assert!(!dir.path().join("sub/a.txt").exists());
        assert!(dir.path().join("sub/b.txt").exists());
    }

    #[test]
    fn fs_mover_never_creates_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        let mut mover = FsMover::new(dir.path());

        for dry_run in [true, false] {
            let err = mover.move_path("a.txt", "new/a.txt", dry_run).unwrap_err();
            assert!(err.to_string().contains("destination directory does not exist"));
        }
        assert!(dir.path().join("a.txt").exists());
        assert!(!dir.path().join("new").exists());
    }

    #[test]
    fn fs_mover_refuses_missing_source_and_existing_destination() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), "x").unwrap();
        fs::write(dir.path().join("b"), "y").unwrap();
        let mut mover = FsMover::new(dir.path());
        assert!(mover.move_path("missing", "c", true).is_err());
        let err = mover.move_path("a", "b", false).unwrap_err();
        assert!(err.to_string().contains("destination already exists"));
        assert_eq!(fs::read_to_string(dir.path().join("b")).unwrap(), "y");
    }
}
