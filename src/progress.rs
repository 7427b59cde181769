//! Progress reporting and cooperative cancellation.

use crate::error::{Error, Result};
use crate::planner::RenameOp;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Receives progress from a scan or an apply run.
///
/// The CLI renders these to the terminal; hosts running work on a background
/// thread can forward them to a foreground loop. All methods default to no-ops.
pub trait ProgressReporter {
    /// Overall completion in percent plus a description of the current step.
    fn on_progress(&self, _percent: u8, _message: &str) {}
    /// Result of one move, in plan order.
    fn on_operation(&self, _op: &RenameOp, _ok: bool, _message: &str) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Shared flag checked between phases. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns [`Error::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
