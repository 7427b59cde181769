//! Library error type.
//!
//! Validation findings are not errors: they travel as [`crate::model::Issue`]
//! values on scan items. This enum only covers operational failures of the
//! collaborators around the core (git, the filesystem, persisted state).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    #[error("not a git working tree: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("operation cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("no fix option '{key}' for {path}")]
    UnknownFixKey { key: String, path: String },

    #[error("no previous run recorded for {}", .0.display())]
    NoState(PathBuf),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
