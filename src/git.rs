//! Git plumbing.
//!
//! Shells out to `git -C <repo>` for the path universe and for moves. Output
//! is requested NUL-separated where git supports it so odd names survive.

use crate::error::{Error, Result};
use crate::executor::Mover;
use crate::source::PathSource;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

fn run_git(repo: &Path, args: &[&str]) -> Result<Output> {
    debug!("git -C {} {}", repo.display(), args.join(" "));
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .env("GIT_PAGER", "cat")
        .env("LC_ALL", "C")
        .output()?;
    Ok(output)
}

fn run_git_checked(repo: &Path, args: &[&str]) -> Result<Output> {
    let output = run_git(repo, args)?;
    if !output.status.success() {
        return Err(Error::Git {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

fn split_nul(raw: &[u8]) -> Vec<String> {
    raw.split(|b| *b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

pub fn is_work_tree(path: &Path) -> bool {
    run_git(path, &["rev-parse", "--is-inside-work-tree"])
        .map(|o| o.status.success() && o.stdout.trim_ascii() == b"true")
        .unwrap_or(false)
}

/// Top level of the working tree containing `path`.
pub fn repo_root(path: &Path) -> Result<PathBuf> {
    if !is_work_tree(path) {
        return Err(Error::NotARepository(path.to_path_buf()));
    }
    let output = run_git_checked(path, &["rev-parse", "--show-toplevel"])?;
    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(PathBuf::from(root))
}

pub fn has_uncommitted_changes(repo: &Path) -> Result<bool> {
    let output = run_git_checked(repo, &["status", "--porcelain"])?;
    Ok(!output.stdout.trim_ascii().is_empty())
}

/// Stashes local changes, untracked files included. Returns whether a
/// stash entry was created; a clean tree leaves the stash list untouched.
pub fn stash_push(repo: &Path, message: &str) -> Result<bool> {
    let output = run_git_checked(
        repo,
        &["stash", "push", "--include-untracked", "-m", message],
    )?;
    Ok(stash_created(&String::from_utf8_lossy(&output.stdout)))
}

/// Restores and drops the most recent stash entry.
pub fn stash_pop(repo: &Path) -> Result<()> {
    run_git_checked(repo, &["stash", "pop"])?;
    Ok(())
}

fn stash_created(stdout: &str) -> bool {
    !stdout.contains("No local changes to save")
}

/// Parses `git submodule status` lines: `<sha> <path> (<describe>)`.
fn parse_submodule_status(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

/// The tracked and ignored files of a git working tree.
#[derive(Debug, Clone)]
pub struct GitSource {
    root: PathBuf,
}

impl GitSource {
    /// Opens the working tree containing `path`.
    pub fn discover(path: &Path) -> Result<Self> {
        Ok(Self {
            root: repo_root(path)?,
        })
    }
}

impl PathSource for GitSource {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_tracked(&self) -> Result<Vec<String>> {
        let output = run_git_checked(&self.root, &["ls-files", "-z"])?;
        Ok(split_nul(&output.stdout))
    }

    fn list_ignored(&self) -> Result<Vec<String>> {
        let output = run_git_checked(
            &self.root,
            &["ls-files", "-z", "--others", "-i", "--exclude-standard"],
        )?;
        Ok(split_nul(&output.stdout))
    }

    /// Lists submodules; a repository without any yields an empty list.
    fn list_submodules(&self) -> Result<Vec<String>> {
        let output = run_git(&self.root, &["submodule", "status", "--recursive"])?;
        if !output.status.success() {
            return Ok(Vec::new());
        }
        Ok(parse_submodule_status(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }
}

/// Moves through `git mv`, so the index follows the rename.
#[derive(Debug, Clone)]
pub struct GitMover {
    root: PathBuf,
}

impl GitMover {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Mover for GitMover {
    fn move_path(&mut self, source: &str, destination: &str, dry_run: bool) -> Result<String> {
        let mut args = vec!["mv"];
        if dry_run {
            args.push("-n");
        }
        args.extend(["--", source, destination]);

        let output = run_git_checked(&self.root, &args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
