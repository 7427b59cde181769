//! Scan orchestration.
//!
//! Expands the repository's file list with every ancestor directory, runs
//! collision detection once over the whole set, then validates each path and
//! materializes a [`ScanItem`] for every path with at least one issue.

use crate::collisions::Collisions;
use crate::config::{ScanConfig, ScanOptions};
use crate::error::Result;
use crate::fixes::{generate_fix_options, shorten_option};
use crate::model::{Issue, IssueCode, ItemStatus, ItemType, ScanItem};
use crate::progress::{CancelToken, ProgressReporter, SilentReporter};
use crate::rules::{char_len, depth, is_git_internal, validate_rel_path};
use crate::source::PathSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

const SYMLINK_WARNING: &str = "Symlink detected. Windows behavior depends on git config and \
                               permissions. Consider keeping or replacing.";

/// Facts about one scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub repo: String,
    pub timestamp: String,
    pub config: ScanConfig,
    pub include_ignored: bool,
    pub list_submodules: bool,
    pub exclude: Vec<String>,
    pub paths_scanned: usize,
    pub collisions: Collisions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodules: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub items: Vec<ScanItem>,
    pub metadata: ScanMetadata,
}

/// Scans `source` without progress reporting or cancellation.
pub fn build_scan(
    source: &dyn PathSource,
    config: &ScanConfig,
    options: &ScanOptions,
) -> Result<ScanResult> {
    build_scan_with(source, config, options, &SilentReporter, None)
}

/// Scans `source`, checking `cancel` between phases.
///
/// A cancelled scan returns [`crate::Error::Cancelled`] and no partial items.
pub fn build_scan_with(
    source: &dyn PathSource,
    config: &ScanConfig,
    options: &ScanOptions,
    reporter: &dyn ProgressReporter,
    cancel: Option<&CancelToken>,
) -> Result<ScanResult> {
    let check = || cancel.map_or(Ok(()), CancelToken::check);
    let exclude = options.exclude_set()?;

    check()?;
    reporter.on_progress(0, "Listing repository files...");
    let mut files = source.list_tracked()?;
    if options.include_ignored {
        files.extend(source.list_ignored()?);
    }
    if !exclude.is_empty() {
        files.retain(|f| !exclude.is_excluded(f));
    }
    info!("Listed {} files under {}", files.len(), source.root().display());

    check()?;
    reporter.on_progress(25, "Checking paths...");
    let candidates = expand_candidates(&files);
    let (items, collisions) = scan_paths(&candidates, source.root(), config, |rel| {
        source.classify(rel)
    });

    let submodules = if options.list_submodules {
        Some(source.list_submodules()?)
    } else {
        None
    };

    check()?;
    reporter.on_progress(
        100,
        &format!("Found {} problematic paths.", items.len()),
    );
    info!(
        "Scanned {} paths, {} problematic",
        candidates.len(),
        items.len()
    );

    let metadata = ScanMetadata {
        repo: source.root().display().to_string(),
        timestamp: chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S%z")
            .to_string(),
        config: *config,
        include_ignored: options.include_ignored,
        list_submodules: options.list_submodules,
        exclude: options.exclude.clone(),
        paths_scanned: candidates.len(),
        collisions,
        submodules,
    };

    Ok(ScanResult { items, metadata })
}

/// Files plus every ancestor directory, deduplicated, shallow paths first.
pub fn expand_candidates<S: AsRef<str>>(files: &[S]) -> Vec<String> {
    let mut set = BTreeSet::new();
    for f in files {
        let f = f.as_ref();
        let mut end = 0;
        while let Some(pos) = f[end..].find('/') {
            end += pos;
            set.insert(f[..end].to_string());
            end += 1;
        }
        set.insert(f.to_string());
    }
    let mut candidates: Vec<String> = set.into_iter().collect();
    candidates.sort_by(|a, b| depth(a).cmp(&depth(b)).then_with(|| a.cmp(b)));
    candidates
}

/// Validates an already expanded candidate list.
///
/// `classify` is called once per non-`.git` candidate.
pub fn scan_paths(
    candidates: &[String],
    root: &Path,
    config: &ScanConfig,
    classify: impl Fn(&str) -> ItemType,
) -> (Vec<ScanItem>, Collisions) {
    let collisions = Collisions::detect(candidates);
    let items = candidates
        .iter()
        .filter(|rel| !is_git_internal(rel))
        .filter_map(|rel| examine_path(rel, root, classify(rel.as_str()), config, &collisions))
        .collect();
    (items, collisions)
}

/// Builds the item for one path, or `None` when the path is clean.
pub fn examine_path(
    rel_path: &str,
    root: &Path,
    item_type: ItemType,
    config: &ScanConfig,
    collisions: &Collisions,
) -> Option<ScanItem> {
    let mut issues = validate_rel_path(rel_path, config);

    if let Some(group) = collisions.case_group(rel_path) {
        issues.push(Issue::new(
            IssueCode::CaseCollision,
            format!("Case-insensitive collision group: {group:?}"),
        ));
    }
    if let Some(group) = collisions.nfc_group(rel_path) {
        issues.push(Issue::new(
            IssueCode::UnicodeNfcCollision,
            format!("NFC normalization collision group: {group:?}"),
        ));
    }

    let mut warnings = Vec::new();
    if item_type == ItemType::Symlink {
        warnings.push(SYMLINK_WARNING.to_string());
        issues.push(Issue::new(IssueCode::Symlink, "Symlink detected (warning)."));
    }

    if issues.is_empty() {
        return None;
    }

    let mut fix_options = generate_fix_options(rel_path, config);
    let mut proposed = fix_options
        .first()
        .map_or_else(|| rel_path.to_string(), |o| o.preview_path.clone());
    let mut chosen = fix_options.first().map(|o| o.key);

    if char_len(rel_path) > config.max_path {
        let shorten = shorten_option(rel_path, config.max_path);
        if proposed == rel_path {
            proposed = shorten.preview_path.clone();
            chosen = Some(shorten.key);
        }
        fix_options.push(shorten);
    }

    debug!(
        "{}: {} issue(s), proposing {:?}",
        rel_path,
        issues.len(),
        proposed
    );

    Some(ScanItem {
        item_type,
        rel_path: rel_path.to_string(),
        abs_path: root.join(rel_path),
        issues,
        proposed_fix: proposed,
        fix_options,
        chosen_fix_key: chosen,
        status: ItemStatus::Pending,
        selected: true,
        warnings,
    })
}
