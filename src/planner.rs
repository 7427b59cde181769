//! Rename planning.
//!
//! Turns selected scan items into an ordered list of moves that can be fed,
//! one at a time, to a plain move primitive. Children are moved before their
//! ancestors, and each destination is expressed against the tree as it looks
//! when that move runs: it always sits in the source's current parent, so no
//! move ever needs a directory that does not exist yet.

use crate::config::ScanConfig;
use crate::model::ScanItem;
use crate::rules::{casefold_key, char_len, depth, is_git_internal};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// One move, repository-relative on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenameOp {
    pub source: String,
    pub destination: String,
}

impl RenameOp {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn swapped(&self) -> Self {
        Self::new(self.destination.clone(), self.source.clone())
    }
}

/// Ordered moves plus the adjustments made while planning them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlan {
    pub operations: Vec<RenameOp>,
    pub warnings: Vec<String>,
}

impl RenamePlan {
    pub fn from_operations(operations: Vec<RenameOp>) -> Self {
        Self {
            operations,
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// The plan that undoes this one: pairs swapped, order reversed.
    pub fn reversed(&self) -> Self {
        Self::from_operations(self.operations.iter().rev().map(RenameOp::swapped).collect())
    }
}

/// Hands out case-fold-distinct names, one target at a time.
#[derive(Debug, Default)]
struct TargetNames {
    seen: HashMap<String, usize>,
}

impl TargetNames {
    fn assign(&mut self, target: &str) -> String {
        let count = self.seen.entry(casefold_key(target)).or_insert(0);
        let out = if *count == 0 {
            target.to_string()
        } else {
            with_suffix(target, &format!("_{count}"))
        };
        *count += 1;
        out
    }
}

/// Gives every target a distinct case-folded name.
///
/// Returns one output per input, in order. The first target of each
/// case-fold group is kept; later ones get `_<n>` before the extension of
/// their last segment, `n` counting from 1 within the group.
pub fn disambiguate_targets<S: AsRef<str>>(targets: &[S]) -> Vec<String> {
    let mut names = TargetNames::default();
    targets.iter().map(|t| names.assign(t.as_ref())).collect()
}

/// Inserts `suffix` before the extension of the last segment. Dot-files
/// count as having no extension.
fn with_suffix(path: &str, suffix: &str) -> String {
    let (dir, name) = match path.rfind('/') {
        Some(i) => path.split_at(i + 1),
        None => ("", path),
    };
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{dir}{}{suffix}{}", &name[..dot], &name[dot..]),
        _ => format!("{path}{suffix}"),
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Builds the move sequence for the selected items.
///
/// Targets are resolved shallowest first, against the final names of the
/// ancestors that are renamed too, so collisions are detected on the paths
/// the tree will really contain. Every move stays inside the source's
/// current parent directory; a descendant whose only change comes from a
/// renamed ancestor travels with it and gets no move of its own.
///
/// Planning never fails: adjusted targets, refused `.git` moves, ancestors
/// left in place and over-long destinations are reported through
/// [`RenamePlan::warnings`].
pub fn plan_renames(items: &[ScanItem], config: &ScanConfig) -> RenamePlan {
    let mut selected: Vec<&ScanItem> = items.iter().filter(|it| it.is_pending_rename()).collect();
    selected.sort_by_key(|it| depth(&it.rel_path));

    let mut plan = RenamePlan::default();
    let mut names = TargetNames::default();
    let mut finals: HashMap<&str, String> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut kept_in_place: HashSet<String> = HashSet::new();
    let mut accepted: Vec<(&ScanItem, String)> = Vec::new();

    for item in selected {
        if is_git_internal(&item.rel_path) || is_git_internal(&item.proposed_fix) {
            warn!("refusing to rename {} -> {}", item.rel_path, item.proposed_fix);
            plan.warnings.push(format!(
                "Refusing to rename .git internals: {} -> {}",
                item.rel_path, item.proposed_fix
            ));
            continue;
        }

        let (effective, left) = effective_target(&item.rel_path, &item.proposed_fix, &finals);
        for ancestor in left {
            if kept_in_place.insert(ancestor.clone()) {
                plan.warnings.push(format!(
                    "{ancestor:?} is not being renamed; entries below it keep their directory"
                ));
            }
        }

        if last_segment(&effective) == last_segment(&item.rel_path) {
            debug!("{} moves with its parent", item.rel_path);
            names.assign(&effective);
            if !used.insert(casefold_key(&effective)) {
                plan.warnings.push(format!(
                    "Collision: {effective:?} is still taken after renaming its parent"
                ));
            }
            finals.insert(item.rel_path.as_str(), effective);
            continue;
        }

        let mut target = names.assign(&effective);
        if target != effective {
            plan.warnings.push(format!(
                "Collision: {effective:?} adjusted to {target:?}"
            ));
        }

        if used.contains(&casefold_key(&target)) {
            target.push_str("_x");
            plan.warnings.push(format!(
                "Additional collision guard applied: {:?} -> {:?}",
                item.rel_path, target
            ));
        }
        used.insert(casefold_key(&target));

        let len = char_len(&target);
        if len >= config.max_path {
            plan.warnings.push(format!(
                "Destination {target:?} is {len} characters, limit is {}",
                config.max_path
            ));
        }

        finals.insert(item.rel_path.as_str(), target.clone());
        accepted.push((item, target));
    }

    // Children before their ancestors; stable, so siblings keep scan order.
    accepted.sort_by_key(|(it, _)| Reverse(depth(&it.rel_path)));
    for (item, target) in accepted {
        let destination = in_current_parent(&item.rel_path, &target);
        plan.operations.push(RenameOp::new(item.rel_path.clone(), destination));
    }

    plan
}

/// The path `source` will have once every planned ancestor carries its
/// final name. Ancestors without a move keep their current name even when
/// `target` changes them; those are returned alongside.
fn effective_target(
    source: &str,
    target: &str,
    finals: &HashMap<&str, String>,
) -> (String, Vec<String>) {
    let src: Vec<&str> = source.split('/').collect();
    let dst: Vec<&str> = target.split('/').collect();
    if src.len() != dst.len() {
        return (target.to_string(), Vec::new());
    }

    let last = src.len() - 1;
    let mut out: Vec<String> = Vec::with_capacity(src.len());
    let mut left = Vec::new();
    for i in 0..last {
        let ancestor = src[..=i].join("/");
        if let Some(renamed) = finals.get(ancestor.as_str()) {
            out = renamed.split('/').map(str::to_string).collect();
        } else {
            if src[i] != dst[i] {
                left.push(ancestor);
            }
            out.push(src[i].to_string());
        }
    }
    out.push(dst[last].to_string());
    (out.join("/"), left)
}

/// `source`'s parent as it is now, joined with the last segment of `target`.
fn in_current_parent(source: &str, target: &str) -> String {
    match source.rfind('/') {
        Some(i) => format!("{}/{}", &source[..i], last_segment(target)),
        None => last_segment(target).to_string(),
    }
}
