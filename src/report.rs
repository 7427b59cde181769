//! Report rendering.
//!
//! The JSON report carries every scanned item plus the planned and applied
//! renames; the text summary is the short human-facing version.

use crate::error::Result;
use crate::model::{FixKey, Issue, ItemStatus, ItemType, ScanItem};
use crate::planner::RenameOp;
use crate::scanner::ScanMetadata;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// One item as it appears in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub current_path: String,
    pub issues: Vec<Issue>,
    pub proposed_fix: String,
    pub chosen_fix_key: Option<FixKey>,
    pub status: ItemStatus,
    pub warnings: Vec<String>,
}

impl From<&ScanItem> for ItemReport {
    fn from(item: &ScanItem) -> Self {
        Self {
            item_type: item.item_type,
            current_path: item.rel_path.clone(),
            issues: item.issues.clone(),
            proposed_fix: item.proposed_fix.clone(),
            chosen_fix_key: item.chosen_fix_key,
            status: item.status,
            warnings: item.warnings.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub repo: String,
    pub scan: ScanMetadata,
    pub items: Vec<ItemReport>,
    /// `[source, destination]` pairs.
    pub planned_renames: Vec<(String, String)>,
    pub applied_renames: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn new(
        metadata: &ScanMetadata,
        items: &[ScanItem],
        planned: &[RenameOp],
        applied: &[RenameOp],
        warnings: &[String],
    ) -> Self {
        Self {
            repo: metadata.repo.clone(),
            scan: metadata.clone(),
            items: items.iter().map(ItemReport::from).collect(),
            planned_renames: pairs(planned),
            applied_renames: pairs(applied),
            warnings: warnings.to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn pairs(ops: &[RenameOp]) -> Vec<(String, String)> {
    ops.iter()
        .map(|op| (op.source.clone(), op.destination.clone()))
        .collect()
}

/// Plain-text summary: planned renames, warnings and what to do next.
pub fn text_summary(repo: &str, planned: &[RenameOp], warnings: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "RepoPath Sanitizer report for: {repo}");
    out.push('\n');
    out.push_str("Planned renames (git mv):\n");
    if planned.is_empty() {
        out.push_str("  (none)\n");
    }
    for op in planned {
        let _ = writeln!(out, "  - {}  ->  {}", op.source, op.destination);
    }
    if !warnings.is_empty() {
        out.push('\n');
        out.push_str("Warnings:\n");
        for w in warnings {
            let _ = writeln!(out, "  - {w}");
        }
    }
    out.push('\n');
    out.push_str("Suggested next steps:\n");
    out.push_str("  1) Run your test suite\n");
    out.push_str("  2) Review `git status` and diff\n");
    out.push_str("  3) Commit (example message):\n");
    out.push_str("     \"Sanitize paths for Windows checkout (RepoPath Sanitizer)\"\n");
    out.push_str("  4) Push\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collisions::Collisions;
    use crate::config::ScanConfig;
    use crate::model::IssueCode;
    use std::path::PathBuf;

    fn metadata() -> ScanMetadata {
        ScanMetadata {
            repo: "/work/repo".to_string(),
            timestamp: "2024-01-01T00:00:00+0000".to_string(),
            config: ScanConfig::default(),
            include_ignored: false,
            list_submodules: false,
            exclude: Vec::new(),
            paths_scanned: 1,
            collisions: Collisions::default(),
            submodules: None,
        }
    }

    fn item() -> ScanItem {
        ScanItem {
            item_type: ItemType::File,
            rel_path: "bad:name?.txt".to_string(),
            abs_path: PathBuf::from("/work/repo/bad:name?.txt"),
            issues: vec![Issue::for_segment(
                IssueCode::ForbiddenChars,
                "forbidden",
                "bad:name?.txt",
            )],
            proposed_fix: "bad -name.txt".to_string(),
            fix_options: Vec::new(),
            chosen_fix_key: Some(FixKey::Auto),
            status: ItemStatus::Pending,
            selected: true,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn summary_without_renames() {
        insta::assert_snapshot!(text_summary("/work/repo", &[], &[]), @r#"
        RepoPath Sanitizer report for: /work/repo

        Planned renames (git mv):
          (none)

        Suggested next steps:
          1) Run your test suite
          2) Review `git status` and diff
          3) Commit (example message):
             "Sanitize paths for Windows checkout (RepoPath Sanitizer)"
          4) Push
        "#);
    }

    #[test]
    fn summary_lists_renames_and_warnings() {
        let planned = vec![
            RenameOp::new("docs/a?.md", "docs/a.md"),
            RenameOp::new("CON", "CON_"),
        ];
        let warnings = vec!["Collision: adjusted target for b.txt".to_string()];
        insta::assert_snapshot!(text_summary("/work/repo", &planned, &warnings), @r#"
        RepoPath Sanitizer report for: /work/repo

        Planned renames (git mv):
          - docs/a?.md  ->  docs/a.md
          - CON  ->  CON_

        Warnings:
          - Collision: adjusted target for b.txt

        Suggested next steps:
          1) Run your test suite
          2) Review `git status` and diff
          3) Commit (example message):
             "Sanitize paths for Windows checkout (RepoPath Sanitizer)"
          4) Push
        "#);
    }

    #[test]
    fn json_uses_report_field_names() {
        let planned = vec![RenameOp::new("bad:name?.txt", "bad -name.txt")];
        let report = Report::new(&metadata(), &[item()], &planned, &[], &[]);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["repo"], "/work/repo");
        assert_eq!(value["scan"]["config"]["max_path"], 260);
        let first = &value["items"][0];
        assert_eq!(first["type"], "File");
        assert_eq!(first["current_path"], "bad:name?.txt");
        assert_eq!(first["issues"][0]["code"], "FORBIDDEN_CHARS");
        assert_eq!(first["chosen_fix_key"], "auto");
        assert_eq!(first["status"], "Pending");
        assert_eq!(
            value["planned_renames"],
            serde_json::json!([["bad:name?.txt", "bad -name.txt"]])
        );
        assert_eq!(value["applied_renames"], serde_json::json!([]));
    }

    #[test]
    fn writes_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        Report::new(&metadata(), &[], &[], &[], &["w".to_string()])
            .write_json(&path)
            .unwrap();
        let back: Report = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.warnings, vec!["w".to_string()]);
        assert!(back.items.is_empty());
    }
}
