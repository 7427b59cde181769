//! Scan, plan, apply and undo against real directory trees.

use repopath_sanitizer::executor::mark_statuses;
use repopath_sanitizer::state::{LastRun, RunMeta, StateStore};
use repopath_sanitizer::{
    ApplyMode, DirSource, FixKey, FsMover, IssueCode, ItemStatus, ScanConfig, ScanOptions,
    SilentReporter, apply_plan, build_scan, plan_renames,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, rel).unwrap();
}

fn tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "bad:name?.txt");
    touch(dir.path(), "docs /readme.md");
    touch(dir.path(), "src/lib.rs");
    dir
}

#[test]
fn forbidden_name_gets_auto_fix() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "bad:name?.txt");

    let scan = build_scan(
        &DirSource::new(dir.path()),
        &ScanConfig::default(),
        &ScanOptions::default(),
    )
    .unwrap();

    assert_eq!(scan.items.len(), 1);
    let item = &scan.items[0];
    assert!(item.has_issue(IssueCode::ForbiddenChars));
    let first = &item.fix_options[0];
    assert_eq!(first.key, FixKey::Auto);
    assert!(!first.preview_path.contains(':'));
    assert!(!first.preview_path.contains('?'));
    assert_eq!(item.proposed_fix, first.preview_path);
    assert!(item.selected);
}

#[test]
fn clean_tree_has_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "src/main.rs");
    touch(dir.path(), "README.md");

    let config = ScanConfig::default();
    let scan = build_scan(&DirSource::new(dir.path()), &config, &ScanOptions::default()).unwrap();
    assert!(scan.items.is_empty());
    assert!(plan_renames(&scan.items, &config).is_empty());
}

#[test]
fn dry_run_leaves_tree_untouched() {
    let dir = tree();
    let config = ScanConfig::default();
    let scan = build_scan(&DirSource::new(dir.path()), &config, &ScanOptions::default()).unwrap();
    let plan = plan_renames(&scan.items, &config);
    assert!(!plan.is_empty());

    let mut mover = FsMover::new(dir.path());
    let report = apply_plan(&plan, &mut mover, ApplyMode::DryRun, &SilentReporter, None);

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(report.applied.is_empty());
    assert!(dir.path().join("bad:name?.txt").exists());
    assert!(dir.path().join("docs /readme.md").exists());
}

#[test]
fn apply_then_undo_restores_tree() {
    let dir = tree();
    let config = ScanConfig::default();
    let source = DirSource::new(dir.path());
    let mut scan = build_scan(&source, &config, &ScanOptions::default()).unwrap();
    let plan = plan_renames(&scan.items, &config);

    // The directory move carries its contents; no separate move for the file.
    let sources: Vec<&str> = plan.operations.iter().map(|op| op.source.as_str()).collect();
    assert_eq!(sources, vec!["bad:name?.txt", "docs "]);

    let mut mover = FsMover::new(dir.path());
    let report = apply_plan(&plan, &mut mover, ApplyMode::Commit, &SilentReporter, None);
    assert!(report.is_complete());
    assert_eq!(report.applied.len(), 2);

    assert!(dir.path().join("bad -name.txt").exists());
    assert!(dir.path().join("docs/readme.md").exists());
    assert!(!dir.path().join("docs ").exists());

    mark_statuses(&mut scan.items, &report);
    assert!(scan.items.iter().all(|i| i.status == ItemStatus::Renamed));

    let rescan = build_scan(&source, &config, &ScanOptions::default()).unwrap();
    assert!(rescan.items.is_empty(), "{:?}", rescan.items);

    // Persist, reload, revert.
    let state = TempDir::new().unwrap();
    let store = StateStore::at(state.path());
    let repo = scan.metadata.repo.clone();
    store
        .save(&LastRun {
            repo: repo.clone(),
            mapping: report.applied.clone(),
            meta: RunMeta::default(),
        })
        .unwrap();
    let undo = store.load(&repo).unwrap().undo_plan();
    let reverted = apply_plan(&undo, &mut mover, ApplyMode::Commit, &SilentReporter, None);
    assert!(reverted.is_complete());

    assert!(dir.path().join("bad:name?.txt").exists());
    assert!(dir.path().join("docs /readme.md").exists());
    assert!(!dir.path().join("bad -name.txt").exists());
}

#[test]
fn commit_halts_on_occupied_destination() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "a?");
    touch(dir.path(), "a");
    touch(dir.path(), "b*");

    let config = ScanConfig::default();
    let scan = build_scan(&DirSource::new(dir.path()), &config, &ScanOptions::default()).unwrap();
    let plan = plan_renames(&scan.items, &config);
    assert_eq!(plan.len(), 2);

    let mut mover = FsMover::new(dir.path());
    let report = apply_plan(&plan, &mut mover, ApplyMode::Commit, &SilentReporter, None);

    let failed = report.failed.as_ref().unwrap();
    assert_eq!(failed.operation.source, "a?");
    assert!(report.applied.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(dir.path().join("b*").exists());
    assert_eq!(fs::read_to_string(dir.path().join("a")).unwrap(), "a");
}

#[test]
fn excluded_paths_are_not_reported() {
    let dir = tree();
    let options = ScanOptions {
        exclude: vec!["docs *".to_string(), "*.txt".to_string()],
        ..ScanOptions::default()
    };
    let scan = build_scan(&DirSource::new(dir.path()), &ScanConfig::default(), &options).unwrap();
    assert!(scan.items.is_empty(), "{:?}", scan.items);
}

#[test]
fn interactive_style_choice_changes_plan() {
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "bad?.txt");
    let config = ScanConfig::default();
    let mut scan = build_scan(&DirSource::new(dir.path()), &config, &ScanOptions::default()).unwrap();

    scan.items[0].selected = false;
    assert!(plan_renames(&scan.items, &config).is_empty());

    scan.items[0].selected = true;
    scan.items[0].choose_fix(FixKey::Auto).unwrap();
    let plan = plan_renames(&scan.items, &config);
    assert_eq!(plan.operations[0].destination, "bad.txt");
    assert!(scan.items[0].choose_fix(FixKey::Shorten).is_err());
}
