//! repopath-sanitizer: find and fix repository paths that cannot be checked
//! out on Windows.
//!
//! Scans a git working tree (or a plain directory) for names with forbidden
//! characters, reserved device names, trailing dots or spaces, over-long
//! paths and case/Unicode collisions, then plans and applies renames through
//! `git mv`.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Args, Commands, DirtyTreeAction, OutputArgs, ScanArgs};
use colored::Colorize;
use dialoguer::{Confirm, Select, theme::ColorfulTheme};
use repopath_sanitizer::executor::{FailedOp, mark_statuses};
use repopath_sanitizer::report::{Report, text_summary};
use repopath_sanitizer::scanner::build_scan_with;
use repopath_sanitizer::state::{LastRun, RunMeta, StateStore};
use repopath_sanitizer::{
    ApplyMode, ApplyReport, DirSource, FsMover, GitMover, GitSource, Mover, PathSource,
    ProgressReporter, RenameOp, RenamePlan, ScanItem, ScanResult, apply_plan, git, plan_renames,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let verbose = args.verbose;

    match args.command {
        Commands::Scan { scan, output } => cmd_scan(&scan, &output, verbose),
        Commands::Plan { scan, output } => cmd_plan(&scan, &output, verbose),
        Commands::Apply {
            scan,
            output,
            dry_run,
            yes,
            interactive,
            stash,
            state_dir,
        } => cmd_apply(
            &scan,
            &output,
            ApplyFlags {
                dry_run,
                yes,
                interactive,
                stash,
                state_dir,
            },
            verbose,
        ),
        Commands::Undo {
            repo,
            no_git,
            state_dir,
            yes,
        } => cmd_undo(&repo, no_git, state_dir, yes, verbose),
    }
}

/// Library events go to stderr; `RUST_LOG` overrides the level.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// The repository being worked on, git-backed or a plain directory.
struct Workspace {
    source: Box<dyn PathSource>,
    git: bool,
}

impl Workspace {
    fn open(repo: &Path, no_git: bool) -> Result<Self> {
        if no_git {
            let root = repo
                .canonicalize()
                .with_context(|| format!("Failed to resolve {}", repo.display()))?;
            if !root.is_dir() {
                bail!("{} is not a directory", root.display());
            }
            return Ok(Self {
                source: Box::new(DirSource::new(root)),
                git: false,
            });
        }

        let source = GitSource::discover(repo).with_context(|| {
            format!(
                "{} is not a git working tree (use --no-git for a plain directory)",
                repo.display()
            )
        })?;
        Ok(Self {
            source: Box::new(source),
            git: true,
        })
    }

    fn root(&self) -> &Path {
        self.source.root()
    }

    fn repo_id(&self) -> String {
        self.root().display().to_string()
    }

    fn mover(&self) -> Box<dyn Mover> {
        if self.git {
            Box::new(GitMover::new(self.root()))
        } else {
            Box::new(FsMover::new(self.root()))
        }
    }

    /// Uncommitted changes in a git working tree. A failed check counts as clean.
    fn is_dirty(&self) -> bool {
        if !self.git {
            return false;
        }
        match git::has_uncommitted_changes(self.root()) {
            Ok(dirty) => dirty,
            Err(e) => {
                eprintln!(
                    "{} Could not check working tree status: {}",
                    "warn:".yellow().bold(),
                    e
                );
                false
            }
        }
    }

    fn warn_if_dirty(&self) {
        if self.is_dirty() {
            warn_dirty();
        }
    }
}

fn warn_dirty() {
    eprintln!(
        "{} Working tree has uncommitted changes; consider committing or stashing first",
        "warn:".yellow().bold()
    );
}

/// Renders progress and per-move results on the terminal.
struct TerminalReporter {
    verbose: bool,
    /// Suppress per-move lines, e.g. while stdout carries JSON.
    quiet: bool,
}

impl ProgressReporter for TerminalReporter {
    fn on_progress(&self, percent: u8, message: &str) {
        if self.verbose {
            eprintln!("{} [{:>3}%] {}", "info:".blue().bold(), percent, message);
        }
    }

    fn on_operation(&self, op: &RenameOp, ok: bool, message: &str) {
        if self.quiet {
            return;
        }
        if ok {
            println!(
                "  {} {} {}",
                op.source.red(),
                "->".green(),
                op.destination.green()
            );
        } else {
            println!(
                "  {} {} {} {}",
                op.source.red(),
                "->".dimmed(),
                op.destination,
                format!("({})", message).dimmed()
            );
        }
    }
}

fn run_scan(workspace: &Workspace, scan: &ScanArgs, verbose: bool) -> Result<ScanResult> {
    let reporter = TerminalReporter {
        verbose,
        quiet: true,
    };
    let result = build_scan_with(
        workspace.source.as_ref(),
        &scan.config(),
        &scan.options(),
        &reporter,
        None,
    )
    .context("Scan failed")?;
    Ok(result)
}

fn cmd_scan(scan: &ScanArgs, output: &OutputArgs, verbose: bool) -> Result<()> {
    let workspace = Workspace::open(&scan.repo, scan.no_git)?;
    let result = run_scan(&workspace, scan, verbose)?;
    let plan = plan_renames(&result.items, &scan.config());

    if !output.json {
        print_scan_result(&result, verbose);
    }
    write_outputs(output, &result, &plan, &[], &plan.warnings)
}

fn cmd_plan(scan: &ScanArgs, output: &OutputArgs, verbose: bool) -> Result<()> {
    let workspace = Workspace::open(&scan.repo, scan.no_git)?;
    let result = run_scan(&workspace, scan, verbose)?;
    let plan = plan_renames(&result.items, &scan.config());

    if !output.json {
        print_plan(&plan);
        if !plan.is_empty() {
            println!(
                "\n{} Run `apply` to preview and apply these renames",
                "hint:".cyan().bold()
            );
        }
    }
    write_outputs(output, &result, &plan, &[], &plan.warnings)
}

struct ApplyFlags {
    dry_run: bool,
    yes: bool,
    interactive: bool,
    stash: bool,
    state_dir: Option<PathBuf>,
}

const STASH_MESSAGE: &str = "repopath-sanitizer auto-stash";

fn cmd_apply(scan: &ScanArgs, output: &OutputArgs, flags: ApplyFlags, verbose: bool) -> Result<()> {
    let workspace = Workspace::open(&scan.repo, scan.no_git)?;
    let mut result = run_scan(&workspace, scan, verbose)?;

    if flags.interactive {
        choose_fixes(&mut result.items)?;
    }

    let plan = plan_renames(&result.items, &scan.config());
    if plan.is_empty() {
        if !output.json {
            println!("{} No renames to apply", "ok:".green().bold());
        }
        return write_outputs(output, &result, &plan, &[], &plan.warnings);
    }

    let dirty = workspace.is_dirty();
    if dirty && flags.dry_run {
        warn_dirty();
    }

    let reporter = TerminalReporter {
        verbose,
        quiet: output.json,
    };
    let mut mover = workspace.mover();

    if !output.json {
        println!(
            "\n{} {} rename(s):",
            "Previewing".yellow().bold(),
            plan.len()
        );
    }
    let preview = apply_plan(
        &plan,
        mover.as_mut(),
        ApplyMode::DryRun,
        &reporter,
        None,
    );
    print_warnings(&preview.warnings);

    if flags.dry_run {
        if !output.json {
            println!(
                "\n{} Run without --dry-run to apply these renames",
                "hint:".cyan().bold()
            );
        }
        return write_outputs(output, &result, &plan, &[], &preview.warnings);
    }

    let action = if dirty {
        dirty_tree_action(&flags)?
    } else {
        DirtyTreeAction::Continue
    };
    if action == DirtyTreeAction::Abort
        || (!flags.yes && !confirm(&format!("Apply {} rename(s)?", plan.len()))?)
    {
        eprintln!("{} Aborted, nothing renamed", "info:".blue().bold());
        return write_outputs(output, &result, &plan, &[], &preview.warnings);
    }

    let stashed = action == DirtyTreeAction::Stash && stash_changes(&workspace)?;

    if !output.json {
        println!("\n{} {} rename(s):", "Applying".yellow().bold(), plan.len());
    }
    let applied = apply_plan(&plan, mover.as_mut(), ApplyMode::Commit, &reporter, None);
    if stashed {
        restore_stash(&workspace);
    }
    mark_statuses(&mut result.items, &applied);

    if !applied.applied.is_empty() {
        save_last_run(&workspace, &result, &applied, flags.state_dir)?;
    }

    write_outputs(output, &result, &plan, &applied.applied, &applied.warnings)?;
    finish_apply(&applied, output.json)
}

fn cmd_undo(
    repo: &Path,
    no_git: bool,
    state_dir: Option<PathBuf>,
    yes: bool,
    verbose: bool,
) -> Result<()> {
    let workspace = Workspace::open(repo, no_git)?;
    let store = state_store(state_dir)?;
    let repo_id = workspace.repo_id();
    let last = store
        .load(&repo_id)
        .with_context(|| format!("Nothing to undo for {}", repo_id))?;

    let plan = last.undo_plan();
    if plan.is_empty() {
        println!("{} Stored mapping is empty, nothing to undo", "info:".blue().bold());
        return Ok(());
    }

    println!(
        "{} {} rename(s) from {}:",
        "Reverting".yellow().bold(),
        plan.len(),
        if last.meta.timestamp.is_empty() {
            "the last run"
        } else {
            last.meta.timestamp.as_str()
        }
    );
    for op in &plan.operations {
        println!("  {} {} {}", op.destination.green(), "<-".dimmed(), op.source.red());
    }

    if !yes && !confirm("Undo these renames?")? {
        println!("{} Aborted, nothing renamed", "info:".blue().bold());
        return Ok(());
    }

    workspace.warn_if_dirty();
    let reporter = TerminalReporter {
        verbose,
        quiet: false,
    };
    let mut mover = workspace.mover();
    let report = apply_plan(&plan, mover.as_mut(), ApplyMode::Commit, &reporter, None);

    if report.is_complete() {
        store.clear(&repo_id)?;
        println!("{} Reverted {} rename(s)", "ok:".green().bold(), report.applied.len());
        return Ok(());
    }

    // Keep only the moves that are still in effect so a retry picks up where this stopped.
    let reverted = report.applied.len();
    let remaining: Vec<RenameOp> = last.mapping[..last.mapping.len() - reverted].to_vec();
    store.save(&LastRun {
        mapping: remaining,
        ..last
    })?;
    finish_apply(&report, false)
}

/// `--stash` wins; `--yes` keeps going with a warning; otherwise ask.
fn dirty_tree_action(flags: &ApplyFlags) -> Result<DirtyTreeAction> {
    if flags.stash {
        return Ok(DirtyTreeAction::Stash);
    }
    if flags.yes {
        warn_dirty();
        return Ok(DirtyTreeAction::Continue);
    }
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Working tree has uncommitted changes")
        .items(&DirtyTreeAction::CHOICES)
        .default(0)
        .interact_opt()
        .context("Failed to read selection")?;
    Ok(DirtyTreeAction::from_selection(selection))
}

/// Stashes local changes; a failed stash stops the run before anything moves.
fn stash_changes(workspace: &Workspace) -> Result<bool> {
    let stashed = git::stash_push(workspace.root(), STASH_MESSAGE)
        .context("Auto-stash failed, nothing renamed")?;
    if stashed {
        eprintln!("{} Stashed uncommitted changes", "info:".blue().bold());
    }
    Ok(stashed)
}

fn restore_stash(workspace: &Workspace) {
    match git::stash_pop(workspace.root()) {
        Ok(()) => eprintln!("{} Restored stashed changes", "info:".blue().bold()),
        Err(e) => eprintln!(
            "{} Could not restore stashed changes ({}); they are kept in `git stash list`",
            "warn:".yellow().bold(),
            e
        ),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

/// Lets the user pick a fix strategy per item, or skip the item.
fn choose_fixes(items: &mut [ScanItem]) -> Result<()> {
    let theme = ColorfulTheme::default();
    for item in items.iter_mut() {
        let mut choices: Vec<String> = item
            .fix_options
            .iter()
            .map(|o| format!("{}: {}", o.label, o.preview_path))
            .collect();
        choices.push("Skip (leave unchanged)".to_string());

        let default = item
            .fix_options
            .iter()
            .position(|o| o.preview_path == item.proposed_fix)
            .unwrap_or(0);

        let selection = Select::with_theme(&theme)
            .with_prompt(format!("{} ({})", item.rel_path, issue_codes(item)))
            .items(&choices)
            .default(default)
            .interact_opt()
            .context("Failed to read fix selection")?;

        match selection {
            Some(i) if i < item.fix_options.len() => {
                let key = item.fix_options[i].key;
                item.choose_fix(key)?;
                item.selected = true;
            }
            Some(_) => item.selected = false,
            None => {}
        }
    }
    Ok(())
}

fn issue_codes(item: &ScanItem) -> String {
    item.issues
        .iter()
        .map(|i| i.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn state_store(dir: Option<PathBuf>) -> Result<StateStore> {
    match dir {
        Some(dir) => Ok(StateStore::at(dir)),
        None => StateStore::user_default().context("Failed to locate state directory"),
    }
}

fn save_last_run(
    workspace: &Workspace,
    result: &ScanResult,
    report: &ApplyReport,
    state_dir: Option<PathBuf>,
) -> Result<()> {
    let store = state_store(state_dir)?;
    let path = store
        .save(&LastRun {
            repo: workspace.repo_id(),
            mapping: report.applied.clone(),
            meta: RunMeta {
                timestamp: result.metadata.timestamp.clone(),
                planned: report.planned.clone(),
                warnings: report.warnings.clone(),
            },
        })
        .context("Failed to save undo state")?;
    tracing::info!("undo state written to {}", path.display());
    Ok(())
}

fn finish_apply(report: &ApplyReport, quiet: bool) -> Result<()> {
    print_warnings(&report.warnings);
    if let Some(FailedOp { operation, message }) = &report.failed {
        bail!(
            "Stopped at {} -> {}: {} ({} of {} rename(s) applied)",
            operation.source,
            operation.destination,
            message,
            report.applied.len(),
            report.planned.len()
        );
    }
    if report.cancelled {
        bail!(
            "Cancelled after {} of {} rename(s)",
            report.applied.len(),
            report.planned.len()
        );
    }
    if quiet {
        return Ok(());
    }

    println!(
        "\n{} Applied {} rename(s)",
        "ok:".green().bold(),
        report.applied.len()
    );
    println!(
        "{} Run your tests, review `git status`, then commit and push",
        "hint:".cyan().bold()
    );
    Ok(())
}

fn write_outputs(
    output: &OutputArgs,
    result: &ScanResult,
    plan: &RenamePlan,
    applied: &[RenameOp],
    warnings: &[String],
) -> Result<()> {
    let report = Report::new(
        &result.metadata,
        &result.items,
        &plan.operations,
        applied,
        warnings,
    );

    if output.json {
        println!("{}", report.to_json()?);
    }
    if let Some(path) = &output.json_out {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("{} Wrote JSON report to {}", "info:".blue().bold(), path.display());
    }
    if let Some(path) = &output.text_out {
        let text = text_summary(&result.metadata.repo, &plan.operations, warnings);
        std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("{} Wrote summary to {}", "info:".blue().bold(), path.display());
    }
    Ok(())
}

fn print_scan_result(result: &ScanResult, verbose: bool) {
    let meta = &result.metadata;

    if verbose {
        println!(
            "\n{} Paths: {}, Problems: {}, Case collisions: {}, NFC collisions: {}",
            "Diagnostics:".bold(),
            meta.paths_scanned,
            result.items.len(),
            meta.collisions.case_insensitive.len(),
            meta.collisions.nfc.len()
        );
    }
    if let Some(submodules) = &meta.submodules {
        println!(
            "{} {} submodule(s), not scanned: {}",
            "info:".blue().bold(),
            submodules.len(),
            submodules.join(", ")
        );
    }

    if result.items.is_empty() {
        println!("{} No problem paths found", "ok:".green().bold());
        return;
    }

    println!(
        "\n{} {} problem path(s):\n",
        "Found".red().bold(),
        result.items.len()
    );

    for item in &result.items {
        println!(
            "  {} {}",
            format!("[{}]", item.item_type).dimmed(),
            item.rel_path.red()
        );
        for issue in &item.issues {
            println!("    {} {}", issue.code.as_str().yellow(), issue.message.dimmed());
        }
        if item.proposed_fix != item.rel_path {
            println!("    {} {}", "->".green(), item.proposed_fix.green());
        }
        if verbose {
            for option in &item.fix_options {
                println!(
                    "    {} {} {}",
                    format!("[{}]", option.key).cyan(),
                    option.label,
                    option.preview_path.dimmed()
                );
                for w in &option.warnings {
                    println!("        {}", w.dimmed());
                }
            }
        }
        for w in &item.warnings {
            println!("    {} {}", "warn:".yellow().bold(), w);
        }
    }
}

fn print_plan(plan: &RenamePlan) {
    if plan.is_empty() {
        println!("{} No renames needed", "ok:".green().bold());
    } else {
        println!("\n{} {} rename(s):\n", "Planned".yellow().bold(), plan.len());
        for op in &plan.operations {
            println!(
                "  {} {} {}",
                op.source.red(),
                "->".green(),
                op.destination.green()
            );
        }
    }
    print_warnings(&plan.warnings);
}

fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("{} {}", "warn:".yellow().bold(), w);
    }
}
