//! Windows path compatibility rules.
//!
//! Pure functions that classify a path segment or a full relative path and
//! synthesize a fixed segment. Nothing here touches the filesystem.

use crate::config::ScanConfig;
use crate::model::{Issue, IssueCode};
use unicode_normalization::UnicodeNormalization;

/// Characters Windows refuses in a file name.
pub const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

pub const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Replacement for each forbidden character, applied in this order.
pub const SUBSTITUTIONS: &[(char, &str)] = &[
    (':', " -"),
    ('|', "-"),
    ('\\', "-"),
    ('/', "-"),
    ('<', ""),
    ('>', ""),
    ('"', ""),
    ('?', ""),
    ('*', ""),
];

/// Code points 0-31.
pub fn is_control(c: char) -> bool {
    (c as u32) < 32
}

pub fn contains_forbidden(segment: &str) -> bool {
    segment
        .chars()
        .any(|c| FORBIDDEN_CHARS.contains(&c) || is_control(c))
}

pub fn has_trailing_space_or_period(segment: &str) -> bool {
    segment.ends_with(' ') || segment.ends_with('.')
}

/// Device names are reserved regardless of extension, so only the part
/// before the first `.` is compared.
pub fn is_reserved_device(segment: &str) -> bool {
    let base = segment.split('.').next().unwrap_or(segment).to_uppercase();
    RESERVED_DEVICE_NAMES.contains(&base.as_str())
}

fn is_special_segment(segment: &str) -> bool {
    matches!(segment, "" | "." | "..")
}

/// Checks every meaningful segment against the per-segment rules.
pub fn validate_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Vec<Issue> {
    let mut issues = Vec::new();
    for seg in segments {
        if is_special_segment(seg) {
            continue;
        }
        if contains_forbidden(seg) {
            issues.push(Issue::for_segment(
                IssueCode::ForbiddenChars,
                format!("Segment contains forbidden Windows characters or control chars: {seg:?}"),
                seg,
            ));
        }
        if has_trailing_space_or_period(seg) {
            issues.push(Issue::for_segment(
                IssueCode::TrailingSpacePeriod,
                format!("Segment ends with a trailing space or period: {seg:?}"),
                seg,
            ));
        }
        if is_reserved_device(seg) {
            issues.push(Issue::for_segment(
                IssueCode::ReservedDevice,
                format!("Segment is a reserved Windows device name: {seg:?}"),
                seg,
            ));
        }
    }
    issues
}

/// Validates a full relative path: every segment plus the length limit.
///
/// A path whose length equals `max_path` is already flagged.
pub fn validate_rel_path(rel_path: &str, config: &ScanConfig) -> Vec<Issue> {
    let mut issues = validate_segments(rel_path.split('/'));
    let len = char_len(rel_path);
    if len >= config.max_path {
        issues.push(Issue::new(
            IssueCode::PathTooLong,
            format!(
                "Relative path length {len} exceeds configured limit {}.",
                config.max_path
            ),
        ));
    }
    issues
}

/// Outcome of sanitizing one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFix {
    pub original: String,
    pub fixed: String,
    /// One note per step that changed the value, in order.
    pub changes: Vec<String>,
}

impl SegmentFix {
    pub fn changed(&self) -> bool {
        self.fixed != self.original
    }
}

/// Rewrites a segment so it passes every per-segment rule.
pub fn fix_segment(segment: &str, config: &ScanConfig) -> SegmentFix {
    let mut out = segment.to_string();
    let mut changes = Vec::new();

    if is_special_segment(segment) {
        return SegmentFix {
            original: segment.to_string(),
            fixed: out,
            changes,
        };
    }

    for &(ch, repl) in SUBSTITUTIONS {
        if out.contains(ch) {
            out = out.replace(ch, repl);
            changes.push(format!("Replace {ch:?} -> {repl:?}"));
        }
    }

    if out.chars().any(is_control) {
        out.retain(|c| !is_control(c));
        changes.push("Remove control chars (0-31)".to_string());
    }

    if has_trailing_space_or_period(&out) {
        let trimmed = out.trim_end_matches([' ', '.']).to_string();
        out = trimmed;
        changes.push("Trim trailing spaces/periods".to_string());
    }

    if out.is_empty() {
        out.push('_');
        changes.push("Replace empty name with '_'".to_string());
    }

    if is_reserved_device(&out) {
        out.push('_');
        changes.push("Append '_' to reserved device name".to_string());
    }

    if config.collapse_spaces && has_multiple_spaces(&out) {
        out = collapse_spaces(&out);
        changes.push("Collapse multiple spaces".to_string());
    }

    if config.normalize_unicode_nfc {
        let nfc = nfc_key(&out);
        if nfc != out {
            out = nfc;
            changes.push("Normalize Unicode to NFC".to_string());
        }
    }

    SegmentFix {
        original: segment.to_string(),
        fixed: out,
        changes,
    }
}

/// Case-insensitive comparison key using full Unicode case folding.
pub fn casefold_key(path: &str) -> String {
    caseless::default_case_fold_str(path)
}

/// Canonical composition (NFC) of the whole path.
pub fn nfc_key(path: &str) -> String {
    path.nfc().collect()
}

pub fn has_multiple_spaces(s: &str) -> bool {
    s.contains("  ")
}

/// Collapses every run of two or more spaces into one.
pub fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for c in s.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(c);
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    out
}

/// Length in Unicode scalar values.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Number of `/` separators in a path.
pub fn depth(rel_path: &str) -> usize {
    rel_path.matches('/').count()
}

/// True for `.git` itself and anything below it.
pub fn is_git_internal(rel_path: &str) -> bool {
    rel_path == ".git" || rel_path.starts_with(".git/")
}
