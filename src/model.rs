//! Scan findings and the items they are attached to.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of problem found on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    ForbiddenChars,
    TrailingSpacePeriod,
    ReservedDevice,
    PathTooLong,
    CaseCollision,
    UnicodeNfcCollision,
    Symlink,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::ForbiddenChars => "FORBIDDEN_CHARS",
            IssueCode::TrailingSpacePeriod => "TRAILING_SPACE_PERIOD",
            IssueCode::ReservedDevice => "RESERVED_DEVICE",
            IssueCode::PathTooLong => "PATH_TOO_LONG",
            IssueCode::CaseCollision => "CASE_COLLISION",
            IssueCode::UnicodeNfcCollision => "UNICODE_NFC_COLLISION",
            IssueCode::Symlink => "SYMLINK",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding on a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub code: IssueCode,
    pub message: String,
    /// Path segment the finding refers to, for per-segment rules.
    pub segment: Option<String>,
}

impl Issue {
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            segment: None,
        }
    }

    pub fn for_segment(code: IssueCode, message: impl Into<String>, segment: &str) -> Self {
        Self {
            code,
            message: message.into(),
            segment: Some(segment.to_string()),
        }
    }
}

/// Stable identifier of a fix strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixKey {
    Auto,
    Nfc,
    Spaces,
    Shorten,
    None,
}

impl FixKey {
    pub fn as_str(self) -> &'static str {
        match self {
            FixKey::Auto => "auto",
            FixKey::Nfc => "nfc",
            FixKey::Spaces => "spaces",
            FixKey::Shorten => "shorten",
            FixKey::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(FixKey::Auto),
            "nfc" => Some(FixKey::Nfc),
            "spaces" => Some(FixKey::Spaces),
            "shorten" => Some(FixKey::Shorten),
            "none" => Some(FixKey::None),
            _ => None,
        }
    }
}

impl fmt::Display for FixKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named candidate rewrite of a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOption {
    pub key: FixKey,
    pub label: String,
    /// Full candidate relative path.
    pub preview_path: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    File,
    Folder,
    Symlink,
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemType::File => "File",
            ItemType::Folder => "Folder",
            ItemType::Symlink => "Symlink",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemStatus {
    #[default]
    Pending,
    Renamed,
    Failed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::Pending => "Pending",
            ItemStatus::Renamed => "Renamed",
            ItemStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// One problematic filesystem entry found by a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanItem {
    pub item_type: ItemType,
    /// Repository-relative, `/`-separated.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub issues: Vec<Issue>,
    /// Currently selected candidate; equal to `rel_path` means "no change".
    pub proposed_fix: String,
    pub fix_options: Vec<FixOption>,
    pub chosen_fix_key: Option<FixKey>,
    pub status: ItemStatus,
    /// Whether the item takes part in the rename plan.
    pub selected: bool,
    pub warnings: Vec<String>,
}

impl ScanItem {
    pub fn has_issue(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    pub fn fix_option(&self, key: FixKey) -> Option<&FixOption> {
        self.fix_options.iter().find(|o| o.key == key)
    }

    /// Switches the proposed fix to the option keyed `key`.
    pub fn choose_fix(&mut self, key: FixKey) -> Result<()> {
        let option = self.fix_option(key).ok_or_else(|| Error::UnknownFixKey {
            key: key.to_string(),
            path: self.rel_path.clone(),
        })?;
        self.proposed_fix = option.preview_path.clone();
        self.chosen_fix_key = Some(key);
        Ok(())
    }

    /// True when applying this item would change its path.
    pub fn is_pending_rename(&self) -> bool {
        self.selected && self.proposed_fix != self.rel_path
    }
}
