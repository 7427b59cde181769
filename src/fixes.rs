//! Fix-option generation.
//!
//! Builds the ordered list of candidate rewrites for one path. Index 0 is the
//! default proposal. Long-path shortening lives here too, but the scanner
//! decides when to offer it.

use crate::config::ScanConfig;
use crate::model::{FixKey, FixOption};
use crate::rules::{char_len, collapse_spaces, fix_segment, has_multiple_spaces, nfc_key};
use sha2::{Digest, Sha256};

/// Segments at or below this length are never shortened.
const SHORTEN_MIN_SEGMENT: usize = 12;
/// Characters kept from a shortened segment.
const SHORTEN_KEEP: usize = 8;
/// Hex digits of the content hash appended to shortened names.
const HASH_LEN: usize = 6;

/// Produces the candidate rewrites for `rel_path`.
///
/// Never returns an empty list: when sanitizing changes nothing, a
/// [`FixKey::None`] option pointing at the original path comes first.
pub fn generate_fix_options(rel_path: &str, config: &ScanConfig) -> Vec<FixOption> {
    let mut fixed_segments = Vec::new();
    let mut notes = Vec::new();
    let mut any_changes = false;

    for seg in rel_path.split('/') {
        let fx = fix_segment(seg, config);
        if fx.changed() {
            any_changes = true;
            notes.extend(fx.changes.iter().map(|c| format!("{seg:?}: {c}")));
        }
        fixed_segments.push(fx.fixed);
    }
    let fixed_path = fixed_segments.join("/");

    let mut options = Vec::new();
    if any_changes && fixed_path != rel_path {
        options.push(FixOption {
            key: FixKey::Auto,
            label: "Auto sanitize (recommended)".to_string(),
            preview_path: fixed_path,
            warnings: notes,
        });
    } else {
        options.push(FixOption {
            key: FixKey::None,
            label: "No change".to_string(),
            preview_path: rel_path.to_string(),
            warnings: Vec::new(),
        });
    }

    let nfc = nfc_key(rel_path);
    if nfc != rel_path {
        options.push(FixOption {
            key: FixKey::Nfc,
            label: "Normalize Unicode to NFC".to_string(),
            preview_path: nfc,
            warnings: vec!["Normalize full path to NFC".to_string()],
        });
    }

    if has_multiple_spaces(rel_path) {
        options.push(FixOption {
            key: FixKey::Spaces,
            label: "Collapse multiple spaces".to_string(),
            preview_path: collapse_spaces(rel_path),
            warnings: vec!["Collapse multiple spaces".to_string()],
        });
    }

    options
}

/// The `shorten` option offered for paths over the limit.
pub fn shorten_option(rel_path: &str, max_path: usize) -> FixOption {
    FixOption {
        key: FixKey::Shorten,
        label: format!("Shorten to <= {max_path}"),
        preview_path: shorten_path(rel_path, max_path),
        warnings: vec!["Heuristic truncation with hash suffix".to_string()],
    }
}

/// Shortens `rel_path` to at most `max_len` characters.
///
/// Long segments are cut to their first eight characters plus a hash of the
/// original segment, left to right, until the path fits. If that is not
/// enough the whole path is truncated and suffixed with a hash of the
/// original path.
pub fn shorten_path(rel_path: &str, max_len: usize) -> String {
    if char_len(rel_path) <= max_len {
        return rel_path.to_string();
    }

    let mut segs: Vec<String> = rel_path.split('/').map(str::to_string).collect();
    for i in 0..segs.len() {
        if joined_len(&segs) <= max_len {
            break;
        }
        if char_len(&segs[i]) > SHORTEN_MIN_SEGMENT {
            let head: String = segs[i].chars().take(SHORTEN_KEEP).collect();
            segs[i] = format!("{head}-{}", short_hash(&segs[i]));
        }
    }

    let shortened = segs.join("/");
    if char_len(&shortened) <= max_len {
        return shortened;
    }

    let hash = short_hash(rel_path);
    let tail_len = HASH_LEN + 1;
    if max_len < tail_len {
        return hash.chars().take(max_len).collect();
    }
    let head: String = shortened.chars().take(max_len - tail_len).collect();
    format!("{head}-{hash}")
}

fn joined_len(segs: &[String]) -> usize {
    segs.iter().map(|s| char_len(s)).sum::<usize>() + segs.len().saturating_sub(1)
}

/// First six hex digits of the SHA-256 of `s`.
pub fn short_hash(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_LEN);
    hex
}
