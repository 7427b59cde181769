//! Collision detection over the full candidate path set.
//!
//! Two paths collide when they differ as strings but a case-insensitive or
//! normalization-insensitive filesystem would store them under one name.

use crate::rules::{casefold_key, nfc_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collision key to the original paths sharing it. Only groups of two or more.
pub type CollisionMap = BTreeMap<String, Vec<String>>;

/// Both collision maps for one path universe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collisions {
    pub case_insensitive: CollisionMap,
    pub nfc: CollisionMap,
}

impl Collisions {
    pub fn detect<S: AsRef<str>>(paths: &[S]) -> Self {
        Self {
            case_insensitive: detect_case_collisions(paths),
            nfc: detect_nfc_collisions(paths),
        }
    }

    pub fn case_group(&self, rel_path: &str) -> Option<&Vec<String>> {
        self.case_insensitive.get(&casefold_key(rel_path))
    }

    pub fn nfc_group(&self, rel_path: &str) -> Option<&Vec<String>> {
        self.nfc.get(&nfc_key(rel_path))
    }
}

/// Groups paths by case-fold key.
///
/// Callers pass a deduplicated set; a path listed twice would form a group
/// with itself.
pub fn detect_case_collisions<S: AsRef<str>>(paths: &[S]) -> CollisionMap {
    group_by(paths, casefold_key)
}

/// Groups paths by NFC key, ignoring repeated identical originals.
pub fn detect_nfc_collisions<S: AsRef<str>>(paths: &[S]) -> CollisionMap {
    let mut groups = group_by(paths, nfc_key);
    for members in groups.values_mut() {
        let mut seen = Vec::with_capacity(members.len());
        members.retain(|m| {
            if seen.contains(m) {
                false
            } else {
                seen.push(m.clone());
                true
            }
        });
    }
    groups.retain(|_, members| members.len() > 1);
    groups
}

fn group_by<S: AsRef<str>>(paths: &[S], key: impl Fn(&str) -> String) -> CollisionMap {
    let mut map: CollisionMap = BTreeMap::new();
    for p in paths {
        let p = p.as_ref();
        map.entry(key(p)).or_default().push(p.to_string());
    }
    map.retain(|_, members| members.len() > 1);
    map
}
