// crates/gatekit-core/src/spec/id_list.rs
// ============================================================================
// Module: Gatekit ID List Model
// Description: In-memory representation of one append-only membership list.
// Purpose: §3 DATA MODEL "IDList", §4.D ID-list manager semantics.
// Dependencies: none
// ============================================================================

//! ## Overview
//! An [`IdList`] tracks the bookkeeping fields the directory sync protocol
//! needs (`size`, `creation_time`, `url`, `file_id`) alongside the set of
//! 8-character membership tokens patched in by [`IdList::apply_patch_line`].
//! Token hashing lives in [`crate::hashing::id_list_token`]; this type only
//! stores and mutates the resulting set.

use std::collections::BTreeSet;

/// One named, append-only membership list.
///
/// # Invariants
/// - `size` always equals the cumulative byte length of applied patch
///   bodies (§3 invariants); callers update it alongside
///   [`IdList::apply_patch_line`] via [`IdList::add_consumed_bytes`].
#[derive(Debug, Clone, Default)]
pub struct IdList {
    /// List name, matches the directory key.
    pub name: String,
    /// Cumulative bytes of patch content applied so far.
    pub size: u64,
    /// Server-reported creation time (used for reset/ignore decisions).
    pub creation_time: i64,
    /// Content URL for byte-range fetches.
    pub url: String,
    /// Server-reported content identity; a change (with fresh enough
    /// `creation_time`) triggers a reset.
    pub file_id: String,
    /// Current membership, as 8-character base64(sha256) tokens.
    members: BTreeSet<String>,
}

impl IdList {
    /// Creates an empty list adopting the server's directory metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, url: String, file_id: String, creation_time: i64) -> Self {
        Self {
            name: name.into(),
            size: 0,
            creation_time,
            url,
            file_id,
            members: BTreeSet::new(),
        }
    }

    /// Resets the list's membership and bookkeeping to adopt fresh
    /// directory metadata, per §4.D "fileID changed AND creationTime >=
    /// local.creationTime" reset semantics.
    pub fn reset(&mut self, url: String, file_id: String, creation_time: i64) {
        self.members.clear();
        self.size = 0;
        self.url = url;
        self.file_id = file_id;
        self.creation_time = creation_time;
    }

    /// Applies one non-empty patch line (`+token` or `-token`). Unknown
    /// leading bytes are ignored by the caller before reaching this method.
    pub fn apply_patch_line(&mut self, line: &str) {
        let Some(op) = line.as_bytes().first().copied() else {
            return;
        };
        let token = &line[1..];
        match op {
            b'+' => {
                self.members.insert(token.to_string());
            }
            b'-' => {
                self.members.remove(token);
            }
            _ => {}
        }
    }

    /// Accounts for `byte_len` additional bytes having been consumed by
    /// applied patch content, per the `size += content_length` contract.
    pub fn add_consumed_bytes(&mut self, byte_len: u64) {
        self.size += byte_len;
    }

    /// Returns true when `token` is present in the current membership set.
    #[must_use]
    pub fn contains_token(&self, token: &str) -> bool {
        self.members.contains(token)
    }

    /// Returns the number of members currently tracked.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Iterates current members in ascending token order, used when
    /// serializing the list back to a data adapter (§4.D "writing back").
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_add_and_remove_patches() {
        let mut list = IdList::new("test", "https://example".to_string(), "f1".to_string(), 0);
        list.apply_patch_line("+a");
        list.add_consumed_bytes(3);
        assert!(list.contains_token("a"));
        assert_eq!(list.size, 3);

        list.apply_patch_line("-a");
        list.apply_patch_line("+b");
        list.add_consumed_bytes(6);
        assert!(!list.contains_token("a"));
        assert!(list.contains_token("b"));
        assert_eq!(list.size, 9);
    }

    #[test]
    fn reset_clears_membership() {
        let mut list = IdList::new("test", "u1".to_string(), "f1".to_string(), 0);
        list.apply_patch_line("+a");
        list.add_consumed_bytes(3);
        list.reset("u2".to_string(), "f2".to_string(), 10);
        assert_eq!(list.size, 0);
        assert_eq!(list.member_count(), 0);
        assert_eq!(list.file_id, "f2");
        assert_eq!(list.creation_time, 10);
    }
}
