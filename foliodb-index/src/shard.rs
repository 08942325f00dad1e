// SPDX-License-Identifier: AGPL-3.0-or-later
// FolioDB - Filesystem-Backed JSON Document Database
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Index shard files
//!
//! One shard is a JSON object mapping composite keys to posting lists
//! (arrays of document ids), stored as `<index>_shard<N>.json`. Two
//! invariants hold after every mutation:
//!
//! - a document id appears at most once per composite key
//! - an empty posting list is removed eagerly, so key presence implies a
//!   non-empty posting
//!
//! A shard that fails to parse loads as empty with a warning; the next
//! committed write recreates it.

use std::collections::BTreeMap;
use std::path::Path;

use foliodb_core::Result;
use foliodb_storage::atomic;

/// Ordered list of document ids under one composite key.
pub type Postings = Vec<String>;

/// Key → postings content of one shard file.
pub type ShardMap = BTreeMap<String, Postings>;

/// File name of a shard: `<index>_shard<N>.json`.
pub fn shard_file_name(index_name: &str, shard_id: usize) -> String {
    format!("{}_shard{}.json", index_name, shard_id)
}

/// An in-memory shard with dirty tracking.
#[derive(Debug, Default)]
pub struct Shard {
    entries: ShardMap,
    dirty: bool,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a shard from disk. Absent and corrupt files both load as
    /// empty (the latter with a warning from the lenient reader).
    pub fn load(path: &Path) -> Result<Self> {
        let entries = atomic::read_json_lenient::<ShardMap>(path)?.unwrap_or_default();
        Ok(Self {
            entries,
            dirty: false,
        })
    }

    /// Atomically rewrite the shard file.
    pub fn persist(&mut self, path: &Path) -> Result<()> {
        atomic::write_json(path, &self.entries)?;
        self.dirty = false;
        Ok(())
    }

    /// Append `doc_id` under `key` unless already present. Returns
    /// whether the shard changed.
    pub fn add(&mut self, key: &str, doc_id: &str) -> bool {
        let postings = self.entries.entry(key.to_string()).or_default();
        if postings.iter().any(|id| id == doc_id) {
            return false;
        }
        postings.push(doc_id.to_string());
        self.dirty = true;
        true
    }

    /// Drop `doc_id` from the posting under `key`; the key itself is
    /// dropped when its posting becomes empty. Returns whether the shard
    /// changed.
    pub fn remove(&mut self, key: &str, doc_id: &str) -> bool {
        let Some(postings) = self.entries.get_mut(key) else {
            return false;
        };
        let before = postings.len();
        postings.retain(|id| id != doc_id);
        if postings.len() == before {
            return false;
        }
        if postings.is_empty() {
            self.entries.remove(key);
        }
        self.dirty = true;
        true
    }

    pub fn get(&self, key: &str) -> Option<&Postings> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &ShardMap {
        &self.entries
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn add_is_idempotent_per_key() {
        let mut shard = Shard::new();
        assert!(shard.add("29", "a"));
        assert!(!shard.add("29", "a"));
        assert!(shard.add("29", "b"));
        assert_eq!(shard.get("29").unwrap(), &vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn empty_postings_are_removed_eagerly() {
        let mut shard = Shard::new();
        shard.add("29", "a");
        assert!(shard.remove("29", "a"));
        assert!(shard.get("29").is_none());
        assert!(shard.is_empty());
        assert!(!shard.remove("29", "a"));
    }

    #[test]
    fn persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(shard_file_name("age", 3));

        let mut shard = Shard::new();
        shard.add("29", "a");
        shard.add("30", "b");
        assert!(shard.is_dirty());
        shard.persist(&path).unwrap();
        assert!(!shard.is_dirty());

        let back = Shard::load(&path).unwrap();
        assert_eq!(back.entries(), shard.entries());
    }

    #[test]
    fn corrupt_shard_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(shard_file_name("age", 0));
        fs::write(&path, b"]]] nonsense").unwrap();

        let shard = Shard::load(&path).unwrap();
        assert!(shard.is_empty());
    }

    #[test]
    fn missing_shard_loads_empty() {
        let dir = TempDir::new().unwrap();
        let shard = Shard::load(&dir.path().join("absent.json")).unwrap();
        assert!(shard.is_empty());
    }
}
