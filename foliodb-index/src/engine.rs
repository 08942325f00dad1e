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

//! Index engine
//!
//! One engine owns one named index: an ordered field list and
//! `shard_count` shard files under the collection's `_indices` directory.
//! A document is represented in the index iff **all** its indexed fields
//! are defined, non-null, and scalar; its composite key routes to exactly
//! one shard and never moves.
//!
//! Mutations are eager: `add`/`remove` load the owning shard (through the
//! residency cache), mutate in memory, and atomically rewrite the shard
//! file before returning. Exact lookups touch one shard; prefix and range
//! lookups scan every shard — there is no cross-shard key order to seek
//! in.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use foliodb_core::{lookup_path, normalize, Document, FolioDbError, Result};
use foliodb_storage::atomic;

use crate::cache::{CacheStats, ShardCache, DEFAULT_CACHE_CAPACITY};
use crate::key;
use crate::shard::{shard_file_name, Shard, ShardMap};

/// Default number of shard files per index.
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// Directory under the collection root holding all index shards.
pub const INDEX_DIR: &str = "_indices";

/// On-disk condition of one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDiskState {
    /// No shard file exists.
    Missing,
    /// At least one shard file exists and all parse.
    Present,
    /// At least one shard file exists but fails to parse.
    Corrupted,
}

#[derive(Debug)]
pub struct IndexEngine {
    name: String,
    dir: PathBuf,
    fields: Vec<String>,
    shard_count: usize,
    cache: Mutex<ShardCache>,
}

impl IndexEngine {
    pub fn new<P: AsRef<Path>>(collection_dir: P, name: &str, fields: Vec<String>) -> Self {
        Self::with_shard_count(collection_dir, name, fields, DEFAULT_SHARD_COUNT)
    }

    pub fn with_shard_count<P: AsRef<Path>>(
        collection_dir: P,
        name: &str,
        fields: Vec<String>,
        shard_count: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            dir: collection_dir.as_ref().join(INDEX_DIR),
            fields,
            shard_count: shard_count.max(1),
            cache: Mutex::new(ShardCache::new(DEFAULT_CACHE_CAPACITY)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexed fields, in declared order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    fn shard_path(&self, shard_id: usize) -> PathBuf {
        self.dir.join(shard_file_name(&self.name, shard_id))
    }

    /// The document's values for this index, in declared field order, or
    /// `None` when any indexed field is undefined, null, or non-scalar.
    pub fn values_for(&self, doc: &Document) -> Option<Vec<Value>> {
        let mut values = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = lookup_path(doc, field)?;
            if value.is_null() || normalize(value).is_none() {
                return None;
            }
            values.push(value.clone());
        }
        Some(values)
    }

    /// The composite key this document generates for the index, or `None`
    /// when the document is not covered. Separator-poisoned values are an
    /// error, surfaced before any write happens.
    pub fn key_for(&self, doc: &Document) -> Result<Option<String>> {
        match self.values_for(doc) {
            Some(values) => Ok(Some(key::encode_key(&values)?)),
            None => Ok(None),
        }
    }

    fn load_resident<'c>(
        &self,
        cache: &'c mut ShardCache,
        shard_id: usize,
    ) -> Result<&'c mut Shard> {
        if cache.get_mut(shard_id).is_none() {
            let shard = Shard::load(&self.shard_path(shard_id))?;
            if let Some((evicted_id, mut evicted)) = cache.insert(shard_id, shard) {
                if evicted.is_dirty() {
                    evicted.persist(&self.shard_path(evicted_id))?;
                }
            }
        }
        Ok(cache
            .peek_mut(shard_id)
            .expect("shard resident after insert"))
    }

    /// Register `doc_id` under the composite key of `values` and
    /// atomically persist the owning shard.
    pub fn add(&self, values: &[Value], doc_id: &str) -> Result<()> {
        let key = key::encode_key(values)?;
        let shard_id = key::shard_for_key(&key, self.shard_count);
        let path = self.shard_path(shard_id);
        let mut cache = self.cache.lock();
        let shard = self.load_resident(&mut cache, shard_id)?;
        if shard.add(&key, doc_id) {
            shard.persist(&path)?;
        }
        Ok(())
    }

    /// Drop `doc_id` from the composite key of `values` and atomically
    /// persist the owning shard.
    pub fn remove(&self, values: &[Value], doc_id: &str) -> Result<()> {
        let key = key::encode_key(values)?;
        let shard_id = key::shard_for_key(&key, self.shard_count);
        let path = self.shard_path(shard_id);
        let mut cache = self.cache.lock();
        let shard = self.load_resident(&mut cache, shard_id)?;
        if shard.remove(&key, doc_id) {
            shard.persist(&path)?;
        }
        Ok(())
    }

    /// Posting list for a fully-specified key. Empty when absent.
    pub fn get_exact(&self, values: &[Value]) -> Result<Vec<String>> {
        if values.len() != self.fields.len() {
            return Err(FolioDbError::InvalidArgument(format!(
                "index '{}' expects {} values for an exact lookup, got {}",
                self.name,
                self.fields.len(),
                values.len()
            )));
        }
        let key = key::encode_key(values)?;
        let shard_id = key::shard_for_key(&key, self.shard_count);
        let mut cache = self.cache.lock();
        let shard = self.load_resident(&mut cache, shard_id)?;
        Ok(shard.get(&key).cloned().unwrap_or_default())
    }

    /// Union of posting lists whose composite key extends the given
    /// prefix by whole segments. Requires `1 <= |prefix| < |fields|`.
    /// Scans every shard; duplicates removed.
    pub fn get_prefix(&self, prefix_values: &[Value]) -> Result<Vec<String>> {
        if prefix_values.is_empty() || prefix_values.len() >= self.fields.len() {
            return Err(FolioDbError::InvalidArgument(format!(
                "index '{}' prefix lookup needs 1..{} values, got {}",
                self.name,
                self.fields.len(),
                prefix_values.len()
            )));
        }
        let prefix = key::encode_key(prefix_values)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut cache = self.cache.lock();
        for shard_id in 0..self.shard_count {
            let shard = self.load_resident(&mut cache, shard_id)?;
            for (key, postings) in shard.entries() {
                if key::matches_prefix(key, &prefix) {
                    for id in postings {
                        if seen.insert(id.clone()) {
                            out.push(id.clone());
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Ids whose final key segment, parsed as a number, falls in
    /// `[min, max]`, under the given prefix of all-but-the-last indexed
    /// fields. Scans every shard.
    pub fn get_range(
        &self,
        prefix_values: &[Value],
        min: f64,
        max: f64,
    ) -> Result<Vec<String>> {
        if prefix_values.len() + 1 != self.fields.len() {
            return Err(FolioDbError::InvalidArgument(format!(
                "index '{}' range lookup needs {} prefix values, got {}",
                self.name,
                self.fields.len() - 1,
                prefix_values.len()
            )));
        }
        let prefix = key::encode_key(prefix_values)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut cache = self.cache.lock();
        for shard_id in 0..self.shard_count {
            let shard = self.load_resident(&mut cache, shard_id)?;
            for (key, postings) in shard.entries() {
                if !prefix.is_empty() && !key::matches_prefix(key, &prefix) {
                    continue;
                }
                let Ok(value) = key::last_segment(key).parse::<f64>() else {
                    continue;
                };
                if value < min || value > max {
                    continue;
                }
                for id in postings {
                    if seen.insert(id.clone()) {
                        out.push(id.clone());
                    }
                }
            }
        }
        Ok(out)
    }

    /// Full rebuild: delete every shard file, stream the documents, and
    /// write all non-empty shards atomically. Documents missing any
    /// indexed field are skipped; so are documents whose values cannot be
    /// encoded, with a warning.
    pub fn build_from_documents<I>(&self, docs: I) -> Result<usize>
    where
        I: IntoIterator<Item = Document>,
    {
        self.delete_shard_files()?;
        let mut shards: Vec<Shard> = (0..self.shard_count).map(|_| Shard::new()).collect();
        let mut indexed = 0usize;

        for doc in docs {
            let Some(id) = doc.get("id").and_then(|v| v.as_str()) else {
                warn!(
                    "index '{}': skipping document without string id during build",
                    self.name
                );
                continue;
            };
            let Some(values) = self.values_for(&doc) else {
                continue;
            };
            let key = match key::encode_key(&values) {
                Ok(key) => key,
                Err(err) => {
                    warn!(
                        "index '{}': skipping document '{}' during build: {}",
                        self.name, id, err
                    );
                    continue;
                }
            };
            let shard_id = key::shard_for_key(&key, self.shard_count);
            shards[shard_id].add(&key, id);
            indexed += 1;
        }

        for (shard_id, shard) in shards.iter_mut().enumerate() {
            if !shard.is_empty() {
                shard.persist(&self.shard_path(shard_id))?;
            }
        }
        self.cache.lock().drain();
        debug!("index '{}' built from {} covered documents", self.name, indexed);
        Ok(indexed)
    }

    /// Concatenated key → postings map across every shard. Keys are
    /// returned in lexicographic order of their normalized form.
    pub fn get_all_keys(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut all = BTreeMap::new();
        let mut cache = self.cache.lock();
        for shard_id in 0..self.shard_count {
            let shard = self.load_resident(&mut cache, shard_id)?;
            for (key, postings) in shard.entries() {
                all.insert(key.clone(), postings.clone());
            }
        }
        Ok(all)
    }

    /// Flush any dirty resident shards and drop residency.
    pub fn close(&self) -> Result<()> {
        let mut cache = self.cache.lock();
        for (shard_id, mut shard) in cache.drain() {
            if shard.is_dirty() {
                shard.persist(&self.shard_path(shard_id))?;
            }
        }
        Ok(())
    }

    /// Remove every shard file of this index from disk.
    pub fn delete_shard_files(&self) -> Result<()> {
        for shard_id in 0..self.shard_count {
            match fs::remove_file(self.shard_path(shard_id)) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        self.cache.lock().drain();
        Ok(())
    }

    /// Whether any shard file exists on disk.
    pub fn exists_on_disk(&self) -> bool {
        (0..self.shard_count).any(|shard_id| self.shard_path(shard_id).exists())
    }

    /// Strict on-disk health probe: parses every existing shard file.
    pub fn disk_state(&self) -> IndexDiskState {
        let mut present = false;
        for shard_id in 0..self.shard_count {
            let path = self.shard_path(shard_id);
            if !path.exists() {
                continue;
            }
            present = true;
            if atomic::read_json::<ShardMap>(&path).is_err() {
                return IndexDiskState::Corrupted;
            }
        }
        if present {
            IndexDiskState::Present
        } else {
            IndexDiskState::Missing
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(v: serde_json::Value) -> Document {
        serde_json::from_value(v).unwrap()
    }

    fn engine(dir: &Path, fields: &[&str]) -> IndexEngine {
        IndexEngine::new(
            dir,
            "test_idx",
            fields.iter().map(|f| f.to_string()).collect(),
        )
    }

    /// Count how many (shard, key) slots reference an id, across every
    /// shard file on disk.
    fn occurrences(e: &IndexEngine, dir: &Path, id: &str) -> usize {
        let mut n = 0;
        for shard_id in 0..e.shard_count() {
            let path = dir
                .join(INDEX_DIR)
                .join(shard_file_name("test_idx", shard_id));
            if let Ok(Some(map)) = atomic::read_json::<ShardMap>(&path) {
                for postings in map.values() {
                    n += postings.iter().filter(|p| p.as_str() == id).count();
                }
            }
        }
        n
    }

    #[test]
    fn add_places_id_in_exactly_one_shard() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age", "role"]);
        e.add(&[json!(29), json!("designer")], "X").unwrap();
        e.add(&[json!(29), json!("designer")], "X").unwrap(); // idempotent

        assert_eq!(occurrences(&e, dir.path(), "X"), 1);
        assert_eq!(
            e.get_exact(&[json!(29), json!("designer")]).unwrap(),
            vec!["X".to_string()]
        );
    }

    #[test]
    fn remove_drops_posting_and_empty_key() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age"]);
        e.add(&[json!(29)], "X").unwrap();
        e.add(&[json!(29)], "Y").unwrap();

        e.remove(&[json!(29)], "X").unwrap();
        assert_eq!(e.get_exact(&[json!(29)]).unwrap(), vec!["Y".to_string()]);
        assert_eq!(occurrences(&e, dir.path(), "X"), 0);

        e.remove(&[json!(29)], "Y").unwrap();
        assert!(e.get_exact(&[json!(29)]).unwrap().is_empty());
        assert!(e.get_all_keys().unwrap().is_empty());
    }

    #[test]
    fn exact_lookup_rejects_wrong_arity() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age", "role"]);
        assert!(matches!(
            e.get_exact(&[json!(29)]),
            Err(FolioDbError::InvalidArgument(_))
        ));
    }

    #[test]
    fn prefix_lookup_unions_across_shards() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age", "role", "active"]);
        e.add(&[json!(29), json!("designer"), json!(true)], "X").unwrap();
        e.add(&[json!(29), json!("designer"), json!(false)], "Y").unwrap();
        e.add(&[json!(29), json!("developer"), json!(true)], "Z").unwrap();
        e.add(&[json!(30), json!("designer"), json!(true)], "W").unwrap();

        let mut hits = e.get_prefix(&[json!(29), json!("designer")]).unwrap();
        hits.sort();
        assert_eq!(hits, vec!["X".to_string(), "Y".to_string()]);

        let mut hits = e.get_prefix(&[json!(29)]).unwrap();
        hits.sort();
        assert_eq!(hits, vec!["X".to_string(), "Y".to_string(), "Z".to_string()]);
    }

    #[test]
    fn prefix_lookup_rejects_bad_arity() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age", "role"]);
        assert!(e.get_prefix(&[]).is_err());
        assert!(e.get_prefix(&[json!(1), json!(2)]).is_err());
    }

    #[test]
    fn range_filters_on_last_segment() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["role", "age"]);
        e.add(&[json!("dev"), json!(25)], "A").unwrap();
        e.add(&[json!("dev"), json!(30)], "B").unwrap();
        e.add(&[json!("dev"), json!(35)], "C").unwrap();
        e.add(&[json!("ops"), json!(30)], "D").unwrap();

        let mut hits = e.get_range(&[json!("dev")], 26.0, 35.0).unwrap();
        hits.sort();
        assert_eq!(hits, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn range_on_single_field_index_takes_empty_prefix() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age"]);
        e.add(&[json!(25)], "A").unwrap();
        e.add(&[json!(30)], "B").unwrap();

        let hits = e.get_range(&[], 28.0, 40.0).unwrap();
        assert_eq!(hits, vec!["B".to_string()]);
        assert!(e.get_range(&[json!(1)], 0.0, 1.0).is_err());
    }

    #[test]
    fn build_skips_uncovered_documents() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age", "role"]);
        let docs = vec![
            doc(json!({ "id": "X", "age": 29, "role": "designer" })),
            doc(json!({ "id": "Y", "age": 30 })),            // missing role
            doc(json!({ "id": "Z", "age": null, "role": "x" })), // null age
            doc(json!({ "id": "W", "age": [1], "role": "x" })),  // non-scalar
        ];
        let indexed = e.build_from_documents(docs).unwrap();
        assert_eq!(indexed, 1);
        assert_eq!(
            e.get_exact(&[json!(29), json!("designer")]).unwrap(),
            vec!["X".to_string()]
        );
    }

    #[test]
    fn rebuild_replaces_previous_state() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age"]);
        e.add(&[json!(29)], "OLD").unwrap();

        e.build_from_documents(vec![doc(json!({ "id": "NEW", "age": 31 }))])
            .unwrap();
        assert!(e.get_exact(&[json!(29)]).unwrap().is_empty());
        assert_eq!(e.get_exact(&[json!(31)]).unwrap(), vec!["NEW".to_string()]);
    }

    #[test]
    fn disk_state_reports_health() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["age"]);
        assert_eq!(e.disk_state(), IndexDiskState::Missing);

        e.add(&[json!(29)], "X").unwrap();
        assert_eq!(e.disk_state(), IndexDiskState::Present);

        // Corrupt the shard that holds the key
        let shard_id = key::shard_for_key(&key::encode_key(&[json!(29)]).unwrap(), e.shard_count());
        let path = dir
            .path()
            .join(INDEX_DIR)
            .join(shard_file_name("test_idx", shard_id));
        fs::write(&path, b"{ truncated").unwrap();
        assert_eq!(e.disk_state(), IndexDiskState::Corrupted);
    }

    #[test]
    fn values_for_honours_field_order_and_paths() {
        let dir = TempDir::new().unwrap();
        let e = engine(dir.path(), &["profile.age", "role"]);
        let d = doc(json!({ "id": "X", "role": "dev", "profile": { "age": 29 } }));
        let values = e.values_for(&d).unwrap();
        assert_eq!(values, vec![json!(29), json!("dev")]);
    }
}
