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

//! Collection facade
//!
//! The write pipeline for one collection: validate against the schema,
//! persist the document atomically, then fan the change out to every
//! index whose fields the document covers. All writes to a collection
//! serialize on a single write lock; queries never take it —
//! read-your-writes holds because a write's atomic rename completes
//! before the call returns.
//!
//! Index keys are computed *before* the document is persisted, so a
//! value the index cannot encode rejects the whole write instead of
//! leaving a document outside its declared indices.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use foliodb_core::{Document, FolioDbError, Result, Schema};
use foliodb_index::{key, IndexEngine, IndexHealthReport, INDEX_DIR};
use foliodb_query::{FindQuery, FindResult, QueryExecutor, RelationResolver};
use foliodb_storage::{atomic, DocumentStore};

use crate::database::DatabaseInner;

/// Size and shape summary of a collection.
#[derive(Debug, Clone)]
pub struct CollectionStats {
    pub name: String,
    /// Document count, by enumeration.
    pub document_count: usize,
    /// Declared index names.
    pub indices: Vec<String>,
}

#[derive(Debug)]
pub struct Collection {
    name: String,
    dir: PathBuf,
    schema: Schema,
    store: DocumentStore,
    indices: HashMap<String, Arc<IndexEngine>>,
    /// Indices known to exist on disk (built at open or lazily).
    built: Mutex<HashSet<String>>,
    write_lock: Mutex<()>,
    db: Weak<DatabaseInner>,
}

impl Collection {
    /// Instantiate a collection under the database root.
    ///
    /// With `skip_initial_build` set and the collection already on disk,
    /// declared indices attach without rebuilding; a declared index with
    /// no shard files is then lazily built at the first write. In every
    /// other case all declared indices are built from the current
    /// document set.
    pub(crate) fn open(
        name: &str,
        db_root: &Path,
        schema: Schema,
        db: Weak<DatabaseInner>,
        skip_initial_build: bool,
    ) -> Result<Arc<Self>> {
        schema.check()?;
        let dir = db_root.join(name);
        let existed = dir.is_dir();
        fs::create_dir_all(&dir)?;
        let swept = atomic::sweep_temp_files(&dir)?;
        if swept > 0 {
            warn!(
                "collection '{}': removed {} orphaned temp file(s) from an aborted write",
                name, swept
            );
        }

        let store = DocumentStore::new(&dir);
        let indices: HashMap<String, Arc<IndexEngine>> = schema
            .indices
            .iter()
            .map(|(index_name, fields)| {
                (
                    index_name.clone(),
                    Arc::new(IndexEngine::new(&dir, index_name, fields.clone())),
                )
            })
            .collect();

        let collection = Self {
            name: name.to_string(),
            dir,
            schema,
            store,
            indices,
            built: Mutex::new(HashSet::new()),
            write_lock: Mutex::new(()),
            db,
        };

        if skip_initial_build && existed {
            let mut built = collection.built.lock();
            for (index_name, engine) in &collection.indices {
                if engine.exists_on_disk() {
                    built.insert(index_name.clone());
                }
            }
        } else {
            collection.build_all_indices()?;
        }

        Ok(Arc::new(collection))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert a document: synthesize an id, validate, persist, and fan
    /// out to every covering index.
    pub fn insert(&self, mut doc: Document) -> Result<Document> {
        let _guard = self.write_lock.lock();
        self.ensure_indices_built()?;

        let id = uuid::Uuid::new_v4().to_string();
        doc.insert("id".to_string(), Value::String(id.clone()));

        self.schema.validate_document(&doc)?;
        self.validate_relations(&doc)?;
        let entries = self.index_entries(&doc)?;

        self.store.save_document(&id, &doc)?;
        for (engine, values) in entries {
            engine.add(&values, &id)?;
        }
        debug!("collection '{}': inserted {}", self.name, id);
        Ok(doc)
    }

    /// Update a document: shallow-merge the changes over the stored
    /// document, re-validate, persist, and reposition index entries
    /// whose composite key changed. `id` is immutable.
    pub fn update(&self, id: &str, changes: Document) -> Result<Document> {
        let _guard = self.write_lock.lock();
        self.ensure_indices_built()?;

        let old = self
            .store
            .load_document(id)?
            .ok_or_else(|| FolioDbError::NotFound(format!("document '{}'", id)))?;

        let mut updated = old.clone();
        for (field, value) in changes {
            if field == "id" {
                continue;
            }
            updated.insert(field, value);
        }

        self.schema.validate_document(&updated)?;
        self.validate_relations(&updated)?;

        // Only indices whose composite key actually changed are touched.
        let mut moves = Vec::new();
        for engine in self.indices.values() {
            if engine.key_for(&old)? == engine.key_for(&updated)? {
                continue;
            }
            moves.push((
                engine.clone(),
                engine.values_for(&old),
                engine.values_for(&updated),
            ));
        }

        self.store.save_document(id, &updated)?;
        for (engine, old_values, new_values) in moves {
            if let Some(values) = old_values {
                engine.remove(&values, id)?;
            }
            if let Some(values) = new_values {
                engine.add(&values, id)?;
            }
        }
        debug!("collection '{}': updated {}", self.name, id);
        Ok(updated)
    }

    /// Delete a document and every index entry it participated in.
    /// Returns false when the id is unknown.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock();

        let Some(old) = self.store.load_document(id)? else {
            return Ok(false);
        };
        self.store.delete_document(id)?;
        for engine in self.indices.values() {
            if let Some(values) = engine.values_for(&old) {
                engine.remove(&values, id)?;
            }
        }
        debug!("collection '{}': deleted {}", self.name, id);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn get_by_id(&self, id: &str) -> Result<Option<Document>> {
        self.store.load_document(id)
    }

    /// Run a find query through the planner and executor.
    pub fn find(&self, query: &FindQuery) -> Result<FindResult> {
        QueryExecutor::new(&self.store, &self.indices).find(query, Some(self))
    }

    /// The access strategy the planner would pick for this query.
    pub fn explain(&self, query: &FindQuery) -> Result<foliodb_query::Strategy> {
        QueryExecutor::new(&self.store, &self.indices).explain(query)
    }

    /// First document whose `field` equals `value`.
    pub(crate) fn find_by_field(&self, field: &str, value: &Value) -> Result<Option<Document>> {
        if field == "id" {
            if let Some(id) = value.as_str() {
                return self.get_by_id(id);
            }
        }
        let mut clause = serde_json::Map::new();
        clause.insert(field.to_string(), value.clone());
        let query = FindQuery::new()
            .where_clause(Value::Object(clause))
            .limit(1);
        let mut result = QueryExecutor::new(&self.store, &self.indices).find(&query, None)?;
        Ok(result.results.pop())
    }

    // ------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------

    /// Delete every file under `_indices/` and rebuild all declared
    /// indices from the current document set.
    pub fn rebuild_all_indices(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let indices_dir = self.dir.join(INDEX_DIR);
        if indices_dir.is_dir() {
            for entry in fs::read_dir(&indices_dir)? {
                let path = entry?.path();
                if path.is_file() {
                    fs::remove_file(path)?;
                }
            }
        }
        self.built.lock().clear();
        self.build_all_indices()?;
        info!("collection '{}': rebuilt all indices", self.name);
        Ok(())
    }

    /// Expected / present / missing / corrupted classification of the
    /// declared indices.
    pub fn check_indices_health(&self) -> IndexHealthReport {
        IndexHealthReport::check(self.indices.values().map(|e| e.as_ref()))
    }

    pub fn stats(&self) -> CollectionStats {
        let mut indices: Vec<String> = self.indices.keys().cloned().collect();
        indices.sort();
        CollectionStats {
            name: self.name.clone(),
            document_count: self.store.count_documents(),
            indices,
        }
    }

    /// Flush index residency. Pending shard writes are already on disk;
    /// this drops caches.
    pub fn close(&self) -> Result<()> {
        for engine in self.indices.values() {
            engine.close()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn build_all_indices(&self) -> Result<()> {
        let mut built = self.built.lock();
        for (index_name, engine) in &self.indices {
            engine.build_from_documents(self.store.all_documents())?;
            built.insert(index_name.clone());
        }
        Ok(())
    }

    /// A declared index missing from disk (for example after opening
    /// with `skip_initial_index_build`) is built transparently before
    /// the first write applies.
    fn ensure_indices_built(&self) -> Result<()> {
        let mut built = self.built.lock();
        for (index_name, engine) in &self.indices {
            if built.contains(index_name) {
                continue;
            }
            info!(
                "collection '{}': lazily building index '{}'",
                self.name, index_name
            );
            engine.build_from_documents(self.store.all_documents())?;
            built.insert(index_name.clone());
        }
        Ok(())
    }

    /// Index values for every index covering the document. Computing the
    /// keys here surfaces encoding errors before anything is written.
    fn index_entries(&self, doc: &Document) -> Result<Vec<(Arc<IndexEngine>, Vec<Value>)>> {
        let mut entries = Vec::new();
        for engine in self.indices.values() {
            if let Some(values) = engine.values_for(doc) {
                key::encode_key(&values)?;
                entries.push((engine.clone(), values));
            }
        }
        Ok(entries)
    }

    /// With `validate_relations` set, every relation-bearing value must
    /// resolve in its target collection.
    fn validate_relations(&self, doc: &Document) -> Result<()> {
        if !self.schema.validate_relations {
            return Ok(());
        }
        for (local, spec, value) in self.schema.active_relations(doc) {
            let db = self.db.upgrade().ok_or_else(|| {
                FolioDbError::Relation("database handle is gone".to_string())
            })?;
            let target = db.get_collection(&spec.collection).ok_or_else(|| {
                FolioDbError::Relation(format!(
                    "relation '{}' targets unknown collection '{}'",
                    local, spec.collection
                ))
            })?;

            let references: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };
            for reference in references {
                if target.find_by_field(&spec.field, reference)?.is_none() {
                    return Err(FolioDbError::Relation(format!(
                        "relation '{}': no record in '{}' with {} = {}",
                        local, spec.collection, spec.field, reference
                    )));
                }
            }
        }
        Ok(())
    }
}

impl RelationResolver for Collection {
    fn resolve(&self, relation: &str, value: &Value) -> Result<Option<Document>> {
        let Some(spec) = self.schema.relations.get(relation) else {
            return Ok(None);
        };
        let Some(db) = self.db.upgrade() else {
            return Ok(None);
        };
        let Some(target) = db.get_collection(&spec.collection) else {
            return Ok(None);
        };
        target.find_by_field(&spec.field, value)
    }
}
