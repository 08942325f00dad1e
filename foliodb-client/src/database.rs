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

//! Database root
//!
//! Owns the metadata file and the collection map. `create` refuses a
//! non-empty directory; `open` requires the metadata file and
//! auto-discovers every collection recorded in it, with the schema each
//! was created with. The database handle is passed into collections
//! explicitly (as a weak reference) for relation validation and
//! population — nothing here is ambient state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use foliodb_core::{
    DatabaseMetadata, FolioDbError, Result, Schema, METADATA_FILENAME,
};
use foliodb_storage::{atomic, BackupManager, BackupMetadata};

use crate::collection::Collection;

/// Options applied at create/open time.
#[derive(Debug, Clone, Default)]
pub struct DatabaseOptions {
    /// On open, attach existing indices without rebuilding them. A
    /// declared index missing from disk is lazily built at the first
    /// write to its collection.
    pub skip_initial_index_build: bool,
}

#[derive(Debug)]
pub(crate) struct DatabaseInner {
    root: PathBuf,
    options: DatabaseOptions,
    metadata: RwLock<DatabaseMetadata>,
    collections: DashMap<String, Arc<Collection>>,
}

impl DatabaseInner {
    pub(crate) fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.get(name).map(|entry| entry.value().clone())
    }

    fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILENAME)
    }

    fn persist_metadata(&self) -> Result<()> {
        atomic::write_json(&self.metadata_path(), &*self.metadata.read())
    }
}

/// An embedded FolioDB database rooted at one directory.
#[derive(Debug)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Create a new database in an empty (or absent) directory.
    pub fn create<P: AsRef<Path>>(path: P, options: DatabaseOptions) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if root.is_dir() && fs::read_dir(&root)?.next().is_some() {
            return Err(FolioDbError::NotEmptyDatabase(root.display().to_string()));
        }
        fs::create_dir_all(&root)?;

        let inner = Arc::new(DatabaseInner {
            root,
            options,
            metadata: RwLock::new(DatabaseMetadata::new()),
            collections: DashMap::new(),
        });
        inner.persist_metadata()?;
        info!("created database at {}", inner.root.display());
        Ok(Self { inner })
    }

    /// Open an existing database and auto-discover its collections from
    /// the metadata file.
    pub fn open<P: AsRef<Path>>(path: P, options: DatabaseOptions) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let metadata: DatabaseMetadata =
            atomic::read_json(&root.join(METADATA_FILENAME))?.ok_or_else(|| {
                FolioDbError::MissingDatabase(root.display().to_string())
            })?;

        let inner = Arc::new(DatabaseInner {
            root,
            options,
            metadata: RwLock::new(metadata),
            collections: DashMap::new(),
        });

        let entries: Vec<(String, Schema)> = {
            let metadata = inner.metadata.read();
            metadata
                .collections
                .iter()
                .map(|(name, entry)| (name.clone(), entry.schema.clone()))
                .collect()
        };
        for (name, schema) in entries {
            let collection = Collection::open(
                &name,
                &inner.root,
                schema,
                Arc::downgrade(&inner),
                inner.options.skip_initial_index_build,
            )?;
            inner.collections.insert(name, collection);
        }

        debug!(
            "opened database at {} with {} collection(s)",
            inner.root.display(),
            inner.collections.len()
        );
        Ok(Self { inner })
    }

    /// Fetch an existing collection, or create it when a schema is
    /// supplied.
    pub fn collection(&self, name: &str, schema: Option<Schema>) -> Result<Arc<Collection>> {
        if let Some(existing) = self.inner.get_collection(name) {
            return Ok(existing);
        }
        let Some(schema) = schema else {
            return Err(FolioDbError::NotFound(format!(
                "collection '{}' (no schema supplied to create it)",
                name
            )));
        };

        let collection = Collection::open(
            name,
            &self.inner.root,
            schema.clone(),
            Arc::downgrade(&self.inner),
            false,
        )?;
        self.inner
            .collections
            .insert(name.to_string(), collection.clone());
        self.inner
            .metadata
            .write()
            .register_collection(name, schema);
        self.inner.persist_metadata()?;
        info!("created collection '{}'", name);
        Ok(collection)
    }

    /// Drop a collection: its documents, its indices, and its metadata
    /// entry. Returns whether the collection existed.
    pub fn drop_collection(&self, name: &str) -> Result<bool> {
        let known = self.inner.collections.remove(name).is_some();
        let recorded = self.inner.metadata.write().remove_collection(name);
        if !known && !recorded {
            return Ok(false);
        }
        let dir = self.inner.root.join(name);
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
        }
        self.inner.persist_metadata()?;
        info!("dropped collection '{}'", name);
        Ok(true)
    }

    /// Names of every collection recorded in the metadata, sorted.
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .metadata
            .read()
            .collections
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Snapshot the whole database tree into `destination`.
    pub fn backup<P: AsRef<Path>>(&self, destination: P) -> Result<BackupMetadata> {
        BackupManager::new(&self.inner.root).create_backup(destination)
    }

    /// Flush every collection and drop the collection map.
    pub fn close(&self) -> Result<()> {
        for entry in self.inner.collections.iter() {
            entry.value().close()?;
        }
        self.inner.collections.clear();
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.inner.root
    }
}
