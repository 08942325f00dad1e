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

//! Sharded document storage
//!
//! Documents live in a two-level directory tree under the collection root:
//!
//! ```text
//! <collection>/HHH/SSS/<id>.json
//! ```
//!
//! where `HHH = md5(id)[0:2] mod 256` and `SSS = md5(id)[2:4] mod 16`,
//! both 3-digit zero-padded. Both levels are pure hash functions of the
//! id, so a document's path is stable across processes and never depends
//! on directory contents.
//!
//! Per-document writes are atomic (temp file + rename). Enumeration walks
//! every shard lazily and skips unreadable files with a warning — one
//! corrupt document never fails a full scan.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use foliodb_core::{Document, Result};

use crate::atomic;

/// Number of primary shard directories.
pub const PRIMARY_SHARD_COUNT: usize = 256;

/// Number of sub-shard directories per primary shard.
pub const SUB_SHARD_COUNT: usize = 16;

/// Filesystem-backed document store for one collection.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Collection root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic path of a document file.
    pub fn document_path(&self, id: &str) -> PathBuf {
        let digest = md5::compute(id.as_bytes());
        let primary = digest.0[0] as usize % PRIMARY_SHARD_COUNT;
        let sub = digest.0[1] as usize % SUB_SHARD_COUNT;
        self.dir
            .join(format!("{:03}", primary))
            .join(format!("{:03}", sub))
            .join(format!("{}.json", id))
    }

    /// Serialize and atomically persist a document.
    pub fn save_document(&self, id: &str, doc: &Document) -> Result<()> {
        atomic::write_json(&self.document_path(id), doc)
    }

    /// Load a document by id.
    ///
    /// Returns `None` when absent. A file that exists but fails to parse
    /// also yields `None`, with a warning — fault isolation, not failure.
    pub fn load_document(&self, id: &str) -> Result<Option<Document>> {
        atomic::read_json_lenient(&self.document_path(id))
    }

    /// Remove a document file. Returns whether anything was removed.
    pub fn delete_document(&self, id: &str) -> Result<bool> {
        match fs::remove_file(self.document_path(id)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Lazily enumerate every document in the collection.
    ///
    /// Walks each primary shard and sub-shard; order is
    /// filesystem-dependent and must not be relied upon.
    pub fn all_documents(&self) -> DocumentScan {
        DocumentScan {
            pending_dirs: vec![self.dir.clone()],
            pending_files: Vec::new(),
            root: self.dir.clone(),
        }
    }

    /// Whether the collection holds at least one document.
    pub fn is_empty(&self) -> bool {
        self.all_documents().next().is_none()
    }

    /// Count documents by enumeration.
    pub fn count_documents(&self) -> usize {
        self.all_documents().count()
    }
}

/// Lazy iterator over every parseable document in a store.
pub struct DocumentScan {
    pending_dirs: Vec<PathBuf>,
    pending_files: Vec<PathBuf>,
    root: PathBuf,
}

impl DocumentScan {
    fn expand_dir(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("cannot read shard directory {}: {}", dir.display(), err);
                }
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();
            // Internal directories and files (index shards, metadata) are
            // prefixed with '_' and are not documents.
            if dir == self.root && name.starts_with('_') {
                continue;
            }
            if path.is_dir() {
                self.pending_dirs.push(path);
            } else if name.ends_with(".json") {
                self.pending_files.push(path);
            }
        }
    }
}

impl Iterator for DocumentScan {
    type Item = Document;

    fn next(&mut self) -> Option<Document> {
        loop {
            if let Some(file) = self.pending_files.pop() {
                match atomic::read_json_lenient::<Document>(&file) {
                    Ok(Some(doc)) => return Some(doc),
                    Ok(None) => continue,
                    Err(err) => {
                        warn!("skipping unreadable document {}: {}", file.display(), err);
                        continue;
                    }
                }
            }
            let dir = self.pending_dirs.pop()?;
            self.expand_dir(&dir);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
