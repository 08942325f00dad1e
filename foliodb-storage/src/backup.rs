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

//! Backup functionality
//!
//! Copies the full database tree (metadata, documents, index shards) into a
//! destination directory and writes a `backup_manifest.json` describing the
//! snapshot. Orphaned `*.tmp` files are not part of a backup.
//!
//! Backups are only consistent when no writer is active — the single-writer
//! precondition of the database applies to backups too.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use foliodb_core::{FolioDbError, Result};

use crate::atomic;

/// Name of the manifest written into every backup directory.
pub const BACKUP_MANIFEST: &str = "backup_manifest.json";

/// Metadata about a completed backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// RFC 3339 timestamp of backup creation.
    pub created_at: String,
    /// Number of files copied.
    pub file_count: usize,
    /// Total copied size in bytes.
    pub size_bytes: u64,
    /// Source database path.
    pub source_path: String,
    /// FolioDB version that produced the backup.
    pub version: String,
}

/// Manages backup operations for one database directory.
pub struct BackupManager {
    source: PathBuf,
}

impl BackupManager {
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
        }
    }

    /// Copy the database tree into `destination` and write the manifest.
    pub fn create_backup<P: AsRef<Path>>(&self, destination: P) -> Result<BackupMetadata> {
        let dest = destination.as_ref();
        if !self.source.is_dir() {
            return Err(FolioDbError::Backup(format!(
                "source database {} does not exist",
                self.source.display()
            )));
        }
        fs::create_dir_all(dest)?;

        let mut file_count = 0usize;
        let mut size_bytes = 0u64;
        let mut pending = vec![self.source.clone()];
        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current)? {
                let entry = entry?;
                let path = entry.path();
                let rel = path
                    .strip_prefix(&self.source)
                    .expect("entry under source root");
                if path.is_dir() {
                    pending.push(path);
                } else {
                    if path.extension().map(|e| e == "tmp").unwrap_or(false) {
                        continue;
                    }
                    let target = dest.join(rel);
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    size_bytes += fs::copy(&path, &target)?;
                    file_count += 1;
                }
            }
        }

        let metadata = BackupMetadata {
            created_at: chrono::Utc::now().to_rfc3339(),
            file_count,
            size_bytes,
            source_path: self.source.display().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        atomic::write_json(&dest.join(BACKUP_MANIFEST), &metadata)?;
        info!(
            "backup of {} complete: {} files, {} bytes",
            self.source.display(),
            file_count,
            size_bytes
        );
        Ok(metadata)
    }
}
