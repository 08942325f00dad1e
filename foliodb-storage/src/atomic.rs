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

//! Atomic JSON file I/O
//!
//! Every on-disk artifact (documents, index shards, metadata) is written
//! whole-file: serialize to `<file>.tmp` in the same directory, then rename
//! over the target. A reader loading the file sees either the prior
//! committed version or the new one; partial writes are never visible. No
//! fsync is issued here — durability across power loss is the caller's
//! concern.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use foliodb_core::Result;

/// Sibling temp path for an atomic rewrite: `<file>.tmp`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Serialize `value` as pretty JSON and atomically replace `path`.
///
/// Parent directories are created on demand. On any failure the temp file
/// is unlinked before the error propagates.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_path(path);
    let text = serde_json::to_string_pretty(value)?;
    if let Err(err) = fs::write(&tmp, text.as_bytes()) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}

/// Read and parse a JSON file. `Ok(None)` when the file does not exist;
/// parse failures are errors.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_str(&text)?))
}

/// Read and parse a JSON file, tolerating corruption.
///
/// `Ok(None)` when the file does not exist *or* fails to parse; the parse
/// failure is logged so one corrupt file never fails a whole query.
pub fn read_json_lenient<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!("skipping corrupt JSON file {}: {}", path.display(), err);
            Ok(None)
        }
    }
}

/// Remove orphaned `*.tmp` files under `dir`, recursively.
///
/// An abort between temp-file write and rename leaves the temp file
/// behind; collections sweep on open.
pub fn sweep_temp_files(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().map(|e| e == "tmp").unwrap_or(false) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}

// ============================================================================
// Tests
// ============================================================================
