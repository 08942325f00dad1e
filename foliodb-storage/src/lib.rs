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

//! FolioDB Storage
//!
//! Filesystem persistence for FolioDB:
//!
//! - **Atomic JSON I/O**: whole-file temp-write-then-rename
//! - **Document store**: two-level hash-sharded directory trees with lazy
//!   full enumeration
//! - **Backup**: recursive snapshot copies with a manifest

pub mod atomic;
pub mod backup;
pub mod document_store;

pub use backup::{BackupManager, BackupMetadata, BACKUP_MANIFEST};
pub use document_store::{
    DocumentScan, DocumentStore, PRIMARY_SHARD_COUNT, SUB_SHARD_COUNT,
};
