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

//! FolioDB Client
//!
//! The embedded API: an on-disk database of JSON document collections
//! with schema validation, sharded secondary indices, and a
//! selectivity-ranked query planner.
//!
//! ```no_run
//! use foliodb_client::{Database, DatabaseOptions, FindQuery};
//! use serde_json::json;
//!
//! # fn main() -> foliodb_core::Result<()> {
//! let db = Database::create("./data", DatabaseOptions::default())?;
//! let schema = serde_json::from_value(json!({
//!     "fields": { "name": { "type": "string", "required": true } },
//!     "indices": { "role": ["role"] }
//! }))?;
//! let users = db.collection("users", Some(schema))?;
//!
//! users.insert(serde_json::from_value(json!({
//!     "name": "An", "role": "designer"
//! }))?)?;
//!
//! let hits = users.find(
//!     &FindQuery::new().where_clause(json!({ "role": "designer" })),
//! )?;
//! assert_eq!(hits.size, 1);
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod database;

pub use collection::{Collection, CollectionStats};
pub use database::{Database, DatabaseOptions};

// The surface a caller needs, re-exported from the component crates.
pub use foliodb_core::{
    Document, FieldSpec, FieldType, FolioDbError, RelationSpec, Result, Schema,
};
pub use foliodb_index::IndexHealthReport;
pub use foliodb_query::{FindQuery, FindResult, Strategy};
pub use foliodb_storage::BackupMetadata;
