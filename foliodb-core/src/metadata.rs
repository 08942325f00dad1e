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

//! Database metadata model
//!
//! A single human-readable JSON file at the database root records the
//! format version, creation timestamp, and the schema of every collection
//! as declared at creation time. Opening a directory without this file is
//! an error; its `collections` map drives collection auto-discovery.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Name of the metadata file at the database root.
pub const METADATA_FILENAME: &str = "_db_metadata.json";

/// On-disk format version written by this build.
pub const FORMAT_VERSION: &str = "1.0";

/// Per-collection entry: the schema declared at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub schema: Schema,
    /// RFC 3339 creation timestamp.
    pub created: String,
}

/// Root metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub version: String,
    /// RFC 3339 creation timestamp.
    pub created: String,
    #[serde(default)]
    pub collections: HashMap<String, CollectionEntry>,
}

impl DatabaseMetadata {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            created: chrono::Utc::now().to_rfc3339(),
            collections: HashMap::new(),
        }
    }

    /// Record a newly created collection.
    pub fn register_collection(&mut self, name: &str, schema: Schema) {
        self.collections.insert(
            name.to_string(),
            CollectionEntry {
                schema,
                created: chrono::Utc::now().to_rfc3339(),
            },
        );
    }

    pub fn remove_collection(&mut self, name: &str) -> bool {
        self.collections.remove(name).is_some()
    }
}

impl Default for DatabaseMetadata {
    fn default() -> Self {
        Self::new()
    }
}
