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

//! Schema and index catalog
//!
//! A collection schema declares field constraints, relations to other
//! collections, and named secondary indices. Unlisted fields are permitted
//! and carry no constraints. The schema is persisted verbatim into the
//! database metadata file at collection creation time, which makes the
//! metadata file the authoritative source for collection auto-discovery.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FolioDbError, Result};
use crate::value::Document;

/// Declared type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    /// An RFC 3339 timestamp carried as a JSON string.
    Date,
}

impl FieldType {
    /// Whether a JSON value conforms to this declared type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Date => value
                .as_str()
                .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
        }
    }
}

/// Constraint on a single declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
}

/// A relation from a local field to a record in another collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSpec {
    /// Target collection name.
    pub collection: String,
    /// Target field matched against the local value.
    #[serde(default = "default_relation_field")]
    pub field: String,
}

fn default_relation_field() -> String {
    "id".to_string()
}

/// A collection schema: field constraints, relations, and named indices.
///
/// Each index is an ordered list of field names; a single-field index is a
/// list of length 1. Index field order is significant — it defines the
/// composite key layout and what prefix lookups are possible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub fields: HashMap<String, FieldSpec>,

    #[serde(default)]
    pub relations: HashMap<String, RelationSpec>,

    #[serde(default)]
    pub validate_relations: bool,

    #[serde(default)]
    pub indices: HashMap<String, Vec<String>>,
}

impl Schema {
    /// Reject structurally invalid schemas (currently: empty index field
    /// lists).
    pub fn check(&self) -> Result<()> {
        for (name, fields) in &self.indices {
            if fields.is_empty() {
                return Err(FolioDbError::Validation(format!(
                    "index '{}' declares no fields",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Validate a document against the declared field constraints.
    ///
    /// Missing required fields and wrongly-typed declared fields fail;
    /// fields not listed in the schema pass through unchecked.
    pub fn validate_document(&self, doc: &Document) -> Result<()> {
        for (field, spec) in &self.fields {
            match doc.get(field) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(FolioDbError::Validation(format!(
                            "missing required field '{}'",
                            field
                        )));
                    }
                }
                Some(value) => {
                    if !spec.field_type.accepts(value) {
                        return Err(FolioDbError::Validation(format!(
                            "field '{}' has wrong type, expected {:?}",
                            field, spec.field_type
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Relations whose local field is defined and non-null on the document.
    pub fn active_relations<'a>(
        &'a self,
        doc: &'a Document,
    ) -> impl Iterator<Item = (&'a String, &'a RelationSpec, &'a Value)> {
        self.relations.iter().filter_map(|(local, spec)| {
            match doc.get(local) {
                Some(v) if !v.is_null() => Some((local, spec, v)),
                _ => None,
            }
        })
    }

    /// Whether `field` is covered by a declared single-field index, and if
    /// so under which index name.
    pub fn single_field_index(&self, field: &str) -> Option<&str> {
        self.indices
            .iter()
            .find(|(_, fields)| fields.len() == 1 && fields[0] == field)
            .map(|(name, _)| name.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
