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

//! Boolean condition trees
//!
//! A `where` clause is either a plain map of field → value equalities
//! (an implicit AND) or an explicit `$and` / `$or` node whose children
//! are conditions themselves:
//!
//! ```json
//! { "$and": [ { "age": 29 }, { "$or": [ { "role": "a" }, { "role": "b" } ] } ] }
//! ```
//!
//! Leaves are always `{field: value}` equality predicates.

use serde_json::Value;

use foliodb_core::{FolioDbError, Result};

/// Normalized AND/OR tree over equality leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Eq { field: String, value: Value },
}

impl Condition {
    /// Parse a raw `where` value into a condition tree.
    pub fn parse(raw: &Value) -> Result<Condition> {
        let Some(obj) = raw.as_object() else {
            return Err(FolioDbError::InvalidArgument(
                "where clause must be a JSON object".to_string(),
            ));
        };

        let mut parts: Vec<Condition> = Vec::new();
        for (key, value) in obj {
            match key.as_str() {
                "$and" => parts.push(Condition::And(Self::parse_children(key, value)?)),
                "$or" => parts.push(Condition::Or(Self::parse_children(key, value)?)),
                other if other.starts_with('$') => {
                    return Err(FolioDbError::InvalidArgument(format!(
                        "unsupported operator '{}' in where clause",
                        other
                    )));
                }
                field => parts.push(Condition::Eq {
                    field: field.to_string(),
                    value: value.clone(),
                }),
            }
        }

        Ok(match parts.len() {
            1 => parts.pop().expect("one part"),
            _ => Condition::And(parts),
        })
    }

    fn parse_children(op: &str, raw: &Value) -> Result<Vec<Condition>> {
        let Some(items) = raw.as_array() else {
            return Err(FolioDbError::InvalidArgument(format!(
                "'{}' expects an array of conditions",
                op
            )));
        };
        items.iter().map(Self::parse).collect()
    }

    /// Split a node's children into simple equality leaves and complex
    /// subtrees. Leaves at the same nesting level are planned together in
    /// a single planner call; subtrees recurse.
    pub fn split_children(children: &[Condition]) -> (Vec<(String, Value)>, Vec<&Condition>) {
        let mut leaves = Vec::new();
        let mut complex = Vec::new();
        for child in children {
            match child {
                Condition::Eq { field, value } => {
                    leaves.push((field.clone(), value.clone()));
                }
                other => complex.push(other),
            }
        }
        (leaves, complex)
    }

    /// Every equality field mentioned anywhere in the tree.
    pub fn equality_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, fields: &mut Vec<String>) {
        match self {
            Condition::Eq { field, .. } => {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
            Condition::And(children) | Condition::Or(children) => {
                for child in children {
                    child.collect_fields(fields);
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
