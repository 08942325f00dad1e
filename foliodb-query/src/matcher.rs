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

//! In-memory equality predicate evaluation
//!
//! The same semantics everywhere a predicate is checked against a loaded
//! document — residual filters after an index seek, `filter` clauses, and
//! full scans:
//!
//! - dot-separated field paths address nested values
//! - a sequence value matches if **any** element matches
//! - otherwise both sides must agree under normalization
//! - a missing or null document value never matches

use serde_json::Value;

use foliodb_core::{lookup_path, normalized_eq, Document};

/// Does `doc.field` equal `expected` under normalization?
pub fn matches_condition(doc: &Document, field: &str, expected: &Value) -> bool {
    let Some(actual) = lookup_path(doc, field) else {
        return false;
    };
    match actual {
        Value::Null => false,
        Value::Array(items) => items.iter().any(|item| normalized_eq(item, expected)),
        other => normalized_eq(other, expected),
    }
}

/// Conjunction of equality leaves.
pub fn matches_all(doc: &Document, leaves: &[(String, Value)]) -> bool {
    leaves
        .iter()
        .all(|(field, value)| matches_condition(doc, field, value))
}

/// Disjunction of equality leaves.
pub fn matches_any(doc: &Document, leaves: &[(String, Value)]) -> bool {
    leaves
        .iter()
        .any(|(field, value)| matches_condition(doc, field, value))
}

// ============================================================================
// Tests
// ============================================================================
