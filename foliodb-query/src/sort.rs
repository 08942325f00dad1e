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

//! ORDER BY parsing and sorting
//!
//! Accepts three spellings of an order-by clause:
//!
//! - string: `"age desc"`
//! - sequence: `["age desc", "name"]`
//! - map: `{"age": "desc", "name": 1}`
//!
//! Values compare numerically when both sides are numbers, otherwise by
//! string/boolean ordering within a type, with a fixed rank across types
//! (null < bool < number < string < array < object). A missing sort field
//! sorts like null. The bounded Top-N path must return exactly the same
//! set as sort-then-truncate; only its cost differs.

use std::cmp::Ordering;

use serde_json::Value;

use foliodb_core::{lookup_path, Document, FolioDbError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// One key of an ORDER BY clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

/// Parse a raw order-by value (string, sequence, or map).
pub fn parse_order_by(raw: &Value) -> Result<Vec<SortKey>> {
    match raw {
        Value::String(s) => Ok(vec![parse_key_str(s)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| {
                        FolioDbError::InvalidArgument(
                            "orderBy sequence entries must be strings".to_string(),
                        )
                    })
                    .and_then(parse_key_str)
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(field, dir)| {
                Ok(SortKey {
                    field: field.clone(),
                    dir: parse_dir_value(dir)?,
                })
            })
            .collect(),
        _ => Err(FolioDbError::InvalidArgument(
            "orderBy must be a string, sequence, or map".to_string(),
        )),
    }
}

fn parse_key_str(spec: &str) -> Result<SortKey> {
    let mut parts = spec.split_whitespace();
    let field = parts
        .next()
        .ok_or_else(|| FolioDbError::InvalidArgument("empty orderBy entry".to_string()))?;
    let dir = match parts.next() {
        None => SortDir::Asc,
        Some(d) if d.eq_ignore_ascii_case("asc") => SortDir::Asc,
        Some(d) if d.eq_ignore_ascii_case("desc") => SortDir::Desc,
        Some(other) => {
            return Err(FolioDbError::InvalidArgument(format!(
                "unknown sort direction '{}'",
                other
            )))
        }
    };
    Ok(SortKey {
        field: field.to_string(),
        dir,
    })
}

fn parse_dir_value(raw: &Value) -> Result<SortDir> {
    match raw {
        Value::String(s) if s.eq_ignore_ascii_case("asc") => Ok(SortDir::Asc),
        Value::String(s) if s.eq_ignore_ascii_case("desc") => Ok(SortDir::Desc),
        Value::Number(n) => Ok(if n.as_f64().unwrap_or(1.0) < 0.0 {
            SortDir::Desc
        } else {
            SortDir::Asc
        }),
        other => Err(FolioDbError::InvalidArgument(format!(
            "unknown sort direction {:?}",
            other
        ))),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values for sorting purposes.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Compare two documents under a multi-key ORDER BY.
pub fn cmp_documents(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let av = lookup_path(a, &key.field).unwrap_or(&Value::Null);
        let bv = lookup_path(b, &key.field).unwrap_or(&Value::Null);
        let ord = compare_values(av, bv);
        let ord = match key.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Full in-memory sort.
pub fn sort_documents(docs: &mut [Document], keys: &[SortKey]) {
    docs.sort_by(|a, b| cmp_documents(a, b, keys));
}

/// Bounded selection of the first `n` documents under the given order,
/// without sorting the whole input. Equivalent to sort-then-truncate.
pub fn top_n<I>(docs: I, keys: &[SortKey], n: usize) -> Vec<Document>
where
    I: IntoIterator<Item = Document>,
{
    if n == 0 {
        return Vec::new();
    }
    let mut best: Vec<Document> = Vec::with_capacity(n + 1);
    for doc in docs {
        let pos = best.partition_point(|b| cmp_documents(b, &doc, keys) != Ordering::Greater);
        if pos >= n {
            continue;
        }
        best.insert(pos, doc);
        if best.len() > n {
            best.pop();
        }
    }
    best
}

// ============================================================================
// Tests
// ============================================================================
