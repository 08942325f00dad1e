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

//! Document model and value normalization
//!
//! A FolioDB document is an untyped JSON object. Indexing and equality
//! comparisons operate on the *canonical string form* of scalar values,
//! produced by [`normalize`]. The canonical form is what gets embedded into
//! composite index keys, so it must never contain the reserved key
//! separator.
//!
//! ## Separator choice
//!
//! Composite keys join normalized segments with the ASCII unit separator
//! `\u{1F}` rather than a printable character. JSON strings *can* still
//! carry `\u{1F}`, so key encoding rejects such values instead of escaping
//! them; see `foliodb-index`.

use serde_json::Value;

/// A document: an unordered JSON object. Every persisted document carries
/// a synthesized `id` string field.
pub type Document = serde_json::Map<String, Value>;

/// Reserved separator between normalized segments of a composite key.
pub const KEY_SEPARATOR: char = '\u{1F}';

/// Canonical string form of a scalar value.
///
/// Returns `None` for values that have no scalar canonical form: `null`,
/// arrays, and objects. Arrays are matched element-wise by the query
/// matcher and never normalize as a whole; a document whose indexed field
/// holds an array or object is simply absent from that index.
pub fn normalize(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether two values are equal under normalization.
pub fn normalized_eq(a: &Value, b: &Value) -> bool {
    match (normalize(a), normalize(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Resolve a dot-separated field path against a document.
///
/// `"address.city"` addresses `doc["address"]["city"]`. A path without
/// dots is a plain field lookup. Returns `None` when any step is missing
/// or a non-object is traversed into.
pub fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    if !path.contains('.') {
        return doc.get(path);
    }
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Whether a document defines `path` with a non-null value.
pub fn is_defined(doc: &Document, path: &str) -> bool {
    matches!(lookup_path(doc, path), Some(v) if !v.is_null())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_scalars() {
        assert_eq!(normalize(&json!("designer")), Some("designer".into()));
        assert_eq!(normalize(&json!(29)), Some("29".into()));
        assert_eq!(normalize(&json!(true)), Some("true".into()));
        assert_eq!(normalize(&json!(false)), Some("false".into()));
        assert_eq!(normalize(&json!(null)), None);
    }

    #[test]
    fn normalize_floats_round_trip() {
        assert_eq!(normalize(&json!(1.5)), Some("1.5".into()));
        // Integral JSON numbers keep their integral form
        assert_eq!(normalize(&json!(30)), Some("30".into()));
    }

    #[test]
    fn compounds_have_no_scalar_form() {
        assert_eq!(normalize(&json!([1, 2])), None);
        assert_eq!(normalize(&json!({"a": 1})), None);
    }

    #[test]
    fn lookup_nested_path() {
        let doc: Document = serde_json::from_value(json!({
            "name": "A",
            "address": { "city": "Hanoi", "geo": { "lat": 21.0 } }
        }))
        .unwrap();

        assert_eq!(lookup_path(&doc, "name"), Some(&json!("A")));
        assert_eq!(lookup_path(&doc, "address.city"), Some(&json!("Hanoi")));
        assert_eq!(lookup_path(&doc, "address.geo.lat"), Some(&json!(21.0)));
        assert_eq!(lookup_path(&doc, "address.zip"), None);
        assert_eq!(lookup_path(&doc, "name.city"), None);
    }

    #[test]
    fn defined_excludes_null() {
        let doc: Document =
            serde_json::from_value(json!({ "a": 1, "b": null })).unwrap();
        assert!(is_defined(&doc, "a"));
        assert!(!is_defined(&doc, "b"));
        assert!(!is_defined(&doc, "c"));
    }
}
