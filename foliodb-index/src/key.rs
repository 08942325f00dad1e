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

//! Composite key encoding and shard routing
//!
//! A composite key is the normalized form of each indexed value, joined by
//! the reserved `\u{1F}` separator. Because the separator never occurs in
//! a normalized segment (encoding rejects offenders), prefix matching on
//! whole segments is unambiguous: `key` extends `prefix` iff `key ==
//! prefix` or `key` starts with `prefix` followed by the separator.
//!
//! The owning shard of a key is `md5(key)[0:2] mod shard_count` and never
//! changes for that key.

use serde_json::Value;

use foliodb_core::{normalize, FolioDbError, Result, KEY_SEPARATOR};

/// Encode one value as a key segment.
///
/// Rejects values without a scalar canonical form (`null`, arrays,
/// objects) and normalized strings containing the reserved separator.
pub fn encode_segment(value: &Value) -> Result<String> {
    let segment = normalize(value).ok_or_else(|| {
        FolioDbError::InvalidArgument(
            "value has no scalar form and cannot appear in an index key".to_string(),
        )
    })?;
    if segment.contains(KEY_SEPARATOR) {
        return Err(FolioDbError::InvalidArgument(
            "normalized value contains the reserved key separator".to_string(),
        ));
    }
    Ok(segment)
}

/// Encode an ordered tuple of values into a composite key.
pub fn encode_key(values: &[Value]) -> Result<String> {
    let segments: Vec<String> = values.iter().map(encode_segment).collect::<Result<_>>()?;
    Ok(segments.join(&KEY_SEPARATOR.to_string()))
}

/// Which shard owns a composite key.
pub fn shard_for_key(key: &str, shard_count: usize) -> usize {
    let digest = md5::compute(key.as_bytes());
    digest.0[0] as usize % shard_count.max(1)
}

/// Whole-segment prefix test: `key` equals `prefix` or extends it by at
/// least one further segment.
pub fn matches_prefix(key: &str, prefix: &str) -> bool {
    if key == prefix {
        return true;
    }
    key.len() > prefix.len()
        && key.starts_with(prefix)
        && key[prefix.len()..].starts_with(KEY_SEPARATOR)
}

/// Final segment of a composite key.
pub fn last_segment(key: &str) -> &str {
    key.rsplit(KEY_SEPARATOR).next().unwrap_or(key)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_joins_normalized_segments() {
        let key = encode_key(&[json!(29), json!("designer"), json!(true)]).unwrap();
        assert_eq!(key, format!("29{0}designer{0}true", KEY_SEPARATOR));
    }

    #[test]
    fn null_and_compound_values_rejected() {
        assert!(encode_key(&[json!(null)]).is_err());
        assert!(encode_key(&[json!([1, 2])]).is_err());
        assert!(encode_key(&[json!({"a": 1})]).is_err());
    }

    #[test]
    fn separator_in_value_rejected() {
        let poisoned = format!("a{}b", KEY_SEPARATOR);
        assert!(encode_key(&[json!(poisoned)]).is_err());
    }

    #[test]
    fn shard_routing_is_stable_and_in_range() {
        for count in [1, 4, 16, 64] {
            let a = shard_for_key("29\u{1F}designer", count);
            let b = shard_for_key("29\u{1F}designer", count);
            assert_eq!(a, b);
            assert!(a < count);
        }
    }

    #[test]
    fn prefix_matches_whole_segments_only() {
        let key = encode_key(&[json!(29), json!("designer")]).unwrap();
        let prefix = encode_key(&[json!(29)]).unwrap();
        assert!(matches_prefix(&key, &prefix));
        assert!(matches_prefix(&prefix, &prefix));
        // "2" is not a whole-segment prefix of "29|designer"
        assert!(!matches_prefix(&key, "2"));
        // and a longer first segment does not match either
        assert!(!matches_prefix(&key, "295"));
    }

    #[test]
    fn last_segment_extracts_final_value() {
        let key = encode_key(&[json!("a"), json!("b"), json!(42)]).unwrap();
        assert_eq!(last_segment(&key), "42");
        assert_eq!(last_segment("solo"), "solo");
    }
}
