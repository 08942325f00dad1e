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

//! LIKE pattern matching
//!
//! SQL-style wildcards over the normalized string form of a value:
//! `%` matches any run of characters, `_` matches exactly one. Everything
//! else is literal (regex metacharacters included). Matching is anchored
//! and case-sensitive.

use regex::Regex;
use serde_json::Value;

use foliodb_core::{lookup_path, normalize, Document, FolioDbError, Result};

/// A compiled LIKE pattern.
#[derive(Debug)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Compile a LIKE pattern into an anchored regex.
    pub fn new(pattern: &str) -> Result<Self> {
        let mut expr = String::with_capacity(pattern.len() + 8);
        expr.push('^');
        for ch in pattern.chars() {
            match ch {
                '%' => expr.push_str(".*"),
                '_' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');
        let regex = Regex::new(&expr).map_err(|err| {
            FolioDbError::InvalidArgument(format!("invalid LIKE pattern '{}': {}", pattern, err))
        })?;
        Ok(Self { regex })
    }

    /// Match against a value's normalized form; sequences match if any
    /// element matches.
    pub fn matches_value(&self, value: &Value) -> bool {
        match value {
            Value::Array(items) => items.iter().any(|item| self.matches_value(item)),
            other => normalize(other)
                .map(|s| self.regex.is_match(&s))
                .unwrap_or(false),
        }
    }

    /// Match against a document field (dot paths supported). Missing and
    /// null values never match.
    pub fn matches_field(&self, doc: &Document, field: &str) -> bool {
        lookup_path(doc, field)
            .map(|v| self.matches_value(v))
            .unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================
