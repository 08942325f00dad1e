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

//! Relation population
//!
//! Populating a relation replaces the local reference value with the
//! referenced document, loaded on demand through the database handle.
//! The executor only knows this trait; the collection facade implements
//! it with its schema's relation table.

use serde_json::Value;

use foliodb_core::{Document, Result};

/// Loads the document a relation value refers to.
pub trait RelationResolver {
    /// Resolve `value` through the relation named `relation` (the local
    /// field name). `None` when the target record does not exist.
    fn resolve(&self, relation: &str, value: &Value) -> Result<Option<Document>>;
}

/// Replace each named relation field on the documents with its resolved
/// target. Unresolvable references keep their original value.
pub fn populate_documents(
    docs: &mut [Document],
    relations: &[String],
    resolver: &dyn RelationResolver,
) -> Result<()> {
    for doc in docs.iter_mut() {
        for relation in relations {
            let Some(value) = doc.get(relation).cloned() else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if let Some(target) = resolver.resolve(relation, &value)? {
                doc.insert(relation.clone(), Value::Object(target));
            }
        }
    }
    Ok(())
}
