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

//! FolioDB Core
//!
//! Fundamental types shared by every FolioDB crate:
//!
//! - **Document model**: JSON objects with a synthesized `id` field
//! - **Value normalization**: the canonical scalar string form used by
//!   composite index keys and equality predicates
//! - **Schema catalog**: field constraints, relations, named indices
//! - **Database metadata**: the `_db_metadata.json` model
//! - **Errors**: the crate-wide [`FolioDbError`] / [`Result`]

pub mod error;
pub mod metadata;
pub mod schema;
pub mod value;

pub use error::{FolioDbError, Result};
pub use metadata::{CollectionEntry, DatabaseMetadata, FORMAT_VERSION, METADATA_FILENAME};
pub use schema::{FieldSpec, FieldType, RelationSpec, Schema};
pub use value::{
    is_defined, lookup_path, normalize, normalized_eq, Document, KEY_SEPARATOR,
};
