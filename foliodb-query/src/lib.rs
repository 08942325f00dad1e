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

//! FolioDB Query Engine
//!
//! Planning and execution over the index engine and document store:
//!
//! - **Condition trees**: `$and`/`$or` nodes over equality leaves
//! - **Planner**: enumerates composite exact/prefix lookups, index
//!   seek-with-filter, multi-index intersection, index union, and full
//!   scan; scores by estimated selectivity
//! - **Executor**: runs the winning access path, then residual filters,
//!   LIKE patterns, ORDER BY, pagination, and relation population
//!
//! ## Pipeline
//!
//! ```text
//! where → plan → access path → filter → like → orderBy → slice → populate
//! ```

pub mod condition;
pub mod executor;
pub mod matcher;
pub mod pattern;
pub mod plan;
pub mod planner;
pub mod populate;
pub mod sort;

pub use condition::Condition;
pub use executor::{FindQuery, FindResult, QueryExecutor};
pub use matcher::{matches_all, matches_any, matches_condition};
pub use pattern::PatternMatcher;
pub use plan::{AccessPath, QueryPlan, ScanPredicate, SortStrategy, Strategy};
pub use planner::{QueryPlanner, TOP_N_THRESHOLD};
pub use populate::{populate_documents, RelationResolver};
pub use sort::{parse_order_by, sort_documents, top_n, SortDir, SortKey};
