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

//! Query plans
//!
//! The planner's output: which access path to take for one AND/OR group
//! of equality leaves, plus the coarse selectivity estimate that won the
//! comparison. Lower selectivity is better; ties break on strategy rank.

use serde_json::Value;

/// Access strategy discriminant, ordered by tie-break preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ExactMatch,
    PrefixMatch,
    IndexIntersect,
    IndexSeekFilter,
    IndexUnion,
    FullScan,
}

impl Strategy {
    /// Tie-break rank; smaller wins at equal selectivity.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Strategy::ExactMatch => 0,
            Strategy::PrefixMatch => 1,
            Strategy::IndexIntersect => 2,
            Strategy::IndexSeekFilter => 3,
            Strategy::IndexUnion => 4,
            Strategy::FullScan => 5,
        }
    }
}

/// Predicate shape a full scan evaluates in memory.
#[derive(Debug, Clone)]
pub enum ScanPredicate {
    /// Every leaf must hold (empty = match all).
    All(Vec<(String, Value)>),
    /// At least one leaf must hold.
    Any(Vec<(String, Value)>),
}

/// The chosen access path for one group of equality leaves.
#[derive(Debug, Clone)]
pub enum AccessPath {
    /// Fully-specified composite key lookup.
    ExactMatch { index: String, values: Vec<Value> },
    /// Composite key prefix lookup (query covers a strict prefix of the
    /// index fields).
    PrefixMatch { index: String, values: Vec<Value> },
    /// Index covers the first `prefix_values` leaves; the rest filter in
    /// memory.
    IndexSeekFilter {
        index: String,
        prefix_values: Vec<Value>,
        residual: Vec<(String, Value)>,
    },
    /// Exact probes on several single-field indices, most selective
    /// first, intersected by id; uncovered leaves filter in memory.
    IndexIntersect {
        probes: Vec<(String, Value)>,
        residual: Vec<(String, Value)>,
    },
    /// Exact probes on single-field indices, unioned by id.
    IndexUnion { probes: Vec<(String, Value)> },
    /// Stream every document and evaluate in memory.
    FullScan { predicate: ScanPredicate },
}

/// A ranked plan: the access path plus its selectivity estimate.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub access: AccessPath,
    pub selectivity: f64,
}

impl QueryPlan {
    pub fn strategy(&self) -> Strategy {
        match &self.access {
            AccessPath::ExactMatch { .. } => Strategy::ExactMatch,
            AccessPath::PrefixMatch { .. } => Strategy::PrefixMatch,
            AccessPath::IndexSeekFilter { .. } => Strategy::IndexSeekFilter,
            AccessPath::IndexIntersect { .. } => Strategy::IndexIntersect,
            AccessPath::IndexUnion { .. } => Strategy::IndexUnion,
            AccessPath::FullScan { .. } => Strategy::FullScan,
        }
    }
}

/// How the executor orders results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortStrategy {
    /// Iterate an index in key order instead of sorting globally.
    IndexScanOrdered { index: String },
    /// Bounded selection of the first `n = limit + offset` documents.
    TopN { n: usize },
    /// Materialize everything, then sort.
    LoadAndSort,
}
