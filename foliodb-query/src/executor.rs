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

//! Query executor
//!
//! Runs the access path the planner picked, then applies the in-memory
//! stages in a fixed order:
//!
//! 1. residual `filter` equalities
//! 2. `like` patterns
//! 3. record the pre-pagination size
//! 4. ORDER BY (key-ordered index scan, bounded Top-N, or load-and-sort)
//! 5. offset/limit slice
//! 6. optional relation population
//!
//! Complex condition trees decompose recursively: sibling equality leaves
//! are planned together in one call, `$and` intersects child result sets
//! by id, `$or` unions them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use foliodb_core::{normalize, Document, FolioDbError, Result};
use foliodb_index::IndexEngine;
use foliodb_storage::DocumentStore;

use crate::condition::Condition;
use crate::matcher::{matches_all, matches_any};
use crate::pattern::PatternMatcher;
use crate::plan::{AccessPath, ScanPredicate, SortStrategy};
use crate::planner::QueryPlanner;
use crate::populate::{populate_documents, RelationResolver};
use crate::sort::{parse_order_by, sort_documents, top_n, SortDir, SortKey};

/// A find request: condition tree plus the in-memory stages.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    /// AND/OR tree or plain map of equalities.
    pub where_clause: Option<Value>,
    /// Residual equality filters, applied after the primary lookup.
    pub filter: Vec<(String, Value)>,
    /// LIKE patterns per field.
    pub like: Vec<(String, String)>,
    /// Raw order-by clause (string, sequence, or map).
    pub order_by: Option<Value>,
    pub limit: Option<usize>,
    pub offset: usize,
    /// Relation names to populate on the sliced result.
    pub populate: Vec<String>,
}

impl FindQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_clause(mut self, clause: Value) -> Self {
        self.where_clause = Some(clause);
        self
    }

    pub fn filter(mut self, field: &str, value: Value) -> Self {
        self.filter.push((field.to_string(), value));
        self
    }

    pub fn like(mut self, field: &str, pattern: &str) -> Self {
        self.like.push((field.to_string(), pattern.to_string()));
        self
    }

    pub fn order_by(mut self, clause: Value) -> Self {
        self.order_by = Some(clause);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn populate(mut self, relation: &str) -> Self {
        self.populate.push(relation.to_string());
        self
    }
}

/// A find response.
#[derive(Debug, Clone)]
pub struct FindResult {
    /// Result count before pagination.
    pub size: usize,
    pub limit: Option<usize>,
    pub offset: usize,
    pub results: Vec<Document>,
    /// Whether relation population ran on the results.
    pub populated: bool,
}

pub struct QueryExecutor<'a> {
    store: &'a DocumentStore,
    indices: &'a HashMap<String, Arc<IndexEngine>>,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(
        store: &'a DocumentStore,
        indices: &'a HashMap<String, Arc<IndexEngine>>,
    ) -> Self {
        Self { store, indices }
    }

    /// Run a full find pipeline.
    pub fn find(
        &self,
        query: &FindQuery,
        resolver: Option<&dyn RelationResolver>,
    ) -> Result<FindResult> {
        let condition = query
            .where_clause
            .as_ref()
            .map(Condition::parse)
            .transpose()?;

        let mut docs = match &condition {
            Some(condition) => self.execute(condition)?,
            None => self.scan(&ScanPredicate::All(Vec::new()))?,
        };

        if !query.filter.is_empty() {
            docs.retain(|doc| matches_all(doc, &query.filter));
        }
        for (field, pattern) in &query.like {
            let matcher = PatternMatcher::new(pattern)?;
            docs.retain(|doc| matcher.matches_field(doc, field));
        }

        let size = docs.len();

        let keys = query
            .order_by
            .as_ref()
            .map(parse_order_by)
            .transpose()?
            .unwrap_or_default();
        if !keys.is_empty() {
            let equality_fields = condition
                .as_ref()
                .map(|c| c.equality_fields())
                .unwrap_or_default();
            let planner = QueryPlanner::new(self.indices);
            match planner.plan_order_by(&keys, &equality_fields, query.limit, query.offset) {
                SortStrategy::IndexScanOrdered { index } => {
                    self.order_by_index(&mut docs, &index, &keys)?
                }
                SortStrategy::TopN { n } => docs = top_n(docs, &keys, n),
                SortStrategy::LoadAndSort => sort_documents(&mut docs, &keys),
            }
        }

        let mut results: Vec<Document> = docs
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        let mut populated = false;
        if !query.populate.is_empty() {
            if let Some(resolver) = resolver {
                populate_documents(&mut results, &query.populate, resolver)?;
                populated = true;
            }
        }

        Ok(FindResult {
            size,
            limit: query.limit,
            offset: query.offset,
            results,
            populated,
        })
    }

    /// Report the access strategy the planner picks for the query's
    /// top-level leaf group, without executing anything.
    pub fn explain(&self, query: &FindQuery) -> Result<crate::plan::Strategy> {
        let planner = QueryPlanner::new(self.indices);
        let Some(raw) = query.where_clause.as_ref() else {
            return Ok(crate::plan::Strategy::FullScan);
        };
        let plan = match Condition::parse(raw)? {
            Condition::Eq { field, value } => planner.plan_conjunction(&[(field, value)])?,
            Condition::And(children) => {
                let (leaves, _) = Condition::split_children(&children);
                planner.plan_conjunction(&leaves)?
            }
            Condition::Or(children) => {
                let (leaves, _) = Condition::split_children(&children);
                planner.plan_disjunction(&leaves)
            }
        };
        Ok(plan.strategy())
    }

    /// Recursive condition evaluation: plan sibling leaves together,
    /// intersect `$and` children by id, union `$or` children.
    fn execute(&self, condition: &Condition) -> Result<Vec<Document>> {
        match condition {
            Condition::Eq { field, value } => {
                self.run_conjunction(&[(field.clone(), value.clone())])
            }
            Condition::And(children) => {
                let (leaves, complex) = Condition::split_children(children);
                let mut sets = Vec::new();
                if !leaves.is_empty() || complex.is_empty() {
                    sets.push(self.run_conjunction(&leaves)?);
                }
                for child in complex {
                    if sets.iter().any(|set| set.is_empty()) {
                        return Ok(Vec::new());
                    }
                    sets.push(self.execute(child)?);
                }
                Ok(intersect_by_id(sets))
            }
            Condition::Or(children) => {
                let (leaves, complex) = Condition::split_children(children);
                let mut sets = Vec::new();
                if !leaves.is_empty() {
                    sets.push(self.run_disjunction(&leaves)?);
                }
                for child in complex {
                    sets.push(self.execute(child)?);
                }
                Ok(union_by_id(sets))
            }
        }
    }

    fn run_conjunction(&self, leaves: &[(String, Value)]) -> Result<Vec<Document>> {
        // A null or compound query value has no normalized form and can
        // never equal a document value, so the whole conjunction is empty.
        if leaves.iter().any(|(_, value)| normalize(value).is_none()) {
            return Ok(Vec::new());
        }
        let plan = QueryPlanner::new(self.indices).plan_conjunction(leaves)?;
        debug!("executing {:?}", plan.strategy());
        self.run_access(plan.access)
    }

    fn run_disjunction(&self, leaves: &[(String, Value)]) -> Result<Vec<Document>> {
        // Leaves without a normalized form match nothing; drop them.
        let live: Vec<(String, Value)> = leaves
            .iter()
            .filter(|(_, value)| normalize(value).is_some())
            .cloned()
            .collect();
        if live.is_empty() {
            return Ok(Vec::new());
        }
        let plan = QueryPlanner::new(self.indices).plan_disjunction(&live);
        debug!("executing {:?}", plan.strategy());
        self.run_access(plan.access)
    }

    fn run_access(&self, access: AccessPath) -> Result<Vec<Document>> {
        match access {
            AccessPath::ExactMatch { index, values } => {
                let ids = self.engine(&index)?.get_exact(&values)?;
                self.load_ids(&ids)
            }
            AccessPath::PrefixMatch { index, values } => {
                let ids = self.engine(&index)?.get_prefix(&values)?;
                self.load_ids(&ids)
            }
            AccessPath::IndexSeekFilter {
                index,
                prefix_values,
                residual,
            } => {
                let engine = self.engine(&index)?;
                // The matched prefix may cover the whole index or a
                // strict prefix of it; pick the lookup that fits.
                let ids = if prefix_values.len() == engine.fields().len() {
                    engine.get_exact(&prefix_values)?
                } else {
                    engine.get_prefix(&prefix_values)?
                };
                let mut docs = self.load_ids(&ids)?;
                if docs.is_empty() {
                    return Ok(docs);
                }
                docs.retain(|doc| matches_all(doc, &residual));
                Ok(docs)
            }
            AccessPath::IndexIntersect { probes, residual } => {
                let mut probes_iter = probes.iter();
                let (first_index, first_value) =
                    probes_iter.next().expect("intersection has a probe");
                let mut working = self
                    .engine(first_index)?
                    .get_exact(std::slice::from_ref(first_value))?;
                for (index, value) in probes_iter {
                    if working.is_empty() {
                        return Ok(Vec::new());
                    }
                    let postings: HashSet<String> = self
                        .engine(index)?
                        .get_exact(std::slice::from_ref(value))?
                        .into_iter()
                        .collect();
                    working.retain(|id| postings.contains(id));
                }
                let mut docs = self.load_ids(&working)?;
                if !residual.is_empty() {
                    docs.retain(|doc| matches_all(doc, &residual));
                }
                Ok(docs)
            }
            AccessPath::IndexUnion { probes } => {
                let mut seen = HashSet::new();
                let mut ids = Vec::new();
                for (index, value) in &probes {
                    for id in self
                        .engine(index)?
                        .get_exact(std::slice::from_ref(value))?
                    {
                        if seen.insert(id.clone()) {
                            ids.push(id);
                        }
                    }
                }
                self.load_ids(&ids)
            }
            AccessPath::FullScan { predicate } => self.scan(&predicate),
        }
    }

    fn engine(&self, name: &str) -> Result<&Arc<IndexEngine>> {
        self.indices.get(name).ok_or_else(|| {
            FolioDbError::Planner(format!("plan references unknown index '{}'", name))
        })
    }

    /// Load documents for a set of ids; stale index entries whose files
    /// are gone are skipped.
    fn load_ids(&self, ids: &[String]) -> Result<Vec<Document>> {
        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.store.load_document(id)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    fn scan(&self, predicate: &ScanPredicate) -> Result<Vec<Document>> {
        let docs = self.store.all_documents().filter(|doc| match predicate {
            ScanPredicate::All(leaves) => matches_all(doc, leaves),
            ScanPredicate::Any(leaves) => matches_any(doc, leaves),
        });
        Ok(docs.collect())
    }

    /// Order the result set by an index's key order instead of a global
    /// sort. Documents absent from the index sort last.
    fn order_by_index(
        &self,
        docs: &mut [Document],
        index: &str,
        keys: &[SortKey],
    ) -> Result<()> {
        let engine = self.engine(index)?;
        let mut rank: HashMap<String, usize> = HashMap::new();
        let mut position = 0usize;
        for (_, postings) in engine.get_all_keys()? {
            for id in postings {
                rank.entry(id).or_insert(position);
                position += 1;
            }
        }
        let dir = keys.first().map(|k| k.dir).unwrap_or(SortDir::Asc);
        docs.sort_by(|a, b| {
            let ra = doc_rank(a, &rank);
            let rb = doc_rank(b, &rank);
            match (ra, rb) {
                (Some(x), Some(y)) => match dir {
                    SortDir::Asc => x.cmp(&y),
                    SortDir::Desc => y.cmp(&x),
                },
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        Ok(())
    }
}

fn doc_rank(doc: &Document, rank: &HashMap<String, usize>) -> Option<usize> {
    doc.get("id")
        .and_then(|v| v.as_str())
        .and_then(|id| rank.get(id).copied())
}

fn doc_id(doc: &Document) -> Option<&str> {
    doc.get("id").and_then(|v| v.as_str())
}

/// Intersect result sets by document id, keeping the first set's order.
fn intersect_by_id(mut sets: Vec<Vec<Document>>) -> Vec<Document> {
    if sets.is_empty() {
        return Vec::new();
    }
    let first = sets.remove(0);
    let mut keep: HashSet<String> = first
        .iter()
        .filter_map(|doc| doc_id(doc).map(str::to_string))
        .collect();
    for set in &sets {
        if keep.is_empty() {
            return Vec::new();
        }
        let ids: HashSet<&str> = set.iter().filter_map(doc_id).collect();
        keep.retain(|id| ids.contains(id.as_str()));
    }
    first
        .into_iter()
        .filter(|doc| doc_id(doc).map(|id| keep.contains(id)).unwrap_or(false))
        .collect()
}

/// Union result sets by document id, first occurrence wins.
fn union_by_id(sets: Vec<Vec<Document>>) -> Vec<Document> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for set in sets {
        for doc in set {
            let Some(id) = doc_id(&doc).map(str::to_string) else {
                continue;
            };
            if seen.insert(id) {
                out.push(doc);
            }
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
