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

//! Query planner
//!
//! Given one group of equality leaves, enumerate every admissible access
//! path and pick the one with the smallest estimated selectivity:
//!
//! | Candidate | Condition | Estimate |
//! |-----------|-----------|----------|
//! | EXACT_MATCH | query covers all index fields, in order | 0.1^k |
//! | PREFIX_MATCH | query covers a strict prefix of the index | 0.1^p |
//! | INDEX_SEEK_FILTER | index covers the first p < |query| leaves | 0.1^p |
//! | INDEX_INTERSECT | ≥1 single-field index covers a query field | 0.1/n |
//! | FULL_SCAN | always | 1.0 |
//!
//! Composite matching is **order-sensitive**: index fields are compared
//! element-wise against the query's leaves from position 0, in the
//! query's given order. Ties break on strategy rank. A `FULL_SCAN`
//! candidate is always present, so planning cannot come up empty.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use foliodb_core::Result;
use foliodb_index::IndexEngine;

use crate::plan::{AccessPath, QueryPlan, ScanPredicate, SortStrategy};
use crate::sort::SortKey;

/// Maximum `limit + offset` for which bounded Top-N selection replaces a
/// full sort.
pub const TOP_N_THRESHOLD: usize = 100;

pub struct QueryPlanner<'a> {
    indices: &'a HashMap<String, Arc<IndexEngine>>,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(indices: &'a HashMap<String, Arc<IndexEngine>>) -> Self {
        Self { indices }
    }

    /// Engines in deterministic name order, so equal-scoring candidates
    /// resolve the same way on every run.
    fn engines_sorted(&self) -> Vec<(&str, &Arc<IndexEngine>)> {
        let mut engines: Vec<_> = self
            .indices
            .iter()
            .map(|(name, engine)| (name.as_str(), engine))
            .collect();
        engines.sort_by_key(|(name, _)| *name);
        engines
    }

    /// Single-field index covering `field`, if any.
    fn single_field_index(&self, field: &str) -> Option<&str> {
        self.engines_sorted()
            .into_iter()
            .find(|(_, engine)| engine.fields().len() == 1 && engine.fields()[0] == field)
            .map(|(name, _)| name)
    }

    /// Plan a conjunction of equality leaves.
    pub fn plan_conjunction(&self, leaves: &[(String, Value)]) -> Result<QueryPlan> {
        let mut best = QueryPlan {
            access: AccessPath::FullScan {
                predicate: ScanPredicate::All(leaves.to_vec()),
            },
            selectivity: 1.0,
        };

        for candidate in self.composite_candidates(leaves) {
            best = pick(best, candidate);
        }
        if let Some(candidate) = self.intersect_candidate(leaves)? {
            best = pick(best, candidate);
        }

        debug!(
            "planned {:?} (selectivity {:.6}) for {} leaves",
            best.strategy(),
            best.selectivity,
            leaves.len()
        );
        Ok(best)
    }

    /// Composite-index candidates: order-sensitive prefix match of each
    /// engine's field list against the query leaves.
    fn composite_candidates(&self, leaves: &[(String, Value)]) -> Vec<QueryPlan> {
        let mut candidates = Vec::new();
        for (name, engine) in self.engines_sorted() {
            let fields = engine.fields();
            let p = fields
                .iter()
                .zip(leaves.iter())
                .take_while(|(field, (query_field, _))| *field == query_field)
                .count();
            if p == 0 {
                continue;
            }
            let values: Vec<Value> = leaves.iter().map(|(_, v)| v.clone()).collect();

            if p == fields.len() && p == leaves.len() {
                candidates.push(QueryPlan {
                    access: AccessPath::ExactMatch {
                        index: name.to_string(),
                        values,
                    },
                    selectivity: 0.1f64.powi(p as i32),
                });
            } else if p < fields.len() && p == leaves.len() {
                candidates.push(QueryPlan {
                    access: AccessPath::PrefixMatch {
                        index: name.to_string(),
                        values,
                    },
                    selectivity: 0.1f64.powi(p as i32),
                });
            } else if p < leaves.len() {
                candidates.push(QueryPlan {
                    access: AccessPath::IndexSeekFilter {
                        index: name.to_string(),
                        prefix_values: values[..p].to_vec(),
                        residual: leaves[p..].to_vec(),
                    },
                    selectivity: 0.1f64.powi(p as i32),
                });
            }
        }
        candidates
    }

    /// Intersection candidate: every single-field index whose field
    /// appears in the query, ordered most selective first by probing the
    /// current posting length.
    fn intersect_candidate(&self, leaves: &[(String, Value)]) -> Result<Option<QueryPlan>> {
        let mut probes: Vec<(usize, String, Value)> = Vec::new();
        let mut residual: Vec<(String, Value)> = Vec::new();

        for (field, value) in leaves {
            match self.single_field_index(field) {
                Some(index) => {
                    let engine = &self.indices[index];
                    let len = match engine.get_exact(std::slice::from_ref(value)) {
                        Ok(postings) => postings.len(),
                        // A value that cannot form a key matches nothing,
                        // which the executor discovers for itself.
                        Err(_) => 0,
                    };
                    probes.push((len, index.to_string(), value.clone()));
                }
                None => residual.push((field.clone(), value.clone())),
            }
        }

        if probes.is_empty() {
            return Ok(None);
        }
        probes.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        let count = probes.len();
        Ok(Some(QueryPlan {
            access: AccessPath::IndexIntersect {
                probes: probes
                    .into_iter()
                    .map(|(_, index, value)| (index, value))
                    .collect(),
                residual,
            },
            selectivity: 0.1 / count as f64,
        }))
    }

    /// Plan a disjunction of equality leaves: an index union when every
    /// field is covered by a single-field index, otherwise a full scan.
    pub fn plan_disjunction(&self, leaves: &[(String, Value)]) -> QueryPlan {
        let mut probes = Vec::with_capacity(leaves.len());
        for (field, value) in leaves {
            match self.single_field_index(field) {
                Some(index) => probes.push((index.to_string(), value.clone())),
                None => {
                    return QueryPlan {
                        access: AccessPath::FullScan {
                            predicate: ScanPredicate::Any(leaves.to_vec()),
                        },
                        selectivity: 1.0,
                    }
                }
            }
        }
        QueryPlan {
            access: AccessPath::IndexUnion { probes },
            selectivity: 0.1,
        }
    }

    /// Pick the sort strategy for an ORDER BY.
    ///
    /// Key-ordered index iteration applies when the first sort field has
    /// a single-field index and the query carries no equality restriction
    /// (or only one, on that same field). Bounded Top-N applies to
    /// single-key sorts with a small window. Everything else loads and
    /// sorts.
    pub fn plan_order_by(
        &self,
        keys: &[SortKey],
        equality_fields: &[String],
        limit: Option<usize>,
        offset: usize,
    ) -> SortStrategy {
        let Some(first) = keys.first() else {
            return SortStrategy::LoadAndSort;
        };

        let unrestricted = equality_fields.is_empty()
            || (equality_fields.len() == 1 && equality_fields[0] == first.field);
        if unrestricted {
            if let Some(index) = self.single_field_index(&first.field) {
                return SortStrategy::IndexScanOrdered {
                    index: index.to_string(),
                };
            }
        }

        if keys.len() == 1 {
            if let Some(limit) = limit {
                let window = limit.saturating_add(offset);
                if window <= TOP_N_THRESHOLD {
                    return SortStrategy::TopN { n: window };
                }
            }
        }

        SortStrategy::LoadAndSort
    }
}

/// Smaller selectivity wins; ties break on strategy rank.
fn pick(a: QueryPlan, b: QueryPlan) -> QueryPlan {
    if b.selectivity < a.selectivity
        || (b.selectivity == a.selectivity && b.strategy().rank() < a.strategy().rank())
    {
        b
    } else {
        a
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Strategy;
    use serde_json::json;
    use tempfile::TempDir;

    fn engines(
        dir: &std::path::Path,
        defs: &[(&str, &[&str])],
    ) -> HashMap<String, Arc<IndexEngine>> {
        defs.iter()
            .map(|(name, fields)| {
                (
                    name.to_string(),
                    Arc::new(IndexEngine::new(
                        dir,
                        name,
                        fields.iter().map(|f| f.to_string()).collect(),
                    )),
                )
            })
            .collect()
    }

    fn leaves(pairs: &[(&str, serde_json::Value)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(f, v)| (f.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn full_coverage_plans_exact_match() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("age_role_active", &["age", "role", "active"])]);
        let planner = QueryPlanner::new(&idx);

        let plan = planner
            .plan_conjunction(&leaves(&[
                ("age", json!(29)),
                ("role", json!("designer")),
                ("active", json!(true)),
            ]))
            .unwrap();
        assert_eq!(plan.strategy(), Strategy::ExactMatch);
        assert!((plan.selectivity - 0.001).abs() < 1e-12);
    }

    #[test]
    fn strict_prefix_plans_prefix_match() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("age_role_active", &["age", "role", "active"])]);
        let planner = QueryPlanner::new(&idx);

        let plan = planner
            .plan_conjunction(&leaves(&[("age", json!(29)), ("role", json!("designer"))]))
            .unwrap();
        assert_eq!(plan.strategy(), Strategy::PrefixMatch);
        match plan.access {
            AccessPath::PrefixMatch { ref index, ref values } => {
                assert_eq!(index, "age_role_active");
                assert_eq!(values.len(), 2);
            }
            ref other => panic!("unexpected access path {:?}", other),
        }
    }

    #[test]
    fn matching_is_order_sensitive() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("age_role", &["age", "role"])]);
        let planner = QueryPlanner::new(&idx);

        // Same fields, reversed order: no composite candidate survives,
        // and with no single-field index the fallback is a full scan.
        let plan = planner
            .plan_conjunction(&leaves(&[("role", json!("designer")), ("age", json!(29))]))
            .unwrap();
        assert_eq!(plan.strategy(), Strategy::FullScan);
    }

    #[test]
    fn intersection_beats_seek_filter_for_two_single_field_indices() {
        let dir = TempDir::new().unwrap();
        let idx = engines(
            dir.path(),
            &[("role", &["role"]), ("age", &["age"]), ("active", &["active"])],
        );
        let planner = QueryPlanner::new(&idx);

        let plan = planner
            .plan_conjunction(&leaves(&[
                ("role", json!("developer")),
                ("active", json!(true)),
            ]))
            .unwrap();
        assert_eq!(plan.strategy(), Strategy::IndexIntersect);
        // 0.1 / 2 beats the 0.1 seek-filter on the role index
        assert!((plan.selectivity - 0.05).abs() < 1e-12);
    }

    #[test]
    fn intersection_orders_probes_by_posting_length() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("role", &["role"]), ("active", &["active"])]);
        // "active=true" is common, "role=qa" is rare
        for id in ["a", "b", "c"] {
            idx["active"].add(&[json!(true)], id).unwrap();
        }
        idx["role"].add(&[json!("qa")], "c").unwrap();

        let planner = QueryPlanner::new(&idx);
        let plan = planner
            .plan_conjunction(&leaves(&[
                ("active", json!(true)),
                ("role", json!("qa")),
            ]))
            .unwrap();
        match plan.access {
            AccessPath::IndexIntersect { ref probes, .. } => {
                assert_eq!(probes[0].0, "role");
                assert_eq!(probes[1].0, "active");
            }
            ref other => panic!("unexpected access path {:?}", other),
        }
    }

    #[test]
    fn uncovered_query_falls_back_to_full_scan() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("role", &["role"])]);
        let planner = QueryPlanner::new(&idx);

        let plan = planner
            .plan_conjunction(&leaves(&[("email", json!("a@b"))]))
            .unwrap();
        assert_eq!(plan.strategy(), Strategy::FullScan);
    }

    #[test]
    fn partially_covered_conjunction_keeps_residual() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("role", &["role"])]);
        let planner = QueryPlanner::new(&idx);

        let plan = planner
            .plan_conjunction(&leaves(&[
                ("role", json!("dev")),
                ("email", json!("a@b")),
            ]))
            .unwrap();
        // role index covers leaf 0; email stays as residual. The seek
        // filter (0.1) ties with intersect (0.1/1) and intersect ranks
        // higher.
        assert_eq!(plan.strategy(), Strategy::IndexIntersect);
        match plan.access {
            AccessPath::IndexIntersect { ref probes, ref residual } => {
                assert_eq!(probes.len(), 1);
                assert_eq!(residual.len(), 1);
                assert_eq!(residual[0].0, "email");
            }
            ref other => panic!("unexpected access path {:?}", other),
        }
    }

    #[test]
    fn disjunction_needs_every_field_indexed() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("role", &["role"])]);
        let planner = QueryPlanner::new(&idx);

        let plan = planner.plan_disjunction(&leaves(&[
            ("role", json!("manager")),
            ("role", json!("designer")),
        ]));
        assert_eq!(plan.strategy(), Strategy::IndexUnion);

        let plan = planner.plan_disjunction(&leaves(&[
            ("role", json!("manager")),
            ("email", json!("a@b")),
        ]));
        assert_eq!(plan.strategy(), Strategy::FullScan);
    }

    #[test]
    fn order_by_planning_picks_strategies() {
        let dir = TempDir::new().unwrap();
        let idx = engines(dir.path(), &[("age", &["age"])]);
        let planner = QueryPlanner::new(&idx);
        let age_asc = [SortKey {
            field: "age".to_string(),
            dir: crate::sort::SortDir::Asc,
        }];

        // Unrestricted sort on an indexed field: key-ordered iteration
        assert_eq!(
            planner.plan_order_by(&age_asc, &[], Some(10), 0),
            SortStrategy::IndexScanOrdered { index: "age".to_string() }
        );
        // Equality on the same field keeps the index scan admissible
        assert_eq!(
            planner.plan_order_by(&age_asc, &["age".to_string()], None, 0),
            SortStrategy::IndexScanOrdered { index: "age".to_string() }
        );
        // Equality on another field: small window → Top-N
        assert_eq!(
            planner.plan_order_by(&age_asc, &["role".to_string()], Some(10), 5),
            SortStrategy::TopN { n: 15 }
        );
        // Large window → load and sort
        assert_eq!(
            planner.plan_order_by(&age_asc, &["role".to_string()], Some(200), 0),
            SortStrategy::LoadAndSort
        );
        // No limit → load and sort
        assert_eq!(
            planner.plan_order_by(&age_asc, &["role".to_string()], None, 0),
            SortStrategy::LoadAndSort
        );
    }
}
