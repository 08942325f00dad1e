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

//! End-to-end query scenarios
//!
//! Full write-then-query pipelines through the public API, one test per
//! planner strategy, plus the write-path invariants that queries observe.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use foliodb_client::{
    Collection, Database, DatabaseOptions, Document, FindQuery, FolioDbError, Schema, Strategy,
};

/// Test fixture: a fresh database with one collection.
struct DbFixture {
    _dir: TempDir,
    // Kept alive: collections resolve relations through the database.
    _db: Database,
    users: Arc<Collection>,
}

impl DbFixture {
    fn new(schema: serde_json::Value) -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::create(dir.path().join("db"), DatabaseOptions::default()).unwrap();
        let schema: Schema = serde_json::from_value(schema).unwrap();
        let users = db.collection("users", Some(schema)).unwrap();
        Self {
            _dir: dir,
            _db: db,
            users,
        }
    }

    fn composite_schema() -> serde_json::Value {
        json!({
            "indices": { "age_role_active": ["age", "role", "active"] }
        })
    }

    fn single_field_schema() -> serde_json::Value {
        json!({
            "indices": { "role": ["role"], "age": ["age"], "active": ["active"] }
        })
    }

    fn insert(&self, raw: serde_json::Value) -> Document {
        self.users
            .insert(serde_json::from_value(raw).unwrap())
            .unwrap()
    }
}

fn result_ids(result: &foliodb_client::FindResult) -> Vec<String> {
    let mut ids: Vec<String> = result
        .results
        .iter()
        .map(|d| d["id"].as_str().unwrap().to_string())
        .collect();
    ids.sort();
    ids
}

#[test]
fn insert_and_exact_composite_lookup() {
    let f = DbFixture::new(DbFixture::composite_schema());
    let x = f.insert(json!({ "name": "A", "age": 29, "role": "designer", "active": true }));
    f.insert(json!({ "name": "B", "age": 29, "role": "designer", "active": false }));

    let query = FindQuery::new().where_clause(json!({
        "$and": [ { "age": 29 }, { "role": "designer" }, { "active": true } ]
    }));
    assert_eq!(f.users.explain(&query).unwrap(), Strategy::ExactMatch);

    let result = f.users.find(&query).unwrap();
    assert_eq!(result.size, 1);
    assert_eq!(result.results[0]["id"], x["id"]);
    assert_eq!(result.results[0]["name"], json!("A"));
}

#[test]
fn prefix_composite_lookup() {
    let f = DbFixture::new(DbFixture::composite_schema());
    let x = f.insert(json!({ "age": 29, "role": "designer", "active": true }));
    let y = f.insert(json!({ "age": 29, "role": "designer", "active": false }));
    f.insert(json!({ "age": 30, "role": "designer", "active": true }));

    let query = FindQuery::new().where_clause(json!({
        "$and": [ { "age": 29 }, { "role": "designer" } ]
    }));
    assert_eq!(f.users.explain(&query).unwrap(), Strategy::PrefixMatch);

    let result = f.users.find(&query).unwrap();
    assert_eq!(result.size, 2);
    let mut expected = vec![
        x["id"].as_str().unwrap().to_string(),
        y["id"].as_str().unwrap().to_string(),
    ];
    expected.sort();
    assert_eq!(result_ids(&result), expected);
}

#[test]
fn index_intersection_with_order_and_limit() {
    let f = DbFixture::new(DbFixture::single_field_schema());
    for _ in 0..3 {
        f.insert(json!({ "role": "developer", "active": true, "age": 30 }));
    }
    f.insert(json!({ "role": "developer", "active": false, "age": 30 }));
    f.insert(json!({ "role": "manager", "active": true, "age": 40 }));

    let query = FindQuery::new()
        .where_clause(json!({
            "$and": [ { "role": "developer" }, { "active": true } ]
        }))
        .order_by(json!("id asc"))
        .limit(2);
    assert_eq!(f.users.explain(&query).unwrap(), Strategy::IndexIntersect);

    let result = f.users.find(&query).unwrap();
    assert_eq!(result.size, 3);
    assert_eq!(result.results.len(), 2);
    for doc in &result.results {
        assert_eq!(doc["role"], json!("developer"));
        assert_eq!(doc["active"], json!(true));
    }
    let returned: Vec<&str> = result
        .results
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert!(returned[0] < returned[1], "results sorted by id ascending");
}

#[test]
fn index_union_over_disjunction() {
    let f = DbFixture::new(DbFixture::single_field_schema());
    let m = f.insert(json!({ "role": "manager", "active": true, "age": 1 }));
    let d = f.insert(json!({ "role": "designer", "active": true, "age": 2 }));
    f.insert(json!({ "role": "developer", "active": true, "age": 3 }));

    let query = FindQuery::new().where_clause(json!({
        "$or": [ { "role": "manager" }, { "role": "designer" } ]
    }));
    assert_eq!(f.users.explain(&query).unwrap(), Strategy::IndexUnion);

    let result = f.users.find(&query).unwrap();
    let mut expected = vec![
        m["id"].as_str().unwrap().to_string(),
        d["id"].as_str().unwrap().to_string(),
    ];
    expected.sort();
    assert_eq!(result_ids(&result), expected);
}

#[test]
fn full_scan_fallback_on_unindexed_field() {
    let f = DbFixture::new(DbFixture::single_field_schema());
    let hit = f.insert(json!({ "role": "dev", "active": true, "age": 1, "email": "a@b" }));
    f.insert(json!({ "role": "dev", "active": true, "age": 2, "email": "c@d" }));

    let query = FindQuery::new().where_clause(json!({ "email": "a@b" }));
    assert_eq!(f.users.explain(&query).unwrap(), Strategy::FullScan);

    let result = f.users.find(&query).unwrap();
    assert_eq!(result.size, 1);
    assert_eq!(result.results[0]["id"], hit["id"]);
}

#[test]
fn update_repositions_index_entry() {
    let f = DbFixture::new(json!({ "indices": { "age": ["age"] } }));
    let z = f.insert(json!({ "age": 29 }));
    let z_id = z["id"].as_str().unwrap();

    f.users
        .update(z_id, serde_json::from_value(json!({ "age": 30 })).unwrap())
        .unwrap();

    let at_29 = f
        .users
        .find(&FindQuery::new().where_clause(json!({ "age": 29 })))
        .unwrap();
    assert!(result_ids(&at_29).is_empty());

    let at_30 = f
        .users
        .find(&FindQuery::new().where_clause(json!({ "age": 30 })))
        .unwrap();
    assert_eq!(result_ids(&at_30), vec![z_id.to_string()]);
}

#[test]
fn insert_then_get_by_id_round_trips() {
    let f = DbFixture::new(json!({}));
    let inserted = f.insert(json!({ "name": "A", "nested": { "k": [1, 2] } }));
    let id = inserted["id"].as_str().unwrap();

    let loaded = f.users.get_by_id(id).unwrap().unwrap();
    assert_eq!(loaded, inserted);
    assert!(f.users.get_by_id("no-such-id").unwrap().is_none());
}

#[test]
fn delete_leaves_no_index_postings() {
    let f = DbFixture::new(json!({ "indices": { "age": ["age"] } }));
    let doc = f.insert(json!({ "age": 29 }));
    let id = doc["id"].as_str().unwrap();

    assert!(f.users.delete(id).unwrap());
    assert!(!f.users.delete(id).unwrap());

    let result = f
        .users
        .find(&FindQuery::new().where_clause(json!({ "age": 29 })))
        .unwrap();
    assert_eq!(result.size, 0);
}

#[test]
fn rebuild_reproduces_insertion_only_history() {
    let f = DbFixture::new(DbFixture::composite_schema());
    for i in 0..8 {
        f.insert(json!({
            "age": 20 + (i % 3),
            "role": if i % 2 == 0 { "designer" } else { "developer" },
            "active": i % 2 == 0
        }));
    }
    let query = FindQuery::new().where_clause(json!({
        "$and": [ { "age": 20 }, { "role": "designer" } ]
    }));
    let before = result_ids(&f.users.find(&query).unwrap());
    assert!(!before.is_empty());

    f.users.rebuild_all_indices().unwrap();
    let after = result_ids(&f.users.find(&query).unwrap());
    assert_eq!(before, after);
}

#[test]
fn validation_errors_surface() {
    let f = DbFixture::new(json!({
        "fields": {
            "name": { "type": "string", "required": true },
            "age": { "type": "number" }
        }
    }));

    let err = f
        .users
        .insert(serde_json::from_value(json!({ "age": 29 })).unwrap())
        .unwrap_err();
    assert!(matches!(err, FolioDbError::Validation(_)));

    let err = f
        .users
        .insert(serde_json::from_value(json!({ "name": "A", "age": "old" })).unwrap())
        .unwrap_err();
    assert!(matches!(err, FolioDbError::Validation(_)));

    let doc = f.insert(json!({ "name": "A" }));
    let err = f
        .users
        .update(
            doc["id"].as_str().unwrap(),
            serde_json::from_value(json!({ "age": "old" })).unwrap(),
        )
        .unwrap_err();
    assert!(matches!(err, FolioDbError::Validation(_)));
}

#[test]
fn update_of_absent_id_is_not_found() {
    let f = DbFixture::new(json!({}));
    let err = f
        .users
        .update("ghost", serde_json::from_value(json!({ "a": 1 })).unwrap())
        .unwrap_err();
    assert!(matches!(err, FolioDbError::NotFound(_)));
}

#[test]
fn relations_validate_and_populate() {
    let dir = TempDir::new().unwrap();
    let db = Database::create(dir.path().join("db"), DatabaseOptions::default()).unwrap();

    let teams_schema: Schema = serde_json::from_value(json!({})).unwrap();
    let teams = db.collection("teams", Some(teams_schema)).unwrap();
    let team = teams
        .insert(serde_json::from_value(json!({ "label": "storage" })).unwrap())
        .unwrap();
    let team_id = team["id"].as_str().unwrap();

    let users_schema: Schema = serde_json::from_value(json!({
        "relations": { "team": { "collection": "teams" } },
        "validate_relations": true
    }))
    .unwrap();
    let users = db.collection("users", Some(users_schema)).unwrap();

    // Dangling reference rejected
    let err = users
        .insert(serde_json::from_value(json!({ "name": "A", "team": "missing" })).unwrap())
        .unwrap_err();
    assert!(matches!(err, FolioDbError::Relation(_)));

    // Valid reference inserts, then populates
    users
        .insert(serde_json::from_value(json!({ "name": "A", "team": team_id })).unwrap())
        .unwrap();
    let result = users
        .find(&FindQuery::new().where_clause(json!({ "name": "A" })).populate("team"))
        .unwrap();
    assert!(result.populated);
    assert_eq!(result.results[0]["team"]["label"], json!("storage"));
}

#[test]
fn like_filter_order_and_pagination_compose() {
    let f = DbFixture::new(json!({ "indices": { "role": ["role"] } }));
    for i in 0..6 {
        f.insert(json!({
            "role": "dev",
            "level": i,
            "email": format!("user{}@corp.io", i)
        }));
    }
    f.insert(json!({ "role": "ops", "level": 0, "email": "ops@corp.io" }));

    let result = f
        .users
        .find(
            &FindQuery::new()
                .where_clause(json!({ "role": "dev" }))
                .like("email", "user%@corp.io")
                .filter("level", json!(3))
                .order_by(json!("level asc")),
        )
        .unwrap();
    assert_eq!(result.size, 1);
    assert_eq!(result.results[0]["level"], json!(3));

    let paged = f
        .users
        .find(
            &FindQuery::new()
                .where_clause(json!({ "role": "dev" }))
                .order_by(json!("level desc"))
                .limit(2)
                .offset(2),
        )
        .unwrap();
    assert_eq!(paged.size, 6);
    let levels: Vec<i64> = paged
        .results
        .iter()
        .map(|d| d["level"].as_i64().unwrap())
        .collect();
    assert_eq!(levels, vec![3, 2]);
}
