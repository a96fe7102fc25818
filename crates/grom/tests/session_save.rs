// GROM - Graph Object Mapper
//
// Copyright (c) 2025 Grom Maintainers and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Save-path behavior: diffing, merged statements, snapshots, atomicity.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::StubExecutor;
use grom::{
    Entity, EntityHooks, EntityState, GromError, SaveOptions, Session, StoreError, Value,
};
use grom_core::schema::{EntityDescriptor, SchemaRegistry};
use grom_test::fixtures;

fn session() -> Session {
    Session::new(fixtures::shared_registry())
}

#[test]
fn first_save_creates_with_full_payload() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    session.entity_mut(alice).set_property("name", "Alice");
    assert_eq!(session.state(alice), EntityState::New);

    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    let statement = executor.last_write();
    assert!(statement.query.contains("CREATE (n0:Person $n0_props)"));
    let payload = statement.parameters.get("n0_props").unwrap();
    let map = payload.as_map().unwrap();
    assert_eq!(map.get("name"), Some(&Value::from("Alice")));
    // The generated surrogate identifier is part of the payload.
    assert!(map.contains_key("_grom_id"));

    assert_eq!(session.state(alice), EntityState::Persisted);
    let id = session.entity(alice).id().unwrap().clone();
    assert_eq!(session.find(&id), Some(alice));
}

#[test]
fn save_is_idempotent_without_mutation() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    session.entity_mut(alice).set_property("name", "Alice");
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();
    assert_eq!(executor.executed.len(), 1);

    // Nothing changed: the second save must not write at all.
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();
    assert_eq!(executor.executed.len(), 1);
}

#[test]
fn property_change_writes_only_the_delta() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    session.entity_mut(alice).set_property("name", "Alice");
    let mut address = BTreeMap::new();
    address.insert("city".to_string(), Value::from("Berlin"));
    session
        .entity_mut(alice)
        .set_property("address", Value::Map(address.clone()));
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    address.insert("city".to_string(), Value::from("Hamburg"));
    session
        .entity_mut(alice)
        .set_property("address", Value::Map(address));
    assert_eq!(session.state(alice), EntityState::Dirty);

    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();
    let statement = executor.last_write();
    assert!(statement.query.contains("MATCH (n0:Person {_grom_id: $n0_id})"));
    assert!(statement.query.contains("SET n0 += $n0_set"));

    // Only the flattened composite key that changed is in the delta.
    let set = statement.parameters.get("n0_set").unwrap().as_map().unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.get("address.city"), Some(&Value::from("Hamburg")));
}

#[test]
fn removed_property_is_nulled() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    session.entity_mut(alice).set_property("name", "Alice");
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    session.entity_mut(alice).unset_property("name");
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    let set = executor
        .last_write()
        .parameters
        .get("n0_set")
        .unwrap()
        .as_map()
        .unwrap();
    assert_eq!(set.get("name"), Some(&Value::Null));
}

#[test]
fn undirected_relationship_mirrors_two_edges() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    let bob = session.create("Person").unwrap();
    session.relate(alice, "friends", bob).unwrap();
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    let query = &executor.last_write().query;
    assert!(query.contains("MERGE (n0)-[r0:FRIEND_OF]->(n1)"));
    assert!(query.contains("MERGE (n1)-[r1:FRIEND_OF]->(n0)"));
}

#[test]
fn failed_save_leaves_snapshot_untouched() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    session.entity_mut(alice).set_property("name", "Alice");
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    session.entity_mut(alice).set_property("name", "Alicia");
    executor.fail_next_execute = Some(StoreError::transient("connection reset"));
    let err = session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap_err();
    assert!(matches!(err, GromError::StoreUnavailable(_)));
    assert!(err.is_retryable());

    // The baseline is unchanged, so the retry recomputes the same diff.
    assert_eq!(session.state(alice), EntityState::Dirty);
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();
    let set = executor
        .last_write()
        .parameters
        .get("n0_set")
        .unwrap()
        .as_map()
        .unwrap();
    assert_eq!(set.get("name"), Some(&Value::from("Alicia")));
}

#[test]
fn depth_bounded_save_skips_deeper_changes() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    let bob = session.create("Person").unwrap();
    let movie = session.create("Movie").unwrap();
    session.relate(alice, "friends", bob).unwrap();
    session.relate(bob, "ratings", movie).unwrap();

    // Depth 1: bob is written and related, but bob's own slots are beyond
    // the bound, so the movie is neither created nor related.
    session
        .save(&mut executor, alice, &SaveOptions::depth(1))
        .unwrap();
    let query = &executor.last_write().query;
    assert!(query.contains("FRIEND_OF"));
    assert!(!query.contains("RATED"));
    assert!(session.entity(movie).id().is_none());

    // The documented boundary: the deeper edge silently stays in memory
    // until a deeper save picks it up.
    session
        .save(&mut executor, bob, &SaveOptions::default())
        .unwrap();
    assert!(executor.last_write().query.contains("RATED"));
}

#[test]
fn save_depth_zero_writes_properties_only() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    let bob = session.create("Person").unwrap();
    session.entity_mut(alice).set_property("name", "Alice");
    session.relate(alice, "friends", bob).unwrap();

    session
        .save(&mut executor, alice, &SaveOptions::depth(0))
        .unwrap();
    let query = &executor.last_write().query;
    assert!(query.contains("CREATE"));
    assert!(!query.contains("FRIEND_OF"));
    // Bob was beyond the bound entirely.
    assert!(session.entity(bob).id().is_none());
}

#[test]
fn nonsensical_depth_is_invalid_usage() {
    let mut executor = StubExecutor::new();
    let mut session = session();
    let alice = session.create("Person").unwrap();
    let err = session
        .save(&mut executor, alice, &SaveOptions::depth(1000))
        .unwrap_err();
    assert!(matches!(err, GromError::InvalidUsage(_)));
}

#[test]
fn dynamic_label_diff() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let company = session.create("Company").unwrap();
    session.entity_mut(company).set_property("name", "Initech");
    session.entity_mut(company).add_label("Startup");
    session
        .save(&mut executor, company, &SaveOptions::default())
        .unwrap();
    assert!(executor.last_write().query.contains("SET n0:Startup"));

    session.entity_mut(company).remove_label("Startup");
    session.entity_mut(company).add_label("Acquired");
    session
        .save(&mut executor, company, &SaveOptions::default())
        .unwrap();
    let query = &executor.last_write().query;
    assert!(query.contains("SET n0:Acquired"));
    assert!(query.contains("REMOVE n0:Startup"));
}

#[test]
fn relationship_entity_addition_and_update() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    let movie = session.create("Movie").unwrap();
    session
        .relate_with(
            alice,
            "ratings",
            grom::RelTarget::plain(movie).with_property("stars", 4i64),
        )
        .unwrap();
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    let statement = executor.last_write().clone();
    assert!(statement.query.contains("MERGE (n0)-[r0:RATED]->(n1)"));
    let props = statement.parameters.get("r0_props").unwrap().as_map().unwrap();
    assert_eq!(props.get("stars"), Some(&Value::Int(4)));
    // The edge carries its own generated identifier.
    assert!(props.contains_key("_grom_id"));

    // Changing only the edge property updates the edge by identifier.
    let target = session.entity(alice).targets("ratings")[0].clone();
    session
        .relate_with(
            alice,
            "ratings",
            grom::RelTarget {
                properties: {
                    let mut p = BTreeMap::new();
                    p.insert("stars".to_string(), Value::Int(5));
                    p
                },
                ..target
            },
        )
        .unwrap();
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();
    let statement = executor.last_write();
    assert!(statement.query.contains("OPTIONAL MATCH (n0)-[r0:RATED]->(m1)"));
    assert!(statement.query.contains("WHERE r0._grom_id = $r0_id"));
    assert!(statement.query.contains("SET r0 += $r0_set"));
}

#[test]
fn keyed_slot_derives_relationship_type_from_the_key() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let article = session.create("Article").unwrap();
    let cited = session.create("Article").unwrap();
    // A keyed slot needs a key per target.
    let err = session.relate(article, "links", cited).unwrap_err();
    assert!(matches!(err, GromError::InvalidUsage(_)));

    session
        .relate_with(article, "links", grom::RelTarget::keyed(cited, "CITES"))
        .unwrap();
    session
        .save(&mut executor, article, &SaveOptions::default())
        .unwrap();
    assert!(executor
        .last_write()
        .query
        .contains("MERGE (n0)-[r0:CITES]->(n1)"));

    // Dropping the keyed entry removes the edge under the same type.
    session.unrelate(article, "links", cited).unwrap();
    session
        .save(&mut executor, article, &SaveOptions::default())
        .unwrap();
    assert!(executor.last_write().query.contains(":CITES"));
    assert!(executor.last_write().query.contains("DELETE"));
}

#[test]
fn incoming_slot_swaps_edge_endpoints() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let company = session.create("Company").unwrap();
    let person = session.create("Person").unwrap();
    session.relate(company, "staff", person).unwrap();
    session
        .save(&mut executor, company, &SaveOptions::default())
        .unwrap();

    // Company owns the slot, but the stored edge runs person -> company.
    assert!(executor
        .last_write()
        .query
        .contains("MERGE (n1)-[r0:WORKS_AT]->(n0)"));
}

#[test]
fn delete_is_terminal() {
    let mut executor = StubExecutor::new();
    let mut session = session();

    let alice = session.create("Person").unwrap();
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();
    let id = session.entity(alice).id().unwrap().clone();

    session.delete(&mut executor, alice).unwrap();
    let statement = executor.last_write();
    assert!(statement
        .query
        .contains("MATCH (n:Person {_grom_id: $id}) DETACH DELETE n"));
    assert_eq!(session.state(alice), EntityState::Deleted);
    assert_eq!(session.find(&id), None);

    let err = session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap_err();
    assert!(matches!(err, GromError::InvalidUsage(_)));
}

#[test]
fn assigned_identifier_is_required_before_save() {
    let registry = Arc::new(
        SchemaRegistry::builder()
            .register(
                EntityDescriptor::node("Book")
                    .id("isbn")
                    .scalar("title")
                    .declare(),
            )
            .build()
            .unwrap(),
    );
    let mut executor = StubExecutor::new();
    let mut session = Session::new(registry);

    let book = session.create("Book").unwrap();
    session.entity_mut(book).set_property("title", "Dune");
    let err = session
        .save(&mut executor, book, &SaveOptions::default())
        .unwrap_err();
    assert!(matches!(err, GromError::Mapping(_)));

    session.set_id(book, "978-0441172719").unwrap();
    session
        .save(&mut executor, book, &SaveOptions::default())
        .unwrap();
    let payload = executor
        .last_write()
        .parameters
        .get("n0_props")
        .unwrap()
        .as_map()
        .unwrap();
    assert_eq!(payload.get("isbn"), Some(&Value::from("978-0441172719")));

    // A persisted identifier cannot be reassigned.
    assert!(session.set_id(book, "other").is_err());
}

struct StampHook;

impl EntityHooks for StampHook {
    fn before_write(&mut self, entity: &mut Entity) {
        entity.set_property("name", "stamped");
    }
}

#[test]
fn before_write_hook_runs_before_diffing() {
    let mut executor = StubExecutor::new();
    let mut session = session();
    session.register_hooks(Box::new(StampHook));

    let alice = session.create("Person").unwrap();
    session.entity_mut(alice).set_property("name", "Alice");
    session
        .save(&mut executor, alice, &SaveOptions::default())
        .unwrap();

    let payload = executor
        .last_write()
        .parameters
        .get("n0_props")
        .unwrap()
        .as_map()
        .unwrap();
    assert_eq!(payload.get("name"), Some(&Value::from("stamped")));
}
