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

//! The social-graph fixture schema and payload builders.

use std::sync::Arc;

use grom_core::schema::{
    EntityDescriptor, PropertyDescriptor, RelationshipDescriptor, SchemaRegistry,
};
use grom_core::{NodePayload, RelPayload, ResultRow, RowValue};

/// The fixture schema.
///
/// - `Person` — scalar `name`, composite `address`, undirected `friends`,
///   `ratings` carrying a `Rating` relationship entity, polymorphic
///   `owns` over the `Asset` hierarchy
/// - `Employee` — extends `Person` with `salary`
/// - `Company` — `name`, dynamic labels, incoming `staff`
/// - `Movie` — `title`
/// - `Article` — keyed `links` slot whose map key is the edge type
/// - `Rating` — relationship entity with `stars`
/// - `Asset` / `Car` / `House` — inheritance for polymorphic targets
pub fn social_registry() -> SchemaRegistry {
    match try_social_registry() {
        Ok(registry) => registry,
        Err(err) => panic!("fixture schema must build: {}", err),
    }
}

fn try_social_registry() -> Result<SchemaRegistry, grom_core::MappingError> {
    SchemaRegistry::builder()
        .register(
            EntityDescriptor::node("Person")
                .scalar("name")
                .property(PropertyDescriptor::composite("address", "address", '.'))
                .relationship(
                    RelationshipDescriptor::to_many("friends", "FRIEND_OF", "Person")
                        .undirected(),
                )
                .relationship(
                    RelationshipDescriptor::to_many("ratings", "RATED", "Movie")
                        .with_entity("Rating"),
                )
                .relationship(
                    RelationshipDescriptor::to_many("owns", "OWNS", "Asset").polymorphic(),
                )
                .relationship(RelationshipDescriptor::to_one(
                    "employer", "WORKS_AT", "Company",
                ))
                .declare(),
        )
        .register(
            EntityDescriptor::node("Employee")
                .extends("Person")
                .scalar("salary")
                .declare(),
        )
        .register(
            EntityDescriptor::node("Company")
                .scalar("name")
                .dynamic_labels("tags")
                .relationship(
                    RelationshipDescriptor::to_many("staff", "WORKS_AT", "Person").incoming(),
                )
                .declare(),
        )
        .register(EntityDescriptor::node("Movie").scalar("title").declare())
        .register(
            EntityDescriptor::node("Article")
                .scalar("title")
                .relationship(RelationshipDescriptor::keyed("links", "Article"))
                .declare(),
        )
        .register(
            EntityDescriptor::relationship_entity("Rating")
                .scalar("stars")
                .declare(),
        )
        .register(EntityDescriptor::node("Asset").scalar("value").declare())
        .register(
            EntityDescriptor::node("Car")
                .extends("Asset")
                .scalar("plate")
                .declare(),
        )
        .register(EntityDescriptor::node("House").extends("Asset").declare())
        .build()
}

/// The fixture schema, shareable across sessions.
pub fn shared_registry() -> Arc<SchemaRegistry> {
    Arc::new(social_registry())
}

/// A `Person` node payload with a generated identifier.
pub fn person_node(store_id: i64, gid: i64, name: &str) -> NodePayload {
    NodePayload::new(store_id, ["Person"])
        .with_property("_grom_id", gid)
        .with_property("name", name)
}

/// An `Employee` node payload carrying its full label set.
pub fn employee_node(store_id: i64, gid: i64, name: &str, salary: i64) -> NodePayload {
    NodePayload::new(store_id, ["Employee", "Person"])
        .with_property("_grom_id", gid)
        .with_property("name", name)
        .with_property("salary", salary)
}

/// A `Company` node payload with optional dynamic labels.
pub fn company_node(store_id: i64, gid: i64, name: &str, tags: &[&str]) -> NodePayload {
    let mut labels = vec!["Company".to_string()];
    labels.extend(tags.iter().map(|t| t.to_string()));
    NodePayload::new(store_id, labels)
        .with_property("_grom_id", gid)
        .with_property("name", name)
}

/// A `Movie` node payload.
pub fn movie_node(store_id: i64, gid: i64, title: &str) -> NodePayload {
    NodePayload::new(store_id, ["Movie"])
        .with_property("_grom_id", gid)
        .with_property("title", title)
}

/// A `Car` node payload (an `Asset` subtype).
pub fn car_node(store_id: i64, gid: i64, plate: &str) -> NodePayload {
    NodePayload::new(store_id, ["Car", "Asset"])
        .with_property("_grom_id", gid)
        .with_property("plate", plate)
}

/// An `Article` node payload.
pub fn article_node(store_id: i64, gid: i64, title: &str) -> NodePayload {
    NodePayload::new(store_id, ["Article"])
        .with_property("_grom_id", gid)
        .with_property("title", title)
}

/// A `FRIEND_OF` edge payload.
pub fn friend_edge(id: i64, start: i64, end: i64) -> RelPayload {
    RelPayload::new(id, "FRIEND_OF", start, end)
}

/// A `RATED` edge payload carrying `Rating` entity state.
pub fn rated_edge(id: i64, start: i64, end: i64, rating_id: i64, stars: i64) -> RelPayload {
    RelPayload::new(id, "RATED", start, end)
        .with_property("_grom_id", rating_id)
        .with_property("stars", stars)
}

/// An `OWNS` edge payload.
pub fn owns_edge(id: i64, start: i64, end: i64) -> RelPayload {
    RelPayload::new(id, "OWNS", start, end)
}

/// A row with a single root node column `n`.
pub fn node_row(node: NodePayload) -> ResultRow {
    ResultRow::new().with("n", RowValue::Node(node))
}

/// A row shaped like a depth-bounded path query result: root column `n`
/// plus a path column `p`.
pub fn path_row(
    root: NodePayload,
    nodes: Vec<NodePayload>,
    relationships: Vec<RelPayload>,
) -> ResultRow {
    let mut path_nodes = vec![root.clone()];
    path_nodes.extend(nodes);
    ResultRow::new()
        .with("n", RowValue::Node(root))
        .with(
            "p",
            RowValue::Path(grom_core::PathPayload {
                nodes: path_nodes,
                relationships,
            }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_schema_builds() {
        let registry = social_registry();
        assert!(registry.len() >= 8);
        assert!(registry.describe("Employee").is_ok());
        assert!(registry.is_assignable("Car", "Asset"));
    }

    #[test]
    fn test_payload_builders_match_schema() {
        let registry = social_registry();
        let employee = employee_node(1, 10, "Ada", 95_000);
        let resolved = registry.resolve_labels(&employee.labels).unwrap();
        assert_eq!(resolved.type_name, "Employee");

        let company = company_node(2, 20, "Initech", &["Startup"]);
        let resolved = registry.resolve_labels(&company.labels).unwrap();
        assert_eq!(resolved.type_name, "Company");
    }
}
