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

//! The process-wide type registry.
//!
//! [`SchemaRegistry::build`](SchemaRegistryBuilder::build) resolves
//! supertype chains and validates the whole configuration once; the built
//! registry is immutable and is shared across sessions behind an `Arc`.
//! Lookups never recompute anything.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::MappingError;
use crate::schema::descriptor::{
    DescriptorKind, EntityDescriptor, IdDescriptor, IdStrategy,
};

/// Immutable, resolved registry of all mapped types.
#[derive(Debug)]
pub struct SchemaRegistry {
    types: BTreeMap<String, EntityDescriptor>,
    // Sorted label set -> type name, for the exact-match fast path.
    by_label_set: BTreeMap<Vec<String>, String>,
}

impl SchemaRegistry {
    /// Start declaring a registry.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Look up the resolved descriptor for a type name.
    pub fn describe(&self, type_name: &str) -> Result<&EntityDescriptor, MappingError> {
        self.types
            .get(type_name)
            .ok_or_else(|| MappingError::UnknownType(type_name.to_string()))
    }

    /// Look up a relationship-entity descriptor by type name.
    pub fn relationship_entity(
        &self,
        type_name: &str,
    ) -> Result<&EntityDescriptor, MappingError> {
        let descriptor = self.describe(type_name)?;
        if descriptor.kind != DescriptorKind::RelationshipEntity {
            return Err(MappingError::NotARelationshipEntity(type_name.to_string()));
        }
        Ok(descriptor)
    }

    /// Resolve a payload's label set to the most specific mapped type.
    ///
    /// Picks the registered node type with the largest label set that is a
    /// subset of `labels`. Dynamic labels on the payload are ignored by
    /// construction (they are never part of a registered label set). Two
    /// equally-specific candidates are a configuration/payload mismatch
    /// surfaced as [`MappingError::AmbiguousLabels`].
    pub fn resolve_labels(&self, labels: &[String]) -> Result<&EntityDescriptor, MappingError> {
        // Fast path: the payload's labels are exactly one registered set.
        let mut sorted: Vec<String> = labels.to_vec();
        sorted.sort();
        sorted.dedup();
        if let Some(type_name) = self.by_label_set.get(&sorted) {
            return self.describe(type_name);
        }

        let present: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
        let mut best: Vec<&EntityDescriptor> = Vec::new();
        let mut best_len = 0usize;

        for descriptor in self.types.values() {
            if descriptor.kind != DescriptorKind::Node {
                continue;
            }
            let set = descriptor.label_set();
            if set.len() < best_len || !set.iter().all(|l| present.contains(l)) {
                continue;
            }
            if set.len() > best_len {
                best.clear();
                best_len = set.len();
            }
            best.push(descriptor);
        }

        match best.len() {
            0 => Err(MappingError::UnresolvedLabels {
                labels: labels.to_vec(),
            }),
            1 => Ok(best[0]),
            _ => Err(MappingError::AmbiguousLabels {
                labels: labels.to_vec(),
                candidates: best.iter().map(|d| d.type_name.clone()).collect(),
            }),
        }
    }

    /// Whether `actual` is `expected` or one of its registered subtypes.
    pub fn is_assignable(&self, actual: &str, expected: &str) -> bool {
        if actual == expected {
            return true;
        }
        self.types
            .get(actual)
            .map(|d| d.supertypes.iter().any(|s| s == expected))
            .unwrap_or(false)
    }

    /// Iterate over all resolved descriptors.
    pub fn types(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.types.values()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builder collecting declared descriptors for resolution.
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    declared: Vec<EntityDescriptor>,
}

impl SchemaRegistryBuilder {
    /// Register a declared descriptor.
    pub fn register(mut self, descriptor: EntityDescriptor) -> Self {
        self.declared.push(descriptor);
        self
    }

    /// Resolve supertype chains and validate the whole configuration.
    ///
    /// # Errors
    ///
    /// Everything that can be caught at startup is caught here: duplicate
    /// or unknown types, supertype cycles, ambiguous identifiers,
    /// colliding storage keys and slot names, unresolvable relationship
    /// targets and duplicate label sets.
    pub fn build(self) -> Result<SchemaRegistry, MappingError> {
        let mut declared: BTreeMap<String, EntityDescriptor> = BTreeMap::new();
        for descriptor in self.declared {
            if declared.contains_key(&descriptor.type_name) {
                return Err(MappingError::DuplicateType(descriptor.type_name));
            }
            declared.insert(descriptor.type_name.clone(), descriptor);
        }

        let mut resolved: BTreeMap<String, EntityDescriptor> = BTreeMap::new();
        for name in declared.keys() {
            let descriptor = resolve_chain(name, &declared)?;
            resolved.insert(name.clone(), descriptor);
        }

        validate(&resolved)?;

        let mut by_label_set = BTreeMap::new();
        for descriptor in resolved.values() {
            if descriptor.kind != DescriptorKind::Node {
                continue;
            }
            let mut key: Vec<String> = descriptor.labels.clone();
            key.sort();
            key.dedup();
            if let Some(existing) = by_label_set.insert(key, descriptor.type_name.clone()) {
                return Err(MappingError::DuplicateLabelSet {
                    first: existing,
                    second: descriptor.type_name.clone(),
                });
            }
        }

        Ok(SchemaRegistry {
            types: resolved,
            by_label_set,
        })
    }
}

/// Resolve one type's supertype chain, accumulating labels, properties
/// and relationship slots from the root of the chain down.
fn resolve_chain(
    name: &str,
    declared: &BTreeMap<String, EntityDescriptor>,
) -> Result<EntityDescriptor, MappingError> {
    // Walk up the chain, collecting ancestors closest-first.
    let mut chain: Vec<&EntityDescriptor> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut current = declared
        .get(name)
        .ok_or_else(|| MappingError::UnknownType(name.to_string()))?;
    loop {
        if !seen.insert(&current.type_name) {
            return Err(MappingError::SupertypeCycle(current.type_name.clone()));
        }
        chain.push(current);
        match &current.extends {
            Some(supertype) => {
                current = declared.get(supertype).ok_or_else(|| {
                    MappingError::UnknownSupertype {
                        type_name: current.type_name.clone(),
                        supertype: supertype.clone(),
                    }
                })?;
            }
            None => break,
        }
    }

    let own = chain[0];
    let mut descriptor = own.clone();
    descriptor.supertypes = chain[1..].iter().map(|d| d.type_name.clone()).collect();

    // Labels: own first (most specific), ancestors after.
    for ancestor in &chain[1..] {
        for label in &ancestor.labels {
            if !descriptor.labels.contains(label) {
                descriptor.labels.push(label.clone());
            }
        }
    }

    // Identifier: at most one explicit declaration per chain.
    let explicit: Vec<&IdDescriptor> = chain
        .iter()
        .filter(|d| {
            d.identifier.strategy != IdStrategy::Generated
                || d.identifier.property != crate::schema::descriptor::DEFAULT_ID_PROPERTY
        })
        .map(|d| &d.identifier)
        .collect();
    let mut distinct: Vec<&IdDescriptor> = Vec::new();
    for id in explicit {
        if !distinct.iter().any(|d| **d == *id) {
            distinct.push(id);
        }
    }
    match distinct.len() {
        0 => descriptor.identifier = IdDescriptor::default(),
        1 => descriptor.identifier = distinct[0].clone(),
        _ => {
            return Err(MappingError::AmbiguousIdentifier {
                type_name: own.type_name.clone(),
                candidates: distinct.iter().map(|d| d.property.clone()).collect(),
            })
        }
    }

    // Properties and relationships: ancestors first, own last.
    let mut properties = Vec::new();
    let mut relationships = Vec::new();
    for d in chain.iter().rev() {
        properties.extend(d.properties.iter().cloned());
        relationships.extend(d.relationships.iter().cloned());
    }
    descriptor.properties = properties;
    descriptor.relationships = relationships;

    Ok(descriptor)
}

/// Post-resolution validation over the whole registry.
fn validate(resolved: &BTreeMap<String, EntityDescriptor>) -> Result<(), MappingError> {
    for descriptor in resolved.values() {
        // Storage keys must be unique, including the identifier property.
        let mut keys: BTreeSet<&str> = BTreeSet::new();
        keys.insert(&descriptor.identifier.property);
        for property in &descriptor.properties {
            if !keys.insert(&property.key) {
                return Err(MappingError::DuplicateStorageKey {
                    type_name: descriptor.type_name.clone(),
                    key: property.key.clone(),
                });
            }
        }

        // Relationship slot names must be unique.
        let mut slots: BTreeSet<&str> = BTreeSet::new();
        for relationship in &descriptor.relationships {
            if !slots.insert(&relationship.name) {
                return Err(MappingError::DuplicateRelationship {
                    type_name: descriptor.type_name.clone(),
                    name: relationship.name.clone(),
                });
            }

            // Targets must be registered node types.
            let target = relationship.target.base_type();
            match resolved.get(target) {
                Some(t) if t.kind == DescriptorKind::Node => {}
                _ => {
                    return Err(MappingError::UnresolvedTarget {
                        type_name: descriptor.type_name.clone(),
                        relationship: relationship.name.clone(),
                        target: target.to_string(),
                    })
                }
            }

            // Edge-entity types must be registered relationship entities.
            if let Some(entity_type) = &relationship.entity_type {
                match resolved.get(entity_type) {
                    Some(t) if t.kind == DescriptorKind::RelationshipEntity => {}
                    _ => {
                        return Err(MappingError::NotARelationshipEntity(entity_type.clone()))
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::descriptor::{PropertyDescriptor, RelationshipDescriptor};

    fn person() -> EntityDescriptor {
        EntityDescriptor::node("Person").scalar("name").declare()
    }

    fn employee() -> EntityDescriptor {
        EntityDescriptor::node("Employee")
            .extends("Person")
            .scalar("salary")
            .declare()
    }

    #[test]
    fn test_inheritance_accumulates_labels_and_properties() {
        let registry = SchemaRegistry::builder()
            .register(person())
            .register(employee())
            .build()
            .unwrap();

        let e = registry.describe("Employee").unwrap();
        assert_eq!(e.labels, vec!["Employee".to_string(), "Person".to_string()]);
        assert_eq!(e.supertypes, vec!["Person".to_string()]);
        assert!(e.property("name").is_some());
        assert!(e.property("salary").is_some());

        let p = registry.describe("Person").unwrap();
        // Supertype label set is a subset of the subtype's.
        assert!(p.label_set().is_subset(&e.label_set()));
    }

    #[test]
    fn test_unknown_supertype_rejected() {
        let err = SchemaRegistry::builder()
            .register(employee())
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::UnknownSupertype { .. }));
    }

    #[test]
    fn test_supertype_cycle_rejected() {
        let a = EntityDescriptor::node("A").extends("B").declare();
        let b = EntityDescriptor::node("B").extends("A").declare();
        let err = SchemaRegistry::builder()
            .register(a)
            .register(b)
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::SupertypeCycle(_)));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let err = SchemaRegistry::builder()
            .register(person())
            .register(person())
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::DuplicateType(_)));
    }

    #[test]
    fn test_ambiguous_identifier_rejected() {
        let base = EntityDescriptor::node("Base").id("code").declare();
        let sub = EntityDescriptor::node("Sub")
            .extends("Base")
            .id("serial")
            .declare();
        let err = SchemaRegistry::builder()
            .register(base)
            .register(sub)
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::AmbiguousIdentifier { .. }));
    }

    #[test]
    fn test_inherited_identifier() {
        let base = EntityDescriptor::node("Base").id("code").declare();
        let sub = EntityDescriptor::node("Sub").extends("Base").declare();
        let registry = SchemaRegistry::builder()
            .register(base)
            .register(sub)
            .build()
            .unwrap();
        let sub = registry.describe("Sub").unwrap();
        assert_eq!(sub.identifier.property, "code");
        assert_eq!(sub.identifier.strategy, IdStrategy::Assigned);
    }

    #[test]
    fn test_duplicate_storage_key_rejected() {
        let bad = EntityDescriptor::node("Bad")
            .property(PropertyDescriptor::scalar("a").with_key("k"))
            .property(PropertyDescriptor::scalar("b").with_key("k"))
            .declare();
        let err = SchemaRegistry::builder().register(bad).build().unwrap_err();
        assert!(matches!(err, MappingError::DuplicateStorageKey { .. }));
    }

    #[test]
    fn test_unresolved_target_rejected() {
        let bad = EntityDescriptor::node("Post")
            .relationship(RelationshipDescriptor::to_one("author", "AUTHOR", "User"))
            .declare();
        let err = SchemaRegistry::builder().register(bad).build().unwrap_err();
        assert!(matches!(err, MappingError::UnresolvedTarget { .. }));
    }

    #[test]
    fn test_rel_entity_target_must_be_relationship_entity() {
        let friendship = EntityDescriptor::relationship_entity("Friendship")
            .scalar("since")
            .declare();
        let ok = SchemaRegistry::builder()
            .register(person())
            .register(friendship.clone())
            .register(
                EntityDescriptor::node("Owner")
                    .relationship(
                        RelationshipDescriptor::to_many("friends", "FRIEND_OF", "Person")
                            .with_entity("Friendship"),
                    )
                    .declare(),
            )
            .build();
        assert!(ok.is_ok());

        let err = SchemaRegistry::builder()
            .register(person())
            .register(
                EntityDescriptor::node("Owner")
                    .relationship(
                        RelationshipDescriptor::to_many("friends", "FRIEND_OF", "Person")
                            .with_entity("Person"),
                    )
                    .declare(),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::NotARelationshipEntity(_)));
    }

    #[test]
    fn test_duplicate_label_set_rejected() {
        let a = EntityDescriptor::node("A").label("Thing").declare();
        let b = EntityDescriptor::node("B").label("Thing").declare();
        // Different primary labels, different sets: fine.
        assert!(SchemaRegistry::builder()
            .register(a)
            .register(b)
            .build()
            .is_ok());

        let c = EntityDescriptor::node("C").label("D").declare();
        let d = EntityDescriptor::node("D").label("C").declare();
        let err = SchemaRegistry::builder()
            .register(c)
            .register(d)
            .build()
            .unwrap_err();
        assert!(matches!(err, MappingError::DuplicateLabelSet { .. }));
    }

    #[test]
    fn test_resolve_labels_most_specific() {
        let registry = SchemaRegistry::builder()
            .register(person())
            .register(employee())
            .build()
            .unwrap();

        let labels = vec!["Person".to_string(), "Employee".to_string()];
        assert_eq!(
            registry.resolve_labels(&labels).unwrap().type_name,
            "Employee"
        );

        let labels = vec!["Person".to_string()];
        assert_eq!(
            registry.resolve_labels(&labels).unwrap().type_name,
            "Person"
        );

        // Extra dynamic labels do not disturb resolution.
        let labels = vec![
            "Employee".to_string(),
            "Person".to_string(),
            "OnLeave".to_string(),
        ];
        assert_eq!(
            registry.resolve_labels(&labels).unwrap().type_name,
            "Employee"
        );
    }

    #[test]
    fn test_resolve_labels_unresolved() {
        let registry = SchemaRegistry::builder().register(person()).build().unwrap();
        let err = registry
            .resolve_labels(&["Robot".to_string()])
            .unwrap_err();
        assert!(matches!(err, MappingError::UnresolvedLabels { .. }));
    }

    #[test]
    fn test_resolve_labels_ambiguous() {
        let registry = SchemaRegistry::builder()
            .register(EntityDescriptor::node("Cat").declare())
            .register(EntityDescriptor::node("Dog").declare())
            .build()
            .unwrap();
        let err = registry
            .resolve_labels(&["Cat".to_string(), "Dog".to_string()])
            .unwrap_err();
        assert!(matches!(err, MappingError::AmbiguousLabels { .. }));
    }

    #[test]
    fn test_is_assignable() {
        let registry = SchemaRegistry::builder()
            .register(person())
            .register(employee())
            .build()
            .unwrap();
        assert!(registry.is_assignable("Employee", "Person"));
        assert!(registry.is_assignable("Person", "Person"));
        assert!(!registry.is_assignable("Person", "Employee"));
        assert!(!registry.is_assignable("Ghost", "Person"));
    }
}
