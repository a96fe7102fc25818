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

//! Per-type entity descriptors.
//!
//! A descriptor is the explicit schema of one mapped type: its labels,
//! identifier strategy, property storage keys and relationship slots.
//! Descriptors are declared with builders and resolved once at startup by
//! [`SchemaRegistry::build`](crate::schema::SchemaRegistryBuilder::build);
//! after resolution they never change for the lifetime of the process.

use std::collections::BTreeSet;

/// Direction of a relationship as seen from its owning entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// The owning entity is the start node.
    Outgoing,
    /// The owning entity is the end node.
    Incoming,
    /// Visible from both ends; reified as two directed edges sharing one
    /// property payload, created and removed together.
    Undirected,
}

impl Direction {
    /// Whether this direction mirrors into two underlying edges.
    pub fn is_undirected(self) -> bool {
        matches!(self, Direction::Undirected)
    }
}

/// Cardinality of a relationship slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cardinality {
    /// At most one target.
    One,
    /// Any number of targets.
    Many,
    /// Targets keyed by string; with [`RelTypeSpec::FromKey`] the key also
    /// names the graph relationship type.
    KeyedMap,
}

/// How the graph relationship type name is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelTypeSpec {
    /// A fixed relationship type name.
    Static(String),
    /// Derived per target from the slot's map key.
    FromKey,
}

/// The target side of a relationship descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetSpec {
    /// Targets are always this concrete type.
    Concrete(String),
    /// Targets are this type or any registered subtype; the actual type is
    /// resolved per instance at runtime.
    Polymorphic(String),
}

impl TargetSpec {
    /// The declared target type name.
    pub fn base_type(&self) -> &str {
        match self {
            TargetSpec::Concrete(t) | TargetSpec::Polymorphic(t) => t,
        }
    }

    /// Whether the actual target type may be a subtype.
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, TargetSpec::Polymorphic(_))
    }
}

/// Descriptor for one relationship slot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationshipDescriptor {
    /// Slot name on the owning entity.
    pub name: String,
    /// How the graph relationship type is derived.
    pub rel_type: RelTypeSpec,
    /// Direction from the owning entity.
    pub direction: Direction,
    /// Target type resolution.
    pub target: TargetSpec,
    /// Slot cardinality.
    pub cardinality: Cardinality,
    /// Registered relationship-entity type whose identifier and properties
    /// ride on the edge, if the relationship owns properties.
    pub entity_type: Option<String>,
}

impl RelationshipDescriptor {
    /// A scalar outgoing relationship with a static type.
    pub fn to_one(
        name: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            rel_type: RelTypeSpec::Static(rel_type.into()),
            direction: Direction::Outgoing,
            target: TargetSpec::Concrete(target.into()),
            cardinality: Cardinality::One,
            entity_type: None,
        }
    }

    /// A collection-valued outgoing relationship with a static type.
    pub fn to_many(
        name: impl Into<String>,
        rel_type: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            cardinality: Cardinality::Many,
            ..Self::to_one(name, rel_type, target)
        }
    }

    /// A keyed-map slot whose map key names the relationship type.
    pub fn keyed(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rel_type: RelTypeSpec::FromKey,
            direction: Direction::Outgoing,
            target: TargetSpec::Concrete(target.into()),
            cardinality: Cardinality::KeyedMap,
            entity_type: None,
        }
    }

    /// Set the direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Mark the relationship undirected (mirrored).
    pub fn undirected(mut self) -> Self {
        self.direction = Direction::Undirected;
        self
    }

    /// Mark the relationship incoming.
    pub fn incoming(mut self) -> Self {
        self.direction = Direction::Incoming;
        self
    }

    /// Allow subtypes of the declared target type.
    pub fn polymorphic(mut self) -> Self {
        self.target = TargetSpec::Polymorphic(self.target.base_type().to_string());
        self
    }

    /// Attach a relationship-entity type carrying edge properties.
    pub fn with_entity(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// Resolve the graph relationship type for a given map key.
    ///
    /// Returns `None` for a [`RelTypeSpec::FromKey`] slot with no key.
    pub fn type_for(&self, key: Option<&str>) -> Option<String> {
        match &self.rel_type {
            RelTypeSpec::Static(t) => Some(t.clone()),
            RelTypeSpec::FromKey => key.map(|k| k.to_string()),
        }
    }
}

/// How a property value is stored on the node or edge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyKind {
    /// One property value under one storage key.
    Scalar,
    /// A map value flattened into `<prefix><delimiter><entry-key>` storage
    /// keys, one graph property per entry.
    Composite {
        /// Storage key prefix.
        prefix: String,
        /// Delimiter between prefix and entry key.
        delimiter: char,
    },
}

/// Descriptor for one simple or composite property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyDescriptor {
    /// Property name on the entity.
    pub name: String,
    /// Storage key on the node/edge (equals `name` unless remapped).
    pub key: String,
    /// Storage layout.
    pub kind: PropertyKind,
}

impl PropertyDescriptor {
    /// A scalar property stored under its own name.
    pub fn scalar(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            kind: PropertyKind::Scalar,
        }
    }

    /// Remap the storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// A composite map property flattened under a key prefix.
    pub fn composite(name: impl Into<String>, prefix: impl Into<String>, delimiter: char) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            kind: PropertyKind::Composite {
                prefix: prefix.into(),
                delimiter,
            },
        }
    }
}

/// Identifier assignment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdStrategy {
    /// The application supplies the identifier before the first save.
    Assigned,
    /// A surrogate identifier is generated on first save.
    Generated,
}

/// Identifier descriptor: storage key plus assignment strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdDescriptor {
    /// Storage key of the identifier property.
    pub property: String,
    /// How identifiers come into being.
    pub strategy: IdStrategy,
}

impl Default for IdDescriptor {
    fn default() -> Self {
        Self {
            property: DEFAULT_ID_PROPERTY.to_string(),
            strategy: IdStrategy::Generated,
        }
    }
}

/// Default storage key for generated surrogate identifiers.
pub const DEFAULT_ID_PROPERTY: &str = "_grom_id";

/// Whether a descriptor maps a node or a relationship entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorKind {
    /// A node type with labels.
    Node,
    /// An edge type with its own identifier and properties.
    RelationshipEntity,
}

/// Resolved schema of one mapped type.
///
/// Label list ordering invariant: most specific first, supertype labels
/// after, so `labels[0]` is the primary label and a supertype's label set
/// is always a subset of a subtype's.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityDescriptor {
    /// Mapped type name.
    pub type_name: String,
    /// Node or relationship entity.
    pub kind: DescriptorKind,
    /// Declared supertype, if any.
    pub extends: Option<String>,
    /// Ordered label list (resolved; includes supertype labels).
    pub labels: Vec<String>,
    /// Full supertype chain, closest first (resolved).
    pub supertypes: Vec<String>,
    /// Identifier descriptor (resolved).
    pub identifier: IdDescriptor,
    /// Property descriptors (resolved; includes inherited).
    pub properties: Vec<PropertyDescriptor>,
    /// Relationship descriptors (resolved; includes inherited).
    pub relationships: Vec<RelationshipDescriptor>,
    /// Slot holding per-instance labels unknown at startup.
    pub dynamic_labels: Option<String>,
}

impl EntityDescriptor {
    /// Start declaring a node type.
    pub fn node(type_name: impl Into<String>) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder::new(type_name, DescriptorKind::Node)
    }

    /// Start declaring a relationship-entity type.
    pub fn relationship_entity(type_name: impl Into<String>) -> EntityDescriptorBuilder {
        EntityDescriptorBuilder::new(type_name, DescriptorKind::RelationshipEntity)
    }

    /// The primary (most specific) label.
    ///
    /// Relationship entities carry no labels; their type name stands in.
    pub fn primary_label(&self) -> &str {
        self.labels
            .first()
            .map(String::as_str)
            .unwrap_or(&self.type_name)
    }

    /// The label list as a set.
    pub fn label_set(&self) -> BTreeSet<&str> {
        self.labels.iter().map(String::as_str).collect()
    }

    /// Look up a property descriptor by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a relationship descriptor by slot name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relationships.iter().find(|r| r.name == name)
    }
}

/// Builder for a declared (unresolved) [`EntityDescriptor`].
#[derive(Debug, Clone)]
pub struct EntityDescriptorBuilder {
    type_name: String,
    kind: DescriptorKind,
    extends: Option<String>,
    extra_labels: Vec<String>,
    identifier: Option<IdDescriptor>,
    properties: Vec<PropertyDescriptor>,
    relationships: Vec<RelationshipDescriptor>,
    dynamic_labels: Option<String>,
}

impl EntityDescriptorBuilder {
    fn new(type_name: impl Into<String>, kind: DescriptorKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            extends: None,
            extra_labels: Vec::new(),
            identifier: None,
            properties: Vec::new(),
            relationships: Vec::new(),
            dynamic_labels: None,
        }
    }

    /// Declare a supertype; labels, properties and relationships are
    /// inherited when the registry resolves the chain.
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.extends = Some(supertype.into());
        self
    }

    /// Attach an additional static label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.extra_labels.push(label.into());
        self
    }

    /// Use an externally assigned identifier stored under `property`.
    pub fn id(mut self, property: impl Into<String>) -> Self {
        self.identifier = Some(IdDescriptor {
            property: property.into(),
            strategy: IdStrategy::Assigned,
        });
        self
    }

    /// Use a generated surrogate identifier stored under `property`.
    pub fn generated_id(mut self, property: impl Into<String>) -> Self {
        self.identifier = Some(IdDescriptor {
            property: property.into(),
            strategy: IdStrategy::Generated,
        });
        self
    }

    /// Add a property descriptor.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a scalar property stored under its own name.
    pub fn scalar(self, name: impl Into<String>) -> Self {
        self.property(PropertyDescriptor::scalar(name))
    }

    /// Add a relationship descriptor.
    pub fn relationship(mut self, relationship: RelationshipDescriptor) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Declare the slot that carries per-instance dynamic labels.
    pub fn dynamic_labels(mut self, slot: impl Into<String>) -> Self {
        self.dynamic_labels = Some(slot.into());
        self
    }

    /// Finish the declaration.
    ///
    /// The returned descriptor is unresolved: labels and inherited members
    /// are completed by the registry at
    /// [`build`](crate::schema::SchemaRegistryBuilder::build) time.
    pub fn declare(self) -> EntityDescriptor {
        let mut labels = Vec::new();
        if self.kind == DescriptorKind::Node {
            labels.push(self.type_name.clone());
            labels.extend(self.extra_labels);
        }
        EntityDescriptor {
            type_name: self.type_name,
            kind: self.kind,
            extends: self.extends,
            labels,
            supertypes: Vec::new(),
            identifier: self.identifier.unwrap_or_default(),
            properties: self.properties,
            relationships: self.relationships,
            dynamic_labels: self.dynamic_labels,
        }
    }
}
