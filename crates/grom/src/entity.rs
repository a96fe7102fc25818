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

//! Managed entity instances.
//!
//! An entity is a schema-validated record: a typed property map plus
//! relationship slots holding handles to other managed instances.
//! Instances live in a session-owned arena and are addressed by
//! [`EntityHandle`]; slots store handles, which is what lets cyclic
//! graphs exist without reference-counted ownership cycles.

use std::collections::{BTreeMap, BTreeSet};

use grom_core::schema::DescriptorKind;
use grom_core::{EntityId, Value};

/// Handle to a managed instance within one session.
///
/// Handles are only meaningful against the session that issued them.
/// Handle equality is instance identity: the identity map guarantees at
/// most one live instance (hence one handle) per persisted identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub(crate) usize);

/// One target in a relationship slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RelTarget {
    /// The related instance.
    pub target: EntityHandle,
    /// Map key for keyed-map slots; also the relationship type for
    /// dynamically typed slots.
    pub key: Option<String>,
    /// Identifier of the underlying edge, when the relationship is a
    /// relationship entity.
    pub edge_id: Option<EntityId>,
    /// Edge properties, when the relationship is a relationship entity.
    pub properties: BTreeMap<String, Value>,
}

impl RelTarget {
    /// A plain target with no key and no edge properties.
    pub fn plain(target: EntityHandle) -> Self {
        Self {
            target,
            key: None,
            edge_id: None,
            properties: BTreeMap::new(),
        }
    }

    /// A keyed target.
    pub fn keyed(target: EntityHandle, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::plain(target)
        }
    }

    /// Attach edge properties.
    pub fn with_properties(mut self, properties: BTreeMap<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Set one edge property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// A managed entity instance.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) type_name: String,
    pub(crate) kind: DescriptorKind,
    pub(crate) id: Option<EntityId>,
    pub(crate) properties: BTreeMap<String, Value>,
    pub(crate) relationships: BTreeMap<String, Vec<RelTarget>>,
    pub(crate) dynamic_labels: BTreeSet<String>,
    // Slots actually loaded/populated this session, as opposed to slots
    // left behind by a depth-bounded load. Empty-and-loaded means "known
    // to have no targets"; empty-and-not-loaded means "unknown".
    pub(crate) loaded_slots: BTreeSet<String>,
}

impl Entity {
    pub(crate) fn new(type_name: impl Into<String>, kind: DescriptorKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            id: None,
            properties: BTreeMap::new(),
            relationships: BTreeMap::new(),
            dynamic_labels: BTreeSet::new(),
            loaded_slots: BTreeSet::new(),
        }
    }

    /// The mapped type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The persisted identifier, if the instance has been saved or loaded.
    pub fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    /// Read a property value.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a property value.
    ///
    /// Validated against the descriptor when the entity is saved.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Remove a property value.
    pub fn unset_property(&mut self, name: &str) -> Option<Value> {
        self.properties.remove(name)
    }

    /// The full property map.
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Targets of a relationship slot, in insertion order.
    pub fn targets(&self, slot: &str) -> &[RelTarget] {
        self.relationships.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a relationship slot was actually loaded or populated.
    ///
    /// `false` for slots left behind by a depth-bounded load: an empty,
    /// not-loaded slot means "unknown", not "no targets".
    pub fn is_slot_loaded(&self, slot: &str) -> bool {
        self.loaded_slots.contains(slot)
    }

    /// Per-instance dynamic labels.
    pub fn dynamic_labels(&self) -> impl Iterator<Item = &str> {
        self.dynamic_labels.iter().map(String::as_str)
    }

    /// Attach a dynamic label.
    pub fn add_label(&mut self, label: impl Into<String>) {
        self.dynamic_labels.insert(label.into());
    }

    /// Detach a dynamic label.
    pub fn remove_label(&mut self, label: &str) -> bool {
        self.dynamic_labels.remove(label)
    }

    pub(crate) fn slot_mut(&mut self, slot: &str) -> &mut Vec<RelTarget> {
        self.loaded_slots.insert(slot.to_string());
        self.relationships.entry(slot.to_string()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_properties() {
        let mut e = Entity::new("Person", DescriptorKind::Node);
        assert!(e.id().is_none());
        e.set_property("name", "Alice");
        assert_eq!(e.property("name"), Some(&Value::String("Alice".to_string())));
        assert_eq!(e.unset_property("name"), Some(Value::String("Alice".to_string())));
        assert!(e.property("name").is_none());
    }

    #[test]
    fn test_slot_loaded_tracking() {
        let mut e = Entity::new("Person", DescriptorKind::Node);
        assert!(!e.is_slot_loaded("friends"));
        assert!(e.targets("friends").is_empty());

        e.slot_mut("friends");
        assert!(e.is_slot_loaded("friends"));
        assert!(e.targets("friends").is_empty());
    }

    #[test]
    fn test_dynamic_labels() {
        let mut e = Entity::new("Person", DescriptorKind::Node);
        e.add_label("OnLeave");
        assert_eq!(e.dynamic_labels().collect::<Vec<_>>(), vec!["OnLeave"]);
        assert!(e.remove_label("OnLeave"));
        assert!(!e.remove_label("OnLeave"));
    }

    #[test]
    fn test_rel_target_builders() {
        let t = RelTarget::keyed(EntityHandle(3), "CITES").with_property("page", 12i64);
        assert_eq!(t.key.as_deref(), Some("CITES"));
        assert_eq!(t.properties.get("page"), Some(&Value::Int(12)));
    }
}
