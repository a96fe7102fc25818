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

//! Managed instance snapshots: the diff baseline.
//!
//! A snapshot is captured immediately after a successful load or save and
//! never mutated in place; each successful write replaces it atomically.
//! Slots outside the captured set carry over from the previous snapshot,
//! so depth-bounded writes do not forget what is persisted further out.

use std::collections::{BTreeMap, BTreeSet};

use grom_core::schema::{EntityDescriptor, SchemaRegistry};
use grom_core::{EntityId, MappingError, Value};

use crate::codec::encode_properties;
use crate::entity::Entity;

/// One logical related edge as last persisted.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelSnapshot {
    /// Persisted identifier of the target.
    pub target_id: EntityId,
    /// Concrete target type at capture time.
    pub target_type: String,
    /// Map key for keyed slots.
    pub key: Option<String>,
    /// Edge identifier, for relationship entities.
    pub edge_id: Option<EntityId>,
    /// Encoded edge properties, for relationship entities.
    pub properties: BTreeMap<String, Value>,
}

/// Captured persisted state of one managed instance.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Snapshot {
    /// Persisted identifier.
    pub id: EntityId,
    /// Encoded node properties (identifier key excluded).
    pub properties: BTreeMap<String, Value>,
    /// Dynamic labels at capture time.
    pub labels: BTreeSet<String>,
    /// Logical related edges per captured slot.
    pub relationships: BTreeMap<String, Vec<RelSnapshot>>,
}

/// Capture a fresh snapshot of `entity`.
///
/// Only `slots` are captured from live state; any other slot present in
/// `previous` carries over untouched. Target handles resolve through the
/// arena, so every captured target must already hold its persisted
/// identifier.
pub(crate) fn capture_snapshot(
    entity: &Entity,
    descriptor: &EntityDescriptor,
    registry: &SchemaRegistry,
    arena: &[Entity],
    slots: &BTreeSet<String>,
    previous: Option<&Snapshot>,
) -> Result<Snapshot, MappingError> {
    let id = entity
        .id
        .clone()
        .ok_or_else(|| MappingError::MissingIdentifier(entity.type_name.clone()))?;

    let properties = encode_properties(descriptor, &entity.properties)?;

    let mut relationships: BTreeMap<String, Vec<RelSnapshot>> = BTreeMap::new();
    for slot in slots {
        let Some(slot_descriptor) = descriptor.relationship(slot) else {
            continue;
        };
        let mut entries = Vec::new();
        for target in entity.targets(slot) {
            let target_entity = &arena[target.target.0];
            // A target that was never saved is not persisted state; it
            // stays out of the baseline until a save assigns its id.
            let Some(target_id) = target_entity.id.clone() else {
                continue;
            };
            let properties = match &slot_descriptor.entity_type {
                Some(entity_type) => {
                    let edge_descriptor = registry.relationship_entity(entity_type)?;
                    encode_properties(edge_descriptor, &target.properties)?
                }
                None => BTreeMap::new(),
            };
            entries.push(RelSnapshot {
                target_id,
                target_type: target_entity.type_name.clone(),
                key: target.key.clone(),
                edge_id: target.edge_id.clone(),
                properties,
            });
        }
        relationships.insert(slot.clone(), entries);
    }

    if let Some(previous) = previous {
        for (slot, entries) in &previous.relationships {
            relationships
                .entry(slot.clone())
                .or_insert_with(|| entries.clone());
        }
    }

    Ok(Snapshot {
        id,
        properties,
        labels: entity.dynamic_labels.clone(),
        relationships,
    })
}
