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

//! Change computation against the last snapshot.
//!
//! The diff of one managed instance is the minimal set of property
//! changes, label changes, relationship additions, removals and edge
//! updates needed to bring the store in line with memory. Slots that were
//! never loaded this session are not diffed: an empty, not-loaded slot
//! means "unknown", never "delete everything".

use std::collections::{BTreeMap, BTreeSet};

use grom_core::schema::{Direction, EntityDescriptor, SchemaRegistry};
use grom_core::{EntityId, MappingError, Value};

use crate::codec::encode_properties;
use crate::entity::{Entity, EntityHandle};
use crate::session::snapshot::{RelSnapshot, Snapshot};

/// A relationship to create.
#[derive(Debug, Clone)]
pub(crate) struct RelAddition {
    pub rel_type: String,
    pub direction: Direction,
    pub target: EntityHandle,
    pub properties: BTreeMap<String, Value>,
    pub edge_id_key: Option<String>,
}

/// A relationship to remove, pending the polymorphic guard.
#[derive(Debug, Clone)]
pub(crate) struct RelRemoval {
    pub slot: String,
    pub rel_type: String,
    pub direction: Direction,
    pub target_id: EntityId,
    pub expected_type: String,
    pub polymorphic: bool,
}

/// An edge whose endpoints are unchanged but whose properties changed.
#[derive(Debug, Clone)]
pub(crate) struct RelUpdate {
    pub rel_type: String,
    pub direction: Direction,
    pub target_id: EntityId,
    pub target_type: String,
    pub edge_id: EntityId,
    pub edge_id_key: String,
    pub changes: BTreeMap<String, Value>,
}

/// Minimal change set for one managed instance.
#[derive(Debug, Clone, Default)]
pub(crate) struct EntityDiff {
    /// Encoded property changes; removed keys appear as `Null` so one
    /// `SET n += $map` clause applies the whole property diff.
    pub set_properties: BTreeMap<String, Value>,
    pub add_labels: Vec<String>,
    pub remove_labels: Vec<String>,
    pub additions: Vec<RelAddition>,
    pub removals: Vec<RelRemoval>,
    pub edge_updates: Vec<RelUpdate>,
    pub is_new: bool,
}

impl EntityDiff {
    /// Whether this diff writes nothing.
    pub fn is_empty(&self) -> bool {
        !self.is_new
            && self.set_properties.is_empty()
            && self.add_labels.is_empty()
            && self.remove_labels.is_empty()
            && self.additions.is_empty()
            && self.removals.is_empty()
            && self.edge_updates.is_empty()
    }
}

/// Compute the diff for one instance.
///
/// `diff_slots` is the set of relationship slots inside the traversal
/// depth bound; everything else is left alone. Slots not loaded this
/// session are skipped even when listed.
pub(crate) fn compute_diff(
    arena: &[Entity],
    registry: &SchemaRegistry,
    descriptor: &EntityDescriptor,
    handle: EntityHandle,
    snapshot: Option<&Snapshot>,
    diff_slots: &BTreeSet<String>,
) -> Result<EntityDiff, MappingError> {
    let entity = &arena[handle.0];
    let mut diff = EntityDiff {
        is_new: snapshot.is_none(),
        ..EntityDiff::default()
    };

    let encoded = encode_properties(descriptor, &entity.properties)?;

    match snapshot {
        None => {
            // First save: full payload, all labels, every populated slot
            // becomes additions.
            diff.set_properties = encoded;
            diff.add_labels = entity.dynamic_labels.iter().cloned().collect();
        }
        Some(snapshot) => {
            for (key, value) in &encoded {
                if snapshot.properties.get(key) != Some(value) {
                    diff.set_properties.insert(key.clone(), value.clone());
                }
            }
            for key in snapshot.properties.keys() {
                if !encoded.contains_key(key) {
                    diff.set_properties.insert(key.clone(), Value::Null);
                }
            }

            diff.add_labels = entity
                .dynamic_labels
                .difference(&snapshot.labels)
                .cloned()
                .collect();
            diff.remove_labels = snapshot
                .labels
                .difference(&entity.dynamic_labels)
                .cloned()
                .collect();
        }
    }

    for slot_descriptor in &descriptor.relationships {
        let slot = &slot_descriptor.name;
        if !diff_slots.contains(slot) || !entity.is_slot_loaded(slot) {
            continue;
        }

        let empty = Vec::new();
        let snapshot_entries: &Vec<RelSnapshot> = snapshot
            .and_then(|s| s.relationships.get(slot))
            .unwrap_or(&empty);
        let snapshot_index: BTreeMap<(EntityId, Option<String>), &RelSnapshot> = snapshot_entries
            .iter()
            .map(|e| ((e.target_id.clone(), e.key.clone()), e))
            .collect();

        let mut current_keys: BTreeSet<(EntityId, Option<String>)> = BTreeSet::new();
        for target in entity.targets(slot) {
            let target_entity = &arena[target.target.0];
            let target_id = target_entity.id.clone().ok_or_else(|| {
                MappingError::MissingIdentifier(target_entity.type_name.clone())
            })?;
            let rel_type = slot_descriptor
                .type_for(target.key.as_deref())
                .ok_or_else(|| MappingError::PropertyCodec {
                    type_name: descriptor.type_name.clone(),
                    property: slot.clone(),
                    message: "keyed slot requires a key per target".to_string(),
                })?;
            current_keys.insert((target_id.clone(), target.key.clone()));

            let edge_descriptor = match &slot_descriptor.entity_type {
                Some(entity_type) => Some(registry.relationship_entity(entity_type)?),
                None => None,
            };
            let encoded_edge = match edge_descriptor {
                Some(d) => encode_properties(d, &target.properties)?,
                None => BTreeMap::new(),
            };

            match snapshot_index.get(&(target_id.clone(), target.key.clone())) {
                None => {
                    let mut properties = encoded_edge;
                    let mut edge_id_key = None;
                    if let (Some(d), Some(edge_id)) = (edge_descriptor, &target.edge_id) {
                        properties
                            .insert(d.identifier.property.clone(), edge_id.to_value());
                        edge_id_key = Some(d.identifier.property.clone());
                    }
                    diff.additions.push(RelAddition {
                        rel_type,
                        direction: slot_descriptor.direction,
                        target: target.target,
                        properties,
                        edge_id_key,
                    });
                }
                Some(existing) => {
                    if let Some(d) = edge_descriptor {
                        if encoded_edge != existing.properties {
                            let mut changes = encoded_edge.clone();
                            for key in existing.properties.keys() {
                                if !encoded_edge.contains_key(key) {
                                    changes.insert(key.clone(), Value::Null);
                                }
                            }
                            match target.edge_id.clone().or_else(|| existing.edge_id.clone()) {
                                Some(edge_id) => diff.edge_updates.push(RelUpdate {
                                    rel_type,
                                    direction: slot_descriptor.direction,
                                    target_id,
                                    target_type: existing.target_type.clone(),
                                    edge_id,
                                    edge_id_key: d.identifier.property.clone(),
                                    changes,
                                }),
                                // No edge identity to match on; re-merge
                                // the edge and set the full payload.
                                None => diff.additions.push(RelAddition {
                                    rel_type,
                                    direction: slot_descriptor.direction,
                                    target: target.target,
                                    properties: encoded_edge,
                                    edge_id_key: None,
                                }),
                            }
                        }
                    }
                }
            }
        }

        for entry in snapshot_entries {
            if !current_keys.contains(&(entry.target_id.clone(), entry.key.clone())) {
                let rel_type = slot_descriptor
                    .type_for(entry.key.as_deref())
                    .unwrap_or_else(|| entry.key.clone().unwrap_or_default());
                diff.removals.push(RelRemoval {
                    slot: slot.clone(),
                    rel_type,
                    direction: slot_descriptor.direction,
                    target_id: entry.target_id.clone(),
                    expected_type: slot_descriptor.target.base_type().to_string(),
                    polymorphic: slot_descriptor.target.is_polymorphic(),
                });
            }
        }
    }

    Ok(diff)
}
