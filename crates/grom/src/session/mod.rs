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

//! The session: identity map, snapshots and the unit-of-work lifecycle.
//!
//! A session owns an arena of managed instances, the identity map over
//! their persisted identifiers and the snapshots that serve as diff
//! baselines. Sessions are single-threaded by design: no internal
//! locking, one session per concurrent logical unit of work. Nothing
//! outlives the session except the shared [`SchemaRegistry`].

mod diff;
mod identity;
mod load;
mod provider;
mod save;
pub(crate) mod snapshot;

pub use provider::SingleSessionProvider;

use std::collections::BTreeSet;
use std::sync::Arc;

use grom_core::schema::{Cardinality, DescriptorKind, SchemaRegistry};
use grom_core::{EntityId, GromError, MappingError, Result};

use crate::config::SessionConfig;
use crate::entity::{Entity, EntityHandle, RelTarget};
use crate::executor::{
    DefaultTranslator, EntityHooks, ErrorTranslator, IdGenerator, SequenceIds,
};
use identity::IdentityMap;
use snapshot::Snapshot;

/// Lifecycle state of a managed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Never saved; no persisted identifier, no snapshot.
    New,
    /// In sync with the last snapshot.
    Persisted,
    /// Differs from the last snapshot.
    Dirty,
    /// Deleted from the store; terminal.
    Deleted,
}

/// A single-threaded unit-of-work over the graph store.
pub struct Session {
    pub(crate) registry: Arc<SchemaRegistry>,
    pub(crate) config: SessionConfig,
    pub(crate) entities: Vec<Entity>,
    pub(crate) snapshots: Vec<Option<Snapshot>>,
    pub(crate) deleted: Vec<bool>,
    pub(crate) identity: IdentityMap,
    // Store-side node identities seen during hydration, for wiring
    // relationship payloads whose endpoints arrived in earlier rows.
    pub(crate) store_ids: std::collections::HashMap<EntityId, EntityHandle>,
    pub(crate) hooks: Vec<Box<dyn EntityHooks>>,
    pub(crate) ids: Box<dyn IdGenerator>,
    pub(crate) translator: Box<dyn ErrorTranslator>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("entities", &self.entities.len())
            .field("identity", &self.identity.len())
            .finish()
    }
}

impl Session {
    /// Create a session over a shared registry.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(registry: Arc<SchemaRegistry>, config: SessionConfig) -> Self {
        Self {
            registry,
            config,
            entities: Vec::new(),
            snapshots: Vec::new(),
            deleted: Vec::new(),
            identity: IdentityMap::default(),
            store_ids: std::collections::HashMap::new(),
            hooks: Vec::new(),
            ids: Box::new(SequenceIds::default()),
            translator: Box::new(DefaultTranslator),
        }
    }

    /// Replace the identifier generator.
    pub fn set_id_generator(&mut self, ids: Box<dyn IdGenerator>) {
        self.ids = ids;
    }

    /// Replace the error translator.
    pub fn set_error_translator(&mut self, translator: Box<dyn ErrorTranslator>) {
        self.translator = translator;
    }

    /// Install a lifecycle hook.
    pub fn register_hooks(&mut self, hooks: Box<dyn EntityHooks>) {
        self.hooks.push(hooks);
    }

    /// The shared registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Create a new (unsaved) instance of a registered node type.
    pub fn create(&mut self, type_name: &str) -> Result<EntityHandle> {
        let descriptor = self.registry.describe(type_name)?;
        if descriptor.kind != DescriptorKind::Node {
            return Err(GromError::InvalidUsage(format!(
                "'{}' is a relationship entity; it exists only on an edge",
                type_name
            )));
        }
        let kind = descriptor.kind;
        let type_name = descriptor.type_name.clone();
        let handle = EntityHandle(self.entities.len());
        self.entities.push(Entity::new(type_name, kind));
        self.snapshots.push(None);
        self.deleted.push(false);
        Ok(handle)
    }

    /// Borrow a managed instance.
    pub fn entity(&self, handle: EntityHandle) -> &Entity {
        &self.entities[handle.0]
    }

    /// Mutably borrow a managed instance.
    pub fn entity_mut(&mut self, handle: EntityHandle) -> &mut Entity {
        &mut self.entities[handle.0]
    }

    /// Assign the persisted identifier of an externally-identified
    /// instance before its first save.
    pub fn set_id(&mut self, handle: EntityHandle, id: impl Into<EntityId>) -> Result<()> {
        if self.snapshots[handle.0].is_some() {
            return Err(GromError::InvalidUsage(
                "cannot change the identifier of a persisted instance".to_string(),
            ));
        }
        self.entities[handle.0].id = Some(id.into());
        Ok(())
    }

    /// Look up the live instance for a persisted identifier, if any.
    pub fn find(&self, id: &EntityId) -> Option<EntityHandle> {
        self.identity.get(DescriptorKind::Node, id)
    }

    /// Relate `owner` to `target` through `slot`.
    pub fn relate(
        &mut self,
        owner: EntityHandle,
        slot: &str,
        target: EntityHandle,
    ) -> Result<()> {
        self.relate_with(owner, slot, RelTarget::plain(target))
    }

    /// Relate with a key and/or edge properties.
    pub fn relate_with(
        &mut self,
        owner: EntityHandle,
        slot: &str,
        target: RelTarget,
    ) -> Result<()> {
        let owner_type = self.entities[owner.0].type_name.clone();
        let descriptor = self.registry.describe(&owner_type)?;
        let slot_descriptor =
            descriptor
                .relationship(slot)
                .ok_or_else(|| MappingError::UnknownSlot {
                    type_name: owner_type.clone(),
                    slot: slot.to_string(),
                })?;

        let target_type = self.entities[target.target.0].type_name.clone();
        let expected = slot_descriptor.target.base_type();
        let assignable = if slot_descriptor.target.is_polymorphic() {
            self.registry.is_assignable(&target_type, expected)
        } else {
            target_type == expected
        };
        if !assignable {
            return Err(GromError::Mapping(MappingError::UnresolvedTarget {
                type_name: owner_type,
                relationship: slot.to_string(),
                target: target_type,
            }));
        }

        if slot_descriptor.cardinality == Cardinality::KeyedMap && target.key.is_none() {
            return Err(GromError::InvalidUsage(format!(
                "slot '{}' is keyed; use a keyed target",
                slot
            )));
        }

        let one = slot_descriptor.cardinality == Cardinality::One;
        let entries = self.entities[owner.0].slot_mut(slot);
        match entries
            .iter_mut()
            .find(|t| t.target == target.target && t.key == target.key)
        {
            // Re-relating an existing target updates the edge payload and
            // keeps its identity.
            Some(existing) => {
                existing.properties = target.properties;
                if target.edge_id.is_some() {
                    existing.edge_id = target.edge_id;
                }
            }
            None => {
                if one {
                    entries.clear();
                }
                entries.push(target);
            }
        }
        Ok(())
    }

    /// Remove `target` from `owner`'s `slot`. Returns whether an entry
    /// was removed.
    pub fn unrelate(
        &mut self,
        owner: EntityHandle,
        slot: &str,
        target: EntityHandle,
    ) -> Result<bool> {
        let owner_type = self.entities[owner.0].type_name.clone();
        let descriptor = self.registry.describe(&owner_type)?;
        if descriptor.relationship(slot).is_none() {
            return Err(GromError::Mapping(MappingError::UnknownSlot {
                type_name: owner_type,
                slot: slot.to_string(),
            }));
        }
        let entries = self.entities[owner.0].slot_mut(slot);
        let before = entries.len();
        entries.retain(|t| t.target != target);
        Ok(entries.len() != before)
    }

    /// Lifecycle state of an instance.
    pub fn state(&self, handle: EntityHandle) -> EntityState {
        if self.deleted[handle.0] {
            return EntityState::Deleted;
        }
        let entity = &self.entities[handle.0];
        let Some(snapshot) = &self.snapshots[handle.0] else {
            return EntityState::New;
        };
        if entity.id.is_none() {
            return EntityState::New;
        }
        if self.matches_snapshot(entity, snapshot) {
            EntityState::Persisted
        } else {
            EntityState::Dirty
        }
    }

    // Cheap structural comparison against the snapshot; any encoding
    // failure reads as dirty and surfaces properly at save time.
    fn matches_snapshot(&self, entity: &Entity, snapshot: &Snapshot) -> bool {
        let Ok(descriptor) = self.registry.describe(&entity.type_name) else {
            return false;
        };
        let Ok(encoded) = crate::codec::encode_properties(descriptor, &entity.properties) else {
            return false;
        };
        if encoded != snapshot.properties || entity.dynamic_labels != snapshot.labels {
            return false;
        }
        for slot_descriptor in &descriptor.relationships {
            let slot = &slot_descriptor.name;
            if !entity.is_slot_loaded(slot) {
                continue;
            }
            let empty = Vec::new();
            let entries = snapshot.relationships.get(slot).unwrap_or(&empty);
            let current: BTreeSet<(Option<EntityId>, Option<String>)> = entity
                .targets(slot)
                .iter()
                .map(|t| (self.entities[t.target.0].id.clone(), t.key.clone()))
                .collect();
            let persisted: BTreeSet<(Option<EntityId>, Option<String>)> = entries
                .iter()
                .map(|e| (Some(e.target_id.clone()), e.key.clone()))
                .collect();
            if current != persisted {
                return false;
            }
        }
        true
    }

    /// Number of managed instances.
    pub fn managed_count(&self) -> usize {
        self.entities.len()
    }

    /// End the unit of work: drop all instances, snapshots and the
    /// identity map. Everything previously returned is detached; further
    /// mutations of detached state are invisible to persistence.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.snapshots.clear();
        self.deleted.clear();
        self.identity.clear();
        self.store_ids.clear();
    }

    pub(crate) fn take_hooks(&mut self) -> Vec<Box<dyn EntityHooks>> {
        std::mem::take(&mut self.hooks)
    }

    pub(crate) fn put_hooks(&mut self, hooks: Vec<Box<dyn EntityHooks>>) {
        self.hooks = hooks;
    }

    pub(crate) fn descriptor_of(&self, handle: EntityHandle) -> Result<&grom_core::schema::EntityDescriptor> {
        Ok(self.registry.describe(&self.entities[handle.0].type_name)?)
    }
}
