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

//! Graph-to-object reconstitution.
//!
//! Rows stream in one at a time; node payloads materialize immediately
//! (the identity map is consulted before any allocation, so cycles and
//! diamonds converge onto shared instances), while relationship payloads
//! are buffered and wired after the stream ends, once every endpoint that
//! is going to exist does. Edges whose endpoints never materialized lie
//! beyond the requested depth and are discarded. Entities at the depth
//! boundary keep their relationship slots explicitly not-loaded.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use grom_core::schema::{Cardinality, DescriptorKind, RelTypeSpec};
use grom_core::{EntityId, NodePayload, RelPayload, Result, ResultRow, RowValue};

use crate::codec::decode_properties;
use crate::entity::{Entity, EntityHandle, RelTarget};
use crate::executor::StoreError;
use crate::session::snapshot::capture_snapshot;
use crate::session::Session;

impl Session {
    /// Reconstitute managed instances from result rows.
    ///
    /// `root_column` names the column whose nodes are the traversal roots
    /// (and the returned handles); with `None`, every materialized node
    /// counts as a root. `depth` is the load's traversal bound: instances
    /// farther out keep their slots not-loaded.
    ///
    /// Consumption is incremental; dropping the iterator early (a
    /// cancelled load) leaves already-materialized instances valid in the
    /// identity map, just unwired.
    pub fn hydrate<I>(
        &mut self,
        rows: I,
        root_column: Option<&str>,
        depth: usize,
    ) -> Result<Vec<EntityHandle>>
    where
        I: IntoIterator<Item = std::result::Result<ResultRow, StoreError>>,
    {
        let mut roots: Vec<EntityHandle> = Vec::new();
        let mut touched: Vec<EntityHandle> = Vec::new();
        let mut fresh: Vec<EntityHandle> = Vec::new();
        let mut edges: Vec<RelPayload> = Vec::new();
        let mut seen_edges: HashSet<EntityId> = HashSet::new();

        for row in rows {
            let row = row.map_err(|e| self.translator.translate(e))?;

            for payload in row.nodes() {
                let (handle, is_new) = self.materialize(payload)?;
                if !touched.contains(&handle) {
                    touched.push(handle);
                }
                if is_new {
                    fresh.push(handle);
                }
            }

            if let Some(column) = root_column {
                if let Some(value) = row.get(column) {
                    for id in root_node_ids(value) {
                        if let Some(&handle) = self.store_ids.get(&id) {
                            if !roots.contains(&handle) {
                                roots.push(handle);
                            }
                        }
                    }
                }
            }

            for payload in row.relationships() {
                if seen_edges.insert(payload.id.clone()) {
                    edges.push(payload.clone());
                }
            }
        }

        if root_column.is_none() {
            roots = touched.clone();
        }

        let dist = self.distances(&roots, &edges);

        let mut dangling = 0usize;
        for edge in &edges {
            match (
                self.store_ids.get(&edge.start).copied(),
                self.store_ids.get(&edge.end).copied(),
            ) {
                (Some(start), Some(end)) => self.wire(edge, start, end, &dist, depth)?,
                // An endpoint beyond the depth bound never materialized.
                _ => dangling += 1,
            }
        }
        if dangling > 0 {
            debug!(dangling, "discarded relationship payloads without endpoints");
        }

        // Nodes strictly inside the bound have all their slots loaded,
        // including slots with no targets: those are known-empty.
        for (&handle, &d) in &dist {
            if d >= depth {
                continue;
            }
            let slots: Vec<String> = self
                .descriptor_of(handle)?
                .relationships
                .iter()
                .map(|r| r.name.clone())
                .collect();
            let entity = &mut self.entities[handle.0];
            for slot in slots {
                entity.loaded_slots.insert(slot);
            }
        }

        for &handle in &touched {
            let slots = self.entities[handle.0].loaded_slots.clone();
            let descriptor = self.registry.describe(&self.entities[handle.0].type_name)?;
            let snapshot = capture_snapshot(
                &self.entities[handle.0],
                descriptor,
                &self.registry,
                &self.entities,
                &slots,
                self.snapshots[handle.0].as_ref(),
            )?;
            self.snapshots[handle.0] = Some(snapshot);
        }

        let mut hooks = self.take_hooks();
        for &handle in &fresh {
            for hook in &mut hooks {
                hook.after_load(&mut self.entities[handle.0]);
            }
        }
        self.put_hooks(hooks);

        Ok(roots)
    }

    // Materialize one node payload, consulting the identity map before
    // allocating. Returns the handle and whether it is a new instance.
    fn materialize(&mut self, payload: &NodePayload) -> Result<(EntityHandle, bool)> {
        if let Some(&handle) = self.store_ids.get(&payload.id) {
            self.refresh(handle, payload)?;
            return Ok((handle, false));
        }

        let descriptor = self.registry.resolve_labels(&payload.labels)?.clone();
        let persisted_id = payload
            .properties
            .get(&descriptor.identifier.property)
            .and_then(EntityId::from_value)
            .unwrap_or_else(|| payload.id.clone());

        if let Some(handle) = self.identity.get(DescriptorKind::Node, &persisted_id) {
            self.store_ids.insert(payload.id.clone(), handle);
            self.refresh(handle, payload)?;
            return Ok((handle, false));
        }

        let mut entity = Entity::new(descriptor.type_name.clone(), DescriptorKind::Node);
        entity.id = Some(persisted_id.clone());
        entity.properties = decode_properties(&descriptor, &payload.properties);
        if descriptor.dynamic_labels.is_some() {
            entity.dynamic_labels = payload
                .labels
                .iter()
                .filter(|l| !descriptor.labels.contains(l))
                .cloned()
                .collect();
        }

        let handle = EntityHandle(self.entities.len());
        self.entities.push(entity);
        self.snapshots.push(None);
        self.deleted.push(false);
        self.identity
            .insert(DescriptorKind::Node, persisted_id, handle);
        self.store_ids.insert(payload.id.clone(), handle);
        Ok((handle, true))
    }

    // Refresh an already-managed instance from a newer payload.
    fn refresh(&mut self, handle: EntityHandle, payload: &NodePayload) -> Result<()> {
        let descriptor = self.registry.describe(&self.entities[handle.0].type_name)?.clone();
        let properties = decode_properties(&descriptor, &payload.properties);
        let entity = &mut self.entities[handle.0];
        entity.properties = properties;
        if descriptor.dynamic_labels.is_some() {
            entity.dynamic_labels = payload
                .labels
                .iter()
                .filter(|l| !descriptor.labels.contains(l))
                .cloned()
                .collect();
        }
        Ok(())
    }

    // Undirected breadth-first distance from the roots over the edges of
    // this result set.
    fn distances(
        &self,
        roots: &[EntityHandle],
        edges: &[RelPayload],
    ) -> HashMap<EntityHandle, usize> {
        let mut adjacency: HashMap<EntityHandle, Vec<EntityHandle>> = HashMap::new();
        for edge in edges {
            if let (Some(&start), Some(&end)) = (
                self.store_ids.get(&edge.start),
                self.store_ids.get(&edge.end),
            ) {
                adjacency.entry(start).or_default().push(end);
                adjacency.entry(end).or_default().push(start);
            }
        }

        let mut dist: HashMap<EntityHandle, usize> = HashMap::new();
        let mut queue: VecDeque<EntityHandle> = VecDeque::new();
        for &root in roots {
            dist.entry(root).or_insert(0);
            queue.push_back(root);
        }
        while let Some(handle) = queue.pop_front() {
            let next = dist[&handle] + 1;
            if let Some(neighbors) = adjacency.get(&handle) {
                for &neighbor in neighbors {
                    if !dist.contains_key(&neighbor) {
                        dist.insert(neighbor, next);
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        dist
    }

    // Attach one relationship payload to the owning side(s). Both
    // directed halves of a mirrored pair stage the same logical wiring,
    // so the per-slot dedup collapses them into one link per side.
    fn wire(
        &mut self,
        edge: &RelPayload,
        start: EntityHandle,
        end: EntityHandle,
        dist: &HashMap<EntityHandle, usize>,
        depth: usize,
    ) -> Result<()> {
        for (owner, other, owner_is_start) in [(start, end, true), (end, start, false)] {
            if dist.get(&owner).map_or(true, |&d| d >= depth) {
                continue;
            }
            let descriptor = self
                .registry
                .describe(&self.entities[owner.0].type_name)?
                .clone();
            let other_type = self.entities[other.0].type_name.clone();

            for slot in &descriptor.relationships {
                let direction_ok = match slot.direction {
                    grom_core::schema::Direction::Outgoing => owner_is_start,
                    grom_core::schema::Direction::Incoming => !owner_is_start,
                    grom_core::schema::Direction::Undirected => true,
                };
                if !direction_ok {
                    continue;
                }
                let type_ok = match &slot.rel_type {
                    RelTypeSpec::Static(t) => *t == edge.rel_type,
                    RelTypeSpec::FromKey => true,
                };
                if !type_ok {
                    continue;
                }
                if !self
                    .registry
                    .is_assignable(&other_type, slot.target.base_type())
                {
                    continue;
                }

                let key = match &slot.rel_type {
                    RelTypeSpec::FromKey => Some(edge.rel_type.clone()),
                    RelTypeSpec::Static(_) => None,
                };
                let (properties, edge_id) = match &slot.entity_type {
                    Some(entity_type) => {
                        let edge_descriptor =
                            self.registry.relationship_entity(entity_type)?.clone();
                        let properties =
                            decode_properties(&edge_descriptor, &edge.properties);
                        let edge_id = edge
                            .properties
                            .get(&edge_descriptor.identifier.property)
                            .and_then(EntityId::from_value)
                            .unwrap_or_else(|| edge.id.clone());
                        (properties, Some(edge_id))
                    }
                    None => (BTreeMap::new(), None),
                };

                let entries = self.entities[owner.0].slot_mut(&slot.name);
                let duplicate = entries
                    .iter()
                    .any(|t| t.target == other && t.key == key);
                if duplicate {
                    break;
                }
                if slot.cardinality == Cardinality::One && !entries.is_empty() {
                    warn!(
                        slot = %slot.name,
                        owner = %descriptor.type_name,
                        "scalar slot already occupied; ignoring additional edge"
                    );
                    break;
                }
                entries.push(RelTarget {
                    target: other,
                    key,
                    edge_id,
                    properties,
                });
                break;
            }
        }
        Ok(())
    }
}

// Node identities inside one root-column value.
fn root_node_ids(value: &RowValue) -> Vec<EntityId> {
    let mut out = Vec::new();
    collect_root_ids(value, &mut out);
    out
}

fn collect_root_ids(value: &RowValue, out: &mut Vec<EntityId>) {
    match value {
        RowValue::Node(node) => out.push(node.id.clone()),
        // A path rooted at the column starts at its first node.
        RowValue::Path(path) => {
            if let Some(first) = path.nodes.first() {
                out.push(first.id.clone());
            }
        }
        RowValue::List(items) => {
            for item in items {
                collect_root_ids(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_node_ids_from_shapes() {
        let node = RowValue::Node(NodePayload::new(1i64, ["Person"]));
        assert_eq!(root_node_ids(&node), vec![EntityId::Int(1)]);

        let path = RowValue::Path(grom_core::PathPayload {
            nodes: vec![
                NodePayload::new(1i64, ["Person"]),
                NodePayload::new(2i64, ["Person"]),
            ],
            relationships: vec![],
        });
        assert_eq!(root_node_ids(&path), vec![EntityId::Int(1)]);

        let list = RowValue::List(vec![
            RowValue::Node(NodePayload::new(3i64, ["Person"])),
            RowValue::Scalar(grom_core::Value::Int(9)),
        ]);
        assert_eq!(root_node_ids(&list), vec![EntityId::Int(3)]);
    }
}
