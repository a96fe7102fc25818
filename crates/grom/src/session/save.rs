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

//! Save orchestration.
//!
//! One save invocation walks the reachable graph to the requested depth,
//! computes per-instance diffs, verifies polymorphic removals against the
//! store, merges everything into a single write statement and executes it
//! as one unit. Snapshots are replaced only after the statement succeeds;
//! a failed save leaves every baseline untouched and the diff is simply
//! recomputed on retry.

use std::collections::{BTreeSet, HashMap, VecDeque};

use tracing::{debug, warn};

use grom_core::schema::{DescriptorKind, IdStrategy};
use grom_core::{EntityId, GromError, MappingError, Result, RowValue};

use crate::config::SaveOptions;
use crate::cypher::escape::{escape_identifier, escape_label};
use crate::cypher::{Statement, StatementKind};
use crate::entity::EntityHandle;
use crate::executor::StatementExecutor;
use crate::session::diff::{compute_diff, EntityDiff, RelRemoval};
use crate::session::snapshot::capture_snapshot;
use crate::session::Session;
use crate::write::WriteBatch;

impl Session {
    /// Save `root` and everything reachable within the depth bound.
    ///
    /// Relationship slots beyond the bound are neither diffed nor
    /// written; in-memory changes past the bound silently stay in memory
    /// until a deeper save.
    pub fn save(
        &mut self,
        executor: &mut dyn StatementExecutor,
        root: EntityHandle,
        options: &SaveOptions,
    ) -> Result<()> {
        options.validate()?;
        if self.deleted[root.0] {
            return Err(GromError::InvalidUsage(
                "cannot save a deleted instance".to_string(),
            ));
        }
        let bound = options.depth.or(self.config.default_save_depth);

        let order = self.collect_reachable(root, bound);
        debug!(
            reachable = order.len(),
            depth = ?bound,
            "computing save diff"
        );

        self.run_before_write(&order);
        self.assign_identifiers(&order, bound)?;

        let mut diffs: Vec<(EntityHandle, usize, EntityDiff)> = Vec::new();
        for &(handle, depth) in &order {
            let descriptor = self.descriptor_of(handle)?;
            let within = bound.map_or(true, |b| depth < b);
            let diff_slots: BTreeSet<String> = if within {
                descriptor
                    .relationships
                    .iter()
                    .map(|r| r.name.clone())
                    .collect()
            } else {
                BTreeSet::new()
            };
            let diff = compute_diff(
                &self.entities,
                &self.registry,
                descriptor,
                handle,
                self.snapshots[handle.0].as_ref(),
                &diff_slots,
            )?;
            diffs.push((handle, depth, diff));
        }

        for (_, _, diff) in &mut diffs {
            let mut kept = Vec::with_capacity(diff.removals.len());
            for removal in diff.removals.drain(..) {
                if self.verify_removal(executor, &removal)? {
                    kept.push(removal);
                } else {
                    warn!(
                        slot = %removal.slot,
                        rel_type = %removal.rel_type,
                        target = %removal.target_id,
                        expected = %removal.expected_type,
                        "skipping removal: target no longer matches expected type"
                    );
                }
            }
            diff.removals = kept;
        }

        if diffs.iter().all(|(_, _, d)| d.is_empty()) {
            debug!("nothing changed; skipping write");
            return Ok(());
        }

        let statement = self.build_statement(&diffs)?;
        debug!(parameters = statement.parameters.len(), "executing save");
        executor
            .execute(&statement)
            .map_err(|e| self.translator.translate(e))?;

        // Success: replace snapshots atomically and index identities.
        for &(handle, depth, _) in &diffs {
            let within = bound.map_or(true, |b| depth < b);
            let slots: BTreeSet<String> = if within {
                self.entities[handle.0].loaded_slots.clone()
            } else {
                BTreeSet::new()
            };
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
            if let Some(id) = self.entities[handle.0].id.clone() {
                self.identity
                    .insert(DescriptorKind::Node, id, handle);
            }
        }
        Ok(())
    }

    /// Delete a persisted instance from the store. Terminal.
    pub fn delete(
        &mut self,
        executor: &mut dyn StatementExecutor,
        handle: EntityHandle,
    ) -> Result<()> {
        if self.deleted[handle.0] {
            return Ok(());
        }
        if let Some(id) = self.entities[handle.0].id.clone() {
            let descriptor = self.descriptor_of(handle)?;
            let statement = Statement::new(
                format!(
                    "MATCH (n{} {{{}: $id}}) DETACH DELETE n",
                    escape_label(descriptor.primary_label()),
                    escape_identifier(&descriptor.identifier.property)
                ),
                StatementKind::Delete,
            )
            .with_param("id", id.to_value());
            executor
                .execute(&statement)
                .map_err(|e| self.translator.translate(e))?;
            self.identity.remove(DescriptorKind::Node, &id);
        }
        self.deleted[handle.0] = true;
        self.snapshots[handle.0] = None;
        Ok(())
    }

    // Breadth-first over loaded slots, bounded by depth; yields each
    // reachable instance once with its minimal depth.
    fn collect_reachable(
        &self,
        root: EntityHandle,
        bound: Option<usize>,
    ) -> Vec<(EntityHandle, usize)> {
        let mut order = Vec::new();
        let mut seen: BTreeSet<EntityHandle> = BTreeSet::new();
        let mut queue: VecDeque<(EntityHandle, usize)> = VecDeque::new();
        seen.insert(root);
        queue.push_back((root, 0));

        while let Some((handle, depth)) = queue.pop_front() {
            if self.deleted[handle.0] {
                continue;
            }
            order.push((handle, depth));
            if bound.map_or(false, |b| depth >= b) {
                continue;
            }
            let entity = &self.entities[handle.0];
            for (slot, targets) in &entity.relationships {
                if !entity.is_slot_loaded(slot) {
                    continue;
                }
                for target in targets {
                    if seen.insert(target.target) {
                        queue.push_back((target.target, depth + 1));
                    }
                }
            }
        }
        order
    }

    fn run_before_write(&mut self, order: &[(EntityHandle, usize)]) {
        let mut hooks = self.take_hooks();
        for &(handle, _) in order {
            for hook in &mut hooks {
                hook.before_write(&mut self.entities[handle.0]);
            }
        }
        self.put_hooks(hooks);
    }

    // Give every reachable new instance its identifier, and every new
    // relationship-entity edge inside the bound its edge identifier.
    fn assign_identifiers(
        &mut self,
        order: &[(EntityHandle, usize)],
        bound: Option<usize>,
    ) -> Result<()> {
        for &(handle, _) in order {
            if self.entities[handle.0].id.is_some() {
                continue;
            }
            let descriptor = self.descriptor_of(handle)?;
            match descriptor.identifier.strategy {
                IdStrategy::Generated => {
                    let type_name = descriptor.type_name.clone();
                    let id = self.ids.next_id(&type_name);
                    self.entities[handle.0].id = Some(id);
                }
                IdStrategy::Assigned => {
                    return Err(GromError::Mapping(MappingError::MissingIdentifier(
                        descriptor.type_name.clone(),
                    )))
                }
            }
        }

        for &(handle, depth) in order {
            if bound.map_or(false, |b| depth >= b) {
                continue;
            }
            let descriptor = self.descriptor_of(handle)?;
            let edge_slots: Vec<(String, String)> = descriptor
                .relationships
                .iter()
                .filter_map(|r| {
                    r.entity_type
                        .as_ref()
                        .map(|t| (r.name.clone(), t.clone()))
                })
                .collect();
            for (slot, entity_type) in edge_slots {
                if !self.entities[handle.0].is_slot_loaded(&slot) {
                    continue;
                }
                let strategy = self
                    .registry
                    .relationship_entity(&entity_type)?
                    .identifier
                    .strategy;
                let missing = self.entities[handle.0]
                    .targets(&slot)
                    .iter()
                    .filter(|t| t.edge_id.is_none())
                    .count();
                if missing == 0 {
                    continue;
                }
                if strategy == IdStrategy::Assigned {
                    return Err(GromError::Mapping(MappingError::MissingIdentifier(
                        entity_type,
                    )));
                }
                let mut generated: VecDeque<EntityId> = (0..missing)
                    .map(|_| self.ids.next_id(&entity_type))
                    .collect();
                for target in self.entities[handle.0].slot_mut(&slot) {
                    if target.edge_id.is_none() {
                        target.edge_id = generated.pop_front();
                    }
                }
            }
        }
        Ok(())
    }

    // The polymorphic removal guard: re-derive the target's actual type
    // from its labels in the store and keep the removal only when that
    // type is still assignable to the slot's declared target. A mismatch
    // aborts this single edge's removal, never the save.
    fn verify_removal(
        &self,
        executor: &mut dyn StatementExecutor,
        removal: &RelRemoval,
    ) -> Result<bool> {
        if !removal.polymorphic {
            return Ok(true);
        }
        let base = self.registry.describe(&removal.expected_type)?;
        let statement = Statement::probe(format!(
            "MATCH (n {{{}: $id}}) RETURN n",
            escape_identifier(&base.identifier.property)
        ))
        .with_param("id", removal.target_id.to_value());

        let mut rows = executor
            .query(&statement)
            .map_err(|e| self.translator.translate(e))?;
        let row = match rows.next() {
            Some(row) => row.map_err(|e| self.translator.translate(e))?,
            // Target gone entirely; the edge went with it.
            None => return Ok(false),
        };
        let labels = match row.get("n") {
            Some(RowValue::Node(node)) => node.labels.clone(),
            _ => return Ok(false),
        };
        match self.registry.resolve_labels(&labels) {
            Ok(actual) => Ok(self
                .registry
                .is_assignable(&actual.type_name, &removal.expected_type)),
            Err(err) => {
                warn!(%err, "could not resolve removal target type; keeping the edge");
                Ok(false)
            }
        }
    }

    // Merge every diff into one statement.
    fn build_statement(
        &self,
        diffs: &[(EntityHandle, usize, EntityDiff)],
    ) -> Result<Statement> {
        let mut batch = WriteBatch::new();
        let mut vars: HashMap<EntityHandle, String> = HashMap::new();
        let mut var_count = 0usize;

        // Participants: instances with changes, plus addition targets.
        let mut needed: Vec<EntityHandle> = Vec::new();
        for (handle, _, diff) in diffs {
            if !diff.is_empty() && !vars.contains_key(handle) {
                needed.push(*handle);
                vars.insert(*handle, format!("n{}", var_count));
                var_count += 1;
            }
            for addition in &diff.additions {
                if !vars.contains_key(&addition.target) {
                    needed.push(addition.target);
                    vars.insert(addition.target, format!("n{}", var_count));
                    var_count += 1;
                }
            }
        }

        let new_handles: BTreeSet<EntityHandle> = diffs
            .iter()
            .filter(|(_, _, d)| d.is_new)
            .map(|(h, _, _)| *h)
            .collect();

        // Matches first, then creates, so WITH carry-over stays minimal.
        for handle in &needed {
            if new_handles.contains(handle) {
                continue;
            }
            let entity = &self.entities[handle.0];
            let descriptor = self.registry.describe(&entity.type_name)?;
            let id = entity.id.clone().ok_or_else(|| {
                MappingError::MissingIdentifier(entity.type_name.clone())
            })?;
            batch.match_node(
                &vars[handle],
                descriptor.primary_label(),
                &descriptor.identifier.property,
                &id,
            );
        }

        for handle in &needed {
            if !new_handles.contains(handle) {
                continue;
            }
            let entity = &self.entities[handle.0];
            let descriptor = self.registry.describe(&entity.type_name)?;
            let id = entity.id.clone().ok_or_else(|| {
                MappingError::MissingIdentifier(entity.type_name.clone())
            })?;
            let (_, _, diff) = diffs
                .iter()
                .find(|(h, _, _)| h == handle)
                .ok_or_else(|| {
                    GromError::InvalidUsage("untracked new participant".to_string())
                })?;
            let mut payload = diff.set_properties.clone();
            payload.insert(descriptor.identifier.property.clone(), id.to_value());
            batch.create_node(&vars[handle], &descriptor.labels, payload);
        }

        for (handle, _, diff) in diffs {
            if diff.is_empty() {
                continue;
            }
            let var = &vars[handle];
            if !diff.is_new {
                batch.set_properties(var, diff.set_properties.clone());
            }
            batch.set_labels(var, &diff.add_labels);
            batch.remove_labels(var, &diff.remove_labels);
        }

        for (handle, _, diff) in diffs {
            if diff.additions.is_empty() && diff.edge_updates.is_empty() && diff.removals.is_empty()
            {
                continue;
            }
            let owner_var = vars[handle].clone();

            for addition in &diff.additions {
                let props = if addition.properties.is_empty() {
                    None
                } else {
                    Some(&addition.properties)
                };
                batch.relate(
                    &owner_var,
                    &vars[&addition.target],
                    &addition.rel_type,
                    addition.direction,
                    props,
                );
            }

            for update in &diff.edge_updates {
                let target_descriptor = self.registry.describe(&update.target_type)?;
                let target_var = format!("m{}", var_count);
                var_count += 1;
                batch.match_node(
                    &target_var,
                    target_descriptor.primary_label(),
                    &target_descriptor.identifier.property,
                    &update.target_id,
                );
                batch.set_edge_properties(
                    &owner_var,
                    &target_var,
                    &update.rel_type,
                    update.direction,
                    &update.edge_id_key,
                    &update.edge_id,
                    update.changes.clone(),
                );
            }

            for removal in &diff.removals {
                let base = self.registry.describe(&removal.expected_type)?;
                let target_var = format!("m{}", var_count);
                var_count += 1;
                batch.match_node(
                    &target_var,
                    base.primary_label(),
                    &base.identifier.property,
                    &removal.target_id,
                );
                batch.unrelate(&owner_var, &target_var, &removal.rel_type, removal.direction);
            }
        }

        Ok(batch.into_statement())
    }
}
