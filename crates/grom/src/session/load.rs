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

//! Load statements.
//!
//! A load builds a depth-bounded path query, streams its rows through
//! reconstitution and returns the root handles. Statement text depends
//! only on type and depth, so plans cache well; identifiers always bind
//! as parameters.

use tracing::debug;

use grom_core::schema::DescriptorKind;
use grom_core::{EntityId, GromError, Result};

use crate::config::LoadOptions;
use crate::cypher::escape::{escape_identifier, escape_label};
use crate::cypher::Statement;
use crate::entity::EntityHandle;
use crate::executor::StatementExecutor;
use crate::session::Session;

impl Session {
    /// Load one instance by persisted identifier.
    ///
    /// Returns `None` when no node matches. A matching node already
    /// managed by this session comes back as the existing instance.
    pub fn load_one(
        &mut self,
        executor: &mut dyn StatementExecutor,
        type_name: &str,
        id: impl Into<EntityId>,
        options: &LoadOptions,
    ) -> Result<Option<EntityHandle>> {
        options.validate()?;
        let (label, id_key) = self.node_lookup_keys(type_name)?;
        let id = id.into();

        let query = match options.depth {
            0 => format!(
                "MATCH (n{} {{{}: $id}}) RETURN n",
                escape_label(&label),
                escape_identifier(&id_key)
            ),
            depth => format!(
                "MATCH (n{} {{{}: $id}}) OPTIONAL MATCH p = (n)-[*1..{}]-(m) RETURN n, p",
                escape_label(&label),
                escape_identifier(&id_key),
                depth
            ),
        };
        let statement = Statement::read(query).with_param("id", id.to_value());
        debug!(type_name, %id, depth = options.depth, "loading by identifier");

        let rows = executor
            .query(&statement)
            .map_err(|e| self.translator.translate(e))?;
        let roots = self.hydrate(rows, Some("n"), options.depth)?;
        Ok(roots.into_iter().next())
    }

    /// Load every instance of a mapped type.
    pub fn load_all(
        &mut self,
        executor: &mut dyn StatementExecutor,
        type_name: &str,
        options: &LoadOptions,
    ) -> Result<Vec<EntityHandle>> {
        options.validate()?;
        let (label, _) = self.node_lookup_keys(type_name)?;

        let query = match options.depth {
            0 => format!("MATCH (n{}) RETURN n", escape_label(&label)),
            depth => format!(
                "MATCH (n{}) OPTIONAL MATCH p = (n)-[*1..{}]-(m) RETURN n, p",
                escape_label(&label),
                depth
            ),
        };
        let statement = Statement::read(query);
        debug!(type_name, depth = options.depth, "loading all");

        let rows = executor
            .query(&statement)
            .map_err(|e| self.translator.translate(e))?;
        self.hydrate(rows, Some("n"), options.depth)
    }

    fn node_lookup_keys(&self, type_name: &str) -> Result<(String, String)> {
        let descriptor = self.registry.describe(type_name)?;
        if descriptor.kind != DescriptorKind::Node {
            return Err(GromError::InvalidUsage(format!(
                "'{}' is a relationship entity; load its owning node instead",
                type_name
            )));
        }
        Ok((
            descriptor.primary_label().to_string(),
            descriptor.identifier.property.clone(),
        ))
    }
}
