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

//! Cypher statement model, escaping and schema constraints.

pub mod escape;
pub mod statements;

pub use statements::{literal, Statement, StatementKind};

use grom_core::schema::{DescriptorKind, SchemaRegistry};

/// Generate uniqueness constraints for every mapped node type's
/// identifier property.
///
/// Executed once at deployment time; idempotent via `IF NOT EXISTS`.
pub fn constraint_statements(registry: &SchemaRegistry) -> Vec<Statement> {
    let mut statements = Vec::new();
    for descriptor in registry.types() {
        if descriptor.kind != DescriptorKind::Node {
            continue;
        }
        let label = descriptor.primary_label();
        let key = &descriptor.identifier.property;
        let name = format!(
            "{}_{}",
            label.to_lowercase(),
            key.trim_start_matches('_').to_lowercase()
        );
        let query = format!(
            "CREATE CONSTRAINT {} IF NOT EXISTS FOR (n{}) REQUIRE n.{} IS UNIQUE",
            escape::escape_identifier(&name),
            escape::escape_label(label),
            escape::escape_identifier(key),
        );
        statements.push(Statement::new(query, StatementKind::Constraint));
    }
    statements
}
