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

//! Write-fragment accumulation.
//!
//! A [`WriteBatch`] collects the clauses of one save invocation — node
//! creates and matches, property sets, label changes, relationship merges
//! and deletes — and merges them into exactly one [`Statement`]. Partial
//! application is not an outcome: the merged statement either succeeds as
//! a unit or the save fails.
//!
//! All values bind as parameters; the only strings embedded in the query
//! text are sanitized labels, relationship types and property keys.

use std::collections::{BTreeMap, BTreeSet};

use grom_core::schema::Direction;
use grom_core::{EntityId, Value};

use crate::cypher::escape::{escape_identifier, escape_label, escape_rel_type};
use crate::cypher::{Statement, StatementKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseKind {
    Match,
    Write,
}

#[derive(Debug)]
struct Clause {
    kind: ClauseKind,
    text: String,
    // Node variable this clause binds, if any; carried over WITH.
    binds: Option<String>,
}

/// Accumulates the clauses and parameters of one merged write statement.
#[derive(Debug, Default)]
pub struct WriteBatch {
    clauses: Vec<Clause>,
    parameters: BTreeMap<String, Value>,
    bound: BTreeSet<String>,
    rel_vars: usize,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no clauses have been emitted.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// A fresh statement-local relationship variable.
    pub fn fresh_rel_var(&mut self) -> String {
        let var = format!("r{}", self.rel_vars);
        self.rel_vars += 1;
        var
    }

    fn push_match(&mut self, text: String) {
        self.clauses.push(Clause {
            kind: ClauseKind::Match,
            text,
            binds: None,
        });
    }

    fn push_write(&mut self, text: String) {
        self.clauses.push(Clause {
            kind: ClauseKind::Write,
            text,
            binds: None,
        });
    }

    fn push_binding(&mut self, kind: ClauseKind, text: String, var: &str) {
        self.clauses.push(Clause {
            kind,
            text,
            binds: Some(var.to_string()),
        });
        self.bound.insert(var.to_string());
    }

    fn bind(&mut self, name: impl Into<String>, value: Value) -> String {
        let name = name.into();
        self.parameters.insert(name.clone(), value);
        name
    }

    /// Emit a node creation clause.
    ///
    /// The full (encoded) property payload, identifier included, binds as
    /// one map parameter.
    pub fn create_node(
        &mut self,
        var: &str,
        labels: &[String],
        properties: BTreeMap<String, Value>,
    ) {
        let param = self.bind(format!("{}_props", var), Value::Map(properties));
        let labels: String = labels.iter().map(|l| escape_label(l)).collect();
        self.push_binding(
            ClauseKind::Write,
            format!("CREATE ({}{} ${})", var, labels, param),
            var,
        );
    }

    /// Emit a match-by-identifier clause for a persisted node.
    pub fn match_node(&mut self, var: &str, label: &str, id_key: &str, id: &EntityId) {
        if self.bound.contains(var) {
            return;
        }
        let param = self.bind(format!("{}_id", var), id.to_value());
        self.push_binding(
            ClauseKind::Match,
            format!(
                "MATCH ({}{} {{{}: ${}}})",
                var,
                escape_label(label),
                escape_identifier(id_key),
                param
            ),
            var,
        );
    }

    /// Emit a property update clause; changed keys bind as one map
    /// parameter, removed keys are nulled by the same `+=` merge.
    pub fn set_properties(&mut self, var: &str, changes: BTreeMap<String, Value>) {
        if changes.is_empty() {
            return;
        }
        let param = self.bind(format!("{}_set", var), Value::Map(changes));
        self.push_write(format!("SET {} += ${}", var, param));
    }

    /// Emit label attach clauses for dynamic labels.
    pub fn set_labels(&mut self, var: &str, labels: &[String]) {
        if labels.is_empty() {
            return;
        }
        let rendered: String = labels.iter().map(|l| escape_label(l)).collect();
        self.push_write(format!("SET {}{}", var, rendered));
    }

    /// Emit label detach clauses for dynamic labels.
    pub fn remove_labels(&mut self, var: &str, labels: &[String]) {
        if labels.is_empty() {
            return;
        }
        let rendered: String = labels.iter().map(|l| escape_label(l)).collect();
        self.push_write(format!("REMOVE {}{}", var, rendered));
    }

    /// Emit relationship merge clause(s) between two bound node variables.
    ///
    /// Edge properties bind as a single map parameter keyed by the edge's
    /// statement-local variable. An undirected descriptor mirrors into two
    /// merges with swapped endpoints and two distinct edge variables
    /// sharing that one parameter.
    pub fn relate(
        &mut self,
        start_var: &str,
        end_var: &str,
        rel_type: &str,
        direction: Direction,
        properties: Option<&BTreeMap<String, Value>>,
    ) {
        let (from, to) = match direction {
            Direction::Incoming => (end_var, start_var),
            _ => (start_var, end_var),
        };

        let rel_var = self.fresh_rel_var();
        let props_param = properties.filter(|p| !p.is_empty()).map(|p| {
            self.bind(format!("{}_props", rel_var), Value::Map(p.clone()))
        });

        self.merge_edge(from, to, rel_type, &rel_var, props_param.as_deref());

        if direction.is_undirected() {
            // Mirror with swapped endpoints, distinct variable, same
            // property parameter.
            let mirror_var = self.fresh_rel_var();
            self.merge_edge(to, from, rel_type, &mirror_var, props_param.as_deref());
        }
    }

    fn merge_edge(
        &mut self,
        from: &str,
        to: &str,
        rel_type: &str,
        rel_var: &str,
        props_param: Option<&str>,
    ) {
        self.push_write(format!(
            "MERGE ({})-[{}{}]->({})",
            from,
            rel_var,
            escape_rel_type(rel_type),
            to
        ));
        if let Some(param) = props_param {
            self.push_write(format!("SET {} += ${}", rel_var, param));
        }
    }

    /// Emit relationship removal clause(s) between two bound node
    /// variables. An undirected descriptor removes both directions.
    pub fn unrelate(
        &mut self,
        start_var: &str,
        end_var: &str,
        rel_type: &str,
        direction: Direction,
    ) {
        let (from, to) = match direction {
            Direction::Incoming => (end_var, start_var),
            _ => (start_var, end_var),
        };

        let rel_var = self.fresh_rel_var();
        self.push_match(format!(
            "OPTIONAL MATCH ({})-[{}{}]->({})",
            from,
            rel_var,
            escape_rel_type(rel_type),
            to
        ));
        self.push_write(format!("DELETE {}", rel_var));

        if direction.is_undirected() {
            let mirror_var = self.fresh_rel_var();
            self.push_match(format!(
                "OPTIONAL MATCH ({})-[{}{}]->({})",
                to,
                mirror_var,
                escape_rel_type(rel_type),
                from
            ));
            self.push_write(format!("DELETE {}", mirror_var));
        }
    }

    /// Emit an edge property update matched by the edge's identifier.
    pub fn set_edge_properties(
        &mut self,
        start_var: &str,
        end_var: &str,
        rel_type: &str,
        direction: Direction,
        id_key: &str,
        edge_id: &EntityId,
        changes: BTreeMap<String, Value>,
    ) {
        if changes.is_empty() {
            return;
        }
        let (from, to) = match direction {
            Direction::Incoming => (end_var, start_var),
            _ => (start_var, end_var),
        };
        let rel_var = self.fresh_rel_var();
        let id_param = self.bind(format!("{}_id", rel_var), edge_id.to_value());
        self.push_match(format!(
            "OPTIONAL MATCH ({})-[{}{}]->({}) WHERE {}.{} = ${}",
            from,
            rel_var,
            escape_rel_type(rel_type),
            to,
            rel_var,
            escape_identifier(id_key),
            id_param
        ));
        let set_param = self.bind(format!("{}_set", rel_var), Value::Map(changes));
        self.push_write(format!("SET {} += ${}", rel_var, set_param));

        if direction.is_undirected() {
            let mirror_var = self.fresh_rel_var();
            let mirror_id = self.bind(format!("{}_id", mirror_var), edge_id.to_value());
            self.push_match(format!(
                "OPTIONAL MATCH ({})-[{}{}]->({}) WHERE {}.{} = ${}",
                to,
                mirror_var,
                escape_rel_type(rel_type),
                from,
                mirror_var,
                escape_identifier(id_key),
                mirror_id
            ));
            self.push_write(format!("SET {} += ${}", mirror_var, set_param));
        }
    }

    /// Merge all accumulated clauses into one statement.
    ///
    /// A `WITH` clause carrying the bound node variables is inserted
    /// wherever a match clause follows a write clause, so the merged text
    /// stays one valid statement.
    pub fn into_statement(self) -> Statement {
        let mut text = String::new();
        let mut after_write = false;
        let mut carry: Vec<String> = Vec::new();

        for clause in &self.clauses {
            if !text.is_empty() {
                text.push('\n');
            }
            if clause.kind == ClauseKind::Match && after_write && !carry.is_empty() {
                let csv: Vec<&str> = carry.iter().map(String::as_str).collect();
                text.push_str(&format!("WITH {}\n", csv.join(", ")));
                after_write = false;
            }
            text.push_str(&clause.text);
            if clause.kind == ClauseKind::Write {
                after_write = true;
            }
            if let Some(var) = &clause.binds {
                if !carry.contains(var) {
                    carry.push(var.clone());
                }
            }
        }

        Statement {
            query: text,
            parameters: self.parameters,
            kind: StatementKind::Write,
        }
    }
}
