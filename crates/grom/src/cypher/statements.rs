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

//! Cypher statement types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use grom_core::Value;

use crate::cypher::escape;

/// Render a value as Cypher literal syntax.
///
/// Only used for diagnostic rendering; executed statements always bind
/// values as parameters.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            if f.is_nan() {
                "0.0/0.0".to_string() // NaN in Cypher
            } else if f.is_infinite() {
                if *f > 0.0 {
                    "1.0/0.0".to_string()
                } else {
                    "-1.0/0.0".to_string()
                }
            } else {
                let s = f.to_string();
                if s.contains('.') || s.contains('e') || s.contains('E') {
                    s
                } else {
                    format!("{}.0", s)
                }
            }
        }
        Value::String(s) => escape::quote_string(s),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", escape::escape_identifier(k), literal(v)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
    }
}

/// The role of a Cypher statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementKind {
    /// Uniqueness constraint creation.
    Constraint,
    /// A merged save statement (creates, updates, removals as one unit).
    Write,
    /// A load statement producing rows.
    Read,
    /// A label inspection probe (removal guard).
    Probe,
    /// An entity detach-delete.
    Delete,
}

/// A single Cypher statement with bound parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// The Cypher query text.
    pub query: String,
    /// Bound parameters.
    pub parameters: BTreeMap<String, Value>,
    /// Role of the statement.
    pub kind: StatementKind,
}

impl Statement {
    /// Create a new statement.
    pub fn new(query: impl Into<String>, kind: StatementKind) -> Self {
        Self {
            query: query.into(),
            parameters: BTreeMap::new(),
            kind,
        }
    }

    /// Create a read statement.
    pub fn read(query: impl Into<String>) -> Self {
        Self::new(query, StatementKind::Read)
    }

    /// Create a write statement.
    pub fn write(query: impl Into<String>) -> Self {
        Self::new(query, StatementKind::Write)
    }

    /// Create a probe statement.
    pub fn probe(query: impl Into<String>) -> Self {
        Self::new(query, StatementKind::Probe)
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Add multiple parameters.
    pub fn with_params(mut self, params: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.parameters.extend(params);
        self
    }

    /// Whether the statement binds any parameters.
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Serialize the statement and its parameters as JSON, the shape the
    /// repository layer hands to out-of-process executors.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Render the statement with parameter values inlined.
    ///
    /// Diagnostic only; never send the result to a store.
    pub fn render_inline(&self) -> String {
        let mut result = self.query.clone();
        // Longest names first so $p10 is not clobbered by $p1.
        let mut names: Vec<&String> = self.parameters.keys().collect();
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        for name in names {
            let placeholder = format!("${}", name);
            if let Some(value) = self.parameters.get(name) {
                result = result.replace(&placeholder, &literal(value));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_scalars() {
        assert_eq!(literal(&Value::Null), "null");
        assert_eq!(literal(&Value::Bool(true)), "true");
        assert_eq!(literal(&Value::Int(42)), "42");
        assert_eq!(literal(&Value::Float(3.25)), "3.25");
        assert_eq!(literal(&Value::Float(2.0)), "2.0");
        assert_eq!(literal(&Value::String("hello".to_string())), "'hello'");
    }

    #[test]
    fn test_literal_escaping() {
        assert_eq!(literal(&Value::String("it's".to_string())), "'it\\'s'");
    }

    #[test]
    fn test_literal_float_edge_cases() {
        assert_eq!(literal(&Value::Float(f64::NAN)), "0.0/0.0");
        assert_eq!(literal(&Value::Float(f64::INFINITY)), "1.0/0.0");
        assert_eq!(literal(&Value::Float(f64::NEG_INFINITY)), "-1.0/0.0");
    }

    #[test]
    fn test_literal_compound() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(literal(&list), "[1, 2]");

        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::String("Alice".to_string()));
        map.insert("age".to_string(), Value::Int(30));
        assert_eq!(literal(&Value::Map(map)), "{age: 30, name: 'Alice'}");
    }

    #[test]
    fn test_statement_params() {
        let stmt = Statement::read("MATCH (n {name: $name}) RETURN n").with_param("name", "Alice");
        assert!(stmt.has_parameters());
        assert_eq!(
            stmt.parameters.get("name"),
            Some(&Value::String("Alice".to_string()))
        );
    }

    #[test]
    fn test_render_inline() {
        let stmt = Statement::read("MATCH (n {name: $name, age: $age}) RETURN n")
            .with_param("name", "Alice")
            .with_param("age", 30i64);
        assert_eq!(
            stmt.render_inline(),
            "MATCH (n {name: 'Alice', age: 30}) RETURN n"
        );
    }

    #[test]
    fn test_to_json_round_trips() {
        let stmt = Statement::write("CREATE (n:Person $props)").with_param("x", 1i64);
        let json = stmt.to_json().unwrap();
        let back: Statement = serde_json::from_str(&json).unwrap();
        assert_eq!(back.query, stmt.query);
        assert_eq!(back.parameters, stmt.parameters);
    }

    #[test]
    fn test_render_inline_prefix_params() {
        let stmt = Statement::write("CREATE (a {x: $p1, y: $p10})")
            .with_param("p1", 1i64)
            .with_param("p10", 10i64);
        assert_eq!(stmt.render_inline(), "CREATE (a {x: 1, y: 10})");
    }
}
