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

//! Result-row payloads produced by statement execution.
//!
//! Rows are the read-side contract between the statement executor and
//! reconstitution: every node and relationship payload carries its label
//! set / type name and a property map, so hydration never needs to go back
//! to the store to interpret a row.

use std::collections::BTreeMap;

use crate::value::{EntityId, Value};

/// A node as returned by the store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodePayload {
    /// Store-side node identity.
    pub id: EntityId,
    /// Labels present on the node.
    pub labels: Vec<String>,
    /// Property map.
    pub properties: BTreeMap<String, Value>,
}

impl NodePayload {
    /// Create a payload with the given identity and labels.
    pub fn new(id: impl Into<EntityId>, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// A relationship as returned by the store.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelPayload {
    /// Store-side relationship identity.
    pub id: EntityId,
    /// Relationship type name.
    pub rel_type: String,
    /// Identity of the start node.
    pub start: EntityId,
    /// Identity of the end node.
    pub end: EntityId,
    /// Property map.
    pub properties: BTreeMap<String, Value>,
}

impl RelPayload {
    /// Create a payload between two node identities.
    pub fn new(
        id: impl Into<EntityId>,
        rel_type: impl Into<String>,
        start: impl Into<EntityId>,
        end: impl Into<EntityId>,
    ) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            start: start.into(),
            end: end.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// An ordered path of nodes and relationships.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathPayload {
    /// Nodes along the path.
    pub nodes: Vec<NodePayload>,
    /// Relationships along the path.
    pub relationships: Vec<RelPayload>,
}

/// One column value in a result row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowValue {
    /// Absent value.
    Null,
    /// A plain scalar or compound value.
    Scalar(Value),
    /// A node payload.
    Node(NodePayload),
    /// A relationship payload.
    Relationship(RelPayload),
    /// A path payload.
    Path(PathPayload),
    /// A list of column values (e.g. collected nodes).
    List(Vec<RowValue>),
}

/// One result row: named columns in result order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultRow {
    columns: Vec<(String, RowValue)>,
}

impl ResultRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with(mut self, name: impl Into<String>, value: RowValue) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&RowValue> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterate over columns in result order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All node payloads in the row, including those inside paths and lists.
    pub fn nodes(&self) -> Vec<&NodePayload> {
        let mut out = Vec::new();
        for (_, value) in &self.columns {
            collect_nodes(value, &mut out);
        }
        out
    }

    /// All relationship payloads in the row, including those inside paths
    /// and lists.
    pub fn relationships(&self) -> Vec<&RelPayload> {
        let mut out = Vec::new();
        for (_, value) in &self.columns {
            collect_relationships(value, &mut out);
        }
        out
    }
}

fn collect_nodes<'a>(value: &'a RowValue, out: &mut Vec<&'a NodePayload>) {
    match value {
        RowValue::Node(n) => out.push(n),
        RowValue::Path(p) => out.extend(p.nodes.iter()),
        RowValue::List(items) => {
            for item in items {
                collect_nodes(item, out);
            }
        }
        _ => {}
    }
}

fn collect_relationships<'a>(value: &'a RowValue, out: &mut Vec<&'a RelPayload>) {
    match value {
        RowValue::Relationship(r) => out.push(r),
        RowValue::Path(p) => out.extend(p.relationships.iter()),
        RowValue::List(items) => {
            for item in items {
                collect_relationships(item, out);
            }
        }
        _ => {}
    }
}
