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

//! Error types for mapping and persistence operations.

use thiserror::Error;

/// Unsatisfiable type, identifier or codec resolution.
///
/// Mapping errors are fatal: they indicate a schema configuration or
/// payload that can never be mapped, and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// No descriptor registered under this type name.
    #[error("no entity type registered as '{0}'")]
    UnknownType(String),

    /// Two descriptors registered under the same type name.
    #[error("entity type '{0}' registered more than once")]
    DuplicateType(String),

    /// A descriptor extends a type that is not registered.
    #[error("type '{type_name}' extends unknown supertype '{supertype}'")]
    UnknownSupertype {
        /// The extending type.
        type_name: String,
        /// The missing supertype.
        supertype: String,
    },

    /// A supertype chain loops back on itself.
    #[error("supertype cycle through '{0}'")]
    SupertypeCycle(String),

    /// More than one identifier candidate in a supertype chain.
    #[error("ambiguous identifier for '{type_name}': candidates {candidates:?}")]
    AmbiguousIdentifier {
        /// The type with conflicting identifier declarations.
        type_name: String,
        /// The candidate identifier storage keys.
        candidates: Vec<String>,
    },

    /// Two property descriptors map to the same storage key.
    #[error("duplicate storage key '{key}' on type '{type_name}'")]
    DuplicateStorageKey {
        /// The offending type.
        type_name: String,
        /// The colliding storage key.
        key: String,
    },

    /// Two relationship descriptors share a slot name.
    #[error("duplicate relationship slot '{name}' on type '{type_name}'")]
    DuplicateRelationship {
        /// The offending type.
        type_name: String,
        /// The colliding slot name.
        name: String,
    },

    /// A relationship descriptor points at an unregistered target type.
    #[error("relationship '{relationship}' on '{type_name}' has unresolvable target '{target}'")]
    UnresolvedTarget {
        /// The owning type.
        type_name: String,
        /// The relationship slot name.
        relationship: String,
        /// The unresolvable target type.
        target: String,
    },

    /// A relationship names an edge-entity type that is not a relationship entity.
    #[error("'{0}' is not a registered relationship entity")]
    NotARelationshipEntity(String),

    /// Two node types resolved to the identical label set.
    #[error("types '{first}' and '{second}' map to the same label set")]
    DuplicateLabelSet {
        /// The first registered type.
        first: String,
        /// The conflicting type.
        second: String,
    },

    /// No registered type matches a payload's label set.
    #[error("no mapped type matches label set {labels:?}")]
    UnresolvedLabels {
        /// The labels present on the payload.
        labels: Vec<String>,
    },

    /// More than one equally-specific type matches a payload's label set.
    #[error("ambiguous type for label set {labels:?}: candidates {candidates:?}")]
    AmbiguousLabels {
        /// The labels present on the payload.
        labels: Vec<String>,
        /// The equally-specific candidate types.
        candidates: Vec<String>,
    },

    /// A property value does not fit its descriptor.
    #[error("property '{property}' on '{type_name}': {message}")]
    PropertyCodec {
        /// The owning type.
        type_name: String,
        /// The property name.
        property: String,
        /// What went wrong.
        message: String,
    },

    /// An entity is missing its identifier where one is required.
    #[error("entity of type '{0}' has no persisted identifier")]
    MissingIdentifier(String),

    /// A named slot does not exist on the descriptor.
    #[error("type '{type_name}' has no slot named '{slot}'")]
    UnknownSlot {
        /// The owning type.
        type_name: String,
        /// The missing property or relationship slot.
        slot: String,
    },
}

/// Error type for all mapping and persistence operations.
#[derive(Debug, Error)]
pub enum GromError {
    /// Unsatisfiable type/identifier resolution. Fatal, never retried.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// A cardinality contract was violated by a result.
    #[error("expected exactly {expected} result(s), got {actual}")]
    IncorrectResultSize {
        /// How many rows the contract allows.
        expected: usize,
        /// How many rows were produced.
        actual: usize,
    },

    /// A lock or versioning conflict detected by the underlying store.
    /// The caller may retry a fresh save.
    #[error("concurrent modification: {0}")]
    Concurrency(String),

    /// Transient transport or store failure. The caller may retry.
    #[error("graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// The API was used in a way that can never succeed.
    #[error("invalid usage: {0}")]
    InvalidUsage(String),
}

impl GromError {
    /// Whether the caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GromError::Concurrency(_) | GromError::StoreUnavailable(_)
        )
    }
}

/// Result type alias for mapping and persistence operations.
pub type Result<T> = std::result::Result<T, GromError>;
