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

//! Collaborator contracts: statement execution, error translation,
//! identifier generation, lifecycle hooks and session providing.
//!
//! The mapping core performs no I/O of its own; everything that touches
//! the store goes through [`StatementExecutor`]. Implementations may be
//! blocking or stream rows incrementally; the core consumes rows one at a
//! time either way.

use thiserror::Error;

use grom_core::{EntityId, GromError, ResultRow};

use crate::cypher::Statement;
use crate::entity::Entity;
use crate::session::Session;

/// A store-specific failure, classified but not interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    /// Retry classification.
    pub kind: StoreErrorKind,
    /// Store-specific message, passed through untouched.
    pub message: String,
}

/// Classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Transient transport or store failure; a retry may succeed.
    Transient,
    /// A lock or versioning conflict with a concurrent writer.
    Concurrency,
}

impl StoreError {
    /// A transient failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Transient,
            message: message.into(),
        }
    }

    /// A concurrency conflict.
    pub fn concurrency(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Concurrency,
            message: message.into(),
        }
    }
}

/// Summary counters returned by a write execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Nodes created.
    pub nodes_created: usize,
    /// Nodes deleted.
    pub nodes_deleted: usize,
    /// Relationships created.
    pub relationships_created: usize,
    /// Relationships deleted.
    pub relationships_deleted: usize,
    /// Properties set.
    pub properties_set: usize,
}

/// A lazy stream of result rows.
///
/// Dropping the stream before exhaustion cancels the load; rows already
/// consumed stay hydrated and valid.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<ResultRow, StoreError>> + 'a>;

/// Executes statements against the underlying graph store.
pub trait StatementExecutor {
    /// Execute a write statement as one unit.
    fn execute(&mut self, statement: &Statement) -> Result<WriteSummary, StoreError>;

    /// Execute a read statement, producing a lazy row stream.
    fn query<'a>(&'a mut self, statement: &Statement) -> Result<RowStream<'a>, StoreError>;
}

/// Maps store failures into the crate error taxonomy.
pub trait ErrorTranslator {
    /// Translate one failure.
    fn translate(&self, error: StoreError) -> GromError;
}

/// Default translation: classification carries straight over.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTranslator;

impl ErrorTranslator for DefaultTranslator {
    fn translate(&self, error: StoreError) -> GromError {
        match error.kind {
            StoreErrorKind::Transient => GromError::StoreUnavailable(error.message),
            StoreErrorKind::Concurrency => GromError::Concurrency(error.message),
        }
    }
}

/// Supplies surrogate identifiers for new instances whose descriptor uses
/// the generated strategy.
pub trait IdGenerator {
    /// Produce the next identifier for the given type.
    fn next_id(&mut self, type_name: &str) -> EntityId;
}

/// Monotonically increasing integer identifiers.
///
/// Suitable for tests and single-writer deployments; production setups
/// plug in a store-backed generator.
#[derive(Debug, Clone)]
pub struct SequenceIds {
    next: i64,
}

impl SequenceIds {
    /// Start counting from `first`.
    pub fn starting_at(first: i64) -> Self {
        Self { next: first }
    }
}

impl Default for SequenceIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequenceIds {
    fn next_id(&mut self, _type_name: &str) -> EntityId {
        let id = self.next;
        self.next += 1;
        EntityId::Int(id)
    }
}

/// Per-instance lifecycle extension points.
///
/// Both callbacks default to no-ops; diffing and hydration are correct
/// without any hook installed.
pub trait EntityHooks {
    /// Invoked for every entity about to be written, before its diff is
    /// computed.
    fn before_write(&mut self, entity: &mut Entity) {
        let _ = entity;
    }

    /// Invoked for every instance materialized by reconstitution, after
    /// its relationships are wired.
    fn after_load(&mut self, entity: &mut Entity) {
        let _ = entity;
    }
}

/// Supplies the session for the current logical unit of work.
///
/// Replaces ambient/thread-bound session state with explicit context
/// passing: call sites resolve their session through the provider.
pub trait SessionProvider {
    /// The current session, creating one if none is active.
    fn current_or_new(&mut self) -> &mut Session;

    /// End the current session, detaching all of its instances.
    fn end(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_ids() {
        let mut ids = SequenceIds::default();
        assert_eq!(ids.next_id("Person"), EntityId::Int(1));
        assert_eq!(ids.next_id("Movie"), EntityId::Int(2));

        let mut ids = SequenceIds::starting_at(100);
        assert_eq!(ids.next_id("Person"), EntityId::Int(100));
    }

    #[test]
    fn test_default_translation() {
        let t = DefaultTranslator;
        assert!(matches!(
            t.translate(StoreError::transient("down")),
            GromError::StoreUnavailable(_)
        ));
        assert!(matches!(
            t.translate(StoreError::concurrency("locked")),
            GromError::Concurrency(_)
        ));
        assert!(t.translate(StoreError::transient("down")).is_retryable());
    }

    #[test]
    fn test_store_error_display() {
        let e = StoreError::transient("connection refused");
        assert_eq!(e.to_string(), "connection refused");
    }
}
