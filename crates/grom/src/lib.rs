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

//! Graph object mapper: sessions, change tracking and Cypher generation.
//!
//! GROM binds schema-described entity records to a graph store's
//! node/relationship model. A [`Session`] is the unit of work: it owns
//! the identity map and the snapshots that make diffing possible, and it
//! talks to the store exclusively through the [`executor`] seam.
//!
//! # Mapping
//!
//! | Domain concept | Graph representation |
//! |----------------|---------------------|
//! | Entity type | Node label set (supertype labels included) |
//! | Identifier | Node property (assigned or generated surrogate) |
//! | Scalar property | Node property |
//! | Composite property | Prefixed flattened properties |
//! | Relationship slot | Typed edges, direction per descriptor |
//! | Undirected slot | Two mirrored directed edges, one payload |
//! | Relationship entity | Edge with identifier and properties |
//! | Dynamic labels | Extra per-instance labels |
//!
//! # Save path
//!
//! Metadata -> diff -> write fragments -> one merged statement. Only
//! deltas against the last snapshot are written; a save with no changes
//! executes nothing.
//!
//! # Load path
//!
//! Statement -> row stream -> reconstitution. The identity map
//! deduplicates instances, cycles converge instead of recursing, and
//! slots beyond the requested depth stay explicitly not-loaded.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use grom_core::schema::{EntityDescriptor, RelationshipDescriptor, SchemaRegistry};
//! use grom::{Session, SaveOptions};
//!
//! # fn run(executor: &mut dyn grom::executor::StatementExecutor) -> grom_core::Result<()> {
//! let registry = Arc::new(
//!     SchemaRegistry::builder()
//!         .register(EntityDescriptor::node("Person").scalar("name").declare())
//!         .register(
//!             EntityDescriptor::node("Movie")
//!                 .scalar("title")
//!                 .relationship(RelationshipDescriptor::to_many(
//!                     "actors", "ACTED_IN", "Person",
//!                 ))
//!                 .declare(),
//!         )
//!         .build()?,
//! );
//!
//! let mut session = Session::new(registry);
//! let movie = session.create("Movie")?;
//! session.entity_mut(movie).set_property("title", "Heat");
//! let actor = session.create("Person")?;
//! session.entity_mut(actor).set_property("name", "Al");
//! session.relate(movie, "actors", actor)?;
//! session.save(executor, movie, &SaveOptions::default())?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod codec;
mod hydrate;

pub mod config;
pub mod containers;
pub mod cypher;
pub mod entity;
pub mod executor;
pub mod session;
pub mod write;

// Re-export main types at crate root for convenience
pub use config::{LoadOptions, SaveOptions, SessionConfig, SessionConfigBuilder};
pub use cypher::{constraint_statements, Statement, StatementKind};
pub use entity::{Entity, EntityHandle, RelTarget};
pub use executor::{
    DefaultTranslator, EntityHooks, ErrorTranslator, IdGenerator, RowStream, SequenceIds,
    SessionProvider, StatementExecutor, StoreError, StoreErrorKind, WriteSummary,
};
pub use grom_core::{EntityId, GromError, MappingError, Result, Value};
pub use session::{EntityState, Session, SingleSessionProvider};
pub use write::WriteBatch;
