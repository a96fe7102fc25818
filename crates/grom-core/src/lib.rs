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

//! Core data model for GROM: graph values, entity metadata and errors.
//!
//! This crate holds everything the mapping engine shares with its
//! collaborators but that performs no I/O and keeps no session state:
//!
//! - [`Value`] / [`EntityId`] — the graph property value model
//! - [`schema`] — per-type descriptors and the startup-validated
//!   [`schema::SchemaRegistry`]
//! - [`rows`] — the result-row payload contract consumed by hydration
//! - [`GromError`] / [`MappingError`] — the error taxonomy
//!
//! # Example
//!
//! ```rust
//! use grom_core::schema::{EntityDescriptor, RelationshipDescriptor, SchemaRegistry};
//!
//! let registry = SchemaRegistry::builder()
//!     .register(EntityDescriptor::node("Person").scalar("name").declare())
//!     .register(
//!         EntityDescriptor::node("Movie")
//!             .scalar("title")
//!             .relationship(RelationshipDescriptor::to_many(
//!                 "actors", "ACTED_IN", "Person",
//!             ))
//!             .declare(),
//!     )
//!     .build()
//!     .expect("valid schema");
//!
//! let movie = registry.describe("Movie").expect("registered");
//! assert_eq!(movie.primary_label(), "Movie");
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod error;
pub mod rows;
pub mod schema;
pub mod value;

pub use error::{GromError, MappingError, Result};
pub use rows::{NodePayload, PathPayload, RelPayload, ResultRow, RowValue};
pub use value::{EntityId, Value};
