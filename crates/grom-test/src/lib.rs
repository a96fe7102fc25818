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

//! Shared test fixtures for GROM.
//!
//! One social-graph schema exercising every descriptor feature —
//! inheritance, undirected and polymorphic slots, relationship entities,
//! composite properties, dynamic labels — plus payload builders producing
//! the result rows a store would return for it.

#![deny(missing_docs)]

pub mod fixtures;

pub use fixtures::{shared_registry, social_registry};
