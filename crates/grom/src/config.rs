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

//! Session, save and load configuration.

use serde::{Deserialize, Serialize};

use grom_core::{GromError, Result};

/// Upper bound on any traversal depth; anything past this is a usage
/// error rather than a plausible object graph.
pub const MAX_TRAVERSAL_DEPTH: usize = 64;

/// Options for one save invocation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SaveOptions {
    /// Traversal depth bound. `None` means unbounded: the whole reachable
    /// graph is diffed. Relationships beyond the bound are not diffed or
    /// written; in-memory state past the bound may silently diverge from
    /// the store.
    pub depth: Option<usize>,
}

impl SaveOptions {
    /// Save with the session's default bound (unbounded unless the
    /// session configuration says otherwise).
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the traversal depth.
    pub fn depth(depth: usize) -> Self {
        Self { depth: Some(depth) }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(depth) = self.depth {
            if depth > MAX_TRAVERSAL_DEPTH {
                return Err(GromError::InvalidUsage(format!(
                    "save depth {} exceeds maximum {}",
                    depth, MAX_TRAVERSAL_DEPTH
                )));
            }
        }
        Ok(())
    }
}

/// Options for one load invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Traversal depth. Depth 0 loads identifier and properties only and
    /// leaves relationship slots explicitly not-loaded.
    pub depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { depth: 1 }
    }
}

impl LoadOptions {
    /// Default load depth (1).
    pub fn new() -> Self {
        Self::default()
    }

    /// Load with the given traversal depth.
    pub fn depth(depth: usize) -> Self {
        Self { depth }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.depth > MAX_TRAVERSAL_DEPTH {
            return Err(GromError::InvalidUsage(format!(
                "load depth {} exceeds maximum {}",
                self.depth, MAX_TRAVERSAL_DEPTH
            )));
        }
        Ok(())
    }
}

/// Session-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default save depth when [`SaveOptions::default`] is used.
    pub default_save_depth: Option<usize>,
    /// Default load depth when [`LoadOptions::default`] is used.
    pub default_load_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_save_depth: None,
            default_load_depth: 1,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    default_save_depth: Option<Option<usize>>,
    default_load_depth: Option<usize>,
}

impl SessionConfigBuilder {
    /// Set the default save depth.
    pub fn default_save_depth(mut self, depth: usize) -> Self {
        self.default_save_depth = Some(Some(depth));
        self
    }

    /// Make the default save unbounded.
    pub fn unbounded_save(mut self) -> Self {
        self.default_save_depth = Some(None);
        self
    }

    /// Set the default load depth.
    pub fn default_load_depth(mut self, depth: usize) -> Self {
        self.default_load_depth = Some(depth);
        self
    }

    /// Build the configuration; unset fields use defaults.
    pub fn build(self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            default_save_depth: self
                .default_save_depth
                .unwrap_or(defaults.default_save_depth),
            default_load_depth: self
                .default_load_depth
                .unwrap_or(defaults.default_load_depth),
        }
    }
}
