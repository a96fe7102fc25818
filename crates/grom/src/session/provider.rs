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

//! Explicit session provision.
//!
//! Call sites resolve their session through a provider instead of any
//! ambient or thread-bound state; the provider is plain data passed where
//! it is needed.

use std::sync::Arc;

use grom_core::schema::SchemaRegistry;

use crate::config::SessionConfig;
use crate::executor::SessionProvider;
use crate::session::Session;

/// Holds at most one session at a time: the common one-unit-of-work-at-a-
/// time shape for request-scoped callers.
pub struct SingleSessionProvider {
    registry: Arc<SchemaRegistry>,
    config: SessionConfig,
    current: Option<Session>,
}

impl SingleSessionProvider {
    /// Create a provider over a shared registry.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_config(registry, SessionConfig::default())
    }

    /// Create a provider with explicit session configuration.
    pub fn with_config(registry: Arc<SchemaRegistry>, config: SessionConfig) -> Self {
        Self {
            registry,
            config,
            current: None,
        }
    }

    /// Whether a session is currently active.
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}

impl SessionProvider for SingleSessionProvider {
    fn current_or_new(&mut self) -> &mut Session {
        if self.current.is_none() {
            self.current = Some(Session::with_config(
                Arc::clone(&self.registry),
                self.config.clone(),
            ));
        }
        // Just set above when absent.
        match &mut self.current {
            Some(session) => session,
            None => unreachable!("session installed above"),
        }
    }

    fn end(&mut self) {
        self.current = None;
    }
}
