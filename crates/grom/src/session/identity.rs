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

//! The session identity map.
//!
//! At most one live instance exists per persisted identifier within a
//! session. Reconstitution consults this map before allocating, which is
//! what makes cyclic and diamond-shaped result graphs converge onto
//! shared instances instead of duplicating.

use std::collections::HashMap;

use grom_core::schema::DescriptorKind;
use grom_core::EntityId;

use crate::entity::EntityHandle;

/// Maps (entity kind, persisted identifier) to the single live instance.
///
/// Node and relationship identifier spaces are independent, so the kind
/// participates in the key; subtype and supertype descriptors of the same
/// node converge on the same entry by construction.
#[derive(Debug, Default)]
pub(crate) struct IdentityMap {
    map: HashMap<(DescriptorKind, EntityId), EntityHandle>,
}

impl IdentityMap {
    pub(crate) fn get(&self, kind: DescriptorKind, id: &EntityId) -> Option<EntityHandle> {
        self.map.get(&(kind, id.clone())).copied()
    }

    pub(crate) fn insert(&mut self, kind: DescriptorKind, id: EntityId, handle: EntityHandle) {
        self.map.insert((kind, id), handle);
    }

    pub(crate) fn remove(&mut self, kind: DescriptorKind, id: &EntityId) -> Option<EntityHandle> {
        self.map.remove(&(kind, id.clone()))
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }
}
