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

//! Property encoding between entity records and stored property maps.
//!
//! Scalar properties map name -> storage key one to one. Composite
//! properties flatten a map value into `<prefix><delimiter><entry>`
//! storage keys, one stored property per entry, and are reassembled on
//! the way back.

use std::collections::BTreeMap;

use grom_core::schema::{EntityDescriptor, PropertyKind};
use grom_core::{MappingError, Value};

/// Encode an entity-level property map into the stored (flattened)
/// key space.
///
/// Unknown property names are a mapping error: the descriptor is the
/// closed schema of the type.
pub(crate) fn encode_properties(
    descriptor: &EntityDescriptor,
    properties: &BTreeMap<String, Value>,
) -> Result<BTreeMap<String, Value>, MappingError> {
    let mut stored = BTreeMap::new();

    for (name, value) in properties {
        let property = descriptor.property(name).ok_or_else(|| {
            MappingError::UnknownSlot {
                type_name: descriptor.type_name.clone(),
                slot: name.clone(),
            }
        })?;

        match &property.kind {
            PropertyKind::Scalar => {
                stored.insert(property.key.clone(), value.clone());
            }
            PropertyKind::Composite { prefix, delimiter } => {
                let entries = value.as_map().ok_or_else(|| {
                    MappingError::PropertyCodec {
                        type_name: descriptor.type_name.clone(),
                        property: name.clone(),
                        message: format!("composite property expects a map, got {}", value),
                    }
                })?;
                for (entry, entry_value) in entries {
                    stored.insert(
                        format!("{}{}{}", prefix, delimiter, entry),
                        entry_value.clone(),
                    );
                }
            }
        }
    }

    Ok(stored)
}

/// Decode a stored property map back into entity-level properties.
///
/// Stored keys with no descriptor (the identifier property, metadata
/// written by other tooling) are ignored.
pub(crate) fn decode_properties(
    descriptor: &EntityDescriptor,
    stored: &BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();

    for property in &descriptor.properties {
        match &property.kind {
            PropertyKind::Scalar => {
                if let Some(value) = stored.get(&property.key) {
                    properties.insert(property.name.clone(), value.clone());
                }
            }
            PropertyKind::Composite { prefix, delimiter } => {
                let lead = format!("{}{}", prefix, delimiter);
                let mut entries = BTreeMap::new();
                for (key, value) in stored {
                    if let Some(entry) = key.strip_prefix(&lead) {
                        entries.insert(entry.to_string(), value.clone());
                    }
                }
                if !entries.is_empty() {
                    properties.insert(property.name.clone(), Value::Map(entries));
                }
            }
        }
    }

    properties
}

#[cfg(test)]
mod tests {
    use super::*;
    use grom_core::schema::{EntityDescriptor, PropertyDescriptor};

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::node("Person")
            .scalar("name")
            .property(PropertyDescriptor::scalar("birth_year").with_key("born"))
            .property(PropertyDescriptor::composite("address", "address", '.'))
            .declare()
    }

    #[test]
    fn test_encode_scalar_with_remapped_key() {
        let d = descriptor();
        let mut props = BTreeMap::new();
        props.insert("name".to_string(), Value::from("Alice"));
        props.insert("birth_year".to_string(), Value::Int(1990));

        let stored = encode_properties(&d, &props).unwrap();
        assert_eq!(stored.get("name"), Some(&Value::from("Alice")));
        assert_eq!(stored.get("born"), Some(&Value::Int(1990)));
        assert!(stored.get("birth_year").is_none());
    }

    #[test]
    fn test_encode_composite_flattens() {
        let d = descriptor();
        let mut address = BTreeMap::new();
        address.insert("city".to_string(), Value::from("Berlin"));
        address.insert("zip".to_string(), Value::from("10115"));
        let mut props = BTreeMap::new();
        props.insert("address".to_string(), Value::Map(address));

        let stored = encode_properties(&d, &props).unwrap();
        assert_eq!(stored.get("address.city"), Some(&Value::from("Berlin")));
        assert_eq!(stored.get("address.zip"), Some(&Value::from("10115")));
    }

    #[test]
    fn test_encode_rejects_unknown_property() {
        let d = descriptor();
        let mut props = BTreeMap::new();
        props.insert("nickname".to_string(), Value::from("Al"));
        let err = encode_properties(&d, &props).unwrap_err();
        assert!(matches!(err, MappingError::UnknownSlot { .. }));
    }

    #[test]
    fn test_encode_rejects_non_map_composite() {
        let d = descriptor();
        let mut props = BTreeMap::new();
        props.insert("address".to_string(), Value::from("not a map"));
        let err = encode_properties(&d, &props).unwrap_err();
        assert!(matches!(err, MappingError::PropertyCodec { .. }));
    }

    #[test]
    fn test_decode_round_trip() {
        let d = descriptor();
        let mut address = BTreeMap::new();
        address.insert("city".to_string(), Value::from("Berlin"));
        let mut props = BTreeMap::new();
        props.insert("name".to_string(), Value::from("Alice"));
        props.insert("birth_year".to_string(), Value::Int(1990));
        props.insert("address".to_string(), Value::Map(address));

        let stored = encode_properties(&d, &props).unwrap();
        let decoded = decode_properties(&d, &stored);
        assert_eq!(decoded, props);
    }

    #[test]
    fn test_decode_ignores_unmapped_keys() {
        let d = descriptor();
        let mut stored = BTreeMap::new();
        stored.insert("_grom_id".to_string(), Value::Int(7));
        stored.insert("name".to_string(), Value::from("Alice"));
        stored.insert("unrelated".to_string(), Value::Bool(true));

        let decoded = decode_properties(&d, &stored);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get("name"), Some(&Value::from("Alice")));
    }
}
