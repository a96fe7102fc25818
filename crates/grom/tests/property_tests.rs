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

//! Property-based checks for escaping and diff idempotence.

mod common;

use std::collections::BTreeMap;

use common::StubExecutor;
use grom::containers::slice;
use grom::cypher::escape::{
    escape_identifier, escape_string, is_valid_identifier, quote_string,
};
use grom::{SaveOptions, Session, Value};
use grom_test::fixtures;
use proptest::prelude::*;

proptest! {
    #[test]
    fn escaped_strings_never_leak_raw_control_characters(s in ".*") {
        let escaped = escape_string(&s);
        prop_assert!(!escaped.contains('\n'));
        prop_assert!(!escaped.contains('\r'));
        prop_assert!(!escaped.contains('\t'));
        prop_assert!(!escaped.contains('\x00'));
    }

    #[test]
    fn quoted_strings_keep_every_quote_escaped(s in ".*") {
        let quoted = quote_string(&s);
        prop_assert!(quoted.starts_with('\''));
        prop_assert!(quoted.ends_with('\''));
        // Inside the quotes, every single quote is preceded by a
        // backslash.
        let inner: Vec<char> = quoted[1..quoted.len() - 1].chars().collect();
        for (i, c) in inner.iter().enumerate() {
            if *c == '\'' {
                prop_assert!(i > 0 && inner[i - 1] == '\\');
            }
        }
    }

    #[test]
    fn escaped_identifiers_are_plain_or_backticked(s in ".*") {
        let out = escape_identifier(&s);
        prop_assert!(
            is_valid_identifier(&out)
                || (out.starts_with('`') && out.ends_with('`') && out.len() >= 2)
        );
        prop_assert!(!out.contains('\n'));
        prop_assert!(!out.contains('\x00'));
    }

    #[test]
    fn saving_twice_without_mutation_writes_once(
        name in "\\PC{0,20}",
        city in "\\PC{0,20}",
        zip in "\\PC{0,10}",
    ) {
        let mut executor = StubExecutor::new();
        let mut session = Session::new(fixtures::shared_registry());

        let person = session.create("Person").unwrap();
        session.entity_mut(person).set_property("name", name);
        let mut address = BTreeMap::new();
        address.insert("city".to_string(), Value::from(city));
        address.insert("zip".to_string(), Value::from(zip));
        session
            .entity_mut(person)
            .set_property("address", Value::Map(address));

        session
            .save(&mut executor, person, &SaveOptions::default())
            .unwrap();
        session
            .save(&mut executor, person, &SaveOptions::default())
            .unwrap();
        prop_assert_eq!(executor.executed.len(), 1);
    }

    #[test]
    fn slice_windows_are_exact(n in 0usize..50, offset in 0usize..60, limit in 0usize..10) {
        let s = slice(0..n, offset, limit);
        let expected: Vec<usize> = (offset..n).take(limit).collect();
        prop_assert_eq!(&s.items, &expected);
        prop_assert_eq!(s.has_more, n.saturating_sub(offset) > limit);
    }
}
