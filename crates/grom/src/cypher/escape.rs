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

//! Cypher string escaping and identifier sanitization.
//!
//! Property values are always bound as parameters, so the only strings
//! embedded into statement text are labels, relationship types and
//! property keys coming from the schema or from dynamic-label/keyed-map
//! slots. These are normalized and escaped here before embedding.

use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

/// Check if a string needs escaping inside a quoted Cypher literal.
#[inline]
fn needs_escaping(s: &str) -> bool {
    s.chars()
        .any(|ch| matches!(ch, '\\' | '\'' | '"' | '\n' | '\r' | '\t' | '\x00'))
}

/// Escape a string value for a quoted Cypher literal.
///
/// Returns `Cow::Borrowed` when no special characters are present.
pub fn escape_string(s: &str) -> Cow<'_, str> {
    if !needs_escaping(s) {
        return Cow::Borrowed(s);
    }

    let mut escaped = String::with_capacity(s.len() + 10);
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            '\x00' => escaped.push_str("\\u0000"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Quote a string value for Cypher with single quotes.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", escape_string(s))
}

/// Check if a string is a plain Cypher identifier.
///
/// Plain identifiers start with an ASCII letter or underscore and contain
/// only ASCII letters, digits and underscores.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Normalize a string to NFC form.
///
/// Ensures that visually identical label/key spellings with different
/// codepoint sequences map to the same statement text.
pub fn normalize_unicode(s: &str) -> String {
    s.nfc().collect()
}

/// Check if a character is a control or invisible-formatting codepoint
/// that must never reach statement text.
fn is_dangerous_unicode(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            // Zero-width characters
            '\u{200B}' // Zero-width space
            | '\u{200C}' // Zero-width non-joiner
            | '\u{200D}' // Zero-width joiner
            | '\u{FEFF}' // Zero-width no-break space
            // Directional formatting
            | '\u{202A}' // Left-to-right embedding
            | '\u{202B}' // Right-to-left embedding
            | '\u{202C}' // Pop directional formatting
            | '\u{202D}' // Left-to-right override
            | '\u{202E}' // Right-to-left override
            | '\u{2066}' // Left-to-right isolate
            | '\u{2067}' // Right-to-left isolate
            | '\u{2068}' // First strong isolate
            | '\u{2069}' // Pop directional isolate
            // Other format characters
            | '\u{00AD}' // Soft hyphen
            | '\u{061C}' // Arabic letter mark
            | '\u{180E}' // Mongolian vowel separator
        )
}

/// Sanitize and escape an identifier (property key, variable suffix).
///
/// Applies NFC normalization, strips control and invisible-formatting
/// codepoints, and backticks anything that is not a plain identifier or
/// collides with a reserved word.
pub fn escape_identifier(s: &str) -> String {
    let normalized = normalize_unicode(s);
    let sanitized: String = normalized
        .chars()
        .filter(|c| !is_dangerous_unicode(*c))
        .collect();

    if is_valid_identifier(&sanitized) && !is_cypher_keyword(&sanitized) {
        sanitized
    } else {
        format!("`{}`", sanitized.replace('`', "``"))
    }
}

/// Sanitize and escape a node label, with the leading `:`.
pub fn escape_label(s: &str) -> String {
    let escaped = escape_identifier(s);
    format!(":{}", escaped)
}

/// Sanitize and escape a relationship type, with the leading `:`.
pub fn escape_rel_type(s: &str) -> String {
    let escaped = escape_identifier(s);
    format!(":{}", escaped)
}

/// Check if a string is a Cypher reserved keyword.
fn is_cypher_keyword(s: &str) -> bool {
    matches!(
        s.to_uppercase().as_str(),
        "ALL"
            | "AND"
            | "ANY"
            | "AS"
            | "ASC"
            | "ASCENDING"
            | "BY"
            | "CALL"
            | "CASE"
            | "CONTAINS"
            | "CREATE"
            | "DELETE"
            | "DESC"
            | "DESCENDING"
            | "DETACH"
            | "DISTINCT"
            | "ELSE"
            | "END"
            | "ENDS"
            | "EXISTS"
            | "FALSE"
            | "FOREACH"
            | "IN"
            | "IS"
            | "LIMIT"
            | "MATCH"
            | "MERGE"
            | "NOT"
            | "NULL"
            | "ON"
            | "OPTIONAL"
            | "OR"
            | "ORDER"
            | "REMOVE"
            | "RETURN"
            | "SET"
            | "SKIP"
            | "STARTS"
            | "THEN"
            | "TRUE"
            | "UNION"
            | "UNWIND"
            | "WHEN"
            | "WHERE"
            | "WITH"
            | "XOR"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string_zero_copy() {
        assert!(matches!(escape_string("user_name"), Cow::Borrowed(_)));
        assert!(matches!(escape_string("it's"), Cow::Owned(_)));
        assert_eq!(escape_string("it's"), "it\\'s");
    }

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("hello"), "'hello'");
        assert_eq!(quote_string("line\nbreak"), "'line\\nbreak'");
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("name"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("n0"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("0name"));
        assert!(!is_valid_identifier("my-key"));
    }

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("name"), "name");
        assert_eq!(escape_identifier("123name"), "`123name`");
        assert_eq!(escape_identifier("MATCH"), "`MATCH`");
        assert_eq!(escape_identifier("with`tick"), "`with``tick`");
    }

    #[test]
    fn test_escape_label_and_rel_type() {
        assert_eq!(escape_label("Person"), ":Person");
        assert_eq!(escape_label("My-Label"), ":`My-Label`");
        assert_eq!(escape_rel_type("KNOWS"), ":KNOWS");
        assert_eq!(escape_rel_type("knows about"), ":`knows about`");
    }

    #[test]
    fn test_dangerous_unicode_filtered() {
        assert_eq!(escape_identifier("na\u{200B}me"), "name");
        assert_eq!(escape_identifier("ke\u{0000}y"), "key");
    }

    #[test]
    fn test_unicode_normalization() {
        let composed = "caf\u{00E9}";
        let decomposed = "cafe\u{0301}";
        assert_eq!(
            escape_identifier(composed),
            escape_identifier(decomposed)
        );
    }
}
