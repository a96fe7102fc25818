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

//! Result shape adaptation.
//!
//! Pure, stateless conversions from hydrated items or raw rows into the
//! container the caller asked for: exactly-one, optional, ordered,
//! deduplicated, or sliced with an overflow probe.

use std::collections::BTreeMap;

use grom_core::{GromError, Result, ResultRow, RowValue, Value};

/// Unwrap an exactly-one result.
///
/// # Errors
///
/// [`GromError::IncorrectResultSize`] on zero or more than one item.
pub fn single<T>(items: Vec<T>) -> Result<T> {
    let actual = items.len();
    let mut items = items.into_iter();
    match (items.next(), items.next()) {
        (Some(item), None) => Ok(item),
        _ => Err(GromError::IncorrectResultSize {
            expected: 1,
            actual,
        }),
    }
}

/// Unwrap an at-most-one result.
///
/// # Errors
///
/// [`GromError::IncorrectResultSize`] on more than one item.
pub fn optional_single<T>(items: Vec<T>) -> Result<Option<T>> {
    let actual = items.len();
    let mut items = items.into_iter();
    match (items.next(), items.next()) {
        (item, None) => Ok(item),
        _ => Err(GromError::IncorrectResultSize {
            expected: 1,
            actual,
        }),
    }
}

/// Order-preserving deduplication.
pub fn distinct<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// A window of a larger result, with an indicator for further rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    /// The items inside the window, in result order.
    pub items: Vec<T>,
    /// Offset of the window start within the full result.
    pub offset: usize,
    /// Whether rows exist beyond this window.
    pub has_more: bool,
}

/// Apply an offset/limit window, probing one element past the limit to
/// report whether more rows exist.
pub fn slice<T>(items: impl IntoIterator<Item = T>, offset: usize, limit: usize) -> Slice<T> {
    let mut iter = items.into_iter().skip(offset);
    let mut window = Vec::with_capacity(limit);
    for item in iter.by_ref() {
        if window.len() == limit {
            return Slice {
                items: window,
                offset,
                has_more: true,
            };
        }
        window.push(item);
    }
    Slice {
        items: window,
        offset,
        has_more: false,
    }
}

/// A slice together with the total item count, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The windowed items.
    pub slice: Slice<T>,
    /// Total number of items across all pages, if the caller counted.
    pub total: Option<usize>,
}

impl<T> Page<T> {
    /// Wrap a slice without a total.
    pub fn from_slice(slice: Slice<T>) -> Self {
        Self { slice, total: None }
    }

    /// Attach the total count.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

/// Pull one scalar column out of a set of rows, in row order.
///
/// # Errors
///
/// [`GromError::IncorrectResultSize`] when a row lacks the column or the
/// column is not a scalar.
pub fn scalar_column(rows: &[ResultRow], column: &str) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        match row.get(column) {
            Some(RowValue::Scalar(value)) => out.push(value.clone()),
            Some(RowValue::Null) => out.push(Value::Null),
            _ => {
                return Err(GromError::IncorrectResultSize {
                    expected: rows.len(),
                    actual: out.len(),
                })
            }
        }
    }
    Ok(out)
}

/// Deserialize each row's scalar columns into a typed projection.
///
/// # Errors
///
/// [`GromError::Mapping`] when a row does not fit the projection type.
pub fn project<T: serde::de::DeserializeOwned>(rows: &[ResultRow]) -> Result<Vec<T>> {
    map_rows(rows)
        .into_iter()
        .map(|columns| {
            let value = serde_json::to_value(&columns).map_err(projection_error::<T>)?;
            serde_json::from_value(value).map_err(projection_error::<T>)
        })
        .collect()
}

fn projection_error<T>(err: serde_json::Error) -> GromError {
    GromError::Mapping(grom_core::MappingError::PropertyCodec {
        type_name: std::any::type_name::<T>().to_string(),
        property: "<projection>".to_string(),
        message: err.to_string(),
    })
}

/// Flatten rows into generic maps of their scalar columns.
pub fn map_rows(rows: &[ResultRow]) -> Vec<BTreeMap<String, Value>> {
    rows.iter()
        .map(|row| {
            row.iter()
                .filter_map(|(name, value)| match value {
                    RowValue::Scalar(v) => Some((name.to_string(), v.clone())),
                    RowValue::Null => Some((name.to_string(), Value::Null)),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single() {
        assert_eq!(single(vec![7]).unwrap(), 7);
        assert!(matches!(
            single(Vec::<i32>::new()),
            Err(GromError::IncorrectResultSize {
                expected: 1,
                actual: 0
            })
        ));
        assert!(matches!(
            single(vec![1, 2]),
            Err(GromError::IncorrectResultSize {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_optional_single() {
        assert_eq!(optional_single(Vec::<i32>::new()).unwrap(), None);
        assert_eq!(optional_single(vec![7]).unwrap(), Some(7));
        assert!(optional_single(vec![1, 2]).is_err());
    }

    #[test]
    fn test_distinct_preserves_order() {
        assert_eq!(distinct(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_slice_probe() {
        let s = slice(1..=10, 2, 3);
        assert_eq!(s.items, vec![3, 4, 5]);
        assert_eq!(s.offset, 2);
        assert!(s.has_more);

        let s = slice(1..=5, 2, 3);
        assert_eq!(s.items, vec![3, 4, 5]);
        assert!(!s.has_more);

        let s = slice(1..=2, 5, 3);
        assert!(s.items.is_empty());
        assert!(!s.has_more);
    }

    #[test]
    fn test_page() {
        let page = Page::from_slice(slice(1..=10, 0, 4)).with_total(10);
        assert_eq!(page.slice.items, vec![1, 2, 3, 4]);
        assert_eq!(page.total, Some(10));
    }

    #[test]
    fn test_scalar_column() {
        let rows = vec![
            ResultRow::new().with("count", RowValue::Scalar(Value::Int(3))),
            ResultRow::new().with("count", RowValue::Scalar(Value::Int(5))),
        ];
        assert_eq!(
            scalar_column(&rows, "count").unwrap(),
            vec![Value::Int(3), Value::Int(5)]
        );
        assert!(scalar_column(&rows, "missing").is_err());
    }

    #[test]
    fn test_project_into_typed_rows() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct NameAndAge {
            name: String,
            age: i64,
        }

        let rows = vec![ResultRow::new()
            .with("name", RowValue::Scalar(Value::from("Alice")))
            .with("age", RowValue::Scalar(Value::Int(30)))];
        let projected: Vec<NameAndAge> = project(&rows).unwrap();
        assert_eq!(
            projected,
            vec![NameAndAge {
                name: "Alice".to_string(),
                age: 30
            }]
        );

        let bad = vec![ResultRow::new().with("name", RowValue::Scalar(Value::Int(1)))];
        assert!(project::<NameAndAge>(&bad).is_err());
    }

    #[test]
    fn test_map_rows_skips_payload_columns() {
        let rows = vec![ResultRow::new()
            .with("name", RowValue::Scalar(Value::from("Alice")))
            .with(
                "n",
                RowValue::Node(grom_core::NodePayload::new(1i64, ["Person"])),
            )];
        let maps = map_rows(&rows);
        assert_eq!(maps.len(), 1);
        assert_eq!(maps[0].len(), 1);
        assert_eq!(maps[0].get("name"), Some(&Value::from("Alice")));
    }
}
