//! Default column filter predicate.

use crate::{CellValue, FilterValue};

/// Match a cell against a filter value.
///
/// * text filters are case-insensitive substring matches on scalar cells and case-insensitive
///   membership tests on list cells
/// * one-of filters accept a scalar cell equal to any of the values and a list cell sharing at
///   least one value
///
/// `Null` cells never match.
pub fn default_filter(cell: &CellValue, filter: &FilterValue) -> bool {
    match (cell, filter) {
        (CellValue::Null, _) => false,
        (CellValue::List(items), FilterValue::Text(query)) => {
            let query = query.trim().to_lowercase();
            items.iter().any(|item| item.to_lowercase() == query)
        }
        (CellValue::List(items), FilterValue::OneOf(values)) => {
            items.iter().any(|item| values.contains(item))
        }
        (scalar, FilterValue::Text(query)) => scalar
            .to_string()
            .to_lowercase()
            .contains(&query.trim().to_lowercase()),
        (scalar, FilterValue::OneOf(values)) => {
            let text = scalar.to_string();
            values.iter().any(|value| *value == text)
        }
    }
}
