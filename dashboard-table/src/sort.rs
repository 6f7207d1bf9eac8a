//! Default cell comparator.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::{CellValue, SortDirection};

static ISO_8601_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$")
        .unwrap()
});

/// Whether `text` looks like an ISO-8601 date or timestamp.
pub fn is_iso_date(text: &str) -> bool {
    ISO_8601_REGEX.is_match(text)
}

/// Compare two cells for one sort key.
///
/// `Null` sorts last in both directions, everything else is ordered by [`compare_cells`] and
/// reversed for [`SortDirection::Desc`].
pub fn compare(a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = compare_cells(a, b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

/// Ascending natural order of two cells.
///
/// Numbers compare numerically, ISO-8601 strings lexically (which is chronological for
/// timestamps with the same offset), other strings case-insensitively with a case-sensitive
/// tiebreak. Mixed kinds order as numbers, booleans, text, lists.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
        (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
        (CellValue::Text(a), CellValue::Text(b)) => compare_text(a, b),
        (CellValue::List(a), CellValue::List(b)) => compare_text(&a.join(", "), &b.join(", ")),
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    if is_iso_date(a) && is_iso_date(b) {
        return a.cmp(b);
    }
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn rank(value: &CellValue) -> u8 {
    match value {
        CellValue::Number(_) => 0,
        CellValue::Bool(_) => 1,
        CellValue::Text(_) => 2,
        CellValue::List(_) => 3,
        CellValue::Null => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_dates() {
        assert!(is_iso_date("2024-02-01"));
        assert!(is_iso_date("2024-02-01T10:00:00Z"));
        assert!(is_iso_date("2024-02-01 10:00:00.123+07:00"));
        assert!(!is_iso_date("01.02.2024"));
        assert!(!is_iso_date("2024-2-1"));

        assert_eq!(
            compare_cells(&"2023-12-31T23:59:59Z".into(), &"2024-01-01T00:00:00Z".into()),
            Ordering::Less
        );
    }

    #[test]
    fn numbers_are_numeric() {
        assert_eq!(compare_cells(&9.into(), &10.into()), Ordering::Less);
        assert_eq!(compare_cells(&"9".into(), &"10".into()), Ordering::Greater);
    }

    #[test]
    fn text_is_case_insensitive() {
        assert_eq!(compare_cells(&"apple".into(), &"Banana".into()), Ordering::Less);
        assert_eq!(compare_cells(&"Apple".into(), &"apple".into()), Ordering::Less);
        assert_eq!(compare_cells(&"x".into(), &"x".into()), Ordering::Equal);
    }

    #[test]
    fn nulls_last_in_both_directions() {
        let null = CellValue::Null;
        let one = CellValue::from(1);
        assert_eq!(compare(&null, &one, SortDirection::Asc), Ordering::Greater);
        assert_eq!(compare(&null, &one, SortDirection::Desc), Ordering::Greater);
        assert_eq!(compare(&one, &2.into(), SortDirection::Desc), Ordering::Greater);
    }
}
