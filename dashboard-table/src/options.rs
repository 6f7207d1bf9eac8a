//! Option lists for filter and select inputs.

use std::collections::BTreeMap;

use crate::ColumnDescriptor;

pub const DEFAULT_PAGE_SIZE: usize = 10;

pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 5] = [10, 20, 30, 40, 50];

/// One entry of a faceted filter, `count` is the number of rows carrying the value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Distinct values of a column over `rows`, sorted by value.
///
/// List cells contribute each of their elements, `Null` cells nothing.
pub fn faceted_options<T>(rows: &[T], column: &ColumnDescriptor<T>) -> Vec<FilterOption> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        let mut items = column.value(row).items();
        items.sort();
        items.dedup();
        for item in items {
            *counts.entry(item).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(value, count)| FilterOption {
            label: value.clone(),
            value,
            count,
        })
        .collect()
}

/// Map arbitrary items to select options, keeping their order.
pub fn options_from<I, V, L>(items: I, value_fn: V, label_fn: L) -> Vec<SelectOption>
where
    I: IntoIterator,
    V: Fn(&I::Item) -> String,
    L: Fn(&I::Item) -> String,
{
    items
        .into_iter()
        .map(|item| SelectOption {
            value: value_fn(&item),
            label: label_fn(&item),
        })
        .collect()
}

/// Page size choices for a selector: `custom` (or the defaults if empty), always including the
/// `current` size, sorted and without duplicates.
pub fn page_size_options(custom: &[usize], current: usize) -> Vec<usize> {
    let mut options = if custom.is_empty() {
        DEFAULT_PAGE_SIZE_OPTIONS.to_vec()
    } else {
        custom.to_vec()
    };
    options.push(current);
    options.retain(|size| *size > 0);
    options.sort_unstable();
    options.dedup();
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Course {
        category: &'static str,
        tags: Vec<&'static str>,
    }

    #[test]
    fn facets_count_rows() {
        let rows = vec![
            Course {
                category: "design",
                tags: vec!["ui", "ux", "ui"],
            },
            Course {
                category: "code",
                tags: vec!["rust"],
            },
            Course {
                category: "design",
                tags: vec![],
            },
        ];

        let category = ColumnDescriptor::new("category", |c: &Course| c.category);
        let options = faceted_options(&rows, &category);
        assert_eq!(
            options,
            vec![
                FilterOption {
                    value: "code".into(),
                    label: "code".into(),
                    count: 1
                },
                FilterOption {
                    value: "design".into(),
                    label: "design".into(),
                    count: 2
                },
            ]
        );

        let tags = ColumnDescriptor::new("tags", |c: &Course| c.tags.clone());
        let counts: Vec<(String, usize)> = faceted_options(&rows, &tags)
            .into_iter()
            .map(|option| (option.value, option.count))
            .collect();
        assert_eq!(
            counts,
            vec![("rust".into(), 1), ("ui".into(), 1), ("ux".into(), 1)]
        );
    }

    #[test]
    fn select_options_keep_order() {
        let options = options_from(
            vec![(2, "Batch B"), (1, "Batch A")],
            |(id, _)| id.to_string(),
            |(_, name)| name.to_string(),
        );
        assert_eq!(options[0].value, "2");
        assert_eq!(options[1].label, "Batch A");
    }

    #[test]
    fn page_sizes_include_current() {
        assert_eq!(page_size_options(&[], 10), vec![10, 20, 30, 40, 50]);
        assert_eq!(page_size_options(&[], 25), vec![10, 20, 25, 30, 40, 50]);
        assert_eq!(page_size_options(&[50, 5, 5], 7), vec![5, 7, 50]);
    }
}
