use std::ops::Range;

use crate::sort::compare;
use crate::{CellValue, ColumnDescriptor, Pagination, SortDirection, TableState};

/// Filtered and sorted view over a row slice, as row indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowModel {
    total: usize,
    rows: Vec<usize>,
}

impl RowModel {
    /// Apply `state`'s filters and sorting to all of `rows`.
    pub fn build<T>(rows: &[T], columns: &[ColumnDescriptor<T>], state: &TableState) -> Self {
        Self::from_indices(rows, 0..rows.len(), columns, state)
    }

    /// Like [`build`](Self::build), restricted to the given row indices.
    ///
    /// Filters and sort keys naming unknown columns are ignored.
    pub fn from_indices<T, I>(
        rows: &[T],
        indices: I,
        columns: &[ColumnDescriptor<T>],
        state: &TableState,
    ) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let find = |id: &str| columns.iter().find(|column| column.id() == id);

        let filters: Vec<_> = state
            .column_filters
            .iter()
            .filter_map(|filter| find(&filter.column_id).map(|column| (column, &filter.value)))
            .collect();

        let candidates: Vec<usize> = indices.into_iter().collect();
        let total = candidates.len();

        let mut filtered: Vec<usize> = candidates
            .into_iter()
            .filter(|index| {
                let row = &rows[*index];
                filters.iter().all(|(column, value)| column.matches(row, value))
            })
            .collect();

        let sort_keys: Vec<(&ColumnDescriptor<T>, SortDirection)> = state
            .sorting
            .iter()
            .filter_map(|spec| find(&spec.column_id).map(|column| (column, spec.direction)))
            .collect();

        if !sort_keys.is_empty() {
            let mut keyed: Vec<(usize, Vec<CellValue>)> = filtered
                .into_iter()
                .map(|index| {
                    let row = &rows[index];
                    let key = sort_keys.iter().map(|(column, _)| column.value(row)).collect();
                    (index, key)
                })
                .collect();

            // stable, so the incoming order breaks remaining ties
            keyed.sort_by(|(_, a), (_, b)| {
                sort_keys
                    .iter()
                    .zip(a.iter().zip(b.iter()))
                    .map(|((_, direction), (a, b))| compare(a, b, *direction))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            filtered = keyed.into_iter().map(|(index, _)| index).collect();
        }

        Self {
            total,
            rows: filtered,
        }
    }

    /// Number of rows before filtering.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of rows left after filtering.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All filtered row indices in display order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// The row indices shown on the page described by `pagination`.
    pub fn page(&self, pagination: Pagination) -> &[usize] {
        &self.rows[self.page_range(pagination)]
    }

    fn page_range(&self, pagination: Pagination) -> Range<usize> {
        let size = pagination.page_size.max(1);
        let start = pagination.page_index.saturating_mul(size).min(self.rows.len());
        let end = start.saturating_add(size).min(self.rows.len());
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterValue, OrderingSpec, TableStateController};

    struct Course {
        title: &'static str,
        category: &'static str,
        price: Option<u32>,
    }

    fn courses() -> Vec<Course> {
        vec![
            Course { title: "Rust", category: "code", price: Some(30) },
            Course { title: "Figma", category: "design", price: None },
            Course { title: "Go", category: "code", price: Some(10) },
            Course { title: "Color", category: "design", price: Some(30) },
        ]
    }

    fn columns() -> Vec<ColumnDescriptor<Course>> {
        vec![
            ColumnDescriptor::new("title", |c: &Course| c.title),
            ColumnDescriptor::new("category", |c: &Course| c.category),
            ColumnDescriptor::new("price", |c: &Course| c.price),
        ]
    }

    fn titles(model: &RowModel, rows: &[Course]) -> Vec<&'static str> {
        model.rows().iter().map(|index| rows[*index].title).collect()
    }

    #[test]
    fn filter_then_sort() {
        let rows = courses();
        let mut controller = TableStateController::new();
        controller.set_column_filter("category", Some(FilterValue::from(vec!["code"])));
        controller.toggle_sorting("price", false);

        let model = RowModel::build(&rows, &columns(), controller.state());
        assert_eq!(model.total(), 4);
        assert_eq!(titles(&model, &rows), vec!["Go", "Rust"]);
    }

    #[test]
    fn multi_column_sort_falls_through() {
        let rows = courses();
        let mut controller = TableStateController::new();
        controller.set_sorting(vec![OrderingSpec::desc("price"), OrderingSpec::asc("title")]);

        let model = RowModel::build(&rows, &columns(), controller.state());
        // nulls last even when descending
        assert_eq!(titles(&model, &rows), vec!["Color", "Rust", "Go", "Figma"]);
    }

    #[test]
    fn sort_is_stable() {
        let rows = courses();
        let mut controller = TableStateController::new();
        controller.toggle_sorting("category", false);

        let model = RowModel::build(&rows, &columns(), controller.state());
        assert_eq!(titles(&model, &rows), vec!["Rust", "Go", "Figma", "Color"]);
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let rows = courses();
        let mut controller = TableStateController::new();
        controller.set_column_filter("missing", Some("x".into()));
        controller.toggle_sorting("missing", false);

        let model = RowModel::build(&rows, &columns(), controller.state());
        assert_eq!(model.len(), 4);
    }

    #[test]
    fn page_slices() {
        let rows = courses();
        let model = RowModel::build(&rows, &columns(), &TableState::default());

        let page = |page_index, page_size| model.page(Pagination { page_index, page_size }).to_vec();
        assert_eq!(page(0, 3), vec![0, 1, 2]);
        assert_eq!(page(1, 3), vec![3]);
        assert_eq!(page(2, 3), Vec::<usize>::new());
        assert_eq!(page(0, 0), vec![0]);
    }
}
