use std::fmt;

use crate::options::DEFAULT_PAGE_SIZE;
use crate::FilterValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the ordering list. The first entry has the highest precedence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderingSpec {
    pub column_id: String,
    pub direction: SortDirection,
}

impl OrderingSpec {
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column_id: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// An active filter. There is at most one per column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterSpec {
    pub column_id: String,
    pub value: FilterValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// The view state of one table instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableState {
    pub sorting: Vec<OrderingSpec>,
    pub column_filters: Vec<FilterSpec>,
    pub pagination: Pagination,
}

impl TableState {
    /// The active filter value of a column.
    pub fn filter(&self, column_id: &str) -> Option<&FilterValue> {
        self.column_filters
            .iter()
            .find(|filter| filter.column_id == column_id)
            .map(|filter| &filter.value)
    }

    /// The sort direction of a column, `None` if it is unsorted.
    pub fn sort_direction(&self, column_id: &str) -> Option<SortDirection> {
        self.sorting
            .iter()
            .find(|spec| spec.column_id == column_id)
            .map(|spec| spec.direction)
    }

    /// Precedence of a column in the ordering list, `0` being the highest.
    pub fn sort_position(&self, column_id: &str) -> Option<usize> {
        self.sorting
            .iter()
            .position(|spec| spec.column_id == column_id)
    }
}

/// Number of pages needed for `rows` rows.
pub fn page_count(rows: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    rows.div_ceil(page_size)
}

/// Owns the [`TableState`] of one table and keeps it consistent.
///
/// Every filter or sorting change goes back to the first page. Once the table reported how many
/// rows survive filtering (see [`reconcile`](Self::reconcile)), the page index is kept inside
/// `0..page_count` (or `0` without rows) across all later changes.
#[derive(Clone, Debug, Default)]
pub struct TableStateController {
    state: TableState,
    row_count: Option<usize>,
}

impl TableStateController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(page_size: usize) -> Self {
        let mut this = Self::new();
        this.state.pagination.page_size = page_size.max(1);
        this
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn pagination(&self) -> Pagination {
        self.state.pagination
    }

    /// Row count after filtering as last reported by [`reconcile`](Self::reconcile).
    pub fn row_count(&self) -> Option<usize> {
        self.row_count
    }

    /// Set or replace the filter of a column, `None` or an empty value removes it.
    pub fn set_column_filter(&mut self, column_id: &str, value: Option<FilterValue>) {
        let value = value.filter(|value| !value.is_empty());
        let position = self
            .state
            .column_filters
            .iter()
            .position(|filter| filter.column_id == column_id);

        match (position, value) {
            (Some(index), Some(value)) => self.state.column_filters[index].value = value,
            (Some(index), None) => {
                self.state.column_filters.remove(index);
            }
            (None, Some(value)) => self.state.column_filters.push(FilterSpec {
                column_id: column_id.to_string(),
                value,
            }),
            (None, None) => (),
        }

        self.reset_page();
    }

    /// Remove all column filters.
    pub fn clear_filters(&mut self) {
        self.state.column_filters.clear();
        self.reset_page();
    }

    /// Replace the whole ordering list.
    ///
    /// Later entries for an already listed column are dropped.
    pub fn set_sorting(&mut self, sorting: Vec<OrderingSpec>) {
        let mut deduplicated: Vec<OrderingSpec> = Vec::with_capacity(sorting.len());
        for spec in sorting {
            if !deduplicated
                .iter()
                .any(|existing| existing.column_id == spec.column_id)
            {
                deduplicated.push(spec);
            }
        }
        self.state.sorting = deduplicated;
        self.reset_page();
    }

    /// Cycle a column through `unsorted -> asc -> desc -> unsorted`.
    ///
    /// Without `multi` the column becomes the only sort key, with `multi` the other entries of
    /// the ordering list are kept.
    pub fn toggle_sorting(&mut self, column_id: &str, multi: bool) {
        let next = match self.state.sort_direction(column_id) {
            None => Some(SortDirection::Asc),
            Some(SortDirection::Asc) => Some(SortDirection::Desc),
            Some(SortDirection::Desc) => None,
        };

        let mut sorting = if multi {
            self.state.sorting.clone()
        } else {
            Vec::new()
        };

        let position = sorting.iter().position(|spec| spec.column_id == column_id);
        match (position, next) {
            (Some(index), Some(direction)) => sorting[index].direction = direction,
            (Some(index), None) => {
                sorting.remove(index);
            }
            (None, Some(direction)) => sorting.push(OrderingSpec {
                column_id: column_id.to_string(),
                direction,
            }),
            (None, None) => (),
        }

        self.set_sorting(sorting);
    }

    pub fn clear_sorting(&mut self) {
        self.set_sorting(Vec::new());
    }

    /// Direct assignment, a page size of `0` is treated as `1`.
    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.state.pagination = Pagination {
            page_index: pagination.page_index,
            page_size: pagination.page_size.max(1),
        };
        self.clamp();
    }

    pub fn set_page_index(&mut self, page_index: usize) {
        self.set_pagination(Pagination {
            page_index,
            ..self.state.pagination
        });
    }

    /// Change the page size, keeping the first row of the current page visible.
    pub fn set_page_size(&mut self, page_size: usize) {
        let page_size = page_size.max(1);
        let Pagination {
            page_index,
            page_size: old_size,
        } = self.state.pagination;
        // the index is unbounded until the first `reconcile`
        let first_row = page_index.saturating_mul(old_size);

        self.set_pagination(Pagination {
            page_index: first_row / page_size,
            page_size,
        });
    }

    /// Number of pages for the last reported row count, `None` before the first report.
    pub fn page_count(&self) -> Option<usize> {
        self.row_count
            .map(|rows| page_count(rows, self.state.pagination.page_size))
    }

    pub fn can_previous_page(&self) -> bool {
        self.state.pagination.page_index > 0
    }

    pub fn can_next_page(&self) -> bool {
        match self.page_count() {
            Some(count) => self.state.pagination.page_index + 1 < count,
            None => false,
        }
    }

    pub fn next_page(&mut self) {
        if self.can_next_page() {
            self.set_page_index(self.state.pagination.page_index + 1);
        }
    }

    pub fn previous_page(&mut self) {
        if self.can_previous_page() {
            self.set_page_index(self.state.pagination.page_index - 1);
        }
    }

    pub fn first_page(&mut self) {
        self.set_page_index(0);
    }

    pub fn last_page(&mut self) {
        if let Some(count) = self.page_count() {
            self.set_page_index(count.saturating_sub(1));
        }
    }

    /// Report the number of rows left after filtering and fix up the page index.
    ///
    /// Must be called whenever the data or the filtered subset may have changed. Returns `true`
    /// if the page index had to be corrected.
    pub fn reconcile(&mut self, filtered_rows: usize) -> bool {
        self.row_count = Some(filtered_rows);
        self.clamp()
    }

    fn reset_page(&mut self) {
        self.state.pagination.page_index = 0;
    }

    fn clamp(&mut self) -> bool {
        let Some(count) = self.page_count() else {
            return false;
        };

        let last = count.saturating_sub(1);
        let page_index = self.state.pagination.page_index;
        if page_index > last {
            tracing::trace!("page index {page_index} out of range, moving to page {last}");
            self.state.pagination.page_index = last;
            return true;
        }
        false
    }
}
