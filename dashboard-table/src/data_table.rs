use std::collections::{HashMap, HashSet};

use crate::options::page_size_options;
use crate::{
    check_columns, ColumnDescriptor, FilterValue, RenderContractError, RowModel, RowSelection,
    SortDirection, TableStateController,
};

const DEFAULT_EMPTY_MESSAGE: &str = "No results.";

/// Column header as shown above the rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderCell {
    pub id: String,
    pub label: String,
    pub sortable: bool,
    pub sorted: Option<SortDirection>,
    /// Precedence in a multi column sort, `0` is the primary key.
    pub sort_position: Option<usize>,
    pub filtered: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRow {
    pub id: String,
    pub selected: bool,
    pub cells: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableBody {
    /// Placeholder rows while data is loading.
    Skeleton { rows: usize, columns: usize },
    /// A single row spanning all columns, nothing matched the filters.
    Empty { colspan: usize, message: String },
    Rows(Vec<RenderedRow>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationView {
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub selected_rows: usize,
    pub can_previous: bool,
    pub can_next: bool,
}

/// Everything a UI layer needs to paint one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<HeaderCell>,
    pub body: TableBody,
    pub pagination: PaginationView,
}

impl TableView {
    /// Number of data rows, placeholders do not count.
    pub fn row_count(&self) -> usize {
        match &self.body {
            TableBody::Rows(rows) => rows.len(),
            _ => 0,
        }
    }
}

/// A table binding rows of type `T` to column descriptors and a [`TableStateController`].
///
/// The table owns the row selection, the state controller is owned by the caller and passed to
/// every [`render`](Self::render).
pub struct DataTable<T> {
    columns: Vec<ColumnDescriptor<T>>,
    get_row_id: Box<dyn Fn(&T) -> String>,
    page_size_options: Vec<usize>,
    empty_message: String,
    skeleton_rows: Option<usize>,
    loading: bool,
    selection: RowSelection,
    known_ids: Option<HashSet<String>>,
    page_ids: Vec<String>,
}

impl<T> DataTable<T> {
    /// Create a table for the given columns. `get_row_id` must be unique over the rows.
    ///
    /// Duplicate column ids panic in debug builds, release builds keep the last one.
    pub fn new<F>(columns: Vec<ColumnDescriptor<T>>, get_row_id: F) -> Self
    where
        F: Fn(&T) -> String + 'static,
    {
        Self {
            columns: dedup_columns(columns),
            get_row_id: Box::new(get_row_id),
            page_size_options: Vec::new(),
            empty_message: DEFAULT_EMPTY_MESSAGE.to_string(),
            skeleton_rows: None,
            loading: false,
            selection: RowSelection::new(),
            known_ids: None,
            page_ids: Vec::new(),
        }
    }

    /// Custom page size choices, the current size is always added.
    pub fn page_size_options(mut self, options: Vec<usize>) -> Self {
        self.page_size_options = options;
        self
    }

    pub fn empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = message.into();
        self
    }

    /// Number of skeleton rows while loading, defaults to the page size.
    pub fn skeleton_rows(mut self, rows: usize) -> Self {
        self.skeleton_rows = Some(rows);
        self
    }

    pub fn columns(&self) -> &[ColumnDescriptor<T>] {
        &self.columns
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDescriptor<T>> {
        self.columns.iter().find(|column| column.id() == id)
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Toggle the sorting of a sortable column, see [`TableStateController::toggle_sorting`].
    pub fn toggle_sorting(
        &self,
        state: &mut TableStateController,
        column_id: &str,
        multi: bool,
    ) -> Result<(), RenderContractError> {
        let column = self
            .column(column_id)
            .ok_or_else(|| RenderContractError::UnknownColumn(column_id.to_string()))?;
        if !column.is_sortable() {
            return Err(RenderContractError::NotSortable(column_id.to_string()));
        }
        state.toggle_sorting(column_id, multi);
        Ok(())
    }

    /// Set the filter of a filterable column, see [`TableStateController::set_column_filter`].
    pub fn set_column_filter(
        &self,
        state: &mut TableStateController,
        column_id: &str,
        value: Option<FilterValue>,
    ) -> Result<(), RenderContractError> {
        let column = self
            .column(column_id)
            .ok_or_else(|| RenderContractError::UnknownColumn(column_id.to_string()))?;
        if !column.is_filterable() {
            return Err(RenderContractError::NotFilterable(column_id.to_string()));
        }
        state.set_column_filter(column_id, value);
        Ok(())
    }

    /// Select or deselect a row. Ids not seen in the last render are ignored.
    pub fn select_row(&mut self, id: &str, selected: bool) -> bool {
        if !self.is_known(id) {
            return false;
        }
        self.selection.set(id, selected);
        true
    }

    /// Flip the selection of a row, returns the new state.
    pub fn toggle_row(&mut self, id: &str) -> bool {
        if !self.is_known(id) {
            return false;
        }
        self.selection.toggle(id)
    }

    /// Select or deselect all rows of the page shown by the last render.
    pub fn select_all_on_page(&mut self, selected: bool) {
        for id in &self.page_ids {
            self.selection.set(id, selected);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids().map(str::to_string).collect()
    }

    /// The selected rows out of `rows`, in their original order.
    pub fn selected_rows<'r>(&self, rows: &'r [T]) -> Vec<&'r T> {
        rows.iter()
            .filter(|row| self.selection.is_selected(&(self.get_row_id)(*row)))
            .collect()
    }

    fn is_known(&self, id: &str) -> bool {
        match &self.known_ids {
            Some(ids) => ids.contains(id),
            None => true,
        }
    }

    /// Produce the view of `rows` (the full, unfiltered data) for the current state.
    ///
    /// Reports the filtered row count to `state`, so an out of range page index is corrected
    /// before the page is sliced. Selected ids no longer present in `rows` are dropped.
    pub fn render(&mut self, rows: &[T], state: &mut TableStateController) -> TableView {
        let ids: Vec<String> = rows.iter().map(|row| (self.get_row_id)(row)).collect();
        let unique = unique_rows(&ids);

        let known: HashSet<String> = unique.iter().map(|index| ids[*index].clone()).collect();
        let dropped = self.selection.retain_present(|id| known.contains(id));
        if dropped > 0 {
            tracing::trace!("dropped {dropped} selected rows no longer present");
        }
        self.known_ids = Some(known);

        let model = RowModel::from_indices(rows, unique.iter().copied(), &self.columns, state.state());
        if state.reconcile(model.len()) {
            tracing::trace!("page index corrected for {} rows", model.len());
        }
        let pagination = state.pagination();

        let page = model.page(pagination);
        self.page_ids = page.iter().map(|index| ids[*index].clone()).collect();

        let body = if self.loading {
            TableBody::Skeleton {
                rows: self.skeleton_rows.unwrap_or(pagination.page_size),
                columns: self.columns.len(),
            }
        } else if page.is_empty() {
            TableBody::Empty {
                colspan: self.columns.len(),
                message: self.empty_message.clone(),
            }
        } else {
            TableBody::Rows(
                page.iter()
                    .map(|index| {
                        let row = &rows[*index];
                        let id = ids[*index].clone();
                        RenderedRow {
                            selected: self.selection.is_selected(&id),
                            id,
                            cells: self
                                .columns
                                .iter()
                                .map(|column| column.render_cell(row))
                                .collect(),
                        }
                    })
                    .collect(),
            )
        };

        let table_state = state.state();
        let headers = self
            .columns
            .iter()
            .map(|column| HeaderCell {
                id: column.id().to_string(),
                label: column.label().to_string(),
                sortable: column.is_sortable(),
                sorted: table_state.sort_direction(column.id()),
                sort_position: table_state.sort_position(column.id()),
                filtered: table_state.filter(column.id()).is_some(),
            })
            .collect();

        TableView {
            headers,
            body,
            pagination: PaginationView {
                page_index: pagination.page_index,
                page_count: state.page_count().unwrap_or(0),
                page_size: pagination.page_size,
                page_size_options: page_size_options(&self.page_size_options, pagination.page_size),
                total_rows: model.total(),
                filtered_rows: model.len(),
                selected_rows: self.selection.len(),
                can_previous: state.can_previous_page(),
                can_next: state.can_next_page(),
            },
        }
    }
}

fn dedup_columns<T>(columns: Vec<ColumnDescriptor<T>>) -> Vec<ColumnDescriptor<T>> {
    match check_columns(&columns) {
        Ok(()) => return columns,
        Err(err) => contract_violation(&err),
    }

    let last: HashMap<String, usize> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| (column.id().to_string(), index))
        .collect();

    columns
        .into_iter()
        .enumerate()
        .filter(|(index, column)| last.get(column.id()) == Some(index))
        .map(|(_, column)| column)
        .collect()
}

/// Indices of the rows to show, the last row wins on an id collision.
fn unique_rows(ids: &[String]) -> Vec<usize> {
    let mut last: HashMap<&str, usize> = HashMap::with_capacity(ids.len());
    let mut duplicate = None;
    for (index, id) in ids.iter().enumerate() {
        if last.insert(id.as_str(), index).is_some() && duplicate.is_none() {
            duplicate = Some(id);
        }
    }

    if let Some(id) = duplicate {
        contract_violation(&RenderContractError::DuplicateRowId(id.to_string()));
    }

    (0..ids.len())
        .filter(|index| last.get(ids[*index].as_str()) == Some(index))
        .collect()
}

fn contract_violation(err: &RenderContractError) {
    if cfg!(debug_assertions) {
        panic!("data table contract violated: {err}");
    }
    tracing::warn!("data table contract violated: {err}");
}
