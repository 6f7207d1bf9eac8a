use std::fmt;

use crate::filter::default_filter;
use crate::{CellValue, FilterValue};

type Accessor<T> = Box<dyn Fn(&T) -> CellValue>;
type CellRenderer<T> = Box<dyn Fn(&T) -> String>;
type FilterFn = Box<dyn Fn(&CellValue, &FilterValue) -> bool>;

/// How one column derives its header and cells from a row of type `T`.
///
/// Columns are filterable and sortable by default. The descriptor list of a table is fixed for
/// its lifetime.
pub struct ColumnDescriptor<T> {
    id: String,
    header: String,
    accessor: Accessor<T>,
    cell: Option<CellRenderer<T>>,
    filterable: bool,
    filter_fn: Option<FilterFn>,
    sortable: bool,
}

impl<T> ColumnDescriptor<T> {
    /// A data column reading its value through `accessor`. The header defaults to the id.
    pub fn new<F, V>(id: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T) -> V + 'static,
        V: Into<CellValue>,
    {
        let id = id.into();
        Self {
            header: id.clone(),
            id,
            accessor: Box::new(move |row| accessor(row).into()),
            cell: None,
            filterable: true,
            filter_fn: None,
            sortable: true,
        }
    }

    /// A column without a value, e.g. row actions. Never filtered or sorted.
    pub fn display<F>(id: impl Into<String>, cell: F) -> Self
    where
        F: Fn(&T) -> String + 'static,
    {
        let id = id.into();
        Self {
            header: String::new(),
            id,
            accessor: Box::new(|_| CellValue::Null),
            cell: Some(Box::new(cell)),
            filterable: false,
            filter_fn: None,
            sortable: false,
        }
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Custom cell rendering, the default is the [`CellValue`]'s display form.
    pub fn cell<F>(mut self, cell: F) -> Self
    where
        F: Fn(&T) -> String + 'static,
    {
        self.cell = Some(Box::new(cell));
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    /// Replace the default filter predicate. Implies `filterable(true)`.
    pub fn filter_fn<F>(mut self, filter_fn: F) -> Self
    where
        F: Fn(&CellValue, &FilterValue) -> bool + 'static,
    {
        self.filter_fn = Some(Box::new(filter_fn));
        self.filterable = true;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.header
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn value(&self, row: &T) -> CellValue {
        (self.accessor)(row)
    }

    pub fn render_cell(&self, row: &T) -> String {
        match &self.cell {
            Some(cell) => cell(row),
            None => self.value(row).to_string(),
        }
    }

    /// Whether `row` passes `filter` on this column.
    pub fn matches(&self, row: &T, filter: &FilterValue) -> bool {
        let value = self.value(row);
        match &self.filter_fn {
            Some(filter_fn) => filter_fn(&value, filter),
            None => default_filter(&value, filter),
        }
    }
}

impl<T> fmt::Debug for ColumnDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("filterable", &self.filterable)
            .field("sortable", &self.sortable)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Article {
        title: String,
        tags: Vec<String>,
        views: Option<u32>,
    }

    fn article() -> Article {
        Article {
            title: "Getting started".into(),
            tags: vec!["rust".into(), "intro".into()],
            views: None,
        }
    }

    #[test]
    fn values_and_cells() {
        let title = ColumnDescriptor::new("title", |a: &Article| a.title.clone()).header("Title");
        assert_eq!(title.label(), "Title");
        assert_eq!(title.render_cell(&article()), "Getting started");

        let views = ColumnDescriptor::new("views", |a: &Article| a.views);
        assert!(views.value(&article()).is_null());
        assert_eq!(views.label(), "views");

        let tags = ColumnDescriptor::new("tags", |a: &Article| a.tags.clone())
            .cell(|a: &Article| format!("{} tags", a.tags.len()));
        assert_eq!(tags.render_cell(&article()), "2 tags");
        assert!(tags.matches(&article(), &FilterValue::from(vec!["rust"])));
    }

    #[test]
    fn custom_filter() {
        let title = ColumnDescriptor::new("title", |a: &Article| a.title.clone())
            .filterable(false)
            .filter_fn(|value, filter| match filter {
                FilterValue::Text(prefix) => value.to_string().starts_with(prefix.as_str()),
                FilterValue::OneOf(_) => false,
            });
        assert!(title.is_filterable());
        assert!(title.matches(&article(), &"Getting".into()));
        assert!(!title.matches(&article(), &"started".into()));
    }

    #[test]
    fn display_column() {
        let actions = ColumnDescriptor::display("actions", |a: &Article| format!("edit {}", a.title));
        assert!(!actions.is_filterable());
        assert!(!actions.is_sortable());
        assert_eq!(actions.render_cell(&article()), "edit Getting started");
    }
}
