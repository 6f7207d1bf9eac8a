//! Headless data tables.
//!
//! A screen owns one [`TableStateController`] (sorting, column filters, pagination) and one
//! [`DataTable`] (column descriptors, row identity, selection). On every render the table is fed
//! the full, unfiltered row slice and produces a [`TableView`] the UI layer paints:
//!
//! ```
//! use dashboard_table::{ColumnDescriptor, DataTable, FilterValue, TableBody, TableStateController};
//!
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! let rows = vec![
//!     User { id: "a".into(), name: "Alice".into() },
//!     User { id: "b".into(), name: "Bob".into() },
//! ];
//!
//! let mut table = DataTable::new(
//!     vec![ColumnDescriptor::new("name", |user: &User| user.name.clone()).header("Name")],
//!     |user: &User| user.id.clone(),
//! );
//! let mut state = TableStateController::with_page_size(1);
//! state.set_column_filter("name", Some(FilterValue::from("bob")));
//!
//! let view = table.render(&rows, &mut state);
//! assert_eq!(view.pagination.page_count, 1);
//! match view.body {
//!     TableBody::Rows(rows) => assert_eq!(rows[0].id, "b"),
//!     _ => unreachable!(),
//! }
//! ```

mod column;
pub use column::ColumnDescriptor;

mod data_table;
pub use data_table::{DataTable, HeaderCell, PaginationView, RenderedRow, TableBody, TableView};

mod error;
pub use error::{check_columns, RenderContractError};

pub mod filter;

mod model;
pub use model::RowModel;

pub mod options;
pub use options::{FilterOption, SelectOption, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_OPTIONS};

mod selection;
pub use selection::RowSelection;

pub mod sort;

mod state;
pub use state::{
    page_count, FilterSpec, OrderingSpec, Pagination, SortDirection, TableState,
    TableStateController,
};

mod value;
pub use value::{CellValue, FilterValue};
