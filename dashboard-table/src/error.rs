use std::collections::HashSet;

use crate::ColumnDescriptor;

/// A caller broke a precondition of [`DataTable`](crate::DataTable).
///
/// These are programming errors. Debug builds panic on the collisions, release builds keep the
/// last column or row carrying the id.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum RenderContractError {
    #[error("duplicate column id '{0}'")]
    DuplicateColumnId(String),
    #[error("duplicate row id '{0}'")]
    DuplicateRowId(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{0}' is not filterable")]
    NotFilterable(String),
    #[error("column '{0}' is not sortable")]
    NotSortable(String),
}

/// Check that all column ids are unique.
pub fn check_columns<T>(columns: &[ColumnDescriptor<T>]) -> Result<(), RenderContractError> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.id()) {
            return Err(RenderContractError::DuplicateColumnId(
                column.id().to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_columns() {
        let columns = vec![
            ColumnDescriptor::new("name", |row: &(String, u32)| row.0.clone()),
            ColumnDescriptor::new("age", |row: &(String, u32)| row.1),
        ];
        assert_eq!(check_columns(&columns), Ok(()));

        let columns = vec![
            ColumnDescriptor::new("name", |row: &(String, u32)| row.0.clone()),
            ColumnDescriptor::new("name", |row: &(String, u32)| row.1),
        ];
        let err = check_columns(&columns).unwrap_err();
        assert_eq!(err.to_string(), "duplicate column id 'name'");
    }
}
