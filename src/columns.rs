use std::collections::HashMap;

use crate::error::DbLibError;
use crate::identifier::{IndexOrName, fold_name};

/// Column metadata of the statement that owns a [`ColumnsHelper`].
pub trait ColumnSource {
    /// # Errors
    /// Returns an error when the statement has no column metadata in its current state.
    fn columns_count(&self) -> Result<usize, DbLibError>;

    /// Name of the 1-based column `index`.
    ///
    /// # Errors
    /// Returns an error when `index` is out of range or metadata is unavailable.
    fn column_name(&self, index: usize) -> Result<String, DbLibError>;
}

impl ColumnSource for [String] {
    fn columns_count(&self) -> Result<usize, DbLibError> {
        Ok(self.len())
    }

    fn column_name(&self, index: usize) -> Result<String, DbLibError> {
        index
            .checked_sub(1)
            .and_then(|i| self.get(i))
            .cloned()
            .ok_or_else(|| DbLibError::ColumnNotFound(index.to_string()))
    }
}

impl ColumnSource for Vec<String> {
    fn columns_count(&self) -> Result<usize, DbLibError> {
        self.as_slice().columns_count()
    }

    fn column_name(&self, index: usize) -> Result<String, DbLibError> {
        self.as_slice().column_name(index)
    }
}

/// Lazily built, case-insensitive column name to ordinal map.
#[derive(Debug, Clone, Default)]
pub struct ColumnsHelper {
    names: Option<HashMap<String, usize>>,
}

impl ColumnsHelper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `column` to a 1-based ordinal.
    ///
    /// Ordinals pass through unchecked. The name map is read from `source` on the first name
    /// lookup after construction or [`ColumnsHelper::clear`]; a later duplicate name wins.
    ///
    /// # Errors
    /// Returns `DbLibError::ColumnNotFound` for an unknown name, or any error from `source`.
    pub fn get_column_index<S>(
        &mut self,
        column: &IndexOrName,
        source: &S,
    ) -> Result<usize, DbLibError>
    where
        S: ColumnSource + ?Sized,
    {
        let name = match column {
            IndexOrName::Index(i) => return Ok(*i),
            IndexOrName::Name(name) => name,
        };
        if self.names.is_none() {
            self.names = Some(Self::build(source)?);
        }
        self.names
            .as_ref()
            .and_then(|names| names.get(&fold_name(name)))
            .copied()
            .ok_or_else(|| DbLibError::ColumnNotFound(name.clone()))
    }

    fn build<S>(source: &S) -> Result<HashMap<String, usize>, DbLibError>
    where
        S: ColumnSource + ?Sized,
    {
        let count = source.columns_count()?;
        let mut names = HashMap::with_capacity(count);
        for index in 1..=count {
            names.insert(fold_name(&source.column_name(index)?), index);
        }
        Ok(names)
    }

    pub fn clear(&mut self) {
        self.names = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct CountingSource {
        names: Vec<String>,
        builds: Cell<usize>,
    }

    impl ColumnSource for CountingSource {
        fn columns_count(&self) -> Result<usize, DbLibError> {
            self.builds.set(self.builds.get() + 1);
            Ok(self.names.len())
        }

        fn column_name(&self, index: usize) -> Result<String, DbLibError> {
            self.names.column_name(index)
        }
    }

    fn source(names: &[&str]) -> CountingSource {
        CountingSource {
            names: names.iter().map(ToString::to_string).collect(),
            builds: Cell::new(0),
        }
    }

    #[test]
    fn ordinals_pass_through_without_building() -> Result<(), DbLibError> {
        let mut helper = ColumnsHelper::new();
        let src = source(&["a"]);
        assert_eq!(helper.get_column_index(&42usize.into(), &src)?, 42);
        assert_eq!(src.builds.get(), 0);
        Ok(())
    }

    #[test]
    fn names_resolve_case_insensitively_and_lazily() -> Result<(), DbLibError> {
        let mut helper = ColumnsHelper::new();
        let src = source(&["Id", "NAME", "id"]);
        assert_eq!(helper.get_column_index(&"name".into(), &src)?, 2);
        // later duplicate wins
        assert_eq!(helper.get_column_index(&"ID".into(), &src)?, 3);
        assert_eq!(src.builds.get(), 1);

        let err = helper.get_column_index(&"missing".into(), &src);
        assert!(matches!(err, Err(DbLibError::ColumnNotFound(n)) if n == "missing"));
        Ok(())
    }

    #[test]
    fn clear_forces_rebuild() -> Result<(), DbLibError> {
        let mut helper = ColumnsHelper::new();
        assert_eq!(helper.get_column_index(&"b".into(), &source(&["a", "b"]))?, 2);
        helper.clear();
        assert_eq!(helper.get_column_index(&"b".into(), &source(&["b"]))?, 1);
        Ok(())
    }
}
