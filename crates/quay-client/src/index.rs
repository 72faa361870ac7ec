use std::cmp::Ordering;

use crate::error::{IndexError, IndexResult};
use crate::table::{Row, Table};
use crate::value::Value;

/// Key-based view over a [`Table`] whose index column is sorted ascending.
///
/// Provides exact-key lookup and range queries via binary search on the index
/// column. The underlying table stays available for positional access.
/// Lookups fail if the index column holds a null or a value of a different
/// type than the key.
#[derive(Debug, Clone)]
pub struct IndexedTable {
    table: Table,
    column: String,
    position: usize,
}

impl IndexedTable {
    /// Wraps `table`, indexing it by `column`. The caller is responsible for
    /// the rows being sorted ascending by that column.
    pub fn new(table: Table, column: impl Into<String>) -> IndexResult<Self> {
        let column = column.into();
        let position = table
            .column_position(&column)
            .ok_or_else(|| IndexError::NoSuchColumn(column.clone()))?;
        Ok(Self {
            table,
            column,
            position,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn into_table(self) -> Table {
        self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// The row whose index value equals `key`, or `None` if absent.
    pub fn get_row(&self, key: &Value) -> IndexResult<Option<&Row>> {
        let position = self.lower_bound(key)?;
        if position >= self.table.row_count() {
            return Ok(None);
        }
        let found = self.index_value(position)?;
        if found.compare_same(key) == Some(Ordering::Equal) {
            Ok(self.table.get_row(position))
        } else {
            Ok(None)
        }
    }

    /// The value at `key` and `column`, or `None` if the key is absent.
    pub fn get_value(&self, key: &Value, column: &str) -> IndexResult<Option<&Value>> {
        let column_position = self
            .table
            .column_position(column)
            .ok_or_else(|| IndexError::NoSuchColumn(column.to_string()))?;
        Ok(self.get_row(key)?.map(|row| &row[column_position]))
    }

    /// Rows whose index value falls in the given range, in table order.
    /// `None` bounds extend to the first or last row; `inclusive_to` controls
    /// whether the upper bound itself is included.
    pub fn rows_in_range(
        &self,
        from: Option<&Value>,
        to: Option<&Value>,
        inclusive_to: bool,
    ) -> IndexResult<impl Iterator<Item = &Row>> {
        let count = self.table.row_count();
        let start = match from {
            Some(key) => self.lower_bound(key)?,
            None => 0,
        };
        let end = match to {
            Some(key) if inclusive_to => self.upper_bound(key)?,
            Some(key) => self.lower_bound(key)?,
            None => count,
        };
        let (start, end) = (start.min(count), end.min(count).max(start));
        Ok(self.table.rows()[start..end].iter())
    }

    // First position whose index value is >= key.
    fn lower_bound(&self, key: &Value) -> IndexResult<usize> {
        self.bisect(key, |ordering| ordering == Ordering::Less)
    }

    // First position whose index value is > key.
    fn upper_bound(&self, key: &Value) -> IndexResult<usize> {
        self.bisect(key, |ordering| ordering != Ordering::Greater)
    }

    fn bisect(
        &self,
        key: &Value,
        keep_searching_right: impl Fn(Ordering) -> bool,
    ) -> IndexResult<usize> {
        let mut lo = 0;
        let mut hi = self.table.row_count();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let mid_value = self.index_value(mid)?;
            let ordering = mid_value
                .compare_same(key)
                .ok_or(IndexError::KeyTypeMismatch)?;
            if keep_searching_right(ordering) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    fn index_value(&self, position: usize) -> IndexResult<&Value> {
        let row = self
            .table
            .get_row(position)
            .ok_or(IndexError::NullKey(position))?;
        let value = &row[self.position];
        if value.is_null() {
            return Err(IndexError::NullKey(position));
        }
        Ok(value)
    }
}
