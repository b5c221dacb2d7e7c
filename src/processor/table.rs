use std::cmp::Ordering;
use std::fmt;

use crate::processor::{
    FilterPredicate, ProcessorError, Value,
    column::{Column, ColumnType},
};

/// One sort criterion for [`Table::sort_by`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: false,
        }
    }

    pub fn desc(column: &str) -> Self {
        SortKey {
            column: column.to_string(),
            descending: true,
        }
    }
}

/// In-memory table: named, typed columns of equal length.
///
/// Every row carries the `row_id` it was given at ingestion (its position in
/// the source). Row-selecting operations keep the ids of the rows they keep,
/// so results can always be traced back to source rows.
///
/// # Example
///
/// ```rust
/// use groupby_engine::processor::{column::Column, table::Table};
///
/// let table = Table::from_columns([
///     ("Region", Column::from(vec!["North", "East"])),
///     ("Sales", Column::from(vec![100i64, 200])),
/// ])
/// .unwrap();
/// assert_eq!(table.row_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Column>,
    row_ids: Vec<usize>,
}

impl Table {
    /// Create an empty table with no columns
    pub fn new() -> Self {
        Table {
            headers: Vec::new(),
            columns: Vec::new(),
            row_ids: Vec::new(),
        }
    }

    /// Builds a table from `(name, column)` pairs, keeping their order.
    ///
    /// # Errors
    /// [`ProcessorError::Schema`] if the columns differ in length or a name
    /// repeats.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, ProcessorError>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        let mut row_count = None;

        for (name, column) in columns {
            let name = name.into();
            match row_count {
                None => row_count = Some(column.len()),
                Some(n) if n != column.len() => {
                    return Err(ProcessorError::Schema(format!(
                        "Column '{}' has {} values, expected {}",
                        name,
                        column.len(),
                        n
                    )));
                }
                Some(_) => {}
            }
            if table.headers.contains(&name) {
                return Err(ProcessorError::Schema(format!(
                    "Duplicate column name '{name}'"
                )));
            }
            table.headers.push(name);
            table.columns.push(column);
        }

        table.row_ids = (0..row_count.unwrap_or(0)).collect();
        Ok(table)
    }

    pub(crate) fn from_parts(
        headers: Vec<String>,
        columns: Vec<Column>,
        row_ids: Vec<usize>,
    ) -> Self {
        debug_assert_eq!(headers.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == row_ids.len()));
        Table {
            headers,
            columns,
            row_ids,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_ids.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Ingestion ids of the rows, in current row order.
    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column_index(&self, col_name: &str) -> Result<usize, ProcessorError> {
        self.headers
            .iter()
            .position(|cn| cn == col_name)
            .ok_or_else(|| ProcessorError::MissingColumn(col_name.to_string()))
    }

    pub fn get_col(&self, col_name: &str) -> Result<&Column, ProcessorError> {
        let col_pos = self.column_index(col_name)?;
        Ok(&self.columns[col_pos])
    }

    /// Like [`Table::get_col`] but the column must hold numbers.
    pub fn numeric_col(&self, col_name: &str) -> Result<&Column, ProcessorError> {
        let col = self.get_col(col_name)?;
        if col.column_type().is_numeric() {
            Ok(col)
        } else {
            Err(ProcessorError::WrongColumnType {
                column: col_name.to_string(),
                expected: "numeric",
            })
        }
    }

    pub fn value(&self, row: usize, col_name: &str) -> Result<Value, ProcessorError> {
        let col = self.get_col(col_name)?;
        col.get(row).ok_or_else(|| {
            ProcessorError::Schema(format!(
                "Row {} out of range for table of {} rows",
                row,
                self.row_count()
            ))
        })
    }

    /// All values of a column, in row order.
    pub fn values(&self, col_name: &str) -> Result<Vec<Value>, ProcessorError> {
        Ok(self.get_col(col_name)?.iter_values().collect())
    }

    /// Adds (or replaces) a derived column.
    pub fn with_column(mut self, name: &str, column: Column) -> Result<Self, ProcessorError> {
        if column.len() != self.row_count() {
            return Err(ProcessorError::Schema(format!(
                "Column '{}' has {} values, table has {} rows",
                name,
                column.len(),
                self.row_count()
            )));
        }
        match self.headers.iter().position(|h| h == name) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.headers.push(name.to_string());
                self.columns.push(column);
            }
        }
        Ok(self)
    }

    /// [`Table::with_column`] for a row-aligned sequence of values, e.g. the
    /// output of a grouped transform.
    pub fn with_values(self, name: &str, values: Vec<Value>) -> Result<Self, ProcessorError> {
        let column = Column::from_values(values)?;
        self.with_column(name, column)
    }

    /// New table with the rows at `rows`, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            row_ids: rows.iter().map(|&r| self.row_ids[r]).collect(),
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let rows: Vec<usize> = (0..n.min(self.row_count())).collect();
        self.take_rows(&rows)
    }

    /// Subset of columns, in the requested order.
    pub fn select(&self, columns: &[&str]) -> Result<Table, ProcessorError> {
        let mut headers = Vec::with_capacity(columns.len());
        let mut cols = Vec::with_capacity(columns.len());
        for &name in columns {
            cols.push(self.get_col(name)?.clone());
            headers.push(name.to_string());
        }
        Ok(Table::from_parts(headers, cols, self.row_ids.clone()))
    }

    /// Stable multi-key sort. Rows that compare equal on every key keep their
    /// current relative order.
    pub fn sort_by(&self, keys: &[SortKey]) -> Result<Table, ProcessorError> {
        let cols = keys
            .iter()
            .map(|k| self.get_col(&k.column).map(|c| (c, k.descending)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut order: Vec<usize> = (0..self.row_count()).collect();
        order.sort_by(|&a, &b| {
            for (col, descending) in &cols {
                let ord = compare_cells(col, a, b);
                let ord = if *descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        Ok(self.take_rows(&order))
    }

    /// Row-level filter on a single column, keeping row order.
    pub fn filter_rows(
        &self,
        column: &str,
        predicate: &FilterPredicate,
    ) -> Result<Table, ProcessorError> {
        let col = self.get_col(column)?;
        let mut keep = Vec::new();
        for (i, value) in col.iter_values().enumerate() {
            if predicate.matches(&value)? {
                keep.push(i);
            }
        }
        Ok(self.take_rows(&keep))
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_cells(col: &Column, a: usize, b: usize) -> Ordering {
    match col {
        Column::Int64(v) => v[a].cmp(&v[b]),
        Column::Float64(v) => v[a].total_cmp(&v[b]),
        Column::Str(v) => v[a].cmp(&v[b]),
    }
}

// Floats are shown with two decimals; everything else as-is.
fn format_cell(value: &Value) -> String {
    match value {
        Value::Float(v) => format!("{v:.2}"),
        other => other.to_string(),
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.iter_values().map(|v| format_cell(&v)).collect())
            .collect();

        let widths: Vec<usize> = self
            .headers
            .iter()
            .zip(&cells)
            .map(|(h, col)| col.iter().map(|s| s.len()).max().unwrap_or(0).max(h.len()))
            .collect();

        let header_line: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{h:<w$}"))
            .collect();
        writeln!(f, "{}", header_line.join("  ").trim_end())?;

        for row in 0..self.row_count() {
            let line: Vec<String> = cells
                .iter()
                .zip(&self.columns)
                .zip(&widths)
                .map(|((col, column), w)| match column.column_type() {
                    ColumnType::Str => format!("{:<w$}", col[row]),
                    _ => format!("{:>w$}", col[row]),
                })
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns([
            ("Region", Column::from(vec!["North", "East", "North", "West"])),
            ("Sales", Column::from(vec![100i64, 200, 150, 200])),
        ])
        .unwrap()
    }

    #[test]
    fn test_ragged_literal_is_schema_error() {
        let err = Table::from_columns([
            ("a", Column::from(vec![1i64, 2])),
            ("b", Column::from(vec![1i64])),
        ])
        .unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_missing_column() {
        let table = sample();
        assert!(matches!(
            table.get_col("Month"),
            Err(ProcessorError::MissingColumn(name)) if name == "Month"
        ));
        assert!(matches!(
            table.numeric_col("Region"),
            Err(ProcessorError::WrongColumnType { .. })
        ));
    }

    #[test]
    fn test_sort_is_stable() {
        let sorted = sample().sort_by(&[SortKey::desc("Sales")]).unwrap();
        // rows 1 and 3 tie on 200 and keep their original order
        assert_eq!(sorted.row_ids(), &[1, 3, 2, 0]);
    }

    #[test]
    fn test_take_rows_carries_row_ids() {
        let table = sample().take_rows(&[3, 1]);
        assert_eq!(table.row_ids(), &[3, 1]);
        assert_eq!(table.value(0, "Region").unwrap(), Value::from("West"));
    }

    #[test]
    fn test_with_column_length_checked() {
        let err = sample()
            .with_column("Extra", Column::from(vec![1i64]))
            .unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_filter_rows_greater_than() {
        let table = sample()
            .filter_rows("Sales", &FilterPredicate::GreaterThan(Value::Int(120)))
            .unwrap();
        assert_eq!(table.row_ids(), &[1, 2, 3]);
    }

    #[test]
    fn test_display_lists_headers() {
        let text = sample().to_string();
        assert!(text.starts_with("Region  Sales"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn test_display_rounds_floats_only_in_the_table() {
        let table = Table::from_columns([("pct", Column::from(vec![0.126, 40.0]))]).unwrap();
        let text = table.to_string();
        assert!(text.contains("0.13"));
        assert!(!text.contains("0.126"));
        assert!(text.contains("40.00"));
        assert_eq!(table.value(0, "pct").unwrap().to_string(), "0.126");
    }
}
