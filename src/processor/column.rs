use crate::processor::{ProcessorError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int64,
    Float64,
    Str,
}

impl ColumnType {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "int",
            ColumnType::Float64 => "float",
            ColumnType::Str => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }
}

/// A homogeneously typed column of cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Str(Vec<String>),
}

impl Column {
    pub fn new_int64() -> Self {
        Column::Int64(Vec::new())
    }

    pub fn new_float64() -> Self {
        Column::Float64(Vec::new())
    }

    pub fn new_str() -> Self {
        Column::Str(Vec::new())
    }

    pub fn empty(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Int64 => Column::new_int64(),
            ColumnType::Float64 => Column::new_float64(),
            ColumnType::Str => Column::new_str(),
        }
    }

    /// Builds a column from loose values.
    ///
    /// Ints and floats mixed together are widened to a float column; any other
    /// mix of kinds is a [`ProcessorError::TypeMismatch`]. An empty input yields
    /// an empty float column.
    pub fn from_values(values: Vec<Value>) -> Result<Self, ProcessorError> {
        let Some(first) = values.first() else {
            return Ok(Column::new_float64());
        };
        let has_float = values.iter().any(|v| matches!(v, Value::Float(_)));

        match first {
            Value::Str(_) => values
                .into_iter()
                .map(|v| match v {
                    Value::Str(s) => Ok(s),
                    other => Err(ProcessorError::TypeMismatch {
                        expected: "string",
                        found: other.kind_name(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Column::Str),
            Value::Int(_) if !has_float => values
                .into_iter()
                .map(|v| match v {
                    Value::Int(i) => Ok(i),
                    other => Err(ProcessorError::TypeMismatch {
                        expected: "int",
                        found: other.kind_name(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Column::Int64),
            _ => values
                .iter()
                .map(|v| match v {
                    Value::Str(_) => Err(ProcessorError::TypeMismatch {
                        expected: "number",
                        found: "string",
                    }),
                    other => other.as_f64(),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Column::Float64),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Int64(_) => ColumnType::Int64,
            Column::Float64(_) => ColumnType::Float64,
            Column::Str(_) => ColumnType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends one value, checking it against the column type.
    pub fn push(&mut self, value: Value) -> Result<(), ProcessorError> {
        match (self, value) {
            (Column::Int64(v), Value::Int(i)) => v.push(i),
            (Column::Float64(v), Value::Float(f)) => v.push(f),
            (Column::Float64(v), Value::Int(i)) => v.push(i as f64),
            (Column::Str(v), Value::Str(s)) => v.push(s),
            (col, value) => {
                return Err(ProcessorError::TypeMismatch {
                    expected: col.column_type().name(),
                    found: value.kind_name(),
                });
            }
        }
        Ok(())
    }

    // Random access
    pub fn get(&self, idx: usize) -> Option<Value> {
        match self {
            Column::Int64(v) => v.get(idx).copied().map(Value::Int),
            Column::Float64(v) => v.get(idx).copied().map(Value::Float),
            Column::Str(v) => v.get(idx).cloned().map(Value::Str),
        }
    }

    pub fn iter_values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Numeric view of the rows at `rows`, in the given order.
    pub fn numeric_at(&self, rows: &[usize]) -> Option<Vec<f64>> {
        match self {
            Column::Int64(v) => Some(rows.iter().map(|&i| v[i] as f64).collect()),
            Column::Float64(v) => Some(rows.iter().map(|&i| v[i]).collect()),
            Column::Str(_) => None,
        }
    }

    /// New column holding the rows at `rows`, in the given order.
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Int64(v) => Column::Int64(rows.iter().map(|&i| v[i]).collect()),
            Column::Float64(v) => Column::Float64(rows.iter().map(|&i| v[i]).collect()),
            Column::Str(v) => Column::Str(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Converts an int column to a float column in place; other columns are
    /// left alone.
    pub fn widen_to_float(&mut self) {
        if let Column::Int64(v) = self {
            let widened = std::mem::take(v).into_iter().map(|i| i as f64).collect();
            *self = Column::Float64(widened);
        }
    }

    /// Moves the contents of `other` onto the end of this column. Int and
    /// float columns combine into a float column.
    pub fn append(&mut self, mut other: Column) -> Result<(), ProcessorError> {
        if self.column_type().is_numeric() && other.column_type().is_numeric() {
            if matches!(other, Column::Float64(_)) {
                self.widen_to_float();
            } else if matches!(self, Column::Float64(_)) {
                other.widen_to_float();
            }
        }
        match (self, other) {
            (Column::Int64(a), Column::Int64(b)) => a.extend(b),
            (Column::Float64(a), Column::Float64(b)) => a.extend(b),
            (Column::Str(a), Column::Str(b)) => a.extend(b),
            (a, b) => {
                return Err(ProcessorError::TypeMismatch {
                    expected: a.column_type().name(),
                    found: b.column_type().name(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Self {
        Column::Int64(v)
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Float64(v)
    }
}

impl From<Vec<String>> for Column {
    fn from(v: Vec<String>) -> Self {
        Column::Str(v)
    }
}

impl From<Vec<&str>> for Column {
    fn from(v: Vec<&str>) -> Self {
        Column::Str(v.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_widens_mixed_numbers() {
        let col = Column::from_values(vec![Value::Int(1), Value::Float(2.5)]).unwrap();
        assert_eq!(col, Column::Float64(vec![1.0, 2.5]));
    }

    #[test]
    fn test_from_values_rejects_mixed_kinds() {
        let err = Column::from_values(vec![Value::from("A"), Value::Int(1)]).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::TypeMismatch {
                expected: "string",
                found: "int"
            }
        ));
    }

    #[test]
    fn test_take_preserves_requested_order() {
        let col = Column::from(vec!["a", "b", "c"]);
        assert_eq!(col.take(&[2, 0]), Column::from(vec!["c", "a"]));
    }

    #[test]
    fn test_push_checks_type() {
        let mut col = Column::new_int64();
        col.push(Value::Int(3)).unwrap();
        assert!(col.push(Value::from("x")).is_err());
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn test_append_widens_int_and_float() {
        let mut col = Column::from(vec![1i64, 2]);
        col.append(Column::from(vec![2.5])).unwrap();
        col.append(Column::from(vec![4i64])).unwrap();
        assert_eq!(col, Column::Float64(vec![1.0, 2.0, 2.5, 4.0]));

        let mut names = Column::from(vec!["a"]);
        assert!(names.append(Column::from(vec![1i64])).is_err());
    }
}
