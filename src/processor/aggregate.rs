use std::fmt;
use std::sync::Arc;

use crate::processor::{AggregateOp, ProcessorError, Value, column::Column};

/// User-supplied aggregate over a group's numeric values.
pub type CustomAggregate = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// A per-group aggregate: one of the built-ins, or a named custom function.
#[derive(Clone)]
pub enum AggregateFn {
    Builtin(AggregateOp),
    Custom { name: String, func: CustomAggregate },
}

impl AggregateFn {
    pub fn custom<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        AggregateFn::Custom {
            name: name.to_string(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AggregateFn::Builtin(op) => op.name(),
            AggregateFn::Custom { name, .. } => name,
        }
    }
}

impl fmt::Debug for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFn::Builtin(op) => write!(f, "Builtin({op:?})"),
            AggregateFn::Custom { name, .. } => write!(f, "Custom({name})"),
        }
    }
}

impl From<AggregateOp> for AggregateFn {
    fn from(op: AggregateOp) -> Self {
        AggregateFn::Builtin(op)
    }
}

/// One requested output column of a grouped aggregation.
#[derive(Debug, Clone)]
pub struct AggSpec {
    pub column: String,
    pub func: AggregateFn,
    pub alias: Option<String>,
}

impl AggSpec {
    pub fn new(column: &str, func: impl Into<AggregateFn>) -> Self {
        AggSpec {
            column: column.to_string(),
            func: func.into(),
            alias: None,
        }
    }

    /// Name the output column explicitly instead of `<column>_<function>`.
    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn output_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.column, self.func.name()))
    }
}

/// Applies `func` to the cells of `column` at `rows`.
///
/// `column_name` is only used for error reporting.
pub fn aggregate_rows(
    column: &Column,
    column_name: &str,
    func: &AggregateFn,
    rows: &[usize],
) -> Result<Value, ProcessorError> {
    match (column, func) {
        (_, AggregateFn::Builtin(AggregateOp::Count)) => Ok(Value::Int(rows.len() as i64)),
        (Column::Int64(values), AggregateFn::Builtin(op)) => {
            let group: Vec<i64> = rows.iter().map(|&i| values[i]).collect();
            aggregate_int_values(&group, *op, column_name)
        }
        (Column::Float64(values), AggregateFn::Builtin(op)) => {
            let group: Vec<f64> = rows.iter().map(|&i| values[i]).collect();
            aggregate_float_values(&group, *op, column_name)
        }
        (Column::Str(_), _) => Err(ProcessorError::WrongColumnType {
            column: column_name.to_string(),
            expected: "numeric",
        }),
        (_, AggregateFn::Custom { func, .. }) => {
            let group = column.numeric_at(rows).unwrap_or_default();
            if group.is_empty() {
                return Err(ProcessorError::EmptyGroup(column_name.to_string()));
            }
            Ok(Value::Float(func(&group)))
        }
    }
}

/// Helper to aggregate integer values
///
/// Sums accumulate in `i128`, so they are exact and do not depend on row
/// order. A sum that does not fit in `i64` is returned as a float.
pub fn aggregate_int_values(
    values: &[i64],
    op: AggregateOp,
    column_name: &str,
) -> Result<Value, ProcessorError> {
    if op == AggregateOp::Count {
        return Ok(Value::Int(values.len() as i64));
    }
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Err(ProcessorError::EmptyGroup(column_name.to_string()));
    };

    let wide_sum = || values.iter().map(|&v| v as i128).sum::<i128>();

    match op {
        AggregateOp::Sum => {
            let sum = wide_sum();
            Ok(i64::try_from(sum).map_or(Value::Float(sum as f64), Value::Int))
        }
        AggregateOp::Mean => Ok(Value::Float(wide_sum() as f64 / values.len() as f64)),
        AggregateOp::Min => Ok(Value::Int(min)),
        AggregateOp::Max => Ok(Value::Int(max)),
        AggregateOp::Count => Ok(Value::Int(values.len() as i64)),
    }
}

/// Helper to aggregate float values
pub fn aggregate_float_values(
    values: &[f64],
    op: AggregateOp,
    column_name: &str,
) -> Result<Value, ProcessorError> {
    if op == AggregateOp::Count {
        return Ok(Value::Int(values.len() as i64));
    }
    if values.is_empty() {
        return Err(ProcessorError::EmptyGroup(column_name.to_string()));
    }

    match op {
        AggregateOp::Sum => Ok(Value::Float(values.iter().sum())),
        AggregateOp::Mean => {
            let sum: f64 = values.iter().sum();
            Ok(Value::Float(sum / values.len() as f64))
        }
        AggregateOp::Min => Ok(Value::Float(
            values.iter().fold(f64::INFINITY, |a, &b| a.min(b)),
        )),
        AggregateOp::Max => Ok(Value::Float(
            values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)),
        )),
        AggregateOp::Count => Ok(Value::Int(values.len() as i64)),
    }
}

/// Tie-breaking rule for decimal rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Ties go to the even neighbour (0.125 -> 0.12).
    #[default]
    HalfEven,
    /// Ties go away from zero (0.125 -> 0.13).
    HalfUp,
}

impl Rounding {
    pub fn round(&self, value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        let scaled = value * factor;
        let rounded = match self {
            Rounding::HalfEven => scaled.round_ties_even(),
            Rounding::HalfUp => scaled.round(),
        };
        rounded / factor
    }
}

/// Percentage of the group total for each value, rounded to 2 decimals.
///
/// Intended as a [`transform`](crate::processor::grouped::GroupedView::transform)
/// function.
pub fn percent_of_total(values: &[Value], rounding: Rounding) -> Result<Vec<Value>, ProcessorError> {
    let numbers = values
        .iter()
        .map(Value::as_f64)
        .collect::<Result<Vec<f64>, _>>()?;
    let total: f64 = numbers.iter().sum();
    Ok(numbers
        .iter()
        .map(|v| Value::Float(rounding.round(v / total * 100.0, 2)))
        .collect())
}
