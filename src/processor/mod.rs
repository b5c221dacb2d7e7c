use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::path::PathBuf;
use thiserror::Error;

pub mod aggregate;
pub mod categorize;
pub mod column;
pub mod grouped;
pub mod hierarchy;
pub mod loader;
pub mod query_builder;
pub mod table;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' must be {expected}")]
    WrongColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cannot aggregate an empty group of column '{0}'")]
    EmptyGroup(String),

    #[error("Transform returned {got} values for a group of {expected} rows")]
    TransformLength { expected: usize, got: usize },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Failed to load '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ProcessorError {
    /// True for errors caused by a bad column reference or table shape.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            ProcessorError::MissingColumn(_)
                | ProcessorError::WrongColumnType { .. }
                | ProcessorError::Schema(_)
                | ProcessorError::TransformLength { .. }
        )
    }
}

/// A single cell value (owned for simplicity)
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer cell
    Int(i64),
    /// Float cell
    Float(f64),
    /// String cell
    Str(String),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
        }
    }

    /// Numeric view of the value; strings are a [`ProcessorError::TypeMismatch`].
    pub fn as_f64(&self) -> Result<f64, ProcessorError> {
        match self {
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            Value::Str(_) => Err(ProcessorError::TypeMismatch {
                expected: "number",
                found: "string",
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Int(_) => 0,
            Value::Float(_) => 1,
            Value::Str(_) => 2,
        }
    }
}

// -0.0 equals 0.0 and every NaN is the same key.
fn canonical_float(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                canonical_float(*a).to_bits() == canonical_float(*b).to_bits()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => canonical_float(*v).to_bits().hash(state),
            Value::Str(v) => v.hash(state),
        }
    }
}

// Total order: values of one kind compare naturally, mixed kinds by kind rank.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => {
                canonical_float(*a).total_cmp(&canonical_float(*b))
            }
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Row-level filter predicate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterPredicate {
    Equals(Value),
    GreaterThan(Value),
    LessThan(Value),
    Between(Value, Value),
}

impl FilterPredicate {
    /// Numbers compare numerically across int/float; strings compare with
    /// strings. Any other pairing is a [`ProcessorError::TypeMismatch`].
    pub fn matches(&self, value: &Value) -> Result<bool, ProcessorError> {
        Ok(match self {
            FilterPredicate::Equals(t) => compare_scalar(value, t)? == Ordering::Equal,
            FilterPredicate::GreaterThan(t) => compare_scalar(value, t)? == Ordering::Greater,
            FilterPredicate::LessThan(t) => compare_scalar(value, t)? == Ordering::Less,
            FilterPredicate::Between(lo, hi) => {
                compare_scalar(value, lo)? != Ordering::Less
                    && compare_scalar(value, hi)? != Ordering::Greater
            }
        })
    }
}

fn compare_scalar(a: &Value, b: &Value) -> Result<Ordering, ProcessorError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Str(_), _) | (_, Value::Str(_)) => Err(ProcessorError::TypeMismatch {
            expected: a.kind_name(),
            found: b.kind_name(),
        }),
        _ => Ok(a.as_f64()?.total_cmp(&b.as_f64()?)),
    }
}

/// Built-in aggregate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    /// Number of rows in the group
    Count,
    /// Sum of all numeric values
    Sum,
    /// Arithmetic mean (sum / count)
    Mean,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
}

impl AggregateOp {
    /// Suffix used for generated result column names.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateOp::Count => "count",
            AggregateOp::Sum => "sum",
            AggregateOp::Mean => "mean",
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
        }
    }
}
