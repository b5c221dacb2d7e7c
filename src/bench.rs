//! Timing harness for comparing group-sum implementations on a synthetic
//! integer-key / float-value workload.

use std::fmt;
use std::time::{Duration, Instant};

use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::processor::{
    AggregateOp, ProcessorError, aggregate::AggSpec, column::Column, table::Table,
};

pub const KEY_COLUMN: &str = "A";
pub const VALUE_COLUMN: &str = "B";

/// A table plus the columns a group-sum runs over.
#[derive(Debug, Clone)]
pub struct Workload {
    pub table: Table,
    pub key_column: String,
    pub value_column: String,
}

/// Builds `rows` rows with integer keys in `1..cardinality` and float values
/// in `[0, 1)`. The same seed always gives the same table.
pub fn synthetic_workload(
    rows: usize,
    cardinality: i64,
    seed: u64,
) -> Result<Workload, ProcessorError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let upper = cardinality.max(2);

    let mut keys = Vec::with_capacity(rows);
    let mut values = Vec::with_capacity(rows);
    for _ in 0..rows {
        keys.push(rng.random_range(1..upper));
        values.push(rng.random::<f64>());
    }

    let table = Table::from_columns([
        (KEY_COLUMN, Column::from(keys)),
        (VALUE_COLUMN, Column::from(values)),
    ])?;

    Ok(Workload {
        table,
        key_column: KEY_COLUMN.to_string(),
        value_column: VALUE_COLUMN.to_string(),
    })
}

/// Something that can sum the value column per key.
pub trait AggregationEngine {
    fn name(&self) -> &str;

    /// One row per key: the key column followed by `<value>_sum`.
    fn group_sum(&self, workload: &Workload) -> Result<Table, ProcessorError>;
}

/// Single-threaded grouped aggregation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialEngine;

impl AggregationEngine for SequentialEngine {
    fn name(&self) -> &str {
        "sequential"
    }

    fn group_sum(&self, workload: &Workload) -> Result<Table, ProcessorError> {
        workload
            .table
            .group_by(&[workload.key_column.as_str()])?
            .aggregate_with(&[AggSpec::new(&workload.value_column, AggregateOp::Sum)])
    }
}

/// Groups reduced in parallel on the current rayon pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelEngine;

impl AggregationEngine for ParallelEngine {
    fn name(&self) -> &str {
        "parallel"
    }

    fn group_sum(&self, workload: &Workload) -> Result<Table, ProcessorError> {
        workload
            .table
            .group_by(&[workload.key_column.as_str()])?
            .aggregate_par(&[AggSpec::new(&workload.value_column, AggregateOp::Sum)])
    }
}

/// Runs `f` once, returning its result and the wall-clock time it took.
pub fn time_it<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineTiming {
    pub name: String,
    pub elapsed: Duration,
    pub groups: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub baseline: EngineTiming,
    pub candidate: EngineTiming,
}

impl Comparison {
    /// Baseline time divided by candidate time.
    pub fn speedup(&self) -> f64 {
        self.baseline.elapsed.as_secs_f64() / self.candidate.elapsed.as_secs_f64()
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} groupby time: {:.4} seconds",
            self.baseline.name,
            self.baseline.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "{} groupby time: {:.4} seconds",
            self.candidate.name,
            self.candidate.elapsed.as_secs_f64()
        )?;
        write!(
            f,
            "{} is approximately {:.2} times faster than {}",
            self.candidate.name,
            self.speedup(),
            self.baseline.name
        )
    }
}

/// Times one group-sum on each engine over the same workload.
pub fn compare(
    baseline: &dyn AggregationEngine,
    candidate: &dyn AggregationEngine,
    workload: &Workload,
) -> Result<Comparison, ProcessorError> {
    let mut timings = Vec::with_capacity(2);
    for engine in [baseline, candidate] {
        let (result, elapsed) = time_it(|| engine.group_sum(workload));
        let groups = result?.row_count();
        info!(
            "{}: {} groups from {} rows in {:?}",
            engine.name(),
            groups,
            workload.table.row_count(),
            elapsed
        );
        timings.push(EngineTiming {
            name: engine.name().to_string(),
            elapsed,
            groups,
        });
    }

    let candidate = timings.pop();
    let baseline = timings.pop();
    match (baseline, candidate) {
        (Some(baseline), Some(candidate)) => Ok(Comparison {
            baseline,
            candidate,
        }),
        _ => Err(ProcessorError::Schema("comparison needs two engines".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Value;

    #[test]
    fn test_workload_is_seeded() {
        let a = synthetic_workload(500, 10, 7).unwrap();
        let b = synthetic_workload(500, 10, 7).unwrap();
        assert_eq!(a.table, b.table);

        let keys = a.table.values(KEY_COLUMN).unwrap();
        assert!(keys.iter().all(|k| matches!(k, Value::Int(1..=9))));
        let values = a.table.values(VALUE_COLUMN).unwrap();
        assert!(
            values
                .iter()
                .all(|v| matches!(v, Value::Float(x) if (0.0..1.0).contains(x)))
        );
    }

    #[test]
    fn test_engines_agree() {
        let workload = synthetic_workload(2_000, 50, 42).unwrap();
        let seq = SequentialEngine.group_sum(&workload).unwrap();
        let par = ParallelEngine.group_sum(&workload).unwrap();
        assert_eq!(seq, par);
        assert_eq!(seq.headers(), &["A", "B_sum"]);
    }

    #[test]
    fn test_speedup_is_time_ratio() {
        let timing = |name: &str, ms| EngineTiming {
            name: name.to_string(),
            elapsed: Duration::from_millis(ms),
            groups: 3,
        };
        let comparison = Comparison {
            baseline: timing("slow", 300),
            candidate: timing("fast", 100),
        };
        assert!((comparison.speedup() - 3.0).abs() < 1e-9);
        assert!(
            comparison
                .to_string()
                .ends_with("fast is approximately 3.00 times faster than slow")
        );
    }

    #[test]
    fn test_compare_reports_both_engines() {
        let workload = synthetic_workload(1_000, 20, 1).unwrap();
        let comparison = compare(&SequentialEngine, &ParallelEngine, &workload).unwrap();
        assert_eq!(comparison.baseline.name, "sequential");
        assert_eq!(comparison.candidate.name, "parallel");
        assert_eq!(comparison.baseline.groups, comparison.candidate.groups);
    }
}
