use log::debug;

use crate::processor::{
    AggregateOp, ProcessorError,
    aggregate::AggSpec,
    grouped::Group,
    table::{SortKey, Table},
};

/// Group-level condition used to keep or drop whole groups.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupPredicate {
    MeanGreaterThan { column: String, threshold: f64 },
    SumGreaterThan { column: String, threshold: f64 },
    CountAtLeast(usize),
}

impl GroupPredicate {
    pub fn mean_greater_than(column: &str, threshold: f64) -> Self {
        GroupPredicate::MeanGreaterThan {
            column: column.to_string(),
            threshold,
        }
    }

    pub fn sum_greater_than(column: &str, threshold: f64) -> Self {
        GroupPredicate::SumGreaterThan {
            column: column.to_string(),
            threshold,
        }
    }

    pub fn evaluate(&self, group: &Group<'_>) -> Result<bool, ProcessorError> {
        match self {
            GroupPredicate::MeanGreaterThan { column, threshold } => {
                Ok(group.mean(column)? > *threshold)
            }
            GroupPredicate::SumGreaterThan { column, threshold } => {
                Ok(group.sum(column)? > *threshold)
            }
            GroupPredicate::CountAtLeast(n) => Ok(group.len() >= *n),
        }
    }
}

/// Top-K rows per partition, built from the grouped primitives:
///
/// 1. group by the partition column and keep groups passing every `having`
/// 2. re-group the kept rows by (partition, `group_by` column)
/// 3. aggregate the measure within each sub-group
/// 4. stable sort by partition ascending, measure descending
/// 5. keep the first `limit` rows of each partition
///
/// Ties on the measure keep the sub-group that appeared first in the input.
///
/// # Example
///
/// ```rust
/// # use groupby_engine::processor::query_builder::{GroupPredicate, TopNQuery};
/// let query = TopNQuery::new("Region")
///     .having(GroupPredicate::mean_greater_than("Sales", 150.0))
///     .group_by("Product")
///     .sum("Sales")
///     .limit(1);
/// # let _ = query;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TopNQuery {
    partition: String,
    having: Vec<GroupPredicate>,
    group_by: Option<String>,
    measure: Option<(String, AggregateOp)>,
    limit: usize,
}

impl TopNQuery {
    pub fn new(partition: &str) -> Self {
        Self {
            partition: partition.to_string(),
            having: Vec::new(),
            group_by: None,
            measure: None,
            limit: 1,
        }
    }

    /// Add a group-level filter condition on the partition groups
    pub fn having(mut self, predicate: GroupPredicate) -> Self {
        self.having.push(predicate);
        self
    }

    /// Finer grouping column ranked within each partition
    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by = Some(column.to_string());
        self
    }

    /// Measure to rank by; the output column keeps the column's name
    pub fn aggregate(mut self, column: &str, op: AggregateOp) -> Self {
        self.measure = Some((column.to_string(), op));
        self
    }

    pub fn sum(self, column: &str) -> Self {
        self.aggregate(column, AggregateOp::Sum)
    }

    /// Rows kept per partition
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = n;
        self
    }

    /// Execute the query against `table`
    pub fn execute(&self, table: &Table) -> Result<Table, ProcessorError> {
        let (Some(fine), Some((measure, op))) = (&self.group_by, &self.measure) else {
            return Err(ProcessorError::Schema(
                "TopNQuery needs both group_by and aggregate".into(),
            ));
        };
        let partition = self.partition.as_str();
        let fine = fine.as_str();

        let qualifying = table.group_by(&[partition])?.filter(|group| {
            for predicate in &self.having {
                if !predicate.evaluate(group)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })?;

        let totals = qualifying
            .group_by(&[partition, fine])?
            .aggregate_with(&[AggSpec::new(measure, *op).alias(measure)])?;

        let ranked = totals.sort_by(&[SortKey::asc(partition), SortKey::desc(measure)])?;

        debug!(
            "top {} {} by {}({}) within {}: {} of {} rows qualified",
            self.limit,
            fine,
            op.name(),
            measure,
            partition,
            qualifying.row_count(),
            table.row_count()
        );

        Ok(ranked.group_by(&[partition])?.head(self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{Value, column::Column};

    fn make_test_table() -> Table {
        Table::from_columns([
            ("team", Column::from(vec!["x", "x", "y", "x", "y", "z"])),
            ("player", Column::from(vec!["p1", "p2", "p3", "p1", "p4", "p5"])),
            ("points", Column::from(vec![5i64, 9, 4, 4, 4, 1])),
        ])
        .unwrap()
    }

    #[test]
    fn test_top_one_per_partition() {
        let result = TopNQuery::new("team")
            .group_by("player")
            .sum("points")
            .execute(&make_test_table())
            .unwrap();

        assert_eq!(result.headers(), &["team", "player", "points"]);
        assert_eq!(
            result.values("player").unwrap(),
            vec![Value::from("p1"), Value::from("p3"), Value::from("p5")]
        );
        // p1 totals 9 and ties with p2; p1 was seen first
        assert_eq!(result.value(0, "points").unwrap(), Value::Int(9));
    }

    #[test]
    fn test_having_drops_partitions() {
        let result = TopNQuery::new("team")
            .having(GroupPredicate::CountAtLeast(2))
            .group_by("player")
            .sum("points")
            .limit(2)
            .execute(&make_test_table())
            .unwrap();

        assert_eq!(
            result.values("team").unwrap(),
            vec![
                Value::from("x"),
                Value::from("x"),
                Value::from("y"),
                Value::from("y")
            ]
        );
    }

    #[test]
    fn test_incomplete_query_is_rejected() {
        let err = TopNQuery::new("team").execute(&make_test_table()).unwrap_err();
        assert!(err.is_schema_error());
    }
}
