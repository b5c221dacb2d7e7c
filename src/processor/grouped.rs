use std::collections::HashMap;
use std::fmt;

use log::debug;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::processor::{
    AggregateOp, ProcessorError, Value,
    aggregate::{AggSpec, aggregate_rows},
    column::Column,
    table::Table,
};

/// Tuple of grouping-column values identifying one group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(pub Vec<Value>);

impl GroupKey {
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl<V: Into<Value>> From<Vec<V>> for GroupKey {
    fn from(values: Vec<V>) -> Self {
        GroupKey(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            values => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone)]
struct GroupEntry {
    key: GroupKey,
    rows: Vec<usize>,
}

/// Borrowed view of one group: its key and the positions of its rows in the
/// source table, in original row order.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    table: &'a Table,
    key: &'a GroupKey,
    rows: &'a [usize],
}

impl<'a> Group<'a> {
    pub fn key(&self) -> &'a GroupKey {
        self.key
    }

    /// Row positions in the source table.
    pub fn rows(&self) -> &'a [usize] {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn values(&self, column: &str) -> Result<Vec<Value>, ProcessorError> {
        let col = self.table.get_col(column)?;
        Ok(self.rows.iter().filter_map(|&r| col.get(r)).collect())
    }

    pub fn aggregate(&self, column: &str, op: AggregateOp) -> Result<Value, ProcessorError> {
        let col = self.table.numeric_col(column)?;
        aggregate_rows(col, column, &op.into(), self.rows)
    }

    pub fn mean(&self, column: &str) -> Result<f64, ProcessorError> {
        self.aggregate(column, AggregateOp::Mean)?.as_f64()
    }

    pub fn sum(&self, column: &str) -> Result<f64, ProcessorError> {
        self.aggregate(column, AggregateOp::Sum)?.as_f64()
    }

    /// The group's rows as a standalone table.
    pub fn to_table(&self) -> Table {
        self.table.take_rows(self.rows)
    }
}

/// A partition of a [`Table`] into groups, addressable by key.
///
/// Groups are kept in first-seen order; [`GroupedView::sorted`] orders them
/// by key instead.
#[derive(Debug, Clone)]
pub struct GroupedView<'a> {
    table: &'a Table,
    by: Vec<String>,
    groups: Vec<GroupEntry>,
    index: HashMap<GroupKey, usize>,
}

impl Table {
    /// Partitions rows by the values of `columns`.
    ///
    /// # Errors
    /// [`ProcessorError::MissingColumn`] for an unknown column,
    /// [`ProcessorError::Schema`] for an empty column list.
    pub fn group_by(&self, columns: &[&str]) -> Result<GroupedView<'_>, ProcessorError> {
        GroupedView::new(self, columns)
    }
}

impl<'a> GroupedView<'a> {
    pub fn new(table: &'a Table, columns: &[&str]) -> Result<Self, ProcessorError> {
        if columns.is_empty() {
            return Err(ProcessorError::Schema(
                "group_by needs at least one column".into(),
            ));
        }
        let key_cols = columns
            .iter()
            .map(|name| table.get_col(name))
            .collect::<Result<Vec<&Column>, _>>()?;

        let mut groups: Vec<GroupEntry> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();

        for row in 0..table.row_count() {
            let key = GroupKey(key_cols.iter().filter_map(|c| c.get(row)).collect());
            match index.get(&key) {
                Some(&g) => groups[g].rows.push(row),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(GroupEntry {
                        key,
                        rows: vec![row],
                    });
                }
            }
        }

        debug!(
            "grouped {} rows into {} groups by {:?}",
            table.row_count(),
            groups.len(),
            columns
        );

        Ok(GroupedView {
            table,
            by: columns.iter().map(|c| c.to_string()).collect(),
            groups,
            index,
        })
    }

    /// Grouping column names.
    pub fn by(&self) -> &[String] {
        &self.by
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> + '_ {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn groups(&self) -> impl Iterator<Item = Group<'_>> + '_ {
        self.groups.iter().map(|g| self.view(g))
    }

    pub fn get(&self, key: &GroupKey) -> Option<Group<'_>> {
        self.index.get(key).map(|&g| self.view(&self.groups[g]))
    }

    fn view<'s>(&'s self, entry: &'s GroupEntry) -> Group<'s> {
        Group {
            table: self.table,
            key: &entry.key,
            rows: &entry.rows,
        }
    }

    /// Same partition with groups ordered by key ascending.
    pub fn sorted(mut self) -> Self {
        self.groups.sort_by(|a, b| a.key.cmp(&b.key));
        self.index = self
            .groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.key.clone(), i))
            .collect();
        self
    }

    /// Aggregates `target` with each of `ops`; one output row per group.
    ///
    /// Output columns are the grouping columns followed by
    /// `<target>_<op>` for each op.
    pub fn aggregate(&self, target: &str, ops: &[AggregateOp]) -> Result<Table, ProcessorError> {
        let specs: Vec<AggSpec> = ops.iter().map(|&op| AggSpec::new(target, op)).collect();
        self.aggregate_with(&specs)
    }

    /// Aggregates with explicit `(column, function, alias)` specs.
    pub fn aggregate_with(&self, specs: &[AggSpec]) -> Result<Table, ProcessorError> {
        let cols = self.resolve_specs(specs)?;
        let results = self
            .groups
            .iter()
            .map(|g| aggregate_group(g, specs, &cols))
            .collect::<Result<Vec<_>, _>>()?;
        self.build_output(specs, results)
    }

    /// [`GroupedView::aggregate_with`] computed across groups in parallel.
    ///
    /// Each group is still reduced sequentially, so results are identical to
    /// the sequential version.
    pub fn aggregate_par(&self, specs: &[AggSpec]) -> Result<Table, ProcessorError> {
        let cols = self.resolve_specs(specs)?;
        let results = self
            .groups
            .par_iter()
            .map(|g| aggregate_group(g, specs, &cols))
            .collect::<Result<Vec<_>, _>>()?;
        self.build_output(specs, results)
    }

    fn resolve_specs(&self, specs: &[AggSpec]) -> Result<Vec<&'a Column>, ProcessorError> {
        if specs.is_empty() {
            return Err(ProcessorError::Schema(
                "aggregate needs at least one function".into(),
            ));
        }
        specs
            .iter()
            .map(|s| self.table.numeric_col(&s.column))
            .collect()
    }

    fn build_output(
        &self,
        specs: &[AggSpec],
        results: Vec<Vec<Value>>,
    ) -> Result<Table, ProcessorError> {
        let mut columns: Vec<(String, Column)> = Vec::with_capacity(self.by.len() + specs.len());

        for (k, name) in self.by.iter().enumerate() {
            let values = self.groups.iter().map(|g| g.key.0[k].clone()).collect();
            columns.push((name.clone(), Column::from_values(values)?));
        }

        for (s, spec) in specs.iter().enumerate() {
            let values = results.iter().map(|r| r[s].clone()).collect();
            columns.push((spec.output_name(), Column::from_values(values)?));
        }

        Table::from_columns(columns)
    }

    /// Applies `f` to each group's `target` values and scatters the outputs
    /// back to row positions.
    ///
    /// The result has one value per table row, in table row order, whatever
    /// the group layout.
    ///
    /// # Errors
    /// [`ProcessorError::TransformLength`] if `f` returns a different number
    /// of values than it was given.
    pub fn transform<F>(&self, target: &str, mut f: F) -> Result<Vec<Value>, ProcessorError>
    where
        F: FnMut(&[Value]) -> Result<Vec<Value>, ProcessorError>,
    {
        self.table.get_col(target)?;
        self.transform_groups(|group| f(&group.values(target)?))
    }

    /// Like [`GroupedView::transform`] but `f` sees the whole group.
    pub fn transform_groups<F>(&self, mut f: F) -> Result<Vec<Value>, ProcessorError>
    where
        F: FnMut(&Group<'_>) -> Result<Vec<Value>, ProcessorError>,
    {
        let mut out: Vec<Option<Value>> = vec![None; self.table.row_count()];

        for group in self.groups() {
            let outputs = f(&group)?;
            if outputs.len() != group.len() {
                return Err(ProcessorError::TransformLength {
                    expected: group.len(),
                    got: outputs.len(),
                });
            }
            for (&row, value) in group.rows().iter().zip(outputs) {
                out[row] = Some(value);
            }
        }

        out.into_iter()
            .collect::<Option<Vec<Value>>>()
            .ok_or_else(|| ProcessorError::Schema("transform left rows unassigned".into()))
    }

    /// Keeps every row of the groups for which `predicate` holds, dropping
    /// the other groups whole. Row order is preserved.
    pub fn filter<F>(&self, mut predicate: F) -> Result<Table, ProcessorError>
    where
        F: FnMut(&Group<'_>) -> Result<bool, ProcessorError>,
    {
        let mut keep: Vec<usize> = Vec::new();
        for group in self.groups() {
            if predicate(&group)? {
                keep.extend_from_slice(group.rows());
            }
        }
        keep.sort_unstable();

        debug!(
            "group filter kept {} of {} rows",
            keep.len(),
            self.table.row_count()
        );
        Ok(self.table.take_rows(&keep))
    }

    /// First `n` rows of every group, in table row order.
    pub fn head(&self, n: usize) -> Table {
        let mut keep: Vec<usize> = self
            .groups
            .iter()
            .flat_map(|g| g.rows.iter().take(n).copied())
            .collect();
        keep.sort_unstable();
        self.table.take_rows(&keep)
    }
}

fn aggregate_group(
    group: &GroupEntry,
    specs: &[AggSpec],
    cols: &[&Column],
) -> Result<Vec<Value>, ProcessorError> {
    specs
        .iter()
        .zip(cols)
        .map(|(spec, col)| aggregate_rows(col, &spec.column, &spec.func, &group.rows))
        .collect()
}

/// Convenience for the common "mean of column above threshold" group filter.
pub fn mean_above(
    column: &str,
    threshold: f64,
) -> impl Fn(&Group<'_>) -> Result<bool, ProcessorError> + '_ {
    move |group: &Group<'_>| Ok(group.mean(column)? > threshold)
}
