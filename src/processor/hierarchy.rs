use std::collections::HashMap;

use log::debug;

use crate::processor::{
    AggregateOp, ProcessorError, Value,
    aggregate::AggSpec,
    grouped::{GroupKey, GroupedView},
    table::Table,
};

/// A table addressed by an ordered tuple of index-level values.
///
/// Index columns come first in the underlying table, in level order,
/// followed by the value columns.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedTable {
    levels: Vec<String>,
    table: Table,
    lookup: HashMap<GroupKey, Vec<usize>>,
}

impl Table {
    /// Reindexes the table by `levels`.
    ///
    /// # Errors
    /// [`ProcessorError::MissingColumn`] for an unknown level,
    /// [`ProcessorError::Schema`] for an empty or repeated level list.
    pub fn set_index(&self, levels: &[&str]) -> Result<IndexedTable, ProcessorError> {
        IndexedTable::new(self, levels)
    }
}

impl IndexedTable {
    pub fn new(table: &Table, levels: &[&str]) -> Result<Self, ProcessorError> {
        if levels.is_empty() {
            return Err(ProcessorError::Schema("index needs at least one level".into()));
        }
        for (i, level) in levels.iter().enumerate() {
            if levels[..i].contains(level) {
                return Err(ProcessorError::Schema(format!(
                    "Index level '{level}' repeated"
                )));
            }
        }

        let mut order: Vec<&str> = levels.to_vec();
        order.extend(
            table
                .headers()
                .iter()
                .map(String::as_str)
                .filter(|h| !levels.contains(h)),
        );
        let table = table.select(&order)?;

        let mut lookup: HashMap<GroupKey, Vec<usize>> = HashMap::new();
        for row in 0..table.row_count() {
            let key = levels
                .iter()
                .map(|l| table.value(row, l))
                .collect::<Result<Vec<Value>, _>>()?;
            lookup.entry(GroupKey(key)).or_default().push(row);
        }

        Ok(IndexedTable {
            levels: levels.iter().map(|l| l.to_string()).collect(),
            table,
            lookup,
        })
    }

    /// Index level names, in order.
    pub fn index_names(&self) -> &[String] {
        &self.levels
    }

    /// Non-index column names.
    pub fn value_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.table.headers()[self.levels.len()..]
            .iter()
            .map(String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Index levels minus `excluded`, keeping level order. Names that are not
    /// levels are ignored.
    pub fn levels_except(&self, excluded: &[&str]) -> Vec<String> {
        self.levels
            .iter()
            .filter(|l| !excluded.contains(&l.as_str()))
            .cloned()
            .collect()
    }

    /// Groups rows by a subset of the index levels.
    pub fn group_by_levels(&self, levels: &[&str]) -> Result<GroupedView<'_>, ProcessorError> {
        if let Some(bad) = levels.iter().find(|l| !self.levels.iter().any(|x| x == *l)) {
            return Err(ProcessorError::Schema(format!(
                "'{bad}' is not an index level"
            )));
        }
        self.table.group_by(levels)
    }

    /// Collapses every level not in `levels`, aggregating each numeric value
    /// column with `op`. Groups come out ordered by key; value columns keep
    /// their names. Non-numeric value columns are dropped.
    pub fn aggregate_levels(
        &self,
        levels: &[&str],
        op: AggregateOp,
    ) -> Result<IndexedTable, ProcessorError> {
        let view = self.group_by_levels(levels)?.sorted();

        let specs: Vec<AggSpec> = self
            .value_columns()
            .filter(|c| self.table.numeric_col(c).is_ok())
            .map(|c| AggSpec::new(c, op).alias(c))
            .collect();
        if specs.is_empty() {
            return Err(ProcessorError::Schema(
                "no numeric value columns to aggregate".into(),
            ));
        }

        debug!(
            "aggregating {:?} over levels {:?} (collapsing {:?})",
            specs.iter().map(|s| s.column.as_str()).collect::<Vec<_>>(),
            levels,
            self.levels_except(levels)
        );

        view.aggregate_with(&specs)?.set_index(levels)
    }

    /// Sums over `levels`; see [`IndexedTable::aggregate_levels`].
    pub fn sum_levels(&self, levels: &[&str]) -> Result<IndexedTable, ProcessorError> {
        self.aggregate_levels(levels, AggregateOp::Sum)
    }

    /// Rows addressed by a full index key.
    pub fn rows(&self, key: &GroupKey) -> Option<&[usize]> {
        self.lookup.get(key).map(Vec::as_slice)
    }

    /// Value of `column` at the unique row addressed by `key`.
    ///
    /// # Errors
    /// [`ProcessorError::KeyNotFound`] if no row has that key,
    /// [`ProcessorError::Schema`] if the key has the wrong arity or is not
    /// unique.
    pub fn loc(&self, key: &GroupKey, column: &str) -> Result<Value, ProcessorError> {
        if key.values().len() != self.levels.len() {
            return Err(ProcessorError::Schema(format!(
                "Key {} has {} values, index has {} levels",
                key,
                key.values().len(),
                self.levels.len()
            )));
        }
        match self.rows(key) {
            None => Err(ProcessorError::KeyNotFound(key.to_string())),
            Some([row]) => self.table.value(*row, column),
            Some(_) => Err(ProcessorError::Schema(format!(
                "Key {key} addresses more than one row"
            ))),
        }
    }

    /// Flattens back to a plain table with the levels as leading columns.
    pub fn reset_index(&self) -> Table {
        self.table.clone()
    }

    pub fn as_table(&self) -> &Table {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::column::Column;

    fn sample() -> Table {
        Table::from_columns([
            ("Sales", Column::from(vec![1i64, 2, 3, 4])),
            ("Region", Column::from(vec!["N", "N", "S", "N"])),
            ("Month", Column::from(vec!["Jan", "Feb", "Jan", "Jan"])),
        ])
        .unwrap()
    }

    #[test]
    fn test_set_index_moves_levels_first() {
        let indexed = sample().set_index(&["Region", "Month"]).unwrap();
        assert_eq!(indexed.as_table().headers(), &["Region", "Month", "Sales"]);
        assert_eq!(indexed.value_columns().collect::<Vec<_>>(), vec!["Sales"]);
    }

    #[test]
    fn test_levels_except_preserves_order() {
        let indexed = sample().set_index(&["Month", "Region", "Sales"]).unwrap();
        assert_eq!(
            indexed.levels_except(&["Region", "Nope"]),
            vec!["Month".to_string(), "Sales".to_string()]
        );
    }

    #[test]
    fn test_sum_levels_and_loc() {
        let indexed = sample().set_index(&["Region", "Month"]).unwrap();
        let by_region = indexed.sum_levels(&["Region"]).unwrap();
        assert_eq!(
            by_region.loc(&GroupKey::from(vec!["N"]), "Sales").unwrap(),
            Value::Int(7)
        );
        assert!(matches!(
            by_region.loc(&GroupKey::from(vec!["W"]), "Sales"),
            Err(ProcessorError::KeyNotFound(_))
        ));
        // (N, Jan) addresses two rows before aggregation
        assert!(
            indexed
                .loc(&GroupKey::from(vec!["N", "Jan"]), "Sales")
                .unwrap_err()
                .is_schema_error()
        );
    }

    #[test]
    fn test_group_by_non_level_fails() {
        let indexed = sample().set_index(&["Region"]).unwrap();
        assert!(indexed.group_by_levels(&["Month"]).is_err());
        assert!(sample().set_index(&["Region", "Region"]).is_err());
    }
}
