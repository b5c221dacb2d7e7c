//! Per-group labels broadcast to every member row.
//!
//! The labeling strategy is passed in by the caller: anything implementing
//! [`GroupLabeler`], including plain closures.

use crate::processor::{
    ProcessorError, Value,
    grouped::{Group, GroupedView},
};

/// Computes one label for a whole group.
pub trait GroupLabeler {
    fn label(&self, group: &Group<'_>) -> Result<Value, ProcessorError>;
}

impl<F> GroupLabeler for F
where
    F: Fn(&Group<'_>) -> Result<Value, ProcessorError>,
{
    fn label(&self, group: &Group<'_>) -> Result<Value, ProcessorError> {
        self(group)
    }
}

/// Labels a group by the mean of one column against descending lower bounds.
///
/// A mean strictly greater than a bound takes that bound's label; bounds are
/// checked from highest to lowest and the first match wins. Anything else
/// (including a NaN mean) gets the fallback label.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryThresholds {
    column: String,
    bands: Vec<(f64, String)>,
    fallback: String,
}

impl CategoryThresholds {
    pub fn new(column: &str, fallback: &str) -> Self {
        CategoryThresholds {
            column: column.to_string(),
            bands: Vec::new(),
            fallback: fallback.to_string(),
        }
    }

    /// Adds a `(lower bound, label)` band. Order of calls does not matter.
    pub fn band(mut self, lower: f64, label: &str) -> Self {
        self.bands.push((lower, label.to_string()));
        self.bands.sort_by(|a, b| b.0.total_cmp(&a.0));
        self
    }

    /// `> 200` High, `> 150` Medium, otherwise Low, on `column`.
    pub fn sales(column: &str) -> Self {
        CategoryThresholds::new(column, "Low")
            .band(200.0, "High")
            .band(150.0, "Medium")
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn bands(&self) -> &[(f64, String)] {
        &self.bands
    }

    pub fn categorize(&self, mean: f64) -> &str {
        self.bands
            .iter()
            .find(|(lower, _)| mean > *lower)
            .map_or(self.fallback.as_str(), |(_, label)| label.as_str())
    }
}

impl GroupLabeler for CategoryThresholds {
    fn label(&self, group: &Group<'_>) -> Result<Value, ProcessorError> {
        let mean = group.mean(&self.column)?;
        Ok(Value::from(self.categorize(mean)))
    }
}

/// Labels every row with its group's label, in table row order.
pub fn categorize<L>(view: &GroupedView<'_>, labeler: &L) -> Result<Vec<Value>, ProcessorError>
where
    L: GroupLabeler + ?Sized,
{
    view.transform_groups(|group| {
        let label = labeler.label(group)?;
        Ok(vec![label; group.len()])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{column::Column, table::Table};

    #[test]
    fn test_thresholds_first_match_from_highest() {
        let t = CategoryThresholds::sales("Sales");
        assert_eq!(t.categorize(243.33), "High");
        assert_eq!(t.categorize(200.0), "Medium");
        assert_eq!(t.categorize(156.67), "Medium");
        assert_eq!(t.categorize(150.0), "Low");
        assert_eq!(t.categorize(f64::NAN), "Low");
    }

    #[test]
    fn test_band_order_does_not_matter() {
        let a = CategoryThresholds::new("x", "none")
            .band(1.0, "one")
            .band(10.0, "ten");
        let b = CategoryThresholds::new("x", "none")
            .band(10.0, "ten")
            .band(1.0, "one");
        assert_eq!(a, b);
        assert_eq!(a.categorize(5.0), "one");
    }

    #[test]
    fn test_closure_labeler_is_broadcast() {
        let table = Table::from_columns([
            ("k", Column::from(vec!["a", "b", "a"])),
            ("v", Column::from(vec![1i64, 2, 3])),
        ])
        .unwrap();
        let view = table.group_by(&["k"]).unwrap();
        let labeler = |g: &Group<'_>| Ok::<_, ProcessorError>(Value::Int(g.len() as i64));
        let labels = categorize(&view, &labeler).unwrap();
        assert_eq!(labels, vec![Value::Int(2), Value::Int(1), Value::Int(2)]);
    }
}
