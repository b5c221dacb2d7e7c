//! Worked grouping examples over a small regional sales dataset.
//!
//! Every function takes the table by reference and returns a new value;
//! nothing here prints.

use std::path::Path;

use crate::processor::{
    AggregateOp, ProcessorError,
    aggregate::{Rounding, percent_of_total},
    categorize::{GroupLabeler, categorize},
    column::Column,
    grouped::mean_above,
    hierarchy::IndexedTable,
    loader::{CsvSource, TableSource},
    query_builder::{GroupPredicate, TopNQuery},
    table::{SortKey, Table},
};

pub const REGION: &str = "Region";
pub const PRODUCT: &str = "Product";
pub const MONTH: &str = "Month";
pub const SALES: &str = "Sales";

pub const PCT_COLUMN: &str = "Sales_Pct_Region";
pub const CATEGORY_COLUMN: &str = "Regional_Sales_Category";

/// The nine-row example dataset.
pub fn example_data() -> Result<Table, ProcessorError> {
    Table::from_columns([
        (
            REGION,
            Column::from(vec![
                "North", "North", "East", "East", "West", "West", "North", "East", "West",
            ]),
        ),
        (
            PRODUCT,
            Column::from(vec!["A", "B", "A", "B", "A", "B", "B", "A", "A"]),
        ),
        (
            MONTH,
            Column::from(vec![
                "Jan", "Feb", "Jan", "Feb", "Jan", "Feb", "Mar", "Mar", "Mar",
            ]),
        ),
        (
            SALES,
            Column::from(vec![100i64, 150, 200, 250, 120, 180, 220, 280, 150]),
        ),
    ])
}

/// Loads `path` as CSV when given, otherwise returns [`example_data`].
pub fn load_example_data(path: Option<&Path>) -> Result<Table, ProcessorError> {
    match path {
        Some(path) => CsvSource::new().load(path),
        None => example_data(),
    }
}

fn display_order(table: &Table) -> Result<Table, ProcessorError> {
    table.sort_by(&[
        SortKey::asc(REGION),
        SortKey::asc(PRODUCT),
        SortKey::asc(MONTH),
    ])
}

/// Count, sum, mean and max of Sales for each (Region, Product), ordered by key.
pub fn example_agg(table: &Table) -> Result<Table, ProcessorError> {
    table.group_by(&[REGION, PRODUCT])?.sorted().aggregate(
        SALES,
        &[
            AggregateOp::Count,
            AggregateOp::Sum,
            AggregateOp::Mean,
            AggregateOp::Max,
        ],
    )
}

/// Adds each row's share of its region's total sales, in percent.
pub fn example_transform(table: &Table, rounding: Rounding) -> Result<Table, ProcessorError> {
    let pct = table
        .group_by(&[REGION])?
        .transform(SALES, |values| percent_of_total(values, rounding))?;
    let table = table.clone().with_values(PCT_COLUMN, pct)?;
    display_order(&table)
}

/// Rows of the regions whose mean sales exceed 200.
pub fn example_filter(table: &Table) -> Result<Table, ProcessorError> {
    let kept = table.group_by(&[REGION])?.filter(mean_above(SALES, 200.0))?;
    display_order(&kept)
}

/// Adds a per-region label computed by `labeler`, e.g.
/// [`CategoryThresholds::sales`](crate::processor::categorize::CategoryThresholds::sales).
pub fn regional_sales_category<L>(table: &Table, labeler: &L) -> Result<Table, ProcessorError>
where
    L: GroupLabeler + ?Sized,
{
    let labels = categorize(&table.group_by(&[REGION])?, labeler)?;
    let table = table.clone().with_values(CATEGORY_COLUMN, labels)?;
    display_order(&table)
}

/// Top-selling product in each region whose mean sales exceed `min_mean`.
pub fn top_products_by_region(table: &Table, min_mean: f64) -> Result<Table, ProcessorError> {
    TopNQuery::new(REGION)
        .having(GroupPredicate::mean_greater_than(SALES, min_mean))
        .group_by(PRODUCT)
        .sum(SALES)
        .limit(1)
        .execute(table)
}

/// Sales per (Region, Product): index by (Region, Product, Month) and sum
/// over every level except Month.
pub fn multiindex_groupby_aggregation(table: &Table) -> Result<IndexedTable, ProcessorError> {
    let indexed = table.set_index(&[REGION, PRODUCT, MONTH])?;
    let levels = indexed.levels_except(&[MONTH]);
    let levels: Vec<&str> = levels.iter().map(String::as_str).collect();
    indexed.sum_levels(&levels)
}
