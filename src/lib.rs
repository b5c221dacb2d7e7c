//! # groupby_engine
//!
//! `groupby_engine` is an in-memory split-apply-combine engine over small
//! columnar tables. It supports:
//!
//! - Memory-mapped CSV loading with type inference (int, float, string)
//! - Grouping on one or more key columns, in first-seen or sorted key order
//! - Per-group aggregation (count, sum, mean, min, max, custom functions)
//! - Row-aligned transforms and whole-group filters
//! - Hierarchical (multi-level) indexes with level-wise aggregation
//! - Top-N per partition queries
//! - Parallel aggregation with Rayon
//!
//! # Example
//!
//! ```rust
//! use groupby_engine::processor::{AggregateOp, column::Column, table::Table};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = Table::from_columns([
//!         ("Region", Column::from(vec!["North", "East", "North"])),
//!         ("Sales", Column::from(vec![100i64, 200, 150])),
//!     ])?;
//!
//!     // Sum and mean of Sales per Region
//!     let summary = table
//!         .group_by(&["Region"])?
//!         .aggregate("Sales", &[AggregateOp::Sum, AggregateOp::Mean])?;
//!     println!("{summary}");
//!
//!     // Keep only regions whose mean exceeds 120
//!     let kept = table
//!         .group_by(&["Region"])?
//!         .filter(|g| Ok(g.mean("Sales")? > 120.0))?;
//!     assert_eq!(kept.row_count(), 3);
//!
//!     Ok(())
//! }
//! ```

pub mod bench;
pub mod processor;
pub mod sales;
