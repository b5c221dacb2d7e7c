use crate::utils::sample_csv_path;
use groupby_engine::processor::{
    AggregateOp,
    aggregate::{AggSpec, AggregateFn},
    loader::load_csv,
};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let table = load_csv(path.as_path())?;

    // Count, sum, mean and max of Sales per (Region, Product)
    let ops = [
        AggregateOp::Count,
        AggregateOp::Sum,
        AggregateOp::Mean,
        AggregateOp::Max,
    ];
    let summary = table
        .group_by(&["Region", "Product"])?
        .sorted()
        .aggregate("Sales", &ops)?;
    println!("Aggregated Sales:\n{summary}\n");

    // Custom aggregate with an explicit output name
    let spread = AggregateFn::custom("range", |v| {
        let max = v.iter().cloned().fold(f64::MIN, f64::max);
        let min = v.iter().cloned().fold(f64::MAX, f64::min);
        max - min
    });
    let ranges = table
        .group_by(&["Region"])?
        .sorted()
        .aggregate_with(&[AggSpec::new("Sales", spread).alias("Sales_spread")])?;
    println!("Sales spread per region:\n{ranges}");

    Ok(())
}
