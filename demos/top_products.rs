use crate::utils::sample_csv_path;
use groupby_engine::processor::{
    loader::load_csv,
    query_builder::{GroupPredicate, TopNQuery},
};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let table = load_csv(path.as_path())?;

    // Best-selling product in each region averaging more than 150
    let top = TopNQuery::new("Region")
        .having(GroupPredicate::mean_greater_than("Sales", 150.0))
        .group_by("Product")
        .sum("Sales")
        .limit(1)
        .execute(&table)?;

    println!("Top product per qualifying region:\n{top}");
    Ok(())
}
