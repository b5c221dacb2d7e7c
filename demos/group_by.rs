use crate::utils::sample_csv_path;
use groupby_engine::processor::{grouped::GroupKey, loader::load_csv};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let table = load_csv(path.as_path())?;

    // Index by (Region, Product, Month) and collapse the Month level
    let indexed = table.set_index(&["Region", "Product", "Month"])?;
    let levels = indexed.levels_except(&["Month"]);
    let levels: Vec<&str> = levels.iter().map(String::as_str).collect();
    let totals = indexed.sum_levels(&levels)?;

    println!("Sales by {}:\n{}\n", levels.join(", "), totals.as_table());

    let key = GroupKey::from(vec!["East", "A"]);
    println!("Sales for {key} => {}", totals.loc(&key, "Sales")?);
    Ok(())
}
