use crate::utils::sample_csv_path;
use groupby_engine::{
    processor::{aggregate::Rounding, categorize::CategoryThresholds, loader::load_csv},
    sales,
};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let table = load_csv(path.as_path())?;

    // Share of the regional total, per row
    let pct = sales::example_transform(&table, Rounding::HalfEven)?;
    println!("Sales with percentage of regional total:\n{pct}\n");

    // Regional mean broadcast back as a label
    let thresholds = CategoryThresholds::new("Sales", "Low Sales")
        .band(200.0, "High Sales")
        .band(150.0, "Medium Sales");
    let labelled = sales::regional_sales_category(&table, &thresholds)?;
    println!("Regional sales categories:\n{labelled}");
    Ok(())
}
