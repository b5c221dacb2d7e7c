use crate::utils::sample_csv_path;
use groupby_engine::processor::{FilterPredicate, Value, grouped::mean_above, loader::load_csv};
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let table = load_csv(path.as_path())?;

    // Row filter: Sales > 200
    let rows = table.filter_rows("Sales", &FilterPredicate::GreaterThan(Value::Int(200)))?;
    println!("Rows where Sales > 200:\n{rows}\n");

    // Group filter: whole regions whose mean Sales > 200
    let regions = table.group_by(&["Region"])?.filter(mean_above("Sales", 200.0))?;
    println!("Regions with average Sales > 200:\n{regions}");
    Ok(())
}
