use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use groupby_engine::sales::{MONTH, PRODUCT, REGION, SALES};
use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};

const REGIONS: [&str; 4] = ["North", "East", "West", "South"];
const PRODUCTS: [&str; 3] = ["A", "B", "C"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Writes a random regional sales CSV for the groupby demo.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of data rows
    #[arg(long, default_value_t = 1_000_000)]
    rows: usize,

    /// Output file
    #[arg(long, default_value = "data/sales_large.csv")]
    path: PathBuf,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let file = File::create(&args.path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{REGION},{PRODUCT},{MONTH},{SALES}")?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    for _ in 0..args.rows {
        let region = REGIONS[rng.random_range(0..REGIONS.len())];
        let product = PRODUCTS[rng.random_range(0..PRODUCTS.len())];
        let month = MONTHS[rng.random_range(0..MONTHS.len())];
        let sales = rng.random_range(50..500);
        writeln!(writer, "{region},{product},{month},{sales}")?;
    }
    writer.flush()?;

    info!("wrote {} rows with seed {}", args.rows, args.seed);
    println!("Sample CSV generated: {}", args.path.display());
    Ok(())
}
