use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use groupby_engine::{
    processor::{aggregate::Rounding, categorize::CategoryThresholds},
    sales,
};
use jemallocator::Jemalloc;
use log::info;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Example {
    All,
    Agg,
    Transform,
    Filter,
    Category,
    Top,
    Multiindex,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoundingArg {
    HalfEven,
    HalfUp,
}

impl From<RoundingArg> for Rounding {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::HalfEven => Rounding::HalfEven,
            RoundingArg::HalfUp => Rounding::HalfUp,
        }
    }
}

/// Runs the grouped-aggregation examples over the regional sales data.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// CSV with Region, Product, Month and Sales columns (built-in data if omitted)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Which example to run
    #[arg(long, value_enum, default_value_t = Example::All)]
    example: Example,

    /// Category band as LOWER=LABEL; repeatable (default: 200=High, 150=Medium)
    #[arg(long = "threshold", value_parser = parse_threshold)]
    thresholds: Vec<(f64, String)>,

    /// Label for regions below every band
    #[arg(long, default_value = "Low")]
    fallback: String,

    /// Rounding for the percentage column
    #[arg(long, value_enum, default_value_t = RoundingArg::HalfEven)]
    rounding: RoundingArg,

    /// Minimum regional mean for the top-product example
    #[arg(long, default_value_t = 150.0)]
    min_mean: f64,
}

fn parse_threshold(s: &str) -> Result<(f64, String), String> {
    let (lower, label) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LOWER=LABEL, got '{s}'"))?;
    let lower = lower
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad lower bound '{lower}': {e}"))?;
    Ok((lower, label.trim().to_string()))
}

impl Args {
    fn thresholds(&self) -> CategoryThresholds {
        if self.thresholds.is_empty() {
            let defaults = CategoryThresholds::sales(sales::SALES);
            return self
                .thresholds_from(defaults.bands().iter().map(|(l, s)| (*l, s.as_str())));
        }
        self.thresholds_from(self.thresholds.iter().map(|(l, s)| (*l, s.as_str())))
    }

    fn thresholds_from<'a>(
        &self,
        bands: impl Iterator<Item = (f64, &'a str)>,
    ) -> CategoryThresholds {
        bands.fold(
            CategoryThresholds::new(sales::SALES, &self.fallback),
            |acc, (lower, label)| acc.band(lower, label),
        )
    }

    fn runs(&self, example: Example) -> bool {
        self.example == Example::All || self.example == example
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let table = sales::load_example_data(args.csv.as_deref())?;
    info!("loaded {} sales rows", table.row_count());

    println!("Sales data:\n{table}\n");

    if args.runs(Example::Agg) {
        println!("Aggregated Sales:\n{}\n", sales::example_agg(&table)?);
    }
    if args.runs(Example::Transform) {
        let result = sales::example_transform(&table, args.rounding.into())?;
        println!("Sales with percentage of regional total:\n{result}\n");
    }
    if args.runs(Example::Filter) {
        println!(
            "Regions with average sales > 200:\n{}\n",
            sales::example_filter(&table)?
        );
    }
    if args.runs(Example::Category) {
        let result = sales::regional_sales_category(&table, &args.thresholds())?;
        println!("Regional sales categories:\n{result}\n");
    }
    if args.runs(Example::Top) {
        let result = sales::top_products_by_region(&table, args.min_mean)?;
        println!(
            "Top product in regions with average sales > {}:\n{result}\n",
            args.min_mean
        );
    }
    if args.runs(Example::Multiindex) {
        let result = sales::multiindex_groupby_aggregation(&table)?;
        println!(
            "Sales by {}:\n{}\n",
            result.index_names().join(", "),
            result.as_table()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold() {
        assert_eq!(
            parse_threshold("200=High").unwrap(),
            (200.0, "High".to_string())
        );
        assert!(parse_threshold("High").is_err());
        assert!(parse_threshold("x=High").is_err());
    }

    #[test]
    fn test_default_thresholds_use_fallback() {
        let args = Args::parse_from(["groupby-demo", "--fallback", "Quiet"]);
        let thresholds = args.thresholds();
        assert_eq!(thresholds.categorize(243.0), "High");
        assert_eq!(thresholds.categorize(100.0), "Quiet");
    }
}
