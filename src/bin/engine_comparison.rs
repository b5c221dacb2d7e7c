use std::error::Error;

use clap::Parser;
use groupby_engine::bench::{ParallelEngine, SequentialEngine, compare, synthetic_workload};

/// Times a group-by sum on the sequential and parallel engines.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of rows in the synthetic table
    #[arg(long, default_value_t = 10_000_000)]
    rows: usize,

    /// Keys are drawn from 1..cardinality
    #[arg(long, default_value_t = 100)]
    cardinality: i64,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let workload = synthetic_workload(args.rows, args.cardinality, args.seed)?;
    let comparison = compare(&SequentialEngine, &ParallelEngine, &workload)?;

    println!("{comparison}");
    Ok(())
}
