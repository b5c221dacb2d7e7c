use groupby_engine::{
    bench::{AggregationEngine, SequentialEngine, synthetic_workload},
    processor::ProcessorError,
};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> Result<(), ProcessorError> {
    let _profiler = dhat::Profiler::new_heap();

    let workload = synthetic_workload(1_000_000, 100, 42)?;

    // Run aggregation
    let result = SequentialEngine.group_sum(&workload)?;

    println!(
        "Memory benchmark finished ({} groups). See dhat-heap.json for details",
        result.row_count()
    );
    Ok(())
}
