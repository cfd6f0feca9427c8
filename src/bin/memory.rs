use std::path::PathBuf;

use station_aggregator::{Aggregator, AggregatorConfig};

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> anyhow::Result<()> {
    let _profiler = dhat::Profiler::new_heap();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("input_c10000_l10000000.csv"));

    let aggregator = Aggregator::new(AggregatorConfig::default())?;
    let report = aggregator.run(&path)?;

    println!(
        "Memory benchmark finished ({} keys). See dhat-heap.json for details",
        report.key_count()
    );
    Ok(())
}
