use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use station_aggregator::generator;

#[derive(Parser, Debug)]
struct Args {
    /// Distinct keys
    #[arg(long, default_value_t = 10_000)]
    cities: usize,
    /// Records to write
    #[arg(long, default_value_t = 10_000_000)]
    lines: u64,
    /// Output file. Defaults to input_c{cities}_l{lines}.csv
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let path = args
        .output
        .unwrap_or_else(|| generator::input_path(args.cities, args.lines));
    generator::generate_file(&path, args.cities, args.lines)
        .with_context(|| format!("writing {}", path.display()))?;

    println!("Sample input generated: {}", path.display());
    Ok(())
}
