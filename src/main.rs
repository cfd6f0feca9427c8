use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use jemallocator::Jemalloc;
use station_aggregator::{Aggregator, AggregatorConfig, ReadMode, generator};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const BILLION: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Mmap,
    Buffered,
}

impl From<Mode> for ReadMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mmap => ReadMode::Mmap,
            Mode::Buffered => ReadMode::Buffered,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Per-key min/mean/max over a key;value file")]
struct Args {
    /// Input file. Defaults to input_c{cities}_l{lines}.csv, generated if missing
    #[arg(long)]
    input: Option<PathBuf>,
    /// Number of workers
    #[arg(long, default_value_t = num_cpus::get())]
    cores: usize,
    /// Distinct keys when generating input
    #[arg(long, default_value_t = 10_000)]
    cities: usize,
    /// Records when generating input
    #[arg(long, default_value_t = 10_000_000)]
    lines: u64,
    /// Expected record count, checked after the run
    #[arg(long)]
    expected_lines: Option<u64>,
    /// Where the result line is written
    #[arg(long, default_value = "results.txt")]
    output: PathBuf,
    /// Read only: do not write the result file
    #[arg(long)]
    ro: bool,
    /// How workers read their range
    #[arg(long, value_enum, default_value_t = Mode::Mmap)]
    mode: Mode,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let (input, expected, expected_keys) = match &args.input {
        Some(path) => (path.clone(), args.expected_lines, None),
        None => {
            let path = generator::input_path(args.cities, args.lines);
            if !path.exists() {
                generator::generate_file(&path, args.cities, args.lines)
                    .with_context(|| format!("generating {}", path.display()))?;
            }
            (
                path,
                args.expected_lines.or(Some(args.lines)),
                Some(args.cities),
            )
        }
    };

    let config = AggregatorConfig::default()
        .with_workers(args.cores)
        .with_read_mode(args.mode.into())
        .with_expected_records(expected);
    let aggregator = Aggregator::new(config).context("starting worker pool")?;

    info!(
        "running {} workers on {} CPU cores",
        aggregator.config().workers,
        num_cpus::get()
    );

    let report = aggregator
        .run(&input)
        .with_context(|| format!("aggregating {}", input.display()))?;
    let formatted = report.format();
    let secs = report.elapsed.as_secs_f64();

    if let Some(keys) = expected_keys {
        if report.key_count() != keys {
            warn!(expected = keys, got = report.key_count(), "invalid results");
        }
    }

    let records = report.total_records.max(1) as f64;
    info!(
        "done in {:.1} seconds (would be {:.1} seconds for 1B)",
        secs,
        secs * (BILLION / records)
    );

    if !args.ro {
        fs::write(&args.output, &formatted)
            .with_context(|| format!("writing {}", args.output.display()))?;
        info!("results written to {}", args.output.display());
    }

    Ok(())
}
