//! # StationAggregator
//!
//! `StationAggregator` computes per-key min / mean / max over very large
//! `key;value` text files, one record per line, using every core available.
//! It supports:
//!
//! - Record-aligned partitioning of the input (no record is ever split)
//! - Memory-mapped or buffered per-worker reads
//! - Fixed-point decoding of `-?d{1,3}.d` values without float parsing
//! - Lock-free partition-local aggregation with order-independent merging
//! - Cancellation of sibling workers on the first malformed record
//!
//! # Output
//!
//! A single line `{key1=min/mean/max,key2=...}`, keys in ascending byte
//! order, one decimal digit per figure, means rounded half away from zero.
//!
//! # Example
//!
//! ```rust,no_run
//! use station_aggregator::{Aggregator, AggregatorConfig, ReadMode};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AggregatorConfig::default()
//!         .with_workers(8)
//!         .with_read_mode(ReadMode::Mmap)
//!         .with_expected_records(Some(1_000_000_000));
//!
//!     let aggregator = Aggregator::new(config)?;
//!     let report = aggregator.run(Path::new("measurements.txt"))?;
//!
//!     if let Some(mismatch) = report.count_mismatch {
//!         eprintln!("{}", mismatch);
//!     }
//!     println!("{}", report.format());
//!
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod generator;
pub mod processor;

pub use processor::{
    AggregatorError, ByteRange, ReadMode, RecordCountMismatch,
    accumulator::{AccumulatorMap, AggregateEntry},
    aggregator::{AggregationReport, Aggregator, AggregatorConfig},
    formatter::ResultRecord,
};
