use crossbeam_channel::bounded;
use memmap2::Mmap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    fs::File,
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};
use tracing::{debug, error, info};

use crate::processor::{
    AggregatorError, ByteRange, DEFAULT_DELIMITER, ReadMode, RecordCountMismatch,
    accumulator::AccumulatorMap,
    formatter::{self, ResultRecord},
    merger::{check_count, merge_into},
    partitioner::{partition_bytes, partition_reader},
    worker::{PartitionTask, process_file, process_slice},
};

/// Tuning knobs for a run. Defaults to one worker per logical CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub workers: usize,
    pub read_mode: ReadMode,
    pub expected_records: Option<u64>,
    pub delimiter: u8,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            workers: num_cpus::get().max(1),
            read_mode: ReadMode::default(),
            expected_records: None,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl AggregatorConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    /// Advisory record count, only used for the post-merge consistency check
    pub fn with_expected_records(mut self, expected: Option<u64>) -> Self {
        self.expected_records = expected;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct AggregationReport {
    pub merged: AccumulatorMap,
    pub partitions: Vec<ByteRange>,
    pub total_records: u64,
    pub count_mismatch: Option<RecordCountMismatch>,
    pub elapsed: Duration,
}

impl AggregationReport {
    /// The `{key=min/mean/max,...}` line
    pub fn format(&self) -> String {
        formatter::format_results(&self.merged)
    }

    /// Per-key results in ascending key order
    pub fn records(&self) -> Vec<ResultRecord> {
        formatter::records(&self.merged)
    }

    pub fn key_count(&self) -> usize {
        self.merged.len()
    }
}

/// Parallel aggregation engine
///
/// Splits the input into one record-aligned range per worker, aggregates
/// every range on its own thread into a private map and merges the maps as
/// they come back.
///
/// # Examples
///
/// ```rust,no_run
/// # use station_aggregator::{Aggregator, AggregatorConfig};
/// let aggregator = Aggregator::new(AggregatorConfig::default().with_workers(8)).unwrap();
/// let report = aggregator.run("measurements.txt".as_ref()).unwrap();
/// println!("{}", report.format());
/// ```
#[derive(Debug)]
pub struct Aggregator {
    config: AggregatorConfig,
    pool: ThreadPool,
}

impl Aggregator {
    /// Builds the worker pool
    ///
    /// # Errors
    /// [`AggregatorError::InvalidWorkerCount`] for zero workers, or
    /// [`AggregatorError::ThreadPool`] if the pool cannot be started.
    pub fn new(config: AggregatorConfig) -> Result<Self, AggregatorError> {
        if config.workers == 0 {
            return Err(AggregatorError::InvalidWorkerCount(config.workers));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("partition-worker-{i}"))
            .build()?;
        Ok(Aggregator { config, pool })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregates the file at `path`
    ///
    /// # Errors
    /// Returns the first fatal worker error (malformed record or value, IO
    /// failure on a range); the remaining workers are cancelled. A record
    /// count mismatch is not an error and is reported in the result.
    pub fn run(&self, path: &Path) -> Result<AggregationReport, AggregatorError> {
        let started = Instant::now();
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();
        let workers = self.config.workers;

        info!(
            path = %path.display(),
            size,
            workers,
            mode = ?self.config.read_mode,
            "aggregating"
        );

        let (partitions, merged) = match self.config.read_mode {
            ReadMode::Mmap if size == 0 => {
                let partitions = partition_bytes(&[], workers);
                let merged = self.fan_out(&partitions, |task| process_slice(&[], task))?;
                (partitions, merged)
            }
            ReadMode::Mmap => {
                // SAFETY: the input is only read, and is not expected to be
                // modified while a run is in progress
                let mmap = unsafe { Mmap::map(&file)? };
                let partitions = partition_bytes(&mmap, workers);
                let merged = self.fan_out(&partitions, |task| process_slice(&mmap, task))?;
                (partitions, merged)
            }
            ReadMode::Buffered => {
                let partitions = partition_reader(&mut file, size, workers)?;
                drop(file);
                let merged = self.fan_out(&partitions, |task| process_file(path, task))?;
                (partitions, merged)
            }
        };

        Ok(self.finish(partitions, merged, started))
    }

    /// Aggregates an in-memory buffer with the same partitioning as [`run`](Self::run)
    pub fn run_bytes(&self, data: &[u8]) -> Result<AggregationReport, AggregatorError> {
        let started = Instant::now();
        let partitions = partition_bytes(data, self.config.workers);
        let merged = self.fan_out(&partitions, |task| process_slice(data, task))?;
        Ok(self.finish(partitions, merged, started))
    }

    fn finish(
        &self,
        partitions: Vec<ByteRange>,
        merged: AccumulatorMap,
        started: Instant,
    ) -> AggregationReport {
        let total_records = merged.total_count();
        let count_mismatch = check_count(&merged, self.config.expected_records);
        let elapsed = started.elapsed();

        info!(
            records = total_records,
            keys = merged.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "aggregation finished"
        );

        AggregationReport {
            merged,
            partitions,
            total_records,
            count_mismatch,
            elapsed,
        }
    }

    /// Runs one task per range on the pool and merges results as they
    /// arrive. Blocks until every range has reported back.
    fn fan_out<F>(&self, ranges: &[ByteRange], work: F) -> Result<AccumulatorMap, AggregatorError>
    where
        F: Fn(PartitionTask<'_>) -> Result<AccumulatorMap, AggregatorError> + Sync,
    {
        let cancel = AtomicBool::new(false);
        let delimiter = self.config.delimiter;
        let (tx, rx) = bounded(ranges.len());

        self.pool.in_place_scope(|scope| {
            for (index, &range) in ranges.iter().enumerate() {
                let tx = tx.clone();
                let work = &work;
                let cancel = &cancel;
                scope.spawn(move |_| {
                    let task = PartitionTask {
                        index,
                        range,
                        delimiter,
                        cancel,
                    };
                    let result = work(task);
                    if matches!(&result, Err(err) if !err.is_cancellation()) {
                        cancel.store(true, Ordering::Relaxed);
                    }
                    // the receiver outlives the scope
                    let _ = tx.send((index, result));
                });
            }
            drop(tx);

            let mut merged = AccumulatorMap::new();
            let mut failure: Option<AggregatorError> = None;

            for _ in 0..ranges.len() {
                let Ok((index, result)) = rx.recv() else {
                    break;
                };
                match result {
                    Ok(partial) if failure.is_none() => merge_into(&mut merged, partial),
                    Ok(_) => {}
                    Err(err) if err.is_cancellation() => {
                        debug!(partition = index, "partition cancelled");
                    }
                    Err(err) => {
                        error!(partition = index, error = %err, "partition failed, cancelling run");
                        failure.get_or_insert(err);
                    }
                }
            }

            match failure {
                Some(err) => Err(err),
                None => Ok(merged),
            }
        })
    }
}
