use std::fmt;
use thiserror::Error;

pub mod accumulator;
pub mod aggregator;
pub mod codec;
pub mod formatter;
pub mod merger;
pub mod partitioner;
pub mod worker;

/// Byte that terminates every record
pub const RECORD_TERMINATOR: u8 = b'\n';

/// Default byte between key and value
pub const DEFAULT_DELIMITER: u8 = b';';

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error in partition {partition} ({range}): {source}")]
    RangeIo {
        partition: usize,
        range: ByteRange,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed value {value:?} in partition {partition} at byte {offset}: {reason}")]
    MalformedValue {
        partition: usize,
        offset: u64,
        value: String,
        #[source]
        reason: codec::DecodeError,
    },

    #[error("Malformed record in partition {partition} at byte {offset}: missing key or delimiter")]
    MalformedRecord { partition: usize, offset: u64 },

    #[error("Worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Partition {partition} cancelled")]
    Cancelled { partition: usize },
}

impl AggregatorError {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AggregatorError::Cancelled { .. })
    }
}

/// Contiguous `[from, to)` span of the input assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub from: u64,
    pub to: u64,
}

impl ByteRange {
    pub fn new(from: u64, to: u64) -> Self {
        ByteRange { from, to }
    }

    pub fn len(&self) -> u64 {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

/// How workers get at their byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Map the file once and hand each worker a slice of it
    #[default]
    Mmap,
    /// Each worker opens its own handle and reads through a buffer
    Buffered,
}

/// Diagnostic raised when the merged count disagrees with the advisory one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCountMismatch {
    pub expected: u64,
    pub actual: u64,
}

impl fmt::Display for RecordCountMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid total: expected {} records, aggregated {}",
            self.expected, self.actual
        )
    }
}
