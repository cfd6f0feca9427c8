use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::helpers::scan_helpers::{Records, split_record};
use crate::processor::{
    AggregatorError, ByteRange, RECORD_TERMINATOR, accumulator::AccumulatorMap, codec,
};

/// Expected number of distinct keys per partition, used to presize maps
pub const KEY_CAPACITY_HINT: usize = 10_000;

const READ_BUFFER: usize = 1 << 20;

/// Everything a worker needs besides the bytes themselves
#[derive(Debug, Clone, Copy)]
pub struct PartitionTask<'a> {
    pub index: usize,
    pub range: ByteRange,
    pub delimiter: u8,
    pub cancel: &'a AtomicBool,
}

impl PartitionTask<'_> {
    #[inline]
    fn check_cancelled(&self) -> Result<(), AggregatorError> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(AggregatorError::Cancelled {
                partition: self.index,
            })
        } else {
            Ok(())
        }
    }

    #[inline]
    fn fold_record(
        &self,
        map: &mut AccumulatorMap,
        record: &[u8],
        offset: u64,
    ) -> Result<(), AggregatorError> {
        let (key, value) = split_record(record, self.delimiter)
            .filter(|(key, _)| !key.is_empty())
            .ok_or(AggregatorError::MalformedRecord {
                partition: self.index,
                offset,
            })?;

        let value = codec::decode(value).map_err(|reason| AggregatorError::MalformedValue {
            partition: self.index,
            offset,
            value: String::from_utf8_lossy(value).into_owned(),
            reason,
        })?;

        map.add(key, value);
        Ok(())
    }

    fn finish(&self, map: AccumulatorMap) -> AccumulatorMap {
        debug!(
            partition = self.index,
            range = %self.range,
            records = map.total_count(),
            keys = map.len(),
            "partition done"
        );
        map
    }
}

/// Aggregates the records of `task.range` within `data`, where `data` is the
/// whole input (typically a memory map).
pub fn process_slice(
    data: &[u8],
    task: PartitionTask<'_>,
) -> Result<AccumulatorMap, AggregatorError> {
    if task.range.is_empty() {
        return Ok(AccumulatorMap::new());
    }

    let end = (task.range.to as usize).min(data.len());
    let start = (task.range.from as usize).min(end);
    let chunk = &data[start..end];

    let mut map = AccumulatorMap::with_capacity(KEY_CAPACITY_HINT);
    for (offset, record) in Records::new(chunk) {
        task.check_cancelled()?;
        task.fold_record(&mut map, record, task.range.from + offset as u64)?;
    }

    Ok(task.finish(map))
}

/// Aggregates the records of `task.range` by opening `path`, seeking to the
/// start of the range and reading sequentially up to its end.
pub fn process_file(
    path: &Path,
    task: PartitionTask<'_>,
) -> Result<AccumulatorMap, AggregatorError> {
    if task.range.is_empty() {
        return Ok(AccumulatorMap::new());
    }

    let io_err = |source: io::Error| AggregatorError::RangeIo {
        partition: task.index,
        range: task.range,
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    file.seek(SeekFrom::Start(task.range.from)).map_err(io_err)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER, file.take(task.range.len()));

    let mut map = AccumulatorMap::with_capacity(KEY_CAPACITY_HINT);
    let mut line = Vec::with_capacity(128);
    let mut offset = task.range.from;

    loop {
        line.clear();
        let read = reader
            .read_until(RECORD_TERMINATOR, &mut line)
            .map_err(io_err)?;
        if read == 0 {
            break;
        }
        task.check_cancelled()?;

        let record = line.strip_suffix(&[RECORD_TERMINATOR]).unwrap_or(&line[..]);
        if !record.is_empty() {
            task.fold_record(&mut map, record, offset)?;
        }
        offset += read as u64;
    }

    Ok(task.finish(map))
}
