//! Splits the input into record-aligned byte ranges, one per worker.
//!
//! The file is cut into `count` spans of `size / count` bytes. Every inner
//! cut is then moved forward to just past the next record terminator at or
//! after it, so that no range starts or ends in the middle of a record. The
//! last range always ends at `size`. A cut that finds no terminator before
//! EOF lands on EOF, and a cut that would fall behind its predecessor is
//! pinned to it, which leaves an empty range.

use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::helpers::scan_helpers::next_record_start;
use crate::processor::{ByteRange, RECORD_TERMINATOR};

fn partition_with<E, F>(size: u64, count: usize, mut advance: F) -> Result<Vec<ByteRange>, E>
where
    F: FnMut(u64) -> Result<Option<u64>, E>,
{
    if count == 0 {
        return Ok(Vec::new());
    }

    let chunk_size = size / count as u64;
    let mut bounds = Vec::with_capacity(count + 1);
    bounds.push(0u64);

    for i in 1..count {
        let prev = *bounds.last().unwrap_or(&0);
        let candidate = chunk_size * i as u64;

        let bound = if candidate <= prev {
            prev
        } else if candidate >= size {
            size
        } else {
            match advance(candidate)? {
                Some(next) => next,
                None => {
                    debug!(candidate, size, "no terminator before EOF, cutting at EOF");
                    size
                }
            }
        };
        bounds.push(bound);
    }
    bounds.push(size);

    Ok(bounds
        .windows(2)
        .map(|w| ByteRange::new(w[0], w[1]))
        .collect())
}

/// Partitions an in-memory buffer (e.g. a memory map)
pub fn partition_bytes(data: &[u8], count: usize) -> Vec<ByteRange> {
    let advance = |candidate: u64| -> Result<Option<u64>, Infallible> {
        Ok(next_record_start(data, candidate as usize).map(|p| p as u64))
    };
    match partition_with(data.len() as u64, count, advance) {
        Ok(ranges) => ranges,
        Err(never) => match never {},
    }
}

/// Partitions `size` bytes of a seekable source by probing it at each cut
pub fn partition_reader<R: Read + Seek>(
    reader: &mut R,
    size: u64,
    count: usize,
) -> io::Result<Vec<ByteRange>> {
    let mut line = Vec::with_capacity(128);
    partition_with(size, count, |candidate| {
        reader.seek(SeekFrom::Start(candidate))?;
        line.clear();
        let read = BufReader::with_capacity(4096, &mut *reader)
            .read_until(RECORD_TERMINATOR, &mut line)?;
        if line.last() == Some(&RECORD_TERMINATOR) {
            Ok(Some(candidate + read as u64))
        } else {
            Ok(None)
        }
    })
}

/// Opens `path` and partitions it into `count` ranges
pub fn partition_file(path: &Path, count: usize) -> io::Result<Vec<ByteRange>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    partition_reader(&mut file, size, count)
}
