use memchr::memchr;

use crate::processor::RECORD_TERMINATOR;

/// Iterates the records of a buffer, yielding `(offset, record)` with the
/// terminator stripped. A trailing record without a terminator is yielded
/// as well; empty lines are skipped.
pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Records { data, pos: 0 }
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = (usize, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.data.len() {
            let start = self.pos;
            let rest = &self.data[start..];
            let line = match memchr(RECORD_TERMINATOR, rest) {
                Some(nl) => {
                    self.pos = start + nl + 1;
                    &rest[..nl]
                }
                None => {
                    self.pos = self.data.len();
                    rest
                }
            };
            if !line.is_empty() {
                return Some((start, line));
            }
        }
        None
    }
}

/// Splits a record at the first delimiter into `(key, value)`
#[inline]
pub fn split_record(record: &[u8], delimiter: u8) -> Option<(&[u8], &[u8])> {
    let pos = memchr(delimiter, record)?;
    Some((&record[..pos], &record[pos + 1..]))
}

/// Offset just past the first terminator at or after `from`, if any
#[inline]
pub fn next_record_start(data: &[u8], from: usize) -> Option<usize> {
    if from >= data.len() {
        return None;
    }
    memchr(RECORD_TERMINATOR, &data[from..]).map(|nl| from + nl + 1)
}
