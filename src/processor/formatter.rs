use std::fmt;

use crate::processor::{
    accumulator::{AccumulatorMap, AggregateEntry},
    codec::{self, EncodedValue},
};

/// Final figures for one key, in tenths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub key: String,
    pub min: EncodedValue,
    pub mean: EncodedValue,
    pub max: EncodedValue,
    pub count: u64,
}

impl ResultRecord {
    pub fn from_entry(key: &[u8], entry: &AggregateEntry) -> Self {
        ResultRecord {
            key: String::from_utf8_lossy(key).into_owned(),
            min: entry.min,
            mean: mean_tenths(entry.sum, entry.count),
            max: entry.max,
            count: entry.count,
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.key);
        out.push('=');
        codec::encode_into(out, self.min);
        out.push('/');
        codec::encode_into(out, self.mean);
        out.push('/');
        codec::encode_into(out, self.max);
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::with_capacity(self.key.len() + 20);
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

/// `sum / count` in tenths, rounded half away from zero
pub fn mean_tenths(sum: i64, count: u64) -> EncodedValue {
    if count == 0 {
        return 0;
    }
    let count = count as i128;
    let abs = (sum as i128).abs();
    let rounded = (2 * abs + count) / (2 * count);
    let signed = if sum < 0 { -rounded } else { rounded };
    signed as EncodedValue
}

/// Result records sorted by the byte order of their keys
pub fn records(map: &AccumulatorMap) -> Vec<ResultRecord> {
    let mut entries: Vec<(&[u8], &AggregateEntry)> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, entry)| ResultRecord::from_entry(key, entry))
        .collect()
}

/// Renders `{key1=min/mean/max,key2=...}` with keys in ascending byte order
pub fn format_results(map: &AccumulatorMap) -> String {
    let records = records(map);
    let mut out = String::with_capacity(2 + records.len() * 24);
    out.push('{');
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        record.write_to(&mut out);
    }
    out.push('}');
    out
}
