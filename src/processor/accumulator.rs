use rustc_hash::FxHashMap;

use crate::processor::codec::EncodedValue;

/// Running aggregate for a single key, all values in tenths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateEntry {
    pub sum: i64,
    pub min: EncodedValue,
    pub max: EncodedValue,
    pub count: u64,
}

impl AggregateEntry {
    /// Entry for a key seen once
    pub fn new(value: EncodedValue) -> Self {
        AggregateEntry {
            sum: value as i64,
            min: value,
            max: value,
            count: 1,
        }
    }

    #[inline]
    pub fn add(&mut self, value: EncodedValue) {
        self.sum += value as i64;
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Folds another partial aggregate of the same key into this one
    #[inline]
    pub fn merge(&mut self, other: &AggregateEntry) {
        self.sum += other.sum;
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

/// Key -> aggregate map. Keys are raw bytes so the hot loop never allocates
/// for a key it has already seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatorMap {
    entries: FxHashMap<Box<[u8]>, AggregateEntry>,
}

impl AccumulatorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        AccumulatorMap {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Records one value for `key`
    #[inline]
    pub fn add(&mut self, key: &[u8], value: EncodedValue) {
        match self.entries.get_mut(key) {
            Some(entry) => entry.add(value),
            None => {
                self.entries.insert(key.into(), AggregateEntry::new(value));
            }
        }
    }

    /// Folds a partial entry for `key` into the map
    pub fn merge_entry(&mut self, key: Box<[u8]>, other: AggregateEntry) {
        self.entries
            .entry(key)
            .and_modify(|entry| entry.merge(&other))
            .or_insert(other);
    }

    pub fn get(&self, key: &[u8]) -> Option<&AggregateEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry counts, i.e. the number of records folded in
    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|e| e.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &AggregateEntry)> + '_ {
        self.entries.iter().map(|(k, v)| (&**k, v))
    }
}

impl IntoIterator for AccumulatorMap {
    type Item = (Box<[u8]>, AggregateEntry);
    type IntoIter = std::collections::hash_map::IntoIter<Box<[u8]>, AggregateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
