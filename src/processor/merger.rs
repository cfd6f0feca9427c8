use tracing::warn;

use crate::processor::{RecordCountMismatch, accumulator::AccumulatorMap};

/// Folds every entry of `partial` into `target`
pub fn merge_into(target: &mut AccumulatorMap, partial: AccumulatorMap) {
    if target.is_empty() {
        *target = partial;
        return;
    }
    for (key, entry) in partial {
        target.merge_entry(key, entry);
    }
}

/// Combines partition-local maps into one. The result does not depend on
/// the order of `partials`.
pub fn merge<I>(partials: I) -> AccumulatorMap
where
    I: IntoIterator<Item = AccumulatorMap>,
{
    let mut merged = AccumulatorMap::new();
    for partial in partials {
        merge_into(&mut merged, partial);
    }
    merged
}

/// Compares the merged record count against the advisory expected count.
/// A mismatch is logged and returned, never treated as fatal.
pub fn check_count(
    merged: &AccumulatorMap,
    expected: Option<u64>,
) -> Option<RecordCountMismatch> {
    let expected = expected?;
    let actual = merged.total_count();
    if actual == expected {
        return None;
    }
    let mismatch = RecordCountMismatch { expected, actual };
    warn!(expected, actual, "{mismatch}");
    Some(mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::accumulator::AggregateEntry;
    use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

    fn map_of(records: &[(&str, i32)]) -> AccumulatorMap {
        let mut map = AccumulatorMap::new();
        for (k, v) in records {
            map.add(k.as_bytes(), *v);
        }
        map
    }

    #[test]
    fn test_merge_two_maps() {
        let a = map_of(&[("A", 10), ("B", -25)]);
        let b = map_of(&[("A", 30), ("A", 0), ("C", 7)]);
        let merged = merge([a, b]);

        assert_eq!(merged.len(), 3);
        assert_eq!(
            merged.get(b"A"),
            Some(&AggregateEntry {
                sum: 40,
                min: 0,
                max: 30,
                count: 3
            })
        );
        assert_eq!(merged.get(b"B"), Some(&AggregateEntry::new(-25)));
        assert_eq!(merged.get(b"C"), Some(&AggregateEntry::new(7)));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = ["Oslo", "Lima", "Pune", "Kiev", "Baku"];
        let records: Vec<(&str, i32)> = (0..5_000)
            .map(|_| {
                let key = keys[rng.random_range(0..keys.len())];
                (key, rng.random_range(-999..=999))
            })
            .collect();

        let reference = map_of(&records);

        for _ in 0..10 {
            let mut groups: Vec<Vec<(&str, i32)>> = vec![Vec::new(); rng.random_range(1..8)];
            for r in &records {
                let g = rng.random_range(0..groups.len());
                groups[g].push(*r);
            }
            let mut partials: Vec<AccumulatorMap> = groups.iter().map(|g| map_of(g)).collect();
            partials.shuffle(&mut rng);

            let merged = merge(partials);
            assert_eq!(merged, reference);
            assert_eq!(merged.total_count(), records.len() as u64);
        }
    }

    #[test]
    fn test_merge_with_empty_partials() {
        let merged = merge([
            AccumulatorMap::new(),
            map_of(&[("A", 1)]),
            AccumulatorMap::new(),
        ]);
        assert_eq!(merged.total_count(), 1);
        assert!(merge(Vec::new()).is_empty());
    }

    #[test]
    fn test_check_count() {
        let merged = map_of(&[("A", 1), ("B", 2)]);
        assert_eq!(check_count(&merged, None), None);
        assert_eq!(check_count(&merged, Some(2)), None);
        assert_eq!(
            check_count(&merged, Some(3)),
            Some(RecordCountMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
