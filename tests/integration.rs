use std::collections::BTreeMap;
use std::io::Write;

use rand::{SeedableRng, rngs::StdRng};
use station_aggregator::{
    Aggregator, AggregatorConfig, AggregatorError, ReadMode, generator,
    processor::formatter::mean_tenths,
};
use tempfile::NamedTempFile;

fn generated_file(cities: usize, lines: u64, seed: u64) -> (NamedTempFile, String) {
    let mut buf = Vec::new();
    generator::generate(&mut buf, &mut StdRng::seed_from_u64(seed), cities, lines).unwrap();

    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&buf).unwrap();
    tmp.flush().unwrap();
    (tmp, String::from_utf8(buf).unwrap())
}

fn aggregator(workers: usize, mode: ReadMode) -> Aggregator {
    Aggregator::new(
        AggregatorConfig::default()
            .with_workers(workers)
            .with_read_mode(mode),
    )
    .unwrap()
}

/// Single-threaded float-parsing reference: key -> (sum, min, max, count) in tenths
fn reference(contents: &str) -> BTreeMap<String, (i64, i32, i32, u64)> {
    let mut out = BTreeMap::new();
    for line in contents.lines() {
        let (key, value) = line.split_once(';').unwrap();
        let tenths = (value.parse::<f64>().unwrap() * 10.0).round() as i32;
        let e = out
            .entry(key.to_string())
            .or_insert((0i64, i32::MAX, i32::MIN, 0u64));
        e.0 += tenths as i64;
        e.1 = e.1.min(tenths);
        e.2 = e.2.max(tenths);
        e.3 += 1;
    }
    out
}

#[test]
fn test_matches_reference_aggregation() {
    let (tmp, contents) = generated_file(50, 20_000, 11);
    let expected = reference(&contents);

    let report = aggregator(4, ReadMode::Mmap).run(tmp.path()).unwrap();
    let records = report.records();
    assert_eq!(records.len(), expected.len());

    for (record, (key, (sum, min, max, count))) in records.iter().zip(expected.iter()) {
        assert_eq!(&record.key, key);
        assert_eq!(record.min, *min);
        assert_eq!(record.max, *max);
        assert_eq!(record.count, *count);
        assert_eq!(record.mean, mean_tenths(*sum, *count));
    }
}

#[test]
fn test_single_partition_equivalence() {
    let (tmp, _) = generated_file(200, 30_000, 3);
    let baseline = aggregator(1, ReadMode::Mmap).run(tmp.path()).unwrap().format();

    for workers in [2, 3, 4, 7, 16, 64] {
        for mode in [ReadMode::Mmap, ReadMode::Buffered] {
            let report = aggregator(workers, mode).run(tmp.path()).unwrap();
            assert_eq!(report.format(), baseline, "workers={workers} mode={mode:?}");
        }
    }
}

#[test]
fn test_count_conservation() {
    let lines = 12_345;
    let (tmp, _) = generated_file(97, lines, 5);
    for workers in 1..12 {
        let aggregator = Aggregator::new(
            AggregatorConfig::default()
                .with_workers(workers)
                .with_expected_records(Some(lines)),
        )
        .unwrap();
        let report = aggregator.run(tmp.path()).unwrap();
        assert_eq!(report.total_records, lines);
        assert_eq!(report.count_mismatch, None);
        assert_eq!(report.partitions.len(), workers);
    }
}

#[test]
fn test_missing_trailing_newline() {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "Oslo;-3.0\nLima;20.1\nOslo;1.0").unwrap();
    tmp.flush().unwrap();

    for workers in 1..5 {
        for mode in [ReadMode::Mmap, ReadMode::Buffered] {
            let report = aggregator(workers, mode).run(tmp.path()).unwrap();
            assert_eq!(report.format(), "{Lima=20.1/20.1/20.1,Oslo=-3.0/-1.0/1.0}");
        }
    }
}

#[test]
fn test_blank_lines_are_not_counted() {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "Oslo;1.0\n\nLima;2.0\nOslo;3.0\n").unwrap();
    tmp.flush().unwrap();

    for workers in 1..5 {
        for mode in [ReadMode::Mmap, ReadMode::Buffered] {
            let aggregator = Aggregator::new(
                AggregatorConfig::default()
                    .with_workers(workers)
                    .with_read_mode(mode)
                    .with_expected_records(Some(3)),
            )
            .unwrap();
            let report = aggregator.run(tmp.path()).unwrap();
            assert_eq!(report.total_records, 3);
            assert_eq!(report.count_mismatch, None);
            assert_eq!(report.format(), "{Lima=2.0/2.0/2.0,Oslo=1.0/2.0/3.0}");
        }
    }
}

#[test]
fn test_malformed_record_surfaces_location() {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "Oslo;-3.0\nLima 20.1\nOslo;1.0\n").unwrap();
    tmp.flush().unwrap();

    for mode in [ReadMode::Mmap, ReadMode::Buffered] {
        let err = aggregator(1, mode).run(tmp.path()).unwrap_err();
        match err {
            AggregatorError::MalformedRecord { partition, offset } => {
                assert_eq!(partition, 0);
                assert_eq!(offset, 10);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_run_bytes_matches_run() {
    let (tmp, contents) = generated_file(20, 5_000, 8);
    let agg = aggregator(5, ReadMode::Mmap);
    let from_file = agg.run(tmp.path()).unwrap();
    let from_bytes = agg.run_bytes(contents.as_bytes()).unwrap();
    assert_eq!(from_file.format(), from_bytes.format());
    assert_eq!(from_file.partitions, from_bytes.partitions);
}
