//! Synthetic `city{N};{value}` input, with values uniform in `[-99.9, 99.9]`.

use rand::Rng;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const MIN_VALUE: f64 = -99.9;
pub const MAX_VALUE: f64 = 99.9;

/// Conventional file name for a generated input of the given shape
pub fn input_path(cities: usize, lines: u64) -> PathBuf {
    PathBuf::from(format!("input_c{}_l{}.csv", cities, lines))
}

/// Writes `lines` random records spread over `cities` distinct keys
pub fn generate<W: Write, R: Rng>(
    writer: &mut W,
    rng: &mut R,
    cities: usize,
    lines: u64,
) -> io::Result<()> {
    if cities == 0 && lines > 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot generate records for zero cities",
        ));
    }
    for _ in 0..lines {
        let city = rng.random_range(0..cities);
        let value: f64 = rng.random_range(MIN_VALUE..MAX_VALUE);
        writeln!(writer, "city{};{:.1}", city, value)?;
    }
    Ok(())
}

/// Generates a file at `path` using the thread-local RNG
pub fn generate_file(path: &Path, cities: usize, lines: u64) -> io::Result<()> {
    info!(path = %path.display(), cities, lines, "generating input");
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    generate(&mut writer, &mut rand::rng(), cities, lines)?;
    writer.flush()
}
