//! Fixed-point codec for the value column.
//!
//! Values are written with an optional `-`, one to three integer digits, a
//! `.` and exactly one fractional digit. They are carried through the engine
//! as integers counting tenths, so `-12.3` becomes `-123`.

use thiserror::Error;

/// A value in tenths
pub type EncodedValue = i32;

const MAX_INTEGER_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty value")]
    Empty,

    #[error("missing decimal separator")]
    MissingSeparator,

    #[error("expected 1 to 3 integer digits, got {0}")]
    IntegerDigits(usize),

    #[error("expected exactly 1 fractional digit, got {0}")]
    FractionDigits(usize),

    #[error("unexpected byte 0x{0:02x}")]
    NonDigit(u8),
}

#[inline]
fn digit(b: u8) -> Result<EncodedValue, DecodeError> {
    if b.is_ascii_digit() {
        Ok((b - b'0') as EncodedValue)
    } else {
        Err(DecodeError::NonDigit(b))
    }
}

/// Decodes a value field (terminator already stripped) into tenths.
///
/// `-0.0` decodes to `0`, the same as `0.0`.
///
/// # Example
/// ```rust
/// # use station_aggregator::processor::codec::decode;
/// assert_eq!(decode(b"-12.3"), Ok(-123));
/// assert_eq!(decode(b"4.0"), Ok(40));
/// ```
#[inline]
pub fn decode(bytes: &[u8]) -> Result<EncodedValue, DecodeError> {
    let (negative, body) = match bytes {
        [] => return Err(DecodeError::Empty),
        [b'-', rest @ ..] => (true, rest),
        _ => (false, bytes),
    };

    let dot = body
        .iter()
        .position(|&b| b == b'.')
        .ok_or(DecodeError::MissingSeparator)?;
    let (integer, fraction) = (&body[..dot], &body[dot + 1..]);

    if integer.is_empty() || integer.len() > MAX_INTEGER_DIGITS {
        return Err(DecodeError::IntegerDigits(integer.len()));
    }
    if fraction.len() != 1 {
        return Err(DecodeError::FractionDigits(fraction.len()));
    }

    let mut value = 0;
    for &b in integer {
        value = value * 10 + digit(b)?;
    }
    value = value * 10 + digit(fraction[0])?;

    Ok(if negative { -value } else { value })
}

/// Renders tenths back to the fixed decimal form, e.g. `-123` -> `-12.3`
pub fn encode(value: EncodedValue) -> String {
    let mut out = String::with_capacity(6);
    encode_into(&mut out, value);
    out
}

/// Appends the decimal form of `value` to `out`
pub fn encode_into(out: &mut String, value: EncodedValue) {
    if value < 0 {
        out.push('-');
    }
    let abs = value.unsigned_abs();
    out.push_str(&(abs / 10).to_string());
    out.push('.');
    out.push(char::from(b'0' + (abs % 10) as u8));
}
