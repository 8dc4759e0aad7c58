//! Decoding of C99 integer and floating constants (§6.4.4.1, §6.4.4.2).
//!
//! The lexer keeps literal lexemes as raw interned text; this module turns
//! them into values paired with the narrowest conforming type. The target
//! model is LP64: `int` is 32 bits, `long` and `long long` are 64 bits.

use crate::types::{FloatRank, IntRank};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericError {
    Malformed,
}

/// A decoded integer constant. `overflowed` is set when the literal did not
/// fit any type its suffix allows; the value saturates and the caller
/// diagnoses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInt {
    pub value: u64,
    pub signed: bool,
    pub rank: IntRank,
    pub overflowed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedFloat {
    pub value: f64,
    pub rank: FloatRank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Suffix {
    is_unsigned: bool,
    long_count: u8,
}

/// Strip suffix letters from the end of an integer lexeme. `u`/`U` at most
/// once, `l`/`L` at most twice and same-case, in either order relative to `u`.
fn split_int_suffix(text: &str) -> Result<(&str, Suffix), NumericError> {
    let bytes = text.as_bytes();
    let mut end = bytes.len();
    let mut is_unsigned = false;
    let mut long_count: u8 = 0;
    let mut long_case: u8 = 0;

    while end > 0 {
        match bytes[end - 1] {
            b'u' | b'U' => {
                if is_unsigned {
                    return Err(NumericError::Malformed);
                }
                is_unsigned = true;
                end -= 1;
            }
            c @ (b'l' | b'L') => {
                if long_count == 2 || (long_count == 1 && long_case != c) {
                    return Err(NumericError::Malformed);
                }
                long_count += 1;
                long_case = c;
                end -= 1;
            }
            _ => break,
        }
    }
    Ok((&text[..end], Suffix { is_unsigned, long_count }))
}

fn digit_value(c: u8, base: u64) -> Option<u64> {
    let v = match c {
        b'0'..=b'9' => (c - b'0') as u64,
        b'a'..=b'f' => (c - b'a') as u64 + 10,
        b'A'..=b'F' => (c - b'A') as u64 + 10,
        _ => return None,
    };
    if v < base {
        Some(v)
    } else {
        None
    }
}

/// `strtoull`-equivalent: accumulate in the given base, saturating at
/// `u64::MAX` with the overflow flag set.
fn accumulate(digits: &str, base: u64) -> Result<(u64, bool), NumericError> {
    if digits.is_empty() {
        return Err(NumericError::Malformed);
    }
    let mut value: u64 = 0;
    let mut overflowed = false;
    for &c in digits.as_bytes() {
        let d = digit_value(c, base).ok_or(NumericError::Malformed)?;
        value = match value.checked_mul(base).and_then(|v| v.checked_add(d)) {
            Some(v) => v,
            None => {
                overflowed = true;
                u64::MAX
            }
        };
    }
    Ok((value, overflowed))
}

const INT_MAX: u64 = i32::MAX as u64;
const UINT_MAX: u64 = u32::MAX as u64;
const LONG_MAX: u64 = i64::MAX as u64;

fn fits(value: u64, signed: bool, rank: IntRank) -> bool {
    match (signed, rank) {
        (true, IntRank::Int) => value <= INT_MAX,
        (false, IntRank::Int) => value <= UINT_MAX,
        (true, IntRank::Long) | (true, IntRank::LongLong) => value <= LONG_MAX,
        (false, IntRank::Long) | (false, IntRank::LongLong) => true,
        _ => false,
    }
}

/// Candidate types in order, per the C99 table for the literal's base and
/// suffix; the first row that can represent the value is chosen.
fn candidates(decimal: bool, suffix: Suffix) -> &'static [(bool, IntRank)] {
    use IntRank::{Int, Long, LongLong};
    match (decimal, suffix.is_unsigned, suffix.long_count) {
        (true, false, 0) => &[(true, Int), (true, Long), (true, LongLong)],
        (true, true, 0) => &[(false, Int), (false, Long), (false, LongLong)],
        (true, false, 1) => &[(true, Long), (true, LongLong)],
        (true, true, 1) => &[(false, Long), (false, LongLong)],
        (true, false, _) => &[(true, LongLong)],
        (true, true, _) => &[(false, LongLong)],
        (false, false, 0) => &[
            (true, Int),
            (false, Int),
            (true, Long),
            (false, Long),
            (true, LongLong),
            (false, LongLong),
        ],
        (false, true, 0) => &[(false, Int), (false, Long), (false, LongLong)],
        (false, false, 1) => &[(true, Long), (false, Long), (true, LongLong), (false, LongLong)],
        (false, true, 1) => &[(false, Long), (false, LongLong)],
        (false, false, _) => &[(true, LongLong), (false, LongLong)],
        (false, true, _) => &[(false, LongLong)],
    }
}

pub fn decode_integer(text: &str) -> Result<DecodedInt, NumericError> {
    let (body, suffix) = split_int_suffix(text)?;
    let (digits, base, decimal) = if let Some(rest) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (rest, 16, false)
    } else if body.len() > 1 && body.starts_with('0') {
        (&body[1..], 8, false)
    } else {
        (body, 10, true)
    };
    let (value, mut overflowed) = accumulate(digits, base)?;

    let rows = candidates(decimal, suffix);
    for &(signed, rank) in rows {
        if !overflowed && fits(value, signed, rank) {
            return Ok(DecodedInt { value, signed, rank, overflowed: false });
        }
    }
    // Nothing in the table can represent it; saturate to the widest unsigned
    // type and let the caller warn.
    overflowed = true;
    Ok(DecodedInt { value, signed: false, rank: IntRank::LongLong, overflowed })
}

fn split_float_suffix(text: &str) -> (&str, FloatRank) {
    if let Some(body) = text.strip_suffix('f').or_else(|| text.strip_suffix('F')) {
        (body, FloatRank::Float)
    } else if let Some(body) = text.strip_suffix('l').or_else(|| text.strip_suffix('L')) {
        (body, FloatRank::LongDouble)
    } else {
        (text, FloatRank::Double)
    }
}

/// Hexadecimal floating constant: `0x` hex-digits [`.` hex-digits] `p`
/// signed-decimal-exponent. The exponent part is required by the grammar.
fn parse_hex_float(body: &str) -> Result<f64, NumericError> {
    let (mantissa, exponent) = body
        .split_once(['p', 'P'])
        .ok_or(NumericError::Malformed)?;
    let exp: i32 = exponent.parse().map_err(|_| NumericError::Malformed)?;

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(NumericError::Malformed);
    }

    let mut value = 0.0f64;
    for &c in int_part.as_bytes() {
        let d = digit_value(c, 16).ok_or(NumericError::Malformed)?;
        value = value * 16.0 + d as f64;
    }
    let mut scale = 1.0 / 16.0;
    for &c in frac_part.as_bytes() {
        let d = digit_value(c, 16).ok_or(NumericError::Malformed)?;
        value += d as f64 * scale;
        scale /= 16.0;
    }
    Ok(value * (exp as f64).exp2())
}

pub fn decode_float(text: &str) -> Result<DecodedFloat, NumericError> {
    let (body, rank) = split_float_suffix(text);
    let value = if let Some(rest) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        parse_hex_float(rest)?
    } else {
        body.parse::<f64>().map_err(|_| NumericError::Malformed)?
    };
    // Quantize to the chosen precision; long double collapses to f64 here.
    let value = match rank {
        FloatRank::Float => value as f32 as f64,
        FloatRank::Double | FloatRank::LongDouble => value,
    };
    Ok(DecodedFloat { value, rank })
}
