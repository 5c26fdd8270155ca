//! Comma-separated integer input
//!
//! Tokens follow base auto-detection: `0x`/`0X` is hexadecimal, a leading
//! `0` is octal, anything else decimal. One optional sign, one optional
//! trailing newline, and nothing else may surround the digits. Empty tokens
//! are skipped.

use crate::error::{QuintetError, Result};
use crate::models::Value;

/// Lazily parse every non-empty token of `input`
pub fn tokens(input: &str) -> impl Iterator<Item = Result<Value>> + '_ {
    input
        .split(',')
        .filter(|token| !token.is_empty())
        .map(parse_value)
}

/// Parse everything, failing on the first bad token
pub fn parse_values(input: &str) -> Result<Vec<Value>> {
    tokens(input).collect()
}

pub fn parse_value(token: &str) -> Result<Value> {
    let invalid = || QuintetError::InvalidInput(token.to_string());

    let body = token.strip_suffix('\n').unwrap_or(token);
    let (negative, unsigned) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body.strip_prefix('+').unwrap_or(body)),
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    if digits.is_empty() {
        return Err(invalid());
    }

    let mut magnitude: u64 = 0;
    for ch in digits.chars() {
        let digit = ch.to_digit(radix).ok_or_else(invalid)?;
        magnitude = magnitude
            .checked_mul(u64::from(radix))
            .and_then(|m| m.checked_add(u64::from(digit)))
            .ok_or_else(invalid)?;
    }

    let signed = if negative {
        0i64.checked_sub_unsigned(magnitude).ok_or_else(invalid)?
    } else {
        i64::try_from(magnitude).map_err(|_| invalid())?
    };
    Value::try_from(signed).map_err(|_| invalid())
}
